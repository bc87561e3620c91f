//! Full-pass reconciliation engine.
//!
//! Each pass diffs the provider's complete user list against the local
//! mirror: unseen provider users are created, drifted records updated,
//! records whose provider user disappeared deleted. The pass is
//! idempotent; a second pass over an unchanged provider issues no writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use souk_db::models::User;
use souk_db::store::IdentityStore;
use souk_provider::{IdentityProvider, ProviderUser};
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::report::{SyncOutcome, SyncSummary};
use crate::resolver::{ResolverConfig, RoleResolver};

/// Engine tuning.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Settle time before resolving the role of a newly discovered user,
    /// covering the provider's role-assignment propagation lag.
    pub settle_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
        }
    }
}

enum RecordAction {
    Created,
    Updated,
    Unchanged,
}

/// Reconciles the local mirror against the identity provider.
///
/// At most one pass runs at a time; a request arriving while a pass is in
/// flight returns [`SyncOutcome::AlreadyRunning`] without doing work.
pub struct ReconciliationEngine {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn IdentityStore>,
    resolver: RoleResolver,
    settle_delay: Duration,
    running: AtomicBool,
}

/// Releases the single-flight flag when the pass ends, on every path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ReconciliationEngine {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn IdentityStore>,
        engine_config: EngineConfig,
        resolver_config: ResolverConfig,
    ) -> Self {
        let resolver = RoleResolver::new(Arc::clone(&provider), resolver_config);
        Self {
            provider,
            store,
            resolver,
            settle_delay: engine_config.settle_delay,
            running: AtomicBool::new(false),
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Errors listing the provider or reading the mirror abort the pass
    /// before any local mutation. Per-record failures are isolated,
    /// logged, and counted in [`SyncSummary::failed`].
    pub async fn synchronize(&self) -> Result<SyncOutcome, SyncError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Reconciliation pass already in flight, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        info!("Starting reconciliation pass");
        let summary = self.run_pass().await?;
        info!(
            scanned = summary.scanned,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            deleted = summary.deleted,
            failed = summary.failed,
            "Reconciliation pass complete"
        );
        Ok(SyncOutcome::Completed(summary))
    }

    async fn run_pass(&self) -> Result<SyncSummary, SyncError> {
        let upstream = self.provider.list_users().await?;
        let mirror = self.store.find_all().await?;

        let mut by_provider_id: HashMap<String, User> = mirror
            .into_iter()
            .map(|user| (user.provider_id.clone(), user))
            .collect();

        let mut summary = SyncSummary {
            scanned: upstream.len(),
            ..SyncSummary::default()
        };

        for remote in &upstream {
            let existing = by_provider_id.remove(&remote.id);
            match self.reconcile_one(remote, existing).await {
                Ok(RecordAction::Created) => summary.created += 1,
                Ok(RecordAction::Updated) => summary.updated += 1,
                Ok(RecordAction::Unchanged) => summary.unchanged += 1,
                Err(error) => {
                    warn!(
                        provider_id = %remote.id,
                        username = %remote.username,
                        %error,
                        "Failed to reconcile user, continuing pass"
                    );
                    summary.failed += 1;
                }
            }
        }

        // Whatever the provider no longer lists is stale.
        for (provider_id, stale) in by_provider_id {
            match self.store.delete(stale.id).await {
                Ok(true) => {
                    info!(%provider_id, username = %stale.username, "Deleted stale mirror record");
                    summary.deleted += 1;
                }
                Ok(false) => {
                    debug!(%provider_id, "Stale record already gone");
                }
                Err(error) => {
                    warn!(%provider_id, %error, "Failed to delete stale record");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn reconcile_one(
        &self,
        remote: &ProviderUser,
        existing: Option<User>,
    ) -> Result<RecordAction, SyncError> {
        match existing {
            Some(mut local) => {
                let role = self.resolver.resolve(&remote.id).await;
                if !local.differs_from(
                    &remote.username,
                    &remote.email,
                    &remote.first_name,
                    &remote.last_name,
                    role,
                ) {
                    debug!(username = %remote.username, "Record already converged");
                    return Ok(RecordAction::Unchanged);
                }
                if local.role != role {
                    info!(
                        username = %remote.username,
                        from = %local.role,
                        to = %role,
                        "Role changed upstream"
                    );
                }
                local.username = remote.username.clone();
                local.email = remote.email.clone();
                local.first_name = remote.first_name.clone();
                local.last_name = remote.last_name.clone();
                local.role = role;
                self.store.save(&local).await?;
                Ok(RecordAction::Updated)
            }
            None => {
                // Let a just-created user's role grants settle upstream
                // before reading them.
                tokio::time::sleep(self.settle_delay).await;
                let role = self.resolver.resolve(&remote.id).await;
                let user = User::new(
                    &remote.id,
                    &remote.username,
                    &remote.email,
                    &remote.first_name,
                    &remote.last_name,
                    role,
                );
                self.store.save(&user).await?;
                info!(username = %remote.username, %role, "Mirrored new provider user");
                Ok(RecordAction::Created)
            }
        }
    }
}
