//! Tiered role resolution.
//!
//! Role assignments propagate through the provider with a lag: a role
//! granted moments ago may be missing from the effective set, present only
//! in the directly assigned set, or visible only through group membership.
//! The resolver works through those tiers in order and never fails; absent
//! evidence it settles on [`Role::Customer`].

use std::sync::Arc;
use std::time::Duration;

use souk_core::Role;
use souk_provider::IdentityProvider;
use tracing::{debug, warn};

/// Resolver tuning.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Delay before the second attempt when the first resolves to Customer.
    pub retry_delay: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Resolves the marketplace role of a provider user.
#[derive(Clone)]
pub struct RoleResolver {
    provider: Arc<dyn IdentityProvider>,
    config: ResolverConfig,
}

impl RoleResolver {
    pub fn new(provider: Arc<dyn IdentityProvider>, config: ResolverConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve the role of `provider_id`. Infallible: provider errors are
    /// logged and treated as absence of evidence.
    ///
    /// A first attempt that yields Customer is retried once after
    /// [`ResolverConfig::retry_delay`], then falls through to substring
    /// matching over attributes and groups.
    pub async fn resolve(&self, provider_id: &str) -> Role {
        let mut role = self.attempt(provider_id).await;

        if role == Role::Customer {
            debug!(
                provider_id,
                delay_ms = self.config.retry_delay.as_millis() as u64,
                "First attempt resolved Customer, retrying after delay"
            );
            tokio::time::sleep(self.config.retry_delay).await;
            role = self.attempt(provider_id).await;

            if role == Role::Customer {
                role = self.attempt_from_signals(provider_id).await;
            }
        }

        role
    }

    /// One pass over the role sets: effective roles first, then directly
    /// assigned roles for grants not yet expanded into the effective set.
    async fn attempt(&self, provider_id: &str) -> Role {
        match self.provider.list_effective_roles(provider_id).await {
            Ok(names) => {
                if let Some(role) = Role::strongest_match(names.iter().map(String::as_str)) {
                    return role;
                }
            }
            Err(error) => {
                warn!(provider_id, %error, "Failed to list effective roles");
            }
        }

        match self.provider.list_assignable_roles(provider_id).await {
            Ok(names) => {
                if let Some(role) = Role::strongest_match(names.iter().map(String::as_str)) {
                    debug!(provider_id, "Role found in assigned set only");
                    return role;
                }
            }
            Err(error) => {
                warn!(provider_id, %error, "Failed to list assigned roles");
            }
        }

        Role::Customer
    }

    /// Last tier: substring evidence in attribute values and group names.
    async fn attempt_from_signals(&self, provider_id: &str) -> Role {
        match self.provider.get_attributes_and_groups(provider_id).await {
            Ok(signals) => {
                let role = Role::strongest_signal(signals.iter()).unwrap_or(Role::Customer);
                if role != Role::Customer {
                    debug!(provider_id, %role, "Role resolved from attribute/group signals");
                }
                role
            }
            Err(error) => {
                warn!(provider_id, %error, "Failed to fetch attributes and groups");
                Role::Customer
            }
        }
    }
}
