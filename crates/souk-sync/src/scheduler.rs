//! Periodic reconciliation driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::engine::ReconciliationEngine;
use crate::report::SyncOutcome;

/// Drives the engine on a fixed interval.
///
/// The first tick fires immediately, so the mirror converges at startup
/// without waiting a full period. A pass that fails (provider down) is
/// simply retried on the next tick.
pub struct SyncScheduler {
    engine: Arc<ReconciliationEngine>,
    period: Duration,
}

impl SyncScheduler {
    pub fn new(engine: Arc<ReconciliationEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Spawn the scheduling loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_secs = self.period.as_secs(), "Reconciliation scheduler started");

            loop {
                ticker.tick().await;
                match self.engine.synchronize().await {
                    Ok(SyncOutcome::Completed(summary)) if summary.changed() => {
                        info!(
                            created = summary.created,
                            updated = summary.updated,
                            deleted = summary.deleted,
                            failed = summary.failed,
                            "Scheduled pass applied changes"
                        );
                    }
                    Ok(SyncOutcome::Completed(summary)) => {
                        debug!(
                            scanned = summary.scanned,
                            failed = summary.failed,
                            "Scheduled pass found mirror converged"
                        );
                    }
                    Ok(SyncOutcome::AlreadyRunning) => {
                        debug!("Scheduled pass skipped, another pass in flight");
                    }
                    Err(error) => {
                        error!(%error, "Scheduled pass failed, will retry next tick");
                    }
                }
            }
        })
    }
}
