//! Pass outcome reporting.

/// Per-pass counters.
///
/// `scanned` counts provider users seen; the other counters partition what
/// happened to each record. `failed` covers both per-user processing errors
/// and stale deletions that could not be applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Provider users listed this pass.
    pub scanned: usize,
    /// Mirror records created.
    pub created: usize,
    /// Mirror records updated.
    pub updated: usize,
    /// Records already converged; no write issued.
    pub unchanged: usize,
    /// Stale mirror records deleted.
    pub deleted: usize,
    /// Records skipped after an isolated failure.
    pub failed: usize,
}

impl SyncSummary {
    /// Whether the pass changed the mirror at all.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }
}

/// Result of requesting a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The pass ran to completion.
    Completed(SyncSummary),
    /// Another pass was in flight; nothing was done.
    AlreadyRunning,
}
