//! Reconciliation error types.

use souk_db::store::StoreError;
use souk_provider::ProviderError;
use thiserror::Error;

/// A failure that aborts a reconciliation pass.
///
/// Per-record failures never surface here; they are counted in
/// [`crate::SyncSummary::failed`] and the pass continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The provider listing failed; the pass aborts with no local mutation.
    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The mirror could not be read.
    #[error("identity store error: {0}")]
    Store(#[from] StoreError),
}
