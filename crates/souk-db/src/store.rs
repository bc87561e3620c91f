//! Identity store capability trait.
//!
//! The reconciliation engine and the lifecycle workflow consume this
//! contract; the Postgres implementation lives in [`crate::pg`], and tests
//! substitute an in-memory store.

use async_trait::async_trait;
use souk_core::Role;
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the identity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mirror uniqueness constraint (`username`, `email`, `provider_id`)
    /// was violated during an upsert.
    ///
    /// During reconciliation this is isolated to the record: the row stays
    /// unreconciled until the upstream conflict is resolved.
    #[error("unique constraint violated on {field}")]
    Conflict { field: String },

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Whether this is a uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Capability surface over the local identity mirror.
///
/// Every write is a single-record transaction; no operation spans multiple
/// records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a record by the provider's user id.
    async fn find_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>>;

    /// Look up a record by its local id.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Look up a record by username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Fetch the complete mirror.
    async fn find_all(&self) -> StoreResult<Vec<User>>;

    /// Fetch every record with the given role.
    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>>;

    /// Upsert a record keyed by its local id.
    async fn save(&self, user: &User) -> StoreResult<()>;

    /// Delete a record by local id.
    ///
    /// Returns `false` when the row was already gone; a concurrent deletion
    /// is a no-op, not an error.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Whether a record with this username exists.
    async fn exists_by_username(&self, username: &str) -> StoreResult<bool>;

    /// Whether a record with this email exists.
    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;
}
