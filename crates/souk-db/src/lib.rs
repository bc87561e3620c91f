//! Local identity mirror for souk.
//!
//! The mirror is a read-optimized relational copy of identity data used by
//! the rest of the application for fast, provider-independent lookups. The
//! reconciliation engine is its only writer besides the explicit user
//! lifecycle workflows.

pub mod migrations;
pub mod models;
pub mod pg;
pub mod store;

pub use models::User;
pub use pg::PgIdentityStore;
pub use store::{IdentityStore, StoreError, StoreResult};
