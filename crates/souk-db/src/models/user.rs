//! Mirrored identity record.

use chrono::{DateTime, Utc};
use souk_core::Role;
use uuid::Uuid;

/// A mirrored identity record.
///
/// `id` is the stable local identifier and `provider_id` the immutable link
/// to the identity provider's user record; at most one row exists per
/// `provider_id`. `username` and `email` are unique within the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable local identifier, immutable once assigned.
    pub id: Uuid,

    /// The identity provider's user id; unique, immutable.
    pub provider_id: String,

    /// Login name, unique within the mirror.
    pub username: String,

    /// Email address, unique within the mirror.
    pub email: String,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Resolved marketplace role; exactly one, never null.
    pub role: Role,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new record for a provider user with a freshly minted local id.
    #[must_use]
    pub fn new(
        provider_id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            provider_id: provider_id.into(),
            username: username.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether any synchronized field differs from the given values.
    ///
    /// Drives the update-if-changed step of reconciliation: identical
    /// records produce no write and no downstream change notification.
    #[must_use]
    pub fn differs_from(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
    ) -> bool {
        self.username != username
            || self.email != email
            || self.first_name != first_name
            || self.last_name != last_name
            || self.role != role
    }
}
