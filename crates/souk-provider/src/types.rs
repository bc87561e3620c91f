//! Wire types for the identity provider admin API.
//!
//! The provider speaks camelCase JSON; fields the provider may omit
//! (email, names) default to empty strings so a partially filled upstream
//! record still produces a usable snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A provider-side user snapshot, valid for one reconciliation pass only.
///
/// Never persisted; the local mirror keeps its own record keyed by
/// [`ProviderUser::id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUser {
    /// The provider-issued user id.
    pub id: String,
    /// Login name, unique upstream.
    pub username: String,
    /// Email address; empty when not set upstream.
    #[serde(default)]
    pub email: String,
    /// Given name; empty when not set upstream.
    #[serde(default)]
    pub first_name: String,
    /// Family name; empty when not set upstream.
    #[serde(default)]
    pub last_name: String,
    /// Whether the account is enabled upstream.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Request payload for creating a user upstream.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProviderUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enabled: bool,
    pub email_verified: bool,
}

impl NewProviderUser {
    /// Build an enabled, email-verified creation request.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            enabled: true,
            email_verified: true,
        }
    }
}

/// Field update for an existing upstream user.
///
/// The username is immutable upstream and intentionally absent here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Free-form attributes and group memberships of an upstream user.
///
/// Input to the resolver's alternative role determination: when the role
/// sets carry no evidence, substring matches against these signals decide.
#[derive(Debug, Clone, Default)]
pub struct UserSignals {
    /// Multi-valued user attributes keyed by attribute name.
    pub attributes: HashMap<String, Vec<String>>,
    /// Group names (or paths) the user belongs to.
    pub groups: Vec<String>,
}

impl UserSignals {
    /// Iterate every attribute value and group name as one signal stream.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .values()
            .flatten()
            .map(String::as_str)
            .chain(self.groups.iter().map(String::as_str))
    }
}
