//! Marketplace role enum and role-name matching rules.
//!
//! Roles originate in the identity provider as realm-level role names.
//! The matching rules here are shared by the role resolver (exact matching
//! against provider role sets, substring matching against attribute and
//! group signals) and by the user lifecycle workflow (mapping a role back
//! to its upstream name).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Realm role names that resolve to [`Role::Admin`].
///
/// `REALM-ADMIN` is the provider-side alias used by bootstrap tooling.
const ADMIN_ROLE_NAMES: [&str; 2] = ["ADMIN", "REALM-ADMIN"];

/// Realm role name that resolves to [`Role::Merchant`].
const MERCHANT_ROLE_NAME: &str = "MERCHANT";

/// The role of a marketplace user.
///
/// Every mirrored identity record carries exactly one role; `Customer` is
/// the floor the resolver degrades to when no stronger evidence exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Store owner able to manage listings and transactions.
    Merchant,
    /// Default role for every user without stronger evidence.
    Customer,
}

impl Role {
    /// Match a provider role name exactly (case-insensitive).
    ///
    /// Returns `None` for role names that carry no marketplace meaning
    /// (e.g. `offline_access`, `uma_authorization`).
    #[must_use]
    pub fn from_role_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        if ADMIN_ROLE_NAMES.contains(&upper.as_str()) {
            Some(Self::Admin)
        } else if upper == MERCHANT_ROLE_NAME {
            Some(Self::Merchant)
        } else {
            None
        }
    }

    /// Match a free-form signal (attribute value or group name) by
    /// case-insensitive substring.
    ///
    /// Used by the alternative determination pass, where group paths like
    /// `/marketplace/admins` or attribute values like `role=merchant-eu`
    /// still identify an elevated role.
    #[must_use]
    pub fn from_signal(text: &str) -> Option<Self> {
        let upper = text.to_uppercase();
        if upper.contains("ADMIN") {
            Some(Self::Admin)
        } else if upper.contains("MERCHANT") {
            Some(Self::Merchant)
        } else {
            None
        }
    }

    /// Resolve the strongest role present in a set of provider role names.
    ///
    /// Admin takes precedence over Merchant regardless of listing order;
    /// returns `None` when no name matches.
    #[must_use]
    pub fn strongest_match<'a, I>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found = None;
        for name in names {
            match Self::from_role_name(name) {
                Some(Self::Admin) => return Some(Self::Admin),
                Some(role) => {
                    found.get_or_insert(role);
                }
                None => {}
            }
        }
        found
    }

    /// Resolve the strongest role signaled by free-form text values.
    ///
    /// Same precedence as [`Role::strongest_match`], with substring matching.
    #[must_use]
    pub fn strongest_signal<'a, I>(signals: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found = None;
        for signal in signals {
            match Self::from_signal(signal) {
                Some(Self::Admin) => return Some(Self::Admin),
                Some(role) => {
                    found.get_or_insert(role);
                }
                None => {}
            }
        }
        found
    }

    /// The canonical realm-role name assigned upstream for this role.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Merchant => "MERCHANT",
            Self::Customer => "CUSTOMER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.provider_name())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "MERCHANT" => Ok(Self::Merchant),
            "CUSTOMER" => Ok(Self::Customer),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
