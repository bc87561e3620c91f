//! Error types for identity provider operations.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised by the identity provider client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be reached (connect failure or timeout).
    ///
    /// When the full user listing fails this way, the whole reconciliation
    /// pass aborts; per-user occurrences are isolated by the caller.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    /// Authentication against the admin API failed (401/403 or token fetch).
    #[error("provider authentication failed: {0}")]
    Auth(String),

    /// Username or email already exists upstream (HTTP 409).
    #[error("provider conflict: {0}")]
    Conflict(String),

    /// The referenced user or role does not exist upstream (HTTP 404).
    #[error("not found upstream: {0}")]
    NotFound(String),

    /// Any other non-success response from the admin API.
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The user listing hit the client's safety cap before the realm was
    /// exhausted.
    ///
    /// Treated like a listing failure: reconciling against a truncated
    /// listing would delete mirror records for users that still exist.
    #[error("user listing exceeded the cap of {cap} users")]
    ListingCapExceeded { cap: usize },

    /// The response body could not be decoded.
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    /// Client construction failed.
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    /// Whether this is the upstream uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether the referenced resource is missing upstream.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Map a non-success status and body to the matching variant.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Auth(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Unavailable(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}
