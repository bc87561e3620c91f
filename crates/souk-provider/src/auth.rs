//! Admin API authentication: static bearer token or client credentials.

use crate::error::{ProviderError, ProviderResult};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Credentials for the provider admin API.
///
/// The [`Debug`] impl redacts secrets to prevent credential exposure in logs.
#[derive(Clone)]
pub enum AdminCredentials {
    /// A pre-issued bearer token (static; useful for tests and tooling).
    Bearer { token: String },

    /// OAuth2 client credentials grant against the provider's token endpoint.
    ClientCredentials {
        token_endpoint: String,
        client_id: String,
        client_secret: String,
    },
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::ClientCredentials {
                token_endpoint,
                client_id,
                ..
            } => f
                .debug_struct("ClientCredentials")
                .field("token_endpoint", token_endpoint)
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Token response from the provider's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Cached access token with expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => Instant::now() >= exp,
            None => false,
        }
    }
}

/// Authentication handler for the provider admin API.
///
/// Static tokens are returned as-is; client-credentials tokens are fetched
/// on demand and cached (shared across clones) until shortly before expiry.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    credentials: AdminCredentials,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    http_client: reqwest::Client,
}

impl AdminAuth {
    /// Create a new auth handler.
    #[must_use]
    pub fn new(credentials: AdminCredentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Get the bearer token to attach to admin requests.
    pub async fn bearer_token(&self) -> ProviderResult<String> {
        match &self.credentials {
            AdminCredentials::Bearer { token } => Ok(token.clone()),
            AdminCredentials::ClientCredentials {
                token_endpoint,
                client_id,
                client_secret,
            } => {
                {
                    let cache = self.cached_token.read().await;
                    if let Some(cached) = cache.as_ref() {
                        if !cached.is_expired() {
                            return Ok(cached.access_token.clone());
                        }
                    }
                }

                debug!(endpoint = %token_endpoint, "Fetching admin access token");
                let response = self
                    .http_client
                    .post(token_endpoint)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                    ])
                    .send()
                    .await
                    .map_err(|e| ProviderError::Auth(format!("token request failed: {e}")))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(ProviderError::Auth(format!(
                        "token endpoint returned {status}: {body}"
                    )));
                }

                let token: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| ProviderError::Auth(format!("invalid token response: {e}")))?;

                // Refresh 30 seconds before the reported expiry.
                let expires_at = token
                    .expires_in
                    .map(|secs| Instant::now() + Duration::from_secs(secs.saturating_sub(30)));

                let cached = CachedToken {
                    access_token: token.access_token.clone(),
                    expires_at,
                };
                *self.cached_token.write().await = Some(cached);

                Ok(token.access_token)
            }
        }
    }
}
