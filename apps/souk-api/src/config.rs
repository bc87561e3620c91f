//! Application configuration loaded from environment variables.
//!
//! Fail-fast loading with validation: required variables must be present
//! and valid or the application exits with a clear error message.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use souk_provider::AdminCredentials;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Identity provider connection settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the provider, e.g. `http://localhost:8081`.
    pub base_url: String,
    /// Realm all operations are scoped to.
    pub realm: String,
    /// Admin API credentials.
    pub credentials: AdminCredentials,
    /// HTTP timeout for admin API calls.
    pub timeout: Duration,
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub provider: ProviderConfig,
    /// Period between scheduled reconciliation passes.
    pub sync_interval: Duration,
    /// Resolver delay before the second role-determination attempt.
    pub role_retry_delay: Duration,
    /// Engine settle delay before resolving a newly discovered user.
    pub create_settle_delay: Duration,
    /// Default log filter when `RUST_LOG` is unset.
    pub rust_log: String,
}

fn required(var: &str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::MissingVar(var.to_string()))
}

fn duration_var(var: &str, default: Duration, unit: fn(u64) -> Duration) -> Result<Duration, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(unit)
            .map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                var: "BIND_ADDR".to_string(),
                message: e.to_string(),
            })?;

        let base_url = required("PROVIDER_BASE_URL")?;
        let realm = required("PROVIDER_REALM")?;

        // A static admin token takes precedence; otherwise the client
        // fetches tokens with the client-credentials grant.
        let credentials = match env::var("PROVIDER_ADMIN_TOKEN") {
            Ok(token) => AdminCredentials::Bearer { token },
            Err(_) => {
                let client_id = required("PROVIDER_CLIENT_ID")?;
                let client_secret = required("PROVIDER_CLIENT_SECRET")?;
                let token_endpoint = env::var("PROVIDER_TOKEN_ENDPOINT").unwrap_or_else(|_| {
                    format!("{base_url}/realms/{realm}/protocol/openid-connect/token")
                });
                AdminCredentials::ClientCredentials {
                    token_endpoint,
                    client_id,
                    client_secret,
                }
            }
        };

        let timeout = duration_var("PROVIDER_TIMEOUT_SECS", Duration::from_secs(10), Duration::from_secs)?;
        let sync_interval = duration_var("SYNC_INTERVAL_SECS", Duration::from_secs(30), Duration::from_secs)?;
        let role_retry_delay = duration_var(
            "ROLE_RETRY_DELAY_MS",
            Duration::from_millis(1000),
            Duration::from_millis,
        )?;
        let create_settle_delay = duration_var(
            "CREATE_SETTLE_DELAY_MS",
            Duration::from_millis(500),
            Duration::from_millis,
        )?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info,souk=debug".to_string());

        Ok(Self {
            database_url,
            bind_addr,
            provider: ProviderConfig {
                base_url,
                realm,
                credentials,
                timeout,
            },
            sync_interval,
            role_retry_delay,
            create_settle_delay,
            rust_log,
        })
    }
}
