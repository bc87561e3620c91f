//! Souk identity API.
//!
//! Mirrors identity provider users into a local relational store, keeps the
//! mirror converged with a periodic reconciliation pass, and exposes a thin
//! HTTP surface for user lifecycle and on-demand synchronization.

mod config;
mod error;
mod logging;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use config::Config;
use souk_db::store::IdentityStore;
use souk_db::PgIdentityStore;
use souk_provider::{AdminAuth, IdentityProvider, KeycloakClient};
use souk_sync::{
    EngineConfig, ReconciliationEngine, ResolverConfig, SyncScheduler, UserService,
};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.bind_addr,
        realm = %config.provider.realm,
        "Starting souk API"
    );

    // Create database connection pool
    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            info!("Database connection established");
            pool
        }
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = souk_db::migrations::run(&pool).await {
        eprintln!("Failed to run migrations: {e}");
        std::process::exit(1);
    }

    let http_client = match reqwest::Client::builder()
        .timeout(config.provider.timeout)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };
    let auth = AdminAuth::new(config.provider.credentials.clone(), http_client.clone());
    let provider: Arc<dyn IdentityProvider> = Arc::new(KeycloakClient::with_http_client(
        config.provider.base_url.clone(),
        config.provider.realm.clone(),
        auth,
        http_client,
    ));
    let store: Arc<dyn IdentityStore> = Arc::new(PgIdentityStore::new(pool));

    let engine = Arc::new(ReconciliationEngine::new(
        Arc::clone(&provider),
        Arc::clone(&store),
        EngineConfig {
            settle_delay: config.create_settle_delay,
        },
        ResolverConfig {
            retry_delay: config.role_retry_delay,
        },
    ));
    let users = UserService::new(provider, store);

    // Startup pass plus fixed-interval passes; the admin endpoint shares
    // the same engine and its single-flight guard.
    SyncScheduler::new(Arc::clone(&engine), config.sync_interval).spawn();

    let app = routes::router(AppState { engine, users });

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {}: {e}", config.bind_addr);
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind_addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
    info!("Server shutdown complete");
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
