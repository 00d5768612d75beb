//! SubPool Server — subscription-sharing platform backend.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use subpool_api::{AppState, build_router};
use subpool_auth::AuthService;
use subpool_core::config::AppConfig;
use subpool_core::error::AppError;
use subpool_database::repositories::{
    CatalogRepository, SubscriptionRepository, UserRepository,
};
use subpool_database::{DatabasePool, PgSlotStore};
use subpool_engine::SlotAssignmentEngine;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SUBPOOL_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting SubPool v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;
    subpool_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Repositories ─────────────────────────────────────
    let user_repo = Arc::new(UserRepository::new(db.pool().clone()));
    let catalog_repo = Arc::new(CatalogRepository::new(db.pool().clone()));
    let subscription_repo = Arc::new(SubscriptionRepository::new(db.pool().clone()));

    // ── Step 3: Slot assignment engine ───────────────────────────
    let store = Arc::new(PgSlotStore::new(db.pool().clone()));
    let engine = Arc::new(SlotAssignmentEngine::from_config(
        store,
        catalog_repo.clone(),
        &config.engine,
    )?);
    tracing::info!(policy = %engine.policy(), "Slot assignment engine ready");

    // ── Step 4: Auth ─────────────────────────────────────────────
    let auth = Arc::new(AuthService::new(
        UserRepository::new(db.pool().clone()),
        &config.auth,
    ));

    // ── Step 5: HTTP server ──────────────────────────────────────
    let state = AppState {
        config: Arc::new(config.clone()),
        db_pool: db.pool().clone(),
        auth,
        engine,
        user_repo,
        catalog_repo,
        subscription_repo,
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server failed: {e}")))?;

    tracing::info!("Shutting down, closing database pool");
    db.close().await;

    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::warn!("Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
