//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use subpool_auth::AuthService;
use subpool_core::config::AppConfig;
use subpool_database::repositories::{CatalogRepository, SubscriptionRepository, UserRepository};
use subpool_engine::SlotAssignmentEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Authentication service (credentials, JWT)
    pub auth: Arc<AuthService>,
    /// Slot assignment engine
    pub engine: Arc<SlotAssignmentEngine>,
    /// User repository
    pub user_repo: Arc<UserRepository>,
    /// Catalog repository
    pub catalog_repo: Arc<CatalogRepository>,
    /// Subscription account repository
    pub subscription_repo: Arc<SubscriptionRepository>,
}
