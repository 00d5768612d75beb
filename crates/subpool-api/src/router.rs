//! Route definitions for the SubPool HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(subscription_routes())
        .merge(catalog_routes())
        .merge(admin_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Auth endpoints: register, login, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
}

/// Member-facing subscription endpoints
fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions/request",
            post(handlers::subscription::request_slot),
        )
        .route(
            "/subscriptions/my-slots",
            get(handlers::subscription::my_slots),
        )
        .route(
            "/subscriptions/my-requests",
            get(handlers::subscription::my_requests),
        )
        .route(
            "/subscriptions/requests/{id}",
            delete(handlers::subscription::cancel_request),
        )
        .route(
            "/subscriptions/slots/{id}/release",
            post(handlers::subscription::release_slot),
        )
        .route(
            "/subscriptions/availability",
            get(handlers::subscription::availability),
        )
}

/// Catalog reference data
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/providers", get(handlers::catalog::list_providers))
        .route("/catalog/countries", get(handlers::catalog::list_countries))
        .route(
            "/catalog/currencies",
            get(handlers::catalog::list_currencies),
        )
}

/// Admin-only endpoints
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/subscriptions",
            post(handlers::admin::create_subscription),
        )
        .route(
            "/admin/subscriptions",
            get(handlers::admin::list_subscriptions),
        )
        .route(
            "/admin/requests/{id}/reject",
            put(handlers::admin::reject_request),
        )
        .route(
            "/admin/requests/pending",
            get(handlers::admin::pending_requests),
        )
        .route("/admin/requests/drain", post(handlers::admin::drain))
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors.max_age(std::time::Duration::from_secs(
        cors_config.max_age_seconds,
    ))
}
