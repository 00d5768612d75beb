//! Admin endpoints: subscription account management and queue control.

use axum::extract::{Path, Query, State};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use subpool_auth::PasswordHasher;
use subpool_core::error::AppError;
use subpool_entity::subscription::CreateSubscription;

use crate::dto::request::{
    CreateSubscriptionRequest, DrainRequestBody, PendingQuery, SubscriptionFilter,
};
use crate::dto::response::{
    ApiResponse, DrainReportResponse, PaginatedResponse, RequestResponse, SubscriptionResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json, PaginationParams};
use crate::state::AppState;

/// POST /api/admin/subscriptions
///
/// Registers a shared account and immediately drains the provider's
/// pending queue against the new capacity.
pub async fn create_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<Json<ApiResponse<SubscriptionResponse>>, ApiError> {
    auth.require_admin()?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let password_hash = PasswordHasher::new().hash_password(&req.password)?;
    let subscription = state
        .subscription_repo
        .create(&CreateSubscription {
            service_provider_id: req.service_provider_id,
            country_id: req.country_id,
            name: req.name,
            email: req.email,
            password_hash,
            total_slots: req.total_slots,
            user_price: req.user_price,
            currency_id: req.currency_id,
            renewal_info: req.renewal_info,
            metadata: req.metadata,
            expires_at: req.expires_at,
        })
        .await?;

    let report = state
        .engine
        .drain_pending(subscription.service_provider_id, None)
        .await?;
    info!(
        subscription_id = %subscription.id,
        service_provider_id = %subscription.service_provider_id,
        total_slots = subscription.total_slots,
        assigned = report.assigned,
        "Subscription registered, pending requests drained"
    );

    Ok(Json(ApiResponse::ok(subscription.into())))
}

/// GET /api/admin/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<SubscriptionFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<SubscriptionResponse>>>, ApiError> {
    auth.require_admin()?;

    let page = state
        .subscription_repo
        .list(filter.service_provider_id, &pagination.into_page_request())
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse::from_page(
        page,
        Into::into,
    ))))
}

/// PUT /api/admin/requests/{id}/reject
pub async fn reject_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestResponse>>, ApiError> {
    auth.require_admin()?;
    let rejected = state.engine.reject_request(id).await?;
    Ok(Json(ApiResponse::ok(rejected.into())))
}

/// GET /api/admin/requests/pending
pub async fn pending_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PendingQuery>,
) -> Result<Json<ApiResponse<Vec<RequestResponse>>>, ApiError> {
    auth.require_admin()?;

    let pending = state
        .engine
        .store()
        .pending_requests(query.service_provider_id, query.country_id)
        .await?;

    Ok(Json(ApiResponse::ok(
        pending.into_iter().map(Into::into).collect(),
    )))
}

/// POST /api/admin/requests/drain
pub async fn drain(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<DrainRequestBody>,
) -> Result<Json<ApiResponse<DrainReportResponse>>, ApiError> {
    auth.require_admin()?;

    let report = state
        .engine
        .drain_pending(body.service_provider_id, body.country_id)
        .await?;

    Ok(Json(ApiResponse::ok(report.into())))
}
