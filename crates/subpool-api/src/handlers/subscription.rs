//! Member-facing subscription endpoints: request a slot, inspect holdings,
//! cancel, release, probe availability.

use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::dto::request::{AvailabilityQuery, RequestSlotBody};
use crate::dto::response::{
    ApiResponse, AssignmentResponse, AvailabilityResponse, MessageResponse, RequestResponse,
    SlotResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json};
use crate::state::AppState;

/// POST /api/subscriptions/request
///
/// Either grants a slot right away (status ASSIGNED) or queues the ask
/// (status PENDING). Both are 200 responses; the status field tells the
/// caller which happened.
pub async fn request_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<RequestSlotBody>,
) -> Result<Json<ApiResponse<AssignmentResponse>>, ApiError> {
    let outcome = state
        .engine
        .assign_slot_to_user(auth.user_id, body.service_provider_id, body.country_id)
        .await?;

    let message = outcome.message().to_string();
    Ok(Json(ApiResponse::ok(AssignmentResponse {
        request: outcome.request.into(),
        slot: outcome.slot.map(Into::into),
        message,
    })))
}

/// GET /api/subscriptions/my-slots
pub async fn my_slots(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<SlotResponse>>>, ApiError> {
    let slots = state
        .engine
        .store()
        .active_slots_for_user(auth.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(
        slots.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/subscriptions/my-requests
pub async fn my_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<RequestResponse>>>, ApiError> {
    let requests = state
        .engine
        .store()
        .requests_for_user(auth.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(
        requests.into_iter().map(Into::into).collect(),
    )))
}

/// DELETE /api/subscriptions/requests/{id}
pub async fn cancel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestResponse>>, ApiError> {
    let cancelled = state.engine.cancel_request(auth.user_id, id).await?;
    Ok(Json(ApiResponse::ok(cancelled.into())))
}

/// POST /api/subscriptions/slots/{id}/release
///
/// Frees the slot and immediately drains pending requests for the
/// provider, so the next queued user picks up the capacity.
pub async fn release_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.engine.release_slot(auth.user_id, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Slot released".to_string(),
    })))
}

/// GET /api/subscriptions/availability
pub async fn availability(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<ApiResponse<AvailabilityResponse>>, ApiError> {
    let candidate = state
        .engine
        .find_available_slot(query.service_provider_id, query.country_id)
        .await?;

    Ok(Json(ApiResponse::ok(AvailabilityResponse {
        available: candidate.is_some(),
        subscription: candidate.map(Into::into),
    })))
}
