//! Auth handlers — register, login, me.

use axum::extract::State;
use validator::Validate;

use subpool_core::error::AppError;

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, LoginResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let user = state
        .auth
        .register(&req.username, req.email, &req.password)
        .await?;

    Ok(Json(ApiResponse::ok(user.into())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let outcome = state.auth.login(&req.username, &req.password).await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token: outcome.access_token,
        expires_at: outcome.expires_at,
        user: outcome.user.into(),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.auth.current_user(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}
