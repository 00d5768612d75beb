//! `AuthUser` extractor — pulls the JWT from the Authorization header,
//! validates it, and loads the account.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use subpool_core::error::AppError;
use subpool_entity::user::UserRole;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Authenticated user ID.
    pub user_id: Uuid,
    /// Username from the directory.
    pub username: String,
    /// Current role.
    pub role: UserRole,
}

impl AuthUser {
    /// Fails with a forbidden error unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::authorization("Administrator access required"))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let claims = state.auth.verify_token(token)?;

        // The directory is the source of truth for role and suspension;
        // stale claims are not trusted past this point.
        let user = state.auth.current_user(claims.user_id()).await?;

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}
