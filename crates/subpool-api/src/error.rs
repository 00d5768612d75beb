//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use subpool_core::error::{AppError, ErrorKind};

/// Wrapper giving domain errors an HTTP rendering.
///
/// Handlers return `Result<_, ApiError>`; the `?` operator lifts any
/// `AppError` through the `From` impl below.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::AlreadyAssigned => (StatusCode::CONFLICT, "ALREADY_ASSIGNED"),
            ErrorKind::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::Internal => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: err.message.clone(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn error_kinds_map_to_expected_statuses() {
        assert_eq!(
            status_of(AppError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::authentication("who")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::authorization("no")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(AppError::not_found("gone")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::already_assigned("dup")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::database("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
