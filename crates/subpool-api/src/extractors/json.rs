//! JSON body extractor with domain error rendering.
//!
//! Missing or malformed request bodies are contract violations, so they
//! surface as 400 validation errors rather than axum's default 422.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use subpool_core::error::AppError;

use crate::error::ApiError;

/// Drop-in replacement for [`axum::Json`] in handler signatures.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::from(AppError::validation(rejection_message(
                &rejection,
            )))),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected a request with Content-Type: application/json".to_string()
        }
        other => other.body_text(),
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::post;
    use tower::ServiceExt;

    use super::Json;
    use crate::dto::request::RequestSlotBody;

    async fn accept(Json(_body): Json<RequestSlotBody>) -> StatusCode {
        StatusCode::OK
    }

    fn app() -> Router {
        Router::new().route("/slots", post(accept))
    }

    async fn post_json(body: &'static str) -> StatusCode {
        let response = app()
            .oneshot(
                Request::post("/slots")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn missing_required_field_is_a_bad_request() {
        assert_eq!(post_json(r#"{"countryId":null}"#).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        assert_eq!(post_json("{not json").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn well_formed_body_is_accepted() {
        let status = post_json(
            r#"{"serviceProviderId":"8c2df5d1-6fd1-4d25-bbcd-031be7ea6b57"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
