/**
 * Error Conversion
 *
 * This module converts backend errors into HTTP responses so handlers can
 * return `Result<_, BackendError>` directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "conversation not found",
 *   "status": 404
 * }
 * ```
 */

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status.as_u16(), self);
        } else {
            tracing::warn!("Request rejected with {}: {}", status.as_u16(), self);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        BackendError::handler(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for BackendError {
    fn from(rejection: PathRejection) -> Self {
        BackendError::handler(rejection.status(), rejection.body_text())
    }
}

/// Map a bare status code into the JSON error shape
///
/// Used by middleware that rejects a request before any handler runs.
pub fn status_response(status: StatusCode, message: &str) -> Response {
    BackendError::handler(status, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_response_body() {
        let response = BackendError::not_found("conversation").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "conversation not found");
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_status_response() {
        let response = status_response(StatusCode::UNAUTHORIZED, "Missing token");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
