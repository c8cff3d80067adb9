//! Request extractors with JSON rejections
//!
//! axum's own `Json` and `Path` extractors reject with plain-text bodies.
//! These wrappers report the same failures through `BackendError`, so a
//! malformed body or id gets the usual `{"error", "status"}` response.

use axum::extract::{FromRequest, FromRequestParts};

use crate::backend::error::BackendError;

/// `axum::Json` that rejects with a `BackendError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(BackendError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` that rejects with a `BackendError`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(BackendError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Payload {
        title: String,
    }

    async fn echo(ApiPath(id): ApiPath<Uuid>, ApiJson(payload): ApiJson<Payload>) -> String {
        format!("{} {}", id, payload.title)
    }

    fn app() -> Router {
        Router::new().route("/items/{id}", post(echo))
    }

    async fn send(uri: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_valid_request_passes_through() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .method("POST")
            .uri(format!("/items/{}", id))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Trip"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_path_is_json_error() {
        let (status, body) = send("/items/not-a-uuid", r#"{"title":"Trip"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let uri = format!("/items/{}", Uuid::new_v4());

        let (status, body) = send(&uri, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let (status, body) = send(&uri, r#"{"name":"x"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);
    }
}
