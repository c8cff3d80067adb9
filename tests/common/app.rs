//! Application fixture
//!
//! Each `TestApp` owns a fresh in-memory database and a router built exactly
//! as the server builds it, with the model replaced by a `ScriptedModel` and
//! tokens signed with a shared secret.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use parlour::backend::auth::TokenVerifier;
use parlour::backend::routes::create_router;
use parlour::backend::server::config::{connect_database, run_migrations};
use parlour::backend::server::{AppConfig, AppState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

use super::model::ScriptedModel;

pub const TEST_SECRET: &str = "parlour-integration-signing-secret";

/// Configuration for an isolated test server
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.auth.shared_secret = Some(TEST_SECRET.to_string());
    config.auth.dev_login = true;
    config.server.static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public");
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub model: Arc<ScriptedModel>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Response is not the expected JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl TestApp {
    pub async fn new(model: ScriptedModel) -> Self {
        Self::with_config(test_config(), model).await
    }

    pub async fn with_config(config: AppConfig, model: ScriptedModel) -> Self {
        let db = connect_database(&config.database)
            .await
            .expect("Failed to open test database");
        run_migrations(&db).await.expect("Failed to run migrations");

        let verifier = TokenVerifier::from_settings(&config.auth).expect("Failed to build verifier");
        let model = Arc::new(model);
        let state = AppState::new(config, db, verifier, model.clone());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            model,
        }
    }

    /// Development token for `email`
    pub fn token_for(&self, email: &str) -> String {
        self.state
            .verifier
            .issue_dev_token(&format!("dev:{}", email), Some(email.to_string()), None)
            .expect("Failed to issue test token")
    }

    pub fn request_builder(
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Self::request_builder(Method::GET, uri, token, None))
            .await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Self::request_builder(Method::POST, uri, token, Some(body)))
            .await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Self::request_builder(Method::PATCH, uri, token, Some(body)))
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Self::request_builder(Method::DELETE, uri, token, None))
            .await
    }

    /// Create a conversation and return its id
    pub async fn create_conversation(&self, token: &str) -> String {
        let response = self
            .post("/api/conversations", Some(token), serde_json::json!({}))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json::<Value>()["id"]
            .as_str()
            .expect("conversation id")
            .to_string()
    }
}
