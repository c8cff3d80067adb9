//! Actuator HTTP Handlers
//!
//! Unauthenticated operational endpoints for load balancers and deploy
//! tooling.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::backend::server::state::AppState;

const UP: &str = "UP";
const DOWN: &str = "DOWN";

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Components {
    pub db: ComponentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: Components,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub model: String,
}

impl ComponentStatus {
    fn up() -> Self {
        Self {
            status: UP.to_string(),
        }
    }

    fn down() -> Self {
        Self {
            status: DOWN.to_string(),
        }
    }

    fn is_up(&self) -> bool {
        self.status == UP
    }
}

/// Health check (GET /actuator/health)
///
/// 200 with `UP` when the database answers, 503 with `DOWN` otherwise.
pub async fn health(State(db): State<SqlitePool>) -> impl IntoResponse {
    let db_status = match sqlx::query("SELECT 1").execute(&db).await {
        Ok(_) => ComponentStatus::up(),
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            ComponentStatus::down()
        }
    };

    let (code, status) = if db_status.is_up() {
        (StatusCode::OK, UP)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, DOWN)
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            components: Components { db: db_status },
        }),
    )
}

/// Build information (GET /actuator/info)
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.model.name().to_string(),
    })
}
