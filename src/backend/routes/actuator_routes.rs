//! `/actuator` routes; unauthenticated

use axum::{routing::get, Router};

use crate::backend::actuator::{health, info};
use crate::backend::server::state::AppState;

pub fn configure_actuator_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/actuator/health", get(health))
        .route("/actuator/info", get(info))
}
