//! `GET /api/config`: the settings the browser needs before sign-in

use axum::{extract::State, response::Json};

use crate::backend::server::state::AppState;
use crate::shared::PublicConfig;

pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    let config = &state.config;
    Json(PublicConfig {
        client_id: config.auth.audience.clone(),
        issuer: config.auth.issuers.first().cloned(),
        model: state.model.name().to_string(),
        dev_login: config.auth.dev_login,
    })
}
