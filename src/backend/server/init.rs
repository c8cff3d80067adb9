/**
 * Server Initialization
 *
 * This module builds the application state and the router.
 *
 * # Initialization Process
 *
 * 1. Connect to the database and run pending migrations
 * 2. Build the token verifier (JWKS or shared secret)
 * 3. Build the Ollama-backed chat model client
 * 4. Create the router with all routes
 *
 * Unlike optional integrations, the database is required: a server that
 * cannot store conversations fails at startup instead of serving 503s.
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::auth::verifier::TokenVerifier;
use crate::backend::chat::model::{ChatModel, OllamaChatModel};
use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{connect_database, run_migrations, AppConfig};
use crate::backend::server::state::AppState;

/// Connect every service the handlers need
pub async fn build_state(config: AppConfig) -> Result<AppState, BackendError> {
    tracing::info!("Initializing Parlour backend");

    let db = connect_database(&config.database).await?;
    run_migrations(&db).await?;

    let verifier = TokenVerifier::from_settings(&config.auth)?;
    let model: Arc<dyn ChatModel> = Arc::new(OllamaChatModel::from_settings(&config.model));

    Ok(AppState::new(config, db, verifier, model))
}

/// Build the state and the router in one step
pub async fn create_app(config: AppConfig) -> Result<Router<()>, BackendError> {
    let app_state = build_state(config).await?;
    let app = create_router(app_state);
    tracing::info!("Router configured");
    Ok(app)
}
