/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct is the central state container, holding:
 * - The loaded configuration
 * - The SQLite connection pool
 * - The bearer token verifier (with its JWKS cache)
 * - The chat model client
 * - A tracker for reply tasks still running in the background
 *
 * Every field is cheap to clone: the pool and the tracker are reference
 * counted internally and the rest sit behind `Arc`.
 *
 * # Example
 *
 * ```rust,ignore
 * use axum::extract::State;
 * use sqlx::SqlitePool;
use tokio_util::task::TaskTracker;
 *
 * async fn handler(State(db): State<SqlitePool>) {
 *     // query with db
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;
use tokio_util::task::TaskTracker;

use crate::backend::auth::verifier::TokenVerifier;
use crate::backend::chat::model::ChatModel;
use crate::backend::server::config::AppConfig;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Configuration the server was started with
    pub config: Arc<AppConfig>,

    /// Database connection pool
    pub db: SqlitePool,

    /// Verifies bearer tokens on protected routes
    pub verifier: Arc<TokenVerifier>,

    /// Produces assistant replies
    pub model: Arc<dyn ChatModel>,

    /// Reply tasks; shutdown waits for them so replies are not lost
    pub turns: TaskTracker,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: SqlitePool,
        verifier: TokenVerifier,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            verifier: Arc::new(verifier),
            model,
            turns: TaskTracker::new(),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}
