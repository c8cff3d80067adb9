/**
 * Backend Error Types
 *
 * This module defines the error type returned by every HTTP handler.
 *
 * # Error Categories
 *
 * ## Request Errors
 *
 * Caused by the client and reported back verbatim:
 * - Invalid request bodies (`SharedError` validation failures)
 * - Missing or rejected bearer tokens
 * - Conversations that do not exist or belong to someone else
 *
 * ## Internal Errors
 *
 * Caused by the server's dependencies. The client only sees a generic
 * message; the details are logged:
 * - Database and migration failures
 * - Model client failures
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::auth::verifier::AuthError;
use crate::backend::chat::model::ModelError;
use crate::backend::server::config::ConfigError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use parlour::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err = BackendError::not_found("conversation");
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// The requested resource does not exist for this user
    #[error("{resource} not found")]
    NotFound {
        /// Kind of resource, e.g. `conversation`
        resource: &'static str,
    },

    /// Bearer token missing or rejected
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Invalid request data
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Database query failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Chat model failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error for a resource kind
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `NotFound` - 404 Not Found
    /// - `Auth` - 401 Unauthorized, or 503 when the key set is unreachable
    /// - `SharedError` - 400 Bad Request, 500 for serialization failures
    /// - `Model` - 502 Bad Gateway
    /// - Everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Auth(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::MessageError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::Model(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_)
            | Self::Migration(_)
            | Self::Config(_)
            | Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message shown to clients
    ///
    /// Internal failures are reduced to a generic message so driver and
    /// model details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::NotFound { .. } => self.to_string(),
            Self::Auth(err) if err.is_unavailable() => {
                "Token verification is temporarily unavailable".to_string()
            }
            Self::Auth(_) => "Invalid or missing bearer token".to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::Model(_) => "The chat model is unavailable".to_string(),
            Self::Database(_) | Self::Migration(_) => "Database error".to_string(),
            Self::Config(_) | Self::SerializationError(_) => "Internal server error".to_string(),
        }
    }
}
