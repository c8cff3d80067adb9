//! Backend Module
//!
//! This module contains all server-side code: an Axum HTTP server exposing a
//! REST and Server-Sent Events API over a SQLite database, plus the static
//! single-page app.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Route configuration and router assembly
//! - **`auth`** - Bearer token verification and user accounts
//! - **`middleware`** - Authentication middleware and the `AuthUser` extractor
//! - **`conversations`** - Conversation and message storage and CRUD handlers
//! - **`chat`** - Streaming replies: model client, filter, save strategies
//! - **`actuator`** - Health and info endpoints
//! - **`error`** - Backend error types and their HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Config, state, initialization
//! ├── routes/         - Route configuration
//! ├── auth/           - Token verification, users
//! ├── middleware/     - Request middleware
//! ├── conversations/  - Conversation CRUD
//! ├── chat/           - Streaming chat pipeline
//! ├── actuator/       - Operational endpoints
//! └── error/          - Error types
//! ```
//!
//! # Streaming Replies
//!
//! `POST /api/conversations/{id}/chat` saves the prompt, then spawns a task
//! that reads the model's token stream, forwards each filtered chunk as an
//! SSE `token` event and, when the stream ends, saves the whole reply through
//! the selected `MessageSaveStrategy` before sending `done`. The task does not
//! depend on the HTTP connection, so a reply is saved even if the browser
//! goes away mid-stream.
//!
//! # Error Handling
//!
//! Handlers return `Result<_, BackendError>`; `BackendError` maps each
//! failure to a status code and a JSON body and keeps internal details in
//! the logs.

/// Health and info endpoints
pub mod actuator;

/// Authentication and user management
pub mod auth;

/// Streaming chat pipeline
pub mod chat;

/// Conversation storage and handlers
pub mod conversations;

/// Backend error types
pub mod error;

/// Middleware for request processing
pub mod middleware;

/// Route configuration
pub mod routes;

/// Server setup and configuration
pub mod server;

#[cfg(test)]
mod test_support;

pub use error::BackendError;
pub use server::{create_app, AppConfig, AppState};
