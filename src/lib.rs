//! Parlour - Streaming Chat Server
//!
//! Parlour serves a browser chat app backed by a local Ollama model. Users
//! sign in with an OAuth provider, keep conversations in SQLite and receive
//! replies token by token over Server-Sent Events.
//!
//! # Module Structure
//!
//! - **`shared`** - Request/response types and the SSE envelope
//! - **`backend`** - Axum server, auth, storage and the chat pipeline
//!
//! # Usage
//!
//! ```rust,no_run
//! use parlour::backend::server::{create_app, AppConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(AppConfig::load(None)?).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
