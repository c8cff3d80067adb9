//! Chat Handlers Module
//!
//! Axum handlers for chat endpoints.
//!
//! - **`stream`** - Streaming reply handler (POST /api/conversations/{id}/chat)

/// Streaming reply handler
pub mod stream;

pub use stream::stream_chat;
