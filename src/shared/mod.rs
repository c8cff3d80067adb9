//! Shared Module
//!
//! This module contains the types exchanged between the backend and the
//! browser client. Everything here is plain serializable data: request
//! bodies, response views and the Server-Sent Event envelope used while a
//! reply is streamed.

/// Chat turn requests, model input entries and the SSE envelope
pub mod chat;

/// Conversation, message and account views
pub mod conversation;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use chat::{ChatEntry, ChatRequest, Role, StreamEvent};
pub use conversation::{
    ConversationDetail, ConversationView, CreateConversationRequest, MessageView, PublicConfig,
    RenameConversationRequest, UserView,
};
pub use error::SharedError;
