//! Conversations Module
//!
//! Storage and HTTP handlers for conversations and their messages.
//!
//! - **`db`** - Repository functions over the `conversations` and `messages` tables
//! - **`handlers`** - `/api/conversations` endpoints

/// Database operations for conversations and messages
pub mod db;

/// Conversation HTTP handlers
pub mod handlers;

pub use db::{Conversation, StoredMessage};
