//! Chat Backend Module
//!
//! This module turns a prompt into a streamed, saved assistant reply.
//!
//! # Architecture
//!
//! - **`model`** - `ChatModel` trait and the Ollama client behind it
//! - **`filter`** - Per-reply chunk filter
//! - **`strategy`** - Pluggable message save strategies
//! - **`pipeline`** - Spawned task that drives a reply to completion
//! - **`handlers`** - The SSE endpoint
//!
//! # Example
//!
//! ```rust,ignore
//! use parlour::backend::chat::{spawn_chat_turn, select_strategy, ChatTurn, ContentFilter};
//!
//! let turn = ChatTurn {
//!     conversation_id,
//!     history,
//!     strategy: select_strategy(&pool, false),
//!     filter: ContentFilter::new(false),
//! };
//! let mut running = spawn_chat_turn(model, turn, 64);
//! while let Some(event) = running.events.recv().await {
//!     // forward event
//! }
//! ```

/// Content filter for reply chunks
pub mod filter;

/// SSE chat handlers
pub mod handlers;

/// Chat model client
pub mod model;

/// Streaming reply pipeline
pub mod pipeline;

/// Message save strategies
pub mod strategy;

pub use filter::ContentFilter;
pub use handlers::stream_chat;
pub use model::{ChatModel, ModelError, OllamaChatModel, TokenStream};
pub use pipeline::{spawn_chat_turn, ChatTurn, RunningTurn, TurnOutcome};
pub use strategy::{select_strategy, EphemeralStrategy, MessageSaveStrategy, PersistStrategy};
