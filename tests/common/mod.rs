//! Common test utilities and helpers
//!
//! - `app` - In-memory application fixture driven through `tower::ServiceExt`
//! - `model` - Scripted chat model standing in for Ollama
//! - `sse` - Parser for Server-Sent Event bodies

#![allow(dead_code)]

pub mod app;
pub mod model;
pub mod sse;

pub use app::*;
pub use model::*;
pub use sse::*;
