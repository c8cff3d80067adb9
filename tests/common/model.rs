//! Scripted chat model

use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use parlour::backend::chat::{ChatModel, ModelError, TokenStream};
use parlour::shared::ChatEntry;

/// Replays a fixed reply and records what it was asked
pub struct ScriptedModel {
    chunks: Vec<String>,
    failure: Option<String>,
    unavailable: bool,
    calls: Mutex<Vec<Vec<ChatEntry>>>,
}

impl ScriptedModel {
    pub fn replying(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            failure: None,
            unavailable: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_after(chunks: &[&str], error: &str) -> Self {
        Self {
            failure: Some(error.to_string()),
            ..Self::replying(chunks)
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::replying(&[])
        }
    }

    /// Inputs of every `stream_chat` call, oldest first
    pub fn calls(&self) -> Vec<Vec<ChatEntry>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_input(&self) -> Vec<ChatEntry> {
        self.calls().pop().unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_chat(&self, messages: &[ChatEntry]) -> Result<TokenStream, ModelError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if self.unavailable {
            return Err(ModelError::Request("connection refused".to_string()));
        }

        let mut items: Vec<Result<String, ModelError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        if let Some(error) = &self.failure {
            items.push(Err(ModelError::Stream(error.clone())));
        }
        Ok(stream::iter(items).boxed())
    }
}
