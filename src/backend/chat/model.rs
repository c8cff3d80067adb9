//! Chat model client
//!
//! [`ChatModel`] is the seam between the chat pipeline and whatever produces
//! tokens. The production implementation drives an Ollama server through the
//! `genai` client; tests substitute scripted models.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent};
use genai::resolver::{Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use thiserror::Error;

use crate::backend::server::config::ModelSettings;
use crate::shared::{ChatEntry, Role};

/// Endpoint used when no base URL is configured
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/";

/// Chat model failures
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request could not be started
    #[error("model request failed: {0}")]
    Request(String),
    /// The response stream broke off
    #[error("model stream failed: {0}")]
    Stream(String),
}

/// Text fragments of a reply, in order
pub type TokenStream = BoxStream<'static, Result<String, ModelError>>;

/// Common interface for streaming chat models
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model name reported by the info endpoint and stored on conversations
    fn name(&self) -> &str;

    /// Streams the reply to `messages` token by token
    async fn stream_chat(&self, messages: &[ChatEntry]) -> Result<TokenStream, ModelError>;
}

/// [`ChatModel`] backed by an Ollama server
pub struct OllamaChatModel {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl OllamaChatModel {
    /// Build a client pinned to the Ollama adapter
    ///
    /// Model names are routed to Ollama even when they look like another
    /// provider's, and `base_url` replaces the default local endpoint.
    pub fn from_settings(settings: &ModelSettings) -> Self {
        let base_url = normalize_base_url(settings.base_url.as_deref());
        tracing::info!("Using Ollama model {} at {}", settings.name, base_url);

        let resolver = ServiceTargetResolver::from_resolver_fn(
            move |service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                let ServiceTarget { auth, model, .. } = service_target;
                Ok(ServiceTarget {
                    endpoint: Endpoint::from_owned(base_url.clone()),
                    auth,
                    model: ModelIden::new(AdapterKind::Ollama, model.model_name),
                })
            },
        );

        let client = Client::builder()
            .with_service_target_resolver(resolver)
            .build();

        let mut options = ChatOptions::default();
        if let Some(temperature) = settings.temperature {
            options = options.with_temperature(temperature);
        }

        Self {
            client,
            model: settings.name.clone(),
            options,
        }
    }
}

fn normalize_base_url(base_url: Option<&str>) -> String {
    match base_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) if url.ends_with('/') => url.to_string(),
        Some(url) => format!("{}/", url),
        None => DEFAULT_OLLAMA_URL.to_string(),
    }
}

fn to_chat_message(entry: &ChatEntry) -> ChatMessage {
    let content = entry.content.clone();
    match entry.role {
        Role::System => ChatMessage::system(content),
        Role::User => ChatMessage::user(content),
        Role::Assistant => ChatMessage::assistant(content),
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, messages: &[ChatEntry]) -> Result<TokenStream, ModelError> {
        let request = ChatRequest::new(messages.iter().map(to_chat_message).collect());

        let response = self
            .client
            .exec_chat_stream(self.model.as_str(), request, Some(&self.options))
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        // Only answer text is forwarded; reasoning and tool events are dropped.
        let tokens = response.stream.filter_map(|event| async move {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => Some(Ok(chunk.content)),
                Ok(_) => None,
                Err(e) => {
                    tracing::error!("Ollama stream error: {:?}", e);
                    Some(Err(ModelError::Stream(e.to_string())))
                }
            }
        });

        Ok(tokens.boxed())
    }
}
