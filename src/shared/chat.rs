//! Chat wire types
//!
//! Request bodies for a chat turn, the model input entries and the envelope
//! every Server-Sent Event of a streamed reply is wrapped in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Lowercase name used on the wire and in the `messages.role` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(SharedError::validation(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// One turn of model input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
}

impl ChatEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Body of `POST /api/conversations/{id}/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's prompt
    pub message: String,
    /// When set, neither the prompt nor the reply is written to the database
    #[serde(default)]
    pub temporary: bool,
}

impl ChatRequest {
    /// Check the prompt is non-blank and no longer than `max_chars` characters
    pub fn validate(&self, max_chars: usize) -> Result<(), SharedError> {
        if self.message.trim().is_empty() {
            return Err(SharedError::validation("message", "Message cannot be empty"));
        }
        let length = self.message.chars().count();
        if length > max_chars {
            return Err(SharedError::validation(
                "message",
                format!("Message is too long ({} > {} characters)", length, max_chars),
            ));
        }
        Ok(())
    }
}

/// Envelope for one Server-Sent Event of a streamed reply
///
/// The SSE event name is the `type` tag and the data line carries the JSON
/// of the whole envelope, so clients can dispatch on either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// One filtered chunk of the reply
    Token { content: String },
    /// The reply finished; `message_id` is set when it was saved
    Done {
        conversation_id: Uuid,
        message_id: Option<Uuid>,
        saved: bool,
    },
    /// The model or the save step failed; no further events follow
    Error { error: String },
}

impl StreamEvent {
    pub fn token(content: impl Into<String>) -> Self {
        Self::Token {
            content: content.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// SSE `event:` name for this envelope
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamEvent::Token { .. } => "token",
            StreamEvent::Done { .. } => "done",
            StreamEvent::Error { .. } => "error",
        }
    }
}
