//! Conversation and account DTOs
//!
//! These are the JSON shapes returned by the REST endpoints. They never carry
//! database-only fields such as the owning user's id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::chat::Role;
use crate::shared::error::SharedError;

/// Title given to conversations created without one
pub const DEFAULT_TITLE: &str = "New chat";

/// Longest accepted conversation title, in characters
pub const MAX_TITLE_CHARS: usize = 200;

/// Longest title derived from a first prompt, in characters
const DERIVED_TITLE_CHARS: usize = 60;

/// Conversation summary as listed in the sidebar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationView {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation together with its full message history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: ConversationView,
    pub messages: Vec<MessageView>,
}

/// Body of `POST /api/conversations`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Body of `PATCH /api/conversations/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConversationRequest {
    pub title: String,
}

/// Current user as returned by `GET /api/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

/// Unauthenticated client bootstrap settings from `GET /api/config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicConfig {
    /// OAuth client id for the sign-in button, if configured
    pub client_id: Option<String>,
    /// Primary accepted token issuer
    pub issuer: Option<String>,
    /// Model that answers chat turns
    pub model: String,
    /// Whether `POST /api/auth/dev-token` is available
    pub dev_login: bool,
}

/// Trim and check a user-supplied title
pub fn normalize_title(raw: &str) -> Result<String, SharedError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(SharedError::validation("title", "Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(SharedError::validation(
            "title",
            format!("Title cannot exceed {} characters", MAX_TITLE_CHARS),
        ));
    }
    Ok(title.to_string())
}

/// Title derived from the first prompt of a conversation
///
/// Uses the first non-blank line, cut to 60 characters with a trailing
/// ellipsis when cut. Returns `None` for a blank prompt.
pub fn derive_title(prompt: &str) -> Option<String> {
    let line = prompt.lines().map(str::trim).find(|l| !l.is_empty())?;
    if line.chars().count() <= DERIVED_TITLE_CHARS {
        return Some(line.to_string());
    }
    let cut: String = line.chars().take(DERIVED_TITLE_CHARS - 1).collect();
    Some(format!("{}…", cut.trim_end()))
}
