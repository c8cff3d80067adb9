//! Conversation HTTP Handlers
//!
//! CRUD over the caller's conversations. Every query is scoped to the
//! authenticated user, so another user's conversation id answers 404.

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use super::db;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, ApiPath, AuthUser};
use crate::backend::server::state::AppState;
use crate::shared::conversation::{normalize_title, DEFAULT_TITLE};
use crate::shared::{
    ConversationDetail, ConversationView, CreateConversationRequest, MessageView,
    RenameConversationRequest,
};

/// List the caller's conversations (GET /api/conversations)
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ConversationView>>, BackendError> {
    let conversations = db::list_conversations(&state.db, user.user_id).await?;
    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

/// Create a conversation (POST /api/conversations)
///
/// The title defaults to `New chat`, which the first prompt replaces.
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationView>), BackendError> {
    let title = match request.title.as_deref() {
        Some(raw) => normalize_title(raw)?,
        None => DEFAULT_TITLE.to_string(),
    };

    let conversation =
        db::create_conversation(&state.db, user.user_id, &title, state.model.name()).await?;
    tracing::info!("User {} created conversation {}", user.user_id, conversation.id);

    Ok((StatusCode::CREATED, Json(conversation.into())))
}

/// Get a conversation with its messages (GET /api/conversations/{id})
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ConversationDetail>, BackendError> {
    let conversation = db::get_conversation(&state.db, user.user_id, id)
        .await?
        .ok_or_else(|| BackendError::not_found("conversation"))?;
    let messages = db::list_messages(&state.db, id).await?;

    Ok(Json(ConversationDetail {
        conversation: conversation.into(),
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

/// Rename a conversation (PATCH /api/conversations/{id})
pub async fn rename_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RenameConversationRequest>,
) -> Result<Json<ConversationView>, BackendError> {
    let title = normalize_title(&request.title)?;

    let conversation = db::rename_conversation(&state.db, user.user_id, id, &title)
        .await?
        .ok_or_else(|| BackendError::not_found("conversation"))?;

    Ok(Json(conversation.into()))
}

/// Delete a conversation and its messages (DELETE /api/conversations/{id})
pub async fn delete_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, BackendError> {
    if !db::delete_conversation(&state.db, user.user_id, id).await? {
        return Err(BackendError::not_found("conversation"));
    }
    tracing::info!("User {} deleted conversation {}", user.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Messages of a conversation, oldest first (GET /api/conversations/{id}/messages)
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<MessageView>>, BackendError> {
    db::get_conversation(&state.db, user.user_id, id)
        .await?
        .ok_or_else(|| BackendError::not_found("conversation"))?;

    let messages = db::list_messages(&state.db, id).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}
