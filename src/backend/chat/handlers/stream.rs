/**
 * Streaming Chat Handler
 *
 * `POST /api/conversations/{id}/chat` answers with a Server-Sent Event
 * stream of the assistant's reply.
 *
 * # Request
 *
 * ```json
 * { "message": "How do lifetimes work?", "temporary": false }
 * ```
 *
 * # Response
 *
 * ```http
 * HTTP/1.1 200 OK
 * Content-Type: text/event-stream
 * Cache-Control: no-cache
 * X-Accel-Buffering: no
 *
 * event: token
 * data: {"type":"token","content":"Lifetimes"}
 *
 * event: done
 * data: {"type":"done","conversation_id":"…","message_id":"…","saved":true}
 * ```
 *
 * Validation, ownership and database failures are reported as ordinary JSON
 * errors before the stream starts. Once streaming, failures arrive as an
 * `error` event.
 */

use axum::{
    extract::State,
    http::{header::HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::backend::chat::filter::ContentFilter;
use crate::backend::chat::pipeline::{spawn_chat_turn, ChatTurn};
use crate::backend::chat::strategy::select_strategy;
use crate::backend::conversations::db::{
    get_conversation, recent_messages, set_title_if_default, StoredMessage,
};
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, ApiPath, AuthUser};
use crate::backend::server::state::AppState;
use crate::shared::conversation::derive_title;
use crate::shared::{ChatEntry, ChatRequest, Role, StreamEvent};

/// Stream a reply to a new prompt (POST /api/conversations/{id}/chat)
///
/// # Steps
///
/// 1. Validate the prompt (non-blank, within `chat.max_message_chars`)
/// 2. Load the caller's conversation (404 otherwise)
/// 3. Build the model input: system prompt, recent history, new prompt
/// 4. Save the prompt through the selected strategy
/// 5. Title the conversation after its first persisted prompt
/// 6. Spawn the reply and stream its events
pub async fn stream_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(conversation_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<impl IntoResponse, BackendError> {
    let settings = &state.config.chat;
    request.validate(settings.max_message_chars)?;

    get_conversation(&state.db, user.user_id, conversation_id)
        .await?
        .ok_or_else(|| BackendError::not_found("conversation"))?;

    let previous = recent_messages(&state.db, conversation_id, settings.history_limit).await?;
    let history = build_history(
        state.config.model.system_prompt.as_deref(),
        previous,
        &request.message,
    );

    let strategy = select_strategy(&state.db, request.temporary);
    strategy
        .save(conversation_id, Role::User, &request.message)
        .await?;

    if !request.temporary {
        if let Some(title) = derive_title(&request.message) {
            if set_title_if_default(&state.db, conversation_id, &title).await? {
                tracing::debug!("Titled conversation {} \"{}\"", conversation_id, title);
            }
        }
    }

    tracing::info!(
        "Streaming reply for conversation {} ({} context messages, strategy {})",
        conversation_id,
        history.len(),
        strategy.name()
    );

    let turn = ChatTurn {
        conversation_id,
        history,
        strategy,
        filter: ContentFilter::new(settings.strip_reasoning),
    };
    let running = spawn_chat_turn(
        state.model.clone(),
        turn,
        settings.stream_buffer,
        &state.turns,
    );

    let stream = ReceiverStream::new(running.events).map(|event| to_sse_event(&event));

    Ok((
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    ))
}

/// Model input for a turn, oldest first
fn build_history(
    system_prompt: Option<&str>,
    previous: Vec<StoredMessage>,
    prompt: &str,
) -> Vec<ChatEntry> {
    let mut history = Vec::with_capacity(previous.len() + 2);

    if let Some(system) = system_prompt.map(str::trim).filter(|s| !s.is_empty()) {
        history.push(ChatEntry::system(system));
    }
    history.extend(
        previous
            .into_iter()
            .map(|message| ChatEntry::new(message.role, message.content)),
    );
    history.push(ChatEntry::user(prompt));

    history
}

/// SSE event named after the envelope's type, carrying the envelope as JSON
fn to_sse_event(event: &StreamEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.event_name()).json_data(event)
}
