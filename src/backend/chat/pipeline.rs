/**
 * Streaming Chat Pipeline
 *
 * This module turns a model's token stream into the events of a Server-Sent
 * Event response while buffering the complete reply for the save strategy.
 *
 * # Flow
 *
 * ```text
 * model tokens ──► ContentFilter ──► buffer ──► strategy.save() ──► done
 *                                     │
 *                                     └──────► token events ──► SSE client
 * ```
 *
 * The model stream is driven by a spawned task, not by the HTTP response.
 * When the client disconnects the task stops forwarding events but still
 * reads the reply to the end and saves it.
 *
 * # Outcomes
 *
 * - Blank reply: `done` with `saved = false`, nothing written
 * - Reply saved: `done` with the stored message id (none for ephemeral turns)
 * - Model failure before or during the stream: `error`, nothing written
 * - Save failure: `error`
 */

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::backend::chat::filter::ContentFilter;
use crate::backend::chat::model::ChatModel;
use crate::backend::chat::strategy::MessageSaveStrategy;
use crate::shared::{ChatEntry, Role, StreamEvent};

/// Everything needed to produce one assistant reply
pub struct ChatTurn {
    pub conversation_id: Uuid,
    /// Model input, ending with the user's prompt
    pub history: Vec<ChatEntry>,
    pub strategy: Arc<dyn MessageSaveStrategy>,
    pub filter: ContentFilter,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The reply finished; `message_id` is set when the strategy stored it
    Completed {
        message_id: Option<Uuid>,
        content: String,
    },
    /// The model produced no visible text
    Empty,
    /// The model or the save step failed
    Failed(String),
}

/// A turn running in the background
pub struct RunningTurn {
    /// Events for the SSE response; closes after the terminal event
    pub events: mpsc::Receiver<StreamEvent>,
    /// Resolves once the reply has been read and saved
    pub task: JoinHandle<TurnOutcome>,
}

/// Start producing a reply
///
/// `buffer` bounds how many events may queue up for a slow client before
/// the model stream is paused. The task is spawned on `tasks` so shutdown
/// can wait for replies whose client has already gone.
pub fn spawn_chat_turn(
    model: Arc<dyn ChatModel>,
    turn: ChatTurn,
    buffer: usize,
    tasks: &TaskTracker,
) -> RunningTurn {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let task = tasks.spawn(run_turn(model, turn, tx));
    RunningTurn { events: rx, task }
}

/// Forwards events until the client goes away
struct EventSink {
    conversation_id: Uuid,
    tx: mpsc::Sender<StreamEvent>,
    client_connected: bool,
}

impl EventSink {
    async fn token(&mut self, content: String) {
        if self.client_connected && self.tx.send(StreamEvent::token(content)).await.is_err() {
            self.client_connected = false;
            tracing::info!(
                "Client left conversation {}; finishing reply in the background",
                self.conversation_id
            );
        }
    }

    async fn finish(self, event: StreamEvent) {
        if self.client_connected {
            let _ = self.tx.send(event).await;
        }
    }
}

async fn run_turn(
    model: Arc<dyn ChatModel>,
    turn: ChatTurn,
    tx: mpsc::Sender<StreamEvent>,
) -> TurnOutcome {
    let ChatTurn {
        conversation_id,
        history,
        strategy,
        mut filter,
    } = turn;

    let mut sink = EventSink {
        conversation_id,
        tx,
        client_connected: true,
    };

    let mut tokens = match model.stream_chat(&history).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!("Model {} failed to start for {}: {}", model.name(), conversation_id, e);
            sink.finish(StreamEvent::error("The chat model is unavailable")).await;
            return TurnOutcome::Failed(e.to_string());
        }
    };

    let mut reply = String::new();

    while let Some(item) = tokens.next().await {
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::error!("Model stream for {} broke off: {}", conversation_id, e);
                sink.finish(StreamEvent::error("The chat model stopped unexpectedly")).await;
                return TurnOutcome::Failed(e.to_string());
            }
        };

        if let Some(content) = filter.apply(&chunk) {
            reply.push_str(&content);
            sink.token(content).await;
        }
    }

    if let Some(tail) = filter.finish() {
        reply.push_str(&tail);
        sink.token(tail).await;
    }

    if reply.trim().is_empty() {
        tracing::warn!("Model returned an empty reply for {}", conversation_id);
        sink.finish(StreamEvent::Done {
            conversation_id,
            message_id: None,
            saved: false,
        })
        .await;
        return TurnOutcome::Empty;
    }

    match strategy.save(conversation_id, Role::Assistant, &reply).await {
        Ok(message_id) => {
            tracing::info!(
                "Reply for {} complete ({} chars, strategy {})",
                conversation_id,
                reply.chars().count(),
                strategy.name()
            );
            sink.finish(StreamEvent::Done {
                conversation_id,
                message_id,
                saved: message_id.is_some(),
            })
            .await;
            TurnOutcome::Completed {
                message_id,
                content: reply,
            }
        }
        Err(e) => {
            tracing::error!("Failed to save reply for {}: {}", conversation_id, e);
            sink.finish(StreamEvent::error("Failed to save the reply")).await;
            TurnOutcome::Failed(e.to_string())
        }
    }
}
