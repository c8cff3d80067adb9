/**
 * Message Save Strategies
 *
 * A save strategy decides what happens to each message of a chat turn: the
 * user's prompt before the model is called and the assistant's full reply
 * once its stream has completed.
 *
 * # Strategies
 *
 * - `PersistStrategy` - Writes the message and bumps the conversation's
 *   `updated_at`
 * - `EphemeralStrategy` - Writes nothing; used for temporary chats
 *
 * `select_strategy` is the only place that chooses between them.
 */

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::conversations::db::{insert_message, touch_conversation};
use crate::backend::error::BackendError;
use crate::shared::Role;

/// Pluggable handling of chat messages
#[async_trait]
pub trait MessageSaveStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Save one message; returns the stored message id, if any
    async fn save(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Option<Uuid>, BackendError>;
}

/// Writes messages to the database
pub struct PersistStrategy {
    pool: SqlitePool,
}

impl PersistStrategy {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageSaveStrategy for PersistStrategy {
    fn name(&self) -> &'static str {
        "persist"
    }

    async fn save(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Option<Uuid>, BackendError> {
        let message = insert_message(&self.pool, conversation_id, role, content).await?;
        touch_conversation(&self.pool, conversation_id).await?;
        tracing::debug!(
            "Saved {} message {} ({} chars) to conversation {}",
            role,
            message.id,
            content.chars().count(),
            conversation_id
        );
        Ok(Some(message.id))
    }
}

/// Drops messages
pub struct EphemeralStrategy;

#[async_trait]
impl MessageSaveStrategy for EphemeralStrategy {
    fn name(&self) -> &'static str {
        "ephemeral"
    }

    async fn save(
        &self,
        conversation_id: Uuid,
        role: Role,
        _content: &str,
    ) -> Result<Option<Uuid>, BackendError> {
        tracing::debug!(
            "Not saving {} message for temporary chat in conversation {}",
            role,
            conversation_id
        );
        Ok(None)
    }
}

/// Choose the save strategy for a chat turn
pub fn select_strategy(pool: &SqlitePool, temporary: bool) -> Arc<dyn MessageSaveStrategy> {
    if temporary {
        Arc::new(EphemeralStrategy)
    } else {
        Arc::new(PersistStrategy::new(pool.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::conversations::db::{create_conversation, list_messages};
    use crate::backend::test_support::{memory_pool, test_user};

    #[tokio::test]
    async fn test_select_strategy() {
        let pool = memory_pool().await;
        assert_eq!(select_strategy(&pool, true).name(), "ephemeral");
        assert_eq!(select_strategy(&pool, false).name(), "persist");
    }

    #[tokio::test]
    async fn test_persist_strategy_writes_message() {
        let pool = memory_pool().await;
        let user = test_user(&pool).await;
        let conversation = create_conversation(&pool, user.id, "Chat", "m").await.unwrap();

        let id = PersistStrategy::new(pool.clone())
            .save(conversation.id, Role::Assistant, "Hello there")
            .await
            .unwrap();

        let messages = list_messages(&pool, conversation.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(Some(messages[0].id), id);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, "Hello there");
    }

    #[tokio::test]
    async fn test_ephemeral_strategy_writes_nothing() {
        let pool = memory_pool().await;
        let user = test_user(&pool).await;
        let conversation = create_conversation(&pool, user.id, "Chat", "m").await.unwrap();

        let id = EphemeralStrategy
            .save(conversation.id, Role::User, "secret")
            .await
            .unwrap();

        assert!(id.is_none());
        assert!(list_messages(&pool, conversation.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_strategy_fails_for_missing_conversation() {
        let pool = memory_pool().await;
        let result = PersistStrategy::new(pool)
            .save(Uuid::new_v4(), Role::User, "orphan")
            .await;
        assert!(matches!(result, Err(BackendError::Database(_))));
    }
}
