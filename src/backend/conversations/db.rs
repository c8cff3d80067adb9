/**
 * Database Operations for Conversations and Messages
 *
 * Every conversation query takes the owning user's id, so a conversation
 * belonging to someone else is indistinguishable from one that does not
 * exist. Message queries are only reached after such an ownership check.
 */

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::conversation::DEFAULT_TITLE;
use crate::shared::{ConversationView, MessageView, Role};

/// Row of the `conversations` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Model that answered when the conversation was created
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationView {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            model: c.model,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredMessage> for MessageView {
    fn from(m: StoredMessage) -> Self {
        Self {
            id: m.id,
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for StoredMessage {
    type Error = sqlx::Error;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Self {
            id: row.id,
            conversation_id: row.conversation_id,
            role,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

fn into_messages(rows: Vec<MessageRow>) -> Result<Vec<StoredMessage>, sqlx::Error> {
    rows.into_iter().map(StoredMessage::try_from).collect()
}

/// Create a conversation for a user
pub async fn create_conversation(
    pool: &SqlitePool,
    user_id: Uuid,
    title: &str,
    model: &str,
) -> Result<Conversation, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (id, user_id, title, model, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, title, model, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(model)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// List a user's conversations, most recently active first
pub async fn list_conversations(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, user_id, title, model, created_at, updated_at
        FROM conversations
        WHERE user_id = $1
        ORDER BY updated_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Get a conversation owned by `user_id`
pub async fn get_conversation(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, user_id, title, model, created_at, updated_at
        FROM conversations
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Rename a conversation owned by `user_id`
///
/// Returns `None` when no such conversation exists.
pub async fn rename_conversation(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    title: &str,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        UPDATE conversations
        SET title = $1, updated_at = $2
        WHERE id = $3 AND user_id = $4
        RETURNING id, user_id, title, model, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Delete a conversation and, through the foreign key, its messages
///
/// Returns whether a conversation was deleted.
pub async fn delete_conversation(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Bump `updated_at` so the conversation sorts first
pub async fn touch_conversation(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replace the title only while it is still the default
///
/// Returns whether the title changed.
pub async fn set_title_if_default(
    pool: &SqlitePool,
    id: Uuid,
    title: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE conversations SET title = $1 WHERE id = $2 AND title = $3")
        .bind(title)
        .bind(id)
        .bind(DEFAULT_TITLE)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Append a message to a conversation
pub async fn insert_message(
    pool: &SqlitePool,
    conversation_id: Uuid,
    role: Role,
    content: &str,
) -> Result<StoredMessage, sqlx::Error> {
    let row = sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (id, conversation_id, role, content, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, conversation_id, role, content, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conversation_id)
    .bind(role.as_str())
    .bind(content)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    StoredMessage::try_from(row)
}

/// All messages of a conversation in the order they were written
pub async fn list_messages(
    pool: &SqlitePool,
    conversation_id: Uuid,
) -> Result<Vec<StoredMessage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, conversation_id, role, content, created_at
        FROM messages
        WHERE conversation_id = $1
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    into_messages(rows)
}

/// The last `limit` messages of a conversation, oldest first
pub async fn recent_messages(
    pool: &SqlitePool,
    conversation_id: Uuid,
    limit: u32,
) -> Result<Vec<StoredMessage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, conversation_id, role, content, created_at
        FROM messages
        WHERE conversation_id = $1
        ORDER BY created_at DESC, rowid DESC
        LIMIT $2
        "#,
    )
    .bind(conversation_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    let mut messages = into_messages(rows)?;
    messages.reverse();
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::{memory_pool, test_user};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_create_and_get_conversation() {
        let pool = memory_pool().await;
        let user = test_user(&pool).await;

        let created = create_conversation(&pool, user.id, DEFAULT_TITLE, "llama3.2")
            .await
            .unwrap();
        let fetched = get_conversation(&pool, user.id, created.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_conversations_are_scoped_to_owner() {
        let pool = memory_pool().await;
        let owner = test_user(&pool).await;
        let stranger = test_user(&pool).await;

        let conversation = create_conversation(&pool, owner.id, "Mine", "m").await.unwrap();

        assert!(get_conversation(&pool, stranger.id, conversation.id)
            .await
            .unwrap()
            .is_none());
        assert!(rename_conversation(&pool, stranger.id, conversation.id, "Stolen")
            .await
            .unwrap()
            .is_none());
        assert!(!delete_conversation(&pool, stranger.id, conversation.id)
            .await
            .unwrap());
        assert!(list_conversations(&pool, stranger.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_by_activity() {
        let pool = memory_pool().await;
        let user = test_user(&pool).await;

        let first = create_conversation(&pool, user.id, "First", "m").await.unwrap();
        let second = create_conversation(&pool, user.id, "Second", "m").await.unwrap();

        let ids: Vec<Uuid> = list_conversations(&pool, user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);

        touch_conversation(&pool, first.id).await.unwrap();
        let ids: Vec<Uuid> = list_conversations(&pool, user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_rename_and_default_title_rule() {
        let pool = memory_pool().await;
        let user = test_user(&pool).await;
        let conversation = create_conversation(&pool, user.id, DEFAULT_TITLE, "m")
            .await
            .unwrap();

        assert!(set_title_if_default(&pool, conversation.id, "Borrow checker")
            .await
            .unwrap());
        assert!(!set_title_if_default(&pool, conversation.id, "Something else")
            .await
            .unwrap());

        let renamed = rename_conversation(&pool, user.id, conversation.id, "Lifetimes")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.title, "Lifetimes");
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order() {
        let pool = memory_pool().await;
        let user = test_user(&pool).await;
        let conversation = create_conversation(&pool, user.id, "Chat", "m").await.unwrap();

        for (role, content) in [
            (Role::User, "one"),
            (Role::Assistant, "two"),
            (Role::User, "three"),
            (Role::Assistant, "four"),
        ] {
            insert_message(&pool, conversation.id, role, content).await.unwrap();
        }

        let all: Vec<String> = list_messages(&pool, conversation.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(all, vec!["one", "two", "three", "four"]);

        let recent = recent_messages(&pool, conversation.id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "three");
        assert_eq!(recent[0].role, Role::User);
        assert_eq!(recent[1].content, "four");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages() {
        let pool = memory_pool().await;
        let user = test_user(&pool).await;
        let conversation = create_conversation(&pool, user.id, "Chat", "m").await.unwrap();
        insert_message(&pool, conversation.id, Role::User, "hello").await.unwrap();

        assert!(delete_conversation(&pool, user.id, conversation.id).await.unwrap());

        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining.0, 0);
    }
}
