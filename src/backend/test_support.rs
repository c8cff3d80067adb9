//! Fixtures shared by the unit tests of backend modules

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::users::{upsert_user, NewUser, User};
use crate::backend::chat::model::{ChatModel, ModelError, TokenStream};
use crate::backend::server::config::{connect_database, run_migrations, DatabaseSettings};
use crate::shared::ChatEntry;

/// Fresh migrated in-memory database
pub(crate) async fn memory_pool() -> SqlitePool {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = connect_database(&settings)
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Insert a user with a random subject
pub(crate) async fn test_user(pool: &SqlitePool) -> User {
    let subject = format!("test-{}", Uuid::new_v4());
    upsert_user(
        pool,
        &NewUser {
            subject,
            email: Some("test@example.com".to_string()),
            name: Some("Test User".to_string()),
            picture_url: None,
        },
    )
    .await
    .expect("Failed to create test user")
}

/// Chat model that replays a fixed list of chunks
pub(crate) struct ScriptedModel {
    chunks: Vec<String>,
    failure: Option<String>,
    unavailable: bool,
    seen: std::sync::Mutex<Vec<ChatEntry>>,
}

impl ScriptedModel {
    pub(crate) fn replying(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            failure: None,
            unavailable: false,
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Yields `chunks`, then a stream error
    pub(crate) fn failing_after(chunks: &[&str], error: &str) -> Self {
        Self {
            failure: Some(error.to_string()),
            ..Self::replying(chunks)
        }
    }

    /// Fails before producing a stream
    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::replying(&[])
        }
    }

    /// Messages passed to the most recent `stream_chat` call
    pub(crate) fn last_input(&self) -> Vec<ChatEntry> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_chat(&self, messages: &[ChatEntry]) -> Result<TokenStream, ModelError> {
        *self.seen.lock().unwrap() = messages.to_vec();
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
