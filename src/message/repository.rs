use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::MessageModel;
use crate::shared::AppError;

/// Trait for message repository operations
///
/// Every lookup is scoped by room: a message id that exists under another
/// room is reported as not found (`Ok(None)`).
#[async_trait]
pub trait MessageRepository {
    async fn create_message(&self, room_id: Uuid, content: &str)
        -> Result<MessageModel, AppError>;
    async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError>;

    /// Messages of a room, most reacted first, oldest first on ties
    async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError>;

    /// Adds one reaction and returns the new count
    async fn react(&self, room_id: Uuid, message_id: Uuid) -> Result<Option<i64>, AppError>;

    /// Removes one reaction (never below zero) and returns the new count
    async fn remove_reaction(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<i64>, AppError>;

    async fn mark_answered(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError>;
}

/// In-memory implementation of MessageRepository for development and testing
pub struct InMemoryMessageRepository {
    messages: Mutex<HashMap<Uuid, MessageModel>>,
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, MessageModel>>, AppError> {
        self.messages.lock().map_err(|_| AppError::Internal)
    }

    /// Applies `update` to a message of the given room, if present
    fn update<T>(
        &self,
        room_id: Uuid,
        message_id: Uuid,
        update: impl FnOnce(&mut MessageModel) -> T,
    ) -> Result<Option<T>, AppError> {
        let mut messages = self.lock()?;
        Ok(messages
            .get_mut(&message_id)
            .filter(|m| m.room_id == room_id)
            .map(update))
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, content))]
    async fn create_message(
        &self,
        room_id: Uuid,
        content: &str,
    ) -> Result<MessageModel, AppError> {
        let message = MessageModel::new(room_id, content);
        debug!(message_id = %message.id, "Creating message in memory");

        self.lock()?.insert(message.id, message.clone());
        Ok(message)
    }

    #[instrument(skip(self))]
    async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError> {
        Ok(self
            .lock()?
            .get(&message_id)
            .filter(|m| m.room_id == room_id)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        let mut messages: Vec<MessageModel> = self
            .lock()?
            .values()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();

        messages.sort_by(|a, b| {
            b.reaction_count
                .cmp(&a.reaction_count)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(messages)
    }

    #[instrument(skip(self))]
    async fn react(&self, room_id: Uuid, message_id: Uuid) -> Result<Option<i64>, AppError> {
        self.update(room_id, message_id, |m| {
            m.reaction_count += 1;
            m.reaction_count
        })
    }

    #[instrument(skip(self))]
    async fn remove_reaction(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<i64>, AppError> {
        self.update(room_id, message_id, |m| {
            m.reaction_count = (m.reaction_count - 1).max(0);
            m.reaction_count
        })
    }

    #[instrument(skip(self))]
    async fn mark_answered(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError> {
        self.update(room_id, message_id, |m| {
            m.answered = true;
            m.clone()
        })
    }
}

/// PostgreSQL implementation of message repository
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MESSAGE_COLUMNS: &str = "id, room_id, message, reaction_count, answered, created_at";

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, content))]
    async fn create_message(
        &self,
        room_id: Uuid,
        content: &str,
    ) -> Result<MessageModel, AppError> {
        let message = MessageModel::new(room_id, content);

        sqlx::query(
            "INSERT INTO messages (id, room_id, message, reaction_count, answered, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id)
        .bind(message.room_id)
        .bind(&message.message)
        .bind(message.reaction_count)
        .bind(message.answered)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_id = %room_id, "Failed to insert message");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(message)
    }

    #[instrument(skip(self))]
    async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError> {
        let message = sqlx::query_as::<_, MessageModel>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1 AND room_id = $2"
        ))
        .bind(message_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        let messages = sqlx::query_as::<_, MessageModel>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE room_id = $1 \
             ORDER BY reaction_count DESC, created_at ASC"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    #[instrument(skip(self))]
    async fn react(&self, room_id: Uuid, message_id: Uuid) -> Result<Option<i64>, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "UPDATE messages SET reaction_count = reaction_count + 1 \
             WHERE id = $1 AND room_id = $2 RETURNING reaction_count",
        )
        .bind(message_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn remove_reaction(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<i64>, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "UPDATE messages SET reaction_count = GREATEST(reaction_count - 1, 0) \
             WHERE id = $1 AND room_id = $2 RETURNING reaction_count",
        )
        .bind(message_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn mark_answered(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError> {
        let message = sqlx::query_as::<_, MessageModel>(&format!(
            "UPDATE messages SET answered = TRUE WHERE id = $1 AND room_id = $2 \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_message() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();

        let message = repo.create_message(room_id, "what is ownership?").await.unwrap();
        assert_eq!(message.reaction_count, 0);
        assert!(!message.answered);

        let fetched = repo.get_message(room_id, message.id).await.unwrap();
        assert_eq!(fetched, Some(message));
    }

    #[tokio::test]
    async fn test_message_is_scoped_to_its_room() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();
        let other_room = Uuid::new_v4();

        let message = repo.create_message(room_id, "hello").await.unwrap();

        assert!(repo.get_message(other_room, message.id).await.unwrap().is_none());
        assert!(repo.react(other_room, message.id).await.unwrap().is_none());
        assert!(repo.list_messages(other_room).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reaction_count_never_negative() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();
        let message = repo.create_message(room_id, "hello").await.unwrap();

        assert_eq!(repo.react(room_id, message.id).await.unwrap(), Some(1));
        assert_eq!(repo.react(room_id, message.id).await.unwrap(), Some(2));
        assert_eq!(repo.remove_reaction(room_id, message.id).await.unwrap(), Some(1));
        assert_eq!(repo.remove_reaction(room_id, message.id).await.unwrap(), Some(0));
        assert_eq!(repo.remove_reaction(room_id, message.id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_list_messages_orders_by_reactions() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();
        let quiet = repo.create_message(room_id, "quiet").await.unwrap();
        let popular = repo.create_message(room_id, "popular").await.unwrap();
        repo.react(room_id, popular.id).await.unwrap();

        let listed = repo.list_messages(room_id).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![popular.id, quiet.id]);
    }

    #[tokio::test]
    async fn test_mark_answered() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();
        let message = repo.create_message(room_id, "hello").await.unwrap();

        let answered = repo.mark_answered(room_id, message.id).await.unwrap().unwrap();
        assert!(answered.answered);
        assert!(repo.mark_answered(room_id, Uuid::new_v4()).await.unwrap().is_none());
    }
}
