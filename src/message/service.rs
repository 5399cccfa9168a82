use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{models::MessageModel, repository::MessageRepository};
use crate::{
    event::{EventBroadcaster, RoomEvent},
    room::repository::RoomRepository,
    shared::{validate_text, AppError},
};

/// Message business logic: every successful write is followed by a broadcast
/// to the room's live sessions. Broadcast outcomes never fail the write.
pub struct MessageService {
    rooms: Arc<dyn RoomRepository + Send + Sync>,
    messages: Arc<dyn MessageRepository + Send + Sync>,
    broadcaster: EventBroadcaster,
}

impl MessageService {
    pub fn new(
        rooms: Arc<dyn RoomRepository + Send + Sync>,
        messages: Arc<dyn MessageRepository + Send + Sync>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            rooms,
            messages,
            broadcaster,
        }
    }

    async fn ensure_room(&self, room_id: Uuid) -> Result<(), AppError> {
        match self.rooms.get_room(room_id).await? {
            Some(_) => Ok(()),
            None => {
                debug!(room_id = %room_id, "Room does not exist");
                Err(AppError::NotFound("Room not found".to_string()))
            }
        }
    }

    fn message_not_found() -> AppError {
        AppError::NotFound("Message not found".to_string())
    }

    #[instrument(skip(self, content))]
    pub async fn create_message(
        &self,
        room_id: Uuid,
        content: &str,
    ) -> Result<MessageModel, AppError> {
        validate_text(content, "Message")?;
        self.ensure_room(room_id).await?;

        let message = self.messages.create_message(room_id, content).await?;
        info!(room_id = %room_id, message_id = %message.id, "Message created");

        self.broadcaster.broadcast(
            room_id,
            RoomEvent::MessageCreated {
                id: message.id,
                message: message.message.clone(),
            },
        );

        Ok(message)
    }

    #[instrument(skip(self))]
    pub async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<MessageModel, AppError> {
        self.messages
            .get_message(room_id, message_id)
            .await?
            .ok_or_else(Self::message_not_found)
    }

    #[instrument(skip(self))]
    pub async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        self.ensure_room(room_id).await?;
        self.messages.list_messages(room_id).await
    }

    #[instrument(skip(self))]
    pub async fn react(&self, room_id: Uuid, message_id: Uuid) -> Result<i64, AppError> {
        let count = self
            .messages
            .react(room_id, message_id)
            .await?
            .ok_or_else(Self::message_not_found)?;

        self.broadcaster.broadcast(
            room_id,
            RoomEvent::ReactionUpdated {
                id: message_id,
                count,
            },
        );

        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn remove_reaction(&self, room_id: Uuid, message_id: Uuid) -> Result<i64, AppError> {
        let count = self
            .messages
            .remove_reaction(room_id, message_id)
            .await?
            .ok_or_else(Self::message_not_found)?;

        self.broadcaster.broadcast(
            room_id,
            RoomEvent::ReactionUpdated {
                id: message_id,
                count,
            },
        );

        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn mark_answered(&self, room_id: Uuid, message_id: Uuid) -> Result<(), AppError> {
        self.messages
            .mark_answered(room_id, message_id)
            .await?
            .ok_or_else(Self::message_not_found)?;

        self.broadcaster
            .broadcast(room_id, RoomEvent::MessageAnswered { id: message_id });

        Ok(())
    }
}
