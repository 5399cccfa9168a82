use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events pushed to the live sessions of a room
///
/// Events represent facts about writes that have already committed. Each
/// variant serialises as `{"kind": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A message was posted into the room
    MessageCreated { id: Uuid, message: String },

    /// A message's reaction count changed (in either direction)
    #[serde(rename = "message_reaction_updated")]
    ReactionUpdated { id: Uuid, count: i64 },

    /// A message was marked as answered
    MessageAnswered { id: Uuid },
}

impl RoomEvent {
    /// Get the message this event is about
    pub fn message_id(&self) -> Uuid {
        match self {
            RoomEvent::MessageCreated { id, .. } => *id,
            RoomEvent::ReactionUpdated { id, .. } => *id,
            RoomEvent::MessageAnswered { id } => *id,
        }
    }

    /// Get the wire name of the event kind
    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::MessageCreated { .. } => "message_created",
            RoomEvent::ReactionUpdated { .. } => "message_reaction_updated",
            RoomEvent::MessageAnswered { .. } => "message_answered",
        }
    }
}
