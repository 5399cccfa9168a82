use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::RoomModel;

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
pub struct RoomCreateRequest {
    pub theme: String,
}

/// Response for room creation
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomCreatedResponse {
    pub id: Uuid,
}

/// Response for room information
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: Uuid,
    pub theme: String,
}

impl From<RoomModel> for RoomResponse {
    fn from(room: RoomModel) -> Self {
        Self {
            id: room.id,
            theme: room.theme,
        }
    }
}
