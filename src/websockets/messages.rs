use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::RoomEvent;

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Frame sent to subscribed clients: the event's `kind`/`data` plus `meta`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(flatten)]
    pub event: RoomEvent,
    pub meta: WebSocketMessageMeta,
}

impl WebSocketMessage {
    pub fn from_event(event: RoomEvent) -> Self {
        Self {
            event,
            meta: WebSocketMessageMeta {
                timestamp: Utc::now(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
