use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::events::RoomEvent;
use crate::websockets::{SubscriptionRegistry, WebSocketMessage};

/// Outcome of one broadcast, for logging and tests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Delivers room events to every live session registered for the room
#[derive(Clone)]
pub struct EventBroadcaster {
    registry: Arc<SubscriptionRegistry>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    /// Emits an event to all sessions of a specific room
    ///
    /// Works on a snapshot, so sessions registering mid-broadcast miss this
    /// event. Delivery never blocks: each session gets the frame queued for its
    /// own task to write. Sessions that cannot take the frame are evicted.
    pub fn broadcast(&self, room_id: Uuid, event: RoomEvent) -> BroadcastReport {
        let event_type = event.event_type();
        let frame: Arc<str> = match WebSocketMessage::from_event(event).to_json() {
            Ok(json) => json.into(),
            Err(e) => {
                error!(room_id = %room_id, event = event_type, error = %e, "Failed to serialize room event");
                return BroadcastReport::default();
            }
        };

        let sessions = self.registry.snapshot(room_id);
        let mut report = BroadcastReport::default();

        for session in &sessions {
            match session.deliver(Arc::clone(&frame)) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        room_id = %room_id,
                        session_id = %session.id(),
                        error = %e,
                        "Delivery failed, dropping session"
                    );
                    if self.registry.evict(room_id, session.id()) {
                        report.dropped += 1;
                    }
                }
            }
        }

        debug!(
            room_id = %room_id,
            event = event_type,
            delivered = report.delivered,
            dropped = report.dropped,
            "Room event broadcast"
        );

        report
    }
}
