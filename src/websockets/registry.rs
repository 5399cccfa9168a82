use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::session::{SessionHandle, SessionId};

type RoomListeners = HashMap<SessionId, SessionHandle>;

/// Directory of live sessions per room
///
/// One lock guards the whole map. It is held only while a listener set is
/// mutated or copied, never while anything is sent to a connection.
/// Emptied room entries are kept; they cost nothing and keep `snapshot` total.
pub struct SubscriptionRegistry {
    rooms: Mutex<HashMap<Uuid, RoomListeners>>,
    /// Parent of every session token; cancelled on shutdown
    root: CancellationToken,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            root: CancellationToken::new(),
        }
    }

    // Every critical section is a single insert/remove/clone, so a panic
    // elsewhere cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, RoomListeners>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A fresh cancellation token for a new session, tied to server shutdown
    pub fn session_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Adds a session under its room, creating the room's listener set if needed
    pub fn register(&self, session: SessionHandle) {
        let room_id = session.room_id();
        let session_id = session.id();

        let listeners = {
            let mut rooms = self.lock();
            let room = rooms.entry(room_id).or_default();
            room.insert(session_id, session);
            room.len()
        };

        info!(room_id = %room_id, session_id = %session_id, listeners, "Session registered");
    }

    /// Removes a session; returns false if it was not registered
    pub fn unregister(&self, room_id: Uuid, session_id: SessionId) -> bool {
        let removed = self
            .lock()
            .get_mut(&room_id)
            .and_then(|room| room.remove(&session_id))
            .is_some();

        if removed {
            debug!(room_id = %room_id, session_id = %session_id, "Session unregistered");
        }
        removed
    }

    /// Point-in-time copy of a room's sessions
    pub fn snapshot(&self, room_id: Uuid) -> Vec<SessionHandle> {
        self.lock()
            .get(&room_id)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes a session and cancels it so its task tears down
    pub fn evict(&self, room_id: Uuid, session_id: SessionId) -> bool {
        let session = self
            .lock()
            .get_mut(&room_id)
            .and_then(|room| room.remove(&session_id));

        match session {
            Some(session) => {
                session.cancel();
                info!(room_id = %room_id, session_id = %session_id, "Session evicted");
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self, room_id: Uuid) -> usize {
        self.lock().get(&room_id).map_or(0, HashMap::len)
    }

    /// Number of room entries, including emptied ones
    pub fn room_count(&self) -> usize {
        self.lock().len()
    }

    /// Cancels every session, current and future
    pub fn shutdown(&self) {
        info!("Cancelling all live sessions");
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}
