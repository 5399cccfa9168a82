// Room events and their fan-out to live sessions
//
// CRUD handlers describe what changed as a `RoomEvent`; the broadcaster
// delivers it to every session the subscription registry holds for the room.

// Public API - what other modules can use
pub use broadcaster::{BroadcastReport, EventBroadcaster};
pub use events::RoomEvent;

// Internal modules
mod broadcaster;
mod events;
