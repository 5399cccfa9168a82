// Library crate for the room messaging server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod message;
pub mod room;
pub mod router;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::ServerConfig;
pub use event::{BroadcastReport, EventBroadcaster, RoomEvent};
pub use router::build_router;
pub use shared::{AppError, AppState};
pub use websockets::{RoomSession, SessionEnd, SessionHandle, SocketWrapper, SubscriptionRegistry};
