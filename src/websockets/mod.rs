// Public API
pub use handler::subscribe_handler;
pub use messages::{WebSocketMessage, WebSocketMessageMeta};
pub use registry::SubscriptionRegistry;
pub use session::{DeliveryError, RoomSession, SessionEnd, SessionHandle, SessionId};
pub use socket::{SocketError, SocketWrapper};

// Internal modules
mod handler;
mod messages;
mod registry;
mod session;
mod socket;
