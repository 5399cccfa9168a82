use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::registry::SubscriptionRegistry;
use super::socket::SocketWrapper;

pub type SessionId = Uuid;

/// How long a closing session waits on a peer that stopped reading
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a frame could not be queued for a session
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("session is cancelled")]
    Cancelled,

    #[error("session outbound queue is full")]
    QueueFull,

    #[error("session task is gone")]
    Closed,
}

/// The registry's reference to one live session
///
/// Holds the sending half of the session's outbound queue. Only the session's
/// own task ever writes to the connection.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    room_id: Uuid,
    outbound: mpsc::Sender<Arc<str>>,
    token: CancellationToken,
}

impl SessionHandle {
    pub fn new(room_id: Uuid, outbound: mpsc::Sender<Arc<str>>, token: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            outbound,
            token,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Queues a frame without waiting
    pub fn deliver(&self, frame: Arc<str>) -> Result<(), DeliveryError> {
        if self.token.is_cancelled() {
            return Err(DeliveryError::Cancelled);
        }
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// How a session's active loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Evicted, shut down, or otherwise cancelled from the server side
    Cancelled,
    /// The client closed the connection
    ClientClosed,
    /// Writing a frame to the client failed
    SendFailed,
    /// Reading from the client failed
    ReceiveFailed,
}

/// Deregisters and cancels on drop, so every exit path of a session,
/// including an aborted task, leaves the registry clean.
struct Teardown {
    registry: Arc<SubscriptionRegistry>,
    room_id: Uuid,
    session_id: SessionId,
    token: CancellationToken,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.token.cancel();
        self.registry.unregister(self.room_id, self.session_id);
    }
}

/// One subscribed connection
///
/// `open` registers the session; `run` drives it until cancellation, client
/// hangup or a socket error, then deregisters and closes the socket once.
/// Dropping a session that never ran deregisters it as well.
pub struct RoomSession {
    teardown: Teardown,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::Receiver<Arc<str>>,
}

impl RoomSession {
    /// Creates the session's token and queue and registers it under `room_id`
    pub fn open(
        registry: Arc<SubscriptionRegistry>,
        room_id: Uuid,
        socket: Box<dyn SocketWrapper>,
        outbound_buffer: usize,
    ) -> Self {
        let (outbound, outbound_receiver) = mpsc::channel(outbound_buffer.max(1));
        let handle = SessionHandle::new(room_id, outbound, registry.session_token());
        let teardown = Teardown {
            room_id,
            session_id: handle.id(),
            token: handle.token.clone(),
            registry,
        };

        teardown.registry.register(handle);

        Self {
            teardown,
            socket,
            outbound_receiver,
        }
    }

    pub fn id(&self) -> SessionId {
        self.teardown.session_id
    }

    pub fn room_id(&self) -> Uuid {
        self.teardown.room_id
    }

    /// Fires the session's token from outside its task
    pub fn cancellation_token(&self) -> CancellationToken {
        self.teardown.token.clone()
    }

    /// Run the session until it ends, then tear it down
    pub async fn run(self) -> SessionEnd {
        let RoomSession {
            teardown,
            mut socket,
            mut outbound_receiver,
        } = self;
        let id = teardown.session_id;
        let room_id = teardown.room_id;
        let token = teardown.token.clone();

        let end = loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => break SessionEnd::Cancelled,

                // Frames queued by the broadcaster
                frame = outbound_receiver.recv() => match frame {
                    // A stalled write must not outlive eviction
                    Some(frame) => tokio::select! {
                        biased;

                        _ = token.cancelled() => break SessionEnd::Cancelled,

                        sent = socket.send_message(frame.to_string()) => {
                            if let Err(e) = sent {
                                warn!(room_id = %room_id, session_id = %id, error = %e, "Failed to write to client");
                                break SessionEnd::SendFailed;
                            }
                        }
                    },
                    // Registry let go of the session
                    None => break SessionEnd::Cancelled,
                },

                // Clients only listen; anything they send is dropped
                inbound = socket.receive_message() => match inbound {
                    Ok(Some(text)) => {
                        debug!(room_id = %room_id, session_id = %id, len = text.len(), "Ignoring client frame");
                    }
                    Ok(None) => break SessionEnd::ClientClosed,
                    Err(e) => {
                        debug!(room_id = %room_id, session_id = %id, error = %e, "Client read failed");
                        break SessionEnd::ReceiveFailed;
                    }
                },
            }
        };

        drop(teardown);

        match tokio::time::timeout(CLOSE_TIMEOUT, socket.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(room_id = %room_id, session_id = %id, error = %e, "Close on a dead socket");
            }
            Err(_) => {
                warn!(room_id = %room_id, session_id = %id, "Client did not take the close frame in time");
            }
        }

        info!(room_id = %room_id, session_id = %id, reason = ?end, "Session closed");
        end
    }
}
