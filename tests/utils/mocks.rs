use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use askroom::websockets::{SocketError, SocketWrapper};

// ============================================================================
// Mock Infrastructure
// ============================================================================

#[derive(Default)]
struct ClientState {
    received: Mutex<Vec<String>>,
    closes: AtomicUsize,
    broken: AtomicBool,
}

/// Server side of a fake connection, handed to a `RoomSession`
pub struct MockSocket {
    inbound: mpsc::UnboundedReceiver<Option<String>>,
    state: Arc<ClientState>,
}

/// Test side of a fake connection
pub struct MockClient {
    inbound: mpsc::UnboundedSender<Option<String>>,
    state: Arc<ClientState>,
}

impl MockSocket {
    pub fn pair() -> (MockSocket, MockClient) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(ClientState::default());
        (
            MockSocket {
                inbound: rx,
                state: state.clone(),
            },
            MockClient { inbound: tx, state },
        )
    }
}

impl MockClient {
    /// Frames the server wrote, parsed as JSON
    pub fn received(&self) -> Vec<serde_json::Value> {
        self.state
            .received
            .lock()
            .unwrap()
            .iter()
            .map(|frame| serde_json::from_str(frame).unwrap())
            .collect()
    }

    /// Waits until at least `count` frames arrived
    pub async fn wait_for_frames(&self, count: usize) -> Vec<serde_json::Value> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let received = self.received();
            if received.len() >= count {
                return received;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {count} frames, got {}",
                received.len()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    pub fn say(&self, text: &str) {
        let _ = self.inbound.send(Some(text.to_string()));
    }

    /// Simulates the client closing its end
    pub fn hang_up(&self) {
        let _ = self.inbound.send(None);
    }

    /// Makes every further server write fail, like a dead TCP peer
    pub fn break_connection(&self) {
        self.state.broken.store(true, Ordering::SeqCst);
    }

    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SocketWrapper for MockSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        if self.state.broken.load(Ordering::SeqCst) {
            return Err(SocketError::SendFailed("broken pipe".to_string()));
        }
        self.state.received.lock().unwrap().push(message);
        Ok(())
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        Ok(self.inbound.recv().await.flatten())
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
