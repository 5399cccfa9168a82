use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use uuid::Uuid;

use askroom::{
    build_router,
    message::repository::InMemoryMessageRepository,
    room::repository::InMemoryRoomRepository,
    websockets::{RoomSession, SessionEnd, SessionId},
    AppState, SubscriptionRegistry,
};

use super::mocks::{MockClient, MockSocket};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub registry: Arc<SubscriptionRegistry>,
}

pub struct ConnectedClient {
    pub session_id: SessionId,
    pub client: MockClient,
    pub task: JoinHandle<SessionEnd>,
}

impl ConnectedClient {
    /// Waits for the session task to finish
    pub async fn ended(self) -> (SessionEnd, MockClient) {
        let end = tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("session should end")
            .unwrap();
        (end, self.client)
    }
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_outbound_buffer(16)
    }

    pub fn with_outbound_buffer(outbound_buffer: usize) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let state = AppState::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
            registry.clone(),
            outbound_buffer,
        );
        Self { state, registry }
    }

    /// Sends a request through the full router
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn create_room(&self, theme: &str) -> Uuid {
        let (status, body) = self
            .request("POST", "/api/rooms", Some(serde_json::json!({ "theme": theme })))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn post_message(&self, room_id: Uuid, message: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                &format!("/api/rooms/{room_id}/messages"),
                Some(serde_json::json!({ "message": message })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Opens a live session on a fake connection, as the subscribe handler
    /// does after a successful upgrade
    pub fn connect(&self, room_id: Uuid) -> ConnectedClient {
        let (socket, client) = MockSocket::pair();
        let session = RoomSession::open(
            self.registry.clone(),
            room_id,
            Box::new(socket),
            self.state.outbound_buffer,
        );
        let session_id = session.id();
        ConnectedClient {
            session_id,
            client,
            task: tokio::spawn(session.run()),
        }
    }
}
