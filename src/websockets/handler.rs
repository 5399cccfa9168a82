use axum::{
    extract::{ws::rejection::WebSocketUpgradeRejection, Path, State, WebSocketUpgrade},
    response::Response,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::session::RoomSession;
use crate::shared::{parse_id, AppError, AppState};

/// WebSocket endpoint for listening to a room's live events
/// GET /subscribe/:room_id
///
/// The room id is validated and the room looked up before anything is
/// upgraded; a failed check answers with a plain HTTP error.
pub async fn subscribe_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Path(raw_room_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let room_id = parse_id(&raw_room_id, "room").inspect_err(|_| {
        warn!(room_id = %raw_room_id, "Rejecting subscription with malformed room id");
    })?;

    if app_state.room_repository.get_room(room_id).await?.is_none() {
        warn!(room_id = %room_id, "Room not found, rejecting subscription");
        return Err(AppError::NotFound("Room not found".to_string()));
    }

    let ws = ws.map_err(|rejection| {
        warn!(room_id = %room_id, error = %rejection, "Failed to upgrade connection");
        AppError::UpgradeFailed("Failed to upgrade to WS connection".to_string())
    })?;

    Ok(ws
        .on_failed_upgrade(move |error| {
            warn!(room_id = %room_id, error = %error, "WebSocket handshake failed");
        })
        .on_upgrade(move |socket| handle_subscription(socket, room_id, app_state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_subscription(
    socket: axum::extract::ws::WebSocket,
    room_id: Uuid,
    app_state: AppState,
) {
    let session = RoomSession::open(
        app_state.registry.clone(),
        room_id,
        Box::new(socket),
        app_state.outbound_buffer,
    );

    info!(room_id = %room_id, session_id = %session.id(), "New client connected");

    session.run().await;
}

#[cfg(test)]
mod tests {
    use crate::router::build_router;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // for `oneshot`
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscribe_with_malformed_room_id() {
        let state = AppStateBuilder::new().build();

        let request = Request::builder()
            .uri("/subscribe/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_to_unknown_room() {
        let state = AppStateBuilder::new().build();
        let room_id = Uuid::new_v4();

        let request = Request::builder()
            .uri(format!("/subscribe/{room_id}"))
            .body(Body::empty())
            .unwrap();
        let response = build_router(state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_without_upgrade_headers() {
        let state = AppStateBuilder::new().build();
        let room = state.room_repository.create_room("ama").await.unwrap();

        let request = Request::builder()
            .uri(format!("/subscribe/{}", room.id))
            .body(Body::empty())
            .unwrap();
        let response = build_router(state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.registry.listener_count(room.id), 0);
    }
}
