use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{RoomCreateRequest, RoomCreatedResponse, RoomResponse};
use crate::shared::{parse_id, validate_text, AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /api/rooms
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    payload: Result<Json<RoomCreateRequest>, JsonRejection>,
) -> Result<Json<RoomCreatedResponse>, AppError> {
    let Json(request) = payload?;
    validate_text(&request.theme, "Theme")?;

    let room = state.room_repository.create_room(&request.theme).await?;

    info!(room_id = %room.id, theme = %room.theme, "Room created");

    Ok(Json(RoomCreatedResponse { id: room.id }))
}

/// HTTP handler for listing all rooms
///
/// GET /api/rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = state.room_repository.list_rooms().await?;

    info!(room_count = rooms.len(), "Rooms listed");

    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

/// GET /api/rooms/:room_id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;

    let room = state
        .room_repository
        .get_room(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    Ok(Json(room.into()))
}
