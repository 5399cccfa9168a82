use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{
    models::MessageModel,
    service::MessageService,
    types::{MessageCreateRequest, MessageCreatedResponse, ReactionCountResponse},
};
use crate::shared::{parse_id, AppError, AppState};

fn service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::clone(&state.room_repository),
        Arc::clone(&state.message_repository),
        state.broadcaster.clone(),
    )
}

fn parse_ids(room_id: &str, message_id: &str) -> Result<(Uuid, Uuid), AppError> {
    Ok((parse_id(room_id, "room")?, parse_id(message_id, "message")?))
}

/// GET /api/rooms/:room_id/messages
#[instrument(name = "list_messages", skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageModel>>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    Ok(Json(service(&state).list_messages(room_id).await?))
}

/// POST /api/rooms/:room_id/messages
#[instrument(name = "create_message", skip(state, payload))]
pub async fn create_message(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    payload: Result<Json<MessageCreateRequest>, JsonRejection>,
) -> Result<Json<MessageCreatedResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let Json(request) = payload?;
    let message = service(&state)
        .create_message(room_id, &request.message)
        .await?;

    Ok(Json(MessageCreatedResponse { id: message.id }))
}

/// GET /api/rooms/:room_id/messages/:message_id
#[instrument(name = "get_message", skip(state))]
pub async fn get_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<MessageModel>, AppError> {
    let (room_id, message_id) = parse_ids(&room_id, &message_id)?;
    Ok(Json(service(&state).get_message(room_id, message_id).await?))
}

/// PATCH /api/rooms/:room_id/messages/:message_id/react
#[instrument(name = "react_to_message", skip(state))]
pub async fn react_to_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    let (room_id, message_id) = parse_ids(&room_id, &message_id)?;
    let count = service(&state).react(room_id, message_id).await?;

    Ok(Json(ReactionCountResponse { count }))
}

/// DELETE /api/rooms/:room_id/messages/:message_id/react
#[instrument(name = "remove_reaction", skip(state))]
pub async fn remove_reaction(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    let (room_id, message_id) = parse_ids(&room_id, &message_id)?;
    let count = service(&state).remove_reaction(room_id, message_id).await?;

    Ok(Json(ReactionCountResponse { count }))
}

/// PATCH /api/rooms/:room_id/messages/:message_id/answered
#[instrument(name = "mark_answered", skip(state))]
pub async fn mark_answered(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<(), AppError> {
    let (room_id, message_id) = parse_ids(&room_id, &message_id)?;
    service(&state).mark_answered(room_id, message_id).await
}
