use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::event::EventBroadcaster;
use crate::message::repository::MessageRepository;
use crate::room::repository::RoomRepository;
use crate::websockets::SubscriptionRegistry;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_repository: Arc<dyn RoomRepository + Send + Sync>,
    pub message_repository: Arc<dyn MessageRepository + Send + Sync>,
    pub registry: Arc<SubscriptionRegistry>,
    pub broadcaster: EventBroadcaster,
    /// Capacity of each live session's outbound queue
    pub outbound_buffer: usize,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        message_repository: Arc<dyn MessageRepository + Send + Sync>,
        registry: Arc<SubscriptionRegistry>,
        outbound_buffer: usize,
    ) -> Self {
        let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
        Self {
            room_repository,
            message_repository,
            registry,
            broadcaster,
            outbound_buffer,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upgrade failed: {0}")]
    UpgradeFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UpgradeFailed(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => {
                tracing::error!(error = %msg, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejecting request body");
        AppError::BadRequest(rejection.body_text())
    }
}

/// Longest theme or message text the stores accept, in characters
pub const MAX_TEXT_LEN: usize = 255;

/// Checks free text from a request body before it reaches a store
pub fn validate_text(value: &str, what: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", what)));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            what, MAX_TEXT_LEN
        )));
    }
    Ok(())
}

/// Parses an identifier taken from a URL path segment
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} id", what)))
}
