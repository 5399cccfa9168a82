use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, patch},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::message;
use crate::room;
use crate::shared::AppState;
use crate::websockets::subscribe_handler;

/// Builds the application's route table
pub fn build_router(app_state: AppState) -> Router {
    let message_routes = Router::new()
        .route(
            "/",
            get(message::list_messages).post(message::create_message),
        )
        .route("/:message_id", get(message::get_message))
        .route(
            "/:message_id/react",
            patch(message::react_to_message).delete(message::remove_reaction),
        )
        .route("/:message_id/answered", patch(message::mark_answered));

    let api_routes = Router::new()
        .route("/rooms", get(room::list_rooms).post(room::create_room))
        .route("/rooms/:room_id", get(room::get_room))
        .nest("/rooms/:room_id/messages", message_routes);

    Router::new()
        .route("/subscribe/:room_id", get(subscribe_handler))
        .nest("/api", api_routes)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Any http(s) origin, no credentials
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin.as_bytes().starts_with(b"https://") || origin.as_bytes().starts_with(b"http://")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .allow_credentials(false)
        .max_age(Duration::from_secs(300))
}
