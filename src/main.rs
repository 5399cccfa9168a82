use askroom::{
    build_router,
    message::repository::{InMemoryMessageRepository, MessageRepository, PostgresMessageRepository},
    room::repository::{InMemoryRoomRepository, PostgresRoomRepository, RoomRepository},
    AppState, ServerConfig, SubscriptionRegistry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (
    Arc<dyn RoomRepository + Send + Sync>,
    Arc<dyn MessageRepository + Send + Sync>,
);

async fn connect_stores(config: &ServerConfig) -> Result<Stores, Box<dyn std::error::Error>> {
    match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Using PostgreSQL store");
            let rooms: Arc<dyn RoomRepository + Send + Sync> =
                Arc::new(PostgresRoomRepository::new(pool.clone()));
            let messages: Arc<dyn MessageRepository + Send + Sync> =
                Arc::new(PostgresMessageRepository::new(pool));
            Ok((rooms, messages))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            let rooms: Arc<dyn RoomRepository + Send + Sync> = Arc::new(InMemoryRoomRepository::new());
            let messages: Arc<dyn MessageRepository + Send + Sync> =
                Arc::new(InMemoryMessageRepository::new());
            Ok((rooms, messages))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askroom=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!(bind_addr = %config.bind_addr, "Starting room messaging server");

    let (room_repository, message_repository) = connect_stores(&config).await?;
    let registry = Arc::new(SubscriptionRegistry::new());

    let app_state = AppState::new(
        room_repository,
        message_repository,
        Arc::clone(&registry),
        config.outbound_buffer,
    );
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
            // Live sessions never finish on their own
            registry.shutdown();
        })
        .await?;

    Ok(())
}
