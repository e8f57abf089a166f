use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toonhub_api::config::ServerConfig;
use toonhub_api::notifications::NoticeDispatcher;
use toonhub_api::router::build_app_router;
use toonhub_api::state::AppState;
use toonhub_api::ws;
use toonhub_core::storage::MemoryBlobStore;
use toonhub_events::{NoticeBus, PushConfig, PushSender, TelegramConfig, TelegramSender};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toonhub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = toonhub_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    toonhub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    toonhub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Connection registry ---
    let room_hub = Arc::new(ws::RoomHub::new());
    let user_hub = Arc::new(ws::UserHub::new());

    // --- Bridge keepalive ---
    let keepalive_handle = ws::start_keepalive(Arc::clone(&user_hub));

    // --- Notice bus + fan-out dispatcher ---
    let notice_bus = Arc::new(NoticeBus::default());
    let push = Arc::new(PushSender::new(PushConfig::from_env()));
    let telegram = Arc::new(TelegramSender::new(TelegramConfig::from_env()));

    let dispatcher = NoticeDispatcher::new(
        pool.clone(),
        Arc::clone(&user_hub),
        push,
        telegram,
    );
    let dispatcher_handle = tokio::spawn(dispatcher.run(notice_bus.subscribe()));
    tracing::info!("Notice dispatcher started");

    // --- Blob store ---
    // The real backend is an external collaborator; until one is wired via
    // deployment config the in-memory store keeps local development working.
    let blob_store = Arc::new(MemoryBlobStore::new());

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        room_hub: Arc::clone(&room_hub),
        user_hub: Arc::clone(&user_hub),
        notice_bus: Arc::clone(&notice_bus),
        blob_store,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the bus sender to close the broadcast channel; this signals the
    // dispatcher to shut down.
    drop(notice_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Notice dispatcher shut down");

    let chat_count = room_hub.connection_count().await;
    let bridge_count = user_hub.connection_count().await;
    tracing::info!(chat_count, bridge_count, "Closing remaining WebSocket connections");
    room_hub.shutdown_all().await;
    user_hub.shutdown_all().await;

    keepalive_handle.abort();
    tracing::info!("Keepalive task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
