use std::sync::Arc;

use toonhub_core::storage::BlobStore;
use toonhub_events::NoticeBus;

use crate::config::ServerConfig;
use crate::ws::{RoomHub, UserHub};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: toonhub_db::DbPool,
    /// Server configuration (bind address, CORS, JWT).
    pub config: Arc<ServerConfig>,
    /// Chat sockets keyed by room id.
    pub room_hub: Arc<RoomHub>,
    /// Bridge sockets keyed by user id.
    pub user_hub: Arc<UserHub>,
    /// Publish side of the notice fan-out path.
    pub notice_bus: Arc<NoticeBus>,
    /// External binary storage for work files and chat attachments.
    pub blob_store: Arc<dyn BlobStore>,
}
