//! Route definitions, one module per resource.

pub mod chat;
pub mod devices;
pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/chat", chat::router())
        .nest("/jobs", jobs::router())
        .nest("/notifications", devices::router())
}
