//! Route definitions for the `/notifications` resource: device registration
//! and the personal event bridge.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::devices;
use crate::state::AppState;
use crate::ws;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET  /ws/{user_id}       -> bridge WebSocket session
/// POST /register-device    -> register/re-activate a push token
/// POST /unregister-device  -> deactivate a push token
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/{user_id}", get(ws::bridge_ws_handler))
        .route("/register-device", post(devices::register_device))
        .route("/unregister-device", post(devices::unregister_device))
}
