//! Handlers for push device registration.
//!
//! Tokens are soft-deactivated on unregister, never deleted, so delivery
//! history stays attributable to a device.

use axum::extract::State;
use axum::Json;
use serde_json::json;
use toonhub_db::models::device::DeviceTokenPayload;
use toonhub_db::repositories::DeviceRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/v1/notifications/register-device
///
/// Register (or re-activate / reassign) a device token for the caller.
pub async fn register_device(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<DeviceTokenPayload>,
) -> AppResult<Json<serde_json::Value>> {
    DeviceRepo::register(&state.pool, auth.user_id, &payload.device_token).await?;
    tracing::info!(user_id = auth.user_id, "Device token registered");
    Ok(Json(json!({ "message": "Device registered successfully" })))
}

/// POST /api/v1/notifications/unregister-device
///
/// Deactivate a token owned by the caller.
pub async fn unregister_device(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<DeviceTokenPayload>,
) -> AppResult<Json<serde_json::Value>> {
    let deactivated =
        DeviceRepo::unregister(&state.pool, auth.user_id, &payload.device_token).await?;
    if deactivated {
        tracing::info!(user_id = auth.user_id, "Device token deactivated");
    }
    Ok(Json(
        json!({ "message": "Device unregistered (deactivated) successfully" }),
    ))
}
