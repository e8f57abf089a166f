//! Push device registration model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use toonhub_core::types::{DbId, Timestamp};

/// A row from the `device_registrations` table.
///
/// Rows are soft-deactivated (`is_active = false`) rather than deleted so
/// delivery history stays attributable.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceRegistration {
    pub id: DbId,
    pub user_id: DbId,
    pub device_token: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for the register/unregister endpoints.
#[derive(Debug, Deserialize)]
pub struct DeviceTokenPayload {
    pub device_token: String,
}
