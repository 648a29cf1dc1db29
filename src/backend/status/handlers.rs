use axum::extract::{Path, State};
use axum::Json;

use crate::backend::error::LookupError;
use crate::backend::server::AppState;
use crate::shared::RepairStatus;

/// `GET /api/external/repair-status/{serial}`
pub async fn get_repair_status(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<RepairStatus>, LookupError> {
    let serial = serial.trim();
    if serial.is_empty() {
        return Err(LookupError::MissingSerial);
    }

    tracing::debug!("Looking up repair status for {}", serial);
    let row = state
        .gateway
        .find_by_serial(serial)
        .await?
        .ok_or(LookupError::NotFound)?;

    Ok(Json(RepairStatus::from(&row)))
}

/// Lookup path without a serial number
pub async fn missing_serial() -> LookupError {
    LookupError::MissingSerial
}
