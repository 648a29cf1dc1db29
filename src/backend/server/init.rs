/**
 * Server Initialization
 *
 * Builds the lookup service: a PostgREST gateway from the environment, the
 * shared state around it, and the router.
 *
 * # Routes
 *
 * - `GET /api/external/repair-status/{serial}` - status for one device
 * - `GET /api/external/repair-status[/]` - always 400
 */

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::backend::server::state::AppState;
use crate::backend::status::{get_repair_status, missing_serial};
use crate::client::{AppError, Config};
use crate::shared::PostgrestGateway;

const DEFAULT_PORT: u16 = 3000;

/// Create the lookup application from environment configuration
pub async fn create_app(config: &Config) -> Result<Router<()>, AppError> {
    tracing::info!("Initializing repair status service");
    let gateway = PostgrestGateway::new(config.app())?;
    Ok(create_router(AppState::new(Arc::new(gateway))))
}

pub fn create_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/api/external/repair-status", get(missing_serial))
        .route("/api/external/repair-status/", get(missing_serial))
        .route("/api/external/repair-status/{serial}", get(get_repair_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `SERVER_PORT`, or 3000 when unset or invalid
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}
