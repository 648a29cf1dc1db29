/**
 * Repair Desk Entry Point
 *
 * Starts the dashboard core headless: loads equipment, keeps the offline
 * queue draining as connectivity comes and goes, and logs the dashboard
 * summary until interrupted.
 */

use std::process::ExitCode;

use repairdesk::client::{Config, DeskApp};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration Missing: {}", e);
            eprintln!("Configuration Missing");
            eprintln!("Set SUPABASE_URL and SUPABASE_ANON_KEY (or their VITE_ equivalents) and restart.");
            return ExitCode::from(2);
        }
    };

    let app = match DeskApp::start(&config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to start dashboard: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stats = app.stats().await;
    tracing::info!(
        "All: {}, Pending: {}, Fixed: {}",
        stats.all,
        stats.pending,
        stats.fixed
    );
    for item in app.overstay_alerts().await {
        tracing::warn!("Overstay: {} ({})", item.job_card_no, item.serial_number);
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }

    let status = app.status().await;
    if status.pending_tasks > 0 {
        tracing::warn!("{} change(s) still queued for sync", status.pending_tasks);
    }
    app.shutdown().await;
    ExitCode::SUCCESS
}
