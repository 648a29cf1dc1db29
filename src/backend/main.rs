/**
 * Repair Status Server Entry Point
 *
 * Serves the public repair-status lookup over HTTP.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use repairdesk::backend::server::{create_app, server_port};
    use repairdesk::client::Config;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration Missing: {}", e);
            eprintln!("Configuration Missing: set SUPABASE_URL and SUPABASE_ANON_KEY");
            std::process::exit(2);
        }
    };

    let app = create_app(&config).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], server_port()));
    tracing::info!("Starting repair status server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin repair-status-server --features ssr");
    std::process::exit(1);
}
