use std::sync::Arc;

use dotenvy::dotenv;
use eyre::WrapErr;
use tracing::info;

use etf_basket_analyzer::config;
use etf_basket_analyzer::logging;
use etf_basket_analyzer::prices::load_price_table;
use etf_basket_analyzer::server::{build_router, AppState};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment variables from .env file (optional)
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load()?;
    info!(prices_path = %cfg.prices_path.display(), "Configuration loaded and logging initialized");

    // The price table must load before any request is served
    let prices = load_price_table(&cfg.prices_path)
        .wrap_err_with(|| format!("Failed to load {}", cfg.prices_path.display()))?;
    let state = AppState::new(Arc::new(prices));

    let app = build_router(state, &cfg)?;

    let addr = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, cors_origin = %cfg.cors_allowed_origin, "ETF analyzer listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
