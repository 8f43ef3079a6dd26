pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use eyre::{Result, WrapErr};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::basket::BasketAnalyzer;
use crate::config::Config;
use crate::prices::PriceTable;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub analyzer: BasketAnalyzer,
}

impl AppState {
    pub fn new(prices: Arc<PriceTable>) -> Self {
        Self {
            analyzer: BasketAnalyzer::new(prices),
        }
    }
}

pub fn build_router(state: AppState, cfg: &Config) -> Result<Router> {
    let origin = HeaderValue::from_str(&cfg.cors_allowed_origin)
        .wrap_err_with(|| format!("Invalid CORS_ALLOWED_ORIGIN '{}'", cfg.cors_allowed_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let router = Router::new()
        .route("/analyze", post(routes::analyze_etf))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}
