//! Request handlers

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use super::error::ApiError;
use super::AppState;
use crate::basket::AnalysisResult;

const UPLOAD_FIELD: &str = "file";

/// Analyze an uploaded ETF weights file.
///
/// Returns the latest stored date, the basket's value on every stored date,
/// all matched holdings sorted by value, and the top 5 of them.
#[instrument(skip_all)]
pub async fn analyze_etf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let contents = read_upload(&mut multipart).await?;

    let analyzer = state.analyzer.clone();
    let result = tokio::task::spawn_blocking(move || analyzer.analyze(&contents))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match result {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            warn!(error = %e, "Rejected weights upload");
            Err(e.into())
        }
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(ApiError::BadRequest(format!("multipart form is missing the '{UPLOAD_FIELD}' field")))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let prices = state.analyzer.price_table();
    Json(json!({
        "status": "ok",
        "latest_date": prices.latest_date(),
        "tickers": prices.num_tickers(),
        "dates": prices.num_dates(),
    }))
}
