use std::cmp::Ordering;
use std::sync::Arc;

use ndarray::Array1;
use tracing::{debug, info, instrument};

use super::error::AnalysisError;
use super::types::{AnalysisResult, HistoryPoint, HoldingRow, WeightVector};
use super::weights::build_weight_vector;
use crate::prices::PriceTable;
use crate::rounding_utils::{round_price, round_weight};

const TOP_HOLDINGS: usize = 5;

/// Runs basket analyses against a shared, read-only price table.
#[derive(Debug, Clone)]
pub struct BasketAnalyzer {
    prices: Arc<PriceTable>,
}

impl BasketAnalyzer {
    pub fn new(prices: Arc<PriceTable>) -> Self {
        Self { prices }
    }

    pub fn price_table(&self) -> &PriceTable {
        &self.prices
    }

    pub fn analyze(&self, raw: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        analyze(raw, &self.prices)
    }
}

/// Matched tickers in weight-vector order, with their price column and weight.
struct MatchedBasket {
    tickers: Vec<String>,
    columns: Vec<usize>,
    weights: Array1<f64>,
    unmatched: Vec<String>,
}

fn match_tickers(weights: &WeightVector, prices: &PriceTable) -> Result<MatchedBasket, AnalysisError> {
    let mut tickers = Vec::new();
    let mut columns = Vec::new();
    let mut matched_weights = Vec::new();
    let mut unmatched = Vec::new();

    for entry in weights.iter() {
        // Spellings are sorted, so the chosen column does not depend on row order.
        let matched = entry
            .spellings
            .iter()
            .find_map(|spelling| prices.column_of(spelling).map(|col| (spelling, col)));
        match matched {
            Some((spelling, col)) => {
                tickers.push(spelling.clone());
                columns.push(col);
                matched_weights.push(entry.weight);
            }
            None => unmatched.push(entry.name().to_string()),
        }
    }

    if tickers.is_empty() {
        return Err(AnalysisError::NoMatch);
    }
    unmatched.sort();

    Ok(MatchedBasket {
        tickers,
        columns,
        weights: Array1::from(matched_weights),
        unmatched,
    })
}

/// Turn an uploaded weights CSV into the basket's price history and holdings snapshot.
#[instrument(skip_all, fields(bytes = raw.len(), timed = true))]
pub fn analyze(raw: &[u8], prices: &PriceTable) -> Result<AnalysisResult, AnalysisError> {
    let weights = build_weight_vector(raw)?;
    let basket = match_tickers(&weights, prices)?;
    if !basket.unmatched.is_empty() {
        debug!(unmatched = ?basket.unmatched, "Dropping names with no price column");
    }

    let series = prices.weighted_series(&basket.columns, &basket.weights);
    let history: Vec<HistoryPoint> = prices
        .dates()
        .iter()
        .zip(series.iter())
        .map(|(date, value)| HistoryPoint {
            date: *date,
            price: round_price(*value),
        })
        .collect();

    let latest = prices.latest_row();
    let mut holdings: Vec<HoldingRow> = basket
        .tickers
        .iter()
        .zip(basket.columns.iter())
        .zip(basket.weights.iter())
        .map(|((ticker, &col), &weight)| {
            let price = latest[col];
            HoldingRow {
                ticker: ticker.clone(),
                weight: round_weight(weight),
                price: round_price(price),
                value: round_price(weight * price),
            }
        })
        .collect();

    // Stable: equal values keep matched-ticker order.
    holdings.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    let top5 = holdings.iter().take(TOP_HOLDINGS).cloned().collect();

    info!(
        requested = weights.len(),
        matched = holdings.len(),
        unmatched = basket.unmatched.len(),
        history_points = history.len(),
        "Basket analysis complete"
    );

    Ok(AnalysisResult {
        latest_date: prices.latest_date(),
        history,
        holdings,
        top5,
        unmatched: basket.unmatched,
    })
}
