use std::collections::HashMap;

use chrono::NaiveDate;
use ndarray::{Array1, Array2, ArrayView1, Axis};

use super::error::PriceStoreError;

/// Daily closing prices, one row per date and one column per ticker.
///
/// Built once at startup and shared read-only (`Arc<PriceTable>`) between requests.
/// Construction guarantees at least one date and one ticker, strictly ascending dates,
/// unique tickers, and finite non-negative prices.
#[derive(Debug, Clone)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    column_index: HashMap<String, usize>,
    prices: Array2<f64>, // shape = (dates, tickers)
}

impl PriceTable {
    pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, prices: Array2<f64>) -> Result<Self, PriceStoreError> {
        if dates.is_empty() {
            return Err(PriceStoreError::NoRows);
        }
        if tickers.is_empty() {
            return Err(PriceStoreError::NoTickerColumns);
        }
        if prices.dim() != (dates.len(), tickers.len()) {
            return Err(PriceStoreError::ShapeMismatch {
                expected: (dates.len(), tickers.len()),
                actual: prices.dim(),
            });
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(if pair[0] == pair[1] {
                PriceStoreError::DuplicateDate(pair[1])
            } else {
                PriceStoreError::UnsortedDates(pair[1])
            });
        }
        if let Some(((row, col), value)) = prices.indexed_iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
            return Err(PriceStoreError::InvalidPrice {
                date: dates[row],
                ticker: tickers[col].clone(),
                value: *value,
            });
        }

        let mut column_index = HashMap::with_capacity(tickers.len());
        for (i, ticker) in tickers.iter().enumerate() {
            if column_index.insert(ticker.clone(), i).is_some() {
                return Err(PriceStoreError::DuplicateTicker(ticker.clone()));
            }
        }

        Ok(Self { dates, tickers, column_index, prices })
    }

    /// Ticker symbols in column order.
    pub fn columns(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn num_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn num_tickers(&self) -> usize {
        self.tickers.len()
    }

    pub fn has_ticker(&self, ticker: &str) -> bool {
        self.column_index.contains_key(ticker)
    }

    pub fn column_of(&self, ticker: &str) -> Option<usize> {
        self.column_index.get(ticker).copied()
    }

    pub fn latest_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Prices on the latest stored date, in column order.
    pub fn latest_row(&self) -> ArrayView1<'_, f64> {
        self.prices.row(self.dates.len() - 1)
    }

    /// Row index of the most recent date `<= date`.
    pub fn row_as_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.partition_point(|d| *d <= date).checked_sub(1)
    }

    /// Ticker -> price for the most recent stored date `<= date`.
    /// `None` when `date` precedes the first stored date.
    pub fn as_of(&self, date: NaiveDate) -> Option<HashMap<&str, f64>> {
        let row = self.prices.row(self.row_as_of(date)?);
        Some(self.tickers.iter().map(String::as_str).zip(row.iter().copied()).collect())
    }

    /// Σ weight * price per date over the given (column, weight) pairs.
    pub fn weighted_series(&self, columns: &[usize], weights: &Array1<f64>) -> Array1<f64> {
        self.prices.select(Axis(1), columns).dot(weights)
    }
}
