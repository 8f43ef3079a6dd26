use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use ndarray::Array2;
use tracing::{debug, info, instrument};

use super::error::PriceStoreError;
use super::price_table::PriceTable;

const DATE_COLUMN: &str = "DATE";
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Load the price table from a CSV file with a `DATE` column and one column per ticker.
#[instrument(skip(path), fields(path = %path.as_ref().display(), timed = true))]
pub fn load_price_table<P: AsRef<Path>>(path: P) -> Result<PriceTable, PriceStoreError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PriceStoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let table = read_price_table(file)?;
    info!(
        rows = table.num_dates(),
        columns = table.num_tickers(),
        latest_date = %table.latest_date(),
        "Loaded price table"
    );
    Ok(table)
}

/// Parse a price table from any CSV source. Rows may arrive in any date order.
pub fn read_price_table<R: Read>(source: R) -> Result<PriceTable, PriceStoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(DATE_COLUMN))
        .ok_or(PriceStoreError::MissingDateColumn)?;

    let mut tickers = Vec::with_capacity(headers.len().saturating_sub(1));
    for (i, header) in headers.iter().enumerate() {
        if i == date_idx {
            continue;
        }
        if header.is_empty() {
            return Err(PriceStoreError::UnnamedColumn(i));
        }
        tickers.push(header.to_string());
    }
    if tickers.is_empty() {
        return Err(PriceStoreError::NoTickerColumns);
    }

    let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| PriceStoreError::InvalidDate {
            line,
            value: raw_date.to_string(),
        })?;

        let mut prices = Vec::with_capacity(tickers.len());
        for (field, ticker) in record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(_, field)| field)
            .zip(tickers.iter())
        {
            let price = field.parse::<f64>().map_err(|_| PriceStoreError::UnparseablePrice {
                line,
                ticker: ticker.clone(),
                value: field.to_string(),
            })?;
            prices.push(price);
        }
        rows.push((date, prices));
    }
    debug!(rows = rows.len(), "Parsed price rows");

    rows.sort_by_key(|(date, _)| *date);

    let n_dates = rows.len();
    let mut dates = Vec::with_capacity(n_dates);
    let mut flat = Vec::with_capacity(n_dates * tickers.len());
    for (date, prices) in rows {
        dates.push(date);
        flat.extend(prices);
    }
    let n_tickers = tickers.len();
    let matrix = Array2::from_shape_vec((n_dates, n_tickers), flat).map_err(|_| PriceStoreError::ShapeMismatch {
        expected: (n_dates, n_tickers),
        actual: (n_dates, 0),
    })?;

    PriceTable::new(dates, tickers, matrix)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}
