use chrono::NaiveDate;
use thiserror::Error;

/// Failures while building the price table. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum PriceStoreError {
    #[error("failed to read price file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse price CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("price CSV has no DATE column")]
    MissingDateColumn,

    #[error("price CSV has no ticker columns")]
    NoTickerColumns,

    #[error("price CSV has no data rows")]
    NoRows,

    #[error("price CSV has an unnamed column at position {0}")]
    UnnamedColumn(usize),

    #[error("duplicate ticker column '{0}'")]
    DuplicateTicker(String),

    #[error("invalid date '{value}' on line {line}")]
    InvalidDate { line: u64, value: String },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("dates are not ascending at {0}")]
    UnsortedDates(NaiveDate),

    #[error("non-numeric price '{value}' for {ticker} on line {line}")]
    UnparseablePrice { line: u64, ticker: String, value: String },

    #[error("invalid price {value} for {ticker} on {date}")]
    InvalidPrice { date: NaiveDate, ticker: String, value: f64 },

    #[error("price matrix shape {actual:?} does not match {expected:?}")]
    ShapeMismatch { expected: (usize, usize), actual: (usize, usize) },
}
