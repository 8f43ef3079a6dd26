use thiserror::Error;

/// Client-input faults raised while analyzing an uploaded weights file.
///
/// Every variant is deterministic in the uploaded bytes, so none of them is retried.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid CSV format: {0}")]
    Parse(String),

    #[error("ETF CSV must have columns: 'name' and 'weight'")]
    Schema,

    #[error("Invalid CSV format: weight '{value}' on line {line} is not a number")]
    Format { line: u64, value: String },

    #[error("Weights must sum to a positive, finite total (total = {total})")]
    InvalidWeights { total: f64 },

    #[error("No matching tickers found between ETF file and prices.csv")]
    NoMatch,

    #[error("Invalid CSV format: {0}")]
    Other(String),
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::Schema => "schema_error",
            Self::Format { .. } => "format_error",
            Self::InvalidWeights { .. } => "invalid_weights",
            Self::NoMatch => "no_match",
            Self::Other(_) => "bad_request",
        }
    }
}

impl From<std::str::Utf8Error> for AnalysisError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::Parse(format!("file is not valid UTF-8: {e}"))
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(e: csv::Error) -> Self {
        match e.kind() {
            csv::ErrorKind::Io(_) => Self::Other(e.to_string()),
            _ => Self::Parse(e.to_string()),
        }
    }
}
