pub mod analyzer;
pub mod error;
pub mod types;
pub mod weights;

pub use analyzer::{analyze, BasketAnalyzer};
pub use error::AnalysisError;
pub use types::{AnalysisResult, HistoryPoint, HoldingRow, RawHolding, WeightEntry, WeightVector};
