use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

/// One (name, weight) row of an uploaded weights file, before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHolding {
    pub name: String,
    pub weight: f64,
}

/// Every spelling of one case-folded name and its summed weight.
///
/// Spellings are kept sorted so the group does not depend on upload row order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    pub spellings: BTreeSet<String>,
    pub weight: f64,
}

impl WeightEntry {
    /// Spelling used when no price column matches any of them.
    pub fn name(&self) -> &str {
        self.spellings.first().map_or("", String::as_str)
    }
}

/// Aggregated, normalized basket weights. Weights sum to 1.0.
///
/// Keyed by case-folded name, which fixes the iteration order used for matching
/// and for ranking ties.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    entries: BTreeMap<String, WeightEntry>,
}

impl WeightVector {
    pub(crate) fn from_normalized(entries: BTreeMap<String, WeightEntry>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightEntry> + '_ {
        self.entries.values()
    }

    /// Weight of the group `name` belongs to, ignoring case.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(&name.trim().to_lowercase()).map(|e| e.weight)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.values().map(|e| e.weight).sum()
    }
}

/// Current-snapshot valuation of one matched ticker, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingRow {
    pub ticker: String,
    pub weight: f64, // 4 dp
    pub price: f64,  // 2 dp
    pub value: f64,  // 2 dp
}

/// Basket value on one stored date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub latest_date: NaiveDate,
    pub history: Vec<HistoryPoint>,
    pub holdings: Vec<HoldingRow>,
    pub top5: Vec<HoldingRow>,
    /// Uploaded names with no price column, sorted. Omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}
