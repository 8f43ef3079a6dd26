use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use super::error::AnalysisError;
use super::types::{RawHolding, WeightEntry, WeightVector};

const NAME_COLUMN: &str = "name";
const WEIGHT_COLUMN: &str = "weight";

/// Parse an uploaded weights CSV into raw (name, weight) rows.
///
/// Headers are matched after lower-casing and trimming; other columns are ignored.
/// Names are trimmed but keep their case. Every weight must be a finite number.
#[instrument(skip_all, fields(bytes = raw.len()))]
pub fn parse_holdings(raw: &[u8]) -> Result<Vec<RawHolding>, AnalysisError> {
    let text = std::str::from_utf8(raw)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let name_idx = headers.iter().position(|h| h == NAME_COLUMN);
    let weight_idx = headers.iter().position(|h| h == WEIGHT_COLUMN);
    let (Some(name_idx), Some(weight_idx)) = (name_idx, weight_idx) else {
        return Err(AnalysisError::Schema);
    };

    let mut holdings = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        let name = record.get(name_idx).unwrap_or_default().trim().to_string();
        let raw_weight = record.get(weight_idx).unwrap_or_default();
        let weight = parse_weight(raw_weight).ok_or_else(|| AnalysisError::Format {
            line,
            value: raw_weight.to_string(),
        })?;

        holdings.push(RawHolding { name, weight });
    }
    debug!(rows = holdings.len(), "Parsed weight rows");
    Ok(holdings)
}

fn parse_weight(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|w| w.is_finite())
}

/// Sum weights of rows that share a name, ignoring case.
///
/// Every spelling of a name is kept; matching picks the one with a price column.
/// Groups are keyed by the case-folded name.
pub fn aggregate_holdings(holdings: Vec<RawHolding>) -> BTreeMap<String, WeightEntry> {
    let mut groups: BTreeMap<String, WeightEntry> = BTreeMap::new();
    for RawHolding { name, weight } in holdings {
        let entry = groups.entry(name.to_lowercase()).or_insert_with(|| WeightEntry {
            spellings: BTreeSet::new(),
            weight: 0.0,
        });
        entry.weight += weight;
        entry.spellings.insert(name);
    }
    groups
}

/// Divide every weight by the total so the result sums to 1.0.
///
/// Rejects a total that is not positive or that overflowed to infinity.
pub fn normalize_weights(mut groups: BTreeMap<String, WeightEntry>) -> Result<WeightVector, AnalysisError> {
    let total: f64 = groups.values().map(|e| e.weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(AnalysisError::InvalidWeights { total });
    }

    for entry in groups.values_mut() {
        entry.weight /= total;
    }
    Ok(WeightVector::from_normalized(groups))
}

/// Parse, aggregate and normalize an uploaded weights file.
pub fn build_weight_vector(raw: &[u8]) -> Result<WeightVector, AnalysisError> {
    let holdings = parse_holdings(raw)?;
    let aggregated = aggregate_holdings(holdings);
    debug!(unique_names = aggregated.len(), "Aggregated duplicate names");
    normalize_weights(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(name: &str, weight: f64) -> RawHolding {
        RawHolding { name: name.to_string(), weight }
    }

    #[test]
    fn headers_are_case_and_space_insensitive() {
        let raw = b" Name ,WEIGHT ,sector\n AAA ,0.5,tech\nBBB,0.5,energy\n";
        let holdings = parse_holdings(raw).unwrap();
        assert_eq!(holdings, vec![holding("AAA", 0.5), holding("BBB", 0.5)]);
    }

    #[test]
    fn name_case_is_preserved() {
        let holdings = parse_holdings(b"name,weight\n aapl ,1\n").unwrap();
        assert_eq!(holdings[0].name, "aapl");
    }

    #[test]
    fn missing_weight_column_is_a_schema_error() {
        let err = parse_holdings(b"name,qty\nAAA,1\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Schema));

        let err = parse_holdings(b"ticker,weight\nAAA,1\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Schema));
    }

    #[test]
    fn non_numeric_weight_is_a_format_error() {
        let err = parse_holdings(b"name,weight\nAAA,1\nBBB,lots\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Format { line: 3, ref value } if value == "lots"));

        let err = parse_holdings(b"name,weight\nAAA,\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Format { .. }));

        let err = parse_holdings(b"name,weight\nAAA,inf\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Format { .. }));
    }

    #[test]
    fn invalid_utf8_and_ragged_rows_are_parse_errors() {
        let err = parse_holdings(&[0x6e, 0x61, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));

        let err = parse_holdings(b"name,weight\nAAA,1,extra\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let holdings = parse_holdings("\u{feff}name,weight\nAAA,1\n".as_bytes()).unwrap();
        assert_eq!(holdings, vec![holding("AAA", 1.0)]);
    }

    #[test]
    fn duplicates_are_summed_ignoring_case() {
        let holdings = parse_holdings(b"name,weight\nAAA,0.3\naaa ,0.3\n").unwrap();
        let aggregated = aggregate_holdings(holdings);
        assert_eq!(aggregated.len(), 1);
        let group = &aggregated["aaa"];
        assert!(group.spellings.contains("AAA") && group.spellings.contains("aaa"));
        assert_eq!(group.name(), "AAA");
        assert!((group.weight - 0.6).abs() < 1e-12);
    }

    #[test]
    fn aggregation_ignores_row_order() {
        let forward = aggregate_holdings(vec![holding("AAA", 0.3), holding("aaa", 0.3), holding("BBB", 0.4)]);
        let reversed = aggregate_holdings(vec![holding("BBB", 0.4), holding("aaa", 0.3), holding("AAA", 0.3)]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn aggregation_orders_by_folded_name() {
        let aggregated = aggregate_holdings(vec![holding("ccc", 1.0), holding("BBB", 1.0), holding("aaa", 1.0)]);
        let names: Vec<_> = aggregated.values().map(|e| e.name()).collect();
        assert_eq!(names, vec!["aaa", "BBB", "ccc"]);
    }

    #[test]
    fn normalization_sums_to_one() {
        let groups = aggregate_holdings(vec![holding("AAA", 3.0), holding("BBB", 1.0), holding("CCC", -0.5)]);
        let weights = normalize_weights(groups).unwrap();
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert!((weights.get("AAA").unwrap() - 3.0 / 3.5).abs() < 1e-12);
        assert!(weights.get("CCC").unwrap() < 0.0);
    }

    #[test]
    fn non_positive_total_is_rejected() {
        let zero = aggregate_holdings(vec![holding("AAA", 1.0), holding("BBB", -1.0)]);
        let err = normalize_weights(zero).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidWeights { total } if total == 0.0));

        let err = build_weight_vector(b"name,weight\nAAA,-1\n").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidWeights { total } if total == -1.0));

        let err = build_weight_vector(b"name,weight\nAAA,0.5\nBBB,-2\n").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidWeights { total } if total < 0.0));

        let err = build_weight_vector(b"name,weight\n").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidWeights { .. }));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let err = build_weight_vector(b"name,weight\nAAA,1e308\nBBB,1e308\n").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidWeights { total } if total.is_infinite()));

        let weights = build_weight_vector(b"name,weight\nAAA,1e307\nBBB,1e307\n").unwrap();
        assert_eq!(weights.get("AAA"), Some(0.5));
    }
}
