use crate::month::Month;
use serde::{Deserialize, Serialize};

/// Monthly occurrence count of a single alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub alias: String,

    /// `None` when the source cell could not be parsed
    pub month: Option<Month>,

    pub occurrence: u64,
}

/// Monthly joint occurrence of two aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceRecord {
    pub alias_row: String,
    pub alias_col: String,
    pub month: Option<Month>,
    pub cooccurrence: u64,
}

/// Monthly occurrence attributed to a country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryOccurrenceRecord {
    pub country: Option<String>,

    /// Only used to join against the alias→cluster map
    pub alias: Option<String>,

    pub month: Option<Month>,
    pub occurrence: u64,
}

/// One row of the alias→cluster table as it appears in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasClusterEntry {
    pub alias: String,
    pub cluster_name: String,
}

/// Parse a count cell. Blank, `NaN` and negative cells count as zero and
/// decimal cells are truncated.
pub fn parse_metric(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return value;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

/// Normalize an optional text cell: blank and `NaN` cells are absent.
pub fn parse_text(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(value.to_string())
    }
}
