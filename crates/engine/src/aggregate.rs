use crate::error::{EngineError, Result};
use crate::filter::FilteredView;
use crate::row::{dimension_value, FacetRow};
use crate::spec::Dimension;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tessella_records::AliasClusterMap;

/// Separator between the two values of a pair key
pub const PAIR_SEPARATOR: &str = " & ";

/// Grouping key: one value per grouped dimension.
///
/// Identity is the tuple of values; the joined display string is only used
/// for labels and alphabetical ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey(Vec<String>);

impl SeriesKey {
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self(vec![first.into(), second.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn display(&self) -> String {
        self.0.join(PAIR_SEPARATOR)
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Serialize for SeriesKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Metric summed per (key, year)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedSeries {
    pub key: SeriesKey,
    pub year: i32,
    pub metric: u64,
}

/// Time-free sum for one (source, target) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairTotal {
    pub source: String,
    pub target: String,
    pub value: u64,
}

/// Result of grouping a filtered view by key and year
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    series: Vec<AggregatedSeries>,
    /// Per-key totals in first-appearance order
    totals: Vec<(SeriesKey, u64)>,
    /// Rows dropped for a null group value
    dropped_rows: usize,
}

impl Aggregation {
    pub fn series(&self) -> &[AggregatedSeries] {
        &self.series
    }

    pub fn totals(&self) -> &[(SeriesKey, u64)] {
        &self.totals
    }

    /// Keys in first-appearance order
    pub fn keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.totals.iter().map(|(key, _)| key)
    }

    pub fn total(&self, key: &SeriesKey) -> Option<u64> {
        self.totals
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, total)| *total)
    }

    pub fn grand_total(&self) -> u64 {
        self.totals
            .iter()
            .fold(0u64, |sum, (_, total)| sum.saturating_add(*total))
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Distinct years, ascending
    pub fn years(&self) -> Vec<i32> {
        self.series
            .iter()
            .map(|s| s.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Stacked bar length of each visible key (sum across years)
    pub fn stack_totals(&self, visible: &[SeriesKey]) -> Vec<(SeriesKey, u64)> {
        let visible: BTreeSet<&SeriesKey> = visible.iter().collect();
        self.totals
            .iter()
            .filter(|(key, _)| visible.contains(key))
            .cloned()
            .collect()
    }

    /// Longest stack among the visible keys, 0 when none is visible
    pub fn max_stack(&self, visible: &[SeriesKey]) -> u64 {
        self.stack_totals(visible)
            .into_iter()
            .map(|(_, total)| total)
            .max()
            .unwrap_or(0)
    }

    /// Smallest and largest per-(key, year) value
    pub fn metric_range(&self) -> Option<(u64, u64)> {
        let min = self.series.iter().map(|s| s.metric).min()?;
        let max = self.series.iter().map(|s| s.metric).max()?;
        Some((min, max))
    }

    /// Collapse two-part keys into time-free pair totals
    pub fn pair_totals(&self) -> Vec<PairTotal> {
        self.totals
            .iter()
            .filter_map(|(key, value)| match key.parts() {
                [source, target] => Some(PairTotal {
                    source: source.clone(),
                    target: target.clone(),
                    value: *value,
                }),
                _ => None,
            })
            .collect()
    }
}

/// Group a filtered view by one or two dimensions and calendar year, summing
/// the row metric.
///
/// Series come out in key first-appearance order, then ascending year. Rows
/// whose group value is null (e.g. an alias without cluster) are dropped and
/// counted.
pub fn aggregate<R: FacetRow>(
    view: &FilteredView<'_, R>,
    dimensions: &[Dimension],
    clusters: Option<&AliasClusterMap>,
) -> Result<Aggregation> {
    if dimensions.is_empty() || dimensions.len() > 2 {
        return Err(EngineError::InvalidSpec(format!(
            "aggregation needs one or two group dimensions, got {}",
            dimensions.len()
        )));
    }
    if let Some(dimension) = dimensions.iter().find(|d| !R::supports(**d)) {
        return Err(EngineError::UnsupportedDimension {
            dimension: *dimension,
            table: R::TABLE,
        });
    }

    let mut index: HashMap<SeriesKey, usize> = HashMap::new();
    let mut groups: Vec<(SeriesKey, BTreeMap<i32, u64>)> = Vec::new();
    let mut dropped_rows = 0usize;

    'rows: for row in view.rows() {
        let Some(month) = row.month() else {
            dropped_rows += 1;
            continue;
        };

        let mut parts = Vec::with_capacity(dimensions.len());
        for dimension in dimensions {
            match dimension_value(*row, *dimension, clusters) {
                Some(value) => parts.push(value.to_string()),
                None => {
                    dropped_rows += 1;
                    continue 'rows;
                }
            }
        }

        let key = SeriesKey(parts);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, BTreeMap::new()));
                groups.len() - 1
            }
        };
        let cell = groups[slot].1.entry(month.year()).or_insert(0);
        *cell = cell.saturating_add(row.metric());
    }

    let mut series = Vec::new();
    let mut totals = Vec::with_capacity(groups.len());
    for (key, years) in groups {
        let total = years
            .values()
            .fold(0u64, |sum, value| sum.saturating_add(*value));
        for (year, metric) in years {
            series.push(AggregatedSeries {
                key: key.clone(),
                year,
                metric,
            });
        }
        totals.push((key, total));
    }

    if dropped_rows > 0 {
        log::debug!(
            "Aggregation by {:?} dropped {} rows with null group values",
            dimensions,
            dropped_rows
        );
    }

    Ok(Aggregation {
        series,
        totals,
        dropped_rows,
    })
}

/// Time-free sums per `(source, target)` pair, first-appearance order
pub fn aggregate_pairs<R: FacetRow>(
    view: &FilteredView<'_, R>,
    source: Dimension,
    target: Dimension,
    clusters: Option<&AliasClusterMap>,
) -> Result<(Vec<PairTotal>, usize)> {
    let aggregation = aggregate(view, &[source, target], clusters)?;
    Ok((aggregation.pair_totals(), aggregation.dropped_rows()))
}
