use crate::error::{EngineError, Result};
use crate::row::{dimension_value, FacetRow};
use crate::spec::{Dimension, FilterSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tessella_records::AliasClusterMap;

/// Row accounting for one render pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    /// Rows in the source table
    pub rows_in: usize,

    /// Rows surviving every filter
    pub rows_kept: usize,

    /// Rows without a parseable month
    pub unparseable_dates: usize,

    pub outside_date_range: usize,

    /// Rows rejected by a categorical filter
    pub excluded_by_filter: usize,

    /// Rows dropped because a join (alias→cluster, country→ISO-3) had no match
    pub unmapped_categories: usize,
}

/// Filtered, borrowed view over a table. The table itself is never touched.
#[derive(Debug, Clone)]
pub struct FilteredView<'a, R> {
    rows: Vec<&'a R>,
    stats: PassStats,
}

impl<'a, R: FacetRow> FilteredView<'a, R> {
    pub fn rows(&self) -> &[&'a R] {
        &self.rows
    }

    pub fn stats(&self) -> &PassStats {
        &self.stats
    }

    pub fn into_stats(self) -> PassStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the metric over every kept row, saturating at `u64::MAX`
    pub fn metric_sum(&self) -> u64 {
        self.rows
            .iter()
            .fold(0u64, |sum, row| sum.saturating_add(row.metric()))
    }
}

/// Apply date and categorical filters to a table.
///
/// Rows without a parseable month never enter a view. Cluster filters are
/// evaluated through the alias→cluster join; an alias missing from the map
/// has no cluster and fails an active cluster filter. Without a cluster map
/// active cluster filters are skipped.
pub fn filter<'a, R: FacetRow>(
    rows: &'a [R],
    spec: &FilterSpec,
    clusters: Option<&AliasClusterMap>,
) -> Result<FilteredView<'a, R>> {
    let mut active: Vec<(Dimension, &BTreeSet<String>)> = Vec::new();
    for dimension in spec.active_dimensions() {
        if !R::supports(dimension) {
            return Err(EngineError::UnsupportedDimension {
                dimension,
                table: R::TABLE,
            });
        }
        if dimension.is_derived() && clusters.is_none() {
            log::warn!(
                "{} filter on {} ignored: alias cluster map not loaded",
                dimension,
                R::TABLE
            );
            continue;
        }
        if let Some(allowed) = spec.allowed(dimension) {
            active.push((dimension, allowed));
        }
    }

    let mut stats = PassStats {
        rows_in: rows.len(),
        ..PassStats::default()
    };
    let mut kept = Vec::with_capacity(rows.len());

    'rows: for row in rows {
        let Some(month) = row.month() else {
            stats.unparseable_dates += 1;
            continue;
        };
        if let Some(range) = &spec.date_range {
            if !range.contains(month) {
                stats.outside_date_range += 1;
                continue;
            }
        }

        for (dimension, allowed) in &active {
            match dimension_value(row, *dimension, clusters) {
                Some(value) if allowed.contains(value) => {}
                Some(_) => {
                    stats.excluded_by_filter += 1;
                    continue 'rows;
                }
                None if dimension.is_derived() => {
                    stats.unmapped_categories += 1;
                    continue 'rows;
                }
                None => {
                    stats.excluded_by_filter += 1;
                    continue 'rows;
                }
            }
        }

        kept.push(row);
    }

    stats.rows_kept = kept.len();
    log::debug!(
        "Filtered {}: {} of {} rows kept ({} undated, {} out of range, {} filtered, {} unmapped)",
        R::TABLE,
        stats.rows_kept,
        stats.rows_in,
        stats.unparseable_dates,
        stats.outside_date_range,
        stats.excluded_by_filter,
        stats.unmapped_categories
    );

    Ok(FilteredView { rows: kept, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessella_records::{AliasClusterEntry, CountryOccurrenceRecord, Month, OccurrenceRecord};

    fn occ(alias: &str, month: &str, occurrence: u64) -> OccurrenceRecord {
        OccurrenceRecord {
            alias: alias.to_string(),
            month: Month::parse(month),
            occurrence,
        }
    }

    fn clusters(pairs: &[(&str, &str)]) -> AliasClusterMap {
        AliasClusterMap::from_entries(pairs.iter().map(|(alias, cluster)| AliasClusterEntry {
            alias: alias.to_string(),
            cluster_name: cluster.to_string(),
        }))
    }

    #[test]
    fn empty_filter_keeps_every_dated_row() {
        let rows = vec![occ("X", "2020-01", 5), occ("Y", "bad", 2), occ("Z", "2021-01", 1)];
        let spec = FilterSpec::new().with_values(Dimension::Alias, Vec::<String>::new());

        let view = filter(&rows, &spec, None).expect("filter");
        assert_eq!(view.len(), 2);
        assert_eq!(view.stats().unparseable_dates, 1);
        assert_eq!(view.metric_sum(), 6);
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let rows = vec![
            occ("X", "2019-12", 1),
            occ("X", "2020-01", 2),
            occ("X", "2020-06", 4),
            occ("X", "2020-07", 8),
        ];
        let spec = FilterSpec::new()
            .with_date_range(Month::new(2020, 1).unwrap(), Month::new(2020, 6).unwrap());

        let view = filter(&rows, &spec, None).expect("filter");
        assert_eq!(view.metric_sum(), 6);
        assert_eq!(view.stats().outside_date_range, 2);
    }

    #[test]
    fn unmapped_alias_fails_active_cluster_filter() {
        let map = clusters(&[("A", "Clu1")]);
        let rows = vec![occ("A", "2020-01", 1), occ("B", "2020-01", 7)];
        let spec = FilterSpec::new().with_values(Dimension::Cluster, ["Clu1"]);

        let view = filter(&rows, &spec, Some(&map)).expect("filter");
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].alias, "A");
        assert_eq!(view.stats().unmapped_categories, 1);
    }

    #[test]
    fn unmapped_alias_survives_when_no_cluster_filter() {
        let map = clusters(&[("A", "Clu1")]);
        let rows = vec![occ("A", "2020-01", 1), occ("B", "2020-01", 7)];

        let view = filter(&rows, &FilterSpec::new(), Some(&map)).expect("filter");
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn cluster_filter_skipped_without_map() {
        let rows = vec![occ("A", "2020-01", 1)];
        let spec = FilterSpec::new().with_values(Dimension::Cluster, ["Clu1"]);

        let view = filter(&rows, &spec, None).expect("filter");
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn foreign_dimension_is_rejected() {
        let rows = vec![occ("A", "2020-01", 1)];
        let spec = FilterSpec::new().with_values(Dimension::Country, ["Chile"]);

        let err = filter(&rows, &spec, None).expect_err("occurrence has no country");
        assert_eq!(
            err,
            EngineError::UnsupportedDimension {
                dimension: Dimension::Country,
                table: tessella_records::TableKind::Occurrence,
            }
        );
    }

    #[test]
    fn missing_country_fails_country_filter() {
        let rows = vec![
            CountryOccurrenceRecord {
                country: None,
                alias: None,
                month: Month::new(2020, 1),
                occurrence: 3,
            },
            CountryOccurrenceRecord {
                country: Some("Chile".into()),
                alias: None,
                month: Month::new(2020, 1),
                occurrence: 4,
            },
        ];
        let spec = FilterSpec::new().with_values(Dimension::Country, ["Chile"]);

        let view = filter(&rows, &spec, None).expect("filter");
        assert_eq!(view.metric_sum(), 4);
        assert_eq!(view.stats().excluded_by_filter, 1);
    }
}
