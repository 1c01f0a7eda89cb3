use crate::rank::order_by_total_desc;
use crate::spec::{DateRange, Dimension, FilterSpec};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tessella_records::RecordStore;

/// Size of the default flow selection
pub const DEFAULT_FLOW_TOP_N: usize = 5;

/// Values a user can pick from, per filter dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetOptions {
    pub aliases: Vec<String>,
    pub alias_rows: Vec<String>,
    pub alias_cols: Vec<String>,
    pub clusters: Vec<String>,
    /// Clusters reachable from the co-occurrence row aliases
    pub cluster_rows: Vec<String>,
    pub cluster_cols: Vec<String>,
    pub countries: Vec<String>,
    /// Date slider bounds across all time tables
    pub month_bounds: Option<DateRange>,
}

fn sorted_unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl FacetOptions {
    pub fn from_store(store: &RecordStore) -> Self {
        let occurrence = store.occurrence().unwrap_or_default();
        let cooccurrence = store.cooccurrence().unwrap_or_default();
        let country = store.country_occurrence().unwrap_or_default();

        let alias_rows = sorted_unique(cooccurrence.iter().map(|r| r.alias_row.as_str()));
        let alias_cols = sorted_unique(cooccurrence.iter().map(|r| r.alias_col.as_str()));

        let (clusters, cluster_rows, cluster_cols) = match store.alias_clusters() {
            Some(map) => (
                map.cluster_names(),
                map.clusters_for(alias_rows.iter().map(String::as_str)),
                map.clusters_for(alias_cols.iter().map(String::as_str)),
            ),
            None => Default::default(),
        };

        Self {
            aliases: sorted_unique(occurrence.iter().map(|r| r.alias.as_str())),
            alias_rows,
            alias_cols,
            clusters,
            cluster_rows,
            cluster_cols,
            countries: sorted_unique(country.iter().filter_map(|r| r.country.as_deref())),
            month_bounds: store
                .month_bounds()
                .map(|(start, end)| DateRange::new(start, end)),
        }
    }

    /// Options offered for one filter dimension
    pub fn values(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Alias => &self.aliases,
            Dimension::AliasRow => &self.alias_rows,
            Dimension::AliasCol => &self.alias_cols,
            Dimension::Cluster => &self.clusters,
            Dimension::ClusterRow => &self.cluster_rows,
            Dimension::ClusterCol => &self.cluster_cols,
            Dimension::Country => &self.countries,
        }
    }
}

/// Default selection of the flow chart: the `n` countries and the `n`
/// clusters with the largest total occurrence in the country table.
///
/// Totals ignore the date range. Ties are broken alphabetically. Without a
/// cluster map only the country selection is set.
pub fn default_flow_filter(store: &RecordStore, n: usize) -> FilterSpec {
    let rows = store.country_occurrence().unwrap_or_default();
    let clusters = store.alias_clusters();

    let mut country_totals: BTreeMap<&str, u64> = BTreeMap::new();
    let mut cluster_totals: BTreeMap<&str, u64> = BTreeMap::new();
    for row in rows {
        if let Some(country) = row.country.as_deref() {
            let total = country_totals.entry(country).or_insert(0);
            *total = total.saturating_add(row.occurrence);
        }
        let cluster = row
            .alias
            .as_deref()
            .and_then(|alias| clusters.and_then(|map| map.cluster_of(alias)));
        if let Some(cluster) = cluster {
            let total = cluster_totals.entry(cluster).or_insert(0);
            *total = total.saturating_add(row.occurrence);
        }
    }

    let top_countries: Vec<&str> = order_by_total_desc(country_totals.into_iter().collect())
        .into_iter()
        .take(n)
        .collect();
    let top_clusters: Vec<&str> = order_by_total_desc(cluster_totals.into_iter().collect())
        .into_iter()
        .take(n)
        .collect();

    log::debug!(
        "Default flow selection: countries {:?}, clusters {:?}",
        top_countries,
        top_clusters
    );

    FilterSpec::new()
        .with_values(Dimension::Country, top_countries)
        .with_values(Dimension::Cluster, top_clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tessella_records::{
        AliasClusterEntry, CooccurrenceRecord, CountryOccurrenceRecord, Month, OccurrenceRecord,
    };

    fn entry(alias: &str, cluster: &str) -> AliasClusterEntry {
        AliasClusterEntry {
            alias: alias.to_string(),
            cluster_name: cluster.to_string(),
        }
    }

    fn country(name: &str, alias: &str, occurrence: u64) -> CountryOccurrenceRecord {
        CountryOccurrenceRecord {
            country: Some(name.to_string()),
            alias: Some(alias.to_string()),
            month: Month::new(2021, 3),
            occurrence,
        }
    }

    #[test]
    fn options_are_sorted_and_unique() {
        let store = RecordStore::new()
            .with_occurrence(vec![
                OccurrenceRecord {
                    alias: "b".into(),
                    month: Month::new(2020, 1),
                    occurrence: 1,
                },
                OccurrenceRecord {
                    alias: "a".into(),
                    month: Month::new(2019, 7),
                    occurrence: 1,
                },
                OccurrenceRecord {
                    alias: "b".into(),
                    month: None,
                    occurrence: 1,
                },
            ])
            .with_cooccurrence(vec![CooccurrenceRecord {
                alias_row: "a".into(),
                alias_col: "c".into(),
                month: Month::new(2022, 2),
                cooccurrence: 4,
            }])
            .with_alias_clusters(vec![entry("a", "Fuels"), entry("c", "Storage")]);

        let options = FacetOptions::from_store(&store);
        assert_eq!(options.aliases, vec!["a", "b"]);
        assert_eq!(options.clusters, vec!["Fuels", "Storage"]);
        assert_eq!(options.cluster_rows, vec!["Fuels"]);
        assert_eq!(options.values(Dimension::ClusterCol), ["Storage".to_string()]);
        assert!(options.countries.is_empty());
        assert_eq!(
            options.month_bounds,
            Some(DateRange::new(
                Month::new(2019, 7).unwrap(),
                Month::new(2022, 2).unwrap()
            ))
        );
    }

    #[test]
    fn flow_defaults_pick_top_n() {
        let store = RecordStore::new()
            .with_country_occurrence(vec![
                country("Chile", "h2", 10),
                country("Peru", "h2", 3),
                country("Chile", "battery", 1),
                country("Bolivia", "battery", 7),
                country("Argentina", "unmapped", 3),
            ])
            .with_alias_clusters(vec![entry("h2", "Fuels"), entry("battery", "Storage")]);

        let spec = default_flow_filter(&store, 2);
        let countries: Vec<&str> = spec
            .allowed(Dimension::Country)
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(countries, vec!["Bolivia", "Chile"]);

        let clusters: Vec<&str> = spec
            .allowed(Dimension::Cluster)
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(clusters, vec!["Fuels", "Storage"]);
    }

    #[test]
    fn flow_tie_breaks_alphabetically() {
        let store = RecordStore::new().with_country_occurrence(vec![
            country("Peru", "x", 3),
            country("Argentina", "x", 3),
            country("Chile", "x", 1),
        ]);

        let spec = default_flow_filter(&store, 1);
        assert_eq!(
            spec.allowed(Dimension::Country).unwrap().iter().collect::<Vec<_>>(),
            vec!["Argentina"]
        );
        assert!(spec.allowed(Dimension::Cluster).is_none());
    }
}
