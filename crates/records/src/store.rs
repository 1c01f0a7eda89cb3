use crate::cluster_map::AliasClusterMap;
use crate::month::Month;
use crate::types::{
    AliasClusterEntry, CooccurrenceRecord, CountryOccurrenceRecord, OccurrenceRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four input tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Occurrence,
    Cooccurrence,
    CountryOccurrence,
    AliasCluster,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Occurrence,
        TableKind::Cooccurrence,
        TableKind::CountryOccurrence,
        TableKind::AliasCluster,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Occurrence => "lookup_occurrence.csv",
            TableKind::Cooccurrence => "lookup_cooccurrence.csv",
            TableKind::CountryOccurrence => "lookup_country_occurrence.csv",
            TableKind::AliasCluster => "fact_alias_cluster.csv",
        }
    }

    /// Columns a file must carry to be usable
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Occurrence => &["alias", "month", "occurrence"],
            TableKind::Cooccurrence => &["alias_row", "alias_col", "month", "cooccurrence"],
            TableKind::CountryOccurrence => &["country", "month", "occurrence"],
            TableKind::AliasCluster => &["alias", "cluster_name"],
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Outcome of loading one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    Loaded { rows: usize },
    Empty,
    Missing { reason: String },
}

/// Per-table load outcome, reported to the user as warnings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub tables: BTreeMap<TableKind, TableStatus>,
}

impl LoadReport {
    pub fn record(&mut self, kind: TableKind, status: TableStatus) {
        self.tables.insert(kind, status);
    }

    pub fn status(&self, kind: TableKind) -> Option<&TableStatus> {
        self.tables.get(&kind)
    }

    pub fn missing(&self) -> Vec<TableKind> {
        self.tables
            .iter()
            .filter(|(_, status)| matches!(status, TableStatus::Missing { .. }))
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn empty(&self) -> Vec<TableKind> {
        self.tables
            .iter()
            .filter(|(_, status)| matches!(status, TableStatus::Empty))
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        TableKind::ALL
            .iter()
            .all(|kind| matches!(self.status(*kind), Some(TableStatus::Loaded { .. })))
    }
}

/// Read-only record store shared by every render pass.
///
/// A table is `None` when its file was missing or unreadable and `Some(&[])`
/// when it parsed but held no rows.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    occurrence: Option<Vec<OccurrenceRecord>>,
    cooccurrence: Option<Vec<CooccurrenceRecord>>,
    country_occurrence: Option<Vec<CountryOccurrenceRecord>>,
    alias_clusters: Option<AliasClusterMap>,
    report: LoadReport,
}

fn status_for(rows: usize) -> TableStatus {
    if rows == 0 {
        TableStatus::Empty
    } else {
        TableStatus::Loaded { rows }
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_occurrence(mut self, rows: Vec<OccurrenceRecord>) -> Self {
        self.report.record(TableKind::Occurrence, status_for(rows.len()));
        self.occurrence = Some(rows);
        self
    }

    pub fn with_cooccurrence(mut self, rows: Vec<CooccurrenceRecord>) -> Self {
        self.report.record(TableKind::Cooccurrence, status_for(rows.len()));
        self.cooccurrence = Some(rows);
        self
    }

    pub fn with_country_occurrence(mut self, rows: Vec<CountryOccurrenceRecord>) -> Self {
        self.report
            .record(TableKind::CountryOccurrence, status_for(rows.len()));
        self.country_occurrence = Some(rows);
        self
    }

    pub fn with_alias_clusters(mut self, entries: Vec<AliasClusterEntry>) -> Self {
        self.report
            .record(TableKind::AliasCluster, status_for(entries.len()));
        self.alias_clusters = Some(AliasClusterMap::from_entries(entries));
        self
    }

    /// Mark a table as missing, dropping any rows held for it
    pub fn with_missing(mut self, kind: TableKind, reason: impl Into<String>) -> Self {
        match kind {
            TableKind::Occurrence => self.occurrence = None,
            TableKind::Cooccurrence => self.cooccurrence = None,
            TableKind::CountryOccurrence => self.country_occurrence = None,
            TableKind::AliasCluster => self.alias_clusters = None,
        }
        self.report.record(
            kind,
            TableStatus::Missing {
                reason: reason.into(),
            },
        );
        self
    }

    pub fn occurrence(&self) -> Option<&[OccurrenceRecord]> {
        self.occurrence.as_deref()
    }

    pub fn cooccurrence(&self) -> Option<&[CooccurrenceRecord]> {
        self.cooccurrence.as_deref()
    }

    pub fn country_occurrence(&self) -> Option<&[CountryOccurrenceRecord]> {
        self.country_occurrence.as_deref()
    }

    pub fn alias_clusters(&self) -> Option<&AliasClusterMap> {
        self.alias_clusters.as_ref()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Earliest and latest parseable month across the three time tables
    pub fn month_bounds(&self) -> Option<(Month, Month)> {
        let occ = self.occurrence().unwrap_or_default().iter().map(|r| r.month);
        let co = self.cooccurrence().unwrap_or_default().iter().map(|r| r.month);
        let geo = self
            .country_occurrence()
            .unwrap_or_default()
            .iter()
            .map(|r| r.month);

        occ.chain(co).chain(geo).flatten().fold(None, |acc, m| match acc {
            None => Some((m, m)),
            Some((lo, hi)) => Some((lo.min(m), hi.max(m))),
        })
    }
}
