//! # Tessella Records
//!
//! Typed, read-only keyword-occurrence tables.
//!
//! ## Tables
//!
//! ```text
//! lookup_occurrence.csv          alias, month, occurrence
//! lookup_cooccurrence.csv        alias_row, alias_col, month, cooccurrence
//! lookup_country_occurrence.csv  country, [alias], month, occurrence
//! fact_alias_cluster.csv         alias, cluster_name
//!     │
//!     └──> RecordStore (+ LoadReport: loaded / empty / missing per table)
//! ```
//!
//! Loading never aborts: an unreadable file only degrades the charts that need it.

mod cluster_map;
mod error;
mod loader;
mod month;
mod store;
mod types;

pub use cluster_map::AliasClusterMap;
pub use error::{RecordsError, Result};
pub use loader::{
    load_dir, read_alias_clusters, read_cooccurrence, read_country_occurrence, read_occurrence,
};
pub use month::Month;
pub use store::{LoadReport, RecordStore, TableKind, TableStatus};
pub use types::{
    parse_metric, parse_text, AliasClusterEntry, CooccurrenceRecord, CountryOccurrenceRecord,
    OccurrenceRecord,
};
