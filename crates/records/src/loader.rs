use crate::error::{RecordsError, Result};
use crate::month::Month;
use crate::store::{RecordStore, TableKind};
use crate::types::{
    parse_metric, parse_text, AliasClusterEntry, CooccurrenceRecord, CountryOccurrenceRecord,
    OccurrenceRecord,
};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header positions of one CSV file
struct Columns {
    positions: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(kind: TableKind, headers: &StringRecord) -> Result<Self> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();

        for column in kind.required_columns() {
            if !positions.contains_key(*column) {
                return Err(RecordsError::MissingColumn {
                    table: kind.file_name().to_string(),
                    column: column.to_string(),
                });
            }
        }

        Ok(Self { positions })
    }

    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.positions.get(column).and_then(|&idx| record.get(idx))
    }

    fn text(&self, record: &StringRecord, column: &str) -> Option<String> {
        parse_text(self.get(record, column))
    }

    fn month(&self, record: &StringRecord) -> Option<Month> {
        self.get(record, "month").and_then(Month::parse)
    }

    fn metric(&self, record: &StringRecord, column: &str) -> u64 {
        self.get(record, column).map(parse_metric).unwrap_or(0)
    }
}

fn read_table<R, T, F>(kind: TableKind, reader: R, mut parse: F) -> Result<Vec<T>>
where
    R: Read,
    F: FnMut(&Columns, &StringRecord) -> Option<T>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(kind, csv_reader.headers()?)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in csv_reader.records() {
        match parse(&columns, &record?) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("{}: skipped {} rows without key columns", kind, skipped);
    }

    Ok(rows)
}

pub fn read_occurrence<R: Read>(reader: R) -> Result<Vec<OccurrenceRecord>> {
    read_table(TableKind::Occurrence, reader, |cols, record| {
        Some(OccurrenceRecord {
            alias: cols.text(record, "alias")?,
            month: cols.month(record),
            occurrence: cols.metric(record, "occurrence"),
        })
    })
}

pub fn read_cooccurrence<R: Read>(reader: R) -> Result<Vec<CooccurrenceRecord>> {
    read_table(TableKind::Cooccurrence, reader, |cols, record| {
        Some(CooccurrenceRecord {
            alias_row: cols.text(record, "alias_row")?,
            alias_col: cols.text(record, "alias_col")?,
            month: cols.month(record),
            cooccurrence: cols.metric(record, "cooccurrence"),
        })
    })
}

pub fn read_country_occurrence<R: Read>(reader: R) -> Result<Vec<CountryOccurrenceRecord>> {
    read_table(TableKind::CountryOccurrence, reader, |cols, record| {
        Some(CountryOccurrenceRecord {
            country: cols.text(record, "country"),
            alias: cols.text(record, "alias"),
            month: cols.month(record),
            occurrence: cols.metric(record, "occurrence"),
        })
    })
}

pub fn read_alias_clusters<R: Read>(reader: R) -> Result<Vec<AliasClusterEntry>> {
    read_table(TableKind::AliasCluster, reader, |cols, record| {
        Some(AliasClusterEntry {
            alias: cols.text(record, "alias")?,
            cluster_name: cols.text(record, "cluster_name")?,
        })
    })
}

/// Load the four tables from a directory.
///
/// Never fails: an absent or unparseable file is recorded as missing in the
/// store's [`LoadReport`](crate::LoadReport) and the remaining tables still load.
pub fn load_dir(dir: impl AsRef<Path>) -> RecordStore {
    let dir = dir.as_ref();
    let mut store = RecordStore::new();

    for kind in TableKind::ALL {
        let path = dir.join(kind.file_name());
        store = match load_one(kind, &path) {
            Ok(table) => table.attach(store),
            Err(err) => {
                log::warn!("Missing or unreadable file {}: {}", path.display(), err);
                store.with_missing(kind, err.to_string())
            }
        };
    }

    let report = store.report();
    let empty = report.empty();
    if !empty.is_empty() {
        let names: Vec<&str> = empty.iter().map(TableKind::file_name).collect();
        log::warn!("Empty file(s): {}. Charts may not display.", names.join(", "));
    }
    log::info!(
        "Loaded dataset from {} ({} of {} tables usable)",
        dir.display(),
        TableKind::ALL.len() - report.missing().len(),
        TableKind::ALL.len()
    );

    store
}

enum LoadedTable {
    Occurrence(Vec<OccurrenceRecord>),
    Cooccurrence(Vec<CooccurrenceRecord>),
    CountryOccurrence(Vec<CountryOccurrenceRecord>),
    AliasCluster(Vec<AliasClusterEntry>),
}

impl LoadedTable {
    fn attach(self, store: RecordStore) -> RecordStore {
        match self {
            LoadedTable::Occurrence(rows) => store.with_occurrence(rows),
            LoadedTable::Cooccurrence(rows) => store.with_cooccurrence(rows),
            LoadedTable::CountryOccurrence(rows) => store.with_country_occurrence(rows),
            LoadedTable::AliasCluster(rows) => store.with_alias_clusters(rows),
        }
    }
}

fn load_one(kind: TableKind, path: &Path) -> Result<LoadedTable> {
    if !path.is_file() {
        return Err(RecordsError::Other("file not found".to_string()));
    }
    let file = File::open(path)?;

    let table = match kind {
        TableKind::Occurrence => LoadedTable::Occurrence(read_occurrence(file)?),
        TableKind::Cooccurrence => LoadedTable::Cooccurrence(read_cooccurrence(file)?),
        TableKind::CountryOccurrence => {
            LoadedTable::CountryOccurrence(read_country_occurrence(file)?)
        }
        TableKind::AliasCluster => LoadedTable::AliasCluster(read_alias_clusters(file)?),
    };
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TableStatus;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn reads_occurrence_with_extra_columns_and_bad_cells() {
        let csv = "month,alias,occurrence,extra\n\
                   2020-01-01,X,5,foo\n\
                   not-a-date,X,3,bar\n\
                   2020-03,Y,,baz\n\
                   2020-04,,9,qux\n";
        let rows = read_occurrence(csv.as_bytes()).expect("parse");

        assert_eq!(
            rows,
            vec![
                OccurrenceRecord {
                    alias: "X".into(),
                    month: Month::new(2020, 1),
                    occurrence: 5,
                },
                OccurrenceRecord {
                    alias: "X".into(),
                    month: None,
                    occurrence: 3,
                },
                OccurrenceRecord {
                    alias: "Y".into(),
                    month: Month::new(2020, 3),
                    occurrence: 0,
                },
            ]
        );
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = read_cooccurrence("alias_row,month,cooccurrence\nA,2020-01,1\n".as_bytes())
            .expect_err("alias_col is required");
        assert!(matches!(err, RecordsError::MissingColumn { ref column, .. } if column == "alias_col"));
    }

    #[test]
    fn country_alias_column_is_optional() {
        let rows = read_country_occurrence("country,month,occurrence\nPeru,2021-02,4\n".as_bytes())
            .expect("parse");
        assert_eq!(rows[0].alias, None);
        assert_eq!(rows[0].country.as_deref(), Some("Peru"));
    }

    #[test]
    fn load_dir_reports_missing_and_empty_files() {
        let temp = TempDir::new().expect("tempdir");
        std::fs::write(
            temp.path().join("lookup_occurrence.csv"),
            "alias,month,occurrence\nX,2020-01,5\n",
        )
        .expect("write occurrence");
        std::fs::write(
            temp.path().join("fact_alias_cluster.csv"),
            "alias,cluster_name\n",
        )
        .expect("write clusters");
        std::fs::write(
            temp.path().join("lookup_cooccurrence.csv"),
            "alias_row,month\nA,2020-01\n",
        )
        .expect("write cooccurrence");

        let store = load_dir(temp.path());
        let report = store.report();

        assert_eq!(
            report.status(TableKind::Occurrence),
            Some(&TableStatus::Loaded { rows: 1 })
        );
        assert_eq!(report.empty(), vec![TableKind::AliasCluster]);
        assert_eq!(
            report.missing(),
            vec![TableKind::Cooccurrence, TableKind::CountryOccurrence]
        );
        assert!(store.cooccurrence().is_none());
        assert!(store.alias_clusters().is_some_and(|m| m.is_empty()));
    }
}
