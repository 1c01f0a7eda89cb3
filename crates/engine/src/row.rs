use crate::spec::Dimension;
use tessella_records::{
    AliasClusterMap, CooccurrenceRecord, CountryOccurrenceRecord, Month, OccurrenceRecord,
    TableKind,
};

/// A table row the engine can filter and aggregate
pub trait FacetRow {
    const TABLE: TableKind;

    /// Dimensions this row type can be filtered or grouped by
    const DIMENSIONS: &'static [Dimension];

    fn month(&self) -> Option<Month>;

    fn metric(&self) -> u64;

    /// Value of a column-backed dimension; derived dimensions return `None`
    fn raw_value(&self, dimension: Dimension) -> Option<&str>;

    fn supports(dimension: Dimension) -> bool {
        Self::DIMENSIONS.contains(&dimension)
    }
}

/// Value of any dimension, joining cluster dimensions through `clusters`
pub fn dimension_value<'a, R: FacetRow>(
    row: &'a R,
    dimension: Dimension,
    clusters: Option<&'a AliasClusterMap>,
) -> Option<&'a str> {
    match dimension.joined_from() {
        Some(alias_dim) => {
            let alias = row.raw_value(alias_dim)?;
            clusters?.cluster_of(alias)
        }
        None => row.raw_value(dimension),
    }
}

impl FacetRow for OccurrenceRecord {
    const TABLE: TableKind = TableKind::Occurrence;
    const DIMENSIONS: &'static [Dimension] = &[Dimension::Alias, Dimension::Cluster];

    fn month(&self) -> Option<Month> {
        self.month
    }

    fn metric(&self) -> u64 {
        self.occurrence
    }

    fn raw_value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Alias => Some(&self.alias),
            _ => None,
        }
    }
}

impl FacetRow for CooccurrenceRecord {
    const TABLE: TableKind = TableKind::Cooccurrence;
    const DIMENSIONS: &'static [Dimension] = &[
        Dimension::AliasRow,
        Dimension::AliasCol,
        Dimension::ClusterRow,
        Dimension::ClusterCol,
    ];

    fn month(&self) -> Option<Month> {
        self.month
    }

    fn metric(&self) -> u64 {
        self.cooccurrence
    }

    fn raw_value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::AliasRow => Some(&self.alias_row),
            Dimension::AliasCol => Some(&self.alias_col),
            _ => None,
        }
    }
}

impl FacetRow for CountryOccurrenceRecord {
    const TABLE: TableKind = TableKind::CountryOccurrence;
    const DIMENSIONS: &'static [Dimension] =
        &[Dimension::Country, Dimension::Alias, Dimension::Cluster];

    fn month(&self) -> Option<Month> {
        self.month
    }

    fn metric(&self) -> u64 {
        self.occurrence
    }

    fn raw_value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Country => self.country.as_deref(),
            Dimension::Alias => self.alias.as_deref(),
            _ => None,
        }
    }
}
