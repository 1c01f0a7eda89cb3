use crate::color::ClampRange;
use crate::palette::Palette;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tessella_records::Month;

/// Categorical dimension a filter or grouping can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Alias,
    AliasRow,
    AliasCol,
    /// Derived from `Alias` through the alias→cluster map
    Cluster,
    /// Derived from `AliasRow`
    ClusterRow,
    /// Derived from `AliasCol`
    ClusterCol,
    Country,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Alias => "alias",
            Dimension::AliasRow => "alias_row",
            Dimension::AliasCol => "alias_col",
            Dimension::Cluster => "cluster",
            Dimension::ClusterRow => "cluster_row",
            Dimension::ClusterCol => "cluster_col",
            Dimension::Country => "country",
        }
    }

    /// Alias dimension a cluster dimension is joined from
    pub fn joined_from(&self) -> Option<Dimension> {
        match self {
            Dimension::Cluster => Some(Dimension::Alias),
            Dimension::ClusterRow => Some(Dimension::AliasRow),
            Dimension::ClusterCol => Some(Dimension::AliasCol),
            _ => None,
        }
    }

    pub fn is_derived(&self) -> bool {
        self.joined_from().is_some()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "alias" => Ok(Dimension::Alias),
            "alias_row" => Ok(Dimension::AliasRow),
            "alias_col" => Ok(Dimension::AliasCol),
            "cluster" | "cluster_name" => Ok(Dimension::Cluster),
            "cluster_row" => Ok(Dimension::ClusterRow),
            "cluster_col" => Ok(Dimension::ClusterCol),
            "country" => Ok(Dimension::Country),
            other => Err(format!("unknown dimension '{other}'")),
        }
    }
}

/// Inclusive month range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Month,
    pub end: Month,
}

impl DateRange {
    pub fn new(start: Month, end: Month) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, month: Month) -> bool {
        self.start <= month && month <= self.end
    }
}

/// Filters for one render pass.
///
/// An empty value set for a dimension is the no-op state: it keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub date_range: Option<DateRange>,

    #[serde(default)]
    pub category_filters: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, start: Month, end: Month) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_values<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_filters
            .entry(dimension)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Allowed values of an active filter; `None` when the dimension is unfiltered
    pub fn allowed(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        self.category_filters
            .get(&dimension)
            .filter(|values| !values.is_empty())
    }

    /// Dimensions carrying a non-empty value set
    pub fn active_dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.category_filters
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(dim, _)| *dim)
    }

    pub fn has_category_filters(&self) -> bool {
        self.active_dimensions().next().is_some()
    }
}

/// Category ordering of bar charts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Largest total first, ties in first-appearance order
    #[default]
    TotalDesc,
    /// Lexicographic by display string
    Alpha,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total_desc" | "total" => Ok(SortMode::TotalDesc),
            "alpha" | "a-z" => Ok(SortMode::Alpha),
            other => Err(format!("unknown sort mode '{other}' (expected total_desc|alpha)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

impl FromStr for AxisScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(AxisScale::Linear),
            "log" => Ok(AxisScale::Log),
            other => Err(format!("unknown axis scale '{other}' (expected linear|log)")),
        }
    }
}

pub const DEFAULT_LABEL_WIDTH: usize = 40;
pub const DEFAULT_LEGEND_SAMPLES: usize = 100;

/// User-adjustable scales for one render pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySpec {
    pub sort: SortMode,
    pub palette: Palette,
    pub axis_scale: AxisScale,

    /// Requested colour clamp; `None` uses the observed value range
    pub color_clamp: Option<ClampRange>,

    /// Requested bar axis maximum; `None` uses 105% of the largest stack
    pub axis_max: Option<u64>,

    pub label_width: usize,
    pub legend_samples: usize,
}

impl Default for DisplaySpec {
    fn default() -> Self {
        Self {
            sort: SortMode::default(),
            palette: Palette::default(),
            axis_scale: AxisScale::default(),
            color_clamp: None,
            axis_max: None,
            label_width: DEFAULT_LABEL_WIDTH,
            legend_samples: DEFAULT_LEGEND_SAMPLES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_value_set_is_inactive() {
        let spec = FilterSpec::new()
            .with_values(Dimension::Alias, Vec::<String>::new())
            .with_values(Dimension::Cluster, ["Fuels"]);

        assert!(spec.allowed(Dimension::Alias).is_none());
        assert_eq!(
            spec.active_dimensions().collect::<Vec<_>>(),
            vec![Dimension::Cluster]
        );
    }

    #[test]
    fn date_range_is_inclusive() {
        let range = DateRange::new(Month::new(2020, 1).unwrap(), Month::new(2020, 6).unwrap());
        assert!(range.contains(Month::new(2020, 1).unwrap()));
        assert!(range.contains(Month::new(2020, 6).unwrap()));
        assert!(!range.contains(Month::new(2020, 7).unwrap()));
    }

    #[test]
    fn dimensions_parse_from_column_names() {
        assert_eq!("cluster_name".parse::<Dimension>(), Ok(Dimension::Cluster));
        assert_eq!(Dimension::ClusterCol.joined_from(), Some(Dimension::AliasCol));
        assert!("planet".parse::<Dimension>().is_err());
    }
}
