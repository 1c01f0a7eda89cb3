//! View file: per-chart filters and display options in TOML.
//!
//! ```toml
//! [global]
//! from = "2020-01"
//! to = "2021-12"
//!
//! [occurrence]
//! aliases = ["hydrogen", "lithium"]
//! sort = "alpha"
//! palette = "Inferno"
//!
//! [flow]
//! top_n = 3
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tessella_engine::{
    default_flow_filter, AxisScale, ChartKind, ClampRange, DashboardSpec, Dimension, DisplaySpec,
    Palette, SortMode,
};
use tessella_records::{Month, RecordStore};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawViewFile {
    #[serde(default)]
    global: Option<RawGlobal>,
    #[serde(default)]
    occurrence: Option<RawChartView>,
    #[serde(default)]
    cooccurrence: Option<RawChartView>,
    #[serde(default)]
    geo: Option<RawChartView>,
    #[serde(default)]
    flow: Option<RawChartView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGlobal {
    from: Option<String>,
    to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChartView {
    aliases: Option<Vec<String>>,
    alias_rows: Option<Vec<String>>,
    alias_cols: Option<Vec<String>>,
    clusters: Option<Vec<String>>,
    cluster_rows: Option<Vec<String>>,
    cluster_cols: Option<Vec<String>>,
    countries: Option<Vec<String>>,

    sort: Option<String>,
    palette: Option<String>,
    axis_scale: Option<String>,
    color_min: Option<u64>,
    color_max: Option<u64>,
    axis_max: Option<u64>,
    label_width: Option<usize>,
    legend_samples: Option<usize>,

    /// Flow only: size of the default country / cluster selection
    top_n: Option<usize>,
}

/// Validated settings of one chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartView {
    filters: Vec<(Dimension, Vec<String>)>,
    display: DisplaySpec,
    top_n: Option<usize>,
}

impl ChartView {
    fn from_raw(chart: ChartKind, raw: RawChartView) -> Result<Self> {
        let section = chart.as_str();
        let dimensions = [
            (Dimension::Alias, raw.aliases),
            (Dimension::AliasRow, raw.alias_rows),
            (Dimension::AliasCol, raw.alias_cols),
            (Dimension::Cluster, raw.clusters),
            (Dimension::ClusterRow, raw.cluster_rows),
            (Dimension::ClusterCol, raw.cluster_cols),
            (Dimension::Country, raw.countries),
        ];

        let mut filters = Vec::new();
        for (dimension, values) in dimensions {
            let Some(values) = values else {
                continue;
            };
            if !filterable(chart).contains(&dimension) {
                return Err(anyhow!(
                    "{section}: '{}' filter is not available for this chart",
                    field_name(dimension)
                ));
            }
            filters.push((dimension, values));
        }

        let mut display = DisplaySpec::default();
        if let Some(sort) = raw.sort {
            display.sort = sort
                .parse::<SortMode>()
                .map_err(|err| anyhow!("{section}.sort: {err}"))?;
        }
        if let Some(palette) = raw.palette {
            display.palette = Palette::from_name(&palette);
        }
        if let Some(scale) = raw.axis_scale {
            display.axis_scale = scale
                .parse::<AxisScale>()
                .map_err(|err| anyhow!("{section}.axis_scale: {err}"))?;
        }
        display.color_clamp = match (raw.color_min, raw.color_max) {
            (None, None) => None,
            (min, max) => Some(ClampRange {
                min: min.unwrap_or(0),
                max: max.unwrap_or(u64::MAX),
            }),
        };
        display.axis_max = raw.axis_max;
        if let Some(width) = raw.label_width {
            if width == 0 {
                return Err(anyhow!("{section}.label_width must be at least 1"));
            }
            display.label_width = width;
        }
        if let Some(samples) = raw.legend_samples {
            if samples < 2 {
                return Err(anyhow!("{section}.legend_samples must be at least 2"));
            }
            display.legend_samples = samples;
        }

        if raw.top_n.is_some() && chart != ChartKind::Flow {
            return Err(anyhow!("{section}.top_n is only available for the flow chart"));
        }
        if raw.top_n == Some(0) {
            return Err(anyhow!("{section}.top_n must be at least 1"));
        }

        Ok(Self {
            filters,
            display,
            top_n: raw.top_n,
        })
    }
}

fn filterable(chart: ChartKind) -> &'static [Dimension] {
    match chart {
        ChartKind::Occurrence => &[Dimension::Alias, Dimension::Cluster],
        ChartKind::Cooccurrence => &[
            Dimension::AliasRow,
            Dimension::AliasCol,
            Dimension::ClusterRow,
            Dimension::ClusterCol,
        ],
        ChartKind::GeoMap => &[Dimension::Country],
        ChartKind::Flow => &[Dimension::Country, Dimension::Cluster],
    }
}

fn field_name(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Alias => "aliases",
        Dimension::AliasRow => "alias_rows",
        Dimension::AliasCol => "alias_cols",
        Dimension::Cluster => "clusters",
        Dimension::ClusterRow => "cluster_rows",
        Dimension::ClusterCol => "cluster_cols",
        Dimension::Country => "countries",
    }
}

/// Validated view file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewConfig {
    from: Option<Month>,
    to: Option<Month>,
    charts: BTreeMap<ChartKind, ChartView>,
}

impl ViewConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read view file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("View file {} is not valid", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawViewFile = toml::from_str(text).context("View file parse error")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawViewFile) -> Result<Self> {
        let global = raw.global.unwrap_or_default();
        let from = parse_month("global.from", global.from.as_deref())?;
        let to = parse_month("global.to", global.to.as_deref())?;

        let mut charts = BTreeMap::new();
        for (chart, section) in [
            (ChartKind::Occurrence, raw.occurrence),
            (ChartKind::Cooccurrence, raw.cooccurrence),
            (ChartKind::GeoMap, raw.geo),
            (ChartKind::Flow, raw.flow),
        ] {
            if let Some(section) = section {
                charts.insert(chart, ChartView::from_raw(chart, section)?);
            }
        }

        let config = Self { from, to, charts };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(anyhow!("date range start {from} is after end {to}"));
            }
        }
        Ok(())
    }

    /// Command-line `--from` / `--to` take precedence over `[global]`
    pub fn with_date_overrides(mut self, from: Option<Month>, to: Option<Month>) -> Result<Self> {
        if from.is_some() {
            self.from = from;
        }
        if to.is_some() {
            self.to = to;
        }
        self.validate()?;
        Ok(self)
    }

    /// Settings of every chart for one store.
    ///
    /// An open end of the date range falls back to the store's month bounds.
    /// The flow chart starts from its top-n default selection; countries or
    /// clusters named in the view file replace only that dimension.
    pub fn dashboard(&self, store: &RecordStore) -> DashboardSpec {
        let mut dashboard = DashboardSpec::for_store(store);

        for (chart, view) in &self.charts {
            let spec = dashboard.chart_mut(*chart);
            spec.display = view.display.clone();

            if let Some(n) = view.top_n {
                spec.filter = default_flow_filter(store, n);
            }
            // a named dimension replaces its default selection, the others keep theirs
            for (dimension, values) in &view.filters {
                spec.filter
                    .category_filters
                    .insert(*dimension, values.iter().cloned().collect());
            }
        }

        if self.from.is_some() || self.to.is_some() {
            if let Some((lo, hi)) = store.month_bounds() {
                let start = self.from.unwrap_or(lo);
                let end = self.to.unwrap_or(hi);
                dashboard.set_date_range(start, end);
            }
        }

        dashboard
    }
}

fn parse_month(field: &str, raw: Option<&str>) -> Result<Option<Month>> {
    raw.map(|value| {
        value
            .parse::<Month>()
            .map_err(|err| anyhow!("{field}: {err}"))
    })
    .transpose()
}
