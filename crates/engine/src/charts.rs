//! Renderer-facing chart structures.
//!
//! Everything here is plain serialisable data: the drawing library only
//! has to map fields onto its own primitives.

use crate::aggregate::SeriesKey;
use crate::color::ColorScale;
use crate::error::{EngineError, ErrorKind};
use crate::filter::PassStats;
use crate::flow::FlowGraph;
use crate::palette::Rgb;
use crate::spec::AxisScale;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Occurrence,
    Cooccurrence,
    #[serde(rename = "geo")]
    GeoMap,
    Flow,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Occurrence,
        ChartKind::Cooccurrence,
        ChartKind::GeoMap,
        ChartKind::Flow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Occurrence => "occurrence",
            ChartKind::Cooccurrence => "cooccurrence",
            ChartKind::GeoMap => "geo",
            ChartKind::Flow => "flow",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Occurrence => "Alias Occurrence Over Time (Color by Occurrence)",
            ChartKind::Cooccurrence => "Alias Co-Occurrence Over Time (Color by Cooccurrence)",
            ChartKind::GeoMap => "Geographic Occurrence Heatmap",
            ChartKind::Flow => "Geo Sankey: Country to Cluster Name",
        }
    }

    /// Metric name shown on the value axis and colour bar
    pub fn metric_label(&self) -> &'static str {
        match self {
            ChartKind::Cooccurrence => "Cooccurrence",
            _ => "Occurrence",
        }
    }

    /// Message shown in place of the chart when a pass fails
    pub fn empty_message(&self, reason: ErrorKind) -> String {
        let subject = match self {
            ChartKind::Occurrence => "occurrence data",
            ChartKind::Cooccurrence => "co-occurrence data",
            ChartKind::GeoMap => "country data",
            ChartKind::Flow => "data for the flow diagram",
        };
        match reason {
            ErrorKind::MissingInput => format!(
                "No {} available: an input file is missing or unreadable. Check the file names and format.",
                subject
            ),
            ErrorKind::EmptyInput => format!(
                "No {} available: an input file is empty. Check your input file.",
                subject
            ),
            ErrorKind::EmptyFilterResult => format!(
                "No {} available for the selected date range or filters. Try adjusting the filters or check your input file.",
                subject
            ),
            ErrorKind::InvalidSpec => format!(
                "No {} available: the chart settings are not valid for this table.",
                subject
            ),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "occurrence" => Ok(ChartKind::Occurrence),
            "cooccurrence" | "co-occurrence" => Ok(ChartKind::Cooccurrence),
            "geo" | "geo_map" | "map" => Ok(ChartKind::GeoMap),
            "flow" | "sankey" => Ok(ChartKind::Flow),
            other => Err(format!(
                "unknown chart '{other}' (expected occurrence|cooccurrence|geo|flow)"
            )),
        }
    }
}

/// One category on the bar chart's category axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisCategory {
    pub key: SeriesKey,
    pub label: String,
    /// Label drawn on the axis; may collide with another category's
    pub truncated: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub key: SeriesKey,
    pub label: String,
    pub value: u64,
    pub t: f64,
    pub color: Rgb,
}

/// Bars of one year; years are stacked along the value axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTrace {
    pub year: i32,
    pub bars: Vec<Bar>,
}

/// Value axis extent, always starting at 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisRange {
    pub min: u64,
    pub max: u64,
    /// Largest value `max` may be set to
    pub limit: u64,
    pub scale: AxisScale,
}

impl AxisRange {
    /// Default max is 105% of the longest stack; a requested max is bounded
    /// to `[1, max(1, 110% of the longest stack)]`.
    pub fn resolve(max_stack: u64, requested: Option<u64>, scale: AxisScale) -> Self {
        let limit = (max_stack.saturating_mul(110) / 100).max(1);
        let default = (max_stack.saturating_mul(105) / 100).clamp(1, limit);
        let max = match requested {
            Some(requested) => {
                let bounded = requested.clamp(1, limit);
                if bounded != requested {
                    log::warn!(
                        "Axis max {} outside 1..={}; using {}",
                        requested,
                        limit,
                        bounded
                    );
                }
                bounded
            }
            None => default,
        };
        Self {
            min: 0,
            max,
            limit,
            scale,
        }
    }
}

/// Horizontal stacked bars, one stack per category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub chart: ChartKind,
    pub title: String,
    pub metric: String,
    /// Categories bottom to top; the first-ranked category comes last
    pub categories: Vec<AxisCategory>,
    pub years: Vec<i32>,
    pub traces: Vec<YearTrace>,
    pub axis: AxisRange,
    pub color: ColorScale,
    pub stats: PassStats,
}

impl BarChart {
    pub fn category(&self, key: &SeriesKey) -> Option<&AxisCategory> {
        self.categories.iter().find(|category| &category.key == key)
    }

    /// Sum of every bar in every trace
    pub fn total(&self) -> u64 {
        self.traces
            .iter()
            .flat_map(|trace| trace.bars.iter())
            .fold(0u64, |sum, bar| sum.saturating_add(bar.value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapCell {
    pub iso3: String,
    pub country: String,
    pub value: u64,
    pub t: f64,
    pub color: Rgb,
}

/// Choropleth frame for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub year: i32,
    pub cells: Vec<MapCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapChart {
    pub title: String,
    /// Frames ascending by year
    pub frames: Vec<MapFrame>,
    pub color: ColorScale,
    /// Country names with no ISO-3 code, dropped from the map
    pub unresolved: Vec<String>,
    pub stats: PassStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowChart {
    pub title: String,
    pub graph: FlowGraph,
    pub stats: PassStats,
}

/// Placeholder for a chart whose pass failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    pub chart: ChartKind,
    pub reason: ErrorKind,
    pub message: String,
    /// Technical detail for logs and `--verbose` output
    pub detail: String,
}

impl EmptyState {
    pub fn from_error(chart: ChartKind, error: &EngineError) -> Self {
        let reason = error.kind();
        Self {
            chart,
            reason,
            message: chart.empty_message(reason),
            detail: error.to_string(),
        }
    }
}

/// Result of one render pass
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartOutput {
    Bars(BarChart),
    Map(MapChart),
    Flow(FlowChart),
    Empty(EmptyState),
}

impl ChartOutput {
    pub fn chart(&self) -> ChartKind {
        match self {
            ChartOutput::Bars(bars) => bars.chart,
            ChartOutput::Map(_) => ChartKind::GeoMap,
            ChartOutput::Flow(_) => ChartKind::Flow,
            ChartOutput::Empty(empty) => empty.chart,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ChartOutput::Empty(_))
    }

    pub fn stats(&self) -> Option<&PassStats> {
        match self {
            ChartOutput::Bars(bars) => Some(&bars.stats),
            ChartOutput::Map(map) => Some(&map.stats),
            ChartOutput::Flow(flow) => Some(&flow.stats),
            ChartOutput::Empty(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessella_records::TableKind;

    #[test]
    fn axis_defaults_to_105_percent() {
        let axis = AxisRange::resolve(100, None, AxisScale::Linear);
        assert_eq!((axis.min, axis.max, axis.limit), (0, 105, 110));

        let axis = AxisRange::resolve(10, None, AxisScale::Log);
        assert_eq!((axis.max, axis.limit), (10, 11));
    }

    #[test]
    fn axis_request_is_bounded() {
        assert_eq!(AxisRange::resolve(100, Some(500), AxisScale::Linear).max, 110);
        assert_eq!(AxisRange::resolve(100, Some(0), AxisScale::Linear).max, 1);
        assert_eq!(AxisRange::resolve(100, Some(42), AxisScale::Linear).max, 42);
        assert_eq!(AxisRange::resolve(0, None, AxisScale::Linear).max, 1);
    }

    #[test]
    fn chart_kind_round_trips_names() {
        for chart in ChartKind::ALL {
            assert_eq!(chart.as_str().parse::<ChartKind>(), Ok(chart));
        }
        assert_eq!("sankey".parse::<ChartKind>(), Ok(ChartKind::Flow));
        assert_eq!(
            serde_json::to_string(&ChartKind::GeoMap).unwrap(),
            "\"geo\""
        );
    }

    #[test]
    fn empty_state_carries_kind_and_message() {
        let state = EmptyState::from_error(
            ChartKind::Flow,
            &EngineError::MissingInput(TableKind::AliasCluster),
        );

        assert_eq!(state.reason, ErrorKind::MissingInput);
        assert!(state.message.contains("missing or unreadable"));
        assert!(state.detail.contains("fact_alias_cluster"));

        let json = serde_json::to_value(ChartOutput::Empty(state)).unwrap();
        assert_eq!(json["type"], "empty");
        assert_eq!(json["reason"], "missing_input");
    }
}
