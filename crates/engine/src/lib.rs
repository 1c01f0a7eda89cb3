//! # Tessella Engine
//!
//! Faceted aggregation and graph construction for keyword-occurrence charts.
//!
//! ## Features
//!
//! - **Filtering** - inclusive month ranges, alias / cluster / country sets
//! - **Aggregation** - per key and year sums with stack totals
//! - **Ranking** - total-descending or alphabetical order, truncated labels
//! - **Colour scales** - clamped normalisation, legends, named palettes
//! - **Flow graphs** - bipartite country → cluster diagrams (petgraph)
//!
//! ## Architecture
//!
//! ```text
//! RecordStore (tessella-records)
//!     │
//!     ├──> Filter (date range, categorical sets, alias→cluster join)
//!     │
//!     ├──> Aggregate (key × year sums, totals, pair totals)
//!     │      │
//!     │      ├──> Rank & Label ──> Colour scale ──> BarChart
//!     │      ├──> Country resolver ──> Colour scale ──> MapChart
//!     │      └──> Flow builder ──> FlowChart
//!     │
//!     └──> render_pass / render_dashboard ──> ChartOutput (or Empty)
//! ```
//!
//! Every pass is recomputed from the immutable store; nothing is cached.

mod aggregate;
mod charts;
mod color;
mod country;
mod error;
mod facets;
mod filter;
mod flow;
mod palette;
mod pipeline;
mod rank;
mod row;
mod spec;

pub use aggregate::{
    aggregate, aggregate_pairs, AggregatedSeries, Aggregation, PairTotal, SeriesKey,
    PAIR_SEPARATOR,
};
pub use charts::{
    AxisCategory, AxisRange, Bar, BarChart, ChartKind, ChartOutput, EmptyState, FlowChart,
    MapCell, MapChart, MapFrame, YearTrace,
};
pub use color::{legend_samples, normalize, ClampRange, ColorScale, Legend};
pub use country::{CountryCodeResolver, IsoCountryTable};
pub use error::{EngineError, ErrorKind, Result};
pub use facets::{default_flow_filter, FacetOptions, DEFAULT_FLOW_TOP_N};
pub use filter::{filter, FilteredView, PassStats};
pub use flow::{build_flow, FlowEdge, FlowGraph, FlowNode, FlowSide};
pub use palette::{Palette, Rgb};
pub use pipeline::{
    cooccurrence_chart, flow_chart, geo_chart, occurrence_chart, render_dashboard, render_pass,
    ChartSpec, DashboardSpec,
};
pub use rank::{order_by_total_desc, rank_keys, truncate_label, RankedLabeling, ELLIPSIS};
pub use row::{dimension_value, FacetRow};
pub use spec::{
    AxisScale, DateRange, Dimension, DisplaySpec, FilterSpec, SortMode, DEFAULT_LABEL_WIDTH,
    DEFAULT_LEGEND_SAMPLES,
};
