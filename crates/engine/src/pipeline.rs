use crate::aggregate::{aggregate, aggregate_pairs, Aggregation, SeriesKey};
use crate::charts::{
    AxisCategory, AxisRange, Bar, BarChart, ChartKind, ChartOutput, EmptyState, FlowChart,
    MapCell, MapChart, MapFrame, YearTrace,
};
use crate::color::ColorScale;
use crate::country::CountryCodeResolver;
use crate::error::{EngineError, Result};
use crate::facets::{default_flow_filter, DEFAULT_FLOW_TOP_N};
use crate::filter::filter;
use crate::flow::build_flow;
use crate::rank::RankedLabeling;
use crate::row::{dimension_value, FacetRow};
use crate::spec::{DateRange, Dimension, DisplaySpec, FilterSpec};
use std::collections::{BTreeMap, HashMap};
use tessella_records::{AliasClusterMap, Month, RecordStore, TableKind};

/// Filters and scales of one chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSpec {
    pub filter: FilterSpec,
    pub display: DisplaySpec,
}

/// Settings of every chart on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSpec {
    charts: BTreeMap<ChartKind, ChartSpec>,
}

impl DashboardSpec {
    /// Unfiltered bar and map charts; the flow chart starts on the top
    /// countries and clusters of the store.
    pub fn for_store(store: &RecordStore) -> Self {
        let mut dashboard = Self::default();
        dashboard.set(
            ChartKind::Flow,
            ChartSpec {
                filter: default_flow_filter(store, DEFAULT_FLOW_TOP_N),
                display: DisplaySpec::default(),
            },
        );
        dashboard
    }

    pub fn set(&mut self, chart: ChartKind, spec: ChartSpec) {
        self.charts.insert(chart, spec);
    }

    pub fn chart(&self, chart: ChartKind) -> ChartSpec {
        self.charts.get(&chart).cloned().unwrap_or_default()
    }

    pub fn chart_mut(&mut self, chart: ChartKind) -> &mut ChartSpec {
        self.charts.entry(chart).or_default()
    }

    /// Apply one date range to every chart
    pub fn set_date_range(&mut self, start: Month, end: Month) {
        for chart in ChartKind::ALL {
            self.chart_mut(chart).filter.date_range = Some(DateRange::new(start, end));
        }
    }
}

/// Run one chart pipeline over the store.
///
/// Pure apart from logging: the same inputs always give the same output.
/// A failing pass becomes [`ChartOutput::Empty`] and never affects other charts.
pub fn render_pass(
    store: &RecordStore,
    chart: ChartKind,
    filter: &FilterSpec,
    display: &DisplaySpec,
    resolver: &dyn CountryCodeResolver,
) -> ChartOutput {
    let result = match chart {
        ChartKind::Occurrence => occurrence_chart(store, filter, display).map(ChartOutput::Bars),
        ChartKind::Cooccurrence => {
            cooccurrence_chart(store, filter, display).map(ChartOutput::Bars)
        }
        ChartKind::GeoMap => geo_chart(store, filter, display, resolver).map(ChartOutput::Map),
        ChartKind::Flow => flow_chart(store, filter).map(ChartOutput::Flow),
    };

    match result {
        Ok(output) => output,
        Err(error) => {
            log::warn!("{} chart unavailable: {}", chart, error);
            ChartOutput::Empty(EmptyState::from_error(chart, &error))
        }
    }
}

/// Render every chart independently, in [`ChartKind::ALL`] order
pub fn render_dashboard(
    store: &RecordStore,
    dashboard: &DashboardSpec,
    resolver: &dyn CountryCodeResolver,
) -> Vec<ChartOutput> {
    ChartKind::ALL
        .into_iter()
        .map(|chart| {
            let spec = dashboard.chart(chart);
            render_pass(store, chart, &spec.filter, &spec.display, resolver)
        })
        .collect()
}

fn require_table<T>(kind: TableKind, rows: Option<&[T]>) -> Result<&[T]> {
    match rows {
        None => Err(EngineError::MissingInput(kind)),
        Some([]) => Err(EngineError::EmptyInput(kind)),
        Some(rows) => Ok(rows),
    }
}

fn require_clusters(store: &RecordStore) -> Result<&AliasClusterMap> {
    match store.alias_clusters() {
        None => Err(EngineError::MissingInput(TableKind::AliasCluster)),
        Some(map) if map.is_empty() => Err(EngineError::EmptyInput(TableKind::AliasCluster)),
        Some(map) => Ok(map),
    }
}

/// Alias occurrence per year, one stack per alias
pub fn occurrence_chart(
    store: &RecordStore,
    filter: &FilterSpec,
    display: &DisplaySpec,
) -> Result<BarChart> {
    let rows = require_table(TableKind::Occurrence, store.occurrence())?;
    bar_chart(
        ChartKind::Occurrence,
        rows,
        &[Dimension::Alias],
        filter,
        display,
        store.alias_clusters(),
    )
}

/// Alias pair co-occurrence per year, one stack per `row & col` pair
pub fn cooccurrence_chart(
    store: &RecordStore,
    filter: &FilterSpec,
    display: &DisplaySpec,
) -> Result<BarChart> {
    let rows = require_table(TableKind::Cooccurrence, store.cooccurrence())?;
    bar_chart(
        ChartKind::Cooccurrence,
        rows,
        &[Dimension::AliasRow, Dimension::AliasCol],
        filter,
        display,
        store.alias_clusters(),
    )
}

fn bar_chart<R: FacetRow>(
    chart: ChartKind,
    rows: &[R],
    group: &[Dimension],
    spec: &FilterSpec,
    display: &DisplaySpec,
    clusters: Option<&AliasClusterMap>,
) -> Result<BarChart> {
    let view = filter(rows, spec, clusters)?;
    if view.is_empty() {
        return Err(EngineError::EmptyFilterResult(chart));
    }
    let aggregation = aggregate(&view, group, clusters)?;
    if aggregation.is_empty() {
        return Err(EngineError::EmptyFilterResult(chart));
    }

    let mut stats = view.into_stats();
    stats.unmapped_categories += aggregation.dropped_rows();

    let ranked = RankedLabeling::new(&aggregation, display.sort, display.label_width);
    let axis_keys: Vec<SeriesKey> = ranked.axis_order().into_iter().cloned().collect();

    let color = ColorScale::new(
        display.palette,
        display.color_clamp,
        aggregation.metric_range().unwrap_or((0, 0)),
        display.legend_samples,
    );
    let axis = AxisRange::resolve(
        aggregation.max_stack(&axis_keys),
        display.axis_max,
        display.axis_scale,
    );

    let categories = axis_keys
        .iter()
        .map(|key| AxisCategory {
            key: key.clone(),
            label: ranked.label(key).map(str::to_string).unwrap_or_else(|| key.display()),
            truncated: ranked
                .truncated_label(key)
                .map(str::to_string)
                .unwrap_or_else(|| key.display()),
            total: aggregation.total(key).unwrap_or(0),
        })
        .collect();

    let traces = year_traces(&aggregation, &axis_keys, &ranked, &color);
    let years = aggregation.years();

    log::debug!(
        "{} chart: {} categories over {} years, axis max {}",
        chart,
        axis_keys.len(),
        years.len(),
        axis.max
    );

    Ok(BarChart {
        chart,
        title: chart.title().to_string(),
        metric: chart.metric_label().to_string(),
        categories,
        years,
        traces,
        axis,
        color,
        stats,
    })
}

fn year_traces(
    aggregation: &Aggregation,
    axis_keys: &[SeriesKey],
    ranked: &RankedLabeling,
    color: &ColorScale,
) -> Vec<YearTrace> {
    let values: HashMap<(&SeriesKey, i32), u64> = aggregation
        .series()
        .iter()
        .map(|series| ((&series.key, series.year), series.metric))
        .collect();

    aggregation
        .years()
        .into_iter()
        .map(|year| {
            let bars = axis_keys
                .iter()
                .filter_map(|key| {
                    let value = *values.get(&(key, year))?;
                    let (t, rgb) = color.color_for(value);
                    Some(Bar {
                        key: key.clone(),
                        label: ranked
                            .truncated_label(key)
                            .map(str::to_string)
                            .unwrap_or_else(|| key.display()),
                        value,
                        t,
                        color: rgb,
                    })
                })
                .collect();
            YearTrace { year, bars }
        })
        .collect()
}

/// Country occurrence per year as choropleth frames
pub fn geo_chart(
    store: &RecordStore,
    spec: &FilterSpec,
    display: &DisplaySpec,
    resolver: &dyn CountryCodeResolver,
) -> Result<MapChart> {
    let rows = require_table(TableKind::CountryOccurrence, store.country_occurrence())?;
    let clusters = store.alias_clusters();

    let view = filter(rows, spec, clusters)?;
    if view.is_empty() {
        return Err(EngineError::EmptyFilterResult(ChartKind::GeoMap));
    }
    let aggregation = aggregate(&view, &[Dimension::Country], clusters)?;
    if aggregation.is_empty() {
        return Err(EngineError::EmptyFilterResult(ChartKind::GeoMap));
    }

    let mut codes: HashMap<&str, Option<String>> = HashMap::new();
    let mut unresolved = Vec::new();
    for key in aggregation.keys() {
        let Some(country) = key.parts().first() else {
            continue;
        };
        let code = resolver.resolve(country);
        if code.is_none() {
            unresolved.push(country.clone());
        }
        codes.insert(country.as_str(), code);
    }

    let unresolved_rows = view
        .rows()
        .iter()
        .filter(|row| {
            dimension_value(**row, Dimension::Country, clusters)
                .map(|country| matches!(codes.get(country), Some(None)))
                .unwrap_or(false)
        })
        .count();

    // colour range covers every country, resolved or not
    let color = ColorScale::new(
        display.palette,
        display.color_clamp,
        aggregation.metric_range().unwrap_or((0, 0)),
        display.legend_samples,
    );

    let mut frames: BTreeMap<i32, Vec<MapCell>> = BTreeMap::new();
    for series in aggregation.series() {
        let Some(country) = series.key.parts().first() else {
            continue;
        };
        let Some(Some(iso3)) = codes.get(country.as_str()) else {
            continue;
        };
        let (t, rgb) = color.color_for(series.metric);
        frames.entry(series.year).or_default().push(MapCell {
            iso3: iso3.clone(),
            country: country.clone(),
            value: series.metric,
            t,
            color: rgb,
        });
    }

    let mut stats = view.into_stats();
    stats.unmapped_categories += aggregation.dropped_rows() + unresolved_rows;

    if !unresolved.is_empty() {
        log::warn!(
            "Geo map: {} countries without ISO-3 code dropped: {}",
            unresolved.len(),
            unresolved.join(", ")
        );
    }

    Ok(MapChart {
        title: ChartKind::GeoMap.title().to_string(),
        frames: frames
            .into_iter()
            .map(|(year, cells)| MapFrame { year, cells })
            .collect(),
        color,
        unresolved,
        stats,
    })
}

/// Country → cluster flow over the filtered period
pub fn flow_chart(store: &RecordStore, spec: &FilterSpec) -> Result<FlowChart> {
    let rows = require_table(TableKind::CountryOccurrence, store.country_occurrence())?;
    let clusters = require_clusters(store)?;

    let view = filter(rows, spec, Some(clusters))?;
    if view.is_empty() {
        return Err(EngineError::EmptyFilterResult(ChartKind::Flow));
    }

    let (pairs, dropped) =
        aggregate_pairs(&view, Dimension::Country, Dimension::Cluster, Some(clusters))?;
    let graph = build_flow(&pairs);
    if graph.edge_count() == 0 {
        return Err(EngineError::EmptyFilterResult(ChartKind::Flow));
    }

    let mut stats = view.into_stats();
    stats.unmapped_categories += dropped;

    Ok(FlowChart {
        title: ChartKind::Flow.title().to_string(),
        graph,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spec::SortMode;
    use pretty_assertions::assert_eq;
    use tessella_records::OccurrenceRecord;

    fn occ(alias: &str, month: &str, occurrence: u64) -> OccurrenceRecord {
        OccurrenceRecord {
            alias: alias.to_string(),
            month: Month::parse(month),
            occurrence,
        }
    }

    fn sample_store() -> RecordStore {
        RecordStore::new().with_occurrence(vec![
            occ("X", "2020-01", 5),
            occ("X", "2020-06", 3),
            occ("Y", "2020-03", 10),
            occ("X", "2021-02", 4),
        ])
    }

    #[test]
    fn bars_follow_axis_order() {
        let chart = occurrence_chart(&sample_store(), &FilterSpec::new(), &DisplaySpec::default())
            .expect("chart");

        let labels: Vec<&str> = chart.categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Y", "X"]);
        assert_eq!(chart.years, vec![2020, 2021]);
        assert_eq!(chart.traces[0].bars.len(), 2);
        assert_eq!(chart.traces[1].bars.len(), 1);
        assert_eq!(chart.total(), 22);
        // X stacks to 12: default max 12.6 floors to 12, limit 13.2 floors to 13
        assert_eq!((chart.axis.max, chart.axis.limit), (12, 13));
        assert_eq!(chart.color.clamp.min, 4);
        assert_eq!(chart.color.clamp.max, 10);
    }

    #[test]
    fn sort_mode_changes_axis_order() {
        let store = RecordStore::new()
            .with_occurrence(vec![occ("X", "2020-01", 1), occ("Y", "2020-01", 10)]);
        let labels = |sort| {
            let display = DisplaySpec {
                sort,
                ..DisplaySpec::default()
            };
            occurrence_chart(&store, &FilterSpec::new(), &display)
                .expect("chart")
                .categories
                .into_iter()
                .map(|c| c.label)
                .collect::<Vec<_>>()
        };

        assert_eq!(labels(SortMode::TotalDesc), vec!["X", "Y"]);
        assert_eq!(labels(SortMode::Alpha), vec!["Y", "X"]);
    }

    #[test]
    fn missing_table_renders_empty_state() {
        let store = RecordStore::new().with_missing(TableKind::Occurrence, "not found");
        let output = render_pass(
            &store,
            ChartKind::Occurrence,
            &FilterSpec::new(),
            &DisplaySpec::default(),
            &HashMap::<String, String>::new(),
        );

        match output {
            ChartOutput::Empty(state) => assert_eq!(state.reason, ErrorKind::MissingInput),
            other => panic!("expected empty state, got {:?}", other),
        }
    }

    #[test]
    fn oversized_metrics_still_render() {
        let huge = u64::MAX / 2 + 1;
        let store = RecordStore::new()
            .with_occurrence(vec![occ("X", "2020-01", huge), occ("X", "2020-02", huge)]);
        let output = render_pass(
            &store,
            ChartKind::Occurrence,
            &FilterSpec::new(),
            &DisplaySpec::default(),
            &HashMap::<String, String>::new(),
        );

        match output {
            ChartOutput::Bars(chart) => {
                assert_eq!(chart.categories[0].total, u64::MAX);
                assert_eq!(chart.total(), u64::MAX);
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn zero_valued_flow_is_an_empty_result() {
        let store = RecordStore::new()
            .with_country_occurrence(vec![tessella_records::CountryOccurrenceRecord {
                country: Some("Chile".into()),
                alias: Some("h2".into()),
                month: Month::new(2020, 1),
                occurrence: 0,
            }])
            .with_alias_clusters(vec![tessella_records::AliasClusterEntry {
                alias: "h2".into(),
                cluster_name: "Fuels".into(),
            }]);

        let err = flow_chart(&store, &FilterSpec::new()).expect_err("no flow");
        assert_eq!(err, EngineError::EmptyFilterResult(ChartKind::Flow));
    }

    #[test]
    fn filter_that_removes_everything_is_an_empty_result() {
        let spec = FilterSpec::new().with_values(Dimension::Alias, ["nobody"]);
        let err = occurrence_chart(&sample_store(), &spec, &DisplaySpec::default())
            .expect_err("nothing left");

        assert_eq!(err, EngineError::EmptyFilterResult(ChartKind::Occurrence));
    }

    #[test]
    fn dashboard_date_range_reaches_every_chart() {
        let mut dashboard = DashboardSpec::for_store(&sample_store());
        let start = Month::new(2020, 1).unwrap();
        let end = Month::new(2020, 12).unwrap();
        dashboard.set_date_range(start, end);

        for chart in ChartKind::ALL {
            let range = dashboard.chart(chart).filter.date_range.expect("range");
            assert_eq!((range.start, range.end), (start, end));
        }
    }
}
