use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use tessella_engine::{
    render_dashboard, render_pass, ChartKind, ChartOutput, DashboardSpec, Dimension, DisplaySpec,
    ErrorKind, FilterSpec, FlowSide, IsoCountryTable, SeriesKey,
};
use tessella_records::{load_dir, Month, RecordStore};

fn write_dataset(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    for (name, body) in files {
        fs::write(temp.path().join(name), body).expect("write csv");
    }
    temp
}

fn full_dataset() -> TempDir {
    write_dataset(&[
        (
            "lookup_occurrence.csv",
            "alias,month,occurrence\n\
             X,2020-01-01,5\n\
             X,2020-06-01,3\n\
             Y,2020-03-01,10\n\
             Z,not a date,99\n",
        ),
        (
            "lookup_cooccurrence.csv",
            "alias_row,alias_col,month,cooccurrence\n\
             X,Y,2020-01-01,2\n\
             X,Y,2021-01-01,4\n\
             Y,X,2021-02-01,1\n",
        ),
        (
            "lookup_country_occurrence.csv",
            "country,alias,month,occurrence\n\
             Chile,X,2020-01-01,6\n\
             Chile,Y,2021-01-01,2\n\
             Peru,X,2020-05-01,3\n\
             Narnia,X,2020-05-01,8\n",
        ),
        (
            "fact_alias_cluster.csv",
            "alias,cluster_name\n\
             X,Fuels\n\
             Y,Storage\n",
        ),
    ])
}

fn bars(output: ChartOutput) -> tessella_engine::BarChart {
    match output {
        ChartOutput::Bars(chart) => chart,
        other => panic!("expected bars, got {:?}", other),
    }
}

#[test]
fn occurrence_scenario_end_to_end() {
    let temp = full_dataset();
    let store = load_dir(temp.path());

    let chart = bars(render_pass(
        &store,
        ChartKind::Occurrence,
        &FilterSpec::new(),
        &DisplaySpec::default(),
        IsoCountryTable::bundled(),
    ));

    let series: Vec<(String, i32, u64)> = chart
        .traces
        .iter()
        .flat_map(|trace| {
            trace
                .bars
                .iter()
                .map(move |bar| (bar.label.clone(), trace.year, bar.value))
        })
        .collect();
    assert_eq!(
        series,
        vec![("X".to_string(), 2020, 8), ("Y".to_string(), 2020, 10)]
    );
    // axis order is the reverse of total-descending [Y, X]
    let axis: Vec<&str> = chart.categories.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(axis, vec!["X", "Y"]);
    assert_eq!(chart.stats.unparseable_dates, 1);
    assert_eq!(chart.color.legend.samples.len(), 100);
}

#[test]
fn cooccurrence_pairs_keep_direction() {
    let temp = full_dataset();
    let store = load_dir(temp.path());

    let chart = bars(render_pass(
        &store,
        ChartKind::Cooccurrence,
        &FilterSpec::new(),
        &DisplaySpec::default(),
        IsoCountryTable::bundled(),
    ));

    let xy = chart.category(&SeriesKey::pair("X", "Y")).expect("X & Y");
    assert_eq!(xy.label, "X & Y");
    assert_eq!(xy.total, 6);
    assert_eq!(chart.category(&SeriesKey::pair("Y", "X")).map(|c| c.total), Some(1));
}

#[test]
fn cooccurrence_cluster_filter_uses_each_side() {
    let temp = full_dataset();
    let store = load_dir(temp.path());
    let spec = FilterSpec::new().with_values(Dimension::ClusterRow, ["Storage"]);

    let chart = bars(render_pass(
        &store,
        ChartKind::Cooccurrence,
        &spec,
        &DisplaySpec::default(),
        IsoCountryTable::bundled(),
    ));

    let keys: Vec<String> = chart.categories.iter().map(|c| c.key.display()).collect();
    assert_eq!(keys, vec!["Y & X"]);
}

#[test]
fn geo_map_drops_unresolved_countries_only_from_the_map() {
    let temp = full_dataset();
    let store = load_dir(temp.path());

    let output = render_pass(
        &store,
        ChartKind::GeoMap,
        &FilterSpec::new(),
        &DisplaySpec::default(),
        IsoCountryTable::bundled(),
    );
    let ChartOutput::Map(map) = output else {
        panic!("expected map output");
    };

    assert_eq!(map.unresolved, vec!["Narnia".to_string()]);
    let years: Vec<i32> = map.frames.iter().map(|f| f.year).collect();
    assert_eq!(years, vec![2020, 2021]);
    let first: Vec<(&str, u64)> = map.frames[0]
        .cells
        .iter()
        .map(|cell| (cell.iso3.as_str(), cell.value))
        .collect();
    assert_eq!(first, vec![("CHL", 6), ("PER", 3)]);
    // Narnia still shapes the colour range
    assert_eq!(map.color.observed.max, 8);
    assert_eq!(map.stats.unmapped_categories, 1);
}

#[test]
fn flow_uses_default_top_selection() {
    let temp = full_dataset();
    let store = load_dir(temp.path());
    let dashboard = DashboardSpec::for_store(&store);

    let outputs = render_dashboard(&store, &dashboard, IsoCountryTable::bundled());
    assert_eq!(outputs.len(), 4);

    let ChartOutput::Flow(flow) = &outputs[3] else {
        panic!("expected flow output");
    };
    let graph = &flow.graph;
    assert_eq!(graph.source_count(), 3);
    assert!(graph.find_node("Chile", FlowSide::Source).is_some());
    assert!(graph.find_node("Fuels", FlowSide::Target).is_some());
    assert_eq!(graph.total_flow(), 19);
}

#[test]
fn flow_without_cluster_map_is_an_empty_state() {
    let temp = write_dataset(&[(
        "lookup_country_occurrence.csv",
        "country,alias,month,occurrence\nChile,X,2020-01-01,6\n",
    )]);
    let store = load_dir(temp.path());

    let outputs = render_dashboard(
        &store,
        &DashboardSpec::for_store(&store),
        IsoCountryTable::bundled(),
    );

    let reasons: Vec<Option<ErrorKind>> = outputs
        .iter()
        .map(|output| match output {
            ChartOutput::Empty(state) => Some(state.reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            Some(ErrorKind::MissingInput),
            Some(ErrorKind::MissingInput),
            None,
            Some(ErrorKind::MissingInput),
        ]
    );
}

#[test]
fn empty_file_is_reported_as_empty_input() {
    let temp = write_dataset(&[("lookup_occurrence.csv", "alias,month,occurrence\n")]);
    let store = load_dir(temp.path());

    let output = render_pass(
        &store,
        ChartKind::Occurrence,
        &FilterSpec::new(),
        &DisplaySpec::default(),
        IsoCountryTable::bundled(),
    );
    let ChartOutput::Empty(state) = output else {
        panic!("expected empty state");
    };
    assert_eq!(state.reason, ErrorKind::EmptyInput);
}

#[test]
fn date_range_applies_across_charts() {
    let temp = full_dataset();
    let store = load_dir(temp.path());
    let mut dashboard = DashboardSpec::for_store(&store);
    dashboard.set_date_range(Month::new(2021, 1).unwrap(), Month::new(2021, 12).unwrap());

    let outputs = render_dashboard(&store, &dashboard, IsoCountryTable::bundled());

    assert!(outputs[0].is_empty(), "no occurrence rows in 2021");
    let co = match &outputs[1] {
        ChartOutput::Bars(chart) => chart.total(),
        other => panic!("expected bars, got {:?}", other),
    };
    assert_eq!(co, 5);
}

#[test]
fn render_is_repeatable() {
    let store = RecordStore::new().with_occurrence(Vec::new());
    let first = format!(
        "{:?}",
        render_pass(
            &store,
            ChartKind::Occurrence,
            &FilterSpec::new(),
            &DisplaySpec::default(),
            IsoCountryTable::bundled(),
        )
    );
    let second = format!(
        "{:?}",
        render_pass(
            &store,
            ChartKind::Occurrence,
            &FilterSpec::new(),
            &DisplaySpec::default(),
            IsoCountryTable::bundled(),
        )
    );
    assert_eq!(first, second);
}
