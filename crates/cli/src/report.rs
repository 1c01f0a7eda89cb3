use tessella_engine::{BarChart, ChartOutput, FacetOptions, FlowChart, MapChart, PassStats};
use tessella_records::{LoadReport, TableKind, TableStatus};

/// Longest list of categories or cells printed per chart
const MAX_ROWS: usize = 25;

pub fn render_load_report(report: &LoadReport) -> String {
    let mut md = String::new();
    md.push_str("# Tessella input status\n\n");
    md.push_str("| table | status | rows | detail |\n");
    md.push_str("|---|---|---:|---|\n");
    for kind in TableKind::ALL {
        let (status, rows, detail) = match report.status(kind) {
            Some(TableStatus::Loaded { rows }) => ("loaded", rows.to_string(), String::new()),
            Some(TableStatus::Empty) => ("empty", "0".to_string(), String::new()),
            Some(TableStatus::Missing { reason }) => ("missing", "-".to_string(), reason.clone()),
            None => ("missing", "-".to_string(), "not loaded".to_string()),
        };
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            kind,
            status,
            rows,
            escape_cell(&detail)
        ));
    }
    md.push('\n');

    let missing = report.missing();
    if !missing.is_empty() {
        md.push_str(&format!(
            "Missing or unreadable file(s): {}. Please check the file names and format.\n",
            join_kinds(&missing)
        ));
    }
    let empty = report.empty();
    if !empty.is_empty() {
        md.push_str(&format!(
            "Empty file(s): {}. Charts may not display.\n",
            join_kinds(&empty)
        ));
    }
    md
}

pub fn render_facets(options: &FacetOptions) -> String {
    let mut md = String::new();
    md.push_str("# Tessella filter options\n\n");
    match &options.month_bounds {
        Some(range) => md.push_str(&format!("- Months: `{}` to `{}`\n", range.start, range.end)),
        None => md.push_str("- Months: n/a\n"),
    }
    for (name, values) in [
        ("Aliases", &options.aliases),
        ("Alias 1 (alias_row)", &options.alias_rows),
        ("Alias 2 (alias_col)", &options.alias_cols),
        ("Clusters", &options.clusters),
        ("Cluster 1 (alias_row)", &options.cluster_rows),
        ("Cluster 2 (alias_col)", &options.cluster_cols),
        ("Countries", &options.countries),
    ] {
        md.push_str(&format!("- {}: {}\n", name, summarize_values(values)));
    }
    md
}

pub fn render_charts(outputs: &[ChartOutput]) -> String {
    let mut md = String::new();
    for output in outputs {
        match output {
            ChartOutput::Bars(chart) => render_bars(&mut md, chart),
            ChartOutput::Map(map) => render_map(&mut md, map),
            ChartOutput::Flow(flow) => render_flow(&mut md, flow),
            ChartOutput::Empty(state) => {
                md.push_str(&format!("## {}\n\n", state.chart.title()));
                md.push_str(&format!("> {}\n\n", state.message));
            }
        }
    }
    md
}

fn render_bars(md: &mut String, chart: &BarChart) {
    md.push_str(&format!("## {}\n\n", chart.title));
    md.push_str(&format!(
        "- Axis: `0..{}` ({:?}), colour `{}` clamp `{}..{}`\n\n",
        chart.axis.max,
        chart.axis.scale,
        chart.color.palette,
        chart.color.clamp.min,
        chart.color.clamp.max
    ));

    md.push_str(&format!("| {} |", escape_cell(&axis_title(chart))));
    for year in &chart.years {
        md.push_str(&format!(" {} |", year));
    }
    md.push_str(" total |\n|---|");
    for _ in &chart.years {
        md.push_str("---:|");
    }
    md.push_str("---:|\n");

    // top of the chart first
    for category in chart.categories.iter().rev().take(MAX_ROWS) {
        md.push_str(&format!("| {} |", escape_cell(&category.truncated)));
        for trace in &chart.traces {
            let value = trace
                .bars
                .iter()
                .find(|bar| bar.key == category.key)
                .map_or(String::new(), |bar| bar.value.to_string());
            md.push_str(&format!(" {} |", value));
        }
        md.push_str(&format!(" {} |\n", category.total));
    }
    if chart.categories.len() > MAX_ROWS {
        md.push_str(&format!(
            "\n_{} more categories not shown_\n",
            chart.categories.len() - MAX_ROWS
        ));
    }
    md.push('\n');
    render_stats(md, &chart.stats);
}

fn axis_title(chart: &BarChart) -> String {
    match chart.categories.first().map(|c| c.key.parts().len()) {
        Some(2) => "combo".to_string(),
        _ => "alias".to_string(),
    }
}

fn render_map(md: &mut String, map: &MapChart) {
    md.push_str(&format!("## {}\n\n", map.title));
    md.push_str("| year | iso3 | country | occurrence |\n");
    md.push_str("|---:|---|---|---:|\n");
    let cells = map
        .frames
        .iter()
        .flat_map(|frame| frame.cells.iter().map(move |cell| (frame.year, cell)));
    for (year, cell) in cells.take(MAX_ROWS) {
        md.push_str(&format!(
            "| {} | `{}` | {} | {} |\n",
            year,
            cell.iso3,
            escape_cell(&cell.country),
            cell.value
        ));
    }
    md.push('\n');
    if !map.unresolved.is_empty() {
        md.push_str(&format!(
            "- Unresolved countries: {}\n",
            escape_cell(&map.unresolved.join(", "))
        ));
    }
    render_stats(md, &map.stats);
}

fn render_flow(md: &mut String, flow: &FlowChart) {
    md.push_str(&format!("## {}\n\n", flow.title));
    let labels = flow.graph.labels();
    md.push_str("| source | target | value |\n");
    md.push_str("|---|---|---:|\n");
    for edge in flow.graph.edges().into_iter().take(MAX_ROWS) {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(labels.get(edge.source).copied().unwrap_or("?")),
            escape_cell(labels.get(edge.target).copied().unwrap_or("?")),
            edge.value
        ));
    }
    md.push('\n');
    render_stats(md, &flow.stats);
}

fn render_stats(md: &mut String, stats: &PassStats) {
    md.push_str(&format!(
        "- Rows: `{}` kept of `{}` (undated `{}`, out of range `{}`, filtered `{}`, unmapped `{}`)\n\n",
        stats.rows_kept,
        stats.rows_in,
        stats.unparseable_dates,
        stats.outside_date_range,
        stats.excluded_by_filter,
        stats.unmapped_categories
    ));
}

fn join_kinds(kinds: &[TableKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn summarize_values(values: &[String]) -> String {
    if values.is_empty() {
        return "n/a".to_string();
    }
    let shown: Vec<String> = values.iter().take(10).map(|v| format!("`{v}`")).collect();
    if values.len() > shown.len() {
        format!("{} (+{} more)", shown.join(", "), values.len() - shown.len())
    } else {
        shown.join(", ")
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessella_engine::{
        render_pass, ChartKind, DisplaySpec, FilterSpec, IsoCountryTable,
    };
    use tessella_records::{Month, OccurrenceRecord, RecordStore};

    #[test]
    fn load_report_lists_every_table() {
        let store = RecordStore::new()
            .with_occurrence(Vec::new())
            .with_missing(TableKind::Cooccurrence, "No such file");

        let md = render_load_report(store.report());
        assert!(md.contains("| `lookup_occurrence.csv` | empty | 0 |"));
        assert!(md.contains("No such file"));
        assert!(md.contains("Missing or unreadable file(s): lookup_cooccurrence.csv"));
        assert!(md.contains("Empty file(s): lookup_occurrence.csv"));
    }

    #[test]
    fn bar_table_puts_top_ranked_first() {
        let store = RecordStore::new().with_occurrence(vec![
            OccurrenceRecord {
                alias: "small|pipe".into(),
                month: Month::new(2020, 1),
                occurrence: 1,
            },
            OccurrenceRecord {
                alias: "big".into(),
                month: Month::new(2021, 1),
                occurrence: 9,
            },
        ]);
        let output = render_pass(
            &store,
            ChartKind::Occurrence,
            &FilterSpec::new(),
            &DisplaySpec::default(),
            IsoCountryTable::bundled(),
        );

        let md = render_charts(&[output]);
        let big = md.find("| big |").expect("big row");
        let small = md.find("| small\\|pipe |").expect("escaped row");
        assert!(big < small);
        assert!(md.contains("| alias | 2020 | 2021 | total |"));
    }
}
