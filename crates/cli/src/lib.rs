use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tessella_engine::{
    render_dashboard, render_pass, ChartKind, ChartOutput, FacetOptions, IsoCountryTable,
};
use tessella_records::{load_dir, LoadReport, Month, RecordStore};

mod config;
mod report;

pub use config::ViewConfig;

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "tessella")]
#[command(about = "Faceted keyword-occurrence charts from CSV tables", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// Directory holding the lookup_*.csv and fact_alias_cluster.csv files
    #[arg(long, global = true, default_value = ".")]
    data: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which input tables loaded, are empty or are missing
    Status(OutputArgs),

    /// List filter options and the month range of the dataset
    Facets(OutputArgs),

    /// Render one chart or the whole dashboard
    Render(RenderArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// Chart to render
    #[arg(long, value_enum, default_value_t = ChartArg::All)]
    chart: ChartArg,

    /// TOML view file with filters and display options
    #[arg(long)]
    view: Option<PathBuf>,

    /// First month to include (YYYY-MM), overrides the view file
    #[arg(long)]
    from: Option<Month>,

    /// Last month to include (YYYY-MM), overrides the view file
    #[arg(long)]
    to: Option<Month>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ChartArg {
    Occurrence,
    Cooccurrence,
    Geo,
    Flow,
    All,
}

impl ChartArg {
    fn as_chart(self) -> Option<ChartKind> {
        match self {
            ChartArg::Occurrence => Some(ChartKind::Occurrence),
            ChartArg::Cooccurrence => Some(ChartKind::Cooccurrence),
            ChartArg::Geo => Some(ChartKind::GeoMap),
            ChartArg::Flow => Some(ChartKind::Flow),
            ChartArg::All => None,
        }
    }
}

#[derive(Serialize)]
struct RenderOutput<'a> {
    load: &'a LoadReport,
    charts: Vec<ChartOutput>,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let store = load_dir(&cli.data);

    match cli.command {
        Commands::Status(args) => run_status(&store, &args)?,
        Commands::Facets(args) => run_facets(&store, &args)?,
        Commands::Render(args) => run_render(&store, args)?,
    }

    Ok(())
}

fn emit_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    print_stdout(&text)
}

fn run_status(store: &RecordStore, args: &OutputArgs) -> Result<()> {
    match args.format {
        OutputFormat::Json => emit_json(store.report(), args.pretty),
        OutputFormat::Markdown => print_stdout(&report::render_load_report(store.report())),
    }
}

fn run_facets(store: &RecordStore, args: &OutputArgs) -> Result<()> {
    let options = FacetOptions::from_store(store);
    match args.format {
        OutputFormat::Json => emit_json(&options, args.pretty),
        OutputFormat::Markdown => print_stdout(&report::render_facets(&options)),
    }
}

fn run_render(store: &RecordStore, args: RenderArgs) -> Result<()> {
    let view = match &args.view {
        Some(path) => ViewConfig::load(path)?,
        None => ViewConfig::default(),
    };
    let view = view
        .with_date_overrides(args.from, args.to)
        .context("Invalid --from/--to")?;
    let dashboard = view.dashboard(store);
    let resolver = IsoCountryTable::bundled();

    let charts = match args.chart.as_chart() {
        Some(chart) => {
            let spec = dashboard.chart(chart);
            vec![render_pass(
                store,
                chart,
                &spec.filter,
                &spec.display,
                resolver,
            )]
        }
        None => render_dashboard(store, &dashboard, resolver),
    };

    let rendered = charts.iter().filter(|chart| !chart.is_empty()).count();
    log::info!("Rendered {} of {} charts", rendered, charts.len());

    match args.output.format {
        OutputFormat::Json => emit_json(
            &RenderOutput {
                load: store.report(),
                charts,
            },
            args.output.pretty,
        ),
        OutputFormat::Markdown => print_stdout(&report::render_charts(&charts)),
    }
}
