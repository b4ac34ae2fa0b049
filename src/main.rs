use canvass_stats::canvass::{
    AreaStatsService, AssignmentAreaStats, AssignmentId, CanvassDataset, CancellationToken,
};
use canvass_stats::config::AppConfig;
use canvass_stats::error::AppError;
use canvass_stats::telemetry;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "canvass-stats",
    about = "Compute canvass assignment progress from an exported dataset",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-area and assignment-level visit statistics
    AreaStats(AreaStatsArgs),
    /// Sessions of an assignment with their areas and assignees
    Sessions(DatasetArgs),
    /// Hourly visit activity per area
    Graph(DatasetArgs),
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// JSON dataset exported from the canvassing store
    #[arg(long)]
    dataset: PathBuf,
    /// Assignment to analyse
    #[arg(long)]
    assignment: String,
}

#[derive(Args, Debug)]
struct AreaStatsArgs {
    #[command(flatten)]
    source: DatasetArgs,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Abort if the computation runs longer than this many milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,
    /// Process areas in parallel (requires the `parallel` feature)
    #[arg(long)]
    parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::AreaStats(args) => {
            if args.parallel {
                config.engine.parallel = true;
            }
            if let Some(deadline_ms) = args.deadline_ms {
                config.engine.deadline_ms = Some(deadline_ms);
            }
            run_area_stats(&config, args)
        }
        Command::Sessions(args) => run_sessions(&config, args),
        Command::Graph(args) => run_graph(&config, args),
    }
}

fn load_service(
    config: &AppConfig,
    args: &DatasetArgs,
) -> Result<(AreaStatsService<CanvassDataset, CanvassDataset>, AssignmentId), AppError> {
    if config.engine.parallel && !cfg!(feature = "parallel") {
        warn!(
            "parallel processing requested but the `parallel` feature is not compiled in; \
             running sequentially"
        );
    }
    let dataset = Arc::new(CanvassDataset::from_path(&args.dataset)?);
    info!(
        environment = ?config.environment,
        dataset = %args.dataset.display(),
        places = dataset.places.len(),
        "dataset loaded"
    );
    let service =
        AreaStatsService::with_options(dataset.clone(), dataset, config.engine.options());
    Ok((service, AssignmentId::new(args.assignment.clone())))
}

fn run_area_stats(config: &AppConfig, args: AreaStatsArgs) -> Result<(), AppError> {
    let (service, assignment_id) = load_service(config, &args.source)?;
    let stats = service.compute(&assignment_id, &CancellationToken::new())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => render_json(&mut out, &stats)?,
        OutputFormat::Csv => stats.write_csv(&mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn render_json<W: Write>(out: &mut W, stats: &AssignmentAreaStats) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, stats)?;
    writeln!(out)?;
    Ok(())
}

fn run_sessions(config: &AppConfig, args: DatasetArgs) -> Result<(), AppError> {
    let (service, assignment_id) = load_service(config, &args)?;
    let sessions = service.sessions(&assignment_id)?;
    println!("{}", serde_json::to_string_pretty(&sessions)?);
    Ok(())
}

fn run_graph(config: &AppConfig, args: DatasetArgs) -> Result<(), AppError> {
    let (service, assignment_id) = load_service(config, &args)?;
    let activity = service.activity(&assignment_id)?;
    println!("{}", serde_json::to_string_pretty(&activity)?);
    Ok(())
}
