//! COMEX CLI — series pipeline commands.
//!
//! Commands:
//! - `run` — extract, write, consolidate, add world rows and repair dates
//! - `consolidate` — bundle one dimension's per-series artifacts
//! - `canonicalize-dates` — zero-pad months in every artifact under the output root
//! - `inspect` — print an artifact's layout, row count and series codes

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use comex_core::series::read_artifact;
use comex_core::{Dimension, RunPeriod};
use comex_runner::{Pipeline, PipelineConfig, RunReport};

#[derive(Parser)]
#[command(
    name = "comex",
    about = "COMEX series pipeline — trade series generation and consolidation"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that touches the data layout.
#[derive(Args)]
struct LayoutArgs {
    /// Path to a TOML pipeline config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data root holding auxiliar/, processed/ and ipvs/.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Bundle period (YYYY_MM). Defaults to the config value or the current month.
    #[arg(long)]
    period: Option<RunPeriod>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline.
    Run {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Write the run report as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Consolidate the per-series artifacts of one dimension.
    Consolidate {
        /// Dimension: country, harbor or state.
        dimension: Dimension,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Skip world rows when consolidating the country dimension.
        #[arg(long, default_value_t = false)]
        no_world: bool,
    },
    /// Zero-pad single-digit months in every artifact under the output root.
    CanonicalizeDates {
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Print an artifact's layout, row count and series codes.
    Inspect {
        /// Artifact file (.ipv).
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { layout, report } => run_pipeline(&layout, report.as_deref()),
        Commands::Consolidate {
            dimension,
            layout,
            no_world,
        } => run_consolidate(&layout, dimension, no_world),
        Commands::CanonicalizeDates { layout } => run_canonicalize(&layout),
        Commands::Inspect { file } => run_inspect(&file),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolve the config file, then apply command-line overrides.
fn load_config(args: &LayoutArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = &args.data_dir {
        config = config.rebase(root);
    }
    if let Some(period) = args.period {
        config.run_period = Some(period);
    }
    Ok(config)
}

fn run_pipeline(args: &LayoutArgs, report_path: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::new(load_config(args)?);
    let report = pipeline.run().context("pipeline run failed")?;

    print_summary(&report);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn run_consolidate(args: &LayoutArgs, dimension: Dimension, no_world: bool) -> Result<()> {
    let pipeline = Pipeline::new(load_config(args)?);
    let period = pipeline.config().period();
    let bundles = pipeline
        .consolidate_dimension(dimension, period)
        .with_context(|| format!("consolidating {dimension}"))?;

    println!("Exports: {} ({} rows)", bundles.exports.path.display(), bundles.exports.rows);
    println!("Imports: {} ({} rows)", bundles.imports.path.display(), bundles.imports.rows);
    println!("Pruned:  {} files", bundles.pruned);

    if dimension == Dimension::Country && !no_world {
        for world in pipeline.synthesize_world(&bundles)? {
            println!(
                "World:   {} +{} rows ({} replaced)",
                world.flow, world.summary.world_rows, world.summary.replaced_rows
            );
        }
    }
    Ok(())
}

fn run_canonicalize(args: &LayoutArgs) -> Result<()> {
    let pipeline = Pipeline::new(load_config(args)?);
    let summary = pipeline.canonicalize_dates()?;
    info!(
        scanned = summary.files_scanned,
        rewritten = summary.files_rewritten,
        "dates canonicalized"
    );
    println!(
        "Scanned {} files, rewrote {} ({} lines changed)",
        summary.files_scanned, summary.files_rewritten, summary.lines_changed
    );
    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let table =
        read_artifact(path).with_context(|| format!("reading artifact {}", path.display()))?;
    let codes = table.code_counts()?;

    println!("File:   {}", path.display());
    println!("Flow:   {}", table.layout.flow);
    println!("Rows:   {}", table.rows());
    println!("Series: {}", codes.len());
    for (code, rows) in &codes {
        println!("  {code:<32} {rows:>6}");
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("=== Pipeline Run: {} ===", report.period);
    println!("Artifacts written: {}", report.artifacts_written);
    println!("Series skipped:    {}", report.skipped());
    println!("Files pruned:      {}", report.pruned());
    println!(
        "Dates repaired:    {} lines in {} files",
        report.dates.lines_changed, report.dates.files_rewritten
    );
    println!();
    for dimension in &report.dimensions {
        println!(
            "{:<16} exports {:>4} (skipped {:>3})  imports {:>4} (skipped {:>3})",
            dimension.dimension.label(),
            dimension.exports.produced,
            dimension.exports.skipped,
            dimension.imports.produced,
            dimension.imports.skipped
        );
        for bundle in &dimension.bundles {
            println!(
                "  {} rows={} blake3={}",
                bundle.path.display(),
                bundle.rows,
                &bundle.blake3[..12]
            );
        }
    }
    for world in &report.world {
        println!("World {}: +{} rows", world.flow, world.summary.world_rows);
    }
    println!();
    println!("Elapsed: {:.2}s", report.elapsed_secs);
}
