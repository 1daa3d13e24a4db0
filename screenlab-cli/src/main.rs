//! ScreenLab CLI: merge, snapshot and config commands.
//!
//! Commands:
//! - `merge`: reconcile the configured source artifacts into one record set
//! - `snapshot`: build the regional price/indicator artifact for a universe
//! - `config`: print (or write) the built-in pipeline config as TOML

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use screenlab_core::emit::OutputShape;
use screenlab_core::reconcile::{DiagnosticKind, MergeReport};
use screenlab_runner::telemetry::init_tracing;
use screenlab_runner::{
    run_merge, run_snapshot, MergeRun, PipelineConfig, ProviderKind, SnapshotRun,
};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "screenlab",
    about = "ScreenLab CLI: multi-source equity screener merge"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the primary, sentiment and regional artifacts.
    Merge {
        /// Path to a TOML pipeline config. Defaults to the built-in config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Primary screener artifact.
        #[arg(long)]
        primary: Option<PathBuf>,

        /// Sentiment artifact.
        #[arg(long)]
        sentiment: Option<PathBuf>,

        /// Regional snapshot artifact.
        #[arg(long)]
        regional: Option<PathBuf>,

        /// Merged output path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output shape.
        #[arg(long, value_enum)]
        shape: Option<ShapeArg>,

        /// Emit per-field provenance as `fieldSources`.
        #[arg(long, default_value_t = false)]
        field_provenance: bool,

        /// Write a run manifest to this path.
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Drop records whose market cap is below this value.
        #[arg(long)]
        min_market_cap: Option<f64>,
    },
    /// Build the regional snapshot artifact.
    Snapshot {
        /// Path to a TOML pipeline config. Defaults to the built-in config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Universe CSV (ticker,name,country,sector).
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Snapshot output path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Price history provider.
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,

        /// Closes file for the `file` provider (JSON: ticker -> [close, ...]).
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Worker threads. Defaults to available parallelism, capped at 8.
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print the built-in pipeline config as TOML.
    Config {
        /// Write to this path instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShapeArg {
    Mapping,
    List,
}

impl From<ShapeArg> for OutputShape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Mapping => OutputShape::Mapping,
            ShapeArg::List => OutputShape::List,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Yahoo,
    File,
    Synthetic,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Yahoo => ProviderKind::Yahoo,
            ProviderArg::File => ProviderKind::File,
            ProviderArg::Synthetic => ProviderKind::Synthetic,
        }
    }
}

fn main() -> Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            config,
            primary,
            sentiment,
            regional,
            output,
            shape,
            field_provenance,
            manifest,
            min_market_cap,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            for (name, path) in [
                ("primary", primary),
                ("sentiment", sentiment),
                ("regional", regional),
            ] {
                if let Some(path) = path {
                    if !cfg.override_path(name, path) {
                        bail!("config has no source named '{name}'");
                    }
                }
            }
            if let Some(path) = output {
                cfg.output.path = path;
            }
            if let Some(shape) = shape {
                cfg.output.shape = shape.into();
            }
            cfg.output.field_provenance |= field_provenance;
            if manifest.is_some() {
                cfg.output.manifest = manifest;
            }
            if min_market_cap.is_some() {
                cfg.filters.min_market_cap = min_market_cap;
            }
            run_merge_cmd(&cfg)
        }
        Commands::Snapshot {
            config,
            universe,
            output,
            provider,
            prices,
            threads,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(path) = universe {
                cfg.snapshot.universe = path;
            }
            if let Some(path) = output {
                cfg.snapshot.output = path;
            }
            if let Some(provider) = provider {
                cfg.snapshot.provider = provider.into();
            }
            if prices.is_some() {
                cfg.snapshot.prices = prices;
            }
            if threads.is_some() {
                cfg.snapshot.threads = threads;
            }
            run_snapshot_cmd(&cfg)
        }
        Commands::Config { output, force } => run_config_cmd(output.as_deref(), force),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading pipeline config");
            Ok(PipelineConfig::from_file(path)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn run_merge_cmd(cfg: &PipelineConfig) -> Result<()> {
    let run = run_merge(cfg)?;
    print_merge_summary(&run);
    Ok(())
}

fn run_snapshot_cmd(cfg: &PipelineConfig) -> Result<()> {
    let run = run_snapshot(cfg)?;
    print_snapshot_summary(&run);
    Ok(())
}

fn run_config_cmd(output: Option<&Path>, force: bool) -> Result<()> {
    let toml = PipelineConfig::default().to_toml()?;
    match output {
        None => print!("{toml}"),
        Some(path) => {
            if path.exists() && !force {
                bail!("{} exists; pass --force to overwrite", path.display());
            }
            std::fs::write(path, toml)?;
            println!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}

fn print_merge_summary(run: &MergeRun) {
    println!();
    println!("=== Merge Result ===");
    println!("Records:        {}", run.records.len());
    if run.filtered > 0 {
        println!("Filtered:       {} (below min market cap)", run.filtered);
    }
    println!("Output:         {}", run.output.display());
    println!("BLAKE3:         {}", run.output_hash);
    if let Some(path) = &run.manifest {
        println!("Manifest:       {}", path.display());
    }
    println!();
    print_source_table(&run.report);
    print_diagnostics(&run.report);
    println!();
}

fn print_source_table(report: &MergeReport) {
    println!(
        "{:<12} {:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Source", "Shape", "Records", "Merged", "Skipped", "Created", "Filled", "Conflicts"
    );
    println!("{}", "-".repeat(80));
    for s in &report.sources {
        println!(
            "{:<12} {:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}",
            s.name, s.shape, s.records, s.merged, s.skipped, s.created, s.filled, s.conflicts
        );
    }
}

fn print_diagnostics(report: &MergeReport) {
    if report.diagnostics.is_empty() {
        return;
    }
    println!();
    println!(
        "--- Diagnostics ({} structural, {} record, {} field) ---",
        report.count(DiagnosticKind::Structural),
        report.count(DiagnosticKind::Record),
        report.count(DiagnosticKind::Field),
    );
    for d in &report.diagnostics {
        println!("WARNING: {d}");
    }
}

fn print_snapshot_summary(run: &SnapshotRun) {
    let snap = &run.snapshot;
    let priced = snap.entries.iter().filter(|(_, e)| e.price.is_some()).count();
    let oversold: Vec<&str> = snap
        .entries
        .iter()
        .filter(|(_, e)| e.oversold)
        .map(|(t, _)| t.as_str())
        .collect();

    println!();
    println!("=== Snapshot ===");
    println!("Date:           {}", snap.date_string());
    println!("Instruments:    {}", snap.entries.len());
    println!("Priced:         {priced}");
    println!("Output:         {}", run.output.display());
    if !oversold.is_empty() {
        println!("Oversold:       {}", oversold.join(", "));
    }
    for failure in &snap.failures {
        println!("WARNING: {}: {}", failure.ticker, failure.error);
    }
    println!();
}
