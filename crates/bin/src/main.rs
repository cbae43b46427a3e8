//! pitfund CLI binary.
//!
//! Derives point-in-time quarterly and trailing fundamentals from a
//! downloaded SEC directory and writes every output table.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pitfund::data::{CompanyId, MetricCatalog};
use pitfund::output::{ExportFormat, RunExport, RunSummary};
use pitfund::{PipelineConfig, SecDirectory};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pitfund")]
#[command(about = "pitfund: point-in-time fundamentals from SEC filings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive quarterly, trailing and split-adjusted tables
    Derive {
        /// SEC directory with company_tickers.json, submissions/ and companyfacts/
        #[arg(long)]
        sec_dir: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Output format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the fiscal period matching tolerance
        #[arg(long)]
        tolerance_days: Option<u32>,

        /// Also write summary.md to the output directory
        #[arg(long)]
        markdown: bool,
    },

    /// Print the metric catalog
    Catalog {
        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Derive {
            sec_dir,
            out,
            format,
            config,
            tolerance_days,
            markdown,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(days) = tolerance_days {
                config.engine.fiscal.tolerance_days = days;
                config.engine.validate()?;
            }
            let format: ExportFormat = format.parse()?;
            derive(&sec_dir, &out, format, &config, markdown)?;
        }
        Commands::Catalog { config } => {
            print_catalog(&load_config(config.as_deref())?.catalog);
        }
        Commands::Config { config } => {
            println!("{}", load_config(config.as_deref())?.to_json_pretty()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> pitfund::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path),
        None => Ok(PipelineConfig::default()),
    }
}

fn derive(
    sec_dir: &Path,
    out: &Path,
    format: ExportFormat,
    config: &PipelineConfig,
    markdown: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let universe = SecDirectory::new(sec_dir).load(&config.catalog)?;
    if !universe.skipped.is_empty() {
        eprintln!("Skipped {} unreadable documents", universe.skipped.len());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Deriving companies...");

    let tick = pb.clone();
    let runner = config
        .runner()?
        .with_progress(Box::new(move |_: &CompanyId| tick.inc(1)));
    let inputs = runner.group(&universe.registry, universe.facts);
    pb.set_length(inputs.len() as u64);

    let run = runner.run_inputs(inputs)?;
    pb.finish_with_message("Done");

    let paths = RunExport::from(&run).write_dir(out, format)?;
    for path in &paths {
        info!(path = %path.display(), "wrote table");
    }

    let summary = RunSummary::from(&run);
    if markdown {
        let path = out.join("summary.md");
        std::fs::write(&path, summary.to_markdown())?;
        info!(path = %path.display(), "wrote summary");
    }

    println!("{}", summary.to_ascii_table());
    println!("Wrote {} tables to {}", paths.len(), out.display());

    Ok(())
}

fn print_catalog(catalog: &MetricCatalog) {
    println!("\nMetric Catalog");
    println!("{}", "=".repeat(80));

    for spec in catalog.specs() {
        let mut traits = Vec::new();
        if spec.is_ytd {
            traits.push("ytd");
        }
        if spec.magnitude_only {
            traits.push("magnitude");
        }
        if spec.normalize_scale {
            traits.push("scaled");
        }
        let traits = if traits.is_empty() { "-".to_string() } else { traits.join(", ") };

        println!("\n{} ({}:{}) [{}]", spec.metric, spec.namespace, spec.unit, traits);
        println!("{}", "-".repeat(80));
        for (priority, tag) in spec.tags.iter().enumerate() {
            println!("  {:>2}. {}", priority, tag);
        }
    }
    println!();
}
