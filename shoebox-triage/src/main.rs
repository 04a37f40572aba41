//! shoebox-triage: batch image classification over a vision model
//!
//! Subcommands `photos` and `tattoos` run the two classification
//! pipelines against one shared engine; `summary` is read-side analytics
//! over an existing ledger.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use shoebox_common::config::load_default_config;
use shoebox_triage::config::resolve_api_key;
use shoebox_triage::services::batch_driver::BatchDriver;
use shoebox_triage::services::classifier::ClassificationClient;
use shoebox_triage::services::ledger::{LedgerIndex, LedgerWriter};
use shoebox_triage::services::rate_governor::{RateGovernor, DEFAULT_DAILY_LIMIT};
use shoebox_triage::services::scanner::{self, ImageScanner};
use shoebox_triage::services::summary;
use shoebox_triage::services::vision_client::VisionClient;
use shoebox_triage::types::{PipelineSpec, StopReason};

#[derive(Parser)]
#[command(
    name = "shoebox-triage",
    version,
    about = "Batch-classify personal image collections with a vision model"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify personal photos into the photo ledger
    Photos(RunArgs),
    /// Classify tattoo images into the tattoo ledger
    Tattoos(RunArgs),
    /// Summarize an existing ledger (read-only)
    Summary {
        /// Ledger file to analyze
        #[arg(long)]
        ledger: PathBuf,
        /// Attribute column to aggregate
        #[arg(long, default_value = "Category")]
        column: String,
        /// Number of top entries to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Folder to scan for images
    #[arg(long)]
    root: Option<PathBuf>,
    /// Ledger CSV to append to (pipeline default when omitted)
    #[arg(long)]
    ledger: Option<PathBuf>,
    /// Process only a random sample of this many images
    #[arg(long)]
    sample: Option<usize>,
    /// Maximum classification calls for this run
    #[arg(long)]
    daily_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Command::Photos(args) => run_pipeline(PipelineSpec::photos(), args).await,
        Command::Tattoos(args) => run_pipeline(PipelineSpec::tattoos(), args).await,
        Command::Summary {
            ledger,
            column,
            top,
        } => summarize(&ledger, &column, top),
    }
}

async fn run_pipeline(spec: &'static PipelineSpec, args: RunArgs) -> Result<()> {
    info!("Starting shoebox-triage ({} pipeline)", spec.name);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = load_default_config();

    // Setup failures abort here, before any file is touched
    let api_key = resolve_api_key(&config)?;
    let vision = VisionClient::new(api_key)?;

    let root = args
        .root
        .or_else(|| config.root_folder.clone().map(PathBuf::from))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No image folder specified. Pass --root or set root_folder in the config file"
            )
        })?;
    let ledger = args
        .ledger
        .or_else(|| config.ledger.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(spec.default_ledger));
    let daily_limit = args
        .daily_limit
        .or(config.daily_limit)
        .unwrap_or(DEFAULT_DAILY_LIMIT);

    info!("Looking for images in: {}", root.display());
    info!("Ledger: {}", ledger.display());

    let index = LedgerIndex::load(&ledger, spec);
    info!("Found {} previously processed images", index.len());

    let files = ImageScanner::new().scan(&root)?;
    let candidates = scanner::exclude_known(files, &index);
    info!(
        "Found {} images that haven't been processed yet",
        candidates.len()
    );

    let candidates = match args.sample {
        Some(n) if n < candidates.len() => {
            info!("Taking random sample of {} images", n);
            scanner::sample(candidates, n)
        }
        _ => candidates,
    };

    let writer = LedgerWriter::open(&ledger, spec)?;
    let driver = BatchDriver::new(
        ClassificationClient::new(vision, spec),
        RateGovernor::new(daily_limit),
        spec,
        index,
        writer,
    );
    let report = driver.run(candidates).await?;

    if report.stop_reason == StopReason::DailyLimitReached {
        info!("Remaining images will be picked up by the next run");
    }
    info!(
        "Total new images processed: {} ({} failed)",
        report.stats.processed, report.stats.failed
    );

    // Post-run analytics, same as the standalone summary subcommand
    report_summary(&ledger, spec, 10)
}

fn report_summary(ledger: &Path, spec: &PipelineSpec, top: usize) -> Result<()> {
    if !ledger.exists() {
        info!("No results file found.");
        return Ok(());
    }

    let primary = spec.fields[0].label;
    let rows = summary::distribution(ledger, primary)?;
    let total: usize = rows.iter().map(|r| r.count).sum();

    info!("=== ANALYSIS SUMMARY ===");
    info!("Total images processed: {}", total);
    summary::print_top(&format!("Top {} values", primary), &rows, top);

    if let Some(column) = spec.secondary_summary {
        let secondary_rows = summary::distribution(ledger, column)?;
        summary::print_top(&format!("{} distribution", column), &secondary_rows, top);
    }

    let out = summary::summary_path(ledger);
    summary::write_summary(&rows, &out)?;
    info!("Detailed analysis saved to {}", out.display());
    Ok(())
}

fn summarize(ledger: &Path, column: &str, top: usize) -> Result<()> {
    if !ledger.exists() {
        info!("No results file found.");
        return Ok(());
    }

    let rows = summary::distribution(ledger, column)?;
    let total: usize = rows.iter().map(|r| r.count).sum();
    info!("Total images processed: {}", total);
    summary::print_top(&format!("Top {} values", column), &rows, top);

    let out = summary::summary_path(ledger);
    summary::write_summary(&rows, &out)?;
    info!("Detailed analysis saved to {}", out.display());
    Ok(())
}
