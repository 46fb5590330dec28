//! Price-Ripple main entry point
//!
//! This is the command-line interface for the Price-Ripple product harvester.

use anyhow::Context;
use clap::Parser;
use price_ripple::config::{load_config_with_hash, Config};
use price_ripple::crawler::{expand_jobs, Orchestrator};
use price_ripple::extract::StrategyRegistry;
use price_ripple::output::{ensure_dir, print_summary, LOG_FILE};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Price-Ripple: a parallel product-data harvester
///
/// Price-Ripple fetches product pages from several e-shops in parallel,
/// warming up each domain like a browser would, extracts name, price,
/// availability and image from the page metadata, and collects every result
/// in one CSV table.
#[derive(Parser, Debug)]
#[command(name = "price-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A parallel product-data harvester", long_about = None)]
struct Cli {
    /// Path to JSON (or .toml) configuration file
    #[arg(value_name = "CONFIG", default_value = "config/config.json")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the jobs without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let log_file = if cli.dry_run {
        None
    } else {
        Some(open_log_file(Path::new(&config.logs_dir))?)
    };
    setup_logging(cli.verbose, cli.quiet, log_file);

    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, cli.quiet).await
}

/// Opens `<logs_dir>/crawler.log` for appending, creating the directory
fn open_log_file(logs_dir: &Path) -> anyhow::Result<File> {
    ensure_dir(logs_dir)?;
    let path = logs_dir.join(LOG_FILE);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events go to stdout and, when given, to the log file without ANSI colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<File>) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("price_ripple=info,warn"),
            1 => EnvFilter::new("price_ripple=debug,info"),
            _ => EnvFilter::new("price_ripple=trace,debug"),
        }
    };

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(file_layer)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) {
    println!("=== Price-Ripple Dry Run ===\n");

    println!("Harvest Configuration:");
    println!("  Workers: {}", config.num_processes);
    println!("  Timeout: {}s", config.timeout);
    println!(
        "  Retries: {} (backoff factor {}, max {}s)",
        config.retry_count, config.backoff_factor, config.max_backoff_secs
    );
    println!(
        "  Pacing: warm-up {:?}ms, requests {:?}ms",
        config.pacing.warmup_pause_ms, config.pacing.request_delay_ms
    );

    println!("\nOutput:");
    println!("  Results: {}/results.csv", config.output_dir);
    println!("  Logs: {}/{}", config.logs_dir, LOG_FILE);

    let registry = StrategyRegistry::with_defaults();
    println!("\nStores ({}):", config.stores.len());
    for store in &config.stores {
        let marker = if registry.get(&store.store_type).is_some() {
            ""
        } else {
            " [no extraction strategy]"
        };
        println!("  - {} ({} URLs){}", store.store_type, store.urls.len(), marker);
    }

    let jobs = expand_jobs(config);
    println!("\nJobs ({}):", jobs.len());
    for job in &jobs {
        println!("  * [{}] {}", job.store_type, job.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, quiet: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Stores: {}, jobs: {}, workers: {}",
        config.stores.len(),
        config.job_count(),
        config.num_processes
    );

    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults())
        .context("Failed to prepare output")?;

    let summary = match orchestrator.run().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    if !quiet {
        println!();
        print_summary(&summary);
        println!("\nResults written to {}", orchestrator.results_path().display());
    }

    Ok(())
}
