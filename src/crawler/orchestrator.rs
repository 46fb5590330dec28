//! Job orchestrator - runs a batch of jobs across the worker pool
//!
//! This module coordinates a harvest run:
//! - Preparing output directories and a fresh results table
//! - Expanding the configuration into jobs
//! - Running workers that each own one downloader session
//! - Streaming rows to a single writer task
//! - Producing the run summary

use crate::config::Config;
use crate::crawler::downloader::{Downloader, DownloaderOptions};
use crate::crawler::job::{expand_jobs, Job};
use crate::extract::{ExtractError, ProductExtractor, StrategyRegistry};
use crate::output::{
    ensure_dir, CsvSink, ResultRow, ResultSink, RunSummary, SinkError, RESULTS_FILE,
};
use crate::{Result, RippleError};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Rows buffered between workers and the writer
const ROW_CHANNEL_CAPACITY: usize = 64;

/// Pending jobs shared by the workers, consumed front to back
type JobQueue = Arc<Mutex<VecDeque<Job>>>;

/// Main harvest orchestrator
pub struct Orchestrator {
    config: Arc<Config>,
    registry: Arc<StrategyRegistry>,
    options: Arc<DownloaderOptions>,
    sink: Arc<CsvSink>,
    jobs: Vec<Job>,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// Creates `output_dir` and `logs_dir` if missing and replaces any
    /// existing results table with one holding only the header.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `registry` - Extraction strategies available to the run
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(RippleError)` - A directory or the results table could not be created
    pub fn new(config: Config, registry: StrategyRegistry) -> Result<Self> {
        let output_dir = Path::new(&config.output_dir);
        ensure_dir(output_dir)?;
        ensure_dir(Path::new(&config.logs_dir))?;

        let sink = CsvSink::create(output_dir.join(RESULTS_FILE))?;
        tracing::debug!("Results table created at {}", sink.path().display());

        let options = DownloaderOptions::from_config(&config);
        let jobs = expand_jobs(&config);

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            options: Arc::new(options),
            sink: Arc::new(sink),
            jobs,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn results_path(&self) -> &Path {
        self.sink.path()
    }

    /// Runs every job once and waits for all rows to be written
    ///
    /// Per-job failures end up in the `error` column and never abort the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let total = self.jobs.len();
        let workers = self.config.num_processes.min(total);
        let start = Instant::now();

        tracing::info!("Starting crawl: {} jobs across {} workers", total, workers);

        let queue: JobQueue = Arc::new(Mutex::new(self.jobs.iter().cloned().collect()));
        let (tx, rx) = mpsc::channel(ROW_CHANNEL_CAPACITY);

        let sink = Arc::clone(&self.sink);
        let writer = tokio::task::spawn_blocking(move || write_rows(sink.as_ref(), rx, total));

        let mut pool = JoinSet::new();
        for id in 0..workers {
            let downloader = Downloader::new(Arc::clone(&self.options))?;
            pool.spawn(run_worker(
                id,
                downloader,
                Arc::clone(&self.registry),
                Arc::clone(&queue),
                tx.clone(),
            ));
        }
        drop(tx);

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let (mut summary, sink_error) = writer
            .await
            .map_err(|e| RippleError::Writer(e.to_string()))?;
        summary.finish(start.elapsed());

        tracing::info!(
            "Finished crawl: {} products in {:.2}s ({} failed)",
            summary.rows_written(),
            summary.elapsed.as_secs_f64(),
            summary.failed
        );

        if let Some(e) = sink_error {
            return Err(e.into());
        }
        ensure_complete(&summary)?;

        Ok(summary)
    }
}

/// Fails when a job produced no row, as happens when its worker panicked
fn ensure_complete(summary: &RunSummary) -> Result<()> {
    let written = summary.rows_written();
    if written < summary.total_jobs {
        tracing::error!(
            "{} of {} jobs produced no row",
            summary.total_jobs - written,
            summary.total_jobs
        );
        return Err(RippleError::Incomplete {
            written,
            total: summary.total_jobs,
        });
    }
    Ok(())
}

/// Executes one job: fetch, extract, and build its row
///
/// Never fails; every error is captured in the returned row.
pub async fn process_job(
    downloader: &mut Downloader,
    registry: &StrategyRegistry,
    job: &Job,
) -> ResultRow {
    let strategy = match registry.get(&job.store_type) {
        Some(strategy) => Arc::clone(strategy),
        None => {
            let error = ExtractError::UnknownStore(job.store_type.clone());
            tracing::warn!("Job failed for {}: {}", job.url, error);
            return ResultRow::failure(&job.url, &job.store_type, error);
        }
    };

    let html = match downloader.fetch(&job.url, &job.store_type).await {
        Ok(html) => html,
        Err(error) => {
            tracing::warn!("Job failed for {}: {}", job.url, error);
            return ResultRow::failure(&job.url, &job.store_type, error);
        }
    };

    match extract_guarded(strategy.as_ref(), &html, &job.url) {
        Ok(record) => {
            tracing::debug!("Extracted '{}' from {}", record.name, job.url);
            ResultRow::success(record)
        }
        Err(error) => {
            tracing::warn!("Job failed for {}: {}", job.url, error);
            ResultRow::failure(&job.url, &job.store_type, error)
        }
    }
}

/// Runs a strategy, turning a panic into an extraction error
fn extract_guarded(
    strategy: &dyn ProductExtractor,
    html: &str,
    url: &str,
) -> std::result::Result<crate::extract::ProductRecord, ExtractError> {
    panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(html, url)))
        .unwrap_or_else(|payload| Err(ExtractError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn run_worker(
    id: usize,
    mut downloader: Downloader,
    registry: Arc<StrategyRegistry>,
    queue: JobQueue,
    rows: mpsc::Sender<ResultRow>,
) {
    tracing::trace!("Worker {} started", id);

    loop {
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some(job) = next else { break };

        let row = process_job(&mut downloader, &registry, &job).await;
        if rows.send(row).await.is_err() {
            tracing::error!("Writer stopped, worker {} exiting", id);
            break;
        }
    }

    tracing::debug!(
        "Worker {} finished ({} domains warmed, {} session rotations)",
        id,
        downloader.session().warmed_count(),
        downloader.session().rotations()
    );
}

/// Drains the row channel into the sink
///
/// Runs on a blocking thread. A failed append is logged and counted; the
/// first such error is returned alongside the summary.
fn write_rows(
    sink: &dyn ResultSink,
    mut rows: mpsc::Receiver<ResultRow>,
    total: usize,
) -> (RunSummary, Option<SinkError>) {
    let mut summary = RunSummary::new(total);
    let mut first_error = None;

    while let Some(row) = rows.blocking_recv() {
        match sink.append(&row) {
            Ok(()) => summary.record(&row),
            Err(e) => {
                tracing::error!("Failed to write row for {}: {}", row.url(), e);
                first_error.get_or_insert(e);
            }
        }

        let written = summary.rows_written();
        if written > 0 && written % 10 == 0 {
            tracing::info!("Progress: {}/{} rows written", written, total);
        }
    }

    (summary, first_error)
}
