//! Run statistics
//!
//! Collected by the writer task while rows stream into the sink, and reported
//! once every job has finished.

use crate::output::row::ResultRow;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of jobs submitted
    pub total_jobs: usize,

    /// Rows written with a product
    pub succeeded: usize,

    /// Rows written with an error
    pub failed: usize,

    /// Failed rows per store
    pub failures_by_store: BTreeMap<String, usize>,

    /// Wall-clock time from dispatch to the last row
    pub elapsed: Duration,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// Starts an empty summary for `total_jobs` jobs
    pub fn new(total_jobs: usize) -> Self {
        Self {
            total_jobs,
            succeeded: 0,
            failed: 0,
            failures_by_store: BTreeMap::new(),
            elapsed: Duration::ZERO,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Counts a written row
    pub fn record(&mut self, row: &ResultRow) {
        if row.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            *self
                .failures_by_store
                .entry(row.store().to_string())
                .or_insert(0) += 1;
        }
    }

    /// Number of rows written so far
    pub fn rows_written(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Marks the run as finished
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.finished_at = Some(Utc::now());
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let written = self.rows_written();
        if written == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / written as f64) * 100.0
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Overview:");
    println!("  Jobs submitted: {}", summary.total_jobs);
    println!("  Products extracted: {}", summary.succeeded);
    println!("  Failed jobs: {}", summary.failed);
    println!("  Elapsed: {:.2}s", summary.elapsed.as_secs_f64());
    println!();

    if !summary.failures_by_store.is_empty() {
        println!("Failures by Store:");
        for (store, count) in &summary.failures_by_store {
            println!("  {}: {}", store, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} jobs)",
        summary.success_rate(),
        summary.succeeded,
        summary.rows_written()
    );
}
