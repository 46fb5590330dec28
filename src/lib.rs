//! Price-Ripple: a parallel product-data harvester
//!
//! This crate fans a list of (store, URL) jobs out across a bounded worker pool,
//! fetches each product page through an anti-bot aware downloader, extracts a
//! normalized product record with a per-store strategy, and appends every result
//! to a single CSV table.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Price-Ripple operations
///
/// Only setup failures surface here. Per-job failures are recorded in the
/// output table and never abort a run.
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Writer task failed: {0}")]
    Writer(String),

    #[error("Run incomplete: {written} of {total} jobs produced a row")]
    Incomplete { written: usize, total: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Price-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{expand_jobs, process_job, Downloader, FetchError, Job, Orchestrator};
pub use extract::{Availability, ExtractError, ProductExtractor, ProductRecord, StrategyRegistry};
pub use output::{CsvSink, ResultRow, ResultSink, RunSummary};
pub use state::SessionState;
