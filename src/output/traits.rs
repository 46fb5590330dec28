//! Output sink trait and errors
//!
//! This module defines the interface every result sink implements, plus the
//! errors a sink can raise.

use crate::output::row::ResultRow;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for completed job results
///
/// Implementations must be thread-safe: rows may arrive from any worker, and
/// each call must write the whole row or nothing.
pub trait ResultSink: Send + Sync {
    /// Appends one row
    fn append(&self, row: &ResultRow) -> SinkResult<()>;
}
