//! Output module for the harvested results table
//!
//! This module handles:
//! - The `ResultRow` written once per job
//! - The lock-guarded CSV sink every row ends up in
//! - Run statistics reported when the batch completes

mod csv_sink;
mod row;
pub mod stats;
mod traits;

pub use csv_sink::{ensure_dir, CsvSink};
pub use row::{ResultRow, HEADER};
pub use stats::{print_summary, RunSummary};
pub use traits::{ResultSink, SinkError, SinkResult};

/// File name of the results table inside `output_dir`
pub const RESULTS_FILE: &str = "results.csv";

/// File name of the log file inside `logs_dir`
pub const LOG_FILE: &str = "crawler.log";
