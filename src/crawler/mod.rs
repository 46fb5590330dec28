//! Crawler module for fetching and processing product pages
//!
//! This module contains the core harvesting logic, including:
//! - Job expansion from the configuration
//! - HTTP fetching with warm-up, block detection and retry
//! - Worker pool coordination and result streaming

mod downloader;
mod job;
mod orchestrator;
mod retry;

pub use downloader::{
    build_http_client, CaptchaHeuristic, Downloader, DownloaderOptions, FetchError, FetchOutcome,
    WarmupError,
};
pub use job::{expand_jobs, Job};
pub use orchestrator::{process_job, Orchestrator};
pub use retry::RetryPolicy;
