//! Configuration module for Price-Ripple
//!
//! This module handles loading, parsing, and validating configuration files.
//! JSON is the primary format; TOML is accepted for files ending in `.toml`.
//!
//! # Example
//!
//! ```no_run
//! use price_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config/config.json")).unwrap();
//! println!("{} jobs across {} workers", config.job_count(), config.num_processes);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CaptchaConfig, Config, PacingConfig, StoreEntry};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_json, parse_toml};
