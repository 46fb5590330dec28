use serde::Deserialize;

/// Main configuration structure for Price-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Stores to harvest, each with its product URLs
    #[serde(default)]
    pub stores: Vec<StoreEntry>,

    /// Number of parallel workers
    #[serde(default = "default_num_processes")]
    pub num_processes: usize,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Directory receiving `results.csv`
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory receiving `crawler.log`
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,

    /// Extra attempts for a job after a retriable failure
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base delay (seconds) of the exponential backoff between attempts
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound (seconds) of a single backoff delay
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub captcha: CaptchaConfig,
}

/// A store and the product pages to fetch from it
#[derive(Debug, Clone, Deserialize)]
pub struct StoreEntry {
    /// Store identifier, used to pick the extraction strategy (e.g. "alza")
    #[serde(rename = "type")]
    pub store_type: String,

    /// Product page URLs, fetched in the listed order
    #[serde(default)]
    pub urls: Vec<String>,

    /// Referer sent with warm-up requests, overriding the built-in one
    #[serde(default)]
    pub referer: Option<String>,
}

/// Randomized pauses that keep the request pattern from looking scripted
///
/// Ranges are inclusive `[min, max]` in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Pause after a successful warm-up request
    #[serde(default = "default_warmup_pause_ms")]
    pub warmup_pause_ms: [u64; 2],

    /// Pause before every product request
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: [u64; 2],
}

impl PacingConfig {
    /// No pauses at all
    pub fn none() -> Self {
        Self {
            warmup_pause_ms: [0, 0],
            request_delay_ms: [0, 0],
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            warmup_pause_ms: default_warmup_pause_ms(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// Soft-block detection for pages served with a success status
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bodies at least this large are never treated as a captcha wall
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Case-insensitive terms that mark a captcha or robot check
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: default_max_body_bytes(),
            markers: default_markers(),
        }
    }
}

impl Config {
    /// Total number of jobs this configuration expands to
    pub fn job_count(&self) -> usize {
        self.stores.iter().map(|s| s.urls.len()).sum()
    }

    /// Referer override configured for a store type, if any
    pub fn referer_for(&self, store_type: &str) -> Option<&str> {
        self.stores
            .iter()
            .find(|s| s.store_type == store_type)
            .and_then(|s| s.referer.as_deref())
    }
}

fn default_num_processes() -> usize {
    4
}

fn default_timeout() -> u64 {
    5
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_logs_dir() -> String {
    "logs".to_string()
}

fn default_retry_count() -> u32 {
    1
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_max_backoff_secs() -> u64 {
    30
}

fn default_warmup_pause_ms() -> [u64; 2] {
    [300, 800]
}

fn default_request_delay_ms() -> [u64; 2] {
    [1100, 2800]
}

fn default_true() -> bool {
    true
}

fn default_max_body_bytes() -> usize {
    10 * 1024
}

fn default_markers() -> Vec<String> {
    vec!["captcha".to_string(), "robot".to_string()]
}
