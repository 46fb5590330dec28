//! Anti-bot aware HTTP downloader
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with a cookie store per session
//! - Browser-like request headers matching the session's fingerprint
//! - Domain warm-up before the first product request
//! - Block, captcha and status classification
//! - Retry with backoff and session rotation after a block

use crate::config::{CaptchaConfig, Config, PacingConfig};
use crate::crawler::retry::RetryPolicy;
use crate::state::{BrowserFingerprint, DomainPhase, SessionState};
use crate::url::{extract_domain, origin_root};
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Locale of the target market
const ACCEPT_LANGUAGE_CZ: &str = "cs-CZ,cs;q=0.9,en;q=0.8";

const SEC_FETCH_DEST: &str = "sec-fetch-dest";
const SEC_FETCH_MODE: &str = "sec-fetch-mode";
const SEC_FETCH_SITE: &str = "sec-fetch-site";
const SEC_FETCH_USER: &str = "sec-fetch-user";
const SEC_CH_UA: &str = "sec-ch-ua";
const SEC_CH_UA_MOBILE: &str = "sec-ch-ua-mobile";
const SEC_CH_UA_PLATFORM: &str = "sec-ch-ua-platform";

/// Referers for stores that reject direct navigation to their home page
const BUILTIN_REFERERS: &[(&str, &str)] = &[("alza", "https://www.google.com/")];

/// Errors that end a fetch without HTML
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Blocked by anti-bot protection on {domain} (HTTP 403)")]
    Blocked { domain: String },

    #[error("Captcha challenge detected on {domain}")]
    Captcha { domain: String },

    #[error("Page not found: {url} (HTTP 404)")]
    NotFound { url: String },

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    /// True when the store actively refused us rather than failing
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Blocked { .. } | Self::Captcha { .. })
    }

    /// True when another attempt may succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Blocked { .. } | Self::Captcha { .. } | Self::Transport(_) => true,
            Self::HttpStatus { status } => *status == 429 || (500..600).contains(status),
            Self::NotFound { .. } | Self::InvalidUrl { .. } => false,
        }
    }
}

/// Errors of the best-effort warm-up request
///
/// Never surfaced to the job; logged at debug level and dropped.
#[derive(Debug, Error)]
pub enum WarmupError {
    #[error("warm-up request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("warm-up answered HTTP {0}")]
    Status(u16),
}

/// Result of a fetch: the page HTML or the reason there is none
pub type FetchOutcome = Result<String, FetchError>;

/// Detects captcha walls served with a success status
///
/// Challenge pages are small; real product pages are not. A body below the
/// size threshold that mentions one of the marker terms is treated as a block.
#[derive(Debug, Clone)]
pub struct CaptchaHeuristic {
    enabled: bool,
    max_body_bytes: usize,
    markers: Vec<String>,
}

impl CaptchaHeuristic {
    pub fn new(max_body_bytes: usize, markers: &[String]) -> Self {
        Self {
            enabled: true,
            max_body_bytes,
            markers: markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// A heuristic that never fires
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_body_bytes: 0,
            markers: Vec::new(),
        }
    }

    pub fn from_config(config: &CaptchaConfig) -> Self {
        if config.enabled {
            Self::new(config.max_body_bytes, &config.markers)
        } else {
            Self::disabled()
        }
    }

    pub fn is_challenge(&self, body: &str) -> bool {
        if !self.enabled || body.len() >= self.max_body_bytes {
            return false;
        }
        let lowered = body.to_lowercase();
        self.markers.iter().any(|m| lowered.contains(m.as_str()))
    }
}

impl Default for CaptchaHeuristic {
    fn default() -> Self {
        Self::from_config(&CaptchaConfig::default())
    }
}

/// Settings shared by every downloader of a run
#[derive(Debug, Clone)]
pub struct DownloaderOptions {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub pacing: PacingConfig,
    pub captcha: CaptchaHeuristic,

    /// Warm-up referer per store type, overriding the built-in ones
    pub referers: HashMap<String, String>,
}

impl DownloaderOptions {
    pub fn from_config(config: &Config) -> Self {
        let referers = config
            .stores
            .iter()
            .filter_map(|s| {
                let referer = config.referer_for(&s.store_type)?;
                Some((s.store_type.clone(), referer.to_string()))
            })
            .collect();

        Self {
            timeout: Duration::from_secs(config.timeout),
            retry: RetryPolicy::from_config(config),
            pacing: config.pacing.clone(),
            captcha: CaptchaHeuristic::from_config(&config.captcha),
            referers,
        }
    }

    /// Referer to send when warming up a store's domain
    pub fn referer_for(&self, store: &str) -> Option<&str> {
        self.referers.get(store).map(String::as_str).or_else(|| {
            BUILTIN_REFERERS
                .iter()
                .find(|(s, _)| *s == store)
                .map(|(_, referer)| *referer)
        })
    }
}

impl Default for DownloaderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            pacing: PacingConfig::default(),
            captcha: CaptchaHeuristic::default(),
            referers: HashMap::new(),
        }
    }
}

/// How a request presents itself to the server
#[derive(Debug, Clone, Copy)]
enum Framing<'a> {
    /// First visit: typed into the address bar or arriving from `referer`
    Navigate { referer: Option<&'a str> },

    /// Following a link within an already visited site
    SameOrigin { referer: &'a str },
}

/// Builds an HTTP client for one session
///
/// Each client has its own cookie jar; replacing the client discards every
/// cookie the stores have set.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .cookie_store(true)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Browser request headers for the given fingerprint and framing
fn browser_headers(fingerprint: &BrowserFingerprint, framing: Framing<'_>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(fingerprint.user_agent));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_CZ));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("document"));
    headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("navigate"));
    headers.insert(SEC_FETCH_USER, HeaderValue::from_static("?1"));

    if let Some(hints) = fingerprint.client_hints {
        headers.insert(SEC_CH_UA, HeaderValue::from_static(hints.brands));
        headers.insert(SEC_CH_UA_MOBILE, HeaderValue::from_static("?0"));
        headers.insert(SEC_CH_UA_PLATFORM, HeaderValue::from_static(hints.platform));
    }

    let (site, referer) = match framing {
        Framing::Navigate { referer: None } => ("none", None),
        Framing::Navigate {
            referer: Some(referer),
        } => ("cross-site", Some(referer)),
        Framing::SameOrigin { referer } => ("same-origin", Some(referer)),
    };
    headers.insert(SEC_FETCH_SITE, HeaderValue::from_static(site));

    if let Some(referer) = referer {
        match HeaderValue::from_str(referer) {
            Ok(value) => {
                headers.insert(REFERER, value);
            }
            Err(_) => tracing::trace!("Dropping referer with invalid characters: {}", referer),
        }
    }

    headers
}

/// Picks a random duration within an inclusive millisecond range
fn pause_duration([min, max]: [u64; 2]) -> Duration {
    let millis = if min >= max {
        max
    } else {
        rand::rng().random_range(min..=max)
    };
    Duration::from_millis(millis)
}

async fn pause(range: [u64; 2]) {
    let duration = pause_duration(range);
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn transport_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Transport(format!("Request timeout after {}s", timeout.as_secs()))
    } else if error.is_connect() {
        FetchError::Transport(format!("Connection failed: {}", error))
    } else {
        FetchError::Transport(error.to_string())
    }
}

/// Downloader owning one network session
///
/// Each worker owns exactly one downloader; its warm-up state and cookies
/// are never shared.
pub struct Downloader {
    client: Client,
    session: SessionState,
    options: Arc<DownloaderOptions>,
}

impl Downloader {
    /// Creates a downloader with a fresh session
    pub fn new(options: Arc<DownloaderOptions>) -> Result<Self, reqwest::Error> {
        Self::with_session(options, SessionState::new())
    }

    /// Creates a downloader with the given session state
    pub fn with_session(
        options: Arc<DownloaderOptions>,
        session: SessionState,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(options.timeout)?;
        Ok(Self {
            client,
            session,
            options,
        })
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Fetches a product page
    ///
    /// # Request Flow
    ///
    /// 1. Warm up the origin if this session has not visited its root yet
    /// 2. Wait a randomized delay
    /// 3. GET the page with headers matching the origin's phase
    /// 4. Classify the response
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 403 / captcha | Rotate session, retry after backoff |
    /// | HTTP 429, 5xx | Retry after backoff |
    /// | Transport error | Retry after backoff |
    /// | HTTP 404 | Immediate → NotFound |
    /// | Other non-2xx | Immediate → HttpStatus |
    ///
    /// # Arguments
    ///
    /// * `url` - The product page URL
    /// * `store` - Store type, selecting the warm-up referer
    pub async fn fetch(&mut self, url: &str, store: &str) -> FetchOutcome {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let (domain, root) = match (extract_domain(&parsed), origin_root(&parsed)) {
            (Some(domain), Some(root)) => (domain, root),
            _ => {
                return Err(FetchError::InvalidUrl {
                    url: url.to_string(),
                    message: "URL has no host".to_string(),
                })
            }
        };

        let mut attempt = 0;
        loop {
            let error = match self.fetch_once(&parsed, &domain, &root, store).await {
                Ok(html) => return Ok(html),
                Err(error) => error,
            };

            if !error.is_retriable() || attempt >= self.options.retry.max_retries {
                return Err(error);
            }

            let delay = self.options.retry.delay_for(attempt);
            tracing::warn!(
                "Fetch of {} failed ({}), retry {}/{} in {:.1}s",
                url,
                error,
                attempt + 1,
                self.options.retry.max_retries,
                delay.as_secs_f64()
            );

            if error.is_block() {
                self.rotate_session();
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_once(
        &mut self,
        url: &Url,
        domain: &str,
        root: &str,
        store: &str,
    ) -> FetchOutcome {
        if self.session.phase(root) == DomainPhase::Cold {
            match self.warm_up(root, store).await {
                Ok(()) => {
                    tracing::debug!("Warmed up {}", root);
                    self.session.mark_warmed(root);
                    pause(self.options.pacing.warmup_pause_ms).await;
                }
                Err(e) => tracing::debug!("Warm-up of {} failed, continuing: {}", root, e),
            }
        }

        pause(self.options.pacing.request_delay_ms).await;

        let framing = match self.session.phase(root) {
            DomainPhase::Warmed => Framing::SameOrigin { referer: root },
            DomainPhase::Cold => Framing::Navigate {
                referer: self.options.referer_for(store),
            },
        };
        let headers = browser_headers(self.session.fingerprint(), framing);

        let response = self
            .client
            .get(url.as_str())
            .headers(headers)
            .send()
            .await
            .map_err(|e| transport_error(e, self.options.timeout))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::Blocked {
                domain: domain.to_string(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.options.timeout))?;

        if self.options.captcha.is_challenge(&body) {
            return Err(FetchError::Captcha {
                domain: domain.to_string(),
            });
        }

        Ok(body)
    }

    /// Visits the domain root to collect the cookies the store expects
    async fn warm_up(&self, root: &str, store: &str) -> Result<(), WarmupError> {
        let headers = browser_headers(
            self.session.fingerprint(),
            Framing::Navigate {
                referer: self.options.referer_for(store),
            },
        );

        let response = self.client.get(root).headers(headers).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WarmupError::Status(status.as_u16()));
        }

        // Drain the body so cookies set by streamed responses are kept
        response.bytes().await?;
        Ok(())
    }

    /// Starts over with a new identity and an empty cookie jar
    fn rotate_session(&mut self) {
        match build_http_client(self.options.timeout) {
            Ok(client) => self.client = client,
            Err(e) => tracing::warn!("Keeping previous HTTP client after block: {}", e),
        }
        self.session.rotate();
        tracing::debug!(
            "Rotated session (rotation {}), new user agent: {}",
            self.session.rotations(),
            self.session.fingerprint().user_agent
        );
    }
}
