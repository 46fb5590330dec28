use rand::seq::IndexedRandom;
use std::collections::HashSet;

/// Client hint headers sent by Chromium-based browsers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHints {
    /// `sec-ch-ua` brand list
    pub brands: &'static str,

    /// `sec-ch-ua-platform` value, quoted as browsers send it
    pub platform: &'static str,
}

/// A desktop browser identity presented to the stores
///
/// Firefox and Safari do not send client hints, so their profiles carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserFingerprint {
    pub user_agent: &'static str,
    pub client_hints: Option<ClientHints>,
}

/// Fixed pool of recent desktop browsers
pub const BROWSER_PROFILES: &[BrowserFingerprint] = &[
    BrowserFingerprint {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints {
            brands: r#""Chromium";v="124", "Google Chrome";v="124", "Not-A.Brand";v="99""#,
            platform: r#""Windows""#,
        }),
    },
    BrowserFingerprint {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints {
            brands: r#""Google Chrome";v="123", "Not:A-Brand";v="8", "Chromium";v="123""#,
            platform: r#""Windows""#,
        }),
    },
    BrowserFingerprint {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints {
            brands: r#""Chromium";v="124", "Google Chrome";v="124", "Not-A.Brand";v="99""#,
            platform: r#""macOS""#,
        }),
    },
    BrowserFingerprint {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        client_hints: None,
    },
    BrowserFingerprint {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
        client_hints: None,
    },
];

impl BrowserFingerprint {
    /// Picks a random profile from the pool
    pub fn random() -> Self {
        BROWSER_PROFILES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(BROWSER_PROFILES[0])
    }
}

/// Warm-up phase of a domain within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainPhase {
    /// Never visited in this session; the root page must be requested first
    Cold,

    /// Root page already visited; requests use same-origin framing
    Warmed,
}

/// Network identity of one worker
///
/// Holds the browser fingerprint and the domains already warmed up. Rotating
/// the session (after a block) picks a new fingerprint and forgets every
/// warmed domain, since the cookies that made them warm are gone too.
#[derive(Debug, Clone)]
pub struct SessionState {
    fingerprint: BrowserFingerprint,
    warmed: HashSet<String>,
    rotations: u32,
}

impl SessionState {
    /// Creates a session with a random fingerprint and no warmed domains
    pub fn new() -> Self {
        Self::with_fingerprint(BrowserFingerprint::random())
    }

    /// Creates a session with a fixed fingerprint
    pub fn with_fingerprint(fingerprint: BrowserFingerprint) -> Self {
        Self {
            fingerprint,
            warmed: HashSet::new(),
            rotations: 0,
        }
    }

    pub fn fingerprint(&self) -> &BrowserFingerprint {
        &self.fingerprint
    }

    /// Returns the warm-up phase of an origin, keyed by its root URL
    ///
    /// Origins on the same host but a different scheme or port are warmed
    /// separately.
    pub fn phase(&self, origin: &str) -> DomainPhase {
        if self.warmed.contains(origin) {
            DomainPhase::Warmed
        } else {
            DomainPhase::Cold
        }
    }

    /// Records a successful warm-up of an origin
    pub fn mark_warmed(&mut self, origin: &str) {
        self.warmed.insert(origin.to_string());
    }

    /// Number of origins warmed in this session
    pub fn warmed_count(&self) -> usize {
        self.warmed.len()
    }

    /// Number of times this session has been rotated
    pub fn rotations(&self) -> u32 {
        self.rotations
    }

    /// Replaces the identity after a block
    pub fn rotate(&mut self) {
        self.fingerprint = BrowserFingerprint::random();
        self.warmed.clear();
        self.rotations += 1;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
