//! State module for per-worker network sessions
//!
//! Every worker owns one `SessionState`. It is never shared, so the same domain
//! may be warmed up independently by several workers.
//!
//! # Components
//!
//! - `SessionState`: The browser identity and the set of warmed-up domains
//! - `BrowserFingerprint`: User agent plus matching client hint headers
//! - `DomainPhase`: Whether a domain still needs its warm-up request

mod session_state;

// Re-export main types
pub use session_state::{
    BrowserFingerprint, ClientHints, DomainPhase, SessionState, BROWSER_PROFILES,
};
