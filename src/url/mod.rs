//! URL helpers for Price-Ripple
//!
//! The downloader keys its warm-up state by domain and needs the root page of
//! every origin it talks to. Both are derived here.

mod domain;

pub use domain::{extract_domain, origin_root};
