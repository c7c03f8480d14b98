//! mailforge Networking
//!
//! Best-effort network helpers used after rendering: resolving font
//! stylesheets for inlining into AMP documents, and replacing placeholder
//! image dimensions with the real ones. Failures never surface to callers;
//! they resolve to "no data" for the URL involved.

mod fetcher;
mod fonts;
mod images;

use std::time::Duration;

pub use fetcher::{Fetcher, HttpFetcher, BROWSER_USER_AGENT};
pub use fonts::{extract_import_urls, fetch_font_css, strip_imports};
pub use images::{backfill_image_dimensions, image_candidates, sniff_dimensions, ImageCandidate};

/// HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Limits for a batch of concurrent fetches
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per request
    pub timeout: Duration,
    /// Requests in flight at once
    pub concurrency: usize,
    /// URLs containing any of these are never fetched
    pub template_markers: Vec<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(8000),
            concurrency: 8,
            template_markers: ["{{", "}}", "[[", "]]"].iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_template_markers(mut self, markers: Vec<String>) -> Self {
        self.template_markers = markers;
        self
    }
}

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Decode error: {0}")]
    Decode(String),
}
