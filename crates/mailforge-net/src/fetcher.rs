//! Blocking fetch collaborator
//!
//! Requests are blocking and run on smol's blocking pool, so the async
//! helpers stay runtime-agnostic and tests can swap in a canned fetcher.

use std::time::Duration;

use reqwest::redirect::Policy;
use url::Url;

use crate::{NetError, Response};

/// Desktop browser user agent; font services pick the stylesheet flavor by it
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Performs a single GET
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> Result<Response, NetError>;
}

/// reqwest-backed fetcher following at most one redirect
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, NetError> {
        Self::with_user_agent(BROWSER_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(1))
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str, timeout: Duration) -> Result<Response, NetError> {
        let parsed = Url::parse(url).map_err(|e| NetError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NetError::InvalidUrl(url.to_string()));
        }

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .map_err(|e| NetError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| NetError::Network(e.to_string()))?
            .to_vec();

        Ok(Response { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_urls() {
        let fetcher = HttpFetcher::new().unwrap();
        assert!(matches!(
            fetcher.get("ftp://example.test/a.css", Duration::from_secs(1)),
            Err(NetError::InvalidUrl(_))
        ));
        assert!(matches!(
            fetcher.get("not a url", Duration::from_secs(1)),
            Err(NetError::InvalidUrl(_))
        ));
    }
}
