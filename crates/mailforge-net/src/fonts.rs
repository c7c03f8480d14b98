//! Font stylesheet resolution
//!
//! Fetches font stylesheets, follows their `@import url(...)` references and
//! returns plain CSS with the imports removed, imported CSS first. Every URL
//! is fetched at most once per call.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use regex::Regex;
use url::Url;

use crate::{FetchOptions, Fetcher};

static IMPORT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+url\s*\(\s*["']?([^"')]+)["']?\s*\)\s*;?"#).unwrap()
});
static IMPORT_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)@import\s+[^;]+;?\s*").unwrap());

/// URLs referenced by `@import url(...)`
pub fn extract_import_urls(css: &str) -> Vec<String> {
    IMPORT_URL
        .captures_iter(css)
        .map(|caps| caps[1].trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

pub fn strip_imports(css: &str) -> String {
    IMPORT_RULE.replace_all(css, "").trim().to_string()
}

/// Resolve `urls` into one stylesheet. Unreachable URLs contribute nothing.
pub async fn fetch_font_css(fetcher: Arc<dyn Fetcher>, urls: &[String], options: &FetchOptions) -> String {
    if urls.is_empty() {
        return String::new();
    }

    let resolver = Arc::new(Resolver {
        fetcher,
        options: options.clone(),
        seen: Mutex::new(HashSet::new()),
    });

    let parts: Vec<String> = stream::iter(urls.to_vec())
        .map(|url| resolver.clone().resolve(url))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let css = join_non_empty(parts);
    tracing::debug!("Resolved {} font stylesheets into {} bytes", urls.len(), css.len());
    css
}

struct Resolver {
    fetcher: Arc<dyn Fetcher>,
    options: FetchOptions,
    seen: Mutex<HashSet<String>>,
}

impl Resolver {
    /// False when `url` was already claimed by another branch
    fn claim(&self, url: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.insert(url.to_string())
    }

    fn resolve(self: Arc<Self>, url: String) -> BoxFuture<'static, String> {
        async move {
            if !self.claim(&url) {
                return String::new();
            }

            let Some(text) = self.fetch_text(&url).await else {
                return String::new();
            };

            let imports: Vec<String> = extract_import_urls(&text)
                .into_iter()
                .filter_map(|import| absolute(&url, &import))
                .collect();
            let own = strip_imports(&text);
            if imports.is_empty() {
                return own;
            }

            let mut parts: Vec<String> = stream::iter(imports)
                .map(|import| self.clone().resolve(import))
                .buffered(self.options.concurrency.max(1))
                .collect()
                .await;
            parts.push(own);
            join_non_empty(parts)
        }
        .boxed()
    }

    async fn fetch_text(&self, url: &str) -> Option<String> {
        let fetcher = self.fetcher.clone();
        let timeout = self.options.timeout;
        let target = url.to_string();

        match smol::unblock(move || fetcher.get(&target, timeout)).await {
            Ok(response) if response.status == 200 => Some(String::from_utf8_lossy(&response.body).into_owned()),
            Ok(response) => {
                tracing::debug!("Font stylesheet {} answered {}", url, response.status);
                None
            }
            Err(e) => {
                tracing::warn!("Font stylesheet {} failed: {}", url, e);
                None
            }
        }
    }
}

fn absolute(base: &str, reference: &str) -> Option<String> {
    match Url::parse(reference) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(base).ok()?.join(reference).ok().map(|url| url.to_string()),
    }
}

fn join_non_empty(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
