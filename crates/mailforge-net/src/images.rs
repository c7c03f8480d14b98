//! Image dimension backfill
//!
//! Responsive `amp-img` tags carry placeholder dimensions until the real
//! ones are known. This fetches each distinct remote source once, sniffs
//! its header and rewrites `width`/`height` in place.

use std::collections::HashMap;
use std::io::Cursor;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

use futures::stream::{self, StreamExt};
use image::ImageReader;
use mailforge_amp::stages::attribute_value;
use regex::Regex;

use crate::{FetchOptions, Fetcher, NetError};

static AMP_IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<amp-img\s+([^>]*?)>").unwrap());
static HTTP_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());
static WIDTH_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)(^|\s)width=["'][^"']*["']"#).unwrap());
static HEIGHT_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)(^|\s)height=["'][^"']*["']"#).unwrap());

/// An `amp-img` opening tag eligible for backfill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Byte range of the opening tag
    pub range: Range<usize>,
    pub attrs: String,
    pub src: String,
}

/// Tags with a remote, template-free `src` and both dimensions present.
/// `layout="fixed"` tags keep their display size and are skipped.
pub fn image_candidates(html: &str, template_markers: &[String]) -> Vec<ImageCandidate> {
    AMP_IMG_TAG
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let attrs = caps[1].to_string();

            if attribute_value(&attrs, "layout").as_deref() == Some("fixed") {
                return None;
            }
            let src = attribute_value(&attrs, "src")?;
            attribute_value(&attrs, "width")?;
            attribute_value(&attrs, "height")?;

            if src.is_empty() || !HTTP_URL.is_match(&src) {
                return None;
            }
            if template_markers.iter().any(|marker| !marker.is_empty() && src.contains(marker.as_str())) {
                return None;
            }

            Some(ImageCandidate {
                range: whole.range(),
                attrs,
                src,
            })
        })
        .collect()
}

/// Pixel size from an image header
pub fn sniff_dimensions(bytes: &[u8]) -> Result<(u32, u32), NetError> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| NetError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| NetError::Decode(e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(NetError::Decode("zero-sized image".to_string()));
    }
    Ok((width, height))
}

/// Replace placeholder dimensions with sniffed ones. Sources that fail to
/// load or decode leave their tags untouched.
pub async fn backfill_image_dimensions(fetcher: Arc<dyn Fetcher>, html: &str, options: &FetchOptions) -> String {
    let candidates = image_candidates(html, &options.template_markers);
    if candidates.is_empty() {
        return html.to_string();
    }

    let mut sources: Vec<String> = Vec::new();
    for candidate in &candidates {
        if !sources.contains(&candidate.src) {
            sources.push(candidate.src.clone());
        }
    }

    let timeout = options.timeout;
    let sizes: HashMap<String, (u32, u32)> = stream::iter(sources)
        .map(|src| {
            let fetcher = fetcher.clone();
            async move {
                let url = src.clone();
                let result = smol::unblock(move || {
                    let response = fetcher.get(&url, timeout)?;
                    if !(200..300).contains(&response.status) {
                        return Err(NetError::HttpError { status: response.status });
                    }
                    sniff_dimensions(&response.body)
                })
                .await;
                (src, result)
            }
        })
        .buffer_unordered(options.concurrency.max(1))
        .filter_map(|(src, result)| async move {
            match result {
                Ok(size) => Some((src, size)),
                Err(e) => {
                    tracing::debug!("No dimensions for {}: {}", src, e);
                    None
                }
            }
        })
        .collect()
        .await;

    if sizes.is_empty() {
        return html.to_string();
    }

    let mut out = html.to_string();
    for candidate in candidates.iter().rev() {
        let Some((width, height)) = sizes.get(&candidate.src) else {
            continue;
        };
        let attrs = WIDTH_VALUE.replace(&candidate.attrs, format!("${{1}}width=\"{}\"", width).as_str());
        let attrs = HEIGHT_VALUE.replace(&attrs, format!("${{1}}height=\"{}\"", height).as_str());
        out.replace_range(candidate.range.clone(), &format!("<amp-img {}>", attrs));
    }

    tracing::debug!("Backfilled dimensions for {} of {} images", sizes.len(), candidates.len());
    out
}
