//! CSS minification
//!
//! Thin wrappers over lightningcss. Input the parser rejects, or that holds
//! template block markers, is returned trimmed but otherwise untouched so a
//! minification pass can never lose content.

use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleAttribute, StyleSheet};
use regex::Regex;

use crate::template::BLOCK_MARKER_PATTERN;

static BLOCK_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(BLOCK_MARKER_PATTERN).unwrap());
static IMPORTANT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s*!\s*important").unwrap());

fn printer() -> PrinterOptions<'static> {
    PrinterOptions {
        minify: true,
        ..PrinterOptions::default()
    }
}

/// Minify the contents of a `<style>` block
pub fn minify_stylesheet(css: &str) -> String {
    if css.trim().is_empty() {
        return String::new();
    }
    if BLOCK_MARKER.is_match(css) {
        return css.trim().to_string();
    }

    let minified = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| e.to_string())
        .and_then(|mut sheet| {
            sheet.minify(MinifyOptions::default()).map_err(|e| e.to_string())?;
            sheet.to_css(printer()).map_err(|e| e.to_string())
        });

    match minified {
        Ok(result) => result.code,
        Err(e) => {
            tracing::debug!("Keeping stylesheet unminified: {}", e);
            css.trim().to_string()
        }
    }
}

/// Minify the declarations of a `style` attribute value
pub fn minify_declarations(declarations: &str) -> String {
    if declarations.trim().is_empty() {
        return String::new();
    }
    if BLOCK_MARKER.is_match(declarations) {
        return declarations.trim().to_string();
    }

    let minified = StyleAttribute::parse(declarations, ParserOptions::default())
        .map_err(|e| e.to_string())
        .and_then(|mut attr| {
            attr.minify(MinifyOptions::default());
            attr.to_css(printer()).map_err(|e| e.to_string())
        });

    match minified {
        Ok(result) => result.code,
        Err(e) => {
            tracing::debug!("Keeping style attribute unminified: {}", e);
            declarations.trim().to_string()
        }
    }
}

/// Remove every `!important` flag
pub fn strip_important(css: &str) -> String {
    IMPORTANT.replace_all(css, "").into_owned()
}
