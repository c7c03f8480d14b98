//! Rewrite stages
//!
//! Each stage is a pure `&str -> String` function with a single matching
//! contract. Stages never parse the document; they match the markup shapes
//! the renderer emits.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::fonts::is_allowlisted_font_url;

/// Absolute URL substituted for bare `#` anchors
pub const PLACEHOLDER_HREF: &str = "https://example.com/";

static MSO_IE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!--\[if mso \| IE\]>.*?<!\[endif\]-->").unwrap());
static MSO_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!--\[if mso\]>.*?<!\[endif\]-->").unwrap());
static NOT_MSO_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!--\[if !mso \| IE\]><!-->.*?<!\[endif\]-->").unwrap());

static LINK_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<link\s+([^>]*)/?>").unwrap());
static HREF_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']*)["']"#).unwrap());

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\s+([^>]*?)\s*/?\s*>").unwrap());
static TRAILING_SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*/\s*$").unwrap());
static PX_DIMENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(^|\s)(width|height)=["'](\d+)px["']"#).unwrap());
static HAS_WIDTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)width\s*=").unwrap());
static HAS_HEIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)height\s*=").unwrap());

static CELL_WRAPPED_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<td([^>]*)>(\s*)<div([^>]*)>(\s*)<amp-img\s+([^>]*?)></amp-img>\s*</div>").unwrap()
});
static STYLE_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^\s*|\s+)style=["'][^"']*["']"#).unwrap());
static REPEATED_SEMICOLONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";+").unwrap());

static BARE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)href=["']#["']"#).unwrap());

static STYLE_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(\s+)style="([^"]*)""#).unwrap());
static IMPORTANT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s*!important\s*").unwrap());
static DISALLOWED_INLINE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\s*mso-padding-alt\s*:[^;]+;?",
        r"(?i)\s*mso-hide\s*:[^;]+;?",
        r"(?i)\s*cursor\s*:\s*auto\s*;?",
        r"(?i)\s*-webkit-background-clip\s*:[^;]+;?",
        r"(?i)\s*-moz-user-select\s*:[^;]+;?",
        r"(?i)\s*user-select\s*:[^;]+;?",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});
static DOUBLED_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*;+").unwrap());
static EDGE_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^;\s*|;\s*$").unwrap());

static STRIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<strike\b([^>]*)>(.*?)</strike\s*>").unwrap());

static LABEL_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<label\s+([^>]*)>").unwrap());
static ALIGN_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^\s*|\s+)align\s*=\s*["'][^"']*["']"#).unwrap());

static AMP_CUSTOM_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\s+amp-custom[^>]*>(.*?)</style\s*>").unwrap());
static DISALLOWED_CUSTOM: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\s*-webkit-background-clip\s*:[^;}]+;?",
        r"\s*-moz-user-select\s*:[^;}]+;?",
        r"\s*user-select\s*:[^;}]+;?",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});
static SEMICOLON_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*;+\s*").unwrap());
static EDGE_SEMICOLON_SPACED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*;|;\s*$").unwrap());

/// Value of `name="..."` inside a raw attribute string. `name` must start
/// the string or follow whitespace, so `data-width` is not `width`.
pub fn attribute_value(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?i)(?:^|\s){}=["']([^"']*)["']"#, regex::escape(name));
    Regex::new(&pattern)
        .ok()?
        .captures(attrs)
        .map(|caps| caps[1].trim().to_string())
}

/// Drop the `mso | IE`, `mso` and `!mso | IE` conditional blocks with their content
pub fn strip_conditional_comments(html: &str) -> String {
    let out = MSO_IE_BLOCK.replace_all(html, "");
    let out = MSO_BLOCK.replace_all(&out, "");
    NOT_MSO_BLOCK.replace_all(&out, "").into_owned()
}

/// Keep `<link>` tags only when their href is on a font origin the format accepts
pub fn filter_links(html: &str) -> String {
    LINK_TAG
        .replace_all(html, |caps: &Captures| match HREF_VALUE.captures(&caps[1]) {
            Some(href) if is_allowlisted_font_url(&href[1]) => caps[0].to_string(),
            _ => String::new(),
        })
        .into_owned()
}

/// `<img ...>` to `<amp-img layout="responsive" ...></amp-img>` with bare integer dimensions
pub fn rewrite_images(html: &str) -> String {
    IMG_TAG
        .replace_all(html, |caps: &Captures| {
            let attrs = TRAILING_SLASH.replace(&caps[1], "");
            let mut attrs = PX_DIMENSION.replace_all(attrs.trim(), "${1}${2}=\"${3}\"").into_owned();
            if !HAS_WIDTH.is_match(&attrs) {
                attrs.push_str(" width=\"1\"");
            }
            if !HAS_HEIGHT.is_match(&attrs) {
                attrs.push_str(" height=\"1\"");
            }
            format!("<amp-img layout=\"responsive\" {}></amp-img>", attrs)
        })
        .into_owned()
}

/// `td > div > amp-img` to `td > amp-img`, the div's style appended to the cell's
pub fn unwrap_cell_images(html: &str) -> String {
    CELL_WRAPPED_IMAGE
        .replace_all(html, |caps: &Captures| {
            let cell_style = attribute_value(&caps[1], "style").unwrap_or_default();
            let div_style = attribute_value(&caps[3], "style").unwrap_or_default();

            let merged = [cell_style, div_style]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(";");
            let merged = REPEATED_SEMICOLONS.replace_all(&merged, ";");
            let merged = merged.trim_matches(';');

            let mut attrs = STYLE_ATTRIBUTE.replace_all(&caps[1], "").trim().to_string();
            if !merged.is_empty() {
                if !attrs.is_empty() {
                    attrs.push(' ');
                }
                attrs.push_str(&format!("style=\"{}\"", merged));
            }

            let open = if attrs.is_empty() {
                "<td>".to_string()
            } else {
                format!("<td {}>", attrs)
            };
            format!("{}{}<amp-img {}></amp-img>", open, &caps[2], &caps[5])
        })
        .into_owned()
}

pub fn replace_bare_anchors(html: &str) -> String {
    BARE_ANCHOR
        .replace_all(html, format!("href=\"{}\"", PLACEHOLDER_HREF).as_str())
        .into_owned()
}

/// Remove `!important` and declarations the format rejects from every style attribute
pub fn strip_disallowed_styles(html: &str) -> String {
    STYLE_VALUE
        .replace_all(html, |caps: &Captures| {
            let mut style = IMPORTANT.replace_all(&caps[2], " ").into_owned();
            for pattern in DISALLOWED_INLINE.iter() {
                style = pattern.replace_all(&style, "").into_owned();
            }
            let style = DOUBLED_SEMICOLON.replace_all(style.trim(), ";");
            let style = EDGE_SEMICOLON.replace_all(&style, "");
            let style = style.trim();

            // An emptied attribute goes with the whitespace before it
            if style.is_empty() {
                String::new()
            } else {
                format!("{}style=\"{}\"", &caps[1], style)
            }
        })
        .into_owned()
}

/// `<strike>` to a span with `text-decoration:line-through`
pub fn replace_strike(html: &str) -> String {
    STRIKE
        .replace_all(html, |caps: &Captures| {
            let style = match attribute_value(&caps[1], "style") {
                Some(style) if !style.is_empty() => format!("{};text-decoration:line-through", style),
                _ => "text-decoration:line-through".to_string(),
            };
            format!("<span style=\"{}\">{}</span>", style, &caps[2])
        })
        .into_owned()
}

pub fn strip_label_align(html: &str) -> String {
    LABEL_TAG
        .replace_all(html, |caps: &Captures| {
            let cleaned = ALIGN_ATTRIBUTE.replace_all(&caps[1], "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                "<label>".to_string()
            } else {
                format!("<label {}>", cleaned)
            }
        })
        .into_owned()
}

/// Same declaration stripping for the `<style amp-custom>` block
pub fn clean_custom_css(html: &str) -> String {
    AMP_CUSTOM_BLOCK
        .replace_all(html, |caps: &Captures| {
            let mut css = IMPORTANT.replace_all(&caps[1], " ").into_owned();
            for pattern in DISALLOWED_CUSTOM.iter() {
                css = pattern.replace_all(&css, "").into_owned();
            }
            let css = SEMICOLON_RUN.replace_all(&css, ";");
            let css = EDGE_SEMICOLON_SPACED.replace_all(&css, "");
            format!("<style amp-custom>{}</style>", css.trim())
        })
        .into_owned()
}
