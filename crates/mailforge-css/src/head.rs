//! Head style builders
//!
//! Turns the collected media queries and head styles into the `<style>`
//! markup of the HTML skeleton, or into the raw CSS of the single AMP
//! custom style block.

use std::sync::LazyLock;

use regex::Regex;

use crate::strip_important;

static HREF_ATTRIBUTE_SELECTOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*href\s*\]").unwrap());

/// Reset rules every AMP document starts with
const AMP_BASE_CSS: &str = "#outlook a { padding:0; }
body { margin:0;padding:0;}
table, td { border-collapse:collapse; }
img { border:0;height:auto;line-height:100%; outline:none;text-decoration:none; }
p { display:block;margin:13px 0; }";

/// Extra media query copies for specific clients
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaQueryOptions {
    /// Repeat the queries under `[owa]` so Outlook Web renders the desktop layout
    pub force_owa_desktop: bool,
    /// Repeat the queries under `@media only print`
    pub printer_support: bool,
}

fn base_queries(queries: &[(String, String)]) -> Vec<String> {
    queries
        .iter()
        .map(|(class, rule)| format!(".{} {}", class, rule))
        .collect()
}

/// Media query `<style>` tags for the HTML skeleton. Empty when no queries were registered.
pub fn build_media_queries_tags(
    breakpoint: &str,
    queries: &[(String, String)],
    options: MediaQueryOptions,
) -> String {
    if queries.is_empty() {
        return String::new();
    }

    let base = base_queries(queries);
    let thunderbird: Vec<String> = base.iter().map(|q| format!(".moz-text-html {}", q)).collect();

    let mut out = format!(
        "<style type=\"text/css\">\n@media only screen and (min-width:{bp}) {{\n{base}\n}}\n</style>\n\
         <style media=\"screen and (min-width:{bp})\">\n{moz}\n</style>",
        bp = breakpoint,
        base = base.join("\n"),
        moz = thunderbird.join("\n"),
    );

    if options.printer_support {
        out.push_str(&format!(
            "\n<style type=\"text/css\">\n@media only print {{\n{}\n}}\n</style>",
            base.join("\n")
        ));
    }

    if options.force_owa_desktop {
        let owa: Vec<String> = base.iter().map(|q| format!("[owa] {}", q)).collect();
        out.push_str(&format!("\n<style type=\"text/css\">\n{}\n</style>", owa.join("\n")));
    }

    out
}

/// Media queries as raw CSS for the AMP custom block
pub fn build_amp_media_queries(breakpoint: &str, queries: &[(String, String)]) -> String {
    if queries.is_empty() {
        return String::new();
    }

    format!(
        "@media only screen and (min-width:{}) {{\n{}\n}}",
        breakpoint,
        base_queries(queries).join("\n")
    )
}

/// One `<style type="text/css">` block holding `styles`, or nothing
pub fn build_style_tag(styles: &[String]) -> String {
    if styles.iter().all(|s| s.trim().is_empty()) {
        return String::new();
    }

    let body: String = styles.iter().map(|s| format!("\n{}", s)).collect();
    format!("<style type=\"text/css\">{}\n</style>", body)
}

/// CSS of the single AMP custom style block.
///
/// `head_styles` are the rendered component and per-identifier head styles,
/// `styles` the global style blocks. The result never carries `!important`
/// or `[href]` attribute selectors, both rejected by AMP validators.
pub fn build_amp_custom_css(
    breakpoint: &str,
    head_styles: &[String],
    styles: &[String],
    queries: &[(String, String)],
) -> String {
    let join = |parts: &[String]| -> String {
        parts
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    };

    let parts = [
        AMP_BASE_CSS.to_string(),
        join(head_styles),
        join(styles),
        build_amp_media_queries(breakpoint, queries),
    ];

    let css = parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    let css = strip_important(&css);
    HREF_ATTRIBUTE_SELECTOR.replace_all(&css, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries() -> Vec<(String, String)> {
        vec![(
            "mj-column-per-100".to_string(),
            "{ width:100% !important; max-width: 100%; }".to_string(),
        )]
    }

    #[test]
    fn test_media_queries_tags() {
        let out = build_media_queries_tags("480px", &queries(), MediaQueryOptions::default());
        assert!(out.contains("@media only screen and (min-width:480px)"));
        assert!(out.contains(".moz-text-html .mj-column-per-100"));
        assert!(!out.contains("@media only print"));
        assert!(!out.contains("[owa]"));
    }

    #[test]
    fn test_media_queries_options() {
        let options = MediaQueryOptions {
            force_owa_desktop: true,
            printer_support: true,
        };
        let out = build_media_queries_tags("600px", &queries(), options);
        assert!(out.contains("@media only print"));
        assert!(out.contains("[owa] .mj-column-per-100"));
    }

    #[test]
    fn test_empty_queries() {
        assert_eq!(build_media_queries_tags("480px", &[], MediaQueryOptions::default()), "");
        assert_eq!(build_amp_media_queries("480px", &[]), "");
        assert_eq!(build_style_tag(&[]), "");
    }

    #[test]
    fn test_amp_custom_css() {
        let css = build_amp_custom_css(
            "480px",
            &[".a[href] { color: red !important; }".to_string()],
            &[".b { margin: 0; }".to_string()],
            &queries(),
        );

        assert!(css.starts_with("#outlook a"));
        assert!(css.contains(".a { color: red; }"));
        assert!(css.contains(".b { margin: 0; }"));
        assert!(css.contains("@media only screen and (min-width:480px)"));
        assert!(!css.contains("!important"));
        assert!(!css.contains("[href]"));
    }
}
