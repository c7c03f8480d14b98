//! Compile options

use std::collections::BTreeMap;
use std::time::Duration;

use mailforge_css::TemplateSyntax;
use mailforge_net::FetchOptions;
use serde::{Deserialize, Serialize};

/// Output dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Responsive HTML email
    Html,
    /// AMP4EMAIL document
    #[default]
    Amp,
}

/// How validator diagnostics affect a compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Do not validate
    Skip,
    /// Report diagnostics alongside the output
    #[default]
    Soft,
    /// Fail the compile when any diagnostic is found
    Strict,
}

/// Stock web fonts, available to `font-family` declarations without an `mj-font`
pub fn default_fonts() -> BTreeMap<String, String> {
    [
        ("Open Sans", "https://fonts.googleapis.com/css?family=Open+Sans:300,400,500,700"),
        ("Droid Sans", "https://fonts.googleapis.com/css?family=Droid+Sans:300,400,500,700"),
        ("Lato", "https://fonts.googleapis.com/css?family=Lato:300,400,500,700"),
        ("Roboto", "https://fonts.googleapis.com/css?family=Roboto:300,400,500,700"),
        ("Ubuntu", "https://fonts.googleapis.com/css?family=Ubuntu:300,400,500,700"),
    ]
    .into_iter()
    .map(|(name, url)| (name.to_string(), url.to_string()))
    .collect()
}

/// Compiler configuration.
///
/// Deserializes from camelCase JSON with every field optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Collapse whitespace and minify CSS
    pub minify: bool,

    /// Protect template tokens in CSS while minifying
    pub sanitize_styles: bool,

    /// Template delimiter pairs, in priority order
    pub template_syntax: Vec<TemplateSyntax>,

    /// Allow block tokens next to value or property tokens
    pub allow_mixed_syntax: bool,

    /// Pretty-print when not minifying
    pub beautify: bool,

    pub validation_level: ValidationLevel,

    /// Keep ordinary HTML comments when minifying
    pub keep_comments: bool,

    /// Minify CSS while minifying HTML. When off the guard is skipped too.
    pub minify_css: bool,

    /// Inline the CSS of used fonts into the AMP custom style block
    pub fetch_fonts_for_amp: bool,

    /// Replace placeholder AMP image dimensions with the real ones
    pub fetch_image_dimensions: bool,

    pub fetch_image_dimensions_timeout_ms: u64,

    pub font_fetch_timeout_ms: u64,

    /// Requests in flight at once for either auxiliary fetch
    pub fetch_concurrency: usize,

    pub target: Target,

    /// Font name to stylesheet URL
    pub fonts: BTreeMap<String, String>,

    /// Responsive breakpoint, overridden by `mj-breakpoint`
    pub breakpoint: String,

    /// Repeat media queries for print
    pub printer_support: bool,

    /// Document language, overriding the root `lang` attribute
    pub lang: Option<String>,

    /// Text direction, overriding the root `dir` attribute
    pub dir: Option<String>,

    /// Keep `<style>` blocks after inlining
    pub inline_keep_style_tags: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            minify: false,
            sanitize_styles: false,
            template_syntax: TemplateSyntax::defaults(),
            allow_mixed_syntax: false,
            beautify: false,
            validation_level: ValidationLevel::default(),
            keep_comments: true,
            minify_css: true,
            fetch_fonts_for_amp: false,
            fetch_image_dimensions: false,
            fetch_image_dimensions_timeout_ms: 5000,
            font_fetch_timeout_ms: 8000,
            fetch_concurrency: 8,
            target: Target::default(),
            fonts: default_fonts(),
            breakpoint: "480px".to_string(),
            printer_support: false,
            lang: None,
            dir: None,
            inline_keep_style_tags: true,
        }
    }
}

impl CompileOptions {
    pub fn html() -> Self {
        Self {
            target: Target::Html,
            ..Self::default()
        }
    }

    pub fn amp() -> Self {
        Self::default()
    }

    /// Substrings marking a URL as templated
    pub fn template_markers(&self) -> Vec<String> {
        self.template_syntax
            .iter()
            .flat_map(|s| [s.prefix.clone(), s.suffix.clone()])
            .filter(|m| !m.is_empty())
            .collect()
    }

    pub(crate) fn font_fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .with_timeout(Duration::from_millis(self.font_fetch_timeout_ms))
            .with_concurrency(self.fetch_concurrency)
            .with_template_markers(self.template_markers())
    }

    pub(crate) fn image_fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .with_timeout(Duration::from_millis(self.fetch_image_dimensions_timeout_ms))
            .with_concurrency(self.fetch_concurrency)
            .with_template_markers(self.template_markers())
    }
}
