//! mailforge CSS
//!
//! Selector parsing and matching, style rule extraction, CSS minification,
//! head style builders and the template-aware minification guard.

mod selectors;
mod rules;
mod minify;
mod head;
mod template;

pub use selectors::{
    AttributeMatcher, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    MatchElement, SelectorList, Specificity,
};
pub use rules::{parse_rules, Declaration, StyleRule};
pub use minify::{minify_declarations, minify_stylesheet, strip_important};
pub use head::{
    build_amp_custom_css, build_amp_media_queries, build_media_queries_tags, build_style_tag,
    MediaQueryOptions,
};
pub use template::{Classification, MinificationGuard, TemplateSyntax, Token, Tokenized};

/// Selector or stylesheet failure
#[derive(Debug, thiserror::Error)]
pub enum CssError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Print error: {0}")]
    Print(String),
}

/// Minification guard failure
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Unbalanced template delimiters found in CSS: {details}. Fix template tokens or disable CSS minification.")]
    Unbalanced { details: String },

    #[error("Mixed variable syntax detected. Use either CSS property syntax (e.g., color: {{{{variable}}}}) OR block syntax (e.g., {{{{variable}}}}), not both in the same document.")]
    MixedSyntax,

    #[error("Minification failed: {0}")]
    Minify(String),
}
