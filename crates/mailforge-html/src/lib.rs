//! mailforge HTML
//!
//! html5ever-backed document handling for selector scoped attribute
//! overrides. CSS inlining, the HTML minifier and the pretty printer work on
//! the token stream instead, so they leave doctypes, conditional comments
//! and template tokens as written.

mod document;
mod element;
mod overrides;
mod inline;
mod scanner;
mod tags;
mod minify;
mod beautify;

pub use document::HtmlDocument;
pub use element::DomElement;
pub use overrides::{apply_attribute_overrides, AttributeOverride};
pub use inline::{inline_css, split_declarations, InlineOptions};
pub use scanner::{Scanner, Tag, Token};
pub use tags::{TagElement, TagTree};
pub use minify::{is_conditional_comment, HtmlMinifier, MinifyOptions};
pub use beautify::beautify;

/// HTML processing error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("Document has no body element")]
    MissingBody,

    #[error(transparent)]
    Css(#[from] mailforge_css::CssError),
}
