//! mailforge Engine
//!
//! Compiles an MJML-style email tree into a responsive HTML email or an
//! AMP4EMAIL document.
//!
//! # Example
//! ```rust,ignore
//! use mailforge_engine::{CompileOptions, Compiler};
//!
//! let compiler = Compiler::new(CompileOptions::amp());
//! let output = compiler.compile("<mjml><mj-body>...</mj-body></mjml>")?;
//! println!("{}", output.html);
//! ```

mod config;
mod diagnostics;
mod global;
mod component;
mod render;
mod parser;
mod validate;
mod skeleton;
mod fonts;
mod compiler;
pub mod components;

pub use config::{default_fonts, CompileOptions, Target, ValidationLevel};
pub use diagnostics::Diagnostic;
pub use global::{GlobalData, HeadStyle, HeadValue, StyleAggregator};
pub use component::{AttributeType, BodyComponent, Component, HeadComponent, Preset, Registry};
pub use render::{Element, Renderer};
pub use parser::{MarkupParser, ParseError, XmlParser};
pub use validate::{AttributeValidator, Validator};
pub use compiler::{CompileOutput, Compiler};

// Re-export sub-crates for advanced usage
pub use mailforge_dom as dom;
pub use mailforge_css as css;
pub use mailforge_html as html;
pub use mailforge_amp as amp;
pub use mailforge_net as net;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile error
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Malformed MJML. Check that your structure is correct and enclosed in <mjml> tags.")]
    Malformed,

    #[error("{message}")]
    Validation {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error(transparent)]
    Guard(#[from] mailforge_css::GuardError),

    #[error("HTML error: {0}")]
    Html(#[from] mailforge_html::HtmlError),

    #[error("An mj-head element add an unknown head attribute: {name}")]
    UnknownHeadAttribute { name: String },

    #[error("Head attribute {name} does not accept this kind of value")]
    InvalidHeadValue { name: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}
