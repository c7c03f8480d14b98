//! mailforge DOM
//!
//! The element tree handed over by the markup parser, the attribute tables
//! filled in by head elements, the resolved tree consumed by rendering and
//! the context map that flows from a parent to its descendants.

mod node;
mod attributes;
mod context;
mod resolver;

pub use node::ElementNode;
pub use attributes::{Attributes, AttributeTables};
pub use context::RenderContext;
pub use resolver::{AttributeResolver, ResolvedNode};

/// Attribute holding the space separated list of attribute classes
pub const CLASS_ATTRIBUTE: &str = "mj-class";

/// Attribute whose values are concatenated instead of replaced when several
/// attribute classes contribute it
pub const CSS_CLASS_ATTRIBUTE: &str = "css-class";

/// Wildcard tag used for attributes that apply to every element
pub const ALL_TAG: &str = "mj-all";
