//! Component contract and registry
//!
//! Components are registered under their tag name. Body components render
//! markup from a resolved node; head components only write into
//! [`GlobalData`](crate::GlobalData).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mailforge_dom::{ElementNode, RenderContext};

use crate::render::{Element, Renderer};
use crate::{CompileError, GlobalData, HeadStyle};

/// Value type of a component attribute, checked by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Color,
    Boolean,
    Integer,
    Enum(&'static [&'static str]),
    /// One to `max` space separated lengths. An empty unit allows bare numbers.
    Unit {
        units: &'static [&'static str],
        max: usize,
    },
}

impl AttributeType {
    pub const PX: Self = Self::Unit { units: &["px"], max: 1 };
    pub const PX_PERCENT: Self = Self::Unit {
        units: &["px", "%"],
        max: 1,
    };
    pub const PADDING: Self = Self::Unit {
        units: &["px", "%"],
        max: 4,
    };
}

/// Attributes every body component accepts
pub const COMMON_ATTRIBUTES: &[(&str, AttributeType)] = &[
    ("mj-class", AttributeType::String),
    ("css-class", AttributeType::String),
];

/// A component rendering visible markup
pub trait BodyComponent: Send + Sync {
    fn tag_name(&self) -> &'static str;

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[]
    }

    /// Lowest precedence attribute values
    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Inner markup is kept verbatim instead of parsed into children
    fn ending_tag(&self) -> bool {
        false
    }

    /// Rendered as-is by parents instead of being wrapped in a layout cell
    fn is_raw(&self) -> bool {
        false
    }

    /// Head CSS registered once under the tag name the first time the tag renders
    fn head_style(&self, _global: &GlobalData) -> Option<HeadStyle> {
        None
    }

    /// Context handed to this element's children
    fn child_context(&self, element: &Element<'_, '_>) -> RenderContext {
        element.context().for_children()
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError>;
}

/// A component that only writes document-wide data
pub trait HeadComponent: Send + Sync {
    fn tag_name(&self) -> &'static str;

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[]
    }

    fn ending_tag(&self) -> bool {
        false
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError>;
}

/// Registered component
#[derive(Clone)]
pub enum Component {
    Body(Arc<dyn BodyComponent>),
    Head(Arc<dyn HeadComponent>),
}

impl Component {
    pub fn body(component: impl BodyComponent + 'static) -> Self {
        Self::Body(Arc::new(component))
    }

    pub fn head(component: impl HeadComponent + 'static) -> Self {
        Self::Head(Arc::new(component))
    }

    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Body(c) => c.tag_name(),
            Self::Head(c) => c.tag_name(),
        }
    }

    pub fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        match self {
            Self::Body(c) => c.allowed_attributes(),
            Self::Head(c) => c.allowed_attributes(),
        }
    }

    pub fn ending_tag(&self) -> bool {
        match self {
            Self::Body(c) => c.ending_tag(),
            Self::Head(c) => c.ending_tag(),
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body(_))
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Body(c) => write!(f, "Body({})", c.tag_name()),
            Self::Head(c) => write!(f, "Head({})", c.tag_name()),
        }
    }
}

/// Named group of components added to a registry together
#[derive(Debug, Clone, Default)]
pub struct Preset {
    name: String,
    components: Vec<Component>,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    pub fn with(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

/// Tag name to component lookup, built once before compiling
#[derive(Debug, Clone, Default)]
pub struct Registry {
    components: HashMap<String, Component>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the core preset
    pub fn core() -> Self {
        let mut registry = Self::new();
        registry.register_preset(&crate::components::core_preset());
        registry
    }

    /// Register `component`, replacing any component with the same tag
    pub fn register(&mut self, component: Component) {
        self.components.insert(component.tag_name().to_string(), component);
    }

    pub fn register_preset(&mut self, preset: &Preset) {
        for component in preset.components() {
            self.register(component.clone());
        }
        tracing::debug!("Registered preset '{}' ({} components)", preset.name(), preset.components().len());
    }

    pub fn get(&self, tag_name: &str) -> Option<&Component> {
        self.components.get(tag_name)
    }

    pub fn contains(&self, tag_name: &str) -> bool {
        self.components.contains_key(tag_name)
    }

    /// Tags whose inner markup the parser keeps verbatim
    pub fn ending_tags(&self) -> HashSet<String> {
        self.components
            .values()
            .filter(|c| c.ending_tag())
            .map(|c| c.tag_name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Badge;

    impl BodyComponent for Badge {
        fn tag_name(&self) -> &'static str {
            "mj-badge"
        }

        fn ending_tag(&self) -> bool {
            true
        }

        fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
            Ok(format!("<span>{}</span>", element.content()))
        }
    }

    #[test]
    fn test_core_registry() {
        let registry = Registry::core();
        assert!(registry.get("mj-section").is_some_and(Component::is_body));
        assert!(registry.get("mj-title").is_some_and(|c| !c.is_body()));
        assert!(registry.ending_tags().contains("mj-text"));
        assert!(!registry.ending_tags().contains("mj-section"));
    }

    #[test]
    fn test_preset_extends_registry() {
        let mut registry = Registry::core();
        let before = registry.len();
        registry.register_preset(&Preset::new("badges").with(Component::body(Badge)));

        assert_eq!(registry.len(), before + 1);
        assert!(registry.ending_tags().contains("mj-badge"));
    }
}
