//! Validation collaborator
//!
//! Checks authored attributes against each component's declared attribute
//! types. Unknown tags are left to the renderer, which reports them itself.

use std::sync::LazyLock;

use mailforge_dom::ElementNode;
use regex::Regex;

use crate::component::{AttributeType, Registry, COMMON_ATTRIBUTES};
use crate::Diagnostic;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?(\d+(\.\d+)?|\.\d+)([a-z%]*)$").unwrap());
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(#[0-9a-f]{3}|#[0-9a-f]{4}|#[0-9a-f]{6}|#[0-9a-f]{8}|[a-z]+|(rgb|hsl)a?\([^)]*\))$").unwrap()
});

/// Schema checks over a parsed tree
pub trait Validator: Send + Sync {
    fn validate(&self, root: &ElementNode, registry: &Registry) -> Vec<Diagnostic>;
}

/// Reports illegal attributes and values outside an attribute's type
#[derive(Debug, Clone, Default)]
pub struct AttributeValidator {
    template_markers: Vec<String>,
}

impl AttributeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values containing any of `markers` are templated and not type checked
    pub fn with_template_markers(mut self, markers: Vec<String>) -> Self {
        self.template_markers = markers;
        self
    }

    fn visit(&self, node: &ElementNode, registry: &Registry, out: &mut Vec<Diagnostic>) {
        // Children of mj-attributes describe other tags' defaults
        if node.tag_name == "mj-attributes" {
            return;
        }

        if let Some(component) = registry.get(&node.tag_name) {
            let allowed = component.allowed_attributes();
            for (name, value) in &node.attributes {
                match allowed
                    .iter()
                    .chain(COMMON_ATTRIBUTES)
                    .find(|(allowed_name, _)| allowed_name == name)
                {
                    None => out.push(Diagnostic::new(
                        &node.tag_name,
                        node.line,
                        format!("Attribute {} is illegal", name),
                    )),
                    Some((_, kind)) => {
                        if !self.is_templated(value) && !value_matches(*kind, value) {
                            out.push(Diagnostic::new(
                                &node.tag_name,
                                node.line,
                                format!("Attribute {} has invalid value: {} for type {}", name, value, describe(*kind)),
                            ));
                        }
                    }
                }
            }
        }

        for child in &node.children {
            self.visit(child, registry, out);
        }
    }

    fn is_templated(&self, value: &str) -> bool {
        self.template_markers
            .iter()
            .any(|m| !m.is_empty() && value.contains(m.as_str()))
    }
}

impl Validator for AttributeValidator {
    fn validate(&self, root: &ElementNode, registry: &Registry) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        // The root's own attributes are document options
        for child in &root.children {
            self.visit(child, registry, &mut out);
        }
        tracing::debug!("Validation found {} problems", out.len());
        out
    }
}

/// Whether `value` is acceptable for `kind`
pub fn value_matches(kind: AttributeType, value: &str) -> bool {
    match kind {
        AttributeType::String => true,
        AttributeType::Color => COLOR.is_match(value.trim()),
        AttributeType::Boolean => matches!(value, "true" | "false"),
        AttributeType::Integer => INTEGER.is_match(value.trim()),
        AttributeType::Enum(options) => options.contains(&value),
        AttributeType::Unit { units, max } => {
            let parts: Vec<&str> = value.split_whitespace().collect();
            !parts.is_empty()
                && parts.len() <= max
                && parts.iter().all(|part| {
                    NUMBER.captures(part).is_some_and(|caps| {
                        let unit = caps.get(3).map_or("", |m| m.as_str());
                        units.contains(&unit) || (unit.is_empty() && is_zero(part))
                    })
                })
        }
    }
}

fn is_zero(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(|n| n == 0.0)
}

fn describe(kind: AttributeType) -> String {
    match kind {
        AttributeType::String => "string".to_string(),
        AttributeType::Color => "color".to_string(),
        AttributeType::Boolean => "boolean".to_string(),
        AttributeType::Integer => "integer".to_string(),
        AttributeType::Enum(options) => format!("enum({})", options.join(",")),
        AttributeType::Unit { units, max } => format!("unit({}){{1,{}}}", units.join(","), max),
    }
}
