//! Attribute resolution
//!
//! Single top-down pass computing the effective attributes of every node.
//! Layers, lowest to highest precedence:
//! 1. per-tag defaults
//! 2. the node's own attribute classes, in reference order
//! 3. defaults the ancestor's class hint declares for this tag
//! 4. explicitly authored attributes

use crate::{AttributeTables, Attributes, ElementNode, ALL_TAG, CLASS_ATTRIBUTE, CSS_CLASS_ATTRIBUTE};

/// Element with its attributes resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNode {
    pub tag_name: String,
    /// Effective attributes after class and default resolution
    pub attributes: Attributes,
    /// Attributes the author wrote on the element (class reference excluded)
    pub raw_attributes: Attributes,
    /// Attributes declared for every tag (`mj-all`)
    pub global_attributes: Attributes,
    pub children: Vec<ResolvedNode>,
    pub content: Option<String>,
    pub line: Option<usize>,
}

impl ResolvedNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the author set `name` explicitly rather than through defaults
    pub fn is_explicit(&self, name: &str) -> bool {
        self.raw_attributes.contains_key(name)
    }

    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Walks an element tree once, resolving attributes against the lookup tables
pub struct AttributeResolver<'a> {
    tables: &'a AttributeTables,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(tables: &'a AttributeTables) -> Self {
        Self { tables }
    }

    /// Resolve a whole tree starting with an empty class hint
    pub fn resolve(&self, node: &ElementNode) -> ResolvedNode {
        let resolved = self.resolve_with_hint(node, "");
        tracing::debug!("Resolved attributes for <{}> subtree", node.tag_name);
        resolved
    }

    /// Resolve `node` under the class hint inherited from its ancestors
    pub fn resolve_with_hint(&self, node: &ElementNode, parent_class: &str) -> ResolvedNode {
        let tag = node.tag_name.as_str();
        let own_classes = node.attributes.get(CLASS_ATTRIBUTE).map(String::as_str);

        let mut attributes = self.tables.defaults_for(tag).cloned().unwrap_or_default();
        attributes.extend(self.class_attributes(own_classes.unwrap_or("")));

        for hint in parent_class.split_whitespace() {
            if let Some(defaults) = self.tables.class_default(hint, tag) {
                attributes.extend(defaults.clone());
            }
        }

        let raw_attributes: Attributes = node
            .attributes
            .iter()
            .filter(|(name, _)| name.as_str() != CLASS_ATTRIBUTE)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        attributes.extend(raw_attributes.clone());

        // A node declaring its own classes replaces the hint, never merges with it
        let next_hint = own_classes.unwrap_or(parent_class);

        ResolvedNode {
            tag_name: node.tag_name.clone(),
            attributes,
            raw_attributes,
            global_attributes: self.tables.defaults_for(ALL_TAG).cloned().unwrap_or_default(),
            children: node
                .children
                .iter()
                .map(|child| self.resolve_with_hint(child, next_hint))
                .collect(),
            content: node.content.clone(),
            line: node.line,
        }
    }

    /// Merge the attribute sets of every referenced class, in reference order
    fn class_attributes(&self, classes: &str) -> Attributes {
        let mut merged = Attributes::new();

        for name in classes.split_whitespace() {
            let Some(values) = self.tables.class(name) else {
                continue;
            };

            let combined = match (merged.get(CSS_CLASS_ATTRIBUTE), values.get(CSS_CLASS_ATTRIBUTE)) {
                (Some(previous), Some(next)) => Some(format!("{previous} {next}")),
                _ => None,
            };

            merged.extend(values.clone());
            if let Some(css_class) = combined {
                merged.insert(CSS_CLASS_ATTRIBUTE.to_string(), css_class);
            }
        }

        merged
    }
}
