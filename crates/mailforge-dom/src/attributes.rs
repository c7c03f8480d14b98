//! Attribute maps and the class/default lookup tables

use std::collections::{BTreeMap, HashMap};

/// Attribute name to value map. Ordered so rendered output is stable.
pub type Attributes = BTreeMap<String, String>;

/// Lookup tables filled by head elements and read by the resolver
#[derive(Debug, Clone, Default)]
pub struct AttributeTables {
    /// Attribute class name -> attribute set
    pub classes: HashMap<String, Attributes>,
    /// Attribute class name -> descendant tag name -> attribute set
    pub classes_default: HashMap<String, HashMap<String, Attributes>>,
    /// Tag name -> default attribute set (`mj-all` is the wildcard)
    pub default_attributes: HashMap<String, Attributes>,
}

impl AttributeTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `values` into the per-tag defaults of `tag`
    pub fn merge_default_attributes(&mut self, tag: &str, values: Attributes) {
        self.default_attributes
            .entry(tag.to_string())
            .or_default()
            .extend(values);
    }

    /// Merge `values` into the attribute class `name`
    pub fn merge_class(&mut self, name: &str, values: Attributes) {
        self.classes.entry(name.to_string()).or_default().extend(values);
    }

    /// Merge `values` into the defaults that class `name` gives descendant `tag` elements
    pub fn merge_class_default(&mut self, name: &str, tag: &str, values: Attributes) {
        self.classes_default
            .entry(name.to_string())
            .or_default()
            .entry(tag.to_string())
            .or_default()
            .extend(values);
    }

    pub fn class(&self, name: &str) -> Option<&Attributes> {
        self.classes.get(name)
    }

    pub fn class_default(&self, name: &str, tag: &str) -> Option<&Attributes> {
        self.classes_default.get(name).and_then(|tags| tags.get(tag))
    }

    pub fn defaults_for(&self, tag: &str) -> Option<&Attributes> {
        self.default_attributes.get(tag)
    }
}
