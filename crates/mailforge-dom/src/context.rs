//! Render context
//!
//! Immutable key/value map inherited from ancestor to descendant. Deriving a
//! child context never touches the parent, so siblings cannot observe each
//! other's additions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::Attributes;

/// Context handed down the render tree
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    values: Arc<HashMap<String, String>>,
    /// Attributes a parent passes to its direct children only
    inherited: Arc<Attributes>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Derive a context with one more entry
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key.into(), value.into());
        Self {
            values: Arc::new(values),
            inherited: Arc::clone(&self.inherited),
        }
    }

    /// Derive a context with several more entries
    pub fn extend<I, K, V>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = (*self.values).clone();
        values.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self {
            values: Arc::new(values),
            inherited: Arc::clone(&self.inherited),
        }
    }

    /// Derive a context that hands `attributes` to the next level of children
    pub fn with_inherited_attributes(&self, attributes: Attributes) -> Self {
        Self {
            values: Arc::clone(&self.values),
            inherited: Arc::new(attributes),
        }
    }

    /// Attributes handed down by the direct parent
    pub fn inherited_attributes(&self) -> &Attributes {
        &self.inherited
    }

    /// The context a node's children start from: same values, no inherited attributes
    pub fn for_children(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
            inherited: Arc::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
