//! Parsed element tree
//!
//! `ElementNode` is what the markup parser produces. The compiler never
//! mutates it; rendering works on the resolved copy.

use serde::{Deserialize, Serialize};

use crate::Attributes;

/// A node of the parsed markup tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    /// Tag name as authored (`mj-section`, `mj-image`, ...)
    pub tag_name: String,
    /// Attributes as authored
    #[serde(default)]
    pub attributes: Attributes,
    /// Child elements in document order
    #[serde(default)]
    pub children: Vec<ElementNode>,
    /// Raw inner content for elements that keep their markup verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Source line of the opening tag, when the parser knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ElementNode {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First direct child with the given tag name
    pub fn find_child(&self, tag_name: &str) -> Option<&ElementNode> {
        self.children.iter().find(|c| c.tag_name == tag_name)
    }

    /// All direct children with the given tag name
    pub fn children_named<'a>(&'a self, tag_name: &'a str) -> impl Iterator<Item = &'a ElementNode> + 'a {
        self.children.iter().filter(move |c| c.tag_name == tag_name)
    }

    /// Inner content, empty when none was captured
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ElementNode::node_count).sum::<usize>()
    }
}
