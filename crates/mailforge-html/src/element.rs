//! Element view over an RcDom node

use std::rc::Rc;

use html5ever::{Attribute, LocalName, Namespace, QualName};
use mailforge_css::MatchElement;
use markup5ever_rcdom::{Handle, NodeData};

/// Element node handle
#[derive(Clone)]
pub struct DomElement(Handle);

impl DomElement {
    pub fn new(handle: Handle) -> Self {
        Self(handle)
    }

    /// Lowercase local name, empty for non-elements
    pub fn name(&self) -> String {
        match &self.0.data {
            NodeData::Element { name, .. } => name.local.to_string(),
            _ => String::new(),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let NodeData::Element { attrs, .. } = &self.0.data else {
            return None;
        };
        attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string())
    }

    /// Set or replace an attribute
    pub fn set_attribute(&self, name: &str, value: &str) {
        let NodeData::Element { attrs, .. } = &self.0.data else {
            return;
        };
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
            Some(existing) => existing.value = value.into(),
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: value.into(),
            }),
        }
    }
}

fn parent_of(handle: &Handle) -> Option<Handle> {
    // Cell<Option<Weak>> has no borrowing getter; take and put back
    let weak = handle.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    handle.parent.set(weak);
    parent
}

fn is_element(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Element { .. })
}

impl MatchElement for DomElement {
    fn local_name(&self) -> String {
        self.name()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn parent_element(&self) -> Option<Self> {
        parent_of(&self.0).filter(is_element).map(DomElement)
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let parent = parent_of(&self.0)?;
        let children = parent.children.borrow();
        let position = children.iter().position(|c| Rc::ptr_eq(c, &self.0))?;
        children[..position]
            .iter()
            .rev()
            .find(|c| is_element(c))
            .cloned()
            .map(DomElement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HtmlDocument;

    fn find(doc: &HtmlDocument, name: &str) -> DomElement {
        doc.elements().into_iter().find(|e| e.name() == name).unwrap()
    }

    #[test]
    fn test_attribute_round_trip() {
        let doc = HtmlDocument::parse_fragment(r#"<a href="/x">Link</a>"#);
        let link = find(&doc, "a");

        link.set_attribute("target", "_blank");
        link.set_attribute("href", "https://example.com/");
        assert_eq!(link.get_attribute("href").as_deref(), Some("https://example.com/"));
        assert_eq!(link.get_attribute("target").as_deref(), Some("_blank"));
    }

    #[test]
    fn test_navigation() {
        let doc = HtmlDocument::parse_fragment("<div><span></span>text<em></em></div>");
        let em = find(&doc, "em");

        assert_eq!(em.prev_sibling_element().map(|e| e.name()).as_deref(), Some("span"));
        assert_eq!(em.parent_element().map(|e| e.name()).as_deref(), Some("div"));
        // Parent link still intact after lookups
        assert!(em.parent_element().is_some());
    }
}
