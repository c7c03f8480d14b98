//! HTML document handle
//!
//! Parses a body fragment with html5ever into an RcDom and serializes it
//! back. The fragment is parsed inside a synthetic body so the output only
//! carries what the input had.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::parse_document;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::{DomElement, HtmlError};

/// Parsed markup
pub struct HtmlDocument {
    dom: RcDom,
}

impl HtmlDocument {
    /// Parse markup meant to live inside `<body>`
    pub fn parse_fragment(markup: &str) -> Self {
        let wrapped = format!("<!DOCTYPE html><html><head></head><body>{}</body></html>", markup);
        let dom = parse_document(RcDom::default(), Default::default()).one(wrapped);
        tracing::debug!("Parsed HTML fragment ({} bytes)", markup.len());
        Self { dom }
    }

    /// The `<body>` element, when present
    pub fn body(&self) -> Option<Handle> {
        find_element(&self.dom.document, "body")
    }

    /// Every element in document order
    pub fn elements(&self) -> Vec<DomElement> {
        let mut out = Vec::new();
        collect_elements(&self.dom.document, &mut out);
        out
    }

    /// Serialize the body's children back to markup
    pub fn to_html(&self) -> Result<String, HtmlError> {
        let body = self.body().ok_or(HtmlError::MissingBody)?;

        let mut bytes = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        serialize(&mut bytes, &SerializableHandle::from(body), opts)
            .map_err(|e| HtmlError::Serialize(e.to_string()))?;

        String::from_utf8(bytes).map_err(|e| HtmlError::Serialize(e.to_string()))
    }
}

fn find_element(handle: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: qual, .. } = &handle.data {
        if qual.local.as_ref() == name {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, name))
}

fn collect_elements(handle: &Handle, out: &mut Vec<DomElement>) {
    if matches!(handle.data, NodeData::Element { .. }) {
        out.push(DomElement::new(handle.clone()));
    }
    for child in handle.children.borrow().iter() {
        collect_elements(child, out);
    }
}
