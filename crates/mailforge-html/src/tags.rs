//! Tag tree over the scanner's token stream
//!
//! Records where every element's start tag sits in the source, its
//! attributes and its place among its parent's children, so selectors can
//! be matched without building a DOM. Edits are spliced into the original
//! text; everything not edited is written back byte for byte, which keeps
//! doctypes, conditional comments and template tokens as written.

use std::ops::Range;

use mailforge_css::MatchElement;

use crate::scanner::{Scanner, Token};

#[derive(Debug)]
struct RawAttribute {
    name: String,
    /// Whole `name=value` text
    span: Range<usize>,
    /// Value text, inside the quotes when quoted
    value: Option<Range<usize>>,
}

#[derive(Debug)]
struct TagNode {
    name: String,
    /// Start tag text
    tag: Range<usize>,
    /// End of the name inside the start tag
    name_end: usize,
    attributes: Vec<RawAttribute>,
    parent: Option<usize>,
    prev_sibling: Option<usize>,
    /// Start tag through end tag, once the end tag is seen
    outer: Option<Range<usize>>,
    /// Between the start and end tags
    inner: Option<Range<usize>>,
}

/// Element positions of a markup string
pub struct TagTree<'a> {
    source: &'a str,
    nodes: Vec<TagNode>,
    edits: Vec<(Range<usize>, String)>,
}

impl<'a> TagTree<'a> {
    pub fn parse(source: &'a str) -> Self {
        let mut nodes: Vec<TagNode> = Vec::new();
        // Open elements with the last element child seen inside each
        let mut stack: Vec<(usize, Option<usize>)> = Vec::new();
        let mut last_top: Option<usize> = None;
        let mut scanner = Scanner::new(source);

        loop {
            let start = scanner.offset();
            let Some(token) = scanner.next() else {
                break;
            };
            let Token::Tag(tag) = token else {
                continue;
            };
            if tag.name.is_empty() || tag.name.starts_with('!') || tag.name.starts_with('?') {
                continue;
            }
            let end = start + tag.raw.len();

            if tag.closing {
                let Some(depth) = stack.iter().rposition(|(i, _)| nodes[*i].name == tag.name) else {
                    continue;
                };
                for (index, _) in stack.drain(depth..) {
                    let node = &mut nodes[index];
                    if node.name == tag.name {
                        node.outer = Some(node.tag.start..end);
                        node.inner = Some(node.tag.end..start);
                    }
                }
                continue;
            }

            let index = nodes.len();
            let (parent, prev_sibling) = match stack.last_mut() {
                Some((parent, last_child)) => (Some(*parent), last_child.replace(index)),
                None => (None, last_top.replace(index)),
            };
            let (name_end, attributes) = scan_attributes(source, start..end);
            nodes.push(TagNode {
                name: tag.name.clone(),
                tag: start..end,
                name_end,
                attributes,
                parent,
                prev_sibling,
                outer: None,
                inner: None,
            });
            if !tag.is_void() {
                stack.push((index, None));
            }
        }

        Self {
            source,
            nodes,
            edits: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn element(&self, index: usize) -> TagElement<'_, 'a> {
        TagElement { tree: self, index }
    }

    /// Elements in document order
    pub fn elements(&self) -> impl Iterator<Item = TagElement<'_, 'a>> {
        (0..self.nodes.len()).map(move |index| self.element(index))
    }

    /// Set or replace an attribute of the element at `index`
    pub fn set_attribute(&mut self, index: usize, name: &str, value: &str) {
        let node = &self.nodes[index];
        let escaped = escape_attribute(value);
        let edit = match node.attributes.iter().find(|a| a.name == name) {
            Some(existing) => (existing.span.clone(), format!("{}=\"{}\"", name, escaped)),
            None => {
                let at = node.attributes.last().map(|a| a.span.end).unwrap_or(node.name_end);
                (at..at, format!(" {}=\"{}\"", name, escaped))
            }
        };
        self.edits.push(edit);
    }

    /// Remove the element at `index` with everything up to its end tag
    pub fn remove(&mut self, index: usize) {
        let node = &self.nodes[index];
        let range = node.outer.clone().unwrap_or_else(|| node.tag.clone());
        self.edits.push((range, String::new()));
    }

    /// Source with every edit applied
    pub fn to_html(&self) -> String {
        let mut edits: Vec<&(Range<usize>, String)> = self.edits.iter().collect();
        edits.sort_by_key(|(range, _)| (range.start, range.end));

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (range, text) in edits {
            // Edits inside a removed element
            if range.start < cursor {
                continue;
            }
            out.push_str(&self.source[cursor..range.start]);
            out.push_str(text);
            cursor = range.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// Element handle used for selector matching
#[derive(Clone, Copy)]
pub struct TagElement<'t, 'a> {
    tree: &'t TagTree<'a>,
    index: usize,
}

impl<'t, 'a> TagElement<'t, 'a> {
    fn node(&self) -> &'t TagNode {
        &self.tree.nodes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'t str {
        &self.node().name
    }

    /// Attribute value with character references decoded
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let attribute = self.node().attributes.iter().find(|a| a.name == name)?;
        Some(match &attribute.value {
            Some(range) => unescape_attribute(&self.tree.source[range.clone()]),
            None => String::new(),
        })
    }

    /// Content between the start and end tags
    pub fn inner(&self) -> &'a str {
        match &self.node().inner {
            Some(range) => &self.tree.source[range.clone()],
            None => "",
        }
    }

    /// True when some ancestor is named `name`
    pub fn has_ancestor(&self, name: &str) -> bool {
        let mut current = self.parent_element();
        while let Some(element) = current {
            if element.name() == name {
                return true;
            }
            current = element.parent_element();
        }
        false
    }
}

impl MatchElement for TagElement<'_, '_> {
    fn local_name(&self) -> String {
        self.node().name.clone()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn parent_element(&self) -> Option<Self> {
        self.node().parent.map(|index| self.tree.element(index))
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.node().prev_sibling.map(|index| self.tree.element(index))
    }
}

/// Attributes of the start tag at `tag`, with the end of the tag name
fn scan_attributes(source: &str, tag: Range<usize>) -> (usize, Vec<RawAttribute>) {
    let bytes = source.as_bytes();
    let end = tag.end;
    let mut i = tag.start + 1;
    while i < end && !is_name_end(bytes[i]) {
        i += 1;
    }
    let name_end = i;

    let mut attributes = Vec::new();
    loop {
        while i < end && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= end || bytes[i] == b'>' {
            break;
        }

        let start = i;
        while i < end && !is_name_end(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let name = source[start..i].to_ascii_lowercase();
        if name.is_empty() {
            i += 1;
            continue;
        }

        let mut j = i;
        while j < end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if j < end && bytes[j] == b'=' {
            j += 1;
            while j < end && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < end && (bytes[j] == b'"' || bytes[j] == b'\'') {
                let quote = bytes[j];
                let value_start = j + 1;
                let mut k = value_start;
                while k < end && bytes[k] != quote {
                    k += 1;
                }
                value = Some(value_start..k);
                i = (k + 1).min(end);
            } else {
                let value_start = j;
                while j < end && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                    j += 1;
                }
                value = Some(value_start..j);
                i = j;
            }
        }

        attributes.push(RawAttribute {
            name,
            span: start..i,
            value,
        });
    }

    (name_end, attributes)
}

fn is_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'>' || b == b'/'
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn unescape_attribute(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
