//! Markup parser collaborator
//!
//! Turns source text into an [`ElementNode`] tree with quick-xml. Elements
//! registered as ending tags keep their inner markup verbatim as content:
//! their body is cut from the source up to the matching end tag and never
//! goes through the XML reader, so HTML inside `mj-text` (bare `&`, void
//! tags, template tokens) never has to be well-formed XML. Other elements
//! collect their text as content.

use std::collections::HashSet;

use mailforge_dom::{Attributes, ElementNode};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Markup parse failure
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("XML error at line {line}: {message}")]
    Xml { line: usize, message: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("No root element found")]
    NoRoot,
}

/// Produces an element tree from source text
pub trait MarkupParser: Send + Sync {
    fn parse(&self, source: &str, ending_tags: &HashSet<String>) -> Result<ElementNode, ParseError>;
}

/// quick-xml backed parser
#[derive(Debug, Clone)]
pub struct XmlParser {
    keep_comments: bool,
}

impl Default for XmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlParser {
    pub fn new() -> Self {
        Self { keep_comments: true }
    }

    /// Keep comments between elements as raw nodes
    pub fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }
}

impl MarkupParser for XmlParser {
    fn parse(&self, source: &str, ending_tags: &HashSet<String>) -> Result<ElementNode, ParseError> {
        let lines = LineIndex::new(source);
        let mut base = 0;
        let mut reader = reader_at(source, base);

        let mut stack: Vec<ElementNode> = Vec::new();
        let mut root: Option<ElementNode> = None;

        loop {
            let start = base + reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|e| ParseError::Xml {
                line: lines.line_at(base + reader.error_position() as usize),
                message: e.to_string(),
            })?;

            match event {
                Event::Start(e) => {
                    let mut node = element(&reader, &e)?.with_line(lines.line_at(start));
                    if ending_tags.contains(&node.tag_name) {
                        let open_end = base + reader.buffer_position() as usize;
                        let (inner_end, close_end) =
                            find_end_tag(source, open_end, &node.tag_name).ok_or_else(|| ParseError::Xml {
                                line: node.line.unwrap_or(0),
                                message: format!("Unclosed <{}>", node.tag_name),
                            })?;
                        node.content = Some(source[open_end..inner_end].trim().to_string());
                        attach(&mut stack, &mut root, node);

                        base = close_end;
                        reader = reader_at(source, base);
                    } else {
                        stack.push(node);
                    }
                }
                Event::Empty(e) => {
                    let node = element(&reader, &e)?.with_line(lines.line_at(start));
                    attach(&mut stack, &mut root, node);
                }
                Event::End(_) => {
                    if let Some(node) = stack.pop() {
                        attach(&mut stack, &mut root, node);
                    }
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(|e| ParseError::Encoding(e.to_string()))?;
                    append_text(&mut stack, &text);
                }
                Event::GeneralRef(e) => {
                    let name = e.decode().map_err(|e| ParseError::Encoding(e.to_string()))?;
                    append_text(&mut stack, &format!("&{};", name));
                }
                Event::CData(e) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|e| ParseError::Encoding(e.to_string()))?;
                    append_text(&mut stack, &text);
                }
                Event::Comment(e) => {
                    if self.keep_comments && !stack.is_empty() {
                        let text = reader
                            .decoder()
                            .decode(&e)
                            .map_err(|e| ParseError::Encoding(e.to_string()))?;
                        let raw = ElementNode::new("mj-raw")
                            .with_content(format!("<!--{}-->", text))
                            .with_line(lines.line_at(start));
                        attach(&mut stack, &mut root, raw);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        // Close whatever the source left open
        while let Some(node) = stack.pop() {
            attach(&mut stack, &mut root, node);
        }

        let root = root.ok_or(ParseError::NoRoot)?;
        tracing::debug!("Parsed <{}> with {} nodes", root.tag_name, root.node_count());
        Ok(root)
    }
}

fn reader_at(source: &str, offset: usize) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(&source[offset..]);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;
    reader
}

/// Offsets of the end tag closing the element whose start tag ends at
/// `from`: where the inner markup stops and where the end tag stops.
/// Same-name elements nested inside are skipped, as are comments.
fn find_end_tag(source: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut cursor = from;

    while let Some(offset) = source[cursor..].find('<') {
        let at = cursor + offset;
        let rest = &source[at..];

        if rest.starts_with("<!--") {
            cursor = at + rest.find("-->").map(|i| i + 3)?;
            continue;
        }

        if let Some(after) = rest.strip_prefix("</").and_then(|r| r.strip_prefix(name)) {
            if ends_name(after) {
                let close_end = at + (rest.len() - after.len()) + after.find('>')? + 1;
                if depth == 0 {
                    return Some((at, close_end));
                }
                depth -= 1;
                cursor = close_end;
                continue;
            }
        }

        if let Some(after) = rest.strip_prefix('<').and_then(|r| r.strip_prefix(name)) {
            if ends_name(after) {
                let tag_end = after.find('>')?;
                if !after[..tag_end].trim_end().ends_with('/') {
                    depth += 1;
                }
                cursor = at + (rest.len() - after.len()) + tag_end + 1;
                continue;
            }
        }

        cursor = at + 1;
    }

    None
}

fn ends_name(after: &str) -> bool {
    after.starts_with(|c: char| c == '>' || c == '/' || c.is_whitespace())
}

fn element(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<ElementNode, ParseError> {
    let decoder = reader.decoder();
    let tag_name = decoder
        .decode(start.name().as_ref())
        .map_err(|e| ParseError::Encoding(e.to_string()))?
        .into_owned();

    let mut attributes = Attributes::new();
    for attr in start.attributes().with_checks(false).flatten() {
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|e| ParseError::Encoding(e.to_string()))?;
        let value = decoder
            .decode(attr.value.as_ref())
            .map_err(|e| ParseError::Encoding(e.to_string()))?;
        attributes.insert(key.into_owned(), value.into_owned());
    }

    Ok(ElementNode {
        tag_name,
        attributes,
        ..Default::default()
    })
}

fn attach(stack: &mut [ElementNode], root: &mut Option<ElementNode>, mut node: ElementNode) {
    node.content = node
        .content
        .take()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

/// Text inside a non-ending element accumulates as its content
fn append_text(stack: &mut [ElementNode], text: &str) {
    if let Some(parent) = stack.last_mut() {
        parent.content.get_or_insert_with(String::new).push_str(text);
    }
}

/// Byte offset to 1-based line number
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn line_at(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ending() -> HashSet<String> {
        ["mj-text", "mj-raw", "mj-title"].iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tree_with_lines() {
        let source = "<mjml>\n  <mj-body>\n    <mj-section padding=\"0\">\n      <mj-column />\n    </mj-section>\n  </mj-body>\n</mjml>";
        let root = XmlParser::new().parse(source, &ending()).unwrap();

        assert_eq!(root.tag_name, "mjml");
        assert_eq!(root.line, Some(1));
        let body = root.find_child("mj-body").unwrap();
        assert_eq!(body.line, Some(2));
        let section = body.find_child("mj-section").unwrap();
        assert_eq!(section.attr("padding"), Some("0"));
        assert_eq!(section.line, Some(3));
        assert_eq!(section.children[0].tag_name, "mj-column");
        assert_eq!(section.children[0].line, Some(4));
    }

    #[test]
    fn test_ending_tag_keeps_inner_markup() {
        let source = r#"<mjml><mj-body><mj-text color="red">
            Hello <b>world</b><br> &amp; {{ name }}
        </mj-text></mj-body></mjml>"#;
        let root = XmlParser::new().parse(source, &ending()).unwrap();
        let text = &root.children[0].children[0];

        assert_eq!(text.tag_name, "mj-text");
        assert_eq!(text.content.as_deref(), Some("Hello <b>world</b><br> &amp; {{ name }}"));
        assert!(text.children.is_empty());
    }

    #[test]
    fn test_ending_tag_bodies_are_not_xml() {
        let source = "<mjml>\n<mj-body>\n<mj-text>Fish & chips && peas</mj-text>\n<mj-button href=\"#\">Terms & conditions</mj-button>\n<mj-raw><script>if (a && b) { go(); }</script></mj-raw>\n<mj-spacer />\n</mj-body>\n</mjml>";
        let mut tags = ending();
        tags.insert("mj-button".to_string());
        let root = XmlParser::new().parse(source, &tags).unwrap();
        let body = &root.children[0];

        assert_eq!(body.children[0].content.as_deref(), Some("Fish & chips && peas"));
        assert_eq!(body.children[1].content.as_deref(), Some("Terms & conditions"));
        assert_eq!(body.children[1].attr("href"), Some("#"));
        assert_eq!(
            body.children[2].content.as_deref(),
            Some("<script>if (a && b) { go(); }</script>")
        );
        assert_eq!(body.children[3].tag_name, "mj-spacer");
        assert_eq!(body.children[3].line, Some(6));
    }

    #[test]
    fn test_nested_same_name_and_commented_end_tags() {
        let source = "<mjml><mj-raw><!-- </mj-raw> --><mj-raw>a</mj-raw><mj-raw/>b</mj-raw></mjml>";
        let root = XmlParser::new().parse(source, &ending()).unwrap();
        assert_eq!(
            root.children[0].content.as_deref(),
            Some("<!-- </mj-raw> --><mj-raw>a</mj-raw><mj-raw/>b")
        );
    }

    #[test]
    fn test_unclosed_ending_tag() {
        let err = XmlParser::new().parse("<mjml>\n<mj-text>a & b", &ending()).unwrap_err();
        assert!(matches!(err, ParseError::Xml { line: 2, .. }));
    }

    #[test]
    fn test_text_of_plain_elements() {
        let source = r#"<mjml><mj-head><mj-html-attributes><mj-selector path=".a"><mj-html-attribute name="data-x">42</mj-html-attribute></mj-selector></mj-html-attributes></mj-head></mjml>"#;
        let root = XmlParser::new().parse(source, &ending()).unwrap();
        let attribute = &root.children[0].children[0].children[0].children[0];
        assert_eq!(attribute.attr("name"), Some("data-x"));
        assert_eq!(attribute.content.as_deref(), Some("42"));
    }

    #[test]
    fn test_comments_become_raw_nodes() {
        let source = "<mjml><mj-body><!-- note --><mj-section /></mj-body></mjml>";
        let root = XmlParser::new().parse(source, &ending()).unwrap();
        let body = &root.children[0];
        assert_eq!(body.children[0].tag_name, "mj-raw");
        assert_eq!(body.children[0].content.as_deref(), Some("<!-- note -->"));

        let stripped = XmlParser::new().keep_comments(false).parse(source, &ending()).unwrap();
        assert_eq!(stripped.children[0].children.len(), 1);
    }

    #[test]
    fn test_empty_source() {
        assert!(matches!(XmlParser::new().parse("", &ending()), Err(ParseError::NoRoot)));
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nb\n\nc");
        assert_eq!(index.line_at(0), 1);
        assert_eq!(index.line_at(2), 2);
        assert_eq!(index.line_at(4), 3);
        assert_eq!(index.line_at(5), 4);
    }
}
