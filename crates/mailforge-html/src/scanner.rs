//! Markup scanner
//!
//! Splits markup into tags, comments, text and raw element bodies without
//! building a tree. The minifier and the pretty printer work on this token
//! stream so conditional comments, template tokens and unbalanced fragments
//! pass through exactly as written.

/// Markup token borrowing from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<!-- ... -->` including delimiters
    Comment(&'a str),
    /// `<!doctype ...>`, `<name ...>` or `</name>`
    Tag(Tag<'a>),
    Text(&'a str),
    /// Body of `script`, `style`, `pre` or `textarea`
    Raw(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub raw: &'a str,
    /// Lowercase name, `!doctype` for declarations
    pub name: String,
    pub closing: bool,
    pub self_closing: bool,
}

impl Tag<'_> {
    pub fn is_void(&self) -> bool {
        self.self_closing || self.name.starts_with('!') || VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Elements whose content is copied without interpretation
pub const RAW_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

/// Iterator over the tokens of a markup string
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    /// Set after an opening raw element tag; holds its name
    raw_until: Option<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_until: None,
        }
    }

    /// Byte offset of the next token
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn take(&mut self, len: usize) -> &'a str {
        let slice = &self.input[self.pos..self.pos + len];
        self.pos += len;
        slice
    }

    fn scan_raw(&mut self, name: &str) -> &'a str {
        let rest = self.rest();
        let closing = format!("</{}", name);
        let end = find_ignore_case(rest, &closing).unwrap_or(rest.len());
        self.take(end)
    }

    fn scan_tag(&mut self) -> Option<Tag<'a>> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let next = *bytes.get(1)?;
        if !(next.is_ascii_alphabetic() || next == b'/' || next == b'!') {
            return None;
        }

        // Tag ends at the first '>' outside quotes
        let mut quote: Option<u8> = None;
        let mut end = None;
        for (i, &b) in bytes.iter().enumerate().skip(1) {
            match (quote, b) {
                (Some(q), b) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'>') => {
                    end = Some(i + 1);
                    break;
                }
                _ => {}
            }
        }
        let end = end.unwrap_or(rest.len());

        let raw = self.take(end);
        let closing = raw.starts_with("</");
        let name_start = if closing { 2 } else { 1 };
        let name: String = raw[name_start..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
            .collect::<String>()
            .to_ascii_lowercase();
        let self_closing = raw.trim_end_matches('>').trim_end().ends_with('/');

        Some(Tag {
            raw,
            name,
            closing,
            self_closing,
        })
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.pos >= self.input.len() {
            return None;
        }

        if let Some(name) = self.raw_until.take() {
            let body = self.scan_raw(&name);
            if !body.is_empty() {
                return Some(Token::Raw(body));
            }
        }

        let rest = self.rest();
        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").map(|i| i + 7).unwrap_or(rest.len());
            return Some(Token::Comment(self.take(end)));
        }

        if rest.starts_with('<') {
            let saved = self.pos;
            if let Some(tag) = self.scan_tag() {
                if !tag.closing && !tag.self_closing && RAW_ELEMENTS.contains(&tag.name.as_str()) {
                    self.raw_until = Some(tag.name.clone());
                }
                return Some(Token::Tag(tag));
            }
            self.pos = saved;
            // A lone '<' is text
            let next_tag = rest[1..].find('<').map(|i| i + 1).unwrap_or(rest.len());
            return Some(Token::Text(self.take(next_tag)));
        }

        let end = rest.find('<').unwrap_or(rest.len());
        Some(Token::Text(self.take(end)))
    }
}

pub(crate) fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<String> {
        Scanner::new(input)
            .map(|t| match t {
                Token::Comment(_) => "comment".to_string(),
                Token::Tag(tag) if tag.closing => format!("/{}", tag.name),
                Token::Tag(tag) => tag.name,
                Token::Text(_) => "text".to_string(),
                Token::Raw(_) => "raw".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("<!doctype html><div class=\"a>b\">x</div><!-- c -->"),
            vec!["!doctype", "div", "text", "/div", "comment"]
        );
    }

    #[test]
    fn test_raw_elements() {
        let tokens: Vec<_> = Scanner::new("<style>a > b { }</style><pre> x <b></pre>").collect();
        assert_eq!(tokens[1], Token::Raw("a > b { }"));
        assert_eq!(tokens[4], Token::Raw(" x <b>"));
    }

    #[test]
    fn test_lone_angle_is_text() {
        assert_eq!(kinds("a < b <i>c</i>"), vec!["text", "text", "i", "text", "/i"]);
    }

    #[test]
    fn test_self_closing() {
        let tokens: Vec<_> = Scanner::new("<br/><img src=\"x\" />").collect();
        match &tokens[1] {
            Token::Tag(tag) => assert!(tag.self_closing && tag.is_void()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
