//! HTML minifier
//!
//! Whitespace collapsing over the scanner token stream. Text runs collapse
//! to one space, whitespace-only runs between block level tags disappear,
//! `pre`/`textarea`/`script` bodies pass through, and CSS in `style`
//! attributes and `<style>` blocks goes through the CSS minifier.

use std::sync::LazyLock;

use mailforge_css::{minify_declarations, minify_stylesheet};
use regex::Regex;

use crate::scanner::{Scanner, Tag, Token};

static STYLE_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(\bstyle=")([^"]*)(")"#).unwrap());
static EMPTY_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\s+(?:style|class)="\s*""#).unwrap());

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "big", "br", "code", "em", "font", "i", "img", "amp-img", "label", "small", "span",
    "strike", "strong", "sub", "sup", "u", "s",
];

/// Minifier settings
#[derive(Debug, Clone, Copy)]
pub struct MinifyOptions {
    /// Keep ordinary comments. Conditional comments are always kept.
    pub keep_comments: bool,
    /// Run CSS through the CSS minifier
    pub minify_css: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            keep_comments: true,
            minify_css: true,
        }
    }
}

/// Whitespace and CSS minifier
#[derive(Debug, Clone, Default)]
pub struct HtmlMinifier {
    options: MinifyOptions,
}

impl HtmlMinifier {
    pub fn new(options: MinifyOptions) -> Self {
        Self { options }
    }

    pub fn minify(&self, html: &str) -> String {
        let tokens: Vec<Token<'_>> = Scanner::new(html).collect();
        let mut out = String::with_capacity(html.len());
        let mut raw_parent: Option<String> = None;

        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Comment(comment) => {
                    if self.options.keep_comments || is_conditional_comment(comment) {
                        out.push_str(comment);
                    }
                }
                Token::Tag(tag) => {
                    out.push_str(&self.minify_tag(tag));
                    raw_parent = (!tag.closing).then(|| tag.name.clone());
                }
                Token::Raw(body) => {
                    if raw_parent.as_deref() == Some("style") && self.options.minify_css {
                        out.push_str(&minify_stylesheet(body));
                    } else {
                        out.push_str(body);
                    }
                }
                Token::Text(text) => {
                    let collapsed = collapse_whitespace(text);
                    if collapsed == " " && !(is_inline(tokens[..i].last()) && is_inline(tokens.get(i + 1))) {
                        continue;
                    }
                    out.push_str(&collapsed);
                }
            }
        }

        tracing::debug!("Minified HTML {} -> {} bytes", html.len(), out.len());
        out
    }

    fn minify_tag(&self, tag: &Tag<'_>) -> String {
        if tag.closing {
            return format!("</{}>", tag.name);
        }

        let collapsed = collapse_tag_whitespace(tag.raw);
        let styled = if self.options.minify_css {
            STYLE_VALUE
                .replace_all(&collapsed, |caps: &regex::Captures| {
                    format!("{}{}{}", &caps[1], minify_declarations(&caps[2]), &caps[3])
                })
                .into_owned()
        } else {
            collapsed
        };

        EMPTY_ATTRIBUTE.replace_all(&styled, "").into_owned()
    }
}

/// `<!--[if ...]>` openers and `<!--<![endif]-->` closers
pub fn is_conditional_comment(comment: &str) -> bool {
    comment.starts_with("<!--[if") || comment.starts_with("<!--<![endif]")
}

fn is_inline(token: Option<&Token<'_>>) -> bool {
    match token {
        Some(Token::Tag(tag)) => INLINE_ELEMENTS.contains(&tag.name.as_str()),
        Some(Token::Text(_)) => true,
        _ => false,
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Collapse whitespace between attributes, leaving quoted values alone
fn collapse_tag_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for c in raw.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space && c != '>' && !(c == '/' && raw.ends_with("/>")) {
                    out.push(' ');
                }
                pending_space = false;
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(html: &str) -> String {
        HtmlMinifier::default().minify(html)
    }

    #[test]
    fn test_collapses_text_and_block_gaps() {
        let html = "<table>\n  <tr>\n    <td>  Hello\n   world  </td>\n  </tr>\n</table>";
        assert_eq!(minify(html), "<table><tr><td> Hello world </td></tr></table>");
    }

    #[test]
    fn test_keeps_space_between_inline_elements() {
        assert_eq!(minify("<span>a</span>\n  <b>b</b>"), "<span>a</span> <b>b</b>");
    }

    #[test]
    fn test_pre_verbatim() {
        let html = "<div>\n<pre>  keep\n   this </pre>\n</div>";
        assert_eq!(minify(html), "<div><pre>  keep\n   this </pre></div>");
    }

    #[test]
    fn test_comments() {
        let html = "<!-- note --><!--[if mso]><table><tr><![endif]--><p>x</p>";
        assert_eq!(minify(html), html);

        let dropped = HtmlMinifier::new(MinifyOptions {
            keep_comments: false,
            minify_css: true,
        })
        .minify(html);
        assert_eq!(dropped, "<!--[if mso]><table><tr><![endif]--><p>x</p>");
    }

    #[test]
    fn test_style_attribute_and_block() {
        let html = "<style type=\"text/css\">\n  .a {\n    color: red;\n  }\n</style><div   style=\"margin : 0px ;\"  class=\"\">x</div>";
        assert_eq!(
            minify(html),
            "<style type=\"text/css\">.a{color:red}</style><div style=\"margin:0\">x</div>"
        );
    }

    #[test]
    fn test_css_untouched_when_disabled() {
        let html = "<div style=\"margin : 0px ;\">x</div>";
        let out = HtmlMinifier::new(MinifyOptions {
            keep_comments: true,
            minify_css: false,
        })
        .minify(html);
        assert_eq!(out, html);
    }

    #[test]
    fn test_self_closing_tag_whitespace() {
        assert_eq!(minify("<img  src=\"a.png\"   />"), "<img src=\"a.png\"/>");
    }
}
