//! Pretty printer
//!
//! One tag, comment or text run per line, indented by nesting depth.

use crate::scanner::{Scanner, Token};

const INDENT: &str = "  ";

/// Re-indent markup
pub fn beautify(html: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut depth = 0usize;

    for token in Scanner::new(html) {
        match token {
            Token::Tag(tag) if tag.closing => {
                depth = depth.saturating_sub(1);
                lines.push(format!("{}{}", INDENT.repeat(depth), tag.raw.trim()));
            }
            Token::Tag(tag) => {
                lines.push(format!("{}{}", INDENT.repeat(depth), tag.raw.trim()));
                if !tag.is_void() {
                    depth += 1;
                }
            }
            Token::Comment(comment) => lines.push(format!("{}{}", INDENT.repeat(depth), comment)),
            Token::Raw(body) => {
                if !body.trim().is_empty() {
                    lines.push(body.trim_matches('\n').to_string());
                }
            }
            Token::Text(text) => {
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !text.is_empty() {
                    lines.push(format!("{}{}", INDENT.repeat(depth), text));
                }
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting() {
        let out = beautify("<div><p>Hello   there</p><br><img src=\"x\"/></div>");
        assert_eq!(
            out,
            "<div>\n  <p>\n    Hello there\n  </p>\n  <br>\n  <img src=\"x\"/>\n</div>\n"
        );
    }

    #[test]
    fn test_raw_bodies_kept() {
        let out = beautify("<style>\n.a { color: red; }\n</style>");
        assert_eq!(out, "<style>\n.a { color: red; }\n</style>\n");
    }

    #[test]
    fn test_unbalanced_closing_does_not_underflow() {
        let out = beautify("</div><p>x</p>");
        assert!(out.starts_with("</div>\n<p>"));
    }
}
