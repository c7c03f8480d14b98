//! Template-safe minification
//!
//! Template tokens such as `{{ color }}` inside CSS do not survive a CSS
//! minifier. The guard swaps them for placeholders the minifier accepts,
//! runs the minifier and puts the original token text back.
//!
//! CSS is found in two places: `style="..."` attribute values and the
//! contents of `<style>` blocks. Tokens are classified by position:
//! - value: after a property colon, before the declaration ends
//! - property: directly followed by a colon
//! - block: anywhere else (a whole declaration or a conditional region)
//!
//! Value tokens become `mj_value_temp_N_`, property tokens become the custom
//! property name `--mj-prop-temp-N`, and block tokens only have their
//! delimiters swapped for `__mjoI__` / `__mjcI__` markers so the enclosed
//! text is never touched. Minifiers leave marked CSS verbatim.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::GuardError;

pub(crate) const BLOCK_MARKER_PATTERN: &str = r"__mj[oc]\d+__";

static STYLE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bstyle="([^"]*)""#).unwrap());
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style(?:\b[^>]*)?>(.*?)</style\s*>").unwrap());
static VALUE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"mj_value_temp_(\d+)_").unwrap());
static PROPERTY_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--mj-prop-temp-(\d+)").unwrap());
static BLOCK_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__mj([oc])(\d+)__").unwrap());

/// Template variable delimiter pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSyntax {
    pub prefix: String,
    pub suffix: String,
}

impl TemplateSyntax {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// `{{ }}` and `[[ ]]`
    pub fn defaults() -> Vec<Self> {
        vec![Self::new("{{", "}}"), Self::new("[[", "]]")]
    }
}

/// Position of a template token within CSS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Value,
    Property,
    Block,
}

/// Template token located in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Byte range in the whole document
    pub span: Range<usize>,
    /// Index of the delimiter pair that matched
    pub syntax: usize,
    pub classification: Classification,
}

/// Document with its tokens swapped for placeholders
#[derive(Debug, Clone)]
pub struct Tokenized {
    pub html: String,
    values: Vec<String>,
    properties: Vec<String>,
    syntaxes: Vec<TemplateSyntax>,
}

impl Tokenized {
    /// Put every original token back, values first, then properties, then block delimiters
    pub fn restore(&self, minified: &str) -> String {
        let restored = VALUE_PLACEHOLDER.replace_all(minified, |caps: &regex::Captures| {
            lookup(&self.values, &caps[1]).unwrap_or_else(|| caps[0].to_string())
        });

        let restored = PROPERTY_PLACEHOLDER.replace_all(&restored, |caps: &regex::Captures| {
            lookup(&self.properties, &caps[1]).unwrap_or_else(|| caps[0].to_string())
        });

        BLOCK_MARKER
            .replace_all(&restored, |caps: &regex::Captures| {
                let syntax = caps[2].parse::<usize>().ok().and_then(|i| self.syntaxes.get(i));
                match (syntax, &caps[1]) {
                    (Some(s), "o") => s.prefix.clone(),
                    (Some(s), _) => s.suffix.clone(),
                    (None, _) => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

fn lookup(table: &[String], index: &str) -> Option<String> {
    index.parse::<usize>().ok().and_then(|i| table.get(i)).cloned()
}

/// Protects template tokens in CSS across a minification pass
#[derive(Debug, Clone)]
pub struct MinificationGuard {
    syntaxes: Vec<TemplateSyntax>,
    allow_mixed_syntax: bool,
}

impl Default for MinificationGuard {
    fn default() -> Self {
        Self::new(TemplateSyntax::defaults())
    }
}

impl MinificationGuard {
    pub fn new(syntaxes: Vec<TemplateSyntax>) -> Self {
        Self {
            syntaxes: syntaxes
                .into_iter()
                .filter(|s| !s.prefix.is_empty() && !s.suffix.is_empty())
                .collect(),
            allow_mixed_syntax: false,
        }
    }

    /// Permit block tokens alongside value or property tokens
    pub fn allow_mixed_syntax(mut self, allow: bool) -> Self {
        self.allow_mixed_syntax = allow;
        self
    }

    /// Tokenize, minify, restore
    pub fn protect<F>(&self, html: &str, minify: F) -> Result<String, GuardError>
    where
        F: FnOnce(&str) -> String,
    {
        let tokenized = self.tokenize(html)?;
        let minified = minify(&tokenized.html);
        Ok(tokenized.restore(&minified))
    }

    /// Fallible variant of [`protect`](Self::protect)
    pub fn try_protect<F, E>(&self, html: &str, minify: F) -> Result<String, GuardError>
    where
        F: FnOnce(&str) -> Result<String, E>,
        E: std::fmt::Display,
    {
        let tokenized = self.tokenize(html)?;
        let minified = minify(&tokenized.html).map_err(|e| GuardError::Minify(e.to_string()))?;
        Ok(tokenized.restore(&minified))
    }

    /// Byte ranges of CSS text: style attribute values and style block contents
    pub fn css_regions(&self, html: &str) -> Vec<Range<usize>> {
        let attributes = STYLE_ATTRIBUTE.captures_iter(html).filter_map(|c| c.get(1));
        let blocks = STYLE_BLOCK.captures_iter(html).filter_map(|c| c.get(1));

        let mut regions: Vec<Range<usize>> = attributes.chain(blocks).map(|m| m.range()).collect();
        regions.sort_by_key(|r| r.start);

        // An attribute-looking match inside a style block belongs to the block
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(regions.len());
        for region in regions {
            match merged.last_mut() {
                Some(last) if region.start < last.end => last.end = last.end.max(region.end),
                _ => merged.push(region),
            }
        }
        merged
    }

    /// Fail when any delimiter pair has different open and close counts in CSS
    pub fn check_balance(&self, html: &str) -> Result<(), GuardError> {
        let css: Vec<&str> = self.css_regions(html).into_iter().map(|r| &html[r]).collect();

        let broken: Vec<String> = self
            .syntaxes
            .iter()
            .filter_map(|syntax| {
                let open: usize = css.iter().map(|c| c.matches(syntax.prefix.as_str()).count()).sum();
                let close: usize = css.iter().map(|c| c.matches(syntax.suffix.as_str()).count()).sum();
                (open != close).then(|| {
                    format!("{}…{} ({} open, {} close)", syntax.prefix, syntax.suffix, open, close)
                })
            })
            .collect();

        if broken.is_empty() {
            Ok(())
        } else {
            Err(GuardError::Unbalanced {
                details: broken.join(", "),
            })
        }
    }

    /// Locate and classify every token inside CSS
    pub fn scan(&self, html: &str) -> Vec<Token> {
        let mut tokens = Vec::new();

        for region in self.css_regions(html) {
            let css = &html[region.clone()];
            let spans = self.token_spans(css);

            for (index, (span, syntax)) in spans.iter().enumerate() {
                let classification = classify(css, &spans, index);
                tokens.push(Token {
                    span: region.start + span.start..region.start + span.end,
                    syntax: *syntax,
                    classification,
                });
            }
        }

        tokens
    }

    /// Leftmost-first token spans in one CSS region
    fn token_spans(&self, css: &str) -> Vec<(Range<usize>, usize)> {
        let mut spans = Vec::new();
        let mut cursor = 0;

        while cursor < css.len() {
            let next = self
                .syntaxes
                .iter()
                .enumerate()
                .filter_map(|(i, s)| css[cursor..].find(s.prefix.as_str()).map(|p| (cursor + p, i)))
                .min_by_key(|(position, _)| *position);

            let Some((start, syntax)) = next else {
                break;
            };

            let body_start = start + self.syntaxes[syntax].prefix.len();
            let Some(close) = css[body_start..].find(self.syntaxes[syntax].suffix.as_str()) else {
                break;
            };

            let end = body_start + close + self.syntaxes[syntax].suffix.len();
            spans.push((start..end, syntax));
            cursor = end;
        }

        spans
    }

    /// Check balance and mixing, then swap every token for its placeholder
    pub fn tokenize(&self, html: &str) -> Result<Tokenized, GuardError> {
        self.check_balance(html)?;
        let tokens = self.scan(html);

        let has_block = tokens.iter().any(|t| t.classification == Classification::Block);
        let has_inline = tokens.iter().any(|t| t.classification != Classification::Block);

        tracing::debug!(
            "Template tokens in CSS: {} (block: {}, value/property: {})",
            tokens.len(),
            has_block,
            has_inline
        );

        if has_block && has_inline && !self.allow_mixed_syntax {
            return Err(GuardError::MixedSyntax);
        }

        let mut out = String::with_capacity(html.len());
        let mut values = Vec::new();
        let mut properties = Vec::new();
        let mut cursor = 0;

        for token in &tokens {
            out.push_str(&html[cursor..token.span.start]);
            let text = &html[token.span.clone()];

            match token.classification {
                Classification::Value => {
                    out.push_str(&format!("mj_value_temp_{}_", values.len()));
                    values.push(text.to_string());
                }
                Classification::Property => {
                    out.push_str(&format!("--mj-prop-temp-{}", properties.len()));
                    properties.push(text.to_string());
                }
                Classification::Block => {
                    let syntax = &self.syntaxes[token.syntax];
                    let inner = &text[syntax.prefix.len()..text.len() - syntax.suffix.len()];
                    out.push_str(&format!("__mjo{}__{}__mjc{}__", token.syntax, inner, token.syntax));
                }
            }

            cursor = token.span.end;
        }
        out.push_str(&html[cursor..]);

        Ok(Tokenized {
            html: out,
            values,
            properties,
            syntaxes: self.syntaxes.clone(),
        })
    }
}

/// Classify the token at `index` by the CSS outside of all tokens around it
fn classify(css: &str, spans: &[(Range<usize>, usize)], index: usize) -> Classification {
    let span = &spans[index].0;

    // Text between tokens, nearest first
    let mut end = span.start;
    let mut segments: Vec<Range<usize>> = Vec::new();
    for (previous, _) in spans[..index].iter().rev() {
        segments.push(previous.end..end);
        end = previous.start;
    }
    segments.push(0..end);

    let mut in_value = false;
    'scan: for segment in segments {
        for c in css[segment].chars().rev() {
            match c {
                ':' => {
                    in_value = true;
                    break 'scan;
                }
                ';' | '{' | '}' => break 'scan,
                _ => {}
            }
        }
    }

    if in_value {
        return Classification::Value;
    }

    if css[span.end..].trim_start().starts_with(':') {
        Classification::Property
    } else {
        Classification::Block
    }
}

impl Token {
    pub fn text<'a>(&self, html: &'a str) -> &'a str {
        &html[self.span.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{minify_declarations, minify_stylesheet};

    /// Minify every CSS region the way the HTML minifier does
    fn minify_css(html: &str) -> String {
        let html = STYLE_ATTRIBUTE.replace_all(html, |caps: &regex::Captures| {
            format!("style=\"{}\"", minify_declarations(&caps[1]))
        });
        let re = Regex::new(r"(?is)(<style(?:\b[^>]*)?>)(.*?)(</style\s*>)").unwrap();
        re.replace_all(&html, |caps: &regex::Captures| {
            format!("{}{}{}", &caps[1], minify_stylesheet(&caps[2]), &caps[3])
        })
        .into_owned()
    }

    fn classes(guard: &MinificationGuard, html: &str) -> Vec<Classification> {
        guard.scan(html).into_iter().map(|t| t.classification).collect()
    }

    #[test]
    fn test_unbalanced_fails_before_minify() {
        let html = r#"<div style="{{ a: {{ b }};"></div>"#;
        let result = MinificationGuard::default().protect(html, |_| panic!("minifier must not run"));

        match result {
            Err(GuardError::Unbalanced { details }) => {
                assert!(details.contains("{{…}} (2 open, 1 close)"), "{}", details);
            }
            other => panic!("expected unbalanced error, got {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_message() {
        let err = MinificationGuard::default()
            .check_balance("<style>.a { color: [[ c; }</style>")
            .unwrap_err();
        assert!(err.to_string().starts_with("Unbalanced template delimiters found in CSS"));
    }

    #[test]
    fn test_classification() {
        let guard = MinificationGuard::default();

        assert_eq!(classes(&guard, r#"<p style="color: {{ c }}"></p>"#), vec![Classification::Value]);
        assert_eq!(classes(&guard, r#"<p style="{{ p }} : red"></p>"#), vec![Classification::Property]);
        assert_eq!(classes(&guard, r#"<p style="color: red; {{ rest }}"></p>"#), vec![Classification::Block]);
        assert_eq!(
            classes(&guard, "<style>.a { {{ decl }} } .b{color:[[ c ]]}</style>"),
            vec![Classification::Block, Classification::Value]
        );
    }

    #[test]
    fn test_colon_inside_token_is_ignored() {
        let guard = MinificationGuard::default();
        assert_eq!(classes(&guard, r#"<p style="{{ a:b }}"></p>"#), vec![Classification::Block]);
        assert_eq!(
            classes(&guard, r#"<p style="{{ a:b }} {{ c }}"></p>"#),
            vec![Classification::Block, Classification::Block]
        );
    }

    #[test]
    fn test_value_and_property_round_trip() {
        let html = concat!(
            r#"<div style="{{ prop }} : red;  color :  {{ c }} ;  padding : 0px 0px"></div>"#,
            "<style>\n  .a {\n    width: [[ w ]];\n  }\n</style>"
        );

        let out = MinificationGuard::default().protect(html, minify_css).unwrap();

        assert!(out.contains("{{ prop }}"));
        assert!(out.contains("{{ c }}"));
        assert!(out.contains("[[ w ]]"));
        assert!(!out.contains("mj_value_temp"));
        assert!(!out.contains("--mj-prop-temp"));
        assert!(!out.contains("\n    width"));
    }

    #[test]
    fn test_block_interior_kept_byte_for_byte() {
        let token = "{{#if dark}}\n   .a {  color: white; }\n{{/if}}";
        let html = format!("<style>\n.a {{ color: red; }}\n{}\n</style>", token);
        let out = MinificationGuard::default().protect(&html, minify_css).unwrap();

        assert!(out.contains("{{#if dark}}"));
        assert!(out.contains("{{/if}}"));
        assert!(out.contains("\n   .a {  color: white; }\n"));
        assert!(!out.contains("__mjo"));
    }

    #[test]
    fn test_multiline_block_token() {
        let html = "<div style=\"{{\n  styles.card\n}}\"></div>";
        let out = MinificationGuard::default().protect(html, minify_css).unwrap();
        assert!(out.contains("{{\n  styles.card\n}}"));
    }

    #[test]
    fn test_mixed_syntax_rejected() {
        let html = r#"<div style="{{ block }}; color: {{ c }}"></div>"#;
        let result = MinificationGuard::default().protect(html, |s| s.to_string());
        assert!(matches!(result, Err(GuardError::MixedSyntax)));
        assert!(result.unwrap_err().to_string().contains("Mixed variable syntax detected"));
    }

    #[test]
    fn test_mixed_syntax_allowed() {
        let html = r#"<div style="{{ block }}; color: [[ c ]]"></div>"#;
        let out = MinificationGuard::default()
            .allow_mixed_syntax(true)
            .protect(html, minify_css)
            .unwrap();
        assert!(out.contains("{{ block }}"));
        assert!(out.contains("[[ c ]]"));
    }

    #[test]
    fn test_many_value_tokens_restore_in_place() {
        let decls: Vec<String> = (0..12).map(|i| format!("--v{}: {{{{ t{} }}}}", i, i)).collect();
        let html = format!("<style>.a {{ color: red; }} .b {{ {} }}</style>", decls.join("; "));

        let out = MinificationGuard::default().protect(&html, |s| s.to_string()).unwrap();
        assert_eq!(out, html);
    }

    #[test]
    fn test_custom_syntax() {
        let guard = MinificationGuard::new(vec![TemplateSyntax::new("<%", "%>")]);
        let html = r#"<p style="color: <%= c %>"></p>"#;
        let tokenized = guard.tokenize(html).unwrap();
        assert_eq!(tokenized.html, r#"<p style="color: mj_value_temp_0_"></p>"#);
        assert_eq!(tokenized.restore(&tokenized.html), html);
    }

    #[test]
    fn test_tokens_outside_css_ignored() {
        let html = r#"<p title="{{ t }}">Hello {{ name }}</p><div style="margin: 0"></div>"#;
        let tokenized = MinificationGuard::default().tokenize(html).unwrap();
        assert_eq!(tokenized.html, html);
    }

    #[test]
    fn test_syntax_defaults_deserialize() {
        let syntax: TemplateSyntax = serde_json::from_str(r#"{"prefix":"{%","suffix":"%}"}"#).unwrap();
        assert_eq!(syntax, TemplateSyntax::new("{%", "%}"));
        assert_eq!(TemplateSyntax::defaults().len(), 2);
    }
}
