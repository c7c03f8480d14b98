//! CSS inlining
//!
//! Merges collected inline CSS into the `style` attribute of every matching
//! element. Declarations are applied in cascade order (importance, then
//! specificity, then source order) so the last matching rule wins.
//! Declarations already in a `style` attribute beat stylesheet declarations
//! unless those are `!important`.
//!
//! Works on the [`TagTree`] of the document rather than a parsed DOM: only
//! `style` attributes inside the body change, the rest of the markup is kept
//! as written.

use mailforge_css::{parse_rules, Specificity, StyleRule};

use crate::tags::{TagElement, TagTree};
use crate::HtmlError;

/// Inlining behavior
#[derive(Debug, Clone, Copy)]
pub struct InlineOptions {
    /// Keep `<style>` blocks of the document. When false, blocks without
    /// at-rules are removed after inlining; media queries and font faces stay.
    pub keep_style_tags: bool,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self { keep_style_tags: true }
    }
}

/// Inline `css` into a document or fragment
pub fn inline_css(markup: &str, css: &str, options: InlineOptions) -> Result<String, HtmlError> {
    let rules = parse_rules(css)?;
    if rules.is_empty() && options.keep_style_tags {
        return Ok(markup.to_string());
    }

    let mut tree = TagTree::parse(markup);
    let has_body = tree.elements().any(|e| e.name() == "body");

    let styles: Vec<(usize, String)> = tree
        .elements()
        .filter(|e| !has_body || e.has_ancestor("body"))
        .filter_map(|e| computed_style(&e, &rules).map(|style| (e.index(), style)))
        .collect();
    let styled = styles.len();
    for (index, style) in styles {
        tree.set_attribute(index, "style", &style);
    }

    if !options.keep_style_tags {
        remove_plain_style_tags(&mut tree);
    }

    tracing::debug!("Inlined {} rules into {} elements", rules.len(), styled);
    Ok(tree.to_html())
}

struct Matched<'a> {
    property: &'a str,
    value: &'a str,
    important: bool,
    specificity: Specificity,
    order: usize,
}

/// Merged style attribute, or None when no rule matches
fn computed_style(element: &TagElement<'_, '_>, rules: &[StyleRule]) -> Option<String> {
    let mut matches: Vec<Matched<'_>> = Vec::new();
    let mut order = 0;

    for rule in rules {
        let specificity = rule.selectors.match_specificity(element);
        for declaration in &rule.declarations {
            order += 1;
            if let Some(specificity) = specificity {
                matches.push(Matched {
                    property: &declaration.property,
                    value: &declaration.value,
                    important: declaration.important,
                    specificity,
                    order,
                });
            }
        }
    }

    if matches.is_empty() {
        return None;
    }

    matches.sort_by(|a, b| {
        a.important
            .cmp(&b.important)
            .then(a.specificity.cmp(&b.specificity))
            .then(a.order.cmp(&b.order))
    });

    // property -> (value, important), first-seen order kept
    let mut computed: Vec<(String, String, bool)> = Vec::new();
    for m in &matches {
        set_property(&mut computed, m.property, m.value, m.important);
    }

    let existing = element.get_attribute("style").unwrap_or_default();
    for (property, value) in split_declarations(&existing) {
        let stylesheet_important = computed
            .iter()
            .any(|(p, _, important)| p.eq_ignore_ascii_case(&property) && *important);
        if !stylesheet_important {
            set_property(&mut computed, &property, &value, false);
        }
    }

    let style = computed
        .iter()
        .map(|(p, v, _)| format!("{}: {};", p, v))
        .collect::<Vec<_>>()
        .join(" ");
    Some(style)
}

fn set_property(computed: &mut Vec<(String, String, bool)>, property: &str, value: &str, important: bool) {
    match computed.iter_mut().find(|(p, _, _)| p.eq_ignore_ascii_case(property)) {
        Some(entry) => {
            entry.1 = value.to_string();
            entry.2 = important;
        }
        None => computed.push((property.to_string(), value.to_string(), important)),
    }
}

/// Split a style attribute into (property, value) pairs, respecting quotes and parentheses
pub fn split_declarations(style: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    let mut push = |chunk: &str| {
        if let Some((property, value)) = chunk.split_once(':') {
            let property = property.trim();
            let value = value.trim();
            if !property.is_empty() && !value.is_empty() {
                out.push((property.to_string(), value.to_string()));
            }
        }
    };

    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push(&style[start..]);

    out
}

fn remove_plain_style_tags(tree: &mut TagTree<'_>) {
    let plain: Vec<usize> = tree
        .elements()
        .filter(|e| e.name() == "style")
        .filter(|e| {
            let reserved =
                e.get_attribute("amp-custom").is_some() || e.get_attribute("amp4email-boilerplate").is_some();
            !reserved && !e.inner().contains('@')
        })
        .map(|e| e.index())
        .collect();
    for index in plain {
        tree.remove(index);
    }
}
