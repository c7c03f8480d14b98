//! Selector-scoped attribute overrides

use mailforge_css::SelectorList;

use crate::{HtmlDocument, HtmlError};

/// Attributes to set on every element matching `selector`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeOverride {
    pub selector: String,
    pub attributes: Vec<(String, String)>,
}

impl AttributeOverride {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// Apply `overrides` to a body fragment. Returns the markup unchanged when there is nothing to apply.
pub fn apply_attribute_overrides(markup: &str, overrides: &[AttributeOverride]) -> Result<String, HtmlError> {
    if overrides.iter().all(|o| o.attributes.is_empty()) {
        return Ok(markup.to_string());
    }

    let document = HtmlDocument::parse_fragment(markup);
    let elements = document.elements();

    for entry in overrides {
        let selectors = SelectorList::parse(&entry.selector)?;
        let matched: Vec<_> = elements.iter().filter(|e| selectors.matches(*e)).collect();
        tracing::debug!("Selector '{}' matched {} elements", entry.selector, matched.len());

        for element in matched {
            for (name, value) in &entry.attributes {
                element.set_attribute(name, value);
            }
        }
    }

    document.to_html()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_attribute_on_every_match() {
        let markup = r#"<div class="card"><a href="a">1</a></div><div><a href="b">2</a></div>"#;
        let overrides = vec![AttributeOverride::new(".card a").with_attribute("data-id", "42")];

        let out = apply_attribute_overrides(markup, &overrides).unwrap();
        assert_eq!(
            out,
            r#"<div class="card"><a href="a" data-id="42">1</a></div><div><a href="b">2</a></div>"#
        );
    }

    #[test]
    fn test_replaces_existing_value() {
        let overrides = vec![AttributeOverride::new("a").with_attribute("href", "https://x.test/")];
        let out = apply_attribute_overrides(r#"<a href="old">x</a>"#, &overrides).unwrap();
        assert_eq!(out, r#"<a href="https://x.test/">x</a>"#);
    }

    #[test]
    fn test_invalid_selector_is_error() {
        let overrides = vec![AttributeOverride::new("a:hover").with_attribute("x", "y")];
        assert!(apply_attribute_overrides("<a></a>", &overrides).is_err());
    }

    #[test]
    fn test_nothing_to_apply() {
        let markup = "<p>{{ a && b }}</p>";
        assert_eq!(apply_attribute_overrides(markup, &[]).unwrap(), markup);
    }
}
