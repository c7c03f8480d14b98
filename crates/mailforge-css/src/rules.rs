//! Style rule extraction
//!
//! Pulls plain style rules out of a stylesheet for inlining. At-rules
//! (media queries, font faces, keyframes) cannot be inlined and are skipped,
//! as are rules whose selectors need runtime state (`:hover`, `::before`).

use lightningcss::declaration::DeclarationBlock;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;

use crate::{CssError, SelectorList};

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Style rule reduced to what inlining needs
#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
}

/// Parse `css` and return its inlinable style rules in source order
pub fn parse_rules(css: &str) -> Result<Vec<StyleRule>, CssError> {
    let options = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };

    let stylesheet = StyleSheet::parse(css, options).map_err(|e| CssError::Parse(e.to_string()))?;

    let mut rules = Vec::new();
    for rule in stylesheet.rules.0.iter() {
        let CssRule::Style(style_rule) = rule else {
            continue;
        };

        let selector_text = style_rule
            .selectors
            .to_css_string(PrinterOptions::default())
            .map_err(|e| CssError::Print(e.to_string()))?;

        let selectors = match SelectorList::parse(&selector_text) {
            Ok(selectors) => selectors,
            Err(e) => {
                tracing::debug!("Skipping rule that cannot be inlined: {}", e);
                continue;
            }
        };

        let declarations = convert_declarations(&style_rule.declarations)?;
        if !declarations.is_empty() {
            rules.push(StyleRule { selectors, declarations });
        }
    }

    tracing::debug!("Extracted {} inlinable rules", rules.len());
    Ok(rules)
}

fn convert_declarations(block: &DeclarationBlock) -> Result<Vec<Declaration>, CssError> {
    let normal = block.declarations.iter().map(|p| (p, false));
    let important = block.important_declarations.iter().map(|p| (p, true));

    normal
        .chain(important)
        .map(|(property, important)| {
            let value = property
                .value_to_css_string(PrinterOptions::default())
                .map_err(|e| CssError::Print(e.to_string()))?;

            Ok(Declaration {
                property: property.property_id().name().to_string(),
                value,
                important,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let rules = parse_rules(".foo { display: block; } #bar { color: red !important; }").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].declarations[0].property, "display");
        assert!(rules[1].declarations[0].important);
    }

    #[test]
    fn test_skips_at_rules_and_pseudo() {
        let css = r#"
            @media (max-width: 480px) { .a { color: red; } }
            a:hover { color: blue; }
            p { margin: 0; }
        "#;
        let rules = parse_rules(css).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].declarations[0].property, "margin");
    }

    #[test]
    fn test_selector_group_kept_together() {
        let rules = parse_rules("h1, .title { font-weight: bold; }").unwrap();
        assert_eq!(rules[0].selectors.0.len(), 2);
    }
}
