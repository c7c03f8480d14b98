//! Head components

use mailforge_dom::{Attributes, ElementNode, ALL_TAG};

use crate::component::{AttributeType, HeadComponent};
use crate::render::Renderer;
use crate::{CompileError, HeadValue};

/// `mj-head`: hands every child to its own head component
pub struct Head;

impl HeadComponent for Head {
    fn tag_name(&self) -> &'static str {
        "mj-head"
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        for child in &node.children {
            renderer.handle_head(child)?;
        }
        Ok(())
    }
}

/// `mj-attributes`: per-tag defaults, `mj-all` and attribute classes
pub struct HeadAttributes;

impl HeadComponent for HeadAttributes {
    fn tag_name(&self) -> &'static str {
        "mj-attributes"
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        let global = renderer.global_mut();

        for child in &node.children {
            if child.tag_name != "mj-class" {
                global.add(
                    "default_attributes",
                    HeadValue::Attributes(child.tag_name.clone(), child.attributes.clone()),
                )?;
                continue;
            }

            let Some(name) = child.attr("name") else {
                tracing::warn!("mj-class without a name ignored");
                continue;
            };
            let attributes: Attributes = child
                .attributes
                .iter()
                .filter(|(key, _)| key.as_str() != "name")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            global.add("classes", HeadValue::Attributes(name.to_string(), attributes))?;

            for descendant in &child.children {
                global.add(
                    "classes_default",
                    HeadValue::ClassDefault {
                        class: name.to_string(),
                        tag: descendant.tag_name.clone(),
                        attributes: descendant.attributes.clone(),
                    },
                )?;
            }
        }

        tracing::debug!(
            "mj-attributes: {} entries, mj-all {}",
            node.children.len(),
            if node.find_child(ALL_TAG).is_some() { "set" } else { "unset" }
        );
        Ok(())
    }
}

pub struct Breakpoint;

impl HeadComponent for Breakpoint {
    fn tag_name(&self) -> &'static str {
        "mj-breakpoint"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[("width", AttributeType::PX)]
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        if let Some(width) = node.attr("width") {
            renderer.global_mut().add("breakpoint", HeadValue::text(width))?;
        }
        Ok(())
    }
}

/// `mj-font`: makes a web font available to `font-family` declarations
pub struct Font;

impl HeadComponent for Font {
    fn tag_name(&self) -> &'static str {
        "mj-font"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[("name", AttributeType::String), ("href", AttributeType::String)]
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        if let (Some(name), Some(href)) = (node.attr("name"), node.attr("href")) {
            renderer
                .global_mut()
                .add("fonts", HeadValue::Entry(name.to_string(), href.to_string()))?;
        }
        Ok(())
    }
}

pub struct Title;

impl HeadComponent for Title {
    fn tag_name(&self) -> &'static str {
        "mj-title"
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        renderer
            .global_mut()
            .add("title", HeadValue::text(node.content_or_empty().trim()))
    }
}

/// `mj-preview`: inbox preview text
pub struct Preview;

impl HeadComponent for Preview {
    fn tag_name(&self) -> &'static str {
        "mj-preview"
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        renderer
            .global_mut()
            .add("preview", HeadValue::text(node.content_or_empty().trim()))
    }
}

/// `mj-style`: head CSS, or CSS to inline with `inline="inline"`
pub struct Style;

impl HeadComponent for Style {
    fn tag_name(&self) -> &'static str {
        "mj-style"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[("inline", AttributeType::Enum(&["inline"]))]
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        let css = node.content_or_empty().trim();
        if css.is_empty() {
            return Ok(());
        }

        let name = if node.attr("inline") == Some("inline") {
            "inline_style"
        } else {
            "style"
        };
        renderer.global_mut().add(name, HeadValue::text(css))
    }
}

/// `mj-html-attributes`: attributes set on rendered elements by selector
pub struct HtmlAttributes;

impl HeadComponent for HtmlAttributes {
    fn tag_name(&self) -> &'static str {
        "mj-html-attributes"
    }

    fn handle(&self, node: &ElementNode, renderer: &mut Renderer<'_>) -> Result<(), CompileError> {
        for selector in node.children_named("mj-selector") {
            let Some(path) = selector.attr("path") else {
                continue;
            };
            let attributes: Vec<(String, String)> = selector
                .children_named("mj-html-attribute")
                .filter_map(|attribute| {
                    attribute
                        .attr("name")
                        .map(|name| (name.to_string(), attribute.content_or_empty().trim().to_string()))
                })
                .collect();

            renderer
                .global_mut()
                .add("html_attributes", HeadValue::Selector(path.to_string(), attributes))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Registry;
    use crate::{CompileOptions, GlobalData};

    fn run(head: ElementNode) -> GlobalData {
        let registry = Registry::core();
        let mut renderer = Renderer::new(&registry, GlobalData::new(&CompileOptions::default()));
        renderer.handle_head(&head).unwrap();
        renderer.into_parts().0
    }

    #[test]
    fn test_attributes_tables() {
        let head = ElementNode::new("mj-head").with_child(
            ElementNode::new("mj-attributes")
                .with_child(ElementNode::new("mj-all").with_attr("font-family", "Lato"))
                .with_child(ElementNode::new("mj-text").with_attr("color", "#333"))
                .with_child(
                    ElementNode::new("mj-class")
                        .with_attr("name", "hero")
                        .with_attr("padding", "0")
                        .with_child(ElementNode::new("mj-text").with_attr("align", "center")),
                ),
        );
        let global = run(head);
        let tables = global.tables();

        assert_eq!(tables.defaults_for("mj-all").and_then(|a| a.get("font-family")).map(String::as_str), Some("Lato"));
        assert_eq!(tables.defaults_for("mj-text").and_then(|a| a.get("color")).map(String::as_str), Some("#333"));
        let hero = tables.class("hero").unwrap();
        assert_eq!(hero.get("padding").map(String::as_str), Some("0"));
        assert!(!hero.contains_key("name"));
        assert!(tables.class_default("hero", "mj-text").is_some());
    }

    #[test]
    fn test_document_metadata() {
        let head = ElementNode::new("mj-head")
            .with_child(ElementNode::new("mj-title").with_content(" Welcome "))
            .with_child(ElementNode::new("mj-preview").with_content("Hi there"))
            .with_child(ElementNode::new("mj-breakpoint").with_attr("width", "320px"))
            .with_child(
                ElementNode::new("mj-font")
                    .with_attr("name", "Raleway")
                    .with_attr("href", "https://fonts.googleapis.com/css?family=Raleway"),
            );
        let global = run(head);

        assert_eq!(global.title(), "Welcome");
        assert_eq!(global.preview(), "Hi there");
        assert_eq!(global.breakpoint(), "320px");
        assert!(global.fonts().contains_key("Raleway"));
    }

    #[test]
    fn test_styles_and_raw() {
        let head = ElementNode::new("mj-head")
            .with_child(ElementNode::new("mj-style").with_content(".a { color: red; }"))
            .with_child(
                ElementNode::new("mj-style")
                    .with_attr("inline", "inline")
                    .with_content(".b { color: blue; }"),
            )
            .with_child(ElementNode::new("mj-raw").with_content("<meta name=\"x-apple\">"));
        let global = run(head);

        assert_eq!(global.styles().styles(), &[".a { color: red; }".to_string()]);
        assert_eq!(global.styles().inline_styles(), &[".b { color: blue; }".to_string()]);
        assert_eq!(global.head_raw(), &["<meta name=\"x-apple\">".to_string()]);
    }

    #[test]
    fn test_html_attributes() {
        let head = ElementNode::new("mj-head").with_child(
            ElementNode::new("mj-html-attributes").with_child(
                ElementNode::new("mj-selector").with_attr("path", ".cta a").with_child(
                    ElementNode::new("mj-html-attribute")
                        .with_attr("name", "data-track")
                        .with_content("hero"),
                ),
            ),
        );
        let global = run(head);
        let overrides = global.html_attributes();

        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].selector, ".cta a");
        assert_eq!(overrides[0].attributes, vec![("data-track".to_string(), "hero".to_string())]);
    }
}
