//! Accordion components
//!
//! AMP renders an `amp-accordion` of `<section>` elements. The HTML target
//! has no interactive equivalent and renders every element expanded.

use mailforge_dom::{AttributeResolver, Attributes, ElementNode, RenderContext, ResolvedNode};

use super::{html_attributes, px, styles};
use crate::component::{AttributeType, BodyComponent};
use crate::global::format_number;
use crate::render::Element;
use crate::{CompileError, Target};

const ACCORDION_FONT_FAMILY: &str = "accordion-font-family";
const ELEMENT_FONT_FAMILY: &str = "element-font-family";

const TITLE: &str = "mj-accordion-title";
const TEXT: &str = "mj-accordion-text";

/// Attributes an accordion and its elements hand to their children
const PASSED_ATTRIBUTES: &[&str] = &[
    "border",
    "icon-align",
    "icon-width",
    "icon-height",
    "icon-position",
    "icon-wrapped-url",
    "icon-wrapped-alt",
    "icon-unwrapped-url",
    "icon-unwrapped-alt",
];

fn passed_attributes(element: &Element<'_, '_>) -> Attributes {
    PASSED_ATTRIBUTES
        .iter()
        .filter_map(|name| element.attr(name).map(|value| (name.to_string(), value.to_string())))
        .collect()
}

/// Font family of a title or text: its own attribute when authored, else the
/// nearest element or accordion font family
fn resolve_font_family(element: &Element<'_, '_>) -> Option<String> {
    if element.is_explicit("font-family") {
        return element.attr("font-family").map(str::to_string);
    }
    element
        .context()
        .get(ELEMENT_FONT_FAMILY)
        .or_else(|| element.context().get(ACCORDION_FONT_FAMILY))
        .map(str::to_string)
}

fn icon_size(value: Option<&str>) -> String {
    match px(value) {
        size if size > 0.0 => format_number(size.trunc()),
        _ => "32".to_string(),
    }
}

/// `mj-accordion`
pub struct Accordion;

impl BodyComponent for Accordion {
    fn tag_name(&self) -> &'static str {
        "mj-accordion"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("container-background-color", AttributeType::Color),
            ("border", AttributeType::String),
            ("font-family", AttributeType::String),
            ("icon-align", AttributeType::Enum(&["top", "middle", "bottom"])),
            ("icon-width", AttributeType::PX_PERCENT),
            ("icon-height", AttributeType::PX_PERCENT),
            ("icon-wrapped-url", AttributeType::String),
            ("icon-wrapped-alt", AttributeType::String),
            ("icon-unwrapped-url", AttributeType::String),
            ("icon-unwrapped-alt", AttributeType::String),
            ("icon-position", AttributeType::Enum(&["left", "right"])),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("border", "2px solid black"),
            ("font-family", "Ubuntu, Helvetica, Arial, sans-serif"),
            ("icon-align", "middle"),
            ("icon-wrapped-url", "https://i.imgur.com/bIXv1bk.png"),
            ("icon-wrapped-alt", "+"),
            ("icon-unwrapped-url", "https://i.imgur.com/w4uTygT.png"),
            ("icon-unwrapped-alt", "-"),
            ("icon-position", "right"),
            ("icon-height", "32px"),
            ("icon-width", "32px"),
            ("padding", "10px 25px"),
        ]
    }

    fn child_context(&self, element: &Element<'_, '_>) -> RenderContext {
        let context = element.context().for_children();
        match element.attr("font-family") {
            Some(family) => context.with(ACCORDION_FONT_FAMILY, family),
            None => context,
        }
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let style = styles(&[("width", Some("100%")), ("font-family", element.attr("font-family"))]);
        let children = element.render_children_with(passed_attributes(element))?;

        let tag = match element.target() {
            Target::Amp => "amp-accordion",
            Target::Html => "div",
        };
        Ok(format!(
            "<{tag} class=\"mj-accordion\" style=\"{}\">{}</{tag}>",
            style,
            children,
            tag = tag
        ))
    }
}

/// `mj-accordion-element`: one title and its collapsible text
pub struct AccordionElement;

impl BodyComponent for AccordionElement {
    fn tag_name(&self) -> &'static str {
        "mj-accordion-element"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("background-color", AttributeType::Color),
            ("border", AttributeType::String),
            ("font-family", AttributeType::String),
            ("icon-align", AttributeType::Enum(&["top", "middle", "bottom"])),
            ("icon-width", AttributeType::PX_PERCENT),
            ("icon-height", AttributeType::PX_PERCENT),
            ("icon-wrapped-url", AttributeType::String),
            ("icon-wrapped-alt", AttributeType::String),
            ("icon-unwrapped-url", AttributeType::String),
            ("icon-unwrapped-alt", AttributeType::String),
            ("icon-position", AttributeType::Enum(&["left", "right"])),
        ]
    }

    fn child_context(&self, element: &Element<'_, '_>) -> RenderContext {
        let context = element.context().for_children();
        match element.non_empty_attr("font-family") {
            Some(family) => context.with(ELEMENT_FONT_FAMILY, family),
            None => context,
        }
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let context = element.child_context().with_inherited_attributes(passed_attributes(element));
        let placeholder = |tag: &str, element: &Element<'_, '_>| -> ResolvedNode {
            AttributeResolver::new(element.global().tables()).resolve(&ElementNode::new(tag))
        };

        let children = element.children();
        let title_node = match children.iter().find(|c| c.tag_name == TITLE) {
            Some(node) => node.clone(),
            None => placeholder(TITLE, element),
        };
        let text_node = match children.iter().find(|c| c.tag_name == TEXT) {
            Some(node) => node.clone(),
            None => placeholder(TEXT, element),
        };

        let title = element.render_child(&title_node, &context)?;
        let mut body = element.render_child(&text_node, &context)?;
        for other in children.iter().filter(|c| c.tag_name != TITLE && c.tag_name != TEXT) {
            body.push_str(&element.render_child(other, &context)?);
        }

        let style = styles(&[("background-color", element.attr("background-color"))]);
        let attributes = html_attributes(&[
            ("class", element.non_empty_attr("css-class")),
            ("style", Some(style.as_str()).filter(|s| !s.is_empty())),
        ]);

        Ok(match element.target() {
            Target::Amp => format!("<section{}><h2>{}</h2><div>{}</div></section>", attributes, title, body),
            Target::Html => format!(
                "<div{}><div class=\"mj-accordion-title\">{}</div><div class=\"mj-accordion-content\">{}</div></div>",
                attributes, title, body
            ),
        })
    }
}

/// `mj-accordion-title`
pub struct AccordionTitle;

impl BodyComponent for AccordionTitle {
    fn tag_name(&self) -> &'static str {
        TITLE
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("background-color", AttributeType::Color),
            ("color", AttributeType::Color),
            ("font-size", AttributeType::PX),
            ("font-family", AttributeType::String),
            ("font-weight", AttributeType::String),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("font-size", "13px"), ("padding", "16px")]
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let font_family = resolve_font_family(element);
        let style = styles(&[
            ("background-color", element.attr("background-color")),
            ("color", element.attr("color")),
            ("font-size", element.attr("font-size")),
            ("font-family", font_family.as_deref()),
            ("font-weight", element.attr("font-weight")),
            ("padding", element.attr("padding")),
        ]);
        let text = format!("<span style=\"{}\">{}</span>", style, element.content());

        let width = icon_size(element.attr("icon-width"));
        let height = icon_size(element.attr("icon-height"));
        let wrapped = element.non_empty_attr("icon-wrapped-url");
        let unwrapped = element.non_empty_attr("icon-unwrapped-url");

        let icon = match (element.target(), wrapped, unwrapped) {
            (Target::Amp, Some(wrapped), Some(_)) => format!(
                "<amp-img{}></amp-img>",
                html_attributes(&[
                    ("src", Some(wrapped)),
                    ("alt", Some(element.non_empty_attr("icon-wrapped-alt").unwrap_or("+"))),
                    ("width", Some(width.as_str())),
                    ("height", Some(height.as_str())),
                    ("layout", Some("fixed")),
                ])
            ),
            (Target::Html, _, Some(unwrapped)) => format!(
                "<img{} />",
                html_attributes(&[
                    ("src", Some(unwrapped)),
                    ("alt", Some(element.non_empty_attr("icon-unwrapped-alt").unwrap_or("-"))),
                    ("width", Some(width.as_str())),
                    ("height", Some(height.as_str())),
                    ("style", Some("display:inline-block;vertical-align:middle;")),
                ])
            ),
            _ => return Ok(text),
        };

        Ok(if element.attr("icon-position") == Some("left") {
            format!("{} {}", icon, text)
        } else {
            format!("{} {}", text, icon)
        })
    }
}

/// `mj-accordion-text`
pub struct AccordionText;

impl BodyComponent for AccordionText {
    fn tag_name(&self) -> &'static str {
        TEXT
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("background-color", AttributeType::Color),
            ("color", AttributeType::Color),
            ("font-size", AttributeType::PX),
            ("font-family", AttributeType::String),
            ("font-weight", AttributeType::String),
            ("letter-spacing", AttributeType::String),
            ("line-height", AttributeType::String),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("font-size", "13px"), ("line-height", "1"), ("padding", "16px")]
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let font_family = resolve_font_family(element);
        let style = styles(&[
            ("background", element.attr("background-color")),
            ("font-size", element.attr("font-size")),
            ("font-family", font_family.as_deref()),
            ("font-weight", element.attr("font-weight")),
            ("letter-spacing", element.attr("letter-spacing")),
            ("line-height", element.attr("line-height")),
            ("color", element.attr("color")),
            ("padding", element.attr("padding")),
        ]);
        Ok(format!(
            "<div{} style=\"{}\">{}</div>",
            html_attributes(&[("class", element.non_empty_attr("css-class"))]),
            style,
            element.content()
        ))
    }
}
