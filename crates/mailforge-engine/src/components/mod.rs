//! Core component preset
//!
//! Head components fill [`GlobalData`](crate::GlobalData); body components
//! render table-based markup that survives Outlook and is rewritten for AMP
//! afterwards.

mod head;
mod layout;
mod content;
mod accordion;
mod carousel;

use crate::component::{Component, Preset};

pub use accordion::{Accordion, AccordionElement, AccordionText, AccordionTitle};
pub use carousel::{Carousel, CarouselImage};
pub use content::{Button, Divider, Image, Raw, Spacer, Text};
pub use head::{Breakpoint, Font, Head, HeadAttributes, HtmlAttributes, Preview, Style, Title};
pub use layout::{Body, Column, Section};

/// Context key holding the pixel width available to children
pub const CONTAINER_WIDTH: &str = "container-width";
/// Context key holding the number of non-raw siblings of a column
pub const NON_RAW_SIBLINGS: &str = "non-raw-siblings";

/// Every component shipped with the compiler
pub fn core_preset() -> Preset {
    Preset::new("core")
        .with(Component::head(Head))
        .with(Component::head(HeadAttributes))
        .with(Component::head(Breakpoint))
        .with(Component::head(Font))
        .with(Component::head(Title))
        .with(Component::head(Preview))
        .with(Component::head(Style))
        .with(Component::head(HtmlAttributes))
        .with(Component::body(Body))
        .with(Component::body(Section))
        .with(Component::body(Column))
        .with(Component::body(Text))
        .with(Component::body(Image))
        .with(Component::body(Button))
        .with(Component::body(Divider))
        .with(Component::body(Spacer))
        .with(Component::body(Raw))
        .with(Component::body(Accordion))
        .with(Component::body(AccordionElement))
        .with(Component::body(AccordionTitle))
        .with(Component::body(AccordionText))
        .with(Component::body(Carousel))
        .with(Component::body(CarouselImage))
}

/// ` name="value"` for every present value
pub(crate) fn html_attributes(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!(" {}=\"{}\"", name, v)))
        .collect()
}

/// `property:value;` for every present, non-empty value
pub(crate) fn styles(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .filter_map(|(property, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}:{};", property, v))
        })
        .collect()
}

/// Numeric part and unit of a CSS length. Bare numbers are pixels.
pub(crate) fn parse_length(value: &str) -> Option<(f64, &str)> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    let number = value[..split].parse::<f64>().ok()?;
    let unit = match &value[split..] {
        "" => "px",
        unit => unit,
    };
    Some((number, unit))
}

/// Pixel value of a length, zero when unparsable or not in pixels
pub(crate) fn px(value: Option<&str>) -> f64 {
    value
        .and_then(parse_length)
        .filter(|(_, unit)| *unit == "px")
        .map_or(0.0, |(n, _)| n)
}

/// Horizontal side of a box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Right,
    Left,
}

/// One side of a `padding` shorthand, in pixels
pub(crate) fn shorthand_side(shorthand: &str, side: Side) -> f64 {
    let parts: Vec<&str> = shorthand.split_whitespace().collect();
    let index = match (parts.len(), side) {
        (1, _) => 0,
        (2 | 3, _) => 1,
        (4, Side::Right) => 1,
        (4, Side::Left) => 3,
        _ => return 0.0,
    };
    px(parts.get(index).copied())
}

/// Pixel padding of one side, the longhand attribute winning over the shorthand
pub(crate) fn padding_side(attr: impl Fn(&str) -> Option<String>, side: Side) -> f64 {
    let longhand = match side {
        Side::Right => "padding-right",
        Side::Left => "padding-left",
    };
    match attr(longhand) {
        Some(value) if !value.is_empty() => px(Some(&value)),
        _ => attr("padding").map_or(0.0, |p| shorthand_side(&p, side)),
    }
}

/// Pixel width of a `border` shorthand such as `2px solid black`
pub(crate) fn border_width(border: Option<&str>) -> f64 {
    border
        .into_iter()
        .flat_map(str::split_whitespace)
        .find_map(|part| parse_length(part).filter(|(_, unit)| *unit == "px").map(|(n, _)| n))
        .unwrap_or(0.0)
}

/// Pixel container width from the render context
pub(crate) fn container_width(context: &mailforge_dom::RenderContext) -> f64 {
    match context.get(CONTAINER_WIDTH).map(|w| px(Some(w))) {
        Some(width) if width > 0.0 => width,
        _ => 600.0,
    }
}

/// Render `node` with the core registry and return the markup and the data it wrote
#[cfg(test)]
pub(crate) fn render_fragment(
    node: &mailforge_dom::ElementNode,
    context: &mailforge_dom::RenderContext,
) -> (String, crate::GlobalData) {
    render_fragment_with(node, context, crate::CompileOptions::default())
}

#[cfg(test)]
pub(crate) fn render_fragment_with(
    node: &mailforge_dom::ElementNode,
    context: &mailforge_dom::RenderContext,
    options: crate::CompileOptions,
) -> (String, crate::GlobalData) {
    let registry = crate::component::Registry::core();
    let global = crate::GlobalData::new(&options);
    let resolved = mailforge_dom::AttributeResolver::new(global.tables()).resolve(node);
    let mut renderer = crate::render::Renderer::new(&registry, global);
    let html = renderer.render(&resolved, context).unwrap();
    (html, renderer.into_parts().0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_attributes_and_styles() {
        assert_eq!(
            html_attributes(&[("class", Some("a")), ("id", None), ("alt", Some(""))]),
            " class=\"a\" alt=\"\""
        );
        assert_eq!(
            styles(&[("color", Some("red")), ("margin", None), ("padding", Some(""))]),
            "color:red;"
        );
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("600px"), Some((600.0, "px")));
        assert_eq!(parse_length("33.5%"), Some((33.5, "%")));
        assert_eq!(parse_length("120"), Some((120.0, "px")));
        assert_eq!(parse_length("auto"), None);
    }

    #[test]
    fn test_padding_shorthand() {
        assert_eq!(shorthand_side("10px 25px", Side::Left), 25.0);
        assert_eq!(shorthand_side("1px 2px 3px", Side::Right), 2.0);
        assert_eq!(shorthand_side("1px 2px 3px 4px", Side::Left), 4.0);
        assert_eq!(shorthand_side("1px 2px 3px 4px", Side::Right), 2.0);
        assert_eq!(shorthand_side("1px 2px 3px 4px 5px", Side::Left), 0.0);
        assert_eq!(shorthand_side("0", Side::Right), 0.0);

        let attr = |name: &str| match name {
            "padding" => Some("10px 25px".to_string()),
            "padding-left" => Some("5px".to_string()),
            _ => None,
        };
        assert_eq!(padding_side(attr, Side::Left), 5.0);
        assert_eq!(padding_side(attr, Side::Right), 25.0);
    }

    #[test]
    fn test_border_width() {
        assert_eq!(border_width(Some("2px solid black")), 2.0);
        assert_eq!(border_width(Some("none")), 0.0);
        assert_eq!(border_width(None), 0.0);
    }
}
