//! Content components

use std::sync::Arc;

use super::{container_width, html_attributes, padding_side, parse_length, px, styles, Side};
use crate::component::{AttributeType, BodyComponent};
use crate::global::format_number;
use crate::render::Element;
use crate::{CompileError, GlobalData, HeadStyle, Target};

const ALIGN: AttributeType = AttributeType::Enum(&["left", "center", "right"]);

/// Width left inside the element's own padding
fn content_box(element: &Element<'_, '_>) -> f64 {
    let attr = |name: &str| element.attr(name).map(str::to_string);
    let padding = padding_side(attr, Side::Left) + padding_side(attr, Side::Right);
    (container_width(element.context()) - padding).max(0.0)
}

/// `mj-text`: inner markup rendered verbatim in a styled div
pub struct Text;

impl BodyComponent for Text {
    fn tag_name(&self) -> &'static str {
        "mj-text"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("align", AttributeType::Enum(&["left", "right", "center", "justify"])),
            ("color", AttributeType::Color),
            ("container-background-color", AttributeType::Color),
            ("font-family", AttributeType::String),
            ("font-size", AttributeType::PX),
            ("font-style", AttributeType::String),
            ("font-weight", AttributeType::String),
            ("height", AttributeType::PX_PERCENT),
            ("letter-spacing", AttributeType::String),
            ("line-height", AttributeType::String),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
            ("text-decoration", AttributeType::String),
            ("text-transform", AttributeType::String),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "left"),
            ("color", "#000000"),
            ("font-family", "Ubuntu, Helvetica, Arial, sans-serif"),
            ("font-size", "13px"),
            ("line-height", "1"),
            ("padding", "10px 25px"),
        ]
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let style = styles(&[
            ("font-family", element.attr("font-family")),
            ("font-size", element.attr("font-size")),
            ("font-style", element.attr("font-style")),
            ("font-weight", element.attr("font-weight")),
            ("letter-spacing", element.attr("letter-spacing")),
            ("line-height", element.attr("line-height")),
            ("text-align", element.attr("align")),
            ("text-decoration", element.attr("text-decoration")),
            ("text-transform", element.attr("text-transform")),
            ("color", element.attr("color")),
            ("height", element.attr("height")),
        ]);
        let text = format!("<div style=\"{}\">{}</div>", style, element.content());

        match element.non_empty_attr("height") {
            Some(height) => Ok(format!(
                "<!--[if mso | IE]><table role=\"presentation\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\"><tr><td height=\"{h}\" style=\"vertical-align:top;height:{h};\"><![endif]-->{}<!--[if mso | IE]></td></tr></table><![endif]-->",
                text,
                h = height
            )),
            None => Ok(text),
        }
    }
}

/// `mj-image`: a responsive image, optionally linked
pub struct Image;

impl Image {
    /// Pixel width: the declared width capped by the available box
    fn content_width(element: &Element<'_, '_>) -> f64 {
        let available = content_box(element);
        match element.non_empty_attr("width").map(|w| px(Some(w))) {
            Some(width) if width > 0.0 => width.min(available),
            _ => available,
        }
    }
}

impl BodyComponent for Image {
    fn tag_name(&self) -> &'static str {
        "mj-image"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("alt", AttributeType::String),
            ("href", AttributeType::String),
            ("name", AttributeType::String),
            ("src", AttributeType::String),
            ("srcset", AttributeType::String),
            ("sizes", AttributeType::String),
            ("title", AttributeType::String),
            ("rel", AttributeType::String),
            ("align", ALIGN),
            ("border", AttributeType::String),
            ("border-bottom", AttributeType::String),
            ("border-left", AttributeType::String),
            ("border-right", AttributeType::String),
            ("border-top", AttributeType::String),
            ("border-radius", AttributeType::PADDING),
            ("container-background-color", AttributeType::Color),
            ("fluid-on-mobile", AttributeType::Boolean),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
            ("target", AttributeType::String),
            ("width", AttributeType::PX),
            ("height", AttributeType::String),
            ("max-height", AttributeType::PX_PERCENT),
            ("font-size", AttributeType::PX),
            ("usemap", AttributeType::String),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("alt", ""),
            ("align", "center"),
            ("border", "0"),
            ("height", "auto"),
            ("padding", "10px 25px"),
            ("target", "_blank"),
            ("font-size", "13px"),
        ]
    }

    fn head_style(&self, global: &GlobalData) -> Option<HeadStyle> {
        if global.target() == Target::Amp {
            return None;
        }
        Some(Arc::new(|breakpoint: &str| {
            format!(
                "@media only screen and (max-width:{}px) {{\n  table.mj-full-width-mobile {{ width: 100% !important; }}\n  td.mj-full-width-mobile {{ width: auto !important; }}\n}}",
                format_number(px(Some(breakpoint)) - 1.0)
            )
        }))
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let width = format_number(Image::content_width(element));
        let fluid = element.attr("fluid-on-mobile") == Some("true");
        let fluid_class = fluid.then_some("mj-full-width-mobile");

        let height = match element.non_empty_attr("height") {
            Some("auto") | None if element.target() == Target::Amp => width.clone(),
            Some("auto") | None => "auto".to_string(),
            Some(height) => parse_length(height).map_or_else(|| height.to_string(), |(n, _)| format_number(n)),
        };

        let img_style = styles(&[
            ("border", element.attr("border")),
            ("border-left", element.attr("border-left")),
            ("border-right", element.attr("border-right")),
            ("border-top", element.attr("border-top")),
            ("border-bottom", element.attr("border-bottom")),
            ("border-radius", element.attr("border-radius")),
            ("display", Some("block")),
            ("outline", Some("none")),
            ("text-decoration", Some("none")),
            ("height", element.attr("height")),
            ("max-height", element.attr("max-height")),
            ("width", Some("100%")),
            ("font-size", element.attr("font-size")),
        ]);
        let img = format!(
            "<img{} />",
            html_attributes(&[
                ("alt", element.attr("alt")),
                ("src", element.attr("src")),
                ("srcset", element.attr("srcset")),
                ("sizes", element.attr("sizes")),
                ("style", Some(img_style.as_str())),
                ("title", element.attr("title")),
                ("width", Some(width.as_str())),
                ("height", Some(height.as_str())),
                ("usemap", element.attr("usemap")),
            ])
        );

        let image = match element.non_empty_attr("href") {
            Some(href) => format!(
                "<a{}>{}</a>",
                html_attributes(&[
                    ("href", Some(href)),
                    ("target", element.attr("target")),
                    ("rel", element.attr("rel")),
                    ("name", element.attr("name")),
                    ("title", element.attr("title")),
                ]),
                img
            ),
            None => img,
        };

        let cell_style = format!("width:{}px;", width);
        Ok(format!(
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"border-collapse:collapse;border-spacing:0px;\"{}><tbody><tr><td{}>{}</td></tr></tbody></table>",
            html_attributes(&[("class", fluid_class)]),
            html_attributes(&[("style", Some(cell_style.as_str())), ("class", fluid_class)]),
            image
        ))
    }
}

/// `mj-button`: a link styled as a button, or a paragraph without `href`
pub struct Button;

impl BodyComponent for Button {
    fn tag_name(&self) -> &'static str {
        "mj-button"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("align", ALIGN),
            ("background-color", AttributeType::Color),
            ("border", AttributeType::String),
            ("border-radius", AttributeType::String),
            ("color", AttributeType::Color),
            ("container-background-color", AttributeType::Color),
            ("font-family", AttributeType::String),
            ("font-size", AttributeType::PX),
            ("font-style", AttributeType::String),
            ("font-weight", AttributeType::String),
            ("height", AttributeType::PX_PERCENT),
            ("href", AttributeType::String),
            ("name", AttributeType::String),
            ("title", AttributeType::String),
            ("inner-padding", AttributeType::PADDING),
            ("letter-spacing", AttributeType::String),
            ("line-height", AttributeType::String),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
            ("rel", AttributeType::String),
            ("target", AttributeType::String),
            ("text-decoration", AttributeType::String),
            ("text-transform", AttributeType::String),
            ("vertical-align", AttributeType::Enum(&["top", "bottom", "middle"])),
            ("text-align", ALIGN),
            ("width", AttributeType::PX_PERCENT),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "center"),
            ("background-color", "#414141"),
            ("border", "none"),
            ("border-radius", "3px"),
            ("color", "#ffffff"),
            ("font-family", "Ubuntu, Helvetica, Arial, sans-serif"),
            ("font-size", "13px"),
            ("font-weight", "normal"),
            ("inner-padding", "10px 25px"),
            ("line-height", "120%"),
            ("padding", "10px 25px"),
            ("target", "_blank"),
            ("text-decoration", "none"),
            ("text-transform", "none"),
            ("vertical-align", "middle"),
        ]
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let background = element.attr("background-color").filter(|c| *c != "none");
        let href = element.non_empty_attr("href");
        let tag = if href.is_some() { "a" } else { "p" };

        let table_style = styles(&[
            ("border-collapse", Some("separate")),
            ("width", element.attr("width")),
            ("line-height", Some("100%")),
        ]);
        let td_style = styles(&[
            ("border", element.attr("border")),
            ("border-radius", element.attr("border-radius")),
            ("cursor", Some("auto")),
            ("font-style", element.attr("font-style")),
            ("height", element.attr("height")),
            ("mso-padding-alt", element.attr("inner-padding")),
            ("text-align", element.attr("text-align")),
            ("background", background),
        ]);
        let link_style = styles(&[
            ("display", Some("inline-block")),
            ("width", element.attr("width")),
            ("background", background),
            ("color", element.attr("color")),
            ("font-family", element.attr("font-family")),
            ("font-size", element.attr("font-size")),
            ("font-style", element.attr("font-style")),
            ("font-weight", element.attr("font-weight")),
            ("line-height", element.attr("line-height")),
            ("letter-spacing", element.attr("letter-spacing")),
            ("margin", Some("0")),
            ("text-decoration", element.attr("text-decoration")),
            ("text-transform", element.attr("text-transform")),
            ("padding", element.attr("inner-padding")),
            ("mso-padding-alt", Some("0px")),
            ("border-radius", element.attr("border-radius")),
        ]);

        let link_attributes = html_attributes(&[
            ("href", href),
            ("rel", element.attr("rel").filter(|_| href.is_some())),
            ("name", element.attr("name")),
            ("title", element.attr("title")),
            ("style", Some(link_style.as_str())),
            ("target", element.attr("target").filter(|_| href.is_some())),
        ]);

        Ok(format!(
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"{}\"><tbody><tr><td{}><{tag}{}>{}</{tag}></td></tr></tbody></table>",
            table_style,
            html_attributes(&[
                ("align", Some("center")),
                ("bgcolor", background),
                ("role", Some("presentation")),
                ("style", Some(td_style.as_str())),
                ("valign", element.attr("vertical-align")),
            ]),
            link_attributes,
            element.content(),
            tag = tag
        ))
    }
}

/// `mj-divider`: horizontal rule drawn with a top border
pub struct Divider;

impl BodyComponent for Divider {
    fn tag_name(&self) -> &'static str {
        "mj-divider"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("border-color", AttributeType::Color),
            ("border-style", AttributeType::String),
            ("border-width", AttributeType::PX),
            ("container-background-color", AttributeType::Color),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
            ("width", AttributeType::PX_PERCENT),
            ("align", ALIGN),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("border-color", "#000000"),
            ("border-style", "solid"),
            ("border-width", "4px"),
            ("padding", "10px 25px"),
            ("width", "100%"),
            ("align", "center"),
        ]
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let border = format!(
            "{} {} {}",
            element.attr("border-style").unwrap_or("solid"),
            element.attr("border-width").unwrap_or("4px"),
            element.attr("border-color").unwrap_or("#000000")
        );
        let margin = match element.attr("align") {
            Some("left") => "0px",
            Some("right") => "0px 0px 0px auto",
            _ => "0px auto",
        };
        let width = element.attr("width").unwrap_or("100%");

        let outlook_width = match parse_length(width) {
            Some((percent, "%")) => content_box(element) * percent / 100.0,
            Some((pixels, _)) => pixels,
            None => content_box(element),
        };
        let outlook_width = format!("{}px", format_number(outlook_width));

        let rule_style = styles(&[
            ("border-top", Some(border.as_str())),
            ("font-size", Some("1px")),
            ("margin", Some(margin)),
            ("width", Some(width)),
        ]);
        let outlook_style = styles(&[
            ("border-top", Some(border.as_str())),
            ("font-size", Some("1px")),
            ("margin", Some(margin)),
            ("width", Some(outlook_width.as_str())),
        ]);

        Ok(format!(
            "<p style=\"{}\"></p><!--[if mso | IE]><table align=\"{}\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" style=\"{}\" role=\"presentation\" width=\"{}\" ><tr><td style=\"height:0;line-height:0;\"> &nbsp;\n</td></tr></table><![endif]-->",
            rule_style,
            element.attr("align").unwrap_or("center"),
            outlook_style,
            outlook_width
        ))
    }
}

/// `mj-spacer`: fixed vertical space
pub struct Spacer;

impl BodyComponent for Spacer {
    fn tag_name(&self) -> &'static str {
        "mj-spacer"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("container-background-color", AttributeType::Color),
            ("height", AttributeType::PX_PERCENT),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("height", "20px")]
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let height = element.attr("height").unwrap_or("20px");
        Ok(format!(
            "<div style=\"height:{h};line-height:{h};\">&#8202;</div>",
            h = height
        ))
    }
}

/// `mj-raw`: markup passed through untouched
pub struct Raw;

impl BodyComponent for Raw {
    fn tag_name(&self) -> &'static str {
        "mj-raw"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[("position", AttributeType::Enum(&["file-start"]))]
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn is_raw(&self) -> bool {
        true
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        Ok(element.content().to_string())
    }
}
