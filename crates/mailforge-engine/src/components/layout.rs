//! Layout components
//!
//! `mj-body` sets the document width, `mj-section` lays out a row of columns
//! and `mj-column` stacks its children in table cells. Outlook gets fixed
//! pixel widths through conditional tables; other clients use the
//! responsive column classes registered as media queries.

use mailforge_dom::{Attributes, RenderContext};

use super::{
    border_width, container_width, html_attributes, padding_side, parse_length, styles, Side, CONTAINER_WIDTH,
    NON_RAW_SIBLINGS,
};
use crate::component::{AttributeType, BodyComponent};
use crate::global::format_number;
use crate::render::Element;
use crate::{CompileError, HeadValue};

const DIRECTION: AttributeType = AttributeType::Enum(&["ltr", "rtl"]);
const VERTICAL_ALIGN: AttributeType = AttributeType::Enum(&["top", "bottom", "middle"]);

/// Box width left for children once padding and borders are removed
fn inner_width(element: &Element<'_, '_>, outer: f64) -> f64 {
    let attr = |name: &str| element.attr(name).map(str::to_string);
    let padding = padding_side(attr, Side::Left) + padding_side(attr, Side::Right);
    let borders = 2.0 * border_width(element.attr("border"));
    (outer - padding - borders).max(0.0)
}

fn px_string(value: f64) -> String {
    format!("{}px", format_number(value))
}

/// `mj-body`: outermost wrapper, fixes the width every section starts from
pub struct Body;

impl BodyComponent for Body {
    fn tag_name(&self) -> &'static str {
        "mj-body"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[("width", AttributeType::PX), ("background-color", AttributeType::Color)]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("width", "600px")]
    }

    fn child_context(&self, element: &Element<'_, '_>) -> RenderContext {
        let width = element.non_empty_attr("width").unwrap_or("600px");
        element.context().for_children().with(CONTAINER_WIDTH, width)
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let background = element.non_empty_attr("background-color").map(str::to_string);
        if let Some(color) = &background {
            element.global_mut().add("background_color", HeadValue::text(color.as_str()))?;
        }

        let class = element.non_empty_attr("css-class").map(str::to_string);
        let lang = element.global().lang().to_string();
        let dir = element.global().dir().to_string();
        let style = styles(&[("background-color", background.as_deref())]);

        let children = element.render_children()?;
        Ok(format!(
            "<div{}>{}</div>",
            html_attributes(&[
                ("class", class.as_deref()),
                ("style", Some(style.as_str()).filter(|s| !s.is_empty())),
                ("lang", Some(lang.as_str())),
                ("dir", Some(dir.as_str())),
            ]),
            children
        ))
    }
}

/// `mj-section`: one row of columns
pub struct Section;

impl BodyComponent for Section {
    fn tag_name(&self) -> &'static str {
        "mj-section"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("background-color", AttributeType::Color),
            ("border", AttributeType::String),
            ("border-radius", AttributeType::String),
            ("direction", DIRECTION),
            ("full-width", AttributeType::Enum(&["full-width", "false"])),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
            ("text-align", AttributeType::Enum(&["left", "center", "right"])),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("direction", "ltr"), ("padding", "20px 0"), ("text-align", "center")]
    }

    fn child_context(&self, element: &Element<'_, '_>) -> RenderContext {
        let width = inner_width(element, container_width(element.context()));
        element
            .context()
            .for_children()
            .with(CONTAINER_WIDTH, px_string(width))
            .with(NON_RAW_SIBLINGS, element.non_raw_children().len().to_string())
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let width = format_number(container_width(element.context()));
        let full_width = element.attr("full-width") == Some("full-width");
        let background = element.non_empty_attr("background-color").map(str::to_string);
        let css_class = element.non_empty_attr("css-class").map(str::to_string);
        let outlook_class = css_class.as_deref().map(|c| format!("{}-outlook", c)).unwrap_or_default();

        let max_width = format!("{}px", width);
        let div_style = styles(&[
            ("background", background.as_deref().filter(|_| !full_width)),
            ("background-color", background.as_deref().filter(|_| !full_width)),
            ("margin", Some("0px auto")),
            ("border-radius", element.attr("border-radius")),
            ("max-width", Some(max_width.as_str())),
        ]);
        let table_style = styles(&[
            ("background", background.as_deref().filter(|_| !full_width)),
            ("background-color", background.as_deref().filter(|_| !full_width)),
            ("width", Some("100%")),
            ("border-radius", element.attr("border-radius")),
        ]);
        let td_style = styles(&[
            ("border", element.attr("border")),
            ("direction", element.attr("direction")),
            ("font-size", Some("0px")),
            ("padding", element.attr("padding")),
            ("padding-bottom", element.attr("padding-bottom")),
            ("padding-left", element.attr("padding-left")),
            ("padding-right", element.attr("padding-right")),
            ("padding-top", element.attr("padding-top")),
            ("text-align", element.attr("text-align")),
        ]);

        let context = element.child_context();
        let box_width = container_width(&context);
        let mut columns = String::new();
        for child in element.children() {
            if element.is_raw(child) {
                columns.push_str(&element.render_child(child, &context)?);
                continue;
            }

            let attributes = element.child_attributes(child, &context);
            let siblings = context.get(NON_RAW_SIBLINGS).and_then(|s| s.parse().ok()).unwrap_or(1);
            let (number, unit) = column_width(attributes.get("width").map(String::as_str), siblings);
            let outlook_width = format_number(column_pixels(number, &unit, box_width));
            let child_class = outlook_cell_class(&attributes);
            let vertical_align = attributes.get("vertical-align").map_or("top", String::as_str);

            let rendered = element.render_child(child, &context)?;
            columns.push_str(&format!(
                "<!--[if mso | IE]><td class=\"{}\" style=\"vertical-align:{};width:{}px;\" ><![endif]-->{}<!--[if mso | IE]></td><![endif]-->",
                child_class, vertical_align, outlook_width, rendered
            ));
        }

        let section = format!(
            "<div{} style=\"{}\"><table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"{}\"><tbody><tr><td style=\"{}\">\
             <!--[if mso | IE]><table role=\"presentation\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\"><tr><![endif]-->\
             {}<!--[if mso | IE]></tr></table><![endif]--></td></tr></tbody></table></div>",
            html_attributes(&[("class", css_class.as_deref().filter(|_| !full_width))]),
            div_style,
            table_style,
            td_style,
            columns
        );

        let outlook_open = format!(
            "<!--[if mso | IE]><table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" class=\"{}\" role=\"presentation\" style=\"width:{w}px;\" width=\"{w}\" ><tr><td style=\"line-height:0px;font-size:0px;mso-line-height-rule:exactly;\"><![endif]-->",
            outlook_class,
            w = width
        );
        let outlook_close = "<!--[if mso | IE]></td></tr></table><![endif]-->";

        if !full_width {
            return Ok(format!("{}{}{}", outlook_open, section, outlook_close));
        }

        let full_style = styles(&[
            ("background", background.as_deref()),
            ("background-color", background.as_deref()),
            ("width", Some("100%")),
        ]);
        Ok(format!(
            "<table align=\"center\"{} border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"{}\"><tbody><tr><td>{}{}{}</td></tr></tbody></table>",
            html_attributes(&[("class", css_class.as_deref())]),
            full_style,
            outlook_open,
            section,
            outlook_close
        ))
    }
}

/// Declared column width as number and unit, an equal share of the row when unset
fn column_width(width: Option<&str>, siblings: usize) -> (f64, String) {
    match width.and_then(parse_length) {
        Some((number, unit)) => (number, unit.to_string()),
        None => (100.0 / siblings.max(1) as f64, "%".to_string()),
    }
}

fn column_pixels(number: f64, unit: &str, container: f64) -> f64 {
    if unit == "%" {
        container * number / 100.0
    } else {
        number
    }
}

/// Responsive class of a column, `mj-column-per-50` or `mj-column-px-200`
fn column_class(number: f64, unit: &str) -> String {
    let number = format_number(number).replace('.', "-");
    if unit == "%" {
        format!("mj-column-per-{}", number)
    } else {
        format!("mj-column-px-{}", number)
    }
}

fn outlook_cell_class(attributes: &Attributes) -> String {
    attributes
        .get("css-class")
        .map(|classes| {
            classes
                .split_whitespace()
                .map(|c| format!("{}-outlook", c))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// `mj-column`: vertical stack of content inside a section
pub struct Column;

impl Column {
    fn pixel_width(element: &Element<'_, '_>) -> f64 {
        let siblings = element
            .context()
            .get(NON_RAW_SIBLINGS)
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let (number, unit) = column_width(element.attr("width"), siblings);
        column_pixels(number, &unit, container_width(element.context()))
    }
}

impl BodyComponent for Column {
    fn tag_name(&self) -> &'static str {
        "mj-column"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("background-color", AttributeType::Color),
            ("border", AttributeType::String),
            ("border-radius", AttributeType::String),
            ("direction", DIRECTION),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
            ("vertical-align", VERTICAL_ALIGN),
            ("width", AttributeType::PX_PERCENT),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("direction", "ltr"), ("vertical-align", "top")]
    }

    fn child_context(&self, element: &Element<'_, '_>) -> RenderContext {
        let width = inner_width(element, Column::pixel_width(element));
        element.context().for_children().with(CONTAINER_WIDTH, px_string(width))
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let siblings = element
            .context()
            .get(NON_RAW_SIBLINGS)
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let (number, unit) = column_width(element.attr("width"), siblings);
        let class = column_class(number, &unit);
        element.global_mut().add_media_query(&class, number, &unit);

        let css_class = element
            .non_empty_attr("css-class")
            .map(|c| format!(" {}", c))
            .unwrap_or_default();
        let div_style = styles(&[
            ("font-size", Some("0px")),
            ("text-align", Some("left")),
            ("direction", element.attr("direction")),
            ("display", Some("inline-block")),
            ("vertical-align", element.attr("vertical-align")),
            ("width", Some("100%")),
        ]);

        let has_gutter = ["padding", "padding-top", "padding-right", "padding-bottom", "padding-left"]
            .iter()
            .any(|name| element.non_empty_attr(name).is_some());
        let table_style = styles(&[
            ("background-color", element.attr("background-color")),
            ("border", element.attr("border")),
            ("border-radius", element.attr("border-radius")),
            ("vertical-align", element.attr("vertical-align").filter(|_| !has_gutter)),
        ]);
        let gutter_style = styles(&[
            ("padding", element.attr("padding")),
            ("padding-top", element.attr("padding-top")),
            ("padding-right", element.attr("padding-right")),
            ("padding-bottom", element.attr("padding-bottom")),
            ("padding-left", element.attr("padding-left")),
            ("vertical-align", element.attr("vertical-align")),
        ]);

        let context = element.child_context();
        let mut rows = String::new();
        for child in element.children() {
            if element.is_raw(child) {
                rows.push_str(&element.render_child(child, &context)?);
                continue;
            }

            let attributes = element.child_attributes(child, &context);
            let get = |name: &str| attributes.get(name).map(String::as_str);
            let cell_style = styles(&[
                ("background", get("container-background-color")),
                ("font-size", Some("0px")),
                ("padding", get("padding")),
                ("padding-top", get("padding-top")),
                ("padding-right", get("padding-right")),
                ("padding-bottom", get("padding-bottom")),
                ("padding-left", get("padding-left")),
                ("word-break", Some("break-word")),
            ]);
            let cell = html_attributes(&[("align", get("align")), ("class", get("css-class")), ("style", Some(cell_style.as_str()))]);

            let rendered = element.render_child(child, &context)?;
            rows.push_str(&format!("<tr><td{}>{}</td></tr>", cell, rendered));
        }

        let inner = format!(
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\"{} width=\"100%\"><tbody>{}</tbody></table>",
            html_attributes(&[("style", Some(table_style.as_str()).filter(|s| !s.is_empty()))]),
            rows
        );
        let body = if has_gutter {
            format!(
                "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" width=\"100%\"><tbody><tr><td style=\"{}\">{}</td></tr></tbody></table>",
                gutter_style, inner
            )
        } else {
            inner
        };

        Ok(format!(
            "<div class=\"{} mj-outlook-group-fix{}\" style=\"{}\">{}</div>",
            class, css_class, div_style, body
        ))
    }
}
