//! Carousel components

use mailforge_dom::{Attributes, RenderContext};

use super::{container_width, html_attributes, px, styles};
use crate::component::{AttributeType, BodyComponent};
use crate::global::format_number;
use crate::render::Element;
use crate::{CompileError, Target};

const IMAGE: &str = "mj-carousel-image";
const THUMBNAILS: &str = "thumbnails";
const IMAGE_INDEX: &str = "carousel-image-index";

/// `mj-carousel`: slides of `mj-carousel-image`
pub struct Carousel;

impl Carousel {
    /// Static thumbnail strip linking to each image
    fn thumbnails(element: &Element<'_, '_>, context: &RenderContext) -> String {
        let images: Vec<Attributes> = element
            .children()
            .iter()
            .filter(|c| c.tag_name == IMAGE)
            .map(|c| element.child_attributes(c, context))
            .collect();
        if images.len() < 2 {
            return String::new();
        }

        let width = match element.attr("tb-width").map(|w| px(Some(w))) {
            Some(width) if width > 0.0 => width,
            _ => (container_width(context) / images.len() as f64).min(110.0),
        };
        let width = format_number(width.trunc());
        let link_width = format!("{}px", width);
        let link_style = styles(&[
            ("border", element.attr("tb-border")),
            ("border-radius", element.attr("tb-border-radius")),
            ("display", Some("inline-block")),
            ("overflow", Some("hidden")),
            ("width", Some(link_width.as_str())),
        ]);

        let links: String = images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                let src = image.get("thumbnails-src").or_else(|| image.get("src")).map(String::as_str);
                format!(
                    "<a href=\"#{}\" class=\"mj-carousel-thumbnail\" style=\"{}\"><img{} /></a>",
                    index + 1,
                    link_style,
                    html_attributes(&[
                        ("style", Some("display:block;width:100%;height:auto;")),
                        ("src", src),
                        ("alt", image.get("alt").map(String::as_str)),
                        ("width", Some(width.as_str())),
                    ])
                )
            })
            .collect();
        format!("<div class=\"mj-carousel-thumbnails\">{}</div>", links)
    }
}

impl BodyComponent for Carousel {
    fn tag_name(&self) -> &'static str {
        "mj-carousel"
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("align", AttributeType::Enum(&["left", "center", "right"])),
            ("border-radius", AttributeType::PADDING),
            ("container-background-color", AttributeType::Color),
            ("icon-width", AttributeType::PX_PERCENT),
            ("left-icon", AttributeType::String),
            ("padding", AttributeType::PADDING),
            ("padding-top", AttributeType::PX_PERCENT),
            ("padding-bottom", AttributeType::PX_PERCENT),
            ("padding-left", AttributeType::PX_PERCENT),
            ("padding-right", AttributeType::PX_PERCENT),
            ("right-icon", AttributeType::String),
            ("thumbnails", AttributeType::Enum(&["visible", "hidden", "supported"])),
            ("tb-border", AttributeType::String),
            ("tb-border-radius", AttributeType::PX_PERCENT),
            ("tb-hover-border-color", AttributeType::Color),
            ("tb-selected-border-color", AttributeType::Color),
            ("tb-width", AttributeType::PX_PERCENT),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "center"),
            ("border-radius", "6px"),
            ("icon-width", "44px"),
            ("left-icon", "https://i.imgur.com/xTh3hln.png"),
            ("right-icon", "https://i.imgur.com/os7o9kz.png"),
            ("thumbnails", "visible"),
            ("tb-border", "2px solid transparent"),
            ("tb-border-radius", "6px"),
            ("tb-hover-border-color", "#fead0d"),
            ("tb-selected-border-color", "#ccc"),
        ]
    }

    fn child_context(&self, element: &Element<'_, '_>) -> RenderContext {
        let context = element.context().for_children();
        match element.attr("thumbnails") {
            Some(thumbnails) => context.with(THUMBNAILS, thumbnails),
            None => context,
        }
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let mut passed = Attributes::new();
        if let Some(radius) = element.attr("border-radius") {
            passed.insert("border-radius".to_string(), radius.to_string());
        }
        let context = element.child_context().with_inherited_attributes(passed);
        let target = element.target();

        let mut slides = String::new();
        let mut index = 0;
        for child in element.children() {
            if child.tag_name != IMAGE {
                slides.push_str(&element.render_child(child, &context)?);
                continue;
            }
            index += 1;
            // The HTML fallback shows the first image only
            if target == Target::Html && index > 1 {
                continue;
            }
            slides.push_str(&element.render_child(child, &context.with(IMAGE_INDEX, index.to_string()))?);
        }

        Ok(match target {
            Target::Amp => format!(
                "<amp-carousel type=\"slides\" class=\"mj-carousel\" style=\"width:100%;\">{}</amp-carousel>",
                slides
            ),
            Target::Html => {
                let thumbnails = match element.attr("thumbnails") {
                    Some("hidden") => String::new(),
                    _ => Carousel::thumbnails(element, &context),
                };
                format!("<div class=\"mj-carousel\" style=\"width:100%;\">{}{}</div>", slides, thumbnails)
            }
        })
    }
}

/// `mj-carousel-image`: one slide
pub struct CarouselImage;

impl BodyComponent for CarouselImage {
    fn tag_name(&self) -> &'static str {
        IMAGE
    }

    fn allowed_attributes(&self) -> &'static [(&'static str, AttributeType)] {
        &[
            ("alt", AttributeType::String),
            ("href", AttributeType::String),
            ("rel", AttributeType::String),
            ("target", AttributeType::String),
            ("title", AttributeType::String),
            ("src", AttributeType::String),
            ("thumbnails-src", AttributeType::String),
            ("border-radius", AttributeType::PADDING),
            ("tb-border", AttributeType::String),
            ("tb-border-radius", AttributeType::PADDING),
        ]
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("alt", ""), ("target", "_blank")]
    }

    fn ending_tag(&self) -> bool {
        true
    }

    fn render(&self, element: &mut Element<'_, '_>) -> Result<String, CompileError> {
        let width = format_number(container_width(element.context()).trunc());
        let index = element.context().get(IMAGE_INDEX).unwrap_or("1");
        let image_style = styles(&[
            ("border-radius", element.attr("border-radius")),
            ("display", Some("block")),
            ("max-width", Some("100%")),
        ]);

        let image = match element.target() {
            Target::Amp => format!(
                "<amp-img{}></amp-img>",
                html_attributes(&[
                    ("src", element.attr("src")),
                    ("alt", Some(element.attr("alt").unwrap_or(""))),
                    ("width", Some(width.as_str())),
                    ("height", Some(width.as_str())),
                    ("layout", Some("responsive")),
                    ("title", element.attr("title")),
                    ("style", Some(image_style.as_str())),
                ])
            ),
            Target::Html => format!(
                "<img{} />",
                html_attributes(&[
                    ("src", element.attr("src")),
                    ("alt", Some(element.attr("alt").unwrap_or(""))),
                    ("width", Some(width.as_str())),
                    ("title", element.attr("title")),
                    ("style", Some(image_style.as_str())),
                ])
            ),
        };

        let content = match element.non_empty_attr("href") {
            Some(href) => format!(
                "<a{}>{}</a>",
                html_attributes(&[("href", Some(href)), ("rel", element.attr("rel")), ("target", Some("_blank"))]),
                image
            ),
            None => image,
        };

        let class = match element.non_empty_attr("css-class") {
            Some(css) => format!("mj-carousel-image mj-carousel-image-{} {}", index, css),
            None => format!("mj-carousel-image mj-carousel-image-{}", index),
        };
        Ok(format!("<div class=\"{}\">{}</div>", class, content))
    }
}
