//! Per-compile global data
//!
//! `GlobalData` is allocated fresh for every compile and written through a
//! narrow API while the head and body render. Nothing reads the collected
//! styles until rendering has finished.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use mailforge_dom::{AttributeTables, Attributes};
use mailforge_html::AttributeOverride;

use crate::{CompileError, CompileOptions, Target};

/// Head CSS produced from the breakpoint at assembly time
pub type HeadStyle = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Styles collected while rendering
#[derive(Default, Clone)]
pub struct StyleAggregator {
    media_queries: Vec<(String, String)>,
    head_styles: Vec<(String, HeadStyle)>,
    component_head_styles: Vec<HeadStyle>,
    styles: Vec<String>,
    inline_styles: Vec<String>,
}

impl fmt::Debug for StyleAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleAggregator")
            .field("media_queries", &self.media_queries)
            .field(
                "head_styles",
                &self.head_styles.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            )
            .field("component_head_styles", &self.component_head_styles.len())
            .field("styles", &self.styles)
            .field("inline_styles", &self.inline_styles)
            .finish()
    }
}

impl StyleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the desktop width rule of `class_name`. A later rule for the
    /// same class replaces the earlier one in place.
    pub fn add_media_query(&mut self, class_name: &str, width: f64, unit: &str) {
        let width = format_number(width);
        let rule = format!("{{ width:{w}{u} !important; max-width: {w}{u}; }}", w = width, u = unit);

        match self.media_queries.iter_mut().find(|(name, _)| name == class_name) {
            Some(entry) => entry.1 = rule,
            None => self.media_queries.push((class_name.to_string(), rule)),
        }
    }

    /// Register head CSS under `identifier`, replacing any earlier entry
    pub fn add_head_style(&mut self, identifier: &str, style: HeadStyle) {
        match self.head_styles.iter_mut().find(|(id, _)| id == identifier) {
            Some(entry) => entry.1 = style,
            None => self.head_styles.push((identifier.to_string(), style)),
        }
    }

    pub fn add_component_head_style(&mut self, style: HeadStyle) {
        self.component_head_styles.push(style);
    }

    /// Global `<mj-style>` CSS
    pub fn add_style(&mut self, css: impl Into<String>) {
        self.styles.push(css.into());
    }

    /// CSS to inline into matching elements
    pub fn add_inline_style(&mut self, css: impl Into<String>) {
        self.inline_styles.push(css.into());
    }

    pub fn media_queries(&self) -> &[(String, String)] {
        &self.media_queries
    }

    /// Component head styles first, then per-identifier head styles
    pub fn head_styles(&self, breakpoint: &str) -> Vec<String> {
        self.component_head_styles
            .iter()
            .map(|style| style(breakpoint))
            .chain(self.head_styles.iter().map(|(_, style)| style(breakpoint)))
            .filter(|css| !css.trim().is_empty())
            .collect()
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn inline_styles(&self) -> &[String] {
        &self.inline_styles
    }

    pub fn has_head_style(&self, identifier: &str) -> bool {
        self.head_styles.iter().any(|(id, _)| id == identifier)
    }
}

/// `50` for 50.0, shortest round-trip text otherwise
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Value written through [`GlobalData::add`]
#[derive(Debug, Clone, PartialEq)]
pub enum HeadValue {
    Text(String),
    Flag(bool),
    /// One key of a name to value record
    Entry(String, String),
    /// Attribute set keyed by tag or class name
    Attributes(String, Attributes),
    /// Defaults an attribute class gives a descendant tag
    ClassDefault {
        class: String,
        tag: String,
        attributes: Attributes,
    },
    /// Attributes set on every element matching a selector
    Selector(String, Vec<(String, String)>),
}

impl HeadValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// Document-wide state of one compile
#[derive(Debug, Clone)]
pub struct GlobalData {
    target: Target,
    breakpoint: String,
    title: String,
    preview: String,
    lang: String,
    dir: String,
    force_owa_desktop: bool,
    printer_support: bool,
    background_color: Option<String>,
    before_doctype: Vec<String>,
    head_raw: Vec<String>,
    fonts: BTreeMap<String, String>,
    html_attributes: Vec<AttributeOverride>,
    tables: AttributeTables,
    styles: StyleAggregator,
}

impl GlobalData {
    pub fn new(options: &CompileOptions) -> Self {
        Self {
            target: options.target,
            breakpoint: options.breakpoint.clone(),
            title: String::new(),
            preview: String::new(),
            lang: options.lang.clone().unwrap_or_else(|| "und".to_string()),
            dir: options.dir.clone().unwrap_or_else(|| "auto".to_string()),
            force_owa_desktop: false,
            printer_support: options.printer_support,
            background_color: None,
            before_doctype: Vec::new(),
            head_raw: Vec::new(),
            fonts: options.fonts.clone(),
            html_attributes: Vec::new(),
            tables: AttributeTables::new(),
            styles: StyleAggregator::new(),
        }
    }

    /// Write a named datum. Lists append, records merge, scalars replace.
    pub fn add(&mut self, name: &str, value: HeadValue) -> Result<(), CompileError> {
        match (name, value) {
            ("breakpoint", HeadValue::Text(v)) => self.breakpoint = v,
            ("title", HeadValue::Text(v)) => self.title = v,
            ("preview", HeadValue::Text(v)) => self.preview = v,
            ("lang", HeadValue::Text(v)) => self.lang = v,
            ("dir", HeadValue::Text(v)) => self.dir = v,
            ("background_color", HeadValue::Text(v)) => self.background_color = Some(v),
            ("force_owa_desktop", HeadValue::Flag(v)) => self.force_owa_desktop = v,
            ("printer_support", HeadValue::Flag(v)) => self.printer_support = v,
            ("before_doctype", HeadValue::Text(v)) => self.before_doctype.push(v),
            ("head_raw", HeadValue::Text(v)) => self.head_raw.push(v),
            ("style", HeadValue::Text(v)) => self.styles.add_style(v),
            ("inline_style", HeadValue::Text(v)) => self.styles.add_inline_style(v),
            ("fonts", HeadValue::Entry(font, url)) => {
                self.fonts.insert(font, url);
            }
            ("default_attributes", HeadValue::Attributes(tag, attributes)) => {
                self.tables.merge_default_attributes(&tag, attributes)
            }
            ("classes", HeadValue::Attributes(class, attributes)) => self.tables.merge_class(&class, attributes),
            (
                "classes_default",
                HeadValue::ClassDefault {
                    class,
                    tag,
                    attributes,
                },
            ) => self.tables.merge_class_default(&class, &tag, attributes),
            ("html_attributes", HeadValue::Selector(selector, attributes)) => {
                self.merge_html_attributes(selector, attributes)
            }
            (
                "breakpoint" | "title" | "preview" | "lang" | "dir" | "background_color" | "force_owa_desktop"
                | "printer_support" | "before_doctype" | "head_raw" | "style" | "inline_style" | "fonts"
                | "default_attributes" | "classes" | "classes_default" | "html_attributes",
                _,
            ) => {
                return Err(CompileError::InvalidHeadValue {
                    name: name.to_string(),
                })
            }
            _ => {
                return Err(CompileError::UnknownHeadAttribute {
                    name: name.to_string(),
                })
            }
        }

        Ok(())
    }

    fn merge_html_attributes(&mut self, selector: String, attributes: Vec<(String, String)>) {
        let entry = match self.html_attributes.iter().position(|o| o.selector == selector) {
            Some(index) => &mut self.html_attributes[index],
            None => {
                self.html_attributes.push(AttributeOverride::new(selector));
                let last = self.html_attributes.len() - 1;
                &mut self.html_attributes[last]
            }
        };

        for (name, value) in attributes {
            match entry.attributes.iter_mut().find(|(n, _)| *n == name) {
                Some(existing) => existing.1 = value,
                None => entry.attributes.push((name, value)),
            }
        }
    }

    pub fn add_media_query(&mut self, class_name: &str, width: f64, unit: &str) {
        self.styles.add_media_query(class_name, width, unit);
    }

    pub fn add_head_style(&mut self, identifier: &str, style: HeadStyle) {
        self.styles.add_head_style(identifier, style);
    }

    pub fn add_component_head_style(&mut self, style: HeadStyle) {
        self.styles.add_component_head_style(style);
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn breakpoint(&self) -> &str {
        &self.breakpoint
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn force_owa_desktop(&self) -> bool {
        self.force_owa_desktop
    }

    pub fn printer_support(&self) -> bool {
        self.printer_support
    }

    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    pub fn before_doctype(&self) -> &[String] {
        &self.before_doctype
    }

    pub fn head_raw(&self) -> &[String] {
        &self.head_raw
    }

    pub fn fonts(&self) -> &BTreeMap<String, String> {
        &self.fonts
    }

    pub fn html_attributes(&self) -> &[AttributeOverride] {
        &self.html_attributes
    }

    pub fn tables(&self) -> &AttributeTables {
        &self.tables
    }

    pub fn styles(&self) -> &StyleAggregator {
        &self.styles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> GlobalData {
        GlobalData::new(&CompileOptions::default())
    }

    #[test]
    fn test_media_query_rule_format() {
        let mut styles = StyleAggregator::new();
        styles.add_media_query("mj-column-per-50", 50.0, "%");
        styles.add_media_query("mj-column-px-200", 200.0, "px");
        styles.add_media_query("mj-column-per-50", 50.0, "%");

        assert_eq!(
            styles.media_queries(),
            &[
                (
                    "mj-column-per-50".to_string(),
                    "{ width:50% !important; max-width: 50%; }".to_string()
                ),
                (
                    "mj-column-px-200".to_string(),
                    "{ width:200px !important; max-width: 200px; }".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_head_styles_order_and_replacement() {
        let mut styles = StyleAggregator::new();
        styles.add_head_style("mj-image", Arc::new(|bp: &str| format!("@media (max-width:{}) {{}}", bp)));
        styles.add_component_head_style(Arc::new(|_: &str| ".c{}".to_string()));
        styles.add_head_style("mj-image", Arc::new(|_: &str| ".img{}".to_string()));
        styles.add_component_head_style(Arc::new(|_: &str| "  ".to_string()));

        assert_eq!(styles.head_styles("480px"), vec![".c{}", ".img{}"]);
        assert!(styles.has_head_style("mj-image"));
    }

    #[test]
    fn test_add_scalars_lists_and_records() {
        let mut global = global();
        global.add("title", HeadValue::text("One")).unwrap();
        global.add("title", HeadValue::text("Two")).unwrap();
        global.add("head_raw", HeadValue::text("<meta a>")).unwrap();
        global.add("head_raw", HeadValue::text("<meta b>")).unwrap();
        global
            .add("fonts", HeadValue::Entry("Raleway".into(), "https://fonts.test/r.css".into()))
            .unwrap();
        global.add("force_owa_desktop", HeadValue::Flag(true)).unwrap();

        assert_eq!(global.title(), "Two");
        assert_eq!(global.head_raw(), &["<meta a>".to_string(), "<meta b>".to_string()]);
        assert_eq!(global.fonts().get("Raleway").map(String::as_str), Some("https://fonts.test/r.css"));
        assert_eq!(global.fonts().len(), 6);
        assert!(global.force_owa_desktop());
    }

    #[test]
    fn test_html_attributes_merge_by_selector() {
        let mut global = global();
        global
            .add("html_attributes", HeadValue::Selector(".a".into(), vec![("x".into(), "1".into())]))
            .unwrap();
        global
            .add(
                "html_attributes",
                HeadValue::Selector(".a".into(), vec![("x".into(), "2".into()), ("y".into(), "3".into())]),
            )
            .unwrap();

        let overrides = global.html_attributes();
        assert_eq!(overrides.len(), 1);
        assert_eq!(
            overrides[0].attributes,
            vec![("x".to_string(), "2".to_string()), ("y".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn test_unknown_name_is_fatal() {
        let err = global().add("colour", HeadValue::text("red")).unwrap_err();
        assert!(matches!(err, CompileError::UnknownHeadAttribute { ref name } if name == "colour"));
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn test_value_kind_mismatch() {
        let err = global().add("title", HeadValue::Flag(true)).unwrap_err();
        assert!(matches!(err, CompileError::InvalidHeadValue { .. }));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(33.5), "33.5");
    }
}
