//! Compiler - Main entry point
//!
//! Runs one document through parse, validation, head handling, body
//! rendering and the post-render passes that turn the markup into the
//! selected output dialect.

use std::sync::{Arc, OnceLock};

use mailforge_amp::{build_font_links, AmpTransform};
use mailforge_css::{build_amp_custom_css, MinificationGuard};
use mailforge_dom::{AttributeResolver, ElementNode, RenderContext};
use mailforge_html::{apply_attribute_overrides, beautify, inline_css, HtmlMinifier, InlineOptions, MinifyOptions};
use mailforge_net::{backfill_image_dimensions, fetch_font_css, Fetcher, HttpFetcher};
use serde::Serialize;

use crate::component::{Preset, Registry};
use crate::diagnostics::validation_message;
use crate::fonts::{html_font_tags, used_font_urls};
use crate::parser::{MarkupParser, XmlParser};
use crate::render::Renderer;
use crate::skeleton::{amp_document, html_document};
use crate::validate::{AttributeValidator, Validator};
use crate::{CompileError, CompileOptions, Diagnostic, GlobalData, HeadValue, Target, ValidationLevel};

const ROOT: &str = "mjml";
const HEAD: &str = "mj-head";
const BODY: &str = "mj-body";
const RAW: &str = "mj-raw";

/// Result of a successful compile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    /// Final document
    pub html: String,
    /// Tree the document was compiled from
    pub parsed_tree: ElementNode,
    /// Validation and render diagnostics
    pub errors: Vec<Diagnostic>,
}

/// Email compiler
pub struct Compiler {
    options: CompileOptions,
    registry: Registry,
    parser: Box<dyn MarkupParser>,
    validator: Box<dyn Validator>,
    fetcher: Option<Arc<dyn Fetcher>>,
    /// HTTP fetcher built on first use when none was supplied
    http_fetcher: OnceLock<Option<Arc<dyn Fetcher>>>,
}

impl Compiler {
    /// Create a compiler with the core components
    pub fn new(options: CompileOptions) -> Self {
        tracing::info!("mailforge compiler {} initialized", crate::VERSION);

        let parser = XmlParser::new().keep_comments(options.keep_comments);
        let validator = AttributeValidator::new().with_template_markers(options.template_markers());

        Self {
            registry: Registry::core(),
            parser: Box::new(parser),
            validator: Box::new(validator),
            fetcher: None,
            http_fetcher: OnceLock::new(),
            options,
        }
    }

    /// Register extra components
    pub fn with_preset(mut self, preset: &Preset) -> Self {
        self.registry.register_preset(preset);
        self
    }

    /// Fetcher used for fonts and image dimensions. Defaults to HTTP.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_parser(mut self, parser: Box<dyn MarkupParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compile markup source, blocking on any network work
    pub fn compile(&self, source: &str) -> Result<CompileOutput, CompileError> {
        smol::block_on(self.compile_async(source))
    }

    pub async fn compile_async(&self, source: &str) -> Result<CompileOutput, CompileError> {
        let tree = self.parser.parse(source, &self.registry.ending_tags())?;
        self.compile_tree_async(tree).await
    }

    /// Compile an already parsed tree
    pub fn compile_tree(&self, tree: ElementNode) -> Result<CompileOutput, CompileError> {
        smol::block_on(self.compile_tree_async(tree))
    }

    pub async fn compile_tree_async(&self, tree: ElementNode) -> Result<CompileOutput, CompileError> {
        if tree.tag_name != ROOT {
            return Err(CompileError::Malformed);
        }

        let mut errors = match self.options.validation_level {
            ValidationLevel::Skip => Vec::new(),
            ValidationLevel::Soft | ValidationLevel::Strict => self.validator.validate(&tree, &self.registry),
        };
        if self.options.validation_level == ValidationLevel::Strict && !errors.is_empty() {
            return Err(CompileError::Validation {
                message: validation_message(&errors),
                diagnostics: errors,
            });
        }

        let mut global = GlobalData::new(&self.options);
        self.apply_root_attributes(&tree, &mut global)?;

        let mut renderer = Renderer::new(&self.registry, global);
        if let Some(head) = tree.find_child(HEAD) {
            renderer.handle_head(head)?;
        }

        let content = match tree.find_child(BODY) {
            Some(body) => {
                let resolved = AttributeResolver::new(renderer.global().tables()).resolve(body);
                renderer.render(&resolved, &RenderContext::new())?
            }
            None => String::new(),
        };
        if content.trim().is_empty() {
            return Err(CompileError::Malformed);
        }

        for raw in tree.children_named(RAW) {
            if raw.attr("position") == Some("file-start") {
                renderer
                    .global_mut()
                    .add("before_doctype", HeadValue::text(raw.content_or_empty().trim()))?;
            }
        }

        let (global, diagnostics) = renderer.into_parts();
        errors.extend(diagnostics);

        let content = match global.html_attributes() {
            [] => content,
            overrides => apply_attribute_overrides(&content, overrides)?,
        };

        let mut html = self.assemble(&global, &content).await;

        let inline_styles = global.styles().inline_styles();
        if !inline_styles.is_empty() {
            let options = InlineOptions {
                keep_style_tags: self.options.inline_keep_style_tags,
            };
            html = inline_css(&html, &inline_styles.join(""), options)?;
        }

        html = self.minify(html)?;

        if global.target() == Target::Amp {
            html = AmpTransform::new().transform(&html);
            if self.options.fetch_image_dimensions {
                if let Some(fetcher) = self.fetcher().await {
                    html = backfill_image_dimensions(fetcher, &html, &self.options.image_fetch_options()).await;
                }
            }
        }

        tracing::debug!("Compiled {} nodes with {} diagnostics", tree.node_count(), errors.len());

        Ok(CompileOutput {
            html,
            parsed_tree: tree,
            errors,
        })
    }

    /// `lang`, `dir` and `owa` on the root element. Options win over markup.
    fn apply_root_attributes(&self, tree: &ElementNode, global: &mut GlobalData) -> Result<(), CompileError> {
        if self.options.lang.is_none() {
            if let Some(lang) = tree.attr("lang") {
                global.add("lang", HeadValue::text(lang))?;
            }
        }
        if self.options.dir.is_none() {
            if let Some(dir) = tree.attr("dir") {
                global.add("dir", HeadValue::text(dir))?;
            }
        }
        if tree.attr("owa") == Some("desktop") {
            global.add("force_owa_desktop", HeadValue::Flag(true))?;
        }
        Ok(())
    }

    /// Wrap the body into the document skeleton, with its font references
    async fn assemble(&self, global: &GlobalData, content: &str) -> String {
        let urls = used_font_urls(content, global.styles().inline_styles(), global.fonts());

        match global.target() {
            Target::Html => html_document(global, content, &html_font_tags(&urls)),
            Target::Amp => {
                let styles = global.styles();
                let mut custom_css = build_amp_custom_css(
                    global.breakpoint(),
                    &styles.head_styles(global.breakpoint()),
                    styles.styles(),
                    styles.media_queries(),
                );
                let mut links = build_font_links(&urls);

                if self.options.fetch_fonts_for_amp && !urls.is_empty() {
                    if let Some(fetcher) = self.fetcher().await {
                        let font_css = fetch_font_css(fetcher, &urls, &self.options.font_fetch_options()).await;
                        if !font_css.is_empty() {
                            custom_css = format!("{}\n{}", font_css, custom_css);
                            links.clear();
                        }
                    }
                }

                amp_document(global, content, &custom_css, &links)
            }
        }
    }

    fn minify(&self, html: String) -> Result<String, CompileError> {
        if !self.options.minify {
            return Ok(if self.options.beautify { beautify(&html) } else { html });
        }

        let minifier = HtmlMinifier::new(MinifyOptions {
            keep_comments: self.options.keep_comments,
            minify_css: self.options.minify_css,
        });
        if self.options.sanitize_styles && self.options.minify_css {
            let guard = MinificationGuard::new(self.options.template_syntax.clone())
                .allow_mixed_syntax(self.options.allow_mixed_syntax);
            return Ok(guard.protect(&html, |tokenized| minifier.minify(tokenized))?);
        }
        Ok(minifier.minify(&html))
    }

    /// The supplied fetcher, else the shared HTTP one. The blocking client
    /// is built on the blocking pool and lives as long as the compiler, so
    /// neither its construction nor its drop runs inside a future.
    async fn fetcher(&self) -> Option<Arc<dyn Fetcher>> {
        if let Some(fetcher) = &self.fetcher {
            return Some(fetcher.clone());
        }
        if let Some(fetcher) = self.http_fetcher.get() {
            return fetcher.clone();
        }

        let built = match smol::unblock(HttpFetcher::new).await {
            Ok(fetcher) => Some(Arc::new(fetcher) as Arc<dyn Fetcher>),
            Err(e) => {
                tracing::warn!("HTTP fetcher unavailable: {}", e);
                None
            }
        };
        self.http_fetcher.get_or_init(|| built).clone()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<mjml lang="en">
  <mj-head>
    <mj-title>Hello</mj-title>
  </mj-head>
  <mj-body>
    <mj-section>
      <mj-column>
        <mj-text>Hi there</mj-text>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>"#;

    #[test]
    fn test_compile_amp_document() {
        let output = Compiler::new(CompileOptions::amp()).compile(DOCUMENT).unwrap();

        assert!(output.html.contains("<html ⚡4email"));
        assert!(output.html.contains("lang=\"en\""));
        assert!(output.html.contains("Hi there"));
        assert_eq!(output.html.matches("<style amp-custom>").count(), 1);
        assert!(output.errors.is_empty());
        assert_eq!(output.parsed_tree.tag_name, "mjml");
    }

    #[test]
    fn test_compile_html_document() {
        let output = Compiler::new(CompileOptions::html()).compile(DOCUMENT).unwrap();

        assert!(output.html.starts_with("<!doctype html>"));
        assert!(output.html.contains("<title>Hello</title>"));
        assert!(!output.html.contains("amp-custom"));
    }

    #[test]
    fn test_missing_body_is_malformed() {
        let err = Compiler::default().compile("<mjml><mj-head></mj-head></mjml>").unwrap_err();
        assert!(matches!(err, CompileError::Malformed));

        let err = Compiler::default().compile("<mj-body></mj-body>").unwrap_err();
        assert!(matches!(err, CompileError::Malformed));
    }

    #[test]
    fn test_options_lang_wins_over_markup() {
        let options = CompileOptions {
            lang: Some("fr".to_string()),
            ..CompileOptions::html()
        };
        let output = Compiler::new(options).compile(DOCUMENT).unwrap();
        assert!(output.html.contains("lang=\"fr\""));
        assert!(!output.html.contains("lang=\"en\""));
    }

    #[test]
    fn test_http_fetcher_built_once() {
        let compiler = Compiler::default();
        let first = smol::block_on(compiler.fetcher()).unwrap();
        let second = smol::block_on(async { compiler.fetcher().await }).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_output_serializes_camel_case() {
        let output = Compiler::new(CompileOptions::html()).compile(DOCUMENT).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert!(json.get("parsedTree").is_some());
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
