//! Integration tests - Full pipeline from markup to output document
//!
//! Tests the complete workflow: parse → validate → head → body → inline →
//! minify → AMP rewrite → network backfill

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailforge_engine::net::{Fetcher, NetError, Response};
use mailforge_engine::{CompileError, CompileOptions, Compiler, Target, ValidationLevel};

fn document(head: &str, column: &str) -> String {
    format!(
        "<mjml>\n<mj-head>{}</mj-head>\n<mj-body>\n<mj-section>\n<mj-column>\n{}\n</mj-column>\n</mj-section>\n</mj-body>\n</mjml>",
        head, column
    )
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Serves a fixed set of URLs and records every request
struct StubFetcher {
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for StubFetcher {
    fn get(&self, url: &str, _timeout: Duration) -> Result<Response, NetError> {
        self.calls.lock().unwrap().push(url.to_string());
        if url.starts_with("https://fonts.googleapis.com/css?family=Ubuntu") {
            return Ok(Response::ok(
                "@font-face { font-family: 'Ubuntu'; src: url(https://fonts.gstatic.com/s/ubuntu.woff2); }",
            ));
        }
        if url == "https://img.test/hero.png" {
            return Ok(Response::ok(png(1200, 600)));
        }
        Err(NetError::Network("unreachable".to_string()))
    }
}

// ============================================================================
// ATTRIBUTE RESOLUTION
// ============================================================================

#[test]
fn test_attribute_precedence() {
    let head = r##"<mj-attributes>
        <mj-all color="#111111" />
        <mj-text color="#222222" />
        <mj-class name="brand" color="#333333" />
    </mj-attributes>"##;
    let column = r##"<mj-text>a</mj-text>
        <mj-text mj-class="brand">b</mj-text>
        <mj-text mj-class="brand" color="#444444">c</mj-text>
        <mj-button>d</mj-button>"##;

    let output = Compiler::new(CompileOptions::html()).compile(&document(head, column)).unwrap();

    assert!(output.html.contains("color:#222222;"));
    assert!(output.html.contains("color:#333333;"));
    assert!(output.html.contains("color:#444444;"));
    // mj-all beats the button's built-in color
    assert!(output.html.contains("color:#111111;"));
    assert!(!output.html.contains("color:#000000;"));
}

#[test]
fn test_column_widths_per_section() {
    let source = r#"<mjml><mj-body>
        <mj-section>
            <mj-column><mj-text>left</mj-text></mj-column>
            <mj-column><mj-text>right</mj-text></mj-column>
        </mj-section>
        <mj-section>
            <mj-column><mj-text>full</mj-text></mj-column>
        </mj-section>
    </mj-body></mjml>"#;

    let output = Compiler::new(CompileOptions::html()).compile(source).unwrap();

    assert!(output.html.contains("mj-column-per-50"));
    assert!(output.html.contains("mj-column-per-100"));
    assert!(output.html.contains(".mj-column-per-50 { width:50% !important; max-width: 50%; }"));
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_unknown_tag_is_reported_and_skipped() {
    let source = document("", "<mj-unknown />\n<mj-text>kept</mj-text>");

    for level in [ValidationLevel::Soft, ValidationLevel::Strict] {
        let options = CompileOptions {
            validation_level: level,
            ..CompileOptions::html()
        };
        let output = Compiler::new(options).compile(&source).unwrap();

        assert_eq!(output.errors.len(), 1, "{:?}", level);
        assert_eq!(output.errors[0].tag_name, "mj-unknown");
        assert_eq!(output.errors[0].line, Some(6));
        assert!(output.html.contains("kept"));
    }
}

#[test]
fn test_strict_rejects_invalid_attribute() {
    let source = document("", r#"<mj-text padding="lots">x</mj-text>"#);

    let soft = Compiler::new(CompileOptions::html()).compile(&source).unwrap();
    assert_eq!(soft.errors.len(), 1);

    let options = CompileOptions {
        validation_level: ValidationLevel::Strict,
        ..CompileOptions::html()
    };
    match Compiler::new(options).compile(&source) {
        Err(CompileError::Validation { message, diagnostics }) => {
            assert!(message.starts_with("ValidationError: \n "));
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].tag_name, "mj-text");
        }
        other => panic!("expected validation error, got {:?}", other.map(|o| o.html)),
    }
}

#[test]
fn test_skip_level_reports_nothing_from_validator() {
    let options = CompileOptions {
        validation_level: ValidationLevel::Skip,
        ..CompileOptions::html()
    };
    let output = Compiler::new(options)
        .compile(&document("", r#"<mj-text padding="lots">x</mj-text>"#))
        .unwrap();
    assert!(output.errors.is_empty());
}

#[test]
fn test_malformed_documents() {
    let compiler = Compiler::default();
    assert!(matches!(compiler.compile("<mjml></mjml>"), Err(CompileError::Malformed)));
    assert!(matches!(
        compiler.compile("<mjml><mj-head></mj-head></mjml>"),
        Err(CompileError::Malformed)
    ));
    assert!(matches!(compiler.compile(""), Err(CompileError::Parse(_))));
    assert!(compiler
        .compile("<mjml/>")
        .unwrap_err()
        .to_string()
        .starts_with("Malformed MJML"));
}

#[test]
fn test_empty_body_still_renders_wrapper() {
    let output = Compiler::default().compile("<mjml><mj-body></mj-body>").unwrap();
    assert!(output.html.contains("<div lang=\"und\" dir=\"auto\"></div>"));
}

// ============================================================================
// HEAD AND DOCUMENT SHAPE
// ============================================================================

#[test]
fn test_file_start_raw_precedes_doctype() {
    let source = r#"<mjml>
        <mj-raw position="file-start">{% set brand = "x" %}</mj-raw>
        <mj-body><mj-section><mj-column><mj-text>t</mj-text></mj-column></mj-section></mj-body>
    </mjml>"#;

    for options in [CompileOptions::html(), CompileOptions::amp()] {
        let output = Compiler::new(options).compile(source).unwrap();
        assert!(output.html.starts_with("{% set brand = \"x\" %}\n<!doctype html>"));
    }
}

#[test]
fn test_bare_ampersands_in_content() {
    let column = r#"<mj-text>Fish & chips</mj-text>
        <mj-button href="https://shop.test/?a=1&b=2">Terms && conditions</mj-button>
        <mj-raw><script>if (a && b) {}</script></mj-raw>"#;
    let output = Compiler::default().compile(&document("", column)).unwrap();

    assert!(output.html.contains("Fish & chips"));
    assert!(output.html.contains("Terms && conditions"));
    assert!(output.html.contains("<script>if (a && b) {}</script>"));
}

#[test]
fn test_html_attributes_applied() {
    let head = r#"<mj-html-attributes>
        <mj-selector path=".custom div">
            <mj-html-attribute name="data-id">42</mj-html-attribute>
        </mj-selector>
    </mj-html-attributes>"#;
    let output = Compiler::new(CompileOptions::html())
        .compile(&document(head, r#"<mj-text css-class="custom">x</mj-text>"#))
        .unwrap();
    assert!(output.html.contains("data-id=\"42\""));
}

#[test]
fn test_inline_styles_applied() {
    let head = r#"<mj-style inline="inline">.red { color: red; }</mj-style>"#;
    let column = r#"<mj-raw><p class="red">hi</p></mj-raw>"#;
    let output = Compiler::new(CompileOptions::html()).compile(&document(head, column)).unwrap();
    assert!(output.html.contains("style=\"color: red;\""));
}

#[test]
fn test_inlining_keeps_document_shell_and_template_rows() {
    let source = r#"<mjml>
        <mj-raw position="file-start">{% raw %}</mj-raw>
        <mj-head><mj-style inline="inline">.red { color: red; }</mj-style></mj-head>
        <mj-body><mj-section><mj-column>
            <mj-raw><table><tbody>{{#each rows}}<tr><td class="red">{{name}}</td></tr>{{/each}}</tbody></table></mj-raw>
        </mj-column></mj-section></mj-body>
    </mjml>"#;

    for options in [CompileOptions::html(), CompileOptions::amp()] {
        let amp = options.target == Target::Amp;
        let html = Compiler::new(options).compile(source).unwrap().html;

        assert!(html.starts_with("{% raw %}\n<!doctype html>\n"));
        if amp {
            assert!(html.contains("<html \u{26A1}4email data-css-strict"));
        }
        assert!(html.contains("<tbody>{{#each rows}}<tr><td class=\"red\""));
        assert!(html.contains("{{name}}</td></tr>{{/each}}</tbody></table>"));
    }

    let html = Compiler::new(CompileOptions::html()).compile(source).unwrap().html;
    assert!(html.contains("<td class=\"red\" style=\"color: red;\">{{name}}</td>"));
}

#[test]
fn test_amp_single_custom_style_and_no_img() {
    let head = r#"<mj-style>.x { color: blue !important; }</mj-style>"#;
    let column = r#"<mj-image src="https://img.test/hero.png" width="300px" />
        <mj-carousel>
            <mj-carousel-image src="https://img.test/a.png" />
            <mj-carousel-image src="https://img.test/b.png" />
        </mj-carousel>"#;

    let output = Compiler::new(CompileOptions::amp()).compile(&document(head, column)).unwrap();

    assert_eq!(output.html.matches("<style amp-custom>").count(), 1);
    assert!(!output.html.contains("<img"));
    assert!(!output.html.contains("!important"));
    assert!(output.html.contains("layout=\"responsive\""));
    assert!(output.html.contains("<amp-carousel"));
    assert!(!output.html.contains("<!--[if mso"));
}

#[test]
fn test_html_target_keeps_outlook_markup() {
    let output = Compiler::new(CompileOptions::html())
        .compile(&document("", r#"<mj-image src="https://img.test/hero.png" />"#))
        .unwrap();
    assert!(output.html.contains("<!--[if mso | IE]>"));
    assert!(output.html.contains("<img"));
    assert_eq!(Compiler::new(CompileOptions::html()).options().target, Target::Html);
}

// ============================================================================
// MINIFICATION GUARD
// ============================================================================

fn minifying(sanitize: bool) -> CompileOptions {
    CompileOptions {
        minify: true,
        sanitize_styles: sanitize,
        ..CompileOptions::html()
    }
}

#[test]
fn test_template_tokens_survive_minification() {
    let head = "<mj-style>.a { color: {{ brand }}; }</mj-style>";
    let column = r#"<mj-raw><div style="color : [[ accent ]] ;  margin : 0px">x</div></mj-raw>"#;

    let output = Compiler::new(minifying(true)).compile(&document(head, column)).unwrap();

    assert!(output.html.contains("{{ brand }}"));
    assert!(output.html.contains("[[ accent ]]"));
    assert!(!output.html.contains("mj_value_temp"));
}

#[test]
fn test_unbalanced_tokens_fail() {
    let column = r#"<mj-raw><div style="{{ a: {{ b }};">x</div></mj-raw>"#;
    let err = Compiler::new(minifying(true)).compile(&document("", column)).unwrap_err();

    assert!(matches!(err, CompileError::Guard(_)));
    assert!(err.to_string().starts_with("Unbalanced template delimiters found in CSS"));
}

#[test]
fn test_mixed_syntax() {
    let column = r#"<mj-raw><div style="{{ block }}; color: {{ c }}">x</div></mj-raw>"#;
    let source = document("", column);

    let err = Compiler::new(minifying(true)).compile(&source).unwrap_err();
    assert!(err.to_string().contains("Mixed variable syntax detected"));

    let options = CompileOptions {
        allow_mixed_syntax: true,
        ..minifying(true)
    };
    let output = Compiler::new(options).compile(&source).unwrap();
    assert!(output.html.contains("{{ block }}"));
    assert!(output.html.contains("{{ c }}"));
}

#[test]
fn test_guard_off_without_sanitize() {
    let column = r#"<mj-raw><div style="{{ a: {{ b }};">x</div></mj-raw>"#;
    assert!(Compiler::new(minifying(false)).compile(&document("", column)).is_ok());
}

#[test]
fn test_beautify_when_not_minifying() {
    let options = CompileOptions {
        beautify: true,
        ..CompileOptions::html()
    };
    let output = Compiler::new(options).compile(&document("", "<mj-text>x</mj-text>")).unwrap();
    assert!(output.html.starts_with("<!doctype html>"));
    assert!(output.html.contains("\n"));
}

// ============================================================================
// NETWORK BACKFILL
// ============================================================================

#[test]
fn test_amp_fonts_fetched_into_custom_css() {
    let fetcher = StubFetcher::new();
    let options = CompileOptions {
        fetch_fonts_for_amp: true,
        ..CompileOptions::amp()
    };
    let output = Compiler::new(options)
        .with_fetcher(fetcher.clone())
        .compile(&document("", "<mj-text>hello</mj-text>"))
        .unwrap();

    assert!(output.html.contains("@font-face"));
    assert!(!output.html.contains("<link href=\"https://fonts.googleapis.com"));
    assert_eq!(output.html.matches("<style amp-custom>").count(), 1);
    assert_eq!(fetcher.calls().len(), 1);
}

#[test]
fn test_amp_fonts_linked_by_default() {
    let fetcher = StubFetcher::new();
    let output = Compiler::new(CompileOptions::amp())
        .with_fetcher(fetcher.clone())
        .compile(&document("", "<mj-text>hello</mj-text>"))
        .unwrap();

    assert!(output.html.contains("https://fonts.googleapis.com/css?family=Ubuntu"));
    assert!(fetcher.calls().is_empty());
}

#[test]
fn test_image_dimensions_backfilled() {
    let fetcher = StubFetcher::new();
    let options = CompileOptions {
        fetch_image_dimensions: true,
        ..CompileOptions::amp()
    };
    let column = r#"<mj-image src="https://img.test/hero.png" />
        <mj-image src="https://img.test/missing.png" />"#;
    let output = Compiler::new(options)
        .with_fetcher(fetcher.clone())
        .compile(&document("", column))
        .unwrap();

    assert!(output.html.contains("width=\"1200\""));
    assert!(output.html.contains("height=\"600\""));
    assert!(output.html.contains("src=\"https://img.test/missing.png\""));
    assert_eq!(fetcher.calls().len(), 2);
}

#[test]
fn test_compile_async() {
    let output = smol::block_on(
        Compiler::new(CompileOptions::amp()).compile_async(&document("", "<mj-text>async</mj-text>")),
    )
    .unwrap();
    assert!(output.html.contains("async"));
}
