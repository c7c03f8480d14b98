//! Comprehensive tests for mailforge-css
//!
//! Selector matching, rule extraction, head builders and the minification
//! guard working together.

use mailforge_css::{
    build_amp_custom_css, minify_declarations, minify_stylesheet, parse_rules, Classification,
    GuardError, MatchElement, MinificationGuard, SelectorList, Specificity, TemplateSyntax,
};

// ============================================================================
// HELPERS
// ============================================================================

#[derive(Clone)]
struct Flat {
    tags: Vec<(&'static str, Vec<(&'static str, &'static str)>, Option<usize>)>,
    index: usize,
}

impl MatchElement for Flat {
    fn local_name(&self) -> String {
        self.tags[self.index].0.to_string()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.tags[self.index]
            .1
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    }

    fn parent_element(&self) -> Option<Self> {
        self.tags[self.index].2.map(|index| Flat { tags: self.tags.clone(), index })
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let parent = self.tags[self.index].2;
        (0..self.index)
            .rev()
            .find(|i| self.tags[*i].2 == parent)
            .map(|index| Flat { tags: self.tags.clone(), index })
    }
}

fn email_tree() -> Vec<(&'static str, Vec<(&'static str, &'static str)>, Option<usize>)> {
    vec![
        ("table", vec![("class", "wrapper")], None),
        ("td", vec![("class", "cell"), ("align", "left")], Some(0)),
        ("a", vec![("href", "https://example.com"), ("class", "cta big")], Some(1)),
    ]
}

fn guard() -> MinificationGuard {
    MinificationGuard::new(TemplateSyntax::defaults())
}

// ============================================================================
// SELECTORS AND RULES
// ============================================================================

#[test]
fn test_rule_matches_nested_link() {
    let rules = parse_rules(".wrapper td > a.cta { color: #ff0000; } a[href^=\"https\"] { text-decoration: none; }").unwrap();
    let link = Flat { tags: email_tree(), index: 2 };

    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].selectors.match_specificity(&link), Some(Specificity(0, 2, 2)));
    assert_eq!(rules[1].selectors.match_specificity(&link), Some(Specificity(0, 1, 1)));
}

#[test]
fn test_selector_on_cell() {
    let cell = Flat { tags: email_tree(), index: 1 };
    assert!(SelectorList::parse("td[align=left]").unwrap().matches(&cell));
    assert!(!SelectorList::parse("table > a").unwrap().matches(&cell));
}

#[test]
fn test_important_kept_separately() {
    let rules = parse_rules("p { color: red !important; margin: 0; }").unwrap();
    let important: Vec<_> = rules[0].declarations.iter().filter(|d| d.important).collect();
    assert_eq!(important.len(), 1);
    assert_eq!(important[0].property, "color");
}

// ============================================================================
// MINIFICATION
// ============================================================================

#[test]
fn test_minify_keeps_media_queries() {
    let out = minify_stylesheet("@media only screen and (min-width:480px) {\n .a { width: 100%; }\n}");
    assert!(out.contains("@media"));
    assert!(out.contains(".a{width:100%}"));
}

#[test]
fn test_minify_declarations_shorthand() {
    let out = minify_declarations("margin-top: 0px; margin-bottom: 0px; margin-left: 0px; margin-right: 0px;");
    assert_eq!(out, "margin:0");
}

#[test]
fn test_amp_custom_css_is_clean() {
    let css = build_amp_custom_css(
        "320px",
        &["a[href] { color: blue !important; }".to_string()],
        &[],
        &[],
    );
    assert!(css.contains("a { color: blue; }"));
    assert!(!css.contains("@media"));
}

// ============================================================================
// MINIFICATION GUARD
// ============================================================================

#[test]
fn test_guard_round_trip_all_positions() {
    let html = concat!(
        "<html><head><style type=\"text/css\">\n",
        "  .btn {\n    {{ radiusProp }}: 4px;\n    color: {{ brand.color }};\n  }\n",
        "  {{#if dark}}\n  .btn { color: white; }\n  {{/if}}\n",
        "</style></head><body><div style=\"padding: 0px;  color: {{ fg }}\">x</div></body></html>"
    );

    let out = guard()
        .allow_mixed_syntax(true)
        .protect(html, |tokenized| {
            assert!(tokenized.contains("--mj-prop-temp-0"));
            assert!(tokenized.contains("mj_value_temp_0_"));
            assert!(tokenized.contains("__mjo0__#if dark__mjc0__"));
            tokenized.replace("padding: 0px;  ", "padding:0;")
        })
        .unwrap();

    for token in ["{{ radiusProp }}", "{{ brand.color }}", "{{#if dark}}", "{{/if}}", "{{ fg }}"] {
        assert!(out.contains(token), "missing {}", token);
    }
    assert!(out.contains("padding:0;"));
}

#[test]
fn test_guard_scan_reports_positions() {
    let html = r#"<p style="{{ p }}: 1px; margin: [[ m ]]"></p>"#;
    let tokens = guard().scan(html);

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].classification, Classification::Property);
    assert_eq!(tokens[0].text(html), "{{ p }}");
    assert_eq!(tokens[1].classification, Classification::Value);
    assert_eq!(tokens[1].syntax, 1);
}

#[test]
fn test_guard_minify_error_propagates() {
    let result = guard().try_protect("<p style=\"color: red\"></p>", |_| Err::<String, _>("boom"));
    match result {
        Err(GuardError::Minify(message)) => assert_eq!(message, "boom"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_guard_unbalanced_brackets_named() {
    let err = guard()
        .check_balance("<style>.a { color: [[ c ]]; } .b { color: [[ d; }</style>")
        .unwrap_err();
    assert!(err.to_string().contains("[[…]] (2 open, 1 close)"));
}
