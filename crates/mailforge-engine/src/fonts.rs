//! Font usage detection

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

fn pattern(template: &str, name: &str) -> Option<Regex> {
    let source = template.replace("{name}", &regex::escape(name));
    RegexBuilder::new(&source).case_insensitive(true).build().ok()
}

/// URLs of the fonts a `font-family` declaration in the body or the inline
/// CSS refers to, without duplicates
pub fn used_font_urls(content: &str, inline_styles: &[String], fonts: &BTreeMap<String, String>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for (name, url) in fonts {
        let in_attribute = pattern(r#""[^"]*font-family:[^"]*{name}[^"]*""#, name).is_some_and(|re| re.is_match(content));
        let in_inline = || {
            pattern(r"font-family:[^;}]*{name}", name)
                .is_some_and(|re| inline_styles.iter().any(|css| re.is_match(css)))
        };

        if (in_attribute || in_inline()) && !urls.contains(url) {
            urls.push(url.clone());
        }
    }

    urls
}

/// `<link>` and `@import` block hidden from Outlook
pub fn html_font_tags(urls: &[String]) -> String {
    if urls.is_empty() {
        return String::new();
    }

    let links: Vec<String> = urls
        .iter()
        .map(|url| format!("<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\">", url))
        .collect();
    let imports: Vec<String> = urls.iter().map(|url| format!("@import url({});", url)).collect();

    format!(
        "<!--[if !mso]><!-->\n{}\n<style type=\"text/css\">\n{}\n</style>\n<!--<![endif]-->",
        links.join("\n"),
        imports.join("\n")
    )
}
