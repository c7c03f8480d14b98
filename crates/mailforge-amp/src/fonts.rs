//! Font origins accepted in AMP email

use url::Url;

/// Origins AMP email accepts `<link rel="stylesheet">` from
pub const AMP4EMAIL_FONT_ORIGINS: &[&str] = &[
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
    "https://use.typekit.net",
    "https://cloud.typography.com",
    "https://fast.fonts.net",
    "https://maxcdn.bootstrapcdn.com",
    "https://use.fontawesome.com",
];

/// True when the URL's origin is on the allow-list
pub fn is_allowlisted_font_url(href: &str) -> bool {
    let Ok(url) = Url::parse(href.trim()) else {
        return false;
    };
    let origin = url.origin().ascii_serialization();
    AMP4EMAIL_FONT_ORIGINS.contains(&origin.as_str())
}

/// `<link>` tags for the allow-listed subset of `urls`
pub fn build_font_links(urls: &[String]) -> String {
    urls.iter()
        .filter(|url| is_allowlisted_font_url(url))
        .map(|url| format!("<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\">", url))
        .collect::<Vec<_>>()
        .join("\n")
}
