//! Document skeletons
//!
//! Wraps rendered body markup into a complete HTML email document or an
//! AMP4EMAIL document.

use mailforge_css::{build_media_queries_tags, build_style_tag, MediaQueryOptions};

use crate::GlobalData;

const RESET_CSS: &str = "#outlook a { padding:0; }
      body { margin:0;padding:0;-webkit-text-size-adjust:100%;-ms-text-size-adjust:100%; }
      table, td { border-collapse:collapse;mso-table-lspace:0pt;mso-table-rspace:0pt; }
      img { border:0;height:auto;line-height:100%; outline:none;text-decoration:none;-ms-interpolation-mode:bicubic; }
      p { display:block;margin:13px 0; }";

const OFFICE_SETTINGS: &str = "<!--[if mso]>
    <noscript>
    <xml>
    <o:OfficeDocumentSettings>
      <o:AllowPNG/>
      <o:PixelsPerInch>96</o:PixelsPerInch>
    </o:OfficeDocumentSettings>
    </xml>
    </noscript>
    <![endif]-->
    <!--[if lte mso 11]>
    <style type=\"text/css\">
      .mj-outlook-group-fix { width:100% !important; }
    </style>
    <![endif]-->";

/// Hidden preheader text shown by inbox previews
pub fn preview_block(preview: &str) -> String {
    if preview.is_empty() {
        return String::new();
    }
    format!(
        "<div style=\"display:none;font-size:1px;color:#ffffff;line-height:1px;max-height:0px;max-width:0px;opacity:0;overflow:hidden;\">{}</div>",
        preview
    )
}

fn body_open(global: &GlobalData) -> String {
    match global.background_color() {
        Some(color) => format!("<body style=\"word-spacing:normal;background-color:{};\">", color),
        None => "<body style=\"word-spacing:normal;\">".to_string(),
    }
}

fn before_doctype(global: &GlobalData) -> String {
    let raw = global.before_doctype().join("\n");
    if raw.is_empty() {
        raw
    } else {
        format!("{}\n", raw)
    }
}

/// Responsive HTML email document
pub fn html_document(global: &GlobalData, content: &str, fonts_html: &str) -> String {
    let breakpoint = global.breakpoint();
    let media_queries = build_media_queries_tags(
        breakpoint,
        global.styles().media_queries(),
        MediaQueryOptions {
            force_owa_desktop: global.force_owa_desktop(),
            printer_support: global.printer_support(),
        },
    );
    let component_styles = build_style_tag(&global.styles().head_styles(breakpoint));
    let global_styles = build_style_tag(global.styles().styles());

    format!(
        "{before}<!doctype html>
<html lang=\"{lang}\" dir=\"{dir}\" xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:v=\"urn:schemas-microsoft-com:vml\" xmlns:o=\"urn:schemas-microsoft-com:office:office\">
  <head>
    <title>{title}</title>
    <!--[if !mso]><!-->
    <meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">
    <!--<![endif]-->
    <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
    <style type=\"text/css\">
      {reset}
    </style>
    {office}
    {fonts}
    {media_queries}
    {component_styles}
    {global_styles}
    {head_raw}
  </head>
  {body_open}
    {preview}
    {content}
  </body>
</html>
",
        before = before_doctype(global),
        lang = global.lang(),
        dir = global.dir(),
        title = global.title(),
        reset = RESET_CSS,
        office = OFFICE_SETTINGS,
        fonts = fonts_html,
        media_queries = media_queries,
        component_styles = component_styles,
        global_styles = global_styles,
        head_raw = global.head_raw().join("\n"),
        body_open = body_open(global),
        preview = preview_block(global.preview()),
        content = content,
    )
}

/// AMP4EMAIL document with a single custom style block
pub fn amp_document(global: &GlobalData, content: &str, custom_css: &str, fonts_html: &str) -> String {
    let custom = if custom_css.is_empty() {
        String::new()
    } else {
        format!("<style amp-custom>{}</style>", custom_css)
    };

    format!(
        "{before}<!doctype html>
<html ⚡4email data-css-strict lang=\"{lang}\" dir=\"{dir}\">
  <head>
    <meta charset=\"utf-8\">
    <title>{title}</title>
    <style amp4email-boilerplate>body{{visibility:hidden}}</style>
    <script async src=\"https://cdn.ampproject.org/v0.js\"></script>
    {custom}
    {fonts}
    {head_raw}
  </head>
  {body_open}
    {content}
  </body>
</html>
",
        before = before_doctype(global),
        lang = global.lang(),
        dir = global.dir(),
        title = global.title(),
        custom = custom,
        fonts = fonts_html,
        head_raw = global.head_raw().join("\n"),
        body_open = body_open(global),
        content = content,
    )
}
