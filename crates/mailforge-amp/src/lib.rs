//! mailforge AMP
//!
//! Rewrites an assembled email document into one AMP4EMAIL accepts. The
//! transform is an ordered list of independent text stages; every stage is
//! idempotent and can be run or tested on its own.

mod fonts;
pub mod stages;

pub use fonts::{build_font_links, is_allowlisted_font_url, AMP4EMAIL_FONT_ORIGINS};

/// A named text rewrite
#[derive(Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub rewrite: fn(&str) -> String,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage").field("name", &self.name).finish()
    }
}

/// Stages in the order they run. Image unwrapping must follow image
/// rewriting since it matches `amp-img`.
pub const DEFAULT_STAGES: &[Stage] = &[
    Stage { name: "conditional-comments", rewrite: stages::strip_conditional_comments },
    Stage { name: "links", rewrite: stages::filter_links },
    Stage { name: "images", rewrite: stages::rewrite_images },
    Stage { name: "cell-images", rewrite: stages::unwrap_cell_images },
    Stage { name: "anchors", rewrite: stages::replace_bare_anchors },
    Stage { name: "inline-styles", rewrite: stages::strip_disallowed_styles },
    Stage { name: "strike", rewrite: stages::replace_strike },
    Stage { name: "label-align", rewrite: stages::strip_label_align },
    Stage { name: "custom-css", rewrite: stages::clean_custom_css },
];

/// AMP4EMAIL rewrite pipeline
#[derive(Debug, Clone)]
pub struct AmpTransform {
    stages: Vec<Stage>,
}

impl AmpTransform {
    pub fn new() -> Self {
        Self {
            stages: DEFAULT_STAGES.to_vec(),
        }
    }

    /// Pipeline running only `stages`, in the given order
    pub fn with_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn transform(&self, html: &str) -> String {
        let mut out = html.to_string();
        for stage in &self.stages {
            let before = out.len();
            out = (stage.rewrite)(&out);
            tracing::debug!("AMP stage {}: {} -> {} bytes", stage.name, before, out.len());
        }
        out
    }
}

impl Default for AmpTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = AmpTransform::new().stages().iter().map(|s| s.name).collect();
        let images = names.iter().position(|n| *n == "images").unwrap();
        let cells = names.iter().position(|n| *n == "cell-images").unwrap();
        assert!(images < cells);
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn test_cell_image_needs_rewritten_tag() {
        let html = "<td><div><img src=\"a.png\" width=\"20px\"></div></td>";
        let out = AmpTransform::new().transform(html);
        assert_eq!(
            out,
            "<td><amp-img layout=\"responsive\" src=\"a.png\" width=\"20\" height=\"1\"></amp-img></td>"
        );
    }

    #[test]
    fn test_custom_stage_list() {
        let only_anchors = AmpTransform::with_stages(vec![DEFAULT_STAGES[4]]);
        assert_eq!(
            only_anchors.transform("<a href=\"#\"><img src=\"x\"></a>"),
            "<a href=\"https://example.com/\"><img src=\"x\"></a>"
        );
    }
}
