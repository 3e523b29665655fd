//! HTML Text content - styled runs from untrusted HTML fragments
//!
//! This library provides the back half of the HTML Text pipeline:
//! - Style resolution from the tag-to-style table
//! - Styled run building with paragraph and line break markers
//! - Linearization to flat text and UTF-16 style spans
//! - A binary run tape and a C ABI for native hosts

pub mod builder;
pub mod ffi;
pub mod linearize;
pub mod options;
pub mod runs;
pub mod style;
pub mod tape;

pub use builder::{build_runs, RunBuilder};
pub use linearize::{Linearized, StyleSpan};
pub use options::{RenderOptions, DEFAULT_MAX_INPUT_BYTES};
pub use runs::{AttributedText, RunKind, StyledRun};
pub use style::{Boundary, StyleDelta, StyleFlags};
pub use tape::{RunRecord, RunTape};

use log::debug;

use htmltext_parser::{parse_fragment_with, sanitize_with_stats};

/// Render an HTML fragment with default options
///
/// `None` and the empty string both produce no runs. Never fails.
pub fn render(html: Option<&str>) -> AttributedText {
    render_with_options(html, &RenderOptions::default())
}

/// Render an HTML fragment
pub fn render_with_options(html: Option<&str>, options: &RenderOptions) -> AttributedText {
    let Some(html) = html.filter(|html| !html.is_empty()) else {
        return AttributedText::empty();
    };
    let html = options.clamp_input(html);

    let tree = parse_fragment_with(html, options.parse_options());
    let sanitized = sanitize_with_stats(tree);
    let text = build_runs(&sanitized.root, options.collapse_whitespace);

    debug!(
        "rendered {} bytes into {} runs ({} elements kept, {} dropped)",
        html.len(),
        text.len(),
        sanitized.stats.kept_elements,
        sanitized.stats.dropped_elements
    );
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_none_and_empty() {
        assert!(render(None).is_empty());
        assert!(render(Some("")).is_empty());
    }

    #[test]
    fn test_render_paragraph() {
        let text = render(Some("<p>Hello &amp; welcome</p>"));
        assert_eq!(
            text.runs(),
            &[
                StyledRun::text("Hello & welcome", StyleFlags::NONE),
                StyledRun::paragraph_break(),
            ]
        );
    }

    #[test]
    fn test_render_drops_script() {
        let text = render(Some("<p>Safe<script>alert(1)</script></p>"));
        assert_eq!(text.text(), "Safe");
    }

    #[test]
    fn test_render_truncates_oversize_input() {
        let options = RenderOptions::default().with_max_input_bytes(8);
        let text = render_with_options(Some("<b>abcdefgh</b>"), &options);
        assert_eq!(text.runs(), &[StyledRun::text("abcde", StyleFlags::BOLD)]);
    }

    #[test]
    fn test_render_depth_option() {
        let options = RenderOptions::default().with_max_depth(2);
        let text = render_with_options(Some("<b><i><u>x</u></i></b>"), &options);
        assert_eq!(
            text.runs(),
            &[StyledRun::text("x", StyleFlags::BOLD | StyleFlags::ITALIC)]
        );
    }
}
