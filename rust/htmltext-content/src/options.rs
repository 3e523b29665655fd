//! Render options

use log::warn;

use htmltext_parser::{ParseOptions, DEFAULT_MAX_DEPTH};

/// Default cap on input size, in bytes
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1 << 20;

/// Resource limits and text handling for one render call.
///
/// The tag and attribute allow-list is fixed policy and deliberately not
/// part of this struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum nesting of open elements; deeper markup is flattened
    pub max_depth: usize,
    /// Longer input is truncated at a character boundary
    pub max_input_bytes: usize,
    /// Collapse runs of ASCII whitespace the way browsers lay out text
    pub collapse_whitespace: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            collapse_whitespace: false,
        }
    }
}

impl RenderOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    pub fn with_collapse_whitespace(mut self, collapse: bool) -> Self {
        self.collapse_whitespace = collapse;
        self
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default().with_max_depth(self.max_depth)
    }

    /// Apply the input size cap
    pub fn clamp_input<'a>(&self, html: &'a str) -> &'a str {
        if html.len() <= self.max_input_bytes {
            return html;
        }
        let mut end = self.max_input_bytes;
        while !html.is_char_boundary(end) {
            end -= 1;
        }
        warn!(
            "input of {} bytes exceeds cap of {}; truncated",
            html.len(),
            self.max_input_bytes
        );
        &html[..end]
    }
}
