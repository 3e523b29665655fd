//! HTML Text Parser - tokenizer, fragment parser and sanitizer
//!
//! This crate provides the front half of the HTML Text pipeline:
//! - A lazy, never-failing HTML tokenizer
//! - A tolerant fragment parser with a depth cap
//! - An allow-list sanitizer driven by a static policy table
//!
//! Every stage recovers from malformed input instead of reporting errors.

pub mod dom;
pub mod entities;
pub mod policy;
pub mod sanitizer;
pub mod tokenizer;
pub mod tree_builder;

pub use dom::{Element, Node, FRAGMENT_TAG};
pub use sanitizer::{sanitize, sanitize_with_stats, SanitizeStats, Sanitized};
pub use tokenizer::{Attribute, Token, Tokenizer};
pub use tree_builder::{
    parse_fragment, parse_fragment_with, FragmentParser, ParseOptions, DEFAULT_MAX_DEPTH,
};

/// Parse and sanitize, returning the cleaned fragment serialized as HTML
pub fn sanitize_html(html: &str) -> String {
    sanitize(parse_fragment(html)).to_html()
}
