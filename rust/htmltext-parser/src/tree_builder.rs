//! Tolerant fragment parser
//!
//! Builds a `#fragment` rooted tree from the token stream using an explicit
//! stack of open elements. Recovery rules:
//!
//! - An end tag closes the nearest open element with the same name, closing
//!   everything opened after it. With no match it is ignored.
//! - Start tags past the depth cap are suppressed; their text is flattened
//!   into the deepest open element. Suppressed tags form a virtual stack above
//!   the real one so their own end tags cannot close real elements.
//! - An element whose content the sanitizer drops may still open one level
//!   past the cap, so its content never flattens into visible text.
//! - Whatever is still open at end of input is closed.

use log::{debug, trace, warn};

use crate::dom::{is_void_element, Element, Node};
use crate::entities::{decode_text, push_decoded};
use crate::policy::drops_content;
use crate::tokenizer::{Attribute, Token, Tokenizer};

/// Default nesting cap for open elements below the fragment root
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Parser options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Fragment parser. One instance parses one input.
pub struct FragmentParser {
    options: ParseOptions,
    /// Open elements; index 0 is the fragment root
    stack: Vec<Element>,
    /// Names of start tags dropped at the depth cap, innermost last
    suppressed: Vec<String>,
    /// Length of `suppressed` when the element above the cap was opened
    above_cap_mark: usize,
    suppressed_total: usize,
}

impl Default for FragmentParser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl FragmentParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            stack: vec![Element::fragment()],
            suppressed: Vec::new(),
            above_cap_mark: 0,
            suppressed_total: 0,
        }
    }

    /// Parse `html` into a fragment tree. Never fails.
    pub fn parse(mut self, html: &str) -> Element {
        for token in Tokenizer::new(html) {
            self.process(token);
        }
        self.finish()
    }

    /// Feed one token
    pub fn process(&mut self, token: Token<'_>) {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.start_tag(name, attributes, self_closing),
            Token::EndTag { name } => self.end_tag(&name),
            Token::Text { raw } => self.current().append_text(raw),
            Token::Entity { raw } => {
                let mut decoded = String::new();
                push_decoded(&mut decoded, raw);
                self.current().append_text(&decoded);
            }
        }
    }

    /// Close everything still open and return the fragment root
    pub fn finish(mut self) -> Element {
        while self.stack.len() > 1 {
            self.close_top();
        }
        if self.suppressed_total > 0 {
            warn!(
                "nesting cap of {} reached; flattened {} start tags",
                self.options.max_depth, self.suppressed_total
            );
        }
        let root = self.stack.pop().unwrap_or_else(Element::fragment);
        debug!(
            "parsed fragment: {} top-level nodes, depth {}",
            root.children.len(),
            root.depth()
        );
        root
    }

    /// Number of open elements below the fragment root
    fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn current(&mut self) -> &mut Element {
        // The root is only popped by `finish`, which consumes the parser
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    fn close_top(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(element) = self.stack.pop() {
            self.current().children.push(Node::Element(element));
        }
    }

    fn start_tag(&mut self, name: String, attributes: Vec<Attribute<'_>>, self_closing: bool) {
        let mut element = Element::new(name);
        for attribute in attributes {
            let value = decode_text(attribute.value).into_owned();
            element.attributes.entry(attribute.name).or_insert(value);
        }

        if self_closing || is_void_element(&element.tag) {
            self.current().children.push(Node::Element(element));
            return;
        }

        let depth = self.depth();
        if depth >= self.options.max_depth {
            // Everything below a content-dropping element is discarded by the
            // sanitizer, so whatever flattens into it stays invisible
            if depth == self.options.max_depth && drops_content(&element.tag) {
                trace!("opening <{}> above the depth cap", element.tag);
                self.above_cap_mark = self.suppressed.len();
                self.stack.push(element);
                return;
            }
            trace!("suppressing <{}> at depth {}", element.tag, depth);
            self.suppressed.push(element.tag);
            self.suppressed_total += 1;
            return;
        }

        self.stack.push(element);
    }

    fn end_tag(&mut self, name: &str) {
        // `</br>` behaves like `<br>`
        if name == "br" {
            self.current().children.push(Node::Element(Element::new("br")));
            return;
        }

        if let Some(index) = self.suppressed.iter().rposition(|open| open == name) {
            self.suppressed.truncate(index);
            return;
        }

        match self.stack.iter().rposition(|open| open.tag == name) {
            Some(index) if index > 0 => {
                // Tags suppressed before the element above the cap opened
                // belong to its parent and stay open
                let keep = if index > self.options.max_depth {
                    self.above_cap_mark
                } else {
                    0
                };
                self.suppressed.truncate(keep);
                while self.stack.len() > index {
                    self.close_top();
                }
            }
            _ => trace!("ignoring stray </{}>", name),
        }
    }
}

/// Parse an HTML fragment with default options
pub fn parse_fragment(html: &str) -> Element {
    FragmentParser::default().parse(html)
}

/// Parse an HTML fragment with explicit options
pub fn parse_fragment_with(html: &str, options: ParseOptions) -> Element {
    FragmentParser::new(options).parse(html)
}
