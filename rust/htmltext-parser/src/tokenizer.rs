//! HTML fragment tokenizer
//!
//! Produces a lazy, single-pass token stream over borrowed source text.
//! The tokenizer never fails: anything that does not scan as markup is
//! handed on as text, and malformed attributes are dropped one at a time
//! without losing the rest of the tag.

use std::collections::HashSet;

use log::trace;

use crate::entities::scan_entity;

/// Elements whose content is raw text up to the matching end tag
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes", "noscript",
];

/// A single attribute as written in the source
///
/// The name is lower-cased, the value is still entity-encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: String,
    pub value: &'a str,
}

/// Lexical token
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag {
        name: String,
        attributes: Vec<Attribute<'a>>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// Character data, verbatim
    Text { raw: &'a str },
    /// A syntactically valid character reference such as `&amp;`
    Entity { raw: &'a str },
}

/// Outcome of scanning a construct that starts with `<`
enum Markup<'a> {
    Token(Token<'a>),
    /// Comments, doctypes and processing instructions
    Skipped,
    /// Not markup after all, the `<` is text
    Literal,
}

/// Lazy tokenizer over a borrowed source string
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    /// Set right after the start tag of a raw-text element
    raw_text_end: Option<&'static str>,
    /// Markup is only recognized before this offset. Lowered to the start
    /// of the first tag or declaration that runs off the end of the input.
    markup_end: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            raw_text_end: None,
            markup_end: src.len(),
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    /// Emit text from the current position up to the next `<` or `&` at or
    /// after `search_from`.
    fn text_until_markup(&mut self, search_from: usize) -> Token<'a> {
        let end = self.bytes()[search_from..]
            .iter()
            .position(|&b| b == b'<' || b == b'&')
            .map_or(self.src.len(), |i| search_from + i);
        let raw = &self.src[self.pos..end];
        self.pos = end;
        Token::Text { raw }
    }

    /// Content of a raw-text element, up to (not including) its end tag
    fn raw_text(&mut self, element: &'static str) -> Option<Token<'a>> {
        let bytes = self.bytes();
        let mut i = self.pos;
        let end = loop {
            let Some(rel) = self.src[i..].find("</") else {
                break self.src.len();
            };
            let at = i + rel;
            let name_end = at + 2 + element.len();
            let name_matches = bytes
                .get(at + 2..name_end)
                .is_some_and(|name| name.eq_ignore_ascii_case(element.as_bytes()));
            let delimited = matches!(
                bytes.get(name_end),
                None | Some(b'>') | Some(b'/') | Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
            );
            if name_matches && delimited {
                break at;
            }
            i = at + 2;
        };

        if end == self.pos {
            return None;
        }
        let raw = &self.src[self.pos..end];
        self.pos = end;
        Some(Token::Text { raw })
    }

    fn scan_markup(&mut self) -> Markup<'a> {
        let bytes = self.bytes();
        let start = self.pos;
        if start >= self.markup_end {
            return Markup::Literal;
        }
        match bytes.get(start + 1) {
            Some(b) if b.is_ascii_alphabetic() => self.scan_start_tag(),
            Some(b'/') => match bytes.get(start + 2) {
                Some(b) if b.is_ascii_alphabetic() => self.scan_end_tag(),
                Some(b'>') => {
                    trace!("ignoring empty end tag at {}", start);
                    self.pos = start + 3;
                    Markup::Skipped
                }
                _ => Markup::Literal,
            },
            Some(b'!') => {
                if self.src[start..].starts_with("<!--") {
                    // "<!-->" and "<!--->" close immediately, so search from the first dash
                    match self.src[start + 2..].find("-->") {
                        Some(rel) => self.pos = start + 2 + rel + 3,
                        None => self.pos = self.src.len(),
                    }
                    trace!("skipped comment at {}", start);
                    Markup::Skipped
                } else {
                    self.skip_declaration()
                }
            }
            Some(b'?') => self.skip_declaration(),
            _ => Markup::Literal,
        }
    }

    /// The construct at the current position runs off the end of the input.
    /// Nothing from here on can close as markup, so the rest is text.
    fn unterminated(&mut self) -> Markup<'a> {
        trace!("unterminated markup at {}; rest of input is text", self.pos);
        self.markup_end = self.pos;
        Markup::Literal
    }

    /// `<!DOCTYPE ...>`, `<![CDATA[...]]>`, `<?xml ...?>` and friends
    fn skip_declaration(&mut self) -> Markup<'a> {
        match self.src[self.pos..].find('>') {
            Some(rel) => {
                trace!("skipped declaration at {}", self.pos);
                self.pos += rel + 1;
                Markup::Skipped
            }
            None => self.unterminated(),
        }
    }

    fn scan_end_tag(&mut self) -> Markup<'a> {
        let bytes = self.bytes();
        let name_start = self.pos + 2;
        let name_end = scan_tag_name(bytes, name_start);
        let Some(rel) = self.src[name_end..].find('>') else {
            return self.unterminated();
        };
        let name = self.src[name_start..name_end].to_ascii_lowercase();
        self.pos = name_end + rel + 1;
        Markup::Token(Token::EndTag { name })
    }

    fn scan_start_tag(&mut self) -> Markup<'a> {
        let bytes = self.bytes();
        let name_start = self.pos + 1;
        let name_end = scan_tag_name(bytes, name_start);
        let name = self.src[name_start..name_end].to_ascii_lowercase();

        let mut attributes: Vec<Attribute<'a>> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut self_closing = false;
        let mut i = name_end;

        loop {
            i = skip_whitespace(bytes, i);
            match bytes.get(i) {
                None => return self.unterminated(),
                Some(b'>') => {
                    i += 1;
                    break;
                }
                Some(b'/') => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                Some(_) => match scan_attribute(self.src, i) {
                    AttributeScan::Unterminated => return self.unterminated(),
                    AttributeScan::Malformed { end } => {
                        trace!("dropping malformed attribute in <{}> at {}", name, i);
                        i = end;
                    }
                    AttributeScan::Valid { name: attr_name, value, end } => {
                        // First occurrence wins
                        if seen.insert(attr_name.clone()) {
                            attributes.push(Attribute {
                                name: attr_name,
                                value,
                            });
                        }
                        i = end;
                    }
                },
            }
        }

        self.pos = i;
        if let Some(&element) = RAW_TEXT_ELEMENTS.iter().find(|e| **e == name) {
            // A self-closing flag on a raw-text element is ignored
            self_closing = false;
            self.raw_text_end = Some(element);
        }

        Markup::Token(Token::StartTag {
            name,
            attributes,
            self_closing,
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            if let Some(element) = self.raw_text_end.take() {
                if let Some(token) = self.raw_text(element) {
                    return Some(token);
                }
            }

            let bytes = self.bytes();
            let byte = *bytes.get(self.pos)?;

            match byte {
                b'<' => match self.scan_markup() {
                    Markup::Token(token) => return Some(token),
                    Markup::Skipped => continue,
                    Markup::Literal => return Some(self.text_until_markup(self.pos + 1)),
                },
                b'&' => match scan_entity(bytes, self.pos) {
                    Some(end) => {
                        let raw = &self.src[self.pos..end];
                        self.pos = end;
                        return Some(Token::Entity { raw });
                    }
                    None => return Some(self.text_until_markup(self.pos + 1)),
                },
                _ => return Some(self.text_until_markup(self.pos)),
            }
        }
    }
}

enum AttributeScan<'a> {
    Valid {
        name: String,
        value: &'a str,
        end: usize,
    },
    /// Dropped, scanning continues at `end`
    Malformed { end: usize },
    /// A quoted value ran off the end of the input
    Unterminated,
}

fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_html_whitespace(bytes[i]) {
        i += 1;
    }
    i
}

fn scan_tag_name(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && !is_html_whitespace(bytes[i]) && bytes[i] != b'/' && bytes[i] != b'>' {
        i += 1;
    }
    i
}

fn is_valid_attribute_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b':' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
}

fn scan_attribute(src: &str, start: usize) -> AttributeScan<'_> {
    let bytes = src.as_bytes();
    let mut i = start;
    while i < bytes.len() && !is_html_whitespace(bytes[i]) && !matches!(bytes[i], b'/' | b'>' | b'=') {
        i += 1;
    }
    let raw_name = &src[start..i];
    let mut malformed = !is_valid_attribute_name(raw_name);

    i = skip_whitespace(bytes, i);
    if bytes.get(i) != Some(&b'=') {
        // Bare attribute: `<input disabled>`. Never advance zero bytes.
        let end = if i == start { start + 1 } else { i };
        return if malformed {
            AttributeScan::Malformed { end }
        } else {
            AttributeScan::Valid {
                name: raw_name.to_ascii_lowercase(),
                value: "",
                end,
            }
        };
    }

    i = skip_whitespace(bytes, i + 1);
    let (value, end) = match bytes.get(i) {
        None => return AttributeScan::Unterminated,
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            let Some(rel) = bytes[i + 1..].iter().position(|&b| b == quote) else {
                return AttributeScan::Unterminated;
            };
            let close = i + 1 + rel;
            (&src[i + 1..close], close + 1)
        }
        // `name=>` has no value at all
        Some(b'>') => return AttributeScan::Malformed { end: i },
        Some(_) => {
            let value_start = i;
            while i < bytes.len() && !is_html_whitespace(bytes[i]) && bytes[i] != b'>' {
                i += 1;
            }
            let value = &src[value_start..i];
            if value.bytes().any(|b| matches!(b, b'"' | b'\'' | b'<' | b'=' | b'`')) {
                malformed = true;
            }
            (value, i)
        }
    };

    if malformed {
        AttributeScan::Malformed { end }
    } else {
        AttributeScan::Valid {
            name: raw_name.to_ascii_lowercase(),
            value,
            end,
        }
    }
}

/// Tokenize a whole string eagerly
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    Tokenizer::new(src).collect()
}
