//! Fragment tree
//!
//! A closed sum type of element and text nodes with strict ownership: every
//! child is owned by exactly one parent and there are no back-references.

use std::collections::BTreeMap;

/// Tag of the implicit fragment root. Tokenized tag names always start with
/// an ASCII letter, so markup can never produce or close this element.
pub const FRAGMENT_TAG: &str = "#fragment";

/// Elements that never have children or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Decoded attribute values, ordered by name for deterministic output
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Create an empty fragment root
    pub fn fragment() -> Self {
        Self::new(FRAGMENT_TAG)
    }

    pub fn is_fragment(&self) -> bool {
        self.tag == FRAGMENT_TAG
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append text, merging with a trailing text node
    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Text(last)) => last.push_str(text),
            _ => self.children.push(Node::Text(text.to_string())),
        }
    }

    /// Concatenated text of all descendants in document order
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => stack.extend(element.children.iter().rev()),
            }
        }
        out
    }

    /// Nesting depth below this element (0 for an element without element children)
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(&Element, usize)> = vec![(self, 0)];
        while let Some((element, depth)) = stack.pop() {
            max = max.max(depth);
            for child in &element.children {
                if let Node::Element(child) = child {
                    stack.push((child, depth + 1));
                }
            }
        }
        max
    }

    /// Serialize back to HTML. The fragment root contributes only its children.
    pub fn to_html(&self) -> String {
        enum Step<'t> {
            Open(&'t Node),
            Close(&'t str),
        }

        let mut out = String::new();
        let mut stack: Vec<Step<'_>> = Vec::new();
        if self.is_fragment() {
            stack.extend(self.children.iter().rev().map(Step::Open));
        } else {
            write_open_tag(&mut out, self);
            if is_void_element(&self.tag) {
                return out;
            }
            stack.push(Step::Close(&self.tag));
            stack.extend(self.children.iter().rev().map(Step::Open));
        }

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(Node::Text(text)) => escape_into(&mut out, text, false),
                Step::Open(Node::Element(element)) => {
                    write_open_tag(&mut out, element);
                    if !is_void_element(&element.tag) {
                        stack.push(Step::Close(&element.tag));
                        stack.extend(element.children.iter().rev().map(Step::Open));
                    }
                }
                Step::Close(tag) => {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
        }
        out
    }
}

fn write_open_tag(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(out, value, true);
        out.push('"');
    }
    out.push('>');
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_text_merges() {
        let mut root = Element::fragment();
        root.append_text("a");
        root.append_text("b");
        root.append_text("");
        assert_eq!(root.children, vec![Node::Text("ab".to_string())]);
    }

    #[test]
    fn test_text_content_document_order() {
        let root = Element::fragment()
            .with_child(Node::Text("a".into()))
            .with_child(Node::Element(
                Element::new("b").with_child(Node::Text("b".into())),
            ))
            .with_child(Node::Text("c".into()));
        assert_eq!(root.text_content(), "abc");
        assert_eq!(root.depth(), 1);
    }

    #[test]
    fn test_to_html_escapes() {
        let root = Element::fragment()
            .with_child(Node::Element(
                Element::new("a")
                    .with_attr("href", "https://x.test/?a=1&b=\"2\"")
                    .with_child(Node::Text("1 < 2 & 3".into())),
            ))
            .with_child(Node::Element(Element::new("br")));
        assert_eq!(
            root.to_html(),
            "<a href=\"https://x.test/?a=1&amp;b=&quot;2&quot;\">1 &lt; 2 &amp; 3</a><br>"
        );
    }

    #[test]
    fn test_to_html_non_fragment_root() {
        let p = Element::new("p").with_child(Node::Text("x".into()));
        assert_eq!(p.to_html(), "<p>x</p>");
    }
}
