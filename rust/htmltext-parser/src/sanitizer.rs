//! Allow-list sanitizer
//!
//! Rebuilds the fragment tree keeping only structure the policy permits.
//! Disallowed elements are unwrapped (children promoted) or, for
//! content-dropping tags, removed with their whole subtree. The walk is
//! iterative and touches every node once.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::dom::{Element, Node};
use crate::policy::{allow_list, drops_content, is_executable_attribute};

/// Counters collected during one sanitize pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub kept_elements: usize,
    pub unwrapped_elements: usize,
    pub dropped_elements: usize,
    pub removed_attributes: usize,
    pub text_nodes: usize,
}

/// Sanitized tree plus what happened to it
#[derive(Clone, Debug)]
pub struct Sanitized {
    pub root: Element,
    pub stats: SanitizeStats,
}

/// One element being rebuilt. `output` is `None` for unwrapped elements,
/// whose children flow into the nearest kept ancestor.
struct Frame {
    output: Option<Element>,
    pending: std::vec::IntoIter<Node>,
}

/// Sanitize a parsed fragment
pub fn sanitize(root: Element) -> Element {
    sanitize_with_stats(root).root
}

/// Sanitize a parsed fragment and report what was removed
pub fn sanitize_with_stats(root: Element) -> Sanitized {
    let mut stats = SanitizeStats::default();
    let Element { tag, children, .. } = root;

    let mut stack = vec![Frame {
        output: Some(Element::new(tag)),
        pending: children.into_iter(),
    }];

    let root = loop {
        let Some(frame) = stack.last_mut() else {
            break Element::fragment();
        };

        match frame.pending.next() {
            Some(Node::Text(text)) => {
                stats.text_nodes += 1;
                if let Some(sink) = sink(&mut stack) {
                    sink.append_text(&text);
                }
            }
            Some(Node::Element(element)) => {
                if let Some(next) = sanitize_element(element, &mut stats) {
                    stack.push(next);
                }
            }
            None => {
                let Some(done) = stack.pop() else {
                    break Element::fragment();
                };
                let Some(element) = done.output else {
                    continue;
                };
                match sink(&mut stack) {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => break element,
                }
            }
        }
    };

    debug!(
        "sanitized fragment: kept {}, unwrapped {}, dropped {}, removed {} attributes, {} text nodes",
        stats.kept_elements,
        stats.unwrapped_elements,
        stats.dropped_elements,
        stats.removed_attributes,
        stats.text_nodes
    );
    Sanitized { root, stats }
}

/// Decide what happens to one element. Returns the frame that will process
/// its children, or `None` when the subtree is gone.
fn sanitize_element(element: Element, stats: &mut SanitizeStats) -> Option<Frame> {
    let Element {
        tag,
        attributes,
        children,
    } = element;

    if drops_content(&tag) {
        trace!("dropping <{}> with {} children", tag, children.len());
        stats.dropped_elements += 1;
        return None;
    }

    if !allow_list().is_tag_allowed(&tag) {
        trace!("unwrapping <{}>", tag);
        stats.unwrapped_elements += 1;
        return Some(Frame {
            output: None,
            pending: children.into_iter(),
        });
    }

    stats.kept_elements += 1;
    let attributes = filter_attributes(&tag, attributes, stats);
    Some(Frame {
        output: Some(Element {
            tag,
            attributes,
            children: Vec::new(),
        }),
        pending: children.into_iter(),
    })
}

fn filter_attributes(
    tag: &str,
    attributes: BTreeMap<String, String>,
    stats: &mut SanitizeStats,
) -> BTreeMap<String, String> {
    let list = allow_list();
    let mut kept = BTreeMap::new();
    for (name, value) in attributes {
        if !list.is_attribute_allowed(tag, &name) || is_executable_attribute(&name, &value) {
            trace!("removing {}=\"{}\" from <{}>", name, value, tag);
            stats.removed_attributes += 1;
            continue;
        }
        kept.insert(name, value);
    }
    kept
}

/// Nearest element that is actually being kept
fn sink(stack: &mut [Frame]) -> Option<&mut Element> {
    stack.iter_mut().rev().find_map(|frame| frame.output.as_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree_builder::parse_fragment;

    fn clean(html: &str) -> String {
        sanitize(parse_fragment(html)).to_html()
    }

    #[test]
    fn test_allowed_markup_kept() {
        assert_eq!(clean("<p>Hi <b>there</b></p>"), "<p>Hi <b>there</b></p>");
    }

    #[test]
    fn test_script_dropped_with_content() {
        assert_eq!(clean("<p>Safe<script>alert(1)</script></p>"), "<p>Safe</p>");
        assert_eq!(clean("<style>p { color: red }</style>x"), "x");
    }

    #[test]
    fn test_unknown_tag_unwrapped() {
        assert_eq!(clean("<span>Hello</span>"), "Hello");
        assert_eq!(clean("<b>a<span>b<i>c</i></span>d</b>"), "<b>ab<i>c</i>d</b>");
    }

    #[test]
    fn test_unwrapped_text_merged() {
        let root = sanitize(parse_fragment("a<span>b</span>c"));
        assert_eq!(root.children, vec![Node::Text("abc".to_string())]);
    }

    #[test]
    fn test_disallowed_attributes_removed() {
        assert_eq!(
            clean(r#"<p dir="rtl" class="x" onclick="evil()">t</p>"#),
            r#"<p dir="rtl">t</p>"#
        );
        assert_eq!(clean(r#"<b title="x">t</b>"#), "<b>t</b>");
    }

    #[test]
    fn test_javascript_href_removed() {
        assert_eq!(
            clean(r#"<a href="javascript:alert(1)" title="t">x</a>"#),
            r#"<a title="t">x</a>"#
        );
        assert_eq!(clean(r#"<a href="jav&#x09;ascript:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(
            clean(r#"<a href="https://example.com">x</a>"#),
            r#"<a href="https://example.com">x</a>"#
        );
    }

    #[test]
    fn test_stats() {
        let result = sanitize_with_stats(parse_fragment(
            r#"<p onclick="x">a<span>b</span><script>c</script></p>"#,
        ));
        assert_eq!(
            result.stats,
            SanitizeStats {
                kept_elements: 1,
                unwrapped_elements: 1,
                dropped_elements: 1,
                removed_attributes: 1,
                text_nodes: 2,
            }
        );
    }

    #[test]
    fn test_nested_disallowed_inside_disallowed() {
        assert_eq!(clean("<section><article><em>x</em></article></section>"), "<em>x</em>");
        assert_eq!(clean("<section><script>x</script>y</section>"), "y");
    }

    #[test]
    fn test_deep_tree_is_total() {
        let html = format!("{}x{}", "<span><b>".repeat(40), "</b></span>".repeat(40));
        let root = sanitize(parse_fragment(&html));
        assert_eq!(root.text_content(), "x");
        assert_eq!(root.depth(), 40);
    }

    #[test]
    fn test_fragment_root_preserved() {
        assert!(sanitize(parse_fragment("")).is_fragment());
        assert!(sanitize(parse_fragment("<span>x</span>")).is_fragment());
    }
}
