//! Sanitization policy
//!
//! Everything the sanitizer trusts lives in this file as static data. Tags
//! and attributes are rejected unless they appear here.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Permitted tags and the attributes each one may keep
const ALLOWED: &[(&str, &[&str])] = &[
    ("a", &["href", "title"]),
    ("b", &[]),
    ("strong", &[]),
    ("i", &[]),
    ("em", &[]),
    ("u", &[]),
    ("ins", &[]),
    ("s", &[]),
    ("strike", &[]),
    ("del", &[]),
    ("p", &["dir"]),
    ("div", &["dir"]),
    ("blockquote", &["dir"]),
    ("h1", &["dir"]),
    ("h2", &["dir"]),
    ("h3", &["dir"]),
    ("h4", &["dir"]),
    ("h5", &["dir"]),
    ("h6", &["dir"]),
    ("ul", &[]),
    ("ol", &[]),
    ("li", &[]),
    ("br", &[]),
];

/// Disallowed tags whose whole subtree is removed instead of unwrapped
pub const DROP_CONTENT_TAGS: &[&str] = &[
    "script", "style", "template", "iframe", "object", "embed", "noscript", "noembed", "noframes",
    "xmp", "textarea", "title", "head", "select", "svg", "math", "frameset", "frame", "applet",
];

/// Attributes whose value is dereferenced as a URL
pub const URL_ATTRIBUTES: &[&str] = &[
    "href", "src", "action", "formaction", "xlink:href", "background", "poster", "cite", "data",
    "longdesc", "srcset", "ping",
];

/// Schemes a URL attribute may use; scheme-less (relative) URLs are also kept
pub const SAFE_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Immutable tag/attribute allow-list
#[derive(Debug)]
pub struct AllowList {
    tags: HashMap<&'static str, &'static [&'static str]>,
}

static ALLOW_LIST: LazyLock<AllowList> = LazyLock::new(|| AllowList::from_table(ALLOWED));

/// The process-wide allow-list
pub fn allow_list() -> &'static AllowList {
    &ALLOW_LIST
}

impl AllowList {
    fn from_table(table: &'static [(&'static str, &'static [&'static str])]) -> Self {
        Self {
            tags: table.iter().copied().collect(),
        }
    }

    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn is_attribute_allowed(&self, tag: &str, attribute: &str) -> bool {
        self.tags
            .get(tag)
            .is_some_and(|attributes| attributes.contains(&attribute))
    }
}

/// Whether a disallowed element takes its content with it
pub fn drops_content(tag: &str) -> bool {
    DROP_CONTENT_TAGS.contains(&tag)
}

/// Attributes that can carry executable content no matter which tag they are on
pub fn is_executable_attribute(name: &str, value: &str) -> bool {
    if name.starts_with("on") || name == "style" {
        return true;
    }
    URL_ATTRIBUTES.contains(&name) && !is_safe_url(value)
}

/// Check a URL against the scheme allow-list.
///
/// Whitespace and control characters are removed before looking at the
/// scheme, since hosts tend to ignore them (`java\tscript:`).
pub fn is_safe_url(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let Some(colon) = normalized.find(':') else {
        return true;
    };
    // A '/', '?' or '#' before the first ':' means a relative reference
    if normalized[..colon].contains(|c: char| matches!(c, '/' | '?' | '#')) {
        return true;
    }
    SAFE_URL_SCHEMES.contains(&&normalized[..colon])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_lookup() {
        let list = allow_list();
        assert!(list.is_tag_allowed("strong"));
        assert!(!list.is_tag_allowed("span"));
        assert!(!list.is_tag_allowed("script"));
        assert!(list.is_attribute_allowed("a", "href"));
        assert!(!list.is_attribute_allowed("a", "onclick"));
        assert!(!list.is_attribute_allowed("b", "title"));
        assert!(!list.is_attribute_allowed("span", "title"));
    }

    #[test]
    fn test_executable_attributes() {
        assert!(is_executable_attribute("onclick", "x()"));
        assert!(is_executable_attribute("onmouseover", ""));
        assert!(is_executable_attribute("style", "color:red"));
        assert!(is_executable_attribute("href", "javascript:alert(1)"));
        assert!(!is_executable_attribute("href", "https://example.com"));
        assert!(!is_executable_attribute("title", "javascript:alert(1)"));
    }

    #[test]
    fn test_url_schemes() {
        assert!(is_safe_url("https://example.com"));
        assert!(is_safe_url("HTTP://EXAMPLE.COM"));
        assert!(is_safe_url("mailto:a@b.c"));
        assert!(is_safe_url("/relative/path"));
        assert!(is_safe_url("page.html#frag:x"));
        assert!(is_safe_url("?q=a:b"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url(" JaVaScRiPt:alert(1)"));
        assert!(!is_safe_url("java\tscript:alert(1)"));
        assert!(!is_safe_url("java\u{0}script:alert(1)"));
        assert!(!is_safe_url("vbscript:msgbox"));
        assert!(!is_safe_url("data:text/html,<script>"));
    }

    #[test]
    fn test_drops_content() {
        assert!(drops_content("script"));
        assert!(drops_content("style"));
        assert!(!drops_content("span"));
    }
}
