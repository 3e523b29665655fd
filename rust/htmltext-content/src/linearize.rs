//! Flat text plus style spans for native attributed strings
//!
//! Host text APIs index attributed strings in UTF-16 code units, so span
//! offsets are counted in those units rather than bytes or chars.

use crate::runs::{AttributedText, RunKind};
use crate::style::StyleFlags;

/// Styled range over `Linearized::text`, in UTF-16 code units
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSpan {
    pub start: usize,
    pub end: usize,
    pub flags: StyleFlags,
    pub href: Option<String>,
}

impl StyleSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Linearized {
    pub text: String,
    /// One span per text run, in order and non-overlapping
    pub spans: Vec<StyleSpan>,
}

impl Linearized {
    /// Length of `text` in UTF-16 code units
    pub fn utf16_len(&self) -> usize {
        self.text.encode_utf16().count()
    }
}

impl AttributedText {
    /// Render breaks as newlines and map every text run to a span
    pub fn linearize(&self) -> Linearized {
        let mut out = Linearized::default();
        let mut offset = 0;
        for run in self {
            match run.kind {
                RunKind::Text => {
                    let len = run.text.encode_utf16().count();
                    out.text.push_str(&run.text);
                    out.spans.push(StyleSpan {
                        start: offset,
                        end: offset + len,
                        flags: run.flags,
                        href: run.href.clone(),
                    });
                    offset += len;
                }
                kind => {
                    let separator = kind.separator();
                    out.text.push_str(separator);
                    offset += separator.len();
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::StyledRun;

    fn text(runs: Vec<StyledRun>) -> AttributedText {
        AttributedText::from_runs(runs)
    }

    #[test]
    fn test_breaks_become_newlines() {
        let linear = text(vec![
            StyledRun::text("Title", StyleFlags::BOLD),
            StyledRun::paragraph_break(),
            StyledRun::text("a", StyleFlags::NONE),
            StyledRun::line_break(),
            StyledRun::text("b", StyleFlags::ITALIC),
        ])
        .linearize();

        assert_eq!(linear.text, "Title\n\na\nb");
        assert_eq!(
            linear.spans,
            vec![
                StyleSpan { start: 0, end: 5, flags: StyleFlags::BOLD, href: None },
                StyleSpan { start: 7, end: 8, flags: StyleFlags::NONE, href: None },
                StyleSpan { start: 9, end: 10, flags: StyleFlags::ITALIC, href: None },
            ]
        );
    }

    #[test]
    fn test_offsets_are_utf16_units() {
        // U+1F600 is two UTF-16 units and four UTF-8 bytes
        let linear = text(vec![
            StyledRun::text("\u{1F600}é", StyleFlags::NONE),
            StyledRun::text("x", StyleFlags::BOLD),
        ])
        .linearize();

        assert_eq!(linear.spans[0].end, 3);
        assert_eq!(linear.spans[1].start, 3);
        assert_eq!(linear.spans[1].len(), 1);
        assert_eq!(linear.utf16_len(), 4);
    }

    #[test]
    fn test_empty() {
        let linear = AttributedText::empty().linearize();
        assert!(linear.text.is_empty());
        assert!(linear.spans.is_empty());
        assert_eq!(linear.utf16_len(), 0);
    }

    #[test]
    fn test_link_span_keeps_href() {
        let linear = text(vec![StyledRun::link("go", StyleFlags::UNDERLINE, "https://a.test")])
            .linearize();
        assert_eq!(linear.spans[0].href.as_deref(), Some("https://a.test"));
    }
}
