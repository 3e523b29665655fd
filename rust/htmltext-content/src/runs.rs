//! Styled runs - the output of the pipeline

use crate::style::StyleFlags;

/// Run kind. Breaks are zero-width markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunKind {
    #[default]
    Text = 0,
    LineBreak = 1,
    ParagraphBreak = 2,
}

impl RunKind {
    pub fn from_u8(value: u8) -> Option<RunKind> {
        match value {
            0 => Some(RunKind::Text),
            1 => Some(RunKind::LineBreak),
            2 => Some(RunKind::ParagraphBreak),
            _ => None,
        }
    }

    /// Text a consumer renders for this marker
    pub fn separator(self) -> &'static str {
        match self {
            RunKind::Text => "",
            RunKind::LineBreak => "\n",
            RunKind::ParagraphBreak => "\n\n",
        }
    }
}

/// Contiguous text sharing one style, or a break marker
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyledRun {
    pub kind: RunKind,
    /// Never empty for `RunKind::Text`, always empty for breaks
    pub text: String,
    pub flags: StyleFlags,
    /// Link target for runs inside an allowed `<a href>`
    pub href: Option<String>,
}

impl StyledRun {
    pub fn text(text: impl Into<String>, flags: StyleFlags) -> Self {
        Self {
            kind: RunKind::Text,
            text: text.into(),
            flags,
            href: None,
        }
    }

    pub fn link(text: impl Into<String>, flags: StyleFlags, href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::text(text, flags)
        }
    }

    pub fn line_break() -> Self {
        Self {
            kind: RunKind::LineBreak,
            ..Self::default()
        }
    }

    pub fn paragraph_break() -> Self {
        Self {
            kind: RunKind::ParagraphBreak,
            ..Self::default()
        }
    }

    pub fn is_break(&self) -> bool {
        self.kind != RunKind::Text
    }

    /// Whether `text` with this style would extend this run
    pub(crate) fn continues_with(&self, flags: StyleFlags, href: Option<&str>) -> bool {
        self.kind == RunKind::Text && self.flags == flags && self.href.as_deref() == href
    }
}

/// Immutable, ordered run sequence for one input
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributedText {
    runs: Vec<StyledRun>,
}

impl AttributedText {
    /// No content
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_runs(runs: Vec<StyledRun>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StyledRun> {
        self.runs.iter()
    }

    /// Concatenated text of all text runs, breaks omitted
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .filter(|run| run.kind == RunKind::Text)
            .map(|run| run.text.as_str())
            .collect()
    }

    /// Text with breaks rendered as newlines
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match run.kind {
                RunKind::Text => out.push_str(&run.text),
                kind => out.push_str(kind.separator()),
            }
        }
        out
    }

    pub fn into_runs(self) -> Vec<StyledRun> {
        self.runs
    }
}

impl<'a> IntoIterator for &'a AttributedText {
    type Item = &'a StyledRun;
    type IntoIter = std::slice::Iter<'a, StyledRun>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}
