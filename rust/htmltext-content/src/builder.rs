//! Styled run builder
//!
//! `RunBuilder` accumulates runs and owns the break rules. `build_runs`
//! flattens a sanitized fragment into it with an explicit work stack, so
//! input depth never turns into native call depth.

use std::borrow::Cow;

use htmltext_parser::{Element, Node};

use crate::runs::{AttributedText, RunKind, StyledRun};
use crate::style::{resolve, Boundary, StyleFlags};

/// Builder for an `AttributedText`
///
/// Break rules:
/// - block boundaries emit nothing before the first run
/// - a line boundary right after any break is dropped
/// - a paragraph boundary right after a boundary line break upgrades it
/// - explicit line breaks (`<br>`) are always kept
#[derive(Debug, Default)]
pub struct RunBuilder {
    runs: Vec<StyledRun>,
    collapse_whitespace: bool,
    /// The last run is a break produced by a block boundary
    soft_break: bool,
}

impl RunBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collapse_whitespace(mut self, collapse: bool) -> Self {
        self.collapse_whitespace = collapse;
        self
    }

    /// Append text, extending the last run when the style matches
    pub fn push_text(&mut self, text: &str, flags: StyleFlags, href: Option<&str>) -> &mut Self {
        let text = if self.collapse_whitespace {
            collapse_whitespace(text, self.at_space())
        } else {
            Cow::Borrowed(text)
        };
        if text.is_empty() {
            return self;
        }

        match self.runs.last_mut() {
            Some(last) if last.continues_with(flags, href) => last.text.push_str(&text),
            _ => self.runs.push(StyledRun {
                kind: RunKind::Text,
                text: text.into_owned(),
                flags,
                href: href.map(str::to_string),
            }),
        }
        self.soft_break = false;
        self
    }

    /// Explicit line break
    pub fn line_break(&mut self) -> &mut Self {
        self.trim_trailing_space();
        self.runs.push(StyledRun::line_break());
        self.soft_break = false;
        self
    }

    /// Block boundary before or after an element's content
    pub fn boundary(&mut self, boundary: Boundary) -> &mut Self {
        if boundary == Boundary::None {
            return self;
        }
        self.trim_trailing_space();

        let Some(last_kind) = self.runs.last().map(|run| run.kind) else {
            return self;
        };
        match (boundary, last_kind) {
            (Boundary::Line, RunKind::Text) => {
                self.runs.push(StyledRun::line_break());
                self.soft_break = true;
            }
            (Boundary::Paragraph, RunKind::Text) => {
                self.runs.push(StyledRun::paragraph_break());
                self.soft_break = true;
            }
            (Boundary::Paragraph, RunKind::LineBreak) if self.soft_break => {
                if let Some(last) = self.runs.last_mut() {
                    last.kind = RunKind::ParagraphBreak;
                }
            }
            (Boundary::Paragraph, RunKind::LineBreak) => {
                self.runs.push(StyledRun::paragraph_break());
                self.soft_break = true;
            }
            _ => {}
        }
        self
    }

    pub fn build(mut self) -> AttributedText {
        self.trim_trailing_space();
        AttributedText::from_runs(self.runs)
    }

    /// Whether collapsed whitespace at this point would be redundant
    fn at_space(&self) -> bool {
        match self.runs.last() {
            None => true,
            Some(run) if run.is_break() => true,
            Some(run) => run.text.ends_with(' '),
        }
    }

    fn trim_trailing_space(&mut self) {
        if !self.collapse_whitespace {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.kind == RunKind::Text && last.text.ends_with(' ') {
                last.text.pop();
                if last.text.is_empty() {
                    self.runs.pop();
                }
            }
        }
    }
}

fn collapse_whitespace(text: &str, mut at_space: bool) -> Cow<'_, str> {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            if !at_space {
                out.push(' ');
                at_space = true;
            }
        } else {
            out.push(ch);
            at_space = false;
        }
    }
    Cow::Owned(out)
}

/// Flatten a sanitized tree into styled runs
pub fn build_runs(root: &Element, collapse_whitespace: bool) -> AttributedText {
    #[derive(Clone, Copy)]
    struct Context<'t> {
        flags: StyleFlags,
        href: Option<&'t str>,
    }

    enum Step<'t> {
        Element(&'t Element, Context<'t>),
        Text(&'t str, Context<'t>),
        Exit(Boundary),
    }

    fn enter<'t>(node: &'t Node, context: Context<'t>) -> Step<'t> {
        match node {
            Node::Element(element) => Step::Element(element, context),
            Node::Text(text) => Step::Text(text, context),
        }
    }

    let mut builder = RunBuilder::new().with_collapse_whitespace(collapse_whitespace);
    let mut stack = vec![Step::Element(
        root,
        Context {
            flags: StyleFlags::NONE,
            href: None,
        },
    )];

    while let Some(step) = stack.pop() {
        match step {
            Step::Text(text, context) => {
                builder.push_text(text, context.flags, context.href);
            }
            Step::Element(element, context) => {
                let (delta, href) = resolve(element);
                if delta.line_break {
                    builder.line_break();
                    continue;
                }
                builder.boundary(delta.boundary);
                let inner = Context {
                    flags: context.flags | delta.flags,
                    href: href.or(context.href),
                };
                stack.push(Step::Exit(delta.boundary));
                stack.extend(element.children.iter().rev().map(|child| enter(child, inner)));
            }
            Step::Exit(boundary) => {
                builder.boundary(boundary);
            }
        }
    }

    builder.build()
}
