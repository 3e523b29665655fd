//! Style flags and the tag-to-style table
//!
//! Flags only ever accumulate (union) while descending the tree. Block
//! boundaries and line breaks are not flags; the run builder turns them
//! into zero-width break runs.

use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};
use std::sync::LazyLock;

use htmltext_parser::Element;

/// Inline text style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl StyleFlags {
    pub const NONE: StyleFlags = StyleFlags {
        bold: false,
        italic: false,
        underline: false,
        strikethrough: false,
    };
    pub const BOLD: StyleFlags = StyleFlags {
        bold: true,
        ..Self::NONE
    };
    pub const ITALIC: StyleFlags = StyleFlags {
        italic: true,
        ..Self::NONE
    };
    pub const UNDERLINE: StyleFlags = StyleFlags {
        underline: true,
        ..Self::NONE
    };
    pub const STRIKETHROUGH: StyleFlags = StyleFlags {
        strikethrough: true,
        ..Self::NONE
    };

    // Bit layout shared with native hosts
    pub const BIT_BOLD: u8 = 1 << 0;
    pub const BIT_ITALIC: u8 = 1 << 1;
    pub const BIT_UNDERLINE: u8 = 1 << 2;
    pub const BIT_STRIKETHROUGH: u8 = 1 << 3;

    pub const fn union(self, other: StyleFlags) -> StyleFlags {
        StyleFlags {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
            strikethrough: self.strikethrough || other.strikethrough,
        }
    }

    pub fn is_plain(self) -> bool {
        self == Self::NONE
    }

    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.bold {
            bits |= Self::BIT_BOLD;
        }
        if self.italic {
            bits |= Self::BIT_ITALIC;
        }
        if self.underline {
            bits |= Self::BIT_UNDERLINE;
        }
        if self.strikethrough {
            bits |= Self::BIT_STRIKETHROUGH;
        }
        bits
    }

    /// Unknown bits are ignored
    pub fn from_bits(bits: u8) -> StyleFlags {
        StyleFlags {
            bold: bits & Self::BIT_BOLD != 0,
            italic: bits & Self::BIT_ITALIC != 0,
            underline: bits & Self::BIT_UNDERLINE != 0,
            strikethrough: bits & Self::BIT_STRIKETHROUGH != 0,
        }
    }
}

impl BitOr for StyleFlags {
    type Output = StyleFlags;

    fn bitor(self, rhs: StyleFlags) -> StyleFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for StyleFlags {
    fn bitor_assign(&mut self, rhs: StyleFlags) {
        *self = self.union(rhs);
    }
}

/// Break an element puts around its content
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Boundary {
    #[default]
    None,
    Line,
    Paragraph,
}

/// What entering an element does to the active style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StyleDelta {
    pub flags: StyleFlags,
    pub boundary: Boundary,
    /// The element is itself a hard line break (`<br>`)
    pub line_break: bool,
    /// Runs inside carry the element's `href`
    pub link: bool,
}

impl StyleDelta {
    pub const IDENTITY: StyleDelta = StyleDelta {
        flags: StyleFlags::NONE,
        boundary: Boundary::None,
        line_break: false,
        link: false,
    };

    const fn inline(flags: StyleFlags) -> StyleDelta {
        StyleDelta {
            flags,
            ..Self::IDENTITY
        }
    }

    const fn block(flags: StyleFlags, boundary: Boundary) -> StyleDelta {
        StyleDelta {
            flags,
            boundary,
            ..Self::IDENTITY
        }
    }
}

const STYLE_TABLE: &[(&str, StyleDelta)] = &[
    ("b", StyleDelta::inline(StyleFlags::BOLD)),
    ("strong", StyleDelta::inline(StyleFlags::BOLD)),
    ("i", StyleDelta::inline(StyleFlags::ITALIC)),
    ("em", StyleDelta::inline(StyleFlags::ITALIC)),
    ("u", StyleDelta::inline(StyleFlags::UNDERLINE)),
    ("ins", StyleDelta::inline(StyleFlags::UNDERLINE)),
    ("s", StyleDelta::inline(StyleFlags::STRIKETHROUGH)),
    ("strike", StyleDelta::inline(StyleFlags::STRIKETHROUGH)),
    ("del", StyleDelta::inline(StyleFlags::STRIKETHROUGH)),
    ("p", StyleDelta::block(StyleFlags::NONE, Boundary::Paragraph)),
    ("h1", StyleDelta::block(StyleFlags::BOLD, Boundary::Paragraph)),
    ("h2", StyleDelta::block(StyleFlags::BOLD, Boundary::Paragraph)),
    ("h3", StyleDelta::block(StyleFlags::BOLD, Boundary::Paragraph)),
    ("h4", StyleDelta::block(StyleFlags::BOLD, Boundary::Paragraph)),
    ("h5", StyleDelta::block(StyleFlags::BOLD, Boundary::Paragraph)),
    ("h6", StyleDelta::block(StyleFlags::BOLD, Boundary::Paragraph)),
    ("div", StyleDelta::block(StyleFlags::NONE, Boundary::Line)),
    ("blockquote", StyleDelta::block(StyleFlags::NONE, Boundary::Line)),
    ("ul", StyleDelta::block(StyleFlags::NONE, Boundary::Line)),
    ("ol", StyleDelta::block(StyleFlags::NONE, Boundary::Line)),
    ("li", StyleDelta::block(StyleFlags::NONE, Boundary::Line)),
    (
        "br",
        StyleDelta {
            line_break: true,
            ..StyleDelta::IDENTITY
        },
    ),
    (
        "a",
        StyleDelta {
            flags: StyleFlags::UNDERLINE,
            link: true,
            ..StyleDelta::IDENTITY
        },
    ),
];

static STYLE_MAP: LazyLock<HashMap<&'static str, StyleDelta>> =
    LazyLock::new(|| STYLE_TABLE.iter().copied().collect());

/// Style delta for a tag; tags without a mapping are the identity
pub fn delta_for_tag(tag: &str) -> StyleDelta {
    STYLE_MAP.get(tag).copied().unwrap_or(StyleDelta::IDENTITY)
}

/// Resolve an element to its delta and, for links, its target
pub fn resolve(element: &Element) -> (StyleDelta, Option<&str>) {
    let delta = delta_for_tag(&element.tag);
    let href = if delta.link {
        element.attr("href").filter(|href| !href.is_empty())
    } else {
        None
    };
    (delta, href)
}
