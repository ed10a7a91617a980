//! Indicator (visual overlay) data model.
//!
//! Indicators are ranges drawn over text independently of its lexical styling: boxes around
//! matching braces, tinted occurrences of the selected word, regex capture groups, and so on.
//! Each [`IndicatorKind`] is an independent layer; ranges of one kind are always cleared before
//! the layer is refilled.

use std::ops::Range;

/// Number of distinct regex capture groups that get their own indicator.
pub const REGEX_CAPTURE_GROUPS: u8 = 10;

/// A named indicator layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndicatorKind {
    /// Other occurrences of the selected word.
    SelectionMark,
    /// `<name`, tag tail and close tag of the tag pair around the caret.
    TagMatch,
    /// Attributes of the open tag around the caret.
    TagAttribute,
    /// Matches of the find feature.
    FindTextMark,
    /// Clickable URLs.
    UrlHotspot,
    /// The text between (and including) a matched brace pair.
    BraceMatch,
    /// Spell checker squiggles.
    Misspelled,
    /// Regex capture group `n` (`0` is the whole match).
    RegexCapture(u8),
}

impl IndicatorKind {
    /// All regex capture indicator kinds, in group order.
    pub fn regex_captures() -> impl Iterator<Item = IndicatorKind> {
        (0..REGEX_CAPTURE_GROUPS).map(IndicatorKind::RegexCapture)
    }
}

/// A decoration applied to the buffer's display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorRange {
    /// Layer the range belongs to.
    pub kind: IndicatorKind,
    /// Start byte offset.
    pub start: usize,
    /// Length in bytes.
    pub length: usize,
}

impl IndicatorRange {
    /// Create a range for `kind` covering `start..start + length`.
    pub fn new(kind: IndicatorKind, start: usize, length: usize) -> Self {
        Self {
            kind,
            start,
            length,
        }
    }

    /// The covered byte range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.length
    }
}

/// How an indicator is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorShape {
    /// Filled box with a thin outline.
    RoundBox,
    /// Filled box without outline.
    StraightBox,
    /// Plain underline.
    Underline,
    /// Wavy underline.
    Squiggle,
    /// Text colour change only.
    TextFore,
}

/// Appearance of an indicator layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorStyle {
    /// Shape used to draw ranges.
    pub shape: IndicatorShape,
    /// Colour of the fill/underline.
    pub color: Color,
    /// Fill alpha (`0..=255`).
    pub alpha: u8,
    /// Outline alpha (`0..=255`).
    pub outline_alpha: u8,
}

impl IndicatorStyle {
    /// Default appearance for each built-in kind.
    pub fn default_for(kind: IndicatorKind) -> Self {
        let (shape, color, alpha) = match kind {
            IndicatorKind::SelectionMark => (IndicatorShape::RoundBox, Color::rgb(0, 255, 0), 50),
            IndicatorKind::TagMatch => (IndicatorShape::RoundBox, Color::rgb(0x80, 0x00, 0xFF), 30),
            IndicatorKind::TagAttribute => {
                (IndicatorShape::RoundBox, Color::rgb(0xFF, 0xFF, 0x00), 30)
            }
            IndicatorKind::FindTextMark => (IndicatorShape::RoundBox, Color::rgb(255, 255, 0), 100),
            IndicatorKind::UrlHotspot => (IndicatorShape::Underline, Color::rgb(0, 0, 255), 255),
            IndicatorKind::BraceMatch => (IndicatorShape::StraightBox, Color::rgb(0, 150, 0), 40),
            IndicatorKind::Misspelled => (IndicatorShape::Squiggle, Color::rgb(255, 0, 0), 255),
            IndicatorKind::RegexCapture(n) => {
                (IndicatorShape::RoundBox, capture_palette(n), 50)
            }
        };
        Self {
            shape,
            color,
            alpha,
            outline_alpha: alpha.saturating_add(50),
        }
    }
}

fn capture_palette(group: u8) -> Color {
    const PALETTE: [Color; 10] = [
        Color::rgb(0xFF, 0x00, 0x00),
        Color::rgb(0x00, 0xFF, 0x00),
        Color::rgb(0x00, 0x00, 0xFF),
        Color::rgb(0xFF, 0xFF, 0x00),
        Color::rgb(0x00, 0xFF, 0xFF),
        Color::rgb(0xFF, 0x00, 0xFF),
        Color::rgb(0x80, 0x00, 0x00),
        Color::rgb(0x00, 0x80, 0x00),
        Color::rgb(0x00, 0x00, 0x80),
        Color::rgb(0x80, 0x80, 0x00),
    ];
    PALETTE[usize::from(group) % PALETTE.len()]
}

/// A packed `0x00RRGGBB` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Build a colour from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Red component.
    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green component.
    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue component.
    pub fn b(self) -> u8 {
        self.0 as u8
    }
}
