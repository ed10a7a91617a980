//! Brace highlighting and brace navigation.
//!
//! Highlighting runs in two steps. Every caret move runs [`BraceMode::Braces`], which only
//! lights the brace pair (or marks an unmatched brace bad) and arms the
//! [`TimerId::BraceHighlight`] timer. When the caret has stayed put for a second the timer runs
//! [`BraceMode::Highlight`], which fills [`IndicatorKind::BraceMatch`] over the whole pair and
//! arms [`TimerId::BraceHighlightClear`]; five seconds later [`BraceMode::Clear`] removes it.

use std::ops::Range;
use std::time::Duration;

use editor_surface_lang::is_brace;

use crate::buffer::StyledTextBuffer;
use crate::decorations::IndicatorKind;
use crate::scheduler::{TimerId, TimerQueue};

/// Brace-match indicator alpha for a pair on one line.
pub const SINGLE_LINE_ALPHA: u8 = 40;
/// Brace-match indicator alpha for a multi-line pair on a light theme.
pub const MULTI_LINE_ALPHA_LIGHT: u8 = 10;
/// Brace-match indicator alpha for a multi-line pair on a dark theme.
pub const MULTI_LINE_ALPHA_DARK: u8 = 3;

/// What a brace-match pass does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceMode {
    /// Caret moved: light the braces and arm the highlight timer.
    Braces,
    /// The caret settled: fill the text between the braces.
    Highlight,
    /// The highlight expired: remove the fill.
    Clear,
}

/// Options read from settings and theme at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceOptions {
    /// Fill the text between matched braces (`bracehighlighttext`).
    pub highlight_text: bool,
    /// The active theme is dark.
    pub dark_theme: bool,
}

impl Default for BraceOptions {
    fn default() -> Self {
        Self {
            highlight_text: true,
            dark_theme: false,
        }
    }
}

/// The brace next to the caret, if any: the character before the caret wins over the one after.
///
/// For markup lexers, braces styled as a quoted attribute value or CDATA are text, not braces.
/// Whether a brace gets such a style depends on the lexer.
///
/// Returns the brace position and whether it was the character before the caret.
pub fn brace_at_caret(buffer: &dyn StyledTextBuffer) -> Option<(usize, bool)> {
    let markup = buffer.lexer().supports_tag_matching();
    let strings = buffer.string_styles();
    let is_code_brace = |pos: usize| {
        buffer.char_at(pos).is_some_and(is_brace)
            && !(markup && {
                let style = buffer.style_at(pos);
                strings.is_string(style) || strings.is_cdata(style)
            })
    };
    let caret = buffer.current_pos();
    if caret > 0 && is_code_brace(caret - 1) {
        return Some((caret - 1, true));
    }
    is_code_brace(caret).then_some((caret, false))
}

/// Per-document brace highlight state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BraceState {
    last_caret: Option<usize>,
    last_indicator: Option<Range<usize>>,
}

impl BraceState {
    /// Create a fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The range currently covered by the brace-match fill.
    pub fn last_indicator(&self) -> Option<Range<usize>> {
        self.last_indicator.clone()
    }

    /// Run one brace-match pass.
    ///
    /// In [`BraceMode::Braces`] a call with the caret where the previous call left it does
    /// nothing and returns `false`: restyling the braces makes the host report a UI update,
    /// which would otherwise run this again.
    pub fn update(
        &mut self,
        buffer: &mut dyn StyledTextBuffer,
        mode: BraceMode,
        options: BraceOptions,
        timers: &mut TimerQueue,
        now: Duration,
    ) -> bool {
        let caret = buffer.current_pos();
        if mode == BraceMode::Braces && self.last_caret == Some(caret) {
            return false;
        }
        self.last_caret = Some(caret);

        let at = brace_at_caret(buffer).map(|(pos, _)| pos);
        let opposite = at.and_then(|pos| buffer.brace_match(pos));

        timers.cancel(TimerId::BraceHighlight);
        timers.cancel(TimerId::BraceHighlightClear);
        buffer.set_highlight_guide(0);

        if let (Some(at), None) = (at, opposite) {
            buffer.brace_bad_light(Some(at));
            if options.highlight_text {
                self.clear_fill(buffer);
            }
            return true;
        }

        buffer.brace_highlight(at, opposite);
        let (Some(at), Some(opposite)) = (at, opposite) else {
            if options.highlight_text {
                self.clear_fill(buffer);
            }
            return true;
        };

        if options.highlight_text {
            self.clear_fill(buffer);
            match mode {
                BraceMode::Highlight => {
                    let start = at.min(opposite);
                    let length = at.abs_diff(opposite) + 1;
                    let alpha = if buffer.line_from_position(start)
                        == buffer.line_from_position(start + length)
                    {
                        SINGLE_LINE_ALPHA
                    } else if options.dark_theme {
                        MULTI_LINE_ALPHA_DARK
                    } else {
                        MULTI_LINE_ALPHA_LIGHT
                    };
                    buffer.set_indicator_alpha(IndicatorKind::BraceMatch, alpha);
                    buffer.fill_indicator(IndicatorKind::BraceMatch, start..start + length);
                    self.last_indicator = Some(start..start + length);
                    timers.schedule(
                        TimerId::BraceHighlightClear,
                        TimerId::BraceHighlightClear.default_delay(),
                        now,
                    );
                }
                BraceMode::Braces => timers.schedule(
                    TimerId::BraceHighlight,
                    TimerId::BraceHighlight.default_delay(),
                    now,
                ),
                BraceMode::Clear => {}
            }
        }

        if mode == BraceMode::Highlight && buffer.indentation_guides().enabled() {
            let column = buffer.column(at).min(buffer.column(opposite));
            buffer.set_highlight_guide(column);
        }
        true
    }

    fn clear_fill(&mut self, buffer: &mut dyn StyledTextBuffer) {
        if let Some(range) = self.last_indicator.take() {
            buffer.clear_indicator(IndicatorKind::BraceMatch, range);
        }
    }
}

/// Move the caret to the brace matching the one next to it.
///
/// With `extend`, select from the brace through its match, both braces included. Returns `false`
/// when there is no brace pair at the caret.
pub fn goto_brace(buffer: &mut dyn StyledTextBuffer, extend: bool) -> bool {
    if buffer.len() <= 1 {
        return false;
    }
    let caret = buffer.current_pos();
    let has_char_before = caret > 0 && buffer.char_at(caret - 1).is_some();
    let Some((mut at, _)) = brace_at_caret(buffer) else {
        return false;
    };
    let Some(mut opposite) = buffer.brace_match(at) else {
        return false;
    };

    if extend {
        if opposite >= at {
            opposite += 1;
        } else {
            at += 1;
        }
    } else if opposite > at && opposite == at + 1 && has_char_before {
        opposite -= 1;
    }

    buffer.set_sel(Some(if extend { at } else { opposite }), opposite);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BraceLight, TextBuffer};
    use pretty_assertions::assert_eq;

    fn buffer_at(text: &str, caret: usize) -> TextBuffer {
        let mut buffer = TextBuffer::new(text);
        buffer.set_sel(None, caret);
        buffer
    }

    #[test]
    fn test_char_before_has_priority() {
        let buffer = buffer_at("(a)[b]", 3);
        assert_eq!(brace_at_caret(&buffer), Some((2, true)));
        let buffer = buffer_at("x(a)", 1);
        assert_eq!(brace_at_caret(&buffer), Some((1, false)));
        assert_eq!(brace_at_caret(&buffer_at("abc", 1)), None);
    }

    #[test]
    fn test_braces_then_highlight() {
        let mut buffer = buffer_at("f(a, b);", 1);
        let mut state = BraceState::new();
        let mut timers = TimerQueue::new();
        let options = BraceOptions::default();

        assert!(state.update(&mut buffer, BraceMode::Braces, options, &mut timers, Duration::ZERO));
        assert_eq!(buffer.brace_light(), BraceLight::Matched(1, 6));
        assert!(timers.is_pending(TimerId::BraceHighlight));
        assert!(buffer.indicator_ranges(IndicatorKind::BraceMatch).is_empty());

        // Same caret: ignored.
        assert!(!state.update(&mut buffer, BraceMode::Braces, options, &mut timers, Duration::ZERO));

        state.update(&mut buffer, BraceMode::Highlight, options, &mut timers, Duration::from_secs(1));
        assert_eq!(state.last_indicator(), Some(1..7));
        assert_eq!(buffer.indicator_style(IndicatorKind::BraceMatch).alpha, SINGLE_LINE_ALPHA);
        assert!(timers.is_pending(TimerId::BraceHighlightClear));
        assert!(!timers.is_pending(TimerId::BraceHighlight));

        state.update(&mut buffer, BraceMode::Clear, options, &mut timers, Duration::from_secs(6));
        assert!(buffer.indicator_ranges(IndicatorKind::BraceMatch).is_empty());
        assert_eq!(state.last_indicator(), None);
    }

    #[test]
    fn test_multi_line_alpha() {
        let mut buffer = buffer_at("{\n  x\n}\n", 0);
        let mut state = BraceState::new();
        let mut timers = TimerQueue::new();
        let options = BraceOptions {
            highlight_text: true,
            dark_theme: true,
        };
        state.update(&mut buffer, BraceMode::Highlight, options, &mut timers, Duration::ZERO);
        assert_eq!(
            buffer.indicator_style(IndicatorKind::BraceMatch).alpha,
            MULTI_LINE_ALPHA_DARK
        );
    }

    #[test]
    fn test_unmatched_brace_is_bad() {
        let mut buffer = buffer_at("(a", 1);
        let mut state = BraceState::new();
        let mut timers = TimerQueue::new();
        state.update(
            &mut buffer,
            BraceMode::Braces,
            BraceOptions::default(),
            &mut timers,
            Duration::ZERO,
        );
        assert_eq!(buffer.brace_light(), BraceLight::Bad(0));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_goto_brace() {
        let mut buffer = buffer_at("a{bc}d", 1);
        assert!(goto_brace(&mut buffer, false));
        assert_eq!(buffer.current_pos(), 4);

        let mut buffer = buffer_at("a{bc}d", 1);
        assert!(goto_brace(&mut buffer, true));
        assert_eq!((buffer.anchor(), buffer.current_pos()), (1, 5));

        let mut buffer = buffer_at("abc", 1);
        assert!(!goto_brace(&mut buffer, false));
    }
}
