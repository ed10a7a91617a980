//! Selected-word highlighting.
//!
//! Selecting text marks its other occurrences on screen with [`IndicatorKind::SelectionMark`] and
//! every occurrence in the document on the overview ruler. The document-wide enumeration stops
//! after [`ENUMERATION_BUDGET`] of work and resumes on the next call; with `edit` set, each
//! occurrence also becomes an extra selection so all of them can be edited at once.

use std::time::Duration;

use tracing::debug;

use crate::buffer::StyledTextBuffer;
use crate::decorations::IndicatorKind;
use crate::overview::{OverviewKind, OverviewRuler, SELECTED_TEXT_COLOR};
use crate::scheduler::Clock;
use crate::search::FindFlags;

/// Wall-clock time one call may spend enumerating document-wide hits.
pub const ENUMERATION_BUDGET: Duration = Duration::from_millis(1500);

/// Single-character selections only get document-wide hits below this many lines.
pub const SINGLE_CHAR_LINE_LIMIT: usize = 100_000;

/// The text the find feature currently highlights, and how many hits it marked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindHighlight {
    /// Highlighted text.
    pub text: String,
    /// Number of marked occurrences.
    pub marker_count: usize,
}

/// Per-document selected-word state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedWordState {
    last_text: String,
    resume_at: usize,
    marker_count: usize,
}

impl SelectedWordState {
    /// Create a fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected text of the last completed pass; empty after a reset.
    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Where the next document-wide enumeration starts; `0` when the last one completed.
    pub fn resume_at(&self) -> usize {
        self.resume_at
    }

    /// Number of occurrences counted so far.
    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    fn reset(&mut self, overview: &mut OverviewRuler) {
        self.last_text.clear();
        overview.clear(OverviewKind::SelectedText);
        self.marker_count = 0;
    }

    /// Refresh the selected-word marks.
    ///
    /// A selection made only of whitespace marks nothing, but otherwise the untrimmed selected
    /// text is what gets searched, so `" foo"` does not mark a bare `foo`. With `edit`, the
    /// original selection is re-added last so it stays the main selection.
    ///
    /// Returns `true` when the overview ruler changed and should be repainted.
    pub fn mark(
        &mut self,
        buffer: &mut dyn StyledTextBuffer,
        overview: &mut OverviewRuler,
        find_highlight: &FindHighlight,
        clock: &dyn Clock,
        clear: bool,
        edit: bool,
    ) -> bool {
        let len = buffer.len();
        let first_line = buffer.doc_line_from_visible(buffer.first_visible_line());
        let last_line = first_line + buffer.lines_on_screen();
        let visible_start = buffer.position_from_line(first_line);
        let visible_end =
            (buffer.position_from_line(last_line) + buffer.line_length(last_line)).min(len);
        if visible_end <= visible_start {
            return false;
        }

        buffer.clear_indicator(IndicatorKind::SelectionMark, 0..len);

        let sel_start = buffer.selection_start();
        let sel_end = buffer.selection_end();
        let selected = buffer.selected_text();
        if selected.is_empty()
            || clear
            || buffer.line_from_position(sel_start) != buffer.line_from_position(sel_end)
            || selected.trim().is_empty()
        {
            self.reset(overview);
            return true;
        }

        // Text the find feature already marks keeps the find feature's count.
        if find_highlight.text.eq_ignore_ascii_case(&selected) {
            self.marker_count = find_highlight.marker_count;
            return false;
        }

        let visible = buffer.text_range(visible_start, visible_end);
        let step = selected.chars().next().map_or(1, char::len_utf8);
        let mut from = 0;
        while let Some(offset) = visible.get(from..).and_then(|rest| rest.find(&selected)) {
            let hit = visible_start + from + offset;
            if hit != sel_start {
                buffer.fill_indicator(IndicatorKind::SelectionMark, hit..hit + selected.len());
            }
            from += offset + step;
        }

        if selected.len() <= 1 && buffer.line_count() >= SINGLE_CHAR_LINE_LIMIT {
            return false;
        }

        let changed = self.last_text != selected;
        let mut overview_changed = false;
        if changed || self.resume_at != 0 || edit {
            if changed {
                overview.clear(OverviewKind::SelectedText);
                self.marker_count = 0;
                self.resume_at = 0;
            }
            let started = clock.now();
            let mut from = std::mem::take(&mut self.resume_at);
            while let Some(hit) = buffer.find_text(&selected, from, len, FindFlags::match_case()) {
                if edit && (hit.start != sel_start || hit.end != sel_end) {
                    buffer.add_selection(hit.end, hit.start);
                }
                let line = buffer.line_from_position(hit.start);
                overview.add_line_color(OverviewKind::SelectedText, line, SELECTED_TEXT_COLOR);
                self.marker_count += 1;
                if hit.end <= from {
                    break;
                }
                from = hit.end;

                if !edit && clock.now().saturating_sub(started) > ENUMERATION_BUDGET {
                    self.resume_at = from;
                    debug!(resume_at = from, "selected-word enumeration out of time");
                    break;
                }
            }
            if edit {
                buffer.add_selection(sel_end, sel_start);
            }
            overview_changed = true;
        }
        self.last_text = selected;
        overview_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextBuffer;
    use crate::scheduler::ManualClock;
    use pretty_assertions::assert_eq;

    fn ranges(buffer: &TextBuffer) -> Vec<std::ops::Range<usize>> {
        buffer
            .indicator_ranges(IndicatorKind::SelectionMark)
            .iter()
            .map(|r| r.range())
            .collect()
    }

    #[test]
    fn test_marks_other_occurrences() {
        let mut buffer = TextBuffer::new("foo bar foo\nfoo\n");
        buffer.set_sel(Some(0), 3);
        let mut state = SelectedWordState::new();
        let mut overview = OverviewRuler::new();
        let clock = ManualClock::new();
        let changed = state.mark(
            &mut buffer,
            &mut overview,
            &FindHighlight::default(),
            &clock,
            false,
            false,
        );
        assert!(changed);
        assert_eq!(ranges(&buffer), vec![8..11, 12..15]);
        assert_eq!(state.marker_count(), 3);
        assert_eq!(state.last_text(), "foo");
        assert_eq!(overview.lines(OverviewKind::SelectedText).len(), 2);
    }

    #[test]
    fn test_clear_twice() {
        let mut buffer = TextBuffer::new("a b a");
        buffer.set_sel(Some(0), 1);
        let mut state = SelectedWordState::new();
        let mut overview = OverviewRuler::new();
        let clock = ManualClock::new();
        let find = FindHighlight::default();
        state.mark(&mut buffer, &mut overview, &find, &clock, false, false);
        assert_eq!(ranges(&buffer), vec![4..5]);

        state.mark(&mut buffer, &mut overview, &find, &clock, true, false);
        assert!(ranges(&buffer).is_empty());
        assert_eq!(state, SelectedWordState::new());
        state.mark(&mut buffer, &mut overview, &find, &clock, true, false);
        assert_eq!(state, SelectedWordState::new());
        assert!(overview.is_empty());
    }

    #[test]
    fn test_find_highlight_wins() {
        let mut buffer = TextBuffer::new("Foo foo");
        buffer.set_sel(Some(0), 3);
        let mut state = SelectedWordState::new();
        let mut overview = OverviewRuler::new();
        let find = FindHighlight {
            text: "foo".to_string(),
            marker_count: 7,
        };
        let changed = state.mark(&mut buffer, &mut overview, &find, &ManualClock::new(), false, false);
        assert!(!changed);
        assert_eq!(state.marker_count(), 7);
        assert!(ranges(&buffer).is_empty());
    }

    #[test]
    fn test_selection_is_searched_untrimmed() {
        let mut buffer = TextBuffer::new("foo x foo");
        buffer.set_sel(Some(5), 9);
        let mut state = SelectedWordState::new();
        let mut overview = OverviewRuler::new();
        let find = FindHighlight::default();
        state.mark(&mut buffer, &mut overview, &find, &ManualClock::new(), false, false);
        assert!(ranges(&buffer).is_empty());
        assert_eq!(state.marker_count(), 1);
        assert_eq!(state.last_text(), " foo");
    }

    #[test]
    fn test_edit_adds_selections() {
        let mut buffer = TextBuffer::new("x y x y x");
        buffer.set_sel(Some(4), 5);
        let mut state = SelectedWordState::new();
        let mut overview = OverviewRuler::new();
        state.mark(
            &mut buffer,
            &mut overview,
            &FindHighlight::default(),
            &ManualClock::new(),
            false,
            true,
        );
        let selections: Vec<_> = buffer
            .selections()
            .iter()
            .map(|s| (s.anchor, s.caret))
            .collect();
        assert_eq!(selections, vec![(0, 1), (8, 9), (4, 5)]);
    }
}
