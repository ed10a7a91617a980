//! Per-document viewport state and viewport scrolling helpers.

use tracing::debug;

use crate::buffer::{SelectionMode, StyledTextBuffer, WrapMode};
use crate::error::RestoreError;

/// Where a document was scrolled to, what was selected and which folds were collapsed.
///
/// Saved when a document is switched away from and restored when it comes back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewPosition {
    /// First visible document line.
    pub first_visible_line: usize,
    /// Selection anchor.
    pub selection_start: usize,
    /// Caret.
    pub selection_end: usize,
    /// Horizontal scroll offset.
    pub x_offset: usize,
    /// Selection mode.
    pub selection_mode: SelectionMode,
    /// Horizontal scroll range.
    pub scroll_width: usize,
    /// Collapsed fold header lines, top to bottom.
    pub collapsed_lines: Vec<usize>,
    /// The last line inside any collapsed fold.
    pub last_styled_line: usize,
}

impl ViewPosition {
    /// Capture the view state of `buffer`.
    pub fn save(buffer: &dyn StyledTextBuffer) -> Self {
        let mut collapsed_lines = Vec::new();
        let mut last_styled_line = 0;
        let mut line = 0;
        while let Some(header) = buffer.contracted_fold_next(line) {
            collapsed_lines.push(header);
            last_styled_line = last_styled_line.max(buffer.last_child(header));
            line = header + 1;
        }

        Self {
            first_visible_line: buffer.doc_line_from_visible(buffer.first_visible_line()),
            selection_start: buffer.anchor(),
            selection_end: buffer.current_pos(),
            x_offset: buffer.x_offset(),
            selection_mode: buffer.selection_mode(),
            scroll_width: buffer.scroll_width(),
            collapsed_lines,
            last_styled_line,
        }
    }

    /// Re-apply the saved state to `buffer`.
    ///
    /// Fold levels must be known before folds can be collapsed, so styling is brought up to
    /// the deepest collapsed line first. A saved line that is neither a fold header nor inside
    /// a fold aborts the restore; scroll and selection are then left untouched.
    pub fn restore(&self, buffer: &mut dyn StyledTextBuffer) -> Result<(), RestoreError> {
        if !self.collapsed_lines.is_empty()
            && buffer.end_styled() < buffer.len()
            && self.last_styled_line > 0
        {
            let end = buffer.position_from_line(self.last_styled_line + 1);
            buffer.colourise(0, Some(end));
        }

        for &line in &self.collapsed_lines {
            let header = if buffer.fold_level(line).is_header() {
                line
            } else {
                match buffer.fold_parent(line) {
                    Some(parent) => parent,
                    None => {
                        debug!(line, "fold restore aborted: no fold header");
                        return Err(RestoreError::MissingFoldParent { line });
                    }
                }
            };
            if buffer.fold_expanded(header) {
                buffer.toggle_fold(header);
            }
        }

        if buffer.wrap_mode() == WrapMode::None {
            buffer.set_scroll_width(self.scroll_width);
            buffer.set_x_offset(self.x_offset);
        }
        buffer.choose_caret_x();

        let first = buffer.visible_from_doc_line(self.first_visible_line);
        buffer.set_first_visible_line(first);
        let caret_line = buffer.line_from_position(self.selection_end);
        buffer.ensure_visible(caret_line);
        buffer.goto_pos(self.selection_end);
        buffer.set_selection_mode(self.selection_mode);
        buffer.set_anchor(self.selection_start);
        buffer.set_current_pos(self.selection_end);
        buffer.cancel();
        Ok(())
    }
}

/// Scroll so that the range `start..end` sits in the middle band of the view and select it.
///
/// Nothing scrolls while the range is already between the top and bottom quarter of the view.
pub fn center(buffer: &mut dyn StyledTextBuffer, start: usize, end: usize) {
    let test_pos = start.min(end);
    buffer.set_current_pos(test_pos);
    let doc_line = buffer.line_from_position(test_pos);
    if !buffer.line_visible(doc_line) {
        buffer.ensure_visible(doc_line);
    }
    let visible_line = buffer.visible_from_doc_line(doc_line) as isize;

    let first = buffer.first_visible_line() as isize;
    let lines = buffer.lines_on_screen().saturating_sub(1) as isize;
    let last = first + lines;

    let scroll = if visible_line < first + lines / 4 {
        visible_line - first - lines / 2
    } else if visible_line > last - lines / 4 {
        visible_line - last + lines / 2
    } else {
        0
    };
    buffer.line_scroll(scroll);
    buffer.goto_pos(start);
    buffer.goto_pos(end);
    buffer.set_anchor(start);
}

/// Move the caret to the start of `line` and center it.
pub fn goto_line(buffer: &mut dyn StyledTextBuffer, line: usize) {
    let pos = buffer.position_from_line(line);
    center(buffer, pos, pos);
}

/// Width of the line-number margin in digits.
///
/// Wide enough for the last line on screen, at least three digits; zero when line numbers are
/// hidden.
pub fn line_number_digits(buffer: &dyn StyledTextBuffer, enabled: bool) -> usize {
    if !enabled {
        return 0;
    }
    let mut last = buffer.lines_on_screen() + buffer.first_visible_line() + 1;
    let mut digits = 1;
    while last >= 10 {
        last /= 10;
        digits += 1;
    }
    digits.max(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextBuffer;
    use crate::intervals::FoldLevel;
    use pretty_assertions::assert_eq;

    fn numbered(lines: usize) -> String {
        (0..lines).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn test_save_records_collapsed_headers() {
        let mut buffer = TextBuffer::new("a\n b\nc\n d\n");
        buffer.set_fold_levels(&[
            FoldLevel::header_at_depth(0),
            FoldLevel::at_depth(1),
            FoldLevel::header_at_depth(0),
            FoldLevel::at_depth(1),
            FoldLevel::at_depth(0),
        ]);
        buffer.toggle_fold(2);
        let saved = ViewPosition::save(&buffer);
        assert_eq!(saved.collapsed_lines, vec![2]);
        assert_eq!(saved.last_styled_line, 3);
    }

    #[test]
    fn test_restore_aborts_without_fold() {
        let mut buffer = TextBuffer::new("a\nb\n");
        buffer.set_sel(None, 1);
        let saved = ViewPosition {
            selection_start: 3,
            selection_end: 3,
            collapsed_lines: vec![1],
            ..ViewPosition::default()
        };
        assert_eq!(
            saved.restore(&mut buffer),
            Err(RestoreError::MissingFoldParent { line: 1 })
        );
        assert_eq!(buffer.current_pos(), 1);
    }

    #[test]
    fn test_restore_selection_and_scroll() {
        let mut buffer = TextBuffer::new(&numbered(100));
        buffer.set_lines_on_screen(10);
        let saved = ViewPosition {
            first_visible_line: 50,
            // Both on line 55, inside the restored view.
            selection_start: 437,
            selection_end: 432,
            x_offset: 12,
            scroll_width: 900,
            ..ViewPosition::default()
        };
        buffer.add_selection(20, 22);
        saved.restore(&mut buffer).expect("restores");
        assert_eq!(buffer.first_visible_line(), 50);
        assert_eq!((buffer.anchor(), buffer.current_pos()), (437, 432));
        assert_eq!(buffer.x_offset(), 12);
        assert_eq!(buffer.scroll_width(), 900);
        assert_eq!(buffer.selections().len(), 1);
    }

    #[test]
    fn test_center_scrolls_far_target() {
        let mut buffer = TextBuffer::new(&numbered(200));
        buffer.set_lines_on_screen(21);
        goto_line(&mut buffer, 100);
        // 20 usable lines: the target lands ten lines below the top.
        assert_eq!(buffer.first_visible_line(), 90);
        assert_eq!(buffer.line_from_position(buffer.current_pos()), 100);

        // Inside the middle band: no scroll.
        goto_line(&mut buffer, 101);
        assert_eq!(buffer.first_visible_line(), 90);
    }

    #[test]
    fn test_line_number_digits() {
        let mut buffer = TextBuffer::new(&numbered(5));
        buffer.set_lines_on_screen(40);
        assert_eq!(line_number_digits(&buffer, true), 3);
        assert_eq!(line_number_digits(&buffer, false), 0);
        buffer.set_lines_on_screen(1200);
        assert_eq!(line_number_digits(&buffer, true), 4);
    }
}
