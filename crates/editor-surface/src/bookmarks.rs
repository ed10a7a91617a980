//! Line bookmarks.
//!
//! Bookmarks live in the buffer's line markers ([`MARK_BOOKMARK`]) and are mirrored on the
//! overview ruler. Operations taking `Option<usize>` default to the caret line.

use crate::buffer::StyledTextBuffer;
use crate::overview::{BOOKMARK_COLOR, OverviewKind, OverviewRuler};

/// Marker number used for bookmarks.
pub const MARK_BOOKMARK: u32 = 24;

const BOOKMARK_MASK: u32 = 1 << MARK_BOOKMARK;

fn resolve_line(buffer: &dyn StyledTextBuffer, line: Option<usize>) -> usize {
    line.unwrap_or_else(|| buffer.line_from_position(buffer.current_pos()))
}

/// Returns `true` if `line` (or the caret line) is bookmarked.
pub fn is_present(buffer: &dyn StyledTextBuffer, line: Option<usize>) -> bool {
    let line = resolve_line(buffer, line);
    buffer.marker_get(line) & BOOKMARK_MASK != 0
}

/// Bookmark a line. Returns `false` if it already was.
pub fn add(buffer: &mut dyn StyledTextBuffer, overview: &mut OverviewRuler, line: Option<usize>) -> bool {
    let line = resolve_line(&*buffer, line);
    if is_present(&*buffer, Some(line)) {
        return false;
    }
    buffer.marker_add(line, MARK_BOOKMARK);
    overview.add_line_color(OverviewKind::Bookmark, line, BOOKMARK_COLOR);
    true
}

/// Remove a bookmark. Returns `false` if the line had none.
pub fn delete(
    buffer: &mut dyn StyledTextBuffer,
    overview: &mut OverviewRuler,
    line: Option<usize>,
) -> bool {
    let line = resolve_line(&*buffer, line);
    if !is_present(&*buffer, Some(line)) {
        return false;
    }
    buffer.marker_delete(line, MARK_BOOKMARK);
    overview.remove_line(OverviewKind::Bookmark, line);
    true
}

/// Flip the bookmark of a line. Returns whether the line is bookmarked afterwards.
pub fn toggle(
    buffer: &mut dyn StyledTextBuffer,
    overview: &mut OverviewRuler,
    line: Option<usize>,
) -> bool {
    let line = resolve_line(&*buffer, line);
    if is_present(&*buffer, Some(line)) {
        delete(buffer, overview, Some(line));
        false
    } else {
        add(buffer, overview, Some(line));
        true
    }
}

/// Rebuild the bookmark marks of the overview ruler from the buffer's markers.
///
/// Needed after edits move bookmarked lines.
pub fn refresh_overview(buffer: &dyn StyledTextBuffer, overview: &mut OverviewRuler) {
    overview.clear(OverviewKind::Bookmark);
    let mut from = 0;
    while let Some(line) = buffer.marker_next(from, BOOKMARK_MASK) {
        overview.add_line_color(OverviewKind::Bookmark, line, BOOKMARK_COLOR);
        from = line + 1;
    }
}
