//! Scrollbar overview ("docscroll") marks.
//!
//! The overview ruler is a per-document map from line to colour, one map per [`OverviewKind`],
//! that the host paints as thin marks next to the scrollbar thumb.

use std::collections::BTreeMap;

use crate::decorations::Color;

/// Colour of whole-document selected-word hits.
pub const SELECTED_TEXT_COLOR: Color = Color::rgb(0, 255, 0);
/// Colour of bookmarked lines.
pub const BOOKMARK_COLOR: Color = Color::rgb(255, 0, 0);

/// Category of overview marks. Categories are cleared independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverviewKind {
    /// Occurrences of the selected word.
    SelectedText,
    /// Bookmarked lines.
    Bookmark,
}

/// Line marks for the scrollbar thumbnail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewRuler {
    marks: BTreeMap<OverviewKind, BTreeMap<usize, Color>>,
    total_lines: usize,
    current_line: usize,
}

impl OverviewRuler {
    /// Create an empty ruler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every mark of `kind`.
    pub fn clear(&mut self, kind: OverviewKind) {
        self.marks.remove(&kind);
    }

    /// Mark `line` with `color`, replacing an earlier mark of the same kind on that line.
    pub fn add_line_color(&mut self, kind: OverviewKind, line: usize, color: Color) {
        self.marks.entry(kind).or_default().insert(line, color);
    }

    /// Remove the mark of `kind` on `line`. Returns `true` if there was one.
    pub fn remove_line(&mut self, kind: OverviewKind, line: usize) -> bool {
        let Some(lines) = self.marks.get_mut(&kind) else {
            return false;
        };
        let removed = lines.remove(&line).is_some();
        if lines.is_empty() {
            self.marks.remove(&kind);
        }
        removed
    }

    /// Marks of `kind`, in line order.
    pub fn lines(&self, kind: OverviewKind) -> Vec<(usize, Color)> {
        self.marks
            .get(&kind)
            .map(|lines| lines.iter().map(|(&line, &color)| (line, color)).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `line` carries a mark of `kind`.
    pub fn has_line(&self, kind: OverviewKind, line: usize) -> bool {
        self.marks
            .get(&kind)
            .is_some_and(|lines| lines.contains_key(&line))
    }

    /// Returns `true` if no kind has any mark.
    pub fn is_empty(&self) -> bool {
        self.marks.values().all(BTreeMap::is_empty)
    }

    /// Line count the marks are scaled against.
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Set the line count the marks are scaled against.
    pub fn set_total_lines(&mut self, lines: usize) {
        self.total_lines = lines;
    }

    /// The caret line, drawn as the current-line marker.
    pub fn current_line(&self) -> usize {
        self.current_line
    }

    /// Move the current-line marker.
    pub fn set_current_line(&mut self, line: usize) {
        self.current_line = line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kinds_are_independent() {
        let mut ruler = OverviewRuler::new();
        ruler.add_line_color(OverviewKind::Bookmark, 4, BOOKMARK_COLOR);
        ruler.add_line_color(OverviewKind::SelectedText, 4, SELECTED_TEXT_COLOR);
        ruler.add_line_color(OverviewKind::SelectedText, 1, SELECTED_TEXT_COLOR);
        ruler.clear(OverviewKind::SelectedText);
        assert_eq!(ruler.lines(OverviewKind::Bookmark), vec![(4, BOOKMARK_COLOR)]);
        assert!(ruler.lines(OverviewKind::SelectedText).is_empty());
    }

    #[test]
    fn test_remove_line() {
        let mut ruler = OverviewRuler::new();
        ruler.add_line_color(OverviewKind::Bookmark, 2, BOOKMARK_COLOR);
        assert!(ruler.remove_line(OverviewKind::Bookmark, 2));
        assert!(!ruler.remove_line(OverviewKind::Bookmark, 2));
        assert!(ruler.is_empty());
    }
}
