//! Indicator range sets and line folding.
//!
//! - [`IntervalSet`] keeps the ranges of one indicator layer sorted, disjoint and merged, and
//!   shifts them as text is inserted or deleted.
//! - [`FoldingManager`] keeps the per-line fold levels produced by a lexer together with the
//!   expanded/visible state of each line.

use std::ops::Range;

/// Half-open byte interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl Interval {
    /// Create a new interval with `[start, end)` offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Check if interval contains a specific position
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Check if two intervals overlap
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Convert to a `Range`.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Sorted set of disjoint intervals.
///
/// `fill` merges overlapping and touching intervals; `clear` punches holes. Lookups use binary
/// search over the start offsets.
#[derive(Debug, Clone, Default)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `[start, end)` to the set.
    pub fn fill(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        // First interval that could touch the new one.
        let first = self.intervals.partition_point(|i| i.end < start);
        let mut last = first;
        let mut merged = Interval::new(start, end);
        while last < self.intervals.len() && self.intervals[last].start <= end {
            merged.start = merged.start.min(self.intervals[last].start);
            merged.end = merged.end.max(self.intervals[last].end);
            last += 1;
        }
        self.intervals.splice(first..last, std::iter::once(merged));
    }

    /// Remove `[start, end)` from the set.
    pub fn clear(&mut self, start: usize, end: usize) {
        if start >= end || self.intervals.is_empty() {
            return;
        }
        let first = self.intervals.partition_point(|i| i.end <= start);
        let mut last = first;
        let mut keep = Vec::with_capacity(2);
        while last < self.intervals.len() && self.intervals[last].start < end {
            let interval = self.intervals[last];
            if interval.start < start {
                keep.push(Interval::new(interval.start, start));
            }
            if interval.end > end {
                keep.push(Interval::new(end, interval.end));
            }
            last += 1;
        }
        self.intervals.splice(first..last, keep);
    }

    /// Remove every interval.
    pub fn clear_all(&mut self) {
        self.intervals.clear();
    }

    /// Intervals overlapping `[start, end)`.
    pub fn query_range(&self, start: usize, end: usize) -> &[Interval] {
        if start >= end {
            return &[];
        }
        let first = self.intervals.partition_point(|i| i.end <= start);
        let last = self.intervals.partition_point(|i| i.start < end);
        &self.intervals[first..last.max(first)]
    }

    /// Returns `true` if `pos` lies inside any interval.
    pub fn contains(&self, pos: usize) -> bool {
        let idx = self.intervals.partition_point(|i| i.end <= pos);
        self.intervals.get(idx).is_some_and(|i| i.contains(pos))
    }

    /// All intervals in order.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Shift intervals for `delta` bytes inserted at `pos`.
    pub fn update_for_insertion(&mut self, pos: usize, delta: usize) {
        for interval in &mut self.intervals {
            if interval.start >= pos {
                interval.start += delta;
                interval.end += delta;
            } else if interval.end > pos {
                // Interval spans insertion point, extend end position
                interval.end += delta;
            }
        }
    }

    /// Shift/shrink intervals for the deletion of `[start, end)`.
    pub fn update_for_deletion(&mut self, start: usize, end: usize) {
        let delta = end - start;
        for interval in &mut self.intervals {
            if interval.end <= start {
                continue;
            } else if interval.start >= end {
                interval.start -= delta;
                interval.end -= delta;
            } else {
                let new_start = interval.start.min(start);
                let removed = interval.end.min(end) - interval.start.max(start);
                interval.end -= removed;
                interval.start = new_start;
                if interval.start > interval.end {
                    interval.end = interval.start;
                }
            }
        }
        self.intervals.retain(|i| i.start < i.end);
        // Deletions can make neighbours touch; keep the set canonical.
        let mut canonical: Vec<Interval> = Vec::with_capacity(self.intervals.len());
        for interval in self.intervals.drain(..) {
            match canonical.last_mut() {
                Some(prev) if prev.end >= interval.start => prev.end = prev.end.max(interval.end),
                _ => canonical.push(interval),
            }
        }
        self.intervals = canonical;
    }
}

/// Packed fold level of a line.
///
/// The low 12 bits hold the level number (starting at [`FoldLevel::BASE`]); the flag bits mark
/// blank lines and fold headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoldLevel(pub u32);

impl FoldLevel {
    /// Level number of top-level lines.
    pub const BASE: u32 = 0x400;
    /// Set on whitespace-only lines.
    pub const WHITE_FLAG: u32 = 0x1000;
    /// Set on lines that start a fold.
    pub const HEADER_FLAG: u32 = 0x2000;
    /// Mask of the level number.
    pub const NUMBER_MASK: u32 = 0x0FFF;

    /// A plain line at nesting `depth`.
    pub fn at_depth(depth: u32) -> Self {
        Self(Self::BASE + depth)
    }

    /// A fold header at nesting `depth`.
    pub fn header_at_depth(depth: u32) -> Self {
        Self((Self::BASE + depth) | Self::HEADER_FLAG)
    }

    /// Level number without flags.
    pub fn number(self) -> u32 {
        self.0 & Self::NUMBER_MASK
    }

    /// Returns `true` if the line starts a fold.
    pub fn is_header(self) -> bool {
        self.0 & Self::HEADER_FLAG != 0
    }

    /// Returns `true` for blank lines.
    pub fn is_white(self) -> bool {
        self.0 & Self::WHITE_FLAG != 0
    }
}

impl Default for FoldLevel {
    fn default() -> Self {
        Self(Self::BASE)
    }
}

/// Per-line fold structure.
///
/// Fold levels come from the lexer; the expanded flag is user state and survives restyling.
/// Visibility is derived: a line is hidden when any contracted header encloses it.
#[derive(Debug, Clone)]
pub struct FoldingManager {
    levels: Vec<FoldLevel>,
    expanded: Vec<bool>,
    visible: Vec<bool>,
}

impl FoldingManager {
    /// Create a fold structure for `line_count` flat lines.
    pub fn new(line_count: usize) -> Self {
        Self {
            levels: vec![FoldLevel::default(); line_count],
            expanded: vec![true; line_count],
            visible: vec![true; line_count],
        }
    }

    /// Number of tracked lines.
    pub fn line_count(&self) -> usize {
        self.levels.len()
    }

    /// Fold level of `line`.
    pub fn level(&self, line: usize) -> FoldLevel {
        self.levels.get(line).copied().unwrap_or_default()
    }

    /// Set the fold level of `line`.
    pub fn set_level(&mut self, line: usize, level: FoldLevel) {
        if let Some(slot) = self.levels.get_mut(line) {
            *slot = level;
        }
    }

    /// Replace the levels of the first `levels.len()` lines and recompute visibility.
    pub fn replace_levels(&mut self, levels: &[FoldLevel]) {
        for (line, level) in levels.iter().enumerate().take(self.levels.len()) {
            self.levels[line] = *level;
        }
        self.refresh_visibility();
    }

    /// Nearest header above `line` with a lower level number.
    pub fn parent(&self, line: usize) -> Option<usize> {
        let level = self.level(line).number();
        (0..line.min(self.levels.len()))
            .rev()
            .find(|&l| {
                let look = self.levels[l];
                look.is_header() && look.number() < level
            })
    }

    /// Last line belonging to the fold started by `line`.
    pub fn last_child(&self, line: usize) -> usize {
        if line >= self.levels.len() {
            return line;
        }
        let level = self.levels[line].number();
        let mut last = line;
        while last + 1 < self.levels.len() && self.levels[last + 1].number() > level {
            last += 1;
        }
        last
    }

    /// Returns `true` unless `line` is a contracted header.
    pub fn is_expanded(&self, line: usize) -> bool {
        self.expanded.get(line).copied().unwrap_or(true)
    }

    /// Returns `true` unless a contracted fold hides `line`.
    pub fn is_visible(&self, line: usize) -> bool {
        self.visible.get(line).copied().unwrap_or(true)
    }

    /// First contracted header at or after `from`.
    pub fn contracted_next(&self, from: usize) -> Option<usize> {
        (from..self.levels.len()).find(|&l| self.levels[l].is_header() && !self.expanded[l])
    }

    /// Flip the expanded state of a header line. Returns `false` for non-header lines.
    pub fn toggle(&mut self, line: usize) -> bool {
        if !self.level(line).is_header() {
            return false;
        }
        self.expanded[line] = !self.expanded[line];
        self.refresh_visibility();
        true
    }

    /// Expand every contracted fold enclosing `line`.
    pub fn ensure_visible(&mut self, line: usize) {
        let mut current = line;
        let mut changed = false;
        while let Some(parent) = self.parent(current) {
            if !self.expanded[parent] {
                self.expanded[parent] = true;
                changed = true;
            }
            current = parent;
        }
        if changed {
            self.refresh_visibility();
        }
    }

    /// Display line of a document line (one display line per document line).
    pub fn visible_from_doc_line(&self, line: usize) -> usize {
        let tracked = line.min(self.visible.len());
        let shown = self.visible[..tracked].iter().filter(|v| **v).count();
        shown + (line - tracked)
    }

    /// Document line shown at display line `visible`.
    pub fn doc_line_from_visible(&self, visible: usize) -> usize {
        let mut seen = 0;
        for (line, shown) in self.visible.iter().enumerate() {
            if *shown {
                if seen == visible {
                    return line;
                }
                seen += 1;
            }
        }
        self.visible.len().saturating_sub(1)
    }

    /// Account for `count` lines inserted after `line` (the line being split).
    pub fn insert_lines(&mut self, line: usize, count: usize) {
        if count == 0 {
            return;
        }
        let at = (line + 1).min(self.levels.len());
        let level = FoldLevel(self.level(line).0 & !FoldLevel::HEADER_FLAG);
        let visible = self.is_visible(line);
        self.levels.splice(at..at, std::iter::repeat_n(level, count));
        self.expanded.splice(at..at, std::iter::repeat_n(true, count));
        self.visible.splice(at..at, std::iter::repeat_n(visible, count));
    }

    /// Account for the lines `first..first + count` being merged into `first - 1`.
    pub fn remove_lines(&mut self, first: usize, count: usize) {
        let start = first.min(self.levels.len());
        let end = (first + count).min(self.levels.len());
        self.levels.drain(start..end);
        self.expanded.drain(start..end);
        self.visible.drain(start..end);
        self.refresh_visibility();
    }

    fn refresh_visibility(&mut self) {
        let mut hidden_through: Option<usize> = None;
        for line in 0..self.levels.len() {
            let shown = hidden_through.is_none_or(|h| line > h);
            self.visible[line] = shown;
            if self.levels[line].is_header() && !self.expanded[line] {
                let last = self.last_child(line);
                if last > line {
                    hidden_through = Some(hidden_through.map_or(last, |h| h.max(last)));
                }
            }
        }
    }
}

impl Default for FoldingManager {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_contains() {
        let interval = Interval::new(10, 20);
        assert!(interval.contains(10));
        assert!(interval.contains(19));
        assert!(!interval.contains(20));
        assert!(!interval.contains(9));
    }

    #[test]
    fn test_interval_overlaps() {
        let i1 = Interval::new(10, 20);
        let i2 = Interval::new(15, 25);
        let i3 = Interval::new(25, 30);

        assert!(i1.overlaps(&i2));
        assert!(!i1.overlaps(&i3));
    }

    #[test]
    fn test_fill_merges_touching() {
        let mut set = IntervalSet::new();
        set.fill(10, 20);
        set.fill(30, 40);
        set.fill(20, 30);
        assert_eq!(set.intervals(), &[Interval::new(10, 40)]);
    }

    #[test]
    fn test_clear_splits() {
        let mut set = IntervalSet::new();
        set.fill(0, 100);
        set.clear(40, 60);
        assert_eq!(set.intervals(), &[Interval::new(0, 40), Interval::new(60, 100)]);
        set.clear(0, 100);
        assert!(set.is_empty());
    }

    #[test]
    fn test_query_range() {
        let mut set = IntervalSet::new();
        set.fill(10, 20);
        set.fill(25, 35);
        set.fill(40, 50);
        assert_eq!(set.query_range(15, 30).len(), 2);
        assert_eq!(set.query_range(0, 60).len(), 3);
        assert!(set.query_range(20, 25).is_empty());
        assert!(set.contains(45));
        assert!(!set.contains(22));
    }

    #[test]
    fn test_update_insertion() {
        let mut set = IntervalSet::new();
        set.fill(10, 20);
        set.fill(30, 40);
        set.update_for_insertion(15, 5);
        assert_eq!(set.intervals(), &[Interval::new(10, 25), Interval::new(35, 45)]);
    }

    #[test]
    fn test_update_deletion() {
        let mut set = IntervalSet::new();
        set.fill(10, 20);
        set.fill(30, 40);
        set.fill(50, 60);
        set.update_for_deletion(25, 35);
        assert_eq!(
            set.intervals(),
            &[Interval::new(10, 20), Interval::new(25, 30), Interval::new(40, 50)]
        );
        set.update_for_deletion(0, 100);
        assert!(set.is_empty());
    }

    fn nested_folds() -> FoldingManager {
        // 0 {        header depth 0
        // 1   {      header depth 1
        // 2   }      depth 2
        // 3 }        depth 1
        // 4 x        depth 0
        let mut folds = FoldingManager::new(5);
        folds.replace_levels(&[
            FoldLevel::header_at_depth(0),
            FoldLevel::header_at_depth(1),
            FoldLevel::at_depth(2),
            FoldLevel::at_depth(1),
            FoldLevel::at_depth(0),
        ]);
        folds
    }

    #[test]
    fn test_fold_parent_and_last_child() {
        let folds = nested_folds();
        assert_eq!(folds.parent(2), Some(1));
        assert_eq!(folds.parent(3), Some(0));
        assert_eq!(folds.parent(0), None);
        assert_eq!(folds.last_child(0), 3);
        assert_eq!(folds.last_child(1), 2);
    }

    #[test]
    fn test_toggle_hides_children() {
        let mut folds = nested_folds();
        assert!(folds.toggle(0));
        assert!(!folds.is_visible(1));
        assert!(!folds.is_visible(3));
        assert!(folds.is_visible(4));
        assert_eq!(folds.contracted_next(0), Some(0));
        assert_eq!(folds.visible_from_doc_line(4), 1);
        assert_eq!(folds.doc_line_from_visible(1), 4);

        assert!(!folds.toggle(4));
        folds.ensure_visible(2);
        assert!(folds.is_expanded(0));
        assert!(folds.is_visible(2));
        assert_eq!(folds.contracted_next(0), None);
    }
}
