//! In-memory [`StyledTextBuffer`] implementation.
//!
//! [`TextBuffer`] keeps the text in a [`ropey::Rope`] (CR, LF and CRLF line breaks), one style id
//! per byte, the fold structure, per-line marker words, one [`IntervalSet`] per indicator layer,
//! a grouped undo history and the bits of view state the editor surface reads and writes.
//!
//! Styling is pull-based like a native widget: edits move the styled watermark back to the edit
//! position and [`StyledTextBuffer::colourise`] runs the attached [`Lexer`] to catch up.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use editor_surface_lang::{LexerKind, StyleId, XmlStringStyles, closing_brace, is_brace};
use ropey::Rope;
use tracing::trace;

use crate::buffer::{
    IndentGuides, Lexer, SelectionMode, SelectionRange, StyledTextBuffer, WrapMode,
};
use crate::decorations::{IndicatorKind, IndicatorRange, IndicatorStyle};
use crate::error::BufferError;
use crate::intervals::{FoldLevel, FoldingManager, IntervalSet};
use crate::line_ending::LineEnding;
use crate::search::{FindFlags, Finder};
use crate::undo::{TextEdit, UndoRedoManager, UndoStep};

const MAX_UNDO: usize = 1000;

/// Brace highlight state of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BraceLight {
    /// Nothing highlighted.
    #[default]
    None,
    /// A matched pair.
    Matched(usize, usize),
    /// A brace without counterpart.
    Bad(usize),
}

/// An in-memory styled text buffer.
///
/// # Example
///
/// ```rust
/// use editor_surface::{StyledTextBuffer, TextBuffer};
///
/// let mut buffer = TextBuffer::new("fn main() {}\n");
/// assert_eq!(buffer.line_count(), 2);
/// assert_eq!(buffer.brace_match(7), Some(8));
/// buffer.insert_text(Some(0), "pub ");
/// assert_eq!(buffer.text(), "pub fn main() {}\n");
/// ```
pub struct TextBuffer {
    rope: Rope,
    styles: Vec<StyleId>,
    end_styled: usize,
    lexer: Option<Box<dyn Lexer>>,
    lexer_kind: LexerKind,
    string_styles: XmlStringStyles,
    folds: FoldingManager,
    markers: Vec<u32>,
    indicators: BTreeMap<IndicatorKind, IntervalSet>,
    indicator_styles: BTreeMap<IndicatorKind, IndicatorStyle>,
    selections: Vec<SelectionRange>,
    selection_mode: SelectionMode,
    undo: UndoRedoManager,
    line_ending: LineEnding,
    tab_width: usize,
    use_tabs: bool,
    indent_guides: IndentGuides,
    highlight_guide: usize,
    brace_light: BraceLight,
    first_visible_line: usize,
    lines_on_screen: usize,
    x_offset: usize,
    scroll_width: usize,
    wrap_mode: WrapMode,
    caret_x: Option<usize>,
    flat: RefCell<Option<String>>,
    finder: RefCell<Option<Finder>>,
}

impl TextBuffer {
    /// Create an unstyled buffer holding `text`.
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let lines = rope.len_lines();
        Self {
            styles: vec![0; text.len()],
            end_styled: 0,
            lexer: None,
            lexer_kind: LexerKind::Null,
            string_styles: XmlStringStyles::default(),
            folds: FoldingManager::new(lines),
            markers: vec![0; lines],
            indicators: BTreeMap::new(),
            indicator_styles: BTreeMap::new(),
            selections: vec![SelectionRange::caret_at(0)],
            selection_mode: SelectionMode::Stream,
            undo: UndoRedoManager::new(MAX_UNDO),
            line_ending: LineEnding::detect_in_text(text),
            tab_width: 4,
            use_tabs: true,
            indent_guides: IndentGuides::LookBoth,
            highlight_guide: 0,
            brace_light: BraceLight::None,
            first_visible_line: 0,
            lines_on_screen: 40,
            x_offset: 0,
            scroll_width: 2000,
            wrap_mode: WrapMode::None,
            caret_x: None,
            flat: RefCell::new(None),
            finder: RefCell::new(None),
            rope,
        }
    }

    /// Create a buffer with `lexer` attached and the whole text styled.
    pub fn with_lexer(text: &str, lexer: Box<dyn Lexer>) -> Self {
        let mut buffer = Self::new(text);
        buffer.set_lexer(lexer);
        buffer.colourise(0, None);
        buffer
    }

    /// Attach a lexer. Nothing is styled until the next [`StyledTextBuffer::colourise`].
    pub fn set_lexer(&mut self, lexer: Box<dyn Lexer>) {
        self.lexer_kind = lexer.kind();
        self.string_styles = lexer.string_styles();
        self.lexer = Some(lexer);
        self.end_styled = 0;
    }

    /// Declare the lexer identity for a buffer that is styled by its host.
    pub fn set_lexer_kind(&mut self, kind: LexerKind) {
        self.lexer = None;
        self.lexer_kind = kind;
    }

    /// Override the string/CDATA style ids reported to the tag scanner.
    pub fn set_string_styles(&mut self, styles: XmlStringStyles) {
        self.string_styles = styles;
    }

    /// Apply host-computed styles starting at `start`.
    pub fn set_styling(&mut self, start: usize, styles: &[StyleId]) -> Result<(), BufferError> {
        let end = start + styles.len();
        if end > self.len() {
            return Err(BufferError::StyleLength {
                styles: styles.len(),
                text: self.len().saturating_sub(start),
            });
        }
        self.styles[start..end].copy_from_slice(styles);
        self.end_styled = self.end_styled.max(end);
        Ok(())
    }

    /// Apply a host-computed fold level.
    pub fn set_fold_level(&mut self, line: usize, level: FoldLevel) -> Result<(), BufferError> {
        if line >= self.line_count() {
            return Err(BufferError::InvalidLine(line));
        }
        self.folds.set_level(line, level);
        Ok(())
    }

    /// Apply host-computed fold levels for the first `levels.len()` lines.
    pub fn set_fold_levels(&mut self, levels: &[FoldLevel]) {
        self.folds.replace_levels(levels);
    }

    /// Whole text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Newline sequence used by [`StyledTextBuffer::new_line`].
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Change the newline sequence used for new lines.
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// Set the height of the view in lines.
    pub fn set_lines_on_screen(&mut self, lines: usize) {
        self.lines_on_screen = lines.max(1);
    }

    /// Set the soft wrapping mode.
    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    /// Current brace highlight.
    pub fn brace_light(&self) -> BraceLight {
        self.brace_light
    }

    /// Column of the highlighted indentation guide (`0` = none).
    pub fn highlight_guide(&self) -> usize {
        self.highlight_guide
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Checked [`StyledTextBuffer::insert_text`].
    pub fn try_insert_text(&mut self, pos: usize, text: &str) -> Result<(), BufferError> {
        if !self.is_char_boundary(pos) {
            return Err(BufferError::InvalidOffset(pos));
        }
        self.insert_text(Some(pos), text);
        Ok(())
    }

    /// Checked [`StyledTextBuffer::delete_range`].
    pub fn try_delete_range(&mut self, range: Range<usize>) -> Result<(), BufferError> {
        if range.start > range.end
            || !self.is_char_boundary(range.start)
            || !self.is_char_boundary(range.end)
        {
            return Err(BufferError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        self.delete_range(range);
        Ok(())
    }

    /// Checked [`StyledTextBuffer::position_from_line`].
    pub fn try_position_from_line(&self, line: usize) -> Result<usize, BufferError> {
        if line >= self.line_count() {
            return Err(BufferError::InvalidLine(line));
        }
        Ok(self.position_from_line(line))
    }

    fn is_char_boundary(&self, pos: usize) -> bool {
        pos <= self.len() && self.floor_char_boundary(pos) == pos
    }

    fn floor_char_boundary(&self, pos: usize) -> usize {
        let pos = pos.min(self.len());
        self.rope.char_to_byte(self.rope.byte_to_char(pos))
    }

    fn with_flat_text<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let mut cache = self.flat.borrow_mut();
        let text = cache.get_or_insert_with(|| self.rope.to_string());
        f(text)
    }

    fn main_selection(&self) -> SelectionRange {
        self.selections
            .last()
            .copied()
            .unwrap_or(SelectionRange::caret_at(0))
    }

    fn main_selection_mut(&mut self) -> &mut SelectionRange {
        if self.selections.is_empty() {
            self.selections.push(SelectionRange::caret_at(0));
        }
        let last = self.selections.len() - 1;
        &mut self.selections[last]
    }

    fn indentation_text(&self, indent: usize) -> String {
        if self.use_tabs {
            let mut text = "\t".repeat(indent / self.tab_width);
            text.push_str(&" ".repeat(indent % self.tab_width));
            text
        } else {
            " ".repeat(indent)
        }
    }

    /// Offset on `line` closest to display column `column`, without passing the line end.
    fn position_at_column(&self, line: usize, column: usize) -> usize {
        let start = self.position_from_line(line);
        let end = self.line_end_position(line);
        let mut col = 0;
        let mut pos = start;
        for ch in self.text_range(start, end).chars() {
            let next = if ch == '\t' {
                (col / self.tab_width + 1) * self.tab_width
            } else {
                col + 1
            };
            if next > column {
                break;
            }
            col = next;
            pos += ch.len_utf8();
        }
        pos
    }

    fn scroll_caret_into_view(&mut self) {
        let line = self.line_from_position(self.current_pos());
        let visible = self.visible_from_doc_line(line);
        if visible < self.first_visible_line {
            self.first_visible_line = visible;
        } else if visible >= self.first_visible_line + self.lines_on_screen {
            self.first_visible_line = visible + 1 - self.lines_on_screen;
        }
    }

    // ----- raw edits (not recorded) -----

    fn raw_insert(&mut self, pos: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let pos = self.floor_char_boundary(pos);
        let line = self.rope.byte_to_line(pos);
        let at_line_start = pos == self.rope.line_to_byte(line);
        let lines_before = self.rope.len_lines();

        self.rope.insert(self.rope.byte_to_char(pos), text);
        self.flat.get_mut().take();

        let len = text.len();
        self.styles.splice(pos..pos, std::iter::repeat_n(0, len));
        self.end_styled = self.end_styled.min(pos);

        let added = self.rope.len_lines().saturating_sub(lines_before);
        if added > 0 {
            self.folds.insert_lines(line, added);
            // Markers follow their text: a split at the line start pushes them down.
            let at = if at_line_start { line } else { line + 1 };
            let at = at.min(self.markers.len());
            self.markers.splice(at..at, std::iter::repeat_n(0, added));
        }

        for set in self.indicators.values_mut() {
            set.update_for_insertion(pos, len);
        }
        for sel in &mut self.selections {
            shift_for_insert(sel, pos, len);
        }
    }

    fn raw_delete(&mut self, range: Range<usize>) -> String {
        let start = self.floor_char_boundary(range.start);
        let end = self.floor_char_boundary(range.end);
        if start >= end {
            return String::new();
        }
        let first_line = self.rope.byte_to_line(start);
        let lines_before = self.rope.len_lines();
        let deleted = self.text_range(start, end);

        self.rope
            .remove(self.rope.byte_to_char(start)..self.rope.byte_to_char(end));
        self.flat.get_mut().take();

        self.styles.drain(start..end);
        self.end_styled = self.end_styled.min(start);

        let removed = lines_before.saturating_sub(self.rope.len_lines());
        if removed > 0 {
            self.folds.remove_lines(first_line + 1, removed);
            let from = (first_line + 1).min(self.markers.len());
            let to = (first_line + 1 + removed).min(self.markers.len());
            let merged = self.markers.drain(from..to).fold(0, |acc, m| acc | m);
            if let Some(slot) = self.markers.get_mut(first_line) {
                *slot |= merged;
            }
        }

        for set in self.indicators.values_mut() {
            set.update_for_deletion(start, end);
        }
        for sel in &mut self.selections {
            sel.anchor = shift_for_delete(sel.anchor, start, end);
            sel.caret = shift_for_delete(sel.caret, start, end);
        }
        deleted
    }

    /// Replace `range` by `text` as one undo step.
    fn replace(&mut self, range: Range<usize>, text: &str) {
        let start = self.floor_char_boundary(range.start);
        let end = self.floor_char_boundary(range.end.max(range.start));
        if start == end && text.is_empty() {
            return;
        }
        let before_selection = self.selections.clone();
        let deleted = self.raw_delete(start..end);
        self.raw_insert(start, text);
        let after_selection = self.selections.clone();
        self.undo.push_step(UndoStep::new(
            TextEdit {
                pos: start,
                deleted,
                inserted: text.to_string(),
            },
            before_selection,
            after_selection,
        ));
    }
}

fn shift_for_insert(sel: &mut SelectionRange, pos: usize, len: usize) {
    if sel.is_empty() {
        if sel.caret > pos {
            sel.caret += len;
            sel.anchor += len;
        }
        return;
    }
    // The lower end moves when text lands on it, so the selected text stays selected.
    let anchor_is_start = sel.anchor < sel.caret;
    let start = if sel.start() >= pos { sel.start() + len } else { sel.start() };
    let end = if sel.end() > pos { sel.end() + len } else { sel.end() };
    if anchor_is_start {
        sel.anchor = start;
        sel.caret = end;
    } else {
        sel.caret = start;
        sel.anchor = end;
    }
}

fn shift_for_delete(pos: usize, start: usize, end: usize) -> usize {
    if pos <= start {
        pos
    } else if pos >= end {
        pos - (end - start)
    } else {
        start
    }
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("len", &self.len())
            .field("lines", &self.line_count())
            .field("lexer", &self.lexer_kind)
            .field("end_styled", &self.end_styled)
            .field("selections", &self.selections)
            .finish_non_exhaustive()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl StyledTextBuffer for TextBuffer {
    fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    fn char_at(&self, pos: usize) -> Option<u8> {
        (pos < self.len()).then(|| self.rope.byte(pos))
    }

    fn style_at(&self, pos: usize) -> StyleId {
        self.styles.get(pos).copied().unwrap_or(0)
    }

    fn text_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len());
        let start = start.min(end);
        let s = self.rope.byte_to_char(start);
        let e = self.rope.byte_to_char(end);
        self.rope.slice(s..e).to_string()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_from_position(&self, pos: usize) -> usize {
        self.rope.byte_to_line(pos.min(self.len()))
    }

    fn position_from_line(&self, line: usize) -> usize {
        if line >= self.line_count() {
            self.len()
        } else {
            self.rope.line_to_byte(line)
        }
    }

    fn line_end_position(&self, line: usize) -> usize {
        let start = self.position_from_line(line);
        let mut end = self.position_from_line(line + 1);
        if end > start && self.char_at(end - 1) == Some(b'\n') {
            end -= 1;
        }
        if end > start && self.char_at(end - 1) == Some(b'\r') {
            end -= 1;
        }
        end
    }

    fn line_length(&self, line: usize) -> usize {
        self.position_from_line(line + 1) - self.position_from_line(line)
    }

    fn column(&self, pos: usize) -> usize {
        let pos = pos.min(self.len());
        let start = self.position_from_line(self.line_from_position(pos));
        self.text_range(start, pos).chars().fold(0, |col, ch| {
            if ch == '\t' {
                (col / self.tab_width + 1) * self.tab_width
            } else {
                col + 1
            }
        })
    }

    fn line_indentation(&self, line: usize) -> usize {
        if line >= self.line_count() {
            return 0;
        }
        let mut col = 0;
        for byte in self.rope.line(line).bytes() {
            match byte {
                b' ' => col += 1,
                b'\t' => col = (col / self.tab_width + 1) * self.tab_width,
                _ => break,
            }
        }
        col
    }

    fn tab_width(&self) -> usize {
        self.tab_width
    }

    fn use_tabs(&self) -> bool {
        self.use_tabs
    }

    fn set_tab_width(&mut self, width: usize) {
        self.tab_width = width.max(1);
    }

    fn set_use_tabs(&mut self, use_tabs: bool) {
        self.use_tabs = use_tabs;
    }

    fn current_pos(&self) -> usize {
        self.main_selection().caret
    }

    fn anchor(&self) -> usize {
        self.main_selection().anchor
    }

    fn set_sel(&mut self, anchor: Option<usize>, caret: usize) {
        let caret = self.floor_char_boundary(caret);
        let anchor = anchor.map_or(caret, |a| self.floor_char_boundary(a));
        self.selections = vec![SelectionRange { anchor, caret }];
        self.caret_x = None;
    }

    fn set_anchor(&mut self, pos: usize) {
        let pos = self.floor_char_boundary(pos);
        self.main_selection_mut().anchor = pos;
    }

    fn set_current_pos(&mut self, pos: usize) {
        let pos = self.floor_char_boundary(pos);
        self.main_selection_mut().caret = pos;
        self.caret_x = None;
    }

    fn goto_pos(&mut self, pos: usize) {
        self.set_sel(None, pos);
        self.scroll_caret_into_view();
    }

    fn char_left(&mut self) {
        let caret = self.current_pos();
        let pos = if caret == 0 {
            0
        } else {
            self.floor_char_boundary(caret - 1)
        };
        self.set_sel(None, pos);
    }

    fn line_up(&mut self) {
        let caret = self.current_pos();
        let line = self.line_from_position(caret);
        if line == 0 {
            return;
        }
        let column = self.caret_x.unwrap_or_else(|| self.column(caret));
        let pos = self.position_at_column(line - 1, column);
        self.set_sel(None, pos);
        self.caret_x = Some(column);
        self.scroll_caret_into_view();
    }

    fn line_end(&mut self) {
        let line = self.line_from_position(self.current_pos());
        let pos = self.line_end_position(line);
        self.set_sel(None, pos);
    }

    fn add_selection(&mut self, caret: usize, anchor: usize) {
        let caret = self.floor_char_boundary(caret);
        let anchor = self.floor_char_boundary(anchor);
        let range = SelectionRange { anchor, caret };
        self.selections.retain(|s| *s != range);
        self.selections.push(range);
    }

    fn selections(&self) -> Vec<SelectionRange> {
        self.selections.clone()
    }

    fn cancel(&mut self) {
        let main = self.main_selection();
        self.selections = vec![main];
    }

    fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
    }

    fn insert_text(&mut self, pos: Option<usize>, text: &str) {
        let pos = pos.unwrap_or_else(|| self.current_pos());
        self.replace(pos..pos, text);
    }

    fn delete_range(&mut self, range: Range<usize>) {
        self.replace(range, "");
    }

    fn add_text(&mut self, text: &str) {
        let pos = self.current_pos();
        self.replace(pos..pos, text);
        self.set_sel(None, pos + text.len());
        self.scroll_caret_into_view();
    }

    fn new_line(&mut self) {
        let start = self.selection_start();
        let end = self.selection_end();
        let eol = self.line_ending.as_str();
        self.replace(start..end, eol);
        self.set_sel(None, start + eol.len());
        self.scroll_caret_into_view();
    }

    fn tab(&mut self) {
        if self.use_tabs {
            self.add_text("\t");
        } else {
            let column = self.column(self.current_pos());
            let spaces = self.tab_width - column % self.tab_width;
            self.add_text(&" ".repeat(spaces));
        }
    }

    fn set_line_indentation(&mut self, line: usize, indent: usize) {
        if line >= self.line_count() {
            return;
        }
        let start = self.position_from_line(line);
        let line_end = self.line_end_position(line);
        let mut ws_end = start;
        while ws_end < line_end && matches!(self.char_at(ws_end), Some(b' ' | b'\t')) {
            ws_end += 1;
        }
        let indentation = self.indentation_text(indent);
        if self.text_range(start, ws_end) != indentation {
            self.replace(start..ws_end, &indentation);
        }
    }

    fn begin_undo_action(&mut self) {
        self.undo.begin_group();
    }

    fn end_undo_action(&mut self) {
        self.undo.end_group();
    }

    fn undo(&mut self) -> bool {
        let Some(steps) = self.undo.pop_undo_group() else {
            return false;
        };
        for step in &steps {
            let edit = &step.edit;
            self.raw_delete(edit.pos..edit.pos + edit.inserted.len());
            self.raw_insert(edit.pos, &edit.deleted);
        }
        if let Some(oldest) = steps.last() {
            self.selections = oldest.before_selection.clone();
        }
        self.undo.push_undone(steps);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(steps) = self.undo.pop_redo_group() else {
            return false;
        };
        for step in &steps {
            let edit = &step.edit;
            self.raw_delete(edit.pos..edit.pos + edit.deleted.len());
            self.raw_insert(edit.pos, &edit.inserted);
        }
        if let Some(newest) = steps.last() {
            self.selections = newest.after_selection.clone();
        }
        self.undo.push_redone(steps);
        true
    }

    fn find_text(
        &self,
        needle: &str,
        start: usize,
        end: usize,
        flags: FindFlags,
    ) -> Option<Range<usize>> {
        self.with_flat_text(|text| {
            let mut finder = self.finder.borrow_mut();
            if !finder.as_ref().is_some_and(|f| f.is_for(needle, flags)) {
                *finder = Finder::new(needle, flags);
            }
            finder.as_ref()?.find(text, start, end)
        })
    }

    fn fill_indicator(&mut self, kind: IndicatorKind, range: Range<usize>) {
        let end = range.end.min(self.len());
        self.indicators
            .entry(kind)
            .or_default()
            .fill(range.start, end);
    }

    fn clear_indicator(&mut self, kind: IndicatorKind, range: Range<usize>) {
        if let Some(set) = self.indicators.get_mut(&kind) {
            set.clear(range.start, range.end);
        }
    }

    fn indicator_ranges(&self, kind: IndicatorKind) -> Vec<IndicatorRange> {
        self.indicators
            .get(&kind)
            .map(|set| {
                set.intervals()
                    .iter()
                    .map(|i| IndicatorRange::new(kind, i.start, i.end - i.start))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn indicator_style(&self, kind: IndicatorKind) -> IndicatorStyle {
        self.indicator_styles
            .get(&kind)
            .copied()
            .unwrap_or_else(|| IndicatorStyle::default_for(kind))
    }

    fn set_indicator_alpha(&mut self, kind: IndicatorKind, alpha: u8) {
        self.indicator_styles
            .entry(kind)
            .or_insert_with(|| IndicatorStyle::default_for(kind))
            .alpha = alpha;
    }

    fn brace_highlight(&mut self, a: Option<usize>, b: Option<usize>) {
        self.brace_light = match (a, b) {
            (Some(a), Some(b)) => BraceLight::Matched(a, b),
            _ => BraceLight::None,
        };
    }

    fn brace_bad_light(&mut self, pos: Option<usize>) {
        self.brace_light = pos.map_or(BraceLight::None, BraceLight::Bad);
    }

    fn set_highlight_guide(&mut self, column: usize) {
        self.highlight_guide = column;
    }

    fn indentation_guides(&self) -> IndentGuides {
        self.indent_guides
    }

    fn set_indentation_guides(&mut self, guides: IndentGuides) {
        self.indent_guides = guides;
    }

    fn brace_match(&self, pos: usize) -> Option<usize> {
        let brace = self.char_at(pos)?;
        if !is_brace(brace) {
            return None;
        }
        let (seek, forward) = match closing_brace(brace) {
            Some(close) => (close, true),
            None => match brace {
                b')' => (b'(', false),
                b']' => (b'[', false),
                _ => (b'{', false),
            },
        };
        let style = self.style_at(pos);
        let counts = |p: usize| p >= self.end_styled || self.styles[p] == style;

        let mut depth = 1usize;
        if forward {
            let mut p = pos + 1;
            for byte in self.rope.bytes_at(pos + 1) {
                if (byte == brace || byte == seek) && counts(p) {
                    if byte == brace {
                        depth += 1;
                    } else {
                        depth -= 1;
                        if depth == 0 {
                            return Some(p);
                        }
                    }
                }
                p += 1;
            }
        } else {
            let mut bytes = self.rope.bytes_at(pos);
            let mut p = pos;
            while let Some(byte) = bytes.prev() {
                p -= 1;
                if (byte == brace || byte == seek) && counts(p) {
                    if byte == brace {
                        depth += 1;
                    } else {
                        depth -= 1;
                        if depth == 0 {
                            return Some(p);
                        }
                    }
                }
            }
        }
        None
    }

    fn fold_level(&self, line: usize) -> FoldLevel {
        self.folds.level(line)
    }

    fn fold_parent(&self, line: usize) -> Option<usize> {
        self.folds.parent(line)
    }

    fn fold_expanded(&self, line: usize) -> bool {
        self.folds.is_expanded(line)
    }

    fn toggle_fold(&mut self, line: usize) {
        self.folds.toggle(line);
    }

    fn contracted_fold_next(&self, from: usize) -> Option<usize> {
        self.folds.contracted_next(from)
    }

    fn last_child(&self, line: usize) -> usize {
        self.folds.last_child(line)
    }

    fn ensure_visible(&mut self, line: usize) {
        self.folds.ensure_visible(line);
    }

    fn line_visible(&self, line: usize) -> bool {
        self.folds.is_visible(line)
    }

    fn visible_from_doc_line(&self, line: usize) -> usize {
        self.folds.visible_from_doc_line(line)
    }

    fn doc_line_from_visible(&self, visible: usize) -> usize {
        self.folds.doc_line_from_visible(visible)
    }

    fn lexer(&self) -> LexerKind {
        self.lexer_kind
    }

    fn string_styles(&self) -> XmlStringStyles {
        self.string_styles
    }

    fn end_styled(&self) -> usize {
        self.end_styled
    }

    fn colourise(&mut self, start: usize, end: Option<usize>) {
        let len = self.len();
        let end = end.unwrap_or(len).min(len);
        let start = start.min(self.end_styled).min(end);
        let styling = match &self.lexer {
            Some(lexer) => self.with_flat_text(|text| lexer.lex(text)),
            None => {
                self.end_styled = self.end_styled.max(end);
                return;
            }
        };

        let styled = end.min(styling.styles.len());
        if start < styled {
            self.styles[start..styled].copy_from_slice(&styling.styles[start..styled]);
        }
        let lines = if end >= len {
            self.line_count()
        } else {
            self.line_from_position(end) + 1
        };
        let lines = lines.min(styling.fold_levels.len());
        self.folds.replace_levels(&styling.fold_levels[..lines]);
        self.end_styled = self.end_styled.max(end);
        trace!(start, end, lines, "colourised");
    }

    fn first_visible_line(&self) -> usize {
        self.first_visible_line
    }

    fn set_first_visible_line(&mut self, line: usize) {
        let total = self.visible_from_doc_line(self.line_count());
        self.first_visible_line = line.min(total.saturating_sub(1));
    }

    fn lines_on_screen(&self) -> usize {
        self.lines_on_screen
    }

    fn line_scroll(&mut self, lines: isize) {
        let target = self.first_visible_line.saturating_add_signed(lines);
        self.set_first_visible_line(target);
    }

    fn x_offset(&self) -> usize {
        self.x_offset
    }

    fn set_x_offset(&mut self, offset: usize) {
        self.x_offset = offset;
    }

    fn scroll_width(&self) -> usize {
        self.scroll_width
    }

    fn set_scroll_width(&mut self, width: usize) {
        self.scroll_width = width;
    }

    fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    fn choose_caret_x(&mut self) {
        self.caret_x = Some(self.column(self.current_pos()));
    }

    fn marker_get(&self, line: usize) -> u32 {
        self.markers.get(line).copied().unwrap_or(0)
    }

    fn marker_add(&mut self, line: usize, marker: u32) {
        if let Some(slot) = self.markers.get_mut(line) {
            *slot |= 1 << (marker % 32);
        }
    }

    fn marker_delete(&mut self, line: usize, marker: u32) {
        if let Some(slot) = self.markers.get_mut(line) {
            *slot &= !(1 << (marker % 32));
        }
    }

    fn marker_next(&self, from: usize, mask: u32) -> Option<usize> {
        (from..self.markers.len()).find(|&line| self.markers[line] & mask != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines() {
        let buffer = TextBuffer::new("ab\r\ncd\ref\n");
        assert_eq!(buffer.line_count(), 4);
        assert_eq!(buffer.position_from_line(1), 4);
        assert_eq!(buffer.line_end_position(0), 2);
        assert_eq!(buffer.line_end_position(1), 6);
        assert_eq!(buffer.line_length(0), 4);
        assert_eq!(buffer.line_from_position(7), 2);
        assert_eq!(buffer.position_from_line(99), buffer.len());
        assert_eq!(buffer.try_position_from_line(99), Err(BufferError::InvalidLine(99)));
    }

    #[test]
    fn test_column_and_indentation() {
        let buffer = TextBuffer::new("\t  x\n  \ty");
        assert_eq!(buffer.column(3), 6);
        assert_eq!(buffer.line_indentation(0), 6);
        assert_eq!(buffer.line_indentation(1), 4);
    }

    #[test]
    fn test_re_adding_selection_makes_it_main() {
        let mut buffer = TextBuffer::new("one two");
        buffer.set_sel(Some(0), 3);
        buffer.add_selection(7, 4);
        buffer.add_selection(3, 0);
        let selections: Vec<_> = buffer
            .selections()
            .iter()
            .map(|s| (s.anchor, s.caret))
            .collect();
        assert_eq!(selections, vec![(4, 7), (0, 3)]);
        assert_eq!(buffer.current_pos(), 3);
    }

    #[test]
    fn test_set_line_indentation() {
        let mut buffer = TextBuffer::new("  a\nb");
        buffer.set_line_indentation(0, 6);
        assert_eq!(buffer.text(), "\t  a\nb");
        buffer.set_use_tabs(false);
        buffer.set_line_indentation(1, 4);
        assert_eq!(buffer.text(), "\t  a\n    b");
    }

    #[test]
    fn test_insert_keeps_caret() {
        let mut buffer = TextBuffer::new("abc");
        buffer.set_sel(None, 1);
        buffer.insert_text(None, "X");
        assert_eq!(buffer.text(), "aXbc");
        assert_eq!(buffer.current_pos(), 1);
        buffer.add_text("Y");
        assert_eq!(buffer.text(), "aYXbc");
        assert_eq!(buffer.current_pos(), 2);
    }

    #[test]
    fn test_selection_start_moves_on_insert() {
        let mut buffer = TextBuffer::new("abcd");
        buffer.set_sel(Some(1), 3);
        buffer.insert_text(Some(1), "(");
        assert_eq!(buffer.selected_text(), "bc");
        buffer.insert_text(Some(4), ")");
        assert_eq!(buffer.text(), "a(bc)d");
        assert_eq!(buffer.selected_text(), "bc");
    }

    #[test]
    fn test_undo_group() {
        let mut buffer = TextBuffer::new("x");
        buffer.set_sel(None, 1);
        buffer.begin_undo_action();
        buffer.add_text("{");
        buffer.add_text("}");
        buffer.char_left();
        buffer.end_undo_action();
        assert_eq!(buffer.text(), "x{}");
        assert_eq!(buffer.current_pos(), 2);

        assert!(buffer.undo());
        assert_eq!(buffer.text(), "x");
        assert_eq!(buffer.current_pos(), 1);
        assert!(!buffer.undo());

        assert!(buffer.redo());
        assert_eq!(buffer.text(), "x{}");
    }

    #[test]
    fn test_brace_match_nesting() {
        let buffer = TextBuffer::new("{{}}");
        assert_eq!(buffer.brace_match(0), Some(3));
        assert_eq!(buffer.brace_match(1), Some(2));
        assert_eq!(buffer.brace_match(3), Some(0));
        assert_eq!(buffer.brace_match(2), Some(1));
        assert_eq!(TextBuffer::new("(]").brace_match(0), None);
    }

    #[test]
    fn test_brace_match_respects_style() {
        let mut buffer = TextBuffer::new("{\"}\"}");
        buffer.set_styling(0, &[10, 6, 6, 6, 10]).unwrap();
        assert_eq!(buffer.brace_match(0), Some(4));
    }

    #[test]
    fn test_indicators_follow_edits() {
        let mut buffer = TextBuffer::new("hello world");
        buffer.fill_indicator(IndicatorKind::SelectionMark, 6..11);
        buffer.insert_text(Some(0), ">> ");
        assert_eq!(
            buffer.indicator_ranges(IndicatorKind::SelectionMark),
            vec![IndicatorRange::new(IndicatorKind::SelectionMark, 9, 5)]
        );
        buffer.clear_indicator(IndicatorKind::SelectionMark, 0..buffer.len());
        assert!(buffer.indicator_ranges(IndicatorKind::SelectionMark).is_empty());
    }

    #[test]
    fn test_markers_follow_lines() {
        let mut buffer = TextBuffer::new("a\nb\nc");
        buffer.marker_add(1, 24);
        buffer.insert_text(Some(2), "new\n");
        assert_eq!(buffer.marker_next(0, 1 << 24), Some(2));
        // Markers of deleted lines merge into the line the deletion starts on.
        buffer.delete_range(2..8);
        assert_eq!(buffer.text(), "a\nc");
        assert_eq!(buffer.marker_next(0, 1 << 24), Some(1));
    }

    #[test]
    fn test_find_text_uses_current_text() {
        let mut buffer = TextBuffer::new("one two");
        assert_eq!(buffer.find_text("two", 0, 7, FindFlags::default()), Some(4..7));
        buffer.insert_text(Some(0), "two ");
        assert_eq!(buffer.find_text("two", 0, 11, FindFlags::default()), Some(0..3));
    }

    #[test]
    fn test_checked_edits() {
        let mut buffer = TextBuffer::new("é");
        assert_eq!(buffer.try_insert_text(1, "x"), Err(BufferError::InvalidOffset(1)));
        assert_eq!(
            buffer.try_delete_range(2..1),
            Err(BufferError::InvalidRange { start: 2, end: 1 })
        );
        assert!(buffer.try_insert_text(2, "x").is_ok());
        assert_eq!(buffer.text(), "éx");
    }

    #[test]
    fn test_line_up_and_end() {
        let mut buffer = TextBuffer::new("abcdef\nxy");
        buffer.set_sel(None, 9);
        buffer.line_up();
        assert_eq!(buffer.current_pos(), 2);
        buffer.line_end();
        assert_eq!(buffer.current_pos(), 6);
    }
}
