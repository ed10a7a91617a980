//! The styled text buffer capability interface.
//!
//! Everything the editor surface needs from an editing component is expressed by
//! [`StyledTextBuffer`]: byte-offset reads, per-byte lexical styles, line arithmetic, selection,
//! mutation with atomic undo grouping, literal search, indicator layers, fold and marker queries
//! and a little view state. A native widget binding implements it by forwarding calls; hosts
//! without one (and every test) use [`crate::TextBuffer`].
//!
//! Offsets are byte offsets. Positions that a native widget reports as `-1` are `Option` here.

use std::ops::Range;

use editor_surface_lang::{LexerKind, StyleId, XmlStringStyles};

use crate::decorations::{IndicatorKind, IndicatorRange, IndicatorStyle};
use crate::intervals::FoldLevel;
use crate::search::FindFlags;

/// How a selection is extended by the keyboard/mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Character stream.
    #[default]
    Stream,
    /// Rectangular (column) selection.
    Rectangle,
    /// Whole lines.
    Lines,
    /// Zero-width rectangular selection.
    Thin,
}

/// Soft wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// No wrapping; horizontal scrolling applies.
    #[default]
    None,
    /// Wrap at word boundaries.
    Word,
    /// Wrap at any character.
    Char,
}

/// Indentation guide drawing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentGuides {
    /// No guides.
    None,
    /// Guides inside real indentation only.
    Real,
    /// Guides extend forward over blank lines.
    LookForward,
    /// Guides extend over blank lines in both directions.
    #[default]
    LookBoth,
}

impl IndentGuides {
    /// Parse a settings value (`"none"`, `"real"`, `"lookforward"`, `"lookboth"`).
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "0" => Self::None,
            "real" => Self::Real,
            "lookforward" => Self::LookForward,
            _ => Self::LookBoth,
        }
    }

    /// Returns `true` unless guides are off.
    pub fn enabled(self) -> bool {
        self != Self::None
    }
}

/// One selection range. The caret is the moving end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    /// Fixed end.
    pub anchor: usize,
    /// Moving end.
    pub caret: usize,
}

impl SelectionRange {
    /// A collapsed selection at `pos`.
    pub fn caret_at(pos: usize) -> Self {
        Self {
            anchor: pos,
            caret: pos,
        }
    }

    /// Lower end.
    pub fn start(&self) -> usize {
        self.anchor.min(self.caret)
    }

    /// Upper end.
    pub fn end(&self) -> usize {
        self.anchor.max(self.caret)
    }

    /// Returns `true` if anchor and caret coincide.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.caret
    }
}

/// Output of a [`Lexer`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Styling {
    /// One style per byte of the lexed text.
    pub styles: Vec<StyleId>,
    /// One fold level per line of the lexed text.
    pub fold_levels: Vec<FoldLevel>,
}

/// A lexer that can be attached to a [`crate::TextBuffer`].
pub trait Lexer {
    /// Identity reported by [`StyledTextBuffer::lexer`].
    fn kind(&self) -> LexerKind;

    /// Style `text` from the start.
    fn lex(&self, text: &str) -> Styling;

    /// Style ids of quoted attribute strings and CDATA for this lexer.
    fn string_styles(&self) -> XmlStringStyles {
        XmlStringStyles::default()
    }
}

/// The editing component as seen by the editor surface.
pub trait StyledTextBuffer {
    // ----- read -----

    /// Byte length of the document.
    fn len(&self) -> usize;

    /// Returns `true` for an empty document.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte at `pos`, `None` past the end.
    fn char_at(&self, pos: usize) -> Option<u8>;

    /// Lexical style of the byte at `pos` (`0` past the end).
    fn style_at(&self, pos: usize) -> StyleId;

    /// Text of `[start, end)`, clamped to the document.
    fn text_range(&self, start: usize, end: usize) -> String;

    /// Number of lines (an empty document has one).
    fn line_count(&self) -> usize;

    /// Line containing `pos`.
    fn line_from_position(&self, pos: usize) -> usize;

    /// Offset of the first byte of `line`; past the last line this is the document length.
    fn position_from_line(&self, line: usize) -> usize;

    /// Offset of the end of `line`, before its line break.
    fn line_end_position(&self, line: usize) -> usize;

    /// Length of `line` including its line break.
    fn line_length(&self, line: usize) -> usize;

    /// Display column of `pos` (tabs expand to tab stops).
    fn column(&self, pos: usize) -> usize;

    /// Indentation width of `line` in columns.
    fn line_indentation(&self, line: usize) -> usize;

    /// Tab stop width.
    fn tab_width(&self) -> usize;

    /// Returns `true` if indentation is made of tabs.
    fn use_tabs(&self) -> bool;

    /// Set the tab stop width (at least 1).
    fn set_tab_width(&mut self, width: usize);

    /// Choose between tab and space indentation.
    fn set_use_tabs(&mut self, use_tabs: bool);

    // ----- selection -----

    /// Caret offset of the main selection.
    fn current_pos(&self) -> usize;

    /// Anchor offset of the main selection.
    fn anchor(&self) -> usize;

    /// Lower end of the main selection.
    fn selection_start(&self) -> usize {
        self.current_pos().min(self.anchor())
    }

    /// Upper end of the main selection.
    fn selection_end(&self) -> usize {
        self.current_pos().max(self.anchor())
    }

    /// Returns `true` if every selection is empty.
    fn selection_empty(&self) -> bool {
        self.selections().iter().all(SelectionRange::is_empty)
    }

    /// Text of the main selection.
    fn selected_text(&self) -> String {
        self.text_range(self.selection_start(), self.selection_end())
    }

    /// Replace all selections by one; a `None` anchor collapses onto `caret`.
    fn set_sel(&mut self, anchor: Option<usize>, caret: usize);

    /// Move the anchor of the main selection.
    fn set_anchor(&mut self, pos: usize);

    /// Move the caret of the main selection, keeping the anchor.
    fn set_current_pos(&mut self, pos: usize);

    /// Collapse the selection at `pos` and scroll it into view.
    fn goto_pos(&mut self, pos: usize);

    /// Move the caret one character left, collapsing the selection.
    fn char_left(&mut self);

    /// Move the caret to the same column on the previous line.
    fn line_up(&mut self);

    /// Move the caret to the end of its line.
    fn line_end(&mut self);

    /// Add a selection; it becomes the main one.
    ///
    /// Adding a range that is already selected moves it to the main position instead of
    /// duplicating it.
    fn add_selection(&mut self, caret: usize, anchor: usize);

    /// Every selection, the main one last.
    fn selections(&self) -> Vec<SelectionRange>;

    /// Drop additional selections, keeping the main one.
    fn cancel(&mut self);

    /// Current selection mode.
    fn selection_mode(&self) -> SelectionMode;

    /// Change the selection mode.
    fn set_selection_mode(&mut self, mode: SelectionMode);

    // ----- mutation -----

    /// Insert `text` at `pos` (`None` = caret). The caret does not move.
    fn insert_text(&mut self, pos: Option<usize>, text: &str);

    /// Delete `range`.
    fn delete_range(&mut self, range: Range<usize>);

    /// Insert `text` at the caret and collapse the selection after it.
    fn add_text(&mut self, text: &str);

    /// Replace the selection with a line break.
    fn new_line(&mut self);

    /// Insert a tab (or spaces up to the next tab stop) at the caret.
    fn tab(&mut self);

    /// Replace the leading whitespace of `line` by `indent` columns of indentation.
    fn set_line_indentation(&mut self, line: usize, indent: usize);

    /// Open an undo group. Groups nest; only the outermost end closes it.
    fn begin_undo_action(&mut self);

    /// Close an undo group.
    fn end_undo_action(&mut self);

    /// Undo the last group. Returns `false` if there was nothing to undo.
    fn undo(&mut self) -> bool;

    /// Redo the last undone group.
    fn redo(&mut self) -> bool;

    // ----- search -----

    /// Literal search between `start` and `end`; `start > end` searches backward.
    ///
    /// A hit lies wholly inside `[min(start, end), max(start, end)]`. Forward searches return the
    /// lowest start, backward searches the highest.
    fn find_text(
        &self,
        needle: &str,
        start: usize,
        end: usize,
        flags: FindFlags,
    ) -> Option<Range<usize>>;

    // ----- decoration -----

    /// Add `range` to the layer `kind`.
    fn fill_indicator(&mut self, kind: IndicatorKind, range: Range<usize>);

    /// Remove `range` from the layer `kind`.
    fn clear_indicator(&mut self, kind: IndicatorKind, range: Range<usize>);

    /// All ranges of the layer `kind`, in offset order.
    fn indicator_ranges(&self, kind: IndicatorKind) -> Vec<IndicatorRange>;

    /// Appearance of the layer `kind`.
    fn indicator_style(&self, kind: IndicatorKind) -> IndicatorStyle;

    /// Change the fill alpha of the layer `kind`.
    fn set_indicator_alpha(&mut self, kind: IndicatorKind, alpha: u8);

    /// Highlight a brace pair (`None` clears).
    fn brace_highlight(&mut self, a: Option<usize>, b: Option<usize>);

    /// Highlight an unmatched brace (`None` clears).
    fn brace_bad_light(&mut self, pos: Option<usize>);

    /// Column of the highlighted indentation guide (`0` = none).
    fn set_highlight_guide(&mut self, column: usize);

    /// Indentation guide mode.
    fn indentation_guides(&self) -> IndentGuides;

    /// Set the indentation guide mode.
    fn set_indentation_guides(&mut self, guides: IndentGuides);

    /// Matching brace of the brace at `pos`.
    ///
    /// Nesting-aware, and only braces carrying the same style as the starting brace count.
    fn brace_match(&self, pos: usize) -> Option<usize>;

    // ----- folding -----

    /// Fold level of `line`.
    fn fold_level(&self, line: usize) -> FoldLevel;

    /// Nearest enclosing fold header of `line`.
    fn fold_parent(&self, line: usize) -> Option<usize>;

    /// Returns `true` unless `line` is a contracted header.
    fn fold_expanded(&self, line: usize) -> bool;

    /// Expand or contract the fold started by `line`.
    fn toggle_fold(&mut self, line: usize);

    /// First contracted header at or after `from`.
    fn contracted_fold_next(&self, from: usize) -> Option<usize>;

    /// Last line belonging to the fold started by `line`.
    fn last_child(&self, line: usize) -> usize;

    /// Expand every fold hiding `line`.
    fn ensure_visible(&mut self, line: usize);

    /// Returns `true` unless a contracted fold hides `line`.
    fn line_visible(&self, line: usize) -> bool;

    /// Display line of document line `line`.
    fn visible_from_doc_line(&self, line: usize) -> usize;

    /// Document line shown at display line `visible`.
    fn doc_line_from_visible(&self, visible: usize) -> usize;

    // ----- styling -----

    /// Lexer currently styling the document.
    fn lexer(&self) -> LexerKind;

    /// Style ids the tag scanner must not look inside, for the current lexer.
    fn string_styles(&self) -> XmlStringStyles {
        XmlStringStyles::default()
    }

    /// Styled watermark: bytes before this offset carry valid styles.
    fn end_styled(&self) -> usize;

    /// Style `[start, end)` now (`None` = to the end of the document).
    fn colourise(&mut self, start: usize, end: Option<usize>);

    // ----- view -----

    /// First display line shown.
    fn first_visible_line(&self) -> usize;

    /// Scroll so `line` is the first display line.
    fn set_first_visible_line(&mut self, line: usize);

    /// Number of fully visible display lines.
    fn lines_on_screen(&self) -> usize;

    /// Scroll vertically by `lines` display lines.
    fn line_scroll(&mut self, lines: isize);

    /// Horizontal scroll offset in pixels.
    fn x_offset(&self) -> usize;

    /// Set the horizontal scroll offset.
    fn set_x_offset(&mut self, offset: usize);

    /// Scrollable width in pixels.
    fn scroll_width(&self) -> usize;

    /// Set the scrollable width.
    fn set_scroll_width(&mut self, width: usize);

    /// Soft wrapping mode.
    fn wrap_mode(&self) -> WrapMode;

    /// Remember the caret's current column for vertical movement.
    fn choose_caret_x(&mut self);

    // ----- markers -----

    /// Marker bit set of `line`.
    fn marker_get(&self, line: usize) -> u32;

    /// Set marker number `marker` on `line`.
    fn marker_add(&mut self, line: usize, marker: u32);

    /// Clear marker number `marker` on `line`.
    fn marker_delete(&mut self, line: usize, marker: u32);

    /// First line at or after `from` with any of the `mask` bits set.
    fn marker_next(&self, from: usize, mask: u32) -> Option<usize>;
}
