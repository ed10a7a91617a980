//! The editor surface controller.
//!
//! [`EditorSurface`] sits between a host editing view and the engines of this crate. The host
//! forwards its notifications (caret moved, margin clicked, character typed, document switched,
//! timer fired) together with the buffer they concern, and drains [`SurfaceEvent`]s for the
//! repaints and chrome updates it has to perform.
//!
//! All decoration state is kept per document in a [`DocumentRecord`]; the timer queue, the mouse
//! cursor and the info banner belong to the view and are shared by every document shown in it.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::auto_insert::{AutoInsertEngine, Modifiers};
use crate::bookmarks;
use crate::brace::{self, BraceMode, BraceOptions, BraceState};
use crate::buffer::StyledTextBuffer;
use crate::config::{SettingsProvider, ViewSettings};
use crate::error::CaptureError;
use crate::overview::OverviewRuler;
use crate::regex_capture::{self, CaptureOptions, CaptureOutput};
use crate::scheduler::{Clock, TimerId, TimerQueue};
use crate::selected_word::{FindHighlight, SelectedWordState};
use crate::tag_match::{TagMatcher, XmlTagMatch};
use crate::view_position::{self, ViewPosition};

/// Host-assigned identifier of an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Wrap a host document number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Margins of the editing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginKind {
    /// Line numbers.
    LineNumber,
    /// Bookmark symbols.
    Symbol,
    /// Fold markers.
    Folding,
}

/// Something the host has to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The overview ruler of the active document changed and needs a repaint.
    OverviewChanged,
    /// Show (`true`) or hide the mouse cursor.
    CursorVisibility(bool),
    /// Show a transient info text, or remove it (`None`).
    InfoText(Option<String>),
    /// New width of the line-number margin in digits; `0` hides the margin.
    LineNumberWidth(usize),
}

/// Selection size summed over all selections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectedCount {
    /// Selected bytes.
    pub bytes: usize,
    /// Lines touched by selections.
    pub lines: usize,
}

/// Everything the surface remembers about one open document.
#[derive(Debug, Clone, Default)]
pub struct DocumentRecord {
    /// View state saved when the document was last deactivated.
    pub view_position: Option<ViewPosition>,
    /// Brace highlight state.
    pub braces: BraceState,
    /// Selected-word highlight state.
    pub selected_word: SelectedWordState,
    /// Scrollbar overview marks.
    pub overview: OverviewRuler,
    /// Keystroke insertion state.
    pub auto_insert: AutoInsertEngine,
}

/// Routes host notifications to the decoration, insertion and view engines.
pub struct EditorSurface {
    settings: Rc<dyn SettingsProvider>,
    clock: Rc<dyn Clock>,
    documents: BTreeMap<DocumentId, DocumentRecord>,
    active: Option<DocumentId>,
    timers: TimerQueue,
    events: Vec<SurfaceEvent>,
    find_highlight: FindHighlight,
    cursor_shown: bool,
    dark_theme: bool,
    line_number_width: Option<usize>,
}

impl std::fmt::Debug for EditorSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSurface")
            .field("document_count", &self.documents.len())
            .field("active", &self.active)
            .field("timers", &self.timers)
            .field("pending_events", &self.events.len())
            .field("cursor_shown", &self.cursor_shown)
            .finish()
    }
}

impl EditorSurface {
    /// Create a surface reading settings from `settings` and time from `clock`.
    pub fn new(settings: Rc<dyn SettingsProvider>, clock: Rc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            documents: BTreeMap::new(),
            active: None,
            timers: TimerQueue::new(),
            events: Vec::new(),
            find_highlight: FindHighlight::default(),
            cursor_shown: true,
            dark_theme: false,
            line_number_width: None,
        }
    }

    /// Tell the surface whether the current theme is dark.
    pub fn set_dark_theme(&mut self, dark: bool) {
        self.dark_theme = dark;
    }

    /// The current view settings.
    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings::load(self.settings.as_ref())
    }

    /// The active document, if any.
    pub fn active_document(&self) -> Option<DocumentId> {
        self.active
    }

    /// The record of a document the surface has seen.
    pub fn document(&self, id: DocumentId) -> Option<&DocumentRecord> {
        self.documents.get(&id)
    }

    /// The overview ruler of the active document.
    pub fn overview(&self) -> Option<&OverviewRuler> {
        self.active
            .and_then(|id| self.documents.get(&id))
            .map(|record| &record.overview)
    }

    /// Pending timers.
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Whether the mouse cursor is currently shown.
    pub fn cursor_shown(&self) -> bool {
        self.cursor_shown
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }

    fn cancel_brace_timers(&mut self) {
        self.timers.cancel(TimerId::BraceHighlight);
        self.timers.cancel(TimerId::BraceHighlightClear);
    }

    fn active_record(&mut self) -> Option<&mut DocumentRecord> {
        let id = self.active?;
        self.documents.get_mut(&id)
    }

    // ----- document lifecycle -----

    /// Show `id` in the view, restoring its saved view position.
    ///
    /// The previously active document has to be deactivated with its own buffer first, otherwise
    /// its view position is not saved. A restore that fails on inconsistent fold state is logged
    /// and otherwise ignored.
    pub fn activate_document(&mut self, id: DocumentId, buffer: &mut dyn StyledTextBuffer) {
        self.cancel_brace_timers();
        self.active = Some(id);

        self.apply_view_settings(buffer);
        let record = self.documents.entry(id).or_default();
        if let Some(saved) = record.view_position.take()
            && let Err(err) = saved.restore(buffer)
        {
            debug!(document = id.get(), %err, "view position not restored");
        }
        bookmarks::refresh_overview(&*buffer, &mut record.overview);
        record.overview.set_total_lines(buffer.line_count());
        self.update_line_number_width(&*buffer);
        self.emit(SurfaceEvent::OverviewChanged);
    }

    /// Save the view position of the active document and leave it.
    pub fn deactivate_document(&mut self, buffer: &dyn StyledTextBuffer) {
        let Some(id) = self.active.take() else {
            return;
        };
        self.cancel_brace_timers();
        let record = self.documents.entry(id).or_default();
        record.view_position = Some(ViewPosition::save(buffer));
    }

    /// Forget everything about `id`.
    pub fn close_document(&mut self, id: DocumentId) {
        self.documents.remove(&id);
        if self.active == Some(id) {
            self.active = None;
            self.cancel_brace_timers();
        }
    }

    // ----- notifications -----

    /// The caret or selection moved, or the content changed.
    pub fn on_caret_moved(&mut self, buffer: &mut dyn StyledTextBuffer) {
        // Matching reads styles, so style at least what is on screen.
        let last_visible = buffer.doc_line_from_visible(
            buffer.first_visible_line() + buffer.lines_on_screen(),
        );
        let visible_end = buffer
            .position_from_line(last_visible.saturating_add(1))
            .min(buffer.len());
        let styled = buffer.end_styled();
        if styled < visible_end {
            buffer.colourise(styled, Some(visible_end));
        }

        self.match_braces(buffer, BraceMode::Braces);
        self.match_tags(buffer);
        self.mark_selected_word(buffer, false, false);

        let current = buffer.visible_from_doc_line(buffer.line_from_position(buffer.current_pos()));
        if let Some(record) = self.active_record() {
            record.overview.set_total_lines(buffer.line_count());
            record.overview.set_current_line(current);
        }
        self.update_line_number_width(&*buffer);
    }

    /// A margin was clicked. Returns `true` if the click toggled a bookmark.
    pub fn on_margin_click(
        &mut self,
        buffer: &mut dyn StyledTextBuffer,
        margin: MarginKind,
        line: usize,
        modifiers: Modifiers,
    ) -> bool {
        if margin != MarginKind::Symbol || !modifiers.is_empty() {
            return false;
        }
        self.toggle_bookmark(buffer, Some(line));
        true
    }

    /// A character is about to be inserted. Returns `true` if the surface handled it.
    pub fn on_char_typed(
        &mut self,
        buffer: &mut dyn StyledTextBuffer,
        ch: char,
        modifiers: Modifiers,
    ) -> bool {
        let settings = self.view_settings();
        match self.active_record() {
            Some(record) => record.auto_insert.on_char_typed(buffer, ch, modifiers, &settings),
            None => false,
        }
    }

    /// Return was pressed. Returns `true` if the surface handled it.
    pub fn on_return_key(&mut self, buffer: &mut dyn StyledTextBuffer, modifiers: Modifiers) -> bool {
        match self.active_record() {
            Some(record) => record.auto_insert.on_return_key(buffer, modifiers),
            None => false,
        }
    }

    /// Run the handler of timer `id`. The timer is consumed.
    pub fn on_timer(&mut self, buffer: &mut dyn StyledTextBuffer, id: TimerId) {
        self.timers.cancel(id);
        trace!(timer = %id, "timer fired");
        match id {
            TimerId::BraceHighlight => {
                self.match_braces(buffer, BraceMode::Highlight);
            }
            TimerId::BraceHighlightClear => {
                self.match_braces(buffer, BraceMode::Clear);
            }
            TimerId::HideCursor => {
                if self.cursor_shown {
                    self.cursor_shown = false;
                    self.emit(SurfaceEvent::CursorVisibility(false));
                }
            }
            TimerId::InfoBanner => self.emit(SurfaceEvent::InfoText(None)),
        }
    }

    /// Fire every timer that is due at the clock's current time.
    pub fn tick(&mut self, buffer: &mut dyn StyledTextBuffer) {
        let now = self.clock.now();
        for id in self.timers.take_due(now) {
            self.on_timer(buffer, id);
        }
    }

    /// The mouse moved, clicked or scrolled: show the cursor and re-arm the hide timer.
    pub fn on_mouse_activity(&mut self) {
        if let Some(timeout) = self.view_settings().hide_cursor_timeout {
            self.timers
                .schedule(TimerId::HideCursor, timeout, self.clock.now());
        }
        if !self.cursor_shown {
            self.cursor_shown = true;
            self.emit(SurfaceEvent::CursorVisibility(true));
        }
    }

    // ----- decorations -----

    /// Run one brace-match pass on the active document.
    pub fn match_braces(&mut self, buffer: &mut dyn StyledTextBuffer, mode: BraceMode) -> bool {
        let view = self.apply_view_settings(buffer);
        let options = BraceOptions {
            highlight_text: view.brace_highlight_text,
            dark_theme: self.dark_theme,
        };
        let now = self.clock.now();
        let Some(id) = self.active else {
            return false;
        };
        let Some(record) = self.documents.get_mut(&id) else {
            return false;
        };
        record
            .braces
            .update(buffer, mode, options, &mut self.timers, now)
    }

    /// Highlight the XML/HTML tag pair around the caret.
    pub fn match_tags(&mut self, buffer: &mut dyn StyledTextBuffer) -> Option<XmlTagMatch> {
        self.apply_view_settings(buffer);
        TagMatcher::new(buffer.string_styles()).highlight(buffer)
    }

    /// Push the indentation settings into `buffer`.
    fn apply_view_settings(&self, buffer: &mut dyn StyledTextBuffer) -> ViewSettings {
        let view = self.view_settings();
        buffer.set_tab_width(view.tab_size);
        buffer.set_use_tabs(view.use_tabs);
        buffer.set_indentation_guides(view.indent_guides);
        view
    }

    /// Refresh selected-word marks; `clear` removes them, `edit` selects every occurrence.
    pub fn mark_selected_word(&mut self, buffer: &mut dyn StyledTextBuffer, clear: bool, edit: bool) {
        let Some(id) = self.active else {
            return;
        };
        let Some(record) = self.documents.get_mut(&id) else {
            return;
        };
        let changed = record.selected_word.mark(
            buffer,
            &mut record.overview,
            &self.find_highlight,
            self.clock.as_ref(),
            clear,
            edit,
        );
        if changed {
            self.emit(SurfaceEvent::OverviewChanged);
        }
    }

    /// Record what the find feature currently highlights.
    pub fn set_find_highlight(&mut self, text: impl Into<String>, marker_count: usize) {
        self.find_highlight = FindHighlight {
            text: text.into(),
            marker_count,
        };
    }

    /// Number of occurrences the selected-word pass counted for the active document.
    pub fn selected_word_count(&self) -> usize {
        self.active
            .and_then(|id| self.documents.get(&id))
            .map_or(0, |record| record.selected_word.marker_count())
    }

    // ----- navigation -----

    /// Jump to the matching brace, selecting through it with `extend`.
    pub fn goto_brace(&mut self, buffer: &mut dyn StyledTextBuffer, extend: bool) -> bool {
        brace::goto_brace(buffer, extend)
    }

    /// Move the caret to `line` and center it.
    pub fn goto_line(&mut self, buffer: &mut dyn StyledTextBuffer, line: usize) {
        view_position::goto_line(buffer, line);
    }

    /// Select `start..end` and scroll it into the middle of the view.
    pub fn center(&mut self, buffer: &mut dyn StyledTextBuffer, start: usize, end: usize) {
        view_position::center(buffer, start, end);
    }

    /// Bytes and lines covered by all selections.
    pub fn selected_count(&self, buffer: &dyn StyledTextBuffer) -> SelectedCount {
        buffer
            .selections()
            .iter()
            .fold(SelectedCount::default(), |count, sel| {
                let start_line = buffer.line_from_position(sel.anchor);
                let end_line = buffer.line_from_position(sel.caret);
                SelectedCount {
                    bytes: count.bytes + sel.anchor.abs_diff(sel.caret),
                    lines: count.lines + start_line.abs_diff(end_line) + 1,
                }
            })
    }

    fn update_line_number_width(&mut self, buffer: &dyn StyledTextBuffer) {
        let digits = view_position::line_number_digits(buffer, self.view_settings().line_numbers);
        if self.line_number_width != Some(digits) {
            self.line_number_width = Some(digits);
            self.emit(SurfaceEvent::LineNumberWidth(digits));
        }
    }

    // ----- bookmarks -----

    fn bookmark_edit(
        &mut self,
        buffer: &mut dyn StyledTextBuffer,
        line: Option<usize>,
        edit: fn(&mut dyn StyledTextBuffer, &mut OverviewRuler, Option<usize>) -> bool,
    ) -> bool {
        let mut scratch = OverviewRuler::new();
        let overview = match self.active_record() {
            Some(record) => &mut record.overview,
            None => &mut scratch,
        };
        let result = edit(buffer, overview, line);
        self.emit(SurfaceEvent::OverviewChanged);
        result
    }

    /// Flip the bookmark of `line` (default: caret line). Returns whether it is now set.
    pub fn toggle_bookmark(&mut self, buffer: &mut dyn StyledTextBuffer, line: Option<usize>) -> bool {
        self.bookmark_edit(buffer, line, bookmarks::toggle)
    }

    /// Bookmark `line` (default: caret line). Returns `false` if it already was.
    pub fn add_bookmark(&mut self, buffer: &mut dyn StyledTextBuffer, line: Option<usize>) -> bool {
        self.bookmark_edit(buffer, line, bookmarks::add)
    }

    /// Remove the bookmark of `line` (default: caret line). Returns `false` if there was none.
    pub fn delete_bookmark(&mut self, buffer: &mut dyn StyledTextBuffer, line: Option<usize>) -> bool {
        self.bookmark_edit(buffer, line, bookmarks::delete)
    }

    /// Returns `true` if `line` (default: caret line) is bookmarked.
    pub fn is_bookmark_present(&self, buffer: &dyn StyledTextBuffer, line: Option<usize>) -> bool {
        bookmarks::is_present(buffer, line)
    }

    /// Rebuild the bookmark marks on the overview ruler.
    pub fn refresh_bookmark_overview(&mut self, buffer: &dyn StyledTextBuffer) {
        if let Some(record) = self.active_record() {
            bookmarks::refresh_overview(buffer, &mut record.overview);
        }
        self.emit(SurfaceEvent::OverviewChanged);
    }

    // ----- regex capture -----

    /// Highlight regex captures and expand `template` per match.
    ///
    /// An invalid pattern is also reported as an info text that the [`TimerId::InfoBanner`] timer
    /// removes again.
    pub fn run_regex_capture(
        &mut self,
        buffer: &mut dyn StyledTextBuffer,
        pattern: &str,
        template: &str,
        options: CaptureOptions,
    ) -> Result<CaptureOutput, CaptureError> {
        regex_capture::run(buffer, pattern, template, options).inspect_err(|err| {
            self.emit(SurfaceEvent::InfoText(Some(err.to_string())));
            self.timers.schedule(
                TimerId::InfoBanner,
                TimerId::InfoBanner.default_delay(),
                self.clock.now(),
            );
        })
    }

    /// Remove all regex capture highlights.
    pub fn clear_regex_capture(&mut self, buffer: &mut dyn StyledTextBuffer) {
        regex_capture::clear(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextBuffer;
    use crate::config::IniSettings;
    use crate::scheduler::ManualClock;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn surface() -> (EditorSurface, Rc<IniSettings>, ManualClock) {
        let settings = Rc::new(IniSettings::new());
        let clock = ManualClock::new();
        let surface = EditorSurface::new(settings.clone(), Rc::new(clock.clone()));
        (surface, settings, clock)
    }

    #[test]
    fn test_activate_reports_line_number_width_once() {
        let (mut surface, _, _) = surface();
        let mut buffer = TextBuffer::new("a\n");
        buffer.set_lines_on_screen(20);
        surface.activate_document(DocumentId::new(1), &mut buffer);
        assert_eq!(
            surface.drain_events(),
            vec![SurfaceEvent::LineNumberWidth(3), SurfaceEvent::OverviewChanged]
        );
        surface.on_caret_moved(&mut buffer);
        assert!(!surface.drain_events().contains(&SurfaceEvent::LineNumberWidth(3)));
    }

    #[test]
    fn test_line_numbers_disabled() {
        let (mut surface, settings, _) = surface();
        settings.set_int("View", "linenumbers", 0);
        let mut buffer = TextBuffer::new("a\n");
        surface.activate_document(DocumentId::new(1), &mut buffer);
        assert!(surface.drain_events().contains(&SurfaceEvent::LineNumberWidth(0)));
    }

    #[test]
    fn test_margin_click_needs_symbol_margin_without_modifiers() {
        let (mut surface, _, _) = surface();
        let mut buffer = TextBuffer::new("a\nb\n");
        surface.activate_document(DocumentId::new(1), &mut buffer);
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert!(!surface.on_margin_click(&mut buffer, MarginKind::LineNumber, 1, Modifiers::NONE));
        assert!(!surface.on_margin_click(&mut buffer, MarginKind::Symbol, 1, ctrl));
        assert!(!surface.is_bookmark_present(&buffer, Some(1)));
        assert!(surface.on_margin_click(&mut buffer, MarginKind::Symbol, 1, Modifiers::NONE));
        assert!(surface.is_bookmark_present(&buffer, Some(1)));
    }

    #[test]
    fn test_cursor_hides_after_timeout() {
        let (mut surface, _, clock) = surface();
        let mut buffer = TextBuffer::new("");
        surface.on_mouse_activity();
        clock.advance(Duration::from_millis(2999));
        surface.tick(&mut buffer);
        assert!(surface.cursor_shown());
        clock.advance(Duration::from_millis(1));
        surface.tick(&mut buffer);
        assert!(!surface.cursor_shown());
        surface.on_mouse_activity();
        assert_eq!(
            surface.drain_events(),
            vec![
                SurfaceEvent::CursorVisibility(false),
                SurfaceEvent::CursorVisibility(true)
            ]
        );
    }

    #[test]
    fn test_cursor_never_hides_with_zero_timeout() {
        let (mut surface, settings, _) = surface();
        settings.set_int("View", "hidecursortimeout", 0);
        surface.on_mouse_activity();
        assert!(!surface.timers().is_pending(TimerId::HideCursor));
    }

    #[test]
    fn test_invalid_regex_shows_info_text() {
        let (mut surface, _, clock) = surface();
        let mut buffer = TextBuffer::new("abc");
        assert!(
            surface
                .run_regex_capture(&mut buffer, "(", "", CaptureOptions::default())
                .is_err()
        );
        clock.advance(Duration::from_secs(5));
        surface.tick(&mut buffer);
        let events = surface.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SurfaceEvent::InfoText(Some(text)) if text.contains("regex")));
        assert_eq!(events[1], SurfaceEvent::InfoText(None));
    }

    #[test]
    fn test_selected_count() {
        let (surface, _, _) = surface();
        let mut buffer = TextBuffer::new("one\ntwo\nthree\n");
        buffer.set_sel(Some(0), 6);
        buffer.add_selection(10, 8);
        assert_eq!(
            surface.selected_count(&buffer),
            SelectedCount { bytes: 8, lines: 3 }
        );
    }

    #[test]
    fn test_close_document_forgets_state() {
        let (mut surface, _, _) = surface();
        let mut buffer = TextBuffer::new("x");
        let id = DocumentId::new(7);
        surface.activate_document(id, &mut buffer);
        surface.deactivate_document(&buffer);
        assert!(surface.document(id).is_some_and(|r| r.view_position.is_some()));
        surface.close_document(id);
        assert!(surface.document(id).is_none());
        assert_eq!(surface.active_document(), None);
    }
}
