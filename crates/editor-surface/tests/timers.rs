use editor_surface::{
    BraceLight, Clock, DocumentId, EditorSurface, FindHighlight, IndicatorKind, IniSettings,
    ManualClock, OverviewKind, OverviewRuler, SelectedWordState, StyledTextBuffer, TextBuffer,
    TimerId,
};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

fn brace_fill(buffer: &TextBuffer) -> Vec<std::ops::Range<usize>> {
    buffer
        .indicator_ranges(IndicatorKind::BraceMatch)
        .iter()
        .map(|r| r.range())
        .collect()
}

#[test]
fn test_brace_highlight_follows_timers() {
    let clock = ManualClock::new();
    let mut surface = EditorSurface::new(Rc::new(IniSettings::new()), Rc::new(clock.clone()));
    let mut buffer = TextBuffer::new("f(a);\n");
    surface.activate_document(DocumentId::new(1), &mut buffer);

    buffer.set_sel(None, 2);
    surface.on_caret_moved(&mut buffer);
    assert_eq!(buffer.brace_light(), BraceLight::Matched(1, 3));
    assert_eq!(
        surface.timers().deadline(TimerId::BraceHighlight),
        Some(Duration::from_secs(1))
    );

    // A repeated notification for the same caret does not re-arm the timer.
    clock.advance(Duration::from_millis(500));
    surface.on_caret_moved(&mut buffer);
    assert_eq!(
        surface.timers().deadline(TimerId::BraceHighlight),
        Some(Duration::from_secs(1))
    );

    clock.advance(Duration::from_millis(500));
    surface.tick(&mut buffer);
    assert_eq!(brace_fill(&buffer), vec![1..4]);
    assert_eq!(
        surface.timers().deadline(TimerId::BraceHighlightClear),
        Some(Duration::from_secs(6))
    );

    clock.advance(Duration::from_secs(5));
    surface.tick(&mut buffer);
    assert!(brace_fill(&buffer).is_empty());
    assert!(surface.timers().is_empty());
}

#[test]
fn test_caret_move_supersedes_pending_highlight() {
    let clock = ManualClock::new();
    let mut surface = EditorSurface::new(Rc::new(IniSettings::new()), Rc::new(clock.clone()));
    let mut buffer = TextBuffer::new("(a) b\n");
    surface.activate_document(DocumentId::new(1), &mut buffer);

    buffer.set_sel(None, 1);
    surface.on_caret_moved(&mut buffer);
    assert!(surface.timers().is_pending(TimerId::BraceHighlight));

    buffer.set_sel(None, 5);
    surface.on_caret_moved(&mut buffer);
    assert_eq!(buffer.brace_light(), BraceLight::None);
    assert!(!surface.timers().is_pending(TimerId::BraceHighlight));

    clock.advance(Duration::from_secs(2));
    surface.tick(&mut buffer);
    assert!(brace_fill(&buffer).is_empty());
}

#[test]
fn test_highlight_text_setting_disables_fill() {
    let settings = Rc::new(IniSettings::new());
    settings.set_int("View", "bracehighlighttext", 0);
    let clock = ManualClock::new();
    let mut surface = EditorSurface::new(settings, Rc::new(clock.clone()));
    let mut buffer = TextBuffer::new("[x]");
    surface.activate_document(DocumentId::new(1), &mut buffer);

    buffer.set_sel(None, 1);
    surface.on_caret_moved(&mut buffer);
    assert_eq!(buffer.brace_light(), BraceLight::Matched(0, 2));
    assert!(!surface.timers().is_pending(TimerId::BraceHighlight));
}

#[test]
fn test_switching_documents_cancels_brace_timers() {
    let clock = ManualClock::new();
    let mut surface = EditorSurface::new(Rc::new(IniSettings::new()), Rc::new(clock.clone()));
    let mut first = TextBuffer::new("{}");
    surface.activate_document(DocumentId::new(1), &mut first);
    first.set_sel(None, 1);
    surface.on_caret_moved(&mut first);
    assert!(surface.timers().is_pending(TimerId::BraceHighlight));

    surface.deactivate_document(&first);
    assert!(!surface.timers().is_pending(TimerId::BraceHighlight));
}

/// Advances by a fixed step on every reading.
struct SteppingClock {
    now: Cell<Duration>,
    step: Duration,
}

impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

#[test]
fn test_selected_word_enumeration_resumes_after_budget() {
    let text: String = (0..100).map(|i| format!("foo {i}\n")).collect();
    let mut buffer = TextBuffer::new(&text);
    buffer.set_sel(Some(0), 3);
    let clock = SteppingClock {
        now: Cell::new(Duration::ZERO),
        step: Duration::from_millis(100),
    };
    let mut state = SelectedWordState::new();
    let mut overview = OverviewRuler::new();
    let find = FindHighlight::default();

    assert!(state.mark(&mut buffer, &mut overview, &find, &clock, false, false));
    assert_eq!(state.marker_count(), 16);
    assert!(state.resume_at() > 0);

    let mut passes = 1;
    while state.resume_at() != 0 {
        assert!(state.mark(&mut buffer, &mut overview, &find, &clock, false, false));
        passes += 1;
        assert!(passes < 20, "enumeration does not make progress");
    }
    assert_eq!(state.marker_count(), 100);
    assert_eq!(overview.lines(OverviewKind::SelectedText).len(), 100);

    // Complete and unchanged: nothing left to enumerate.
    assert!(!state.mark(&mut buffer, &mut overview, &find, &clock, false, false));
}

#[test]
fn test_changed_selection_restarts_enumeration() {
    let text: String = (0..100).map(|i| format!("foo bar {i}\n")).collect();
    let mut buffer = TextBuffer::new(&text);
    buffer.set_sel(Some(0), 3);
    let clock = SteppingClock {
        now: Cell::new(Duration::ZERO),
        step: Duration::from_millis(100),
    };
    let mut state = SelectedWordState::new();
    let mut overview = OverviewRuler::new();
    let find = FindHighlight::default();
    state.mark(&mut buffer, &mut overview, &find, &clock, false, false);
    assert!(state.resume_at() > 0);

    buffer.set_sel(Some(4), 7);
    state.mark(&mut buffer, &mut overview, &find, &clock, false, false);
    assert_eq!(state.last_text(), "bar");
    assert_eq!(state.marker_count(), 16);
    assert_eq!(
        overview.lines(OverviewKind::SelectedText).first().map(|&(line, _)| line),
        Some(0)
    );
}
