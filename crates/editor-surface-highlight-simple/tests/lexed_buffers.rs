use editor_surface::{
    BraceLight, DocumentId, EditorSurface, IniSettings, ManualClock, StyledTextBuffer, TagMatcher,
    TextBuffer, ViewPosition,
};
use editor_surface_highlight_simple::{BraceLexer, MarkupLexer};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn surface() -> EditorSurface {
    EditorSurface::new(Rc::new(IniSettings::new()), Rc::new(ManualClock::new()))
}

#[test]
fn test_gt_in_attribute_value_does_not_end_tag() {
    let text = r#"<a title="x > y">body</a>"#;
    let buffer = TextBuffer::with_lexer(text, Box::new(MarkupLexer::xml().unwrap()));
    let tags = TagMatcher::new(buffer.string_styles())
        .find_matched_tags_at(&buffer, 3)
        .expect("caret inside <a ...>");
    assert_eq!(tags.open_end, 17);
    assert_eq!(tags.close, Some(21..25));
}

#[test]
fn test_tags_inside_cdata_are_ignored() {
    let text = "<a><![CDATA[</a>]]></a>";
    let buffer = TextBuffer::with_lexer(text, Box::new(MarkupLexer::xml().unwrap()));
    let tags = TagMatcher::default()
        .find_matched_tags_at(&buffer, 1)
        .expect("caret inside <a>");
    assert_eq!(tags.close, Some(19..23));
}

#[test]
fn test_brace_in_string_literal_is_skipped() {
    let text = "f(\")\") + g()\n";
    let mut buffer = TextBuffer::with_lexer(text, Box::new(BraceLexer::new().unwrap()));
    let mut surface = surface();
    surface.activate_document(DocumentId::new(1), &mut buffer);
    buffer.set_sel(None, 2);
    surface.on_caret_moved(&mut buffer);
    assert_eq!(buffer.brace_light(), BraceLight::Matched(1, 5));
}

#[test]
fn test_lexer_folds_restore_after_reopen() {
    let text = "<root>\n  <a>\n    x\n  </a>\n  <b>\n    y\n  </b>\n</root>\n";
    let lexer = || Box::new(MarkupLexer::xml().unwrap());
    let mut buffer = TextBuffer::with_lexer(text, lexer());
    let mut surface = surface();
    let id = DocumentId::new(1);
    surface.activate_document(id, &mut buffer);
    buffer.toggle_fold(1);
    buffer.toggle_fold(4);
    let saved = ViewPosition::save(&buffer);
    assert_eq!(saved.collapsed_lines, vec![1, 4]);
    surface.deactivate_document(&buffer);

    // Reopened documents start unstyled: the restore has to style before folding.
    let mut reopened = TextBuffer::new(text);
    reopened.set_lexer(lexer());
    assert_eq!(reopened.end_styled(), 0);
    surface.activate_document(id, &mut reopened);
    assert_eq!(reopened.contracted_fold_next(0), Some(1));
    assert_eq!(reopened.contracted_fold_next(2), Some(4));
    assert!(!reopened.line_visible(2));
    assert!(!reopened.line_visible(5));
}
