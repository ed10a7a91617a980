//! A minimal host driving the editor surface: settings from TOML, typing, caret moves, timers.

use std::rc::Rc;

use editor_surface::{
    DocumentId, EditorSurface, IndicatorKind, IniSettings, ManualClock, Modifiers,
    StyledTextBuffer, TextBuffer,
};
use editor_surface_lang::LexerKind;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = IniSettings::from_toml_str(
        r#"
        [View]
        autobrace = 1
        autobracexml = true
        hidecursortimeout = 1500
        "#,
    )?;
    let clock = ManualClock::new();
    let mut surface = EditorSurface::new(Rc::new(settings), Rc::new(clock.clone()));

    let mut buffer = TextBuffer::new("<list");
    buffer.set_lexer_kind(LexerKind::Xml);
    buffer.set_sel(None, buffer.len());
    surface.activate_document(DocumentId::new(1), &mut buffer);

    if !surface.on_char_typed(&mut buffer, '>', Modifiers::NONE) {
        buffer.add_text(">");
    }
    println!("after '>': {:?} (caret {})", buffer.text(), buffer.current_pos());

    buffer.add_text("(1, 2)");
    buffer.char_left();
    surface.on_caret_moved(&mut buffer);

    clock.advance(std::time::Duration::from_secs(1));
    surface.tick(&mut buffer);
    println!(
        "brace fill: {:?}",
        buffer.indicator_ranges(IndicatorKind::BraceMatch)
    );
    println!(
        "tag marks: {:?}",
        buffer.indicator_ranges(IndicatorKind::TagMatch)
    );

    for event in surface.drain_events() {
        println!("event: {event:?}");
    }
    Ok(())
}
