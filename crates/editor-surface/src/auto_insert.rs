//! Automatic insertion of closing braces, tags and sections while typing.
//!
//! The host calls [`AutoInsertEngine::on_char_typed`] before it commits a typed character and
//! [`AutoInsertEngine::on_return_key`] when Return is pressed. A `true` result means the engine
//! has already edited the buffer and the host must not insert the character itself. Every
//! multi-step edit is one undo group.

use crate::buffer::StyledTextBuffer;
use crate::config::ViewSettings;
use crate::search::FindFlags;
use crate::tag_match::tag_name_at;

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control.
    pub ctrl: bool,
    /// Shift.
    pub shift: bool,
    /// Alt.
    pub alt: bool,
}

impl Modifiers {
    /// No modifier held.
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
    };

    /// Returns `true` if no modifier is held.
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

/// Keystroke-driven insertion state of one editor view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoInsertEngine {
    swallow_next_return: bool,
}

impl AutoInsertEngine {
    /// Create a fresh engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a Return key press.
    ///
    /// Ctrl+Return opens a line above the caret line and Shift+Return one below it. Return
    /// between `{` and `}` opens an indented line between the braces; the Return character that
    /// follows is swallowed by [`Self::on_char_typed`].
    pub fn on_return_key(&mut self, buffer: &mut dyn StyledTextBuffer, modifiers: Modifiers) -> bool {
        if modifiers.ctrl || modifiers.shift {
            buffer.begin_undo_action();
            if modifiers.ctrl {
                buffer.line_up();
            }
            buffer.line_end();
            buffer.new_line();
            buffer.end_undo_action();
            return true;
        }

        let caret = buffer.current_pos();
        let before = caret.checked_sub(1).and_then(|pos| buffer.char_at(pos));
        if before == Some(b'{') && buffer.char_at(caret) == Some(b'}') {
            buffer.new_line();
            buffer.begin_undo_action();
            buffer.line_up();
            buffer.line_end();
            buffer.new_line();
            buffer.tab();
            buffer.end_undo_action();
            self.swallow_next_return = true;
            return true;
        }
        false
    }

    /// Handle a typed character before the host inserts it.
    pub fn on_char_typed(
        &mut self,
        buffer: &mut dyn StyledTextBuffer,
        ch: char,
        modifiers: Modifiers,
        settings: &ViewSettings,
    ) -> bool {
        if matches!(ch, '\r' | '\n') {
            if self.swallow_next_return {
                self.swallow_next_return = false;
                return true;
            }
            if modifiers.ctrl || modifiers.shift {
                return true;
            }
        }
        auto_braces(buffer, ch, settings)
    }
}

/// Brace and tag auto-completion for one typed character.
pub fn auto_braces(buffer: &mut dyn StyledTextBuffer, ch: char, settings: &ViewSettings) -> bool {
    if !buffer.lexer().supports_auto_braces() {
        return false;
    }
    match ch {
        '(' | '{' | '[' | '-' => {
            if !settings.auto_brace {
                return false;
            }
            let close = match ch {
                '(' => Some(')'),
                '{' => Some('}'),
                '[' => Some(']'),
                _ => None,
            };
            if let Some(close) = close
                && !buffer.selection_empty()
            {
                return wrap_selection(buffer, ch, close);
            }
            match ch {
                '{' => {
                    buffer.begin_undo_action();
                    buffer.add_text("{");
                    buffer.add_text("}");
                    buffer.char_left();
                    buffer.end_undo_action();
                    true
                }
                '[' | '-' => {
                    close_xml_section(buffer, ch, settings);
                    false
                }
                _ => false,
            }
        }
        '>' => close_xml_tag(buffer, settings),
        _ => false,
    }
}

fn wrap_selection(buffer: &mut dyn StyledTextBuffer, open: char, close: char) -> bool {
    let (open, close) = (open.to_string(), close.to_string());
    let sel_start = buffer.selection_start();
    let mut sel_end = buffer.selection_end();
    let line_start = buffer.line_from_position(sel_start);
    let mut line_end = buffer.line_from_position(sel_end);
    // A selection ending at a line start covers the lines above it.
    if line_end > 0 && buffer.position_from_line(line_end) == sel_end {
        line_end -= 1;
        sel_end = buffer.line_end_position(line_end);
    }
    let line_start_start = buffer.position_from_line(line_start);
    let line_end_end = buffer.line_end_position(line_end);

    if line_start_start != sel_start || line_end_end != sel_end || open == "(" || open == "[" {
        buffer.set_sel(None, sel_start);
        buffer.begin_undo_action();
        buffer.insert_text(Some(sel_start), &open);
        buffer.insert_text(Some(sel_end + 1), &close);
        buffer.set_sel(None, sel_start + 1);
        buffer.end_undo_action();
        return true;
    }

    // Whole lines: put the braces on lines of their own and indent the block.
    let tab_width = buffer.tab_width();
    let indent_first = buffer.line_indentation(line_start);
    let indent = match buffer.line_indentation(line_start.saturating_sub(1)) {
        0 => indent_first,
        indent => indent,
    };
    buffer.begin_undo_action();

    buffer.set_sel(None, line_end_end);
    buffer.new_line();
    buffer.insert_text(None, &close);
    buffer.set_line_indentation(line_end + 1, indent);

    buffer.set_sel(None, line_start_start);
    buffer.insert_text(None, &open);
    buffer.set_sel(None, line_start_start + 1);
    buffer.new_line();
    buffer.set_line_indentation(line_start, indent);

    if indent == indent_first {
        for line in line_start + 1..=line_end + 1 {
            let current = buffer.line_indentation(line);
            buffer.set_line_indentation(line, current + tab_width);
        }
    }
    buffer.end_undo_action();
    true
}

/// The `<` of the tag the caret is typing, if no `/` appears after it.
///
/// Processing instructions and server tags (`<?`, `<%`) never qualify.
fn open_tag_before_caret(buffer: &dyn StyledTextBuffer, caret: usize) -> Option<usize> {
    let lt = buffer.find_text("<", caret, 0, FindFlags::default())?;
    let slash = buffer.find_text("/", caret, 0, FindFlags::default());
    if slash.is_some_and(|slash| lt.start <= slash.start) {
        return None;
    }
    match buffer.char_at(lt.start + 1) {
        Some(b'?' | b'%') => None,
        _ => Some(lt.start),
    }
}

fn close_xml_section(buffer: &mut dyn StyledTextBuffer, ch: char, settings: &ViewSettings) {
    if !buffer.lexer().supports_xml_auto_close() || !settings.auto_brace_xml {
        return;
    }
    let caret = buffer.current_pos();
    let Some(lt) = open_tag_before_caret(&*buffer, caret) else {
        return;
    };
    let (name, _) = tag_name_at(&*buffer, lt + 1, caret);
    let closer = if ch == '[' && name.starts_with("![CDATA") && !name.starts_with("![CDATA[") {
        "]]>"
    } else if ch == '-' && name == "!-" {
        "-->"
    } else {
        return;
    };
    buffer.begin_undo_action();
    buffer.add_text(closer);
    buffer.goto_pos(caret);
    buffer.end_undo_action();
}

fn close_xml_tag(buffer: &mut dyn StyledTextBuffer, settings: &ViewSettings) -> bool {
    if !buffer.lexer().supports_xml_auto_close() || !settings.auto_brace_xml {
        return false;
    }
    let caret = buffer.current_pos();
    let Some(lt) = open_tag_before_caret(&*buffer, caret) else {
        return false;
    };

    buffer.begin_undo_action();
    buffer.add_text(">");
    let after_gt = buffer.current_pos();
    let (name, len) = tag_name_at(&*buffer, lt + 1, caret);
    if len > 0 {
        if !name.starts_with("![CDATA") && !name.starts_with("!--") {
            buffer.add_text(&format!("</{name}>"));
        }
        buffer.goto_pos(after_gt);
    }
    buffer.end_undo_action();
    true
}
