//! XML/HTML tag matching.
//!
//! [`TagMatcher`] finds the tag pair around the caret with a depth-balancing scan: starting from
//! the tag the caret sits in, it searches for same-named tags in the other direction and counts
//! the opposite-kind tags in between until the counts balance. Quoted attribute values and CDATA
//! sections are never matched inside; which style ids those are depends on the active lexer
//! ([`XmlStringStyles`]).

use std::ops::Range;

use editor_surface_lang::{StyleId, XmlStringStyles};

use crate::buffer::StyledTextBuffer;
use crate::decorations::IndicatorKind;
use crate::search::FindFlags;

/// The positions of a matched tag pair.
///
/// `open_start < name_end <= open_end`; for a pair with a close tag, `open_end <= close.start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTagMatch {
    /// Offset of the `<` of the open tag.
    pub open_start: usize,
    /// Offset just past the tag name of the open tag.
    pub name_end: usize,
    /// Offset just past the `>` of the open tag.
    pub open_end: usize,
    /// The close tag, from its `<` to just past its `>`. `None` for self-closing tags.
    pub close: Option<Range<usize>>,
}

impl XmlTagMatch {
    /// Returns `true` for `<name ... />`.
    pub fn is_self_closing(&self) -> bool {
        self.close.is_none()
    }
}

/// Which kind of tag [`TagMatcher::find_tag`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<name` followed by `>` or whitespace, not self-closing.
    Open,
    /// `</name` followed by optional whitespace and `>`.
    Close,
}

fn is_xml_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\r' | b'\n')
}

fn ends_tag_name(ch: u8) -> bool {
    is_xml_whitespace(ch) || matches!(ch, b'/' | b'>' | b'"' | b'\'')
}

/// Tag pair scanner.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagMatcher {
    styles: XmlStringStyles,
}

impl TagMatcher {
    /// Create a matcher that skips the given string/CDATA styles.
    pub fn new(styles: XmlStringStyles) -> Self {
        Self { styles }
    }

    fn in_string(&self, buffer: &dyn StyledTextBuffer, pos: usize) -> bool {
        self.styles.is_string(buffer.style_at(pos))
    }

    fn is_opaque(&self, style: StyleId) -> bool {
        self.styles.is_string(style) || self.styles.is_cdata(style)
    }

    /// Find the tag pair around the caret.
    pub fn find_matched_tags(&self, buffer: &dyn StyledTextBuffer) -> Option<XmlTagMatch> {
        self.find_matched_tags_at(buffer, buffer.current_pos())
    }

    /// Find the tag pair around `caret`.
    ///
    /// Returns `None` outside HTML/XML/PHP documents, when `caret` is not inside a tag, and for
    /// unmatched or malformed markup.
    pub fn find_matched_tags_at(
        &self,
        buffer: &dyn StyledTextBuffer,
        caret: usize,
    ) -> Option<XmlTagMatch> {
        if !buffer.lexer().supports_tag_matching() {
            return None;
        }

        // Nearest `<` before the caret that is not inside an attribute value.
        let mut search = caret;
        let open = loop {
            let hit = buffer.find_text("<", search, 0, FindFlags::default())?;
            if !self.in_string(buffer, hit.start) {
                break hit.start;
            }
            search = hit.start;
        };
        if self.styles.is_cdata(buffer.style_at(open)) {
            return None;
        }

        // A `>` between that `<` and the caret means the caret is outside any tag.
        let mut from = open;
        while let Some(hit) = buffer.find_text(">", from, caret, FindFlags::default()) {
            if !self.in_string(buffer, hit.start) {
                return None;
            }
            from = hit.end;
        }

        if buffer.char_at(open + 1) == Some(b'/') {
            self.match_from_close_tag(buffer, open, caret)
        } else {
            self.match_from_open_tag(buffer, open)
        }
    }

    fn match_from_close_tag(
        &self,
        buffer: &dyn StyledTextBuffer,
        close_start: usize,
        caret: usize,
    ) -> Option<XmlTagMatch> {
        let len = buffer.len();
        let close_end = buffer.find_text(">", caret, len, FindFlags::default())?.end;
        let (name, name_len) = tag_name_at(buffer, close_start + 2, len);
        if name_len == 0 {
            return None;
        }

        let mut current_end = close_start;
        let mut opens_remaining = 1usize;
        loop {
            let open_tag = self.find_tag(buffer, &name, TagKind::Open, current_end, 0)?;
            opens_remaining -= 1;

            // Close tags between the candidate and the current boundary each need one more open.
            let mut closes_found = 0;
            let mut pos = open_tag.end;
            while let Some(close) = self.find_tag(buffer, &name, TagKind::Close, pos, current_end) {
                closes_found += 1;
                pos = close.end;
            }

            if closes_found == 0 && opens_remaining == 0 {
                return Some(XmlTagMatch {
                    open_start: open_tag.start,
                    name_end: open_tag.start + name_len + 1,
                    open_end: open_tag.end + 1,
                    close: Some(close_start..close_end),
                });
            }
            opens_remaining += closes_found;
            current_end = open_tag.start;
        }
    }

    fn match_from_open_tag(
        &self,
        buffer: &dyn StyledTextBuffer,
        open_start: usize,
    ) -> Option<XmlTagMatch> {
        let len = buffer.len();
        let (name, name_len) = tag_name_at(buffer, open_start + 1, len);
        if name_len == 0 {
            return None;
        }
        let name_end = open_start + name_len + 1;
        let angle = self.find_close_angle(buffer, name_end, len)?;
        let open_end = angle + 1;

        if angle > 0 && buffer.char_at(angle - 1) == Some(b'/') {
            return Some(XmlTagMatch {
                open_start,
                name_end,
                open_end,
                close: None,
            });
        }

        let mut start_pos = open_end;
        let mut closes_remaining = 1usize;
        loop {
            let close = self.find_tag(buffer, &name, TagKind::Close, start_pos, len)?;
            closes_remaining -= 1;

            let mut opens_found = 0;
            let mut pos = start_pos;
            while let Some(open) = self.find_tag(buffer, &name, TagKind::Open, pos, close.start) {
                opens_found += 1;
                pos = open.end;
            }

            if opens_found == 0 && closes_remaining == 0 {
                return Some(XmlTagMatch {
                    open_start,
                    name_end,
                    open_end,
                    close: Some(close.start..close.end + 1),
                });
            }
            closes_remaining += opens_found;
            start_pos = close.end;
        }
    }

    /// Find the next open or close tag named `name` between `from` and `limit`.
    ///
    /// The direction follows `from < limit`. Hits inside attribute values or CDATA are skipped, as
    /// are longer names sharing the prefix and self-closing open tags. The returned range runs from
    /// the `<` to the tag's `>` (exclusive).
    pub fn find_tag(
        &self,
        buffer: &dyn StyledTextBuffer,
        name: &str,
        kind: TagKind,
        from: usize,
        limit: usize,
    ) -> Option<Range<usize>> {
        let needle = match kind {
            TagKind::Open => format!("<{name}"),
            TagKind::Close => format!("</{name}"),
        };
        let forward = from < limit;
        let bound = from.max(limit);
        let mut search = from;
        loop {
            let hit = buffer.find_text(&needle, search, limit, FindFlags::default())?;
            if !self.is_opaque(buffer.style_at(hit.start)) {
                let gt = match kind {
                    TagKind::Open => self.open_tag_end(buffer, hit.end, bound),
                    TagKind::Close => close_tag_end(buffer, hit.end),
                };
                if let Some(gt) = gt {
                    return Some(hit.start..gt);
                }
            }
            search = if forward { hit.start + 1 } else { hit.end - 1 };
        }
    }

    fn open_tag_end(&self, buffer: &dyn StyledTextBuffer, after_name: usize, bound: usize) -> Option<usize> {
        match buffer.char_at(after_name)? {
            b'>' => Some(after_name),
            ch if is_xml_whitespace(ch) => {
                let angle = self.find_close_angle(buffer, after_name, bound)?;
                (buffer.char_at(angle - 1) != Some(b'/')).then_some(angle)
            }
            _ => None,
        }
    }

    /// Position of the first `>` in `[start, end]` that is not inside an attribute value.
    pub fn find_close_angle(
        &self,
        buffer: &dyn StyledTextBuffer,
        start: usize,
        end: usize,
    ) -> Option<usize> {
        let (mut start, end) = (start.min(end), start.max(end));
        loop {
            let hit = buffer.find_text(">", start, end, FindFlags::default())?;
            if !self.in_string(buffer, hit.start) {
                return Some(hit.start);
            }
            start = hit.end;
        }
    }
}

impl TagMatcher {
    /// Refresh the tag indicators for the caret position.
    ///
    /// Clears [`IndicatorKind::TagMatch`] and [`IndicatorKind::TagAttribute`] over the whole
    /// document, then marks `<name`, the open tag's tail and the close tag of the pair around the
    /// caret, plus every attribute of the open tag. With indentation guides on, a pair spanning
    /// several lines also lights its ends as braces and guides the smaller column.
    pub fn highlight(&self, buffer: &mut dyn StyledTextBuffer) -> Option<XmlTagMatch> {
        let len = buffer.len();
        buffer.clear_indicator(IndicatorKind::TagMatch, 0..len);
        buffer.clear_indicator(IndicatorKind::TagAttribute, 0..len);

        let tags = self.find_matched_tags(&*buffer)?;
        let tail = match &tags.close {
            Some(close) => {
                buffer.fill_indicator(IndicatorKind::TagMatch, close.clone());
                1
            }
            None => 2,
        };
        buffer.fill_indicator(IndicatorKind::TagMatch, tags.open_start..tags.name_end);
        buffer.fill_indicator(IndicatorKind::TagMatch, tags.open_end - tail..tags.open_end);

        for attribute in attribute_ranges(&*buffer, tags.name_end, tags.open_end - tail) {
            buffer.fill_indicator(IndicatorKind::TagAttribute, attribute);
        }

        if buffer.indentation_guides().enabled()
            && let Some(close) = &tags.close
            && buffer.line_from_position(tags.open_start) != buffer.line_from_position(close.start)
        {
            buffer.brace_highlight(Some(tags.open_start), Some(close.end - 1));
            let column = buffer.column(tags.open_start).min(buffer.column(close.start));
            buffer.set_highlight_guide(column);
        }
        Some(tags)
    }
}

fn close_tag_end(buffer: &dyn StyledTextBuffer, after_name: usize) -> Option<usize> {
    let mut pos = after_name;
    match buffer.char_at(pos)? {
        b'>' => Some(pos),
        ch if is_xml_whitespace(ch) => {
            while buffer.char_at(pos).is_some_and(is_xml_whitespace) {
                pos += 1;
            }
            (buffer.char_at(pos) == Some(b'>')).then_some(pos)
        }
        _ => None,
    }
}

/// The tag name starting at `start`: bytes up to whitespace, `/`, `>` or a quote.
///
/// Returns the name and its byte length.
pub(crate) fn tag_name_at(buffer: &dyn StyledTextBuffer, start: usize, limit: usize) -> (String, usize) {
    let mut bytes = Vec::new();
    let mut pos = start;
    while pos < limit {
        match buffer.char_at(pos) {
            Some(ch) if !ends_tag_name(ch) => bytes.push(ch),
            _ => break,
        }
        pos += 1;
    }
    let len = bytes.len();
    (String::from_utf8_lossy(&bytes).into_owned(), len)
}

/// Attribute ranges of an open tag between `start` (after the tag name) and `end` (before the
/// tag tail).
///
/// Recognizes `key`, `key=value` and `key="value"`, separated by whitespace; malformed sequences
/// are skipped. A trailing unquoted value runs to `end`.
pub fn attribute_ranges(buffer: &dyn StyledTextBuffer, start: usize, end: usize) -> Vec<Range<usize>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Invalid,
        Key,
        PreAssign,
        Assign,
        Str,
        Value,
        Valid,
    }

    let text = buffer.text_range(start, end);
    let mut attributes = Vec::new();
    let mut state = State::Invalid;
    let mut key_start = 0;
    let mut one_more = 1;
    let mut scanned = 0;

    // The scan sees one terminating NUL past the range, which completes a dangling value.
    for (i, byte) in text.bytes().chain(std::iter::once(0)).enumerate() {
        scanned = i + 1;
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => {
                if state == State::Key {
                    state = State::PreAssign;
                } else if state == State::Value {
                    state = State::Valid;
                    one_more = 0;
                }
            }
            b'=' => {
                if matches!(state, State::Key | State::PreAssign) {
                    state = State::Assign;
                } else if matches!(state, State::Assign | State::Value) {
                    state = State::Invalid;
                }
            }
            b'"' => {
                if state == State::Str {
                    state = State::Valid;
                    one_more = 1;
                } else if matches!(state, State::Key | State::PreAssign | State::Value) {
                    state = State::Invalid;
                } else if state == State::Assign {
                    state = State::Str;
                }
            }
            _ => match state {
                State::Invalid => {
                    state = State::Key;
                    key_start = i;
                }
                State::PreAssign => state = State::Invalid,
                State::Assign => state = State::Value,
                _ => {}
            },
        }

        if state == State::Valid {
            attributes.push(start + key_start..start + i + one_more);
            state = State::Invalid;
        }
    }
    if state == State::Value {
        attributes.push(start + key_start..start + scanned - 1);
    }
    attributes
}
