//! Literal text search.
//!
//! The buffer's `find_text` primitive is a literal-substring search bounded by a byte range that
//! may run in either direction. The query is escaped and compiled into a regex so case folding
//! follows Unicode rules; all offsets are **byte offsets** into the searched text.

use std::ops::Range;

use regex::{Regex, RegexBuilder};

/// Flags accepted by [`crate::StyledTextBuffer::find_text`].
///
/// The default is a case-insensitive substring search, which is what tag matching relies on
/// (`<DIV>` closes `<div>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FindFlags {
    /// If `true`, performs a case-sensitive search.
    pub match_case: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
}

impl FindFlags {
    /// Case-sensitive, substring search.
    pub fn match_case() -> Self {
        Self {
            match_case: true,
            whole_word: false,
        }
    }
}

/// Initial window of a backward search, in bytes.
const BACKWARD_WINDOW: usize = 4096;

/// A compiled literal query.
#[derive(Debug, Clone)]
pub struct Finder {
    needle: String,
    flags: FindFlags,
    re: Regex,
}

impl Finder {
    /// Compile `needle`. Returns `None` for an empty needle.
    pub fn new(needle: &str, flags: FindFlags) -> Option<Self> {
        if needle.is_empty() {
            return None;
        }
        // An escaped literal always compiles; the size limit is the only way this can fail.
        let re = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(!flags.match_case)
            .build()
            .ok()?;
        Some(Self {
            needle: needle.to_string(),
            flags,
            re,
        })
    }

    /// Returns `true` if this finder was compiled from `needle` and `flags`.
    pub fn is_for(&self, needle: &str, flags: FindFlags) -> bool {
        self.flags == flags && self.needle == needle
    }

    /// Search `text` between `start` and `end`.
    ///
    /// `start > end` searches backward. A hit lies wholly inside `[min, max]`; forward returns the
    /// lowest start, backward the highest.
    pub fn find(&self, text: &str, start: usize, end: usize) -> Option<Range<usize>> {
        let (min, max) = (start.min(end), start.max(end).min(text.len()));
        if min >= max {
            return None;
        }
        let min = ceil_char_boundary(text, min);
        if start <= end {
            return self.scan(text, min, max, max, false);
        }

        // Backward: scan windows that double in size, walking back from `max`.
        let mut hi = max;
        let mut window = BACKWARD_WINDOW.max(self.needle.len() * 2);
        loop {
            let lo = ceil_char_boundary(text, hi.saturating_sub(window).max(min));
            if let Some(hit) = self.scan(text, lo, hi, max, true) {
                return Some(hit);
            }
            if lo <= min {
                return None;
            }
            hi = lo;
            window = window.saturating_mul(2);
        }
    }

    /// Hits starting in `[from, before)` and ending by `max`: the first one, or the last one when
    /// `last` is set.
    fn scan(
        &self,
        text: &str,
        from: usize,
        before: usize,
        max: usize,
        last: bool,
    ) -> Option<Range<usize>> {
        let mut pos = from;
        let mut found = None;
        while pos < before {
            let Some(m) = self.re.find_at(text, pos) else {
                break;
            };
            if m.start() >= before || m.end() > max {
                break;
            }
            let hit = m.start()..m.end();
            if !hit.is_empty() && (!self.flags.whole_word || is_whole_word(text, &hit)) {
                if !last {
                    return Some(hit);
                }
                found = Some(hit.clone());
            }
            // Step one character so overlapping hits are seen.
            pos = next_char_boundary(text, hit.start);
        }
        found
    }
}

/// One-shot search of `needle` in `text`; see [`Finder::find`].
pub fn find_text(
    text: &str,
    needle: &str,
    start: usize,
    end: usize,
    flags: FindFlags,
) -> Option<Range<usize>> {
    Finder::new(needle, flags)?.find(text, start, end)
}

/// Returns `true` for bytes that belong to a word.
pub fn is_word_byte(ch: u8) -> bool {
    ch == b'_' || ch.is_ascii_alphanumeric() || ch >= 0x80
}

fn is_whole_word(text: &str, hit: &Range<usize>) -> bool {
    let bytes = text.as_bytes();
    let before = hit.start.checked_sub(1).map(|i| bytes[i]);
    let after = bytes.get(hit.end).copied();
    !before.is_some_and(is_word_byte) && !after.is_some_and(is_word_byte)
}

fn ceil_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    ceil_char_boundary(text, pos + 1)
}
