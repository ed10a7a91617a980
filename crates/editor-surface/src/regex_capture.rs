//! Regex capture highlighting.
//!
//! Runs a regex over the whole document, colours every capture group of every match with its own
//! [`IndicatorKind::RegexCapture`] layer and collects a capture template expanded once per match.

use regex::RegexBuilder;
use tracing::debug;

use crate::buffer::StyledTextBuffer;
use crate::decorations::{IndicatorKind, REGEX_CAPTURE_GROUPS};
use crate::error::CaptureError;

/// How the pattern is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Ignore case.
    pub case_insensitive: bool,
    /// Let `.` match line breaks.
    pub dot_matches_newline: bool,
}

/// Result of a capture run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOutput {
    /// The template expanded for every match, concatenated.
    pub text: String,
    /// Number of non-empty matches.
    pub matches: usize,
}

/// Make `\n` in a pattern match LF, CRLF and LFCR line breaks alike.
///
/// Patterns that mention `\r` are left alone.
fn normalize_line_breaks(pattern: &str) -> String {
    if pattern.len() > 1 && !pattern.contains("\\r") {
        pattern.replace("\\n", "(?:\\n|\\r\\n|\\n\\r)")
    } else {
        pattern.to_string()
    }
}

/// Turn the `\n` and `\t` escapes of a template into the characters.
fn unescape(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Remove every regex capture indicator.
pub fn clear(buffer: &mut dyn StyledTextBuffer) {
    let len = buffer.len();
    for kind in IndicatorKind::regex_captures() {
        buffer.clear_indicator(kind, 0..len);
    }
}

/// Highlight the captures of `pattern` and expand `template` (`$1`, `${name}`) per match.
///
/// Existing capture indicators are removed first, also when the pattern turns out invalid.
pub fn run(
    buffer: &mut dyn StyledTextBuffer,
    pattern: &str,
    template: &str,
    options: CaptureOptions,
) -> Result<CaptureOutput, CaptureError> {
    clear(buffer);
    let regex = RegexBuilder::new(&normalize_line_breaks(pattern))
        .case_insensitive(options.case_insensitive)
        .dot_matches_new_line(options.dot_matches_newline)
        .build()
        .inspect_err(|err| debug!(%err, "regex capture pattern rejected"))?;
    let template = unescape(template);

    let text = buffer.text_range(0, buffer.len());
    let mut output = CaptureOutput::default();
    let mut fills = Vec::new();
    for captures in regex.captures_iter(&text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.is_empty() {
            continue;
        }
        captures.expand(&template, &mut output.text);
        output.matches += 1;
        for (group, found) in captures.iter().enumerate().take(usize::from(REGEX_CAPTURE_GROUPS)) {
            if let Some(found) = found {
                fills.push((group, found.range()));
            }
        }
    }

    for (group, range) in fills {
        let group = u8::try_from(group).unwrap_or(REGEX_CAPTURE_GROUPS - 1);
        buffer.fill_indicator(IndicatorKind::RegexCapture(group), range);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextBuffer;
    use pretty_assertions::assert_eq;

    fn ranges(buffer: &TextBuffer, group: u8) -> Vec<std::ops::Range<usize>> {
        buffer
            .indicator_ranges(IndicatorKind::RegexCapture(group))
            .iter()
            .map(|r| r.range())
            .collect()
    }

    #[test]
    fn test_groups_and_template() {
        let mut buffer = TextBuffer::new("a=1\nbb=22\n");
        let output = run(
            &mut buffer,
            r"(\w+)=(?<num>\d+)",
            r"${num}:$1\n",
            CaptureOptions::default(),
        )
        .expect("valid pattern");
        assert_eq!(output.text, "1:a\n22:bb\n");
        assert_eq!(output.matches, 2);
        assert_eq!(ranges(&buffer, 0), vec![0..3, 4..9]);
        assert_eq!(ranges(&buffer, 1), vec![0..1, 4..6]);
        assert_eq!(ranges(&buffer, 2), vec![2..3, 7..9]);
    }

    #[test]
    fn test_newline_matches_crlf() {
        let mut buffer = TextBuffer::new("x\r\ny");
        let output = run(&mut buffer, r"x\ny", "$0", CaptureOptions::default()).expect("valid");
        assert_eq!(output.text, "x\r\ny");
    }

    #[test]
    fn test_case_insensitive() {
        let mut buffer = TextBuffer::new("Foo");
        let options = CaptureOptions {
            case_insensitive: true,
            ..CaptureOptions::default()
        };
        let output = run(&mut buffer, "foo", "", options).expect("valid");
        assert_eq!(output.matches, 1);
    }

    #[test]
    fn test_invalid_pattern_clears() {
        let mut buffer = TextBuffer::new("abc");
        run(&mut buffer, "b", "", CaptureOptions::default()).expect("valid");
        assert_eq!(ranges(&buffer, 0), vec![1..2]);
        let err = run(&mut buffer, "(", "", CaptureOptions::default());
        assert!(matches!(err, Err(CaptureError::InvalidRegex(_))));
        assert!(ranges(&buffer, 0).is_empty());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\tb\nc\\d\"), "a\tb\nc\\\\d\\");
    }
}
