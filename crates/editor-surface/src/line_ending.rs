//! Line ending helpers.
//!
//! `editor-surface` stores text verbatim: whatever newline sequence a document uses stays in the
//! buffer. The buffer remembers which sequence new lines should use.

/// The newline sequence inserted by [`crate::StyledTextBuffer::new_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
    /// Classic Mac CR (`'\r'`).
    Cr,
}

impl LineEnding {
    /// Detect the dominant line ending from a source text.
    ///
    /// Policy: the first line break seen decides; text without line breaks is [`LineEnding::Lf`].
    pub fn detect_in_text(text: &str) -> Self {
        match text.find(['\r', '\n']) {
            Some(idx) if text.as_bytes()[idx] == b'\r' => {
                if text.as_bytes().get(idx + 1) == Some(&b'\n') {
                    Self::Crlf
                } else {
                    Self::Cr
                }
            }
            _ => Self::Lf,
        }
    }

    /// The newline sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(LineEnding::detect_in_text("a\r\nb\n"), LineEnding::Crlf);
        assert_eq!(LineEnding::detect_in_text("a\rb"), LineEnding::Cr);
        assert_eq!(LineEnding::detect_in_text("a\nb\r\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect_in_text("ab"), LineEnding::Lf);
        assert_eq!(LineEnding::Crlf.as_str(), "\r\n");
    }
}
