//! Error types.
//!
//! Most editor-surface operations have "nothing to do" outcomes (no matching brace, wrong lexer,
//! feature disabled) that are reported as `Option`/`bool`. The enums here cover the few real
//! failures.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors produced by checked [`crate::TextBuffer`] operations.
pub enum BufferError {
    #[error("invalid offset: {0}")]
    /// An offset past the end of the buffer or inside a UTF-8 sequence.
    InvalidOffset(usize),

    #[error("invalid range: {start}..{end}")]
    /// A range that is reversed, out of bounds or not on character boundaries.
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
    },

    #[error("invalid line: {0}")]
    /// A line number past the last line.
    InvalidLine(usize),

    #[error("style vector length {styles} does not match text length {text}")]
    /// Styling data does not cover the text it is applied to.
    StyleLength {
        /// Number of style entries supplied.
        styles: usize,
        /// Byte length of the text.
        text: usize,
    },
}

#[derive(Debug, Error)]
/// Errors produced while loading settings.
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    /// The settings document is not valid TOML.
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    /// Reading the settings file failed.
    Io(#[from] std::io::Error),

    #[error("unsupported value for '{section}.{key}'")]
    /// A value is neither an integer, a boolean nor a string.
    UnsupportedValue {
        /// Section (TOML table) name.
        section: String,
        /// Key inside the section.
        key: String,
    },
}

#[derive(Debug, Error)]
/// Errors produced by regex capture highlighting.
pub enum CaptureError {
    #[error("invalid regex: {0}")]
    /// The pattern failed to compile.
    InvalidRegex(#[from] regex::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
/// Reasons a saved view position could not be fully restored.
pub enum RestoreError {
    #[error("saved collapsed line {line} has no fold header or fold parent")]
    /// A recorded collapsed line no longer belongs to any fold.
    MissingFoldParent {
        /// The recorded line.
        line: usize,
    },
}
