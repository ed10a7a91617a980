#![warn(missing_docs)]
//! Editor Surface - Headless Control Logic for an Embedded Text Editing Component
//!
//! # Overview
//!
//! `editor-surface` implements the interactive layer an editor application puts around its text
//! editing widget: brace and XML/HTML tag matching, selected-word and regex-capture highlighting,
//! automatic insertion of closing braces and tags, per-document view position save/restore and
//! bookmarks. It does not render anything. Everything it needs from the widget is expressed by
//! the [`StyledTextBuffer`] trait, and [`TextBuffer`] implements that trait in memory.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  EditorSurface (notifications, events)      │  ← Host API
//! ├─────────────────────────────────────────────┤
//! │  Engines: braces, tags, selected word,      │
//! │  auto insert, view position, bookmarks      │  ← Control Logic
//! ├─────────────────────────────────────────────┤
//! │  Timers, Clock, Settings                    │  ← Injected Services
//! ├─────────────────────────────────────────────┤
//! │  StyledTextBuffer (trait) / TextBuffer      │  ← Text, Styles, Folds, Indicators
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use editor_surface::{
//!     DocumentId, EditorSurface, IniSettings, Modifiers, StyledTextBuffer, SystemClock,
//!     TextBuffer,
//! };
//!
//! let mut surface = EditorSurface::new(Rc::new(IniSettings::new()), Rc::new(SystemClock::new()));
//! let mut buffer = TextBuffer::new("int main() \n");
//! buffer.set_lexer_kind(editor_surface_lang::LexerKind::Cpp);
//! buffer.set_sel(None, 11);
//!
//! surface.activate_document(DocumentId::new(1), &mut buffer);
//! assert!(surface.on_char_typed(&mut buffer, '{', Modifiers::NONE));
//! assert_eq!(buffer.text(), "int main() {}\n");
//! assert_eq!(buffer.current_pos(), 12);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - the [`StyledTextBuffer`] capability trait and the [`Lexer`] trait
//! - [`text_buffer`] - rope based in-memory buffer
//! - [`tag_match`] - XML/HTML tag pair matching and highlighting
//! - [`brace`] - brace highlighting state machine and brace navigation
//! - [`selected_word`] - time-boxed selected-word highlighting
//! - [`auto_insert`] - closing brace/tag insertion while typing
//! - [`view_position`] - view position save/restore and centering
//! - [`bookmarks`] / [`overview`] - bookmarks and the scrollbar overview ruler
//! - [`regex_capture`] - regex capture group highlighting
//! - [`scheduler`] / [`config`] - timers, clocks and settings
//! - [`surface`] - the controller routing host notifications

pub mod auto_insert;
pub mod bookmarks;
pub mod brace;
pub mod buffer;
pub mod config;
pub mod decorations;
pub mod error;
pub mod intervals;
pub mod line_ending;
pub mod overview;
pub mod regex_capture;
pub mod scheduler;
pub mod search;
pub mod selected_word;
pub mod surface;
pub mod tag_match;
pub mod text_buffer;
mod undo;
pub mod view_position;

pub use auto_insert::{AutoInsertEngine, Modifiers};
pub use brace::{BraceMode, BraceOptions, BraceState};
pub use buffer::{
    IndentGuides, Lexer, SelectionMode, SelectionRange, StyledTextBuffer, Styling, WrapMode,
};
pub use config::{IniSettings, SettingsProvider, ViewSettings};
pub use decorations::{Color, IndicatorKind, IndicatorRange, IndicatorShape, IndicatorStyle};
pub use error::{BufferError, CaptureError, ConfigError, RestoreError};
pub use intervals::{FoldLevel, Interval, IntervalSet};
pub use line_ending::LineEnding;
pub use overview::{OverviewKind, OverviewRuler};
pub use regex_capture::{CaptureOptions, CaptureOutput};
pub use scheduler::{Clock, ManualClock, SystemClock, TimerId, TimerQueue};
pub use search::FindFlags;
pub use selected_word::{FindHighlight, SelectedWordState};
pub use surface::{
    DocumentId, DocumentRecord, EditorSurface, MarginKind, SelectedCount, SurfaceEvent,
};
pub use tag_match::{TagKind, TagMatcher, XmlTagMatch};
pub use text_buffer::{BraceLight, TextBuffer};
pub use view_position::ViewPosition;
