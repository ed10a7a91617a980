//! `editor-surface-highlight-simple` - Simple (regex-based) lexers for `editor-surface`.
//!
//! The lexers here produce just enough styling for the editor surface to work on real text:
//! quoted attribute values and CDATA sections for tag matching, strings and comments so that
//! braces inside them do not pair with code braces, and fold levels for view position restore.
//! They are *not* full parsers.

use std::ops::Range;

use editor_surface::{FoldLevel, Lexer, Styling};
use editor_surface_lang::{LexerKind, StyleId, cpp, html};
use regex::Regex;

/// A single token rule: a regex and the style of its matches.
#[derive(Debug, Clone)]
pub struct TokenRule {
    pattern: String,
    style_id: StyleId,
}

impl TokenRule {
    /// A rule styling every match of `pattern` with `style_id`.
    ///
    /// Use non-capturing groups only; the pattern is embedded in a larger alternation.
    pub fn new(pattern: impl Into<String>, style_id: StyleId) -> Self {
        Self {
            pattern: pattern.into(),
            style_id,
        }
    }

    /// Style given to matches.
    pub fn style_id(&self) -> StyleId {
        self.style_id
    }
}

/// A regex tokenizer built from ordered [`TokenRule`]s.
///
/// All rules are compiled into one alternation and scanned left to right, so at any position the
/// first rule that matches wins. A `"` inside a line comment therefore never starts a string.
#[derive(Debug, Clone)]
pub struct RegexHighlighter {
    regex: Regex,
    group_names: Vec<String>,
    styles: Vec<StyleId>,
}

impl RegexHighlighter {
    /// Compile `rules` into a highlighter.
    pub fn new(rules: &[TokenRule]) -> Result<Self, regex::Error> {
        let group_names: Vec<String> = (0..rules.len()).map(|i| format!("r{i}")).collect();
        let pattern = rules
            .iter()
            .zip(&group_names)
            .map(|(rule, name)| format!("(?P<{name}>{})", rule.pattern))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Self {
            regex: Regex::new(&pattern)?,
            group_names,
            styles: rules.iter().map(TokenRule::style_id).collect(),
        })
    }

    /// Every token of `text` with its byte range and style.
    pub fn tokens(&self, text: &str) -> Vec<(Range<usize>, StyleId)> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                self.group_names
                    .iter()
                    .zip(&self.styles)
                    .find_map(|(name, &style)| caps.name(name).map(|m| (m.range(), style)))
            })
            .filter(|(range, _)| !range.is_empty())
            .collect()
    }

    /// Write token styles of `text` into `styles` (one entry per byte), shifted by `offset`.
    pub fn highlight(&self, text: &str, offset: usize, styles: &mut [StyleId]) {
        for (range, style) in self.tokens(text) {
            let start = (offset + range.start).min(styles.len());
            let end = (offset + range.end).min(styles.len());
            styles[start..end].fill(style);
        }
    }
}

/// HTML elements that never have a close tag.
const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// XML/HTML lexer: tags, attributes, quoted values, comments, CDATA and element folding.
#[derive(Debug, Clone)]
pub struct MarkupLexer {
    kind: LexerKind,
    markup: RegexHighlighter,
    attributes: RegexHighlighter,
}

impl MarkupLexer {
    /// An XML lexer.
    pub fn xml() -> Result<Self, regex::Error> {
        Self::new(LexerKind::Xml)
    }

    /// An HTML lexer. HTML void elements (`<br>`, `<img>`, ...) do not open folds.
    pub fn html() -> Result<Self, regex::Error> {
        Self::new(LexerKind::Html)
    }

    fn new(kind: LexerKind) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            markup: RegexHighlighter::new(&[
                TokenRule::new(r"(?s:<!--.*?(?:-->|\z))", html::COMMENT),
                TokenRule::new(r"(?s:<!\[CDATA\[.*?(?:\]\]>|\z))", html::CDATA),
                TokenRule::new(
                    r#"<[/!?]?[A-Za-z_:][^\s/>"']*(?:[^>"']|"[^"]*"|'[^']*')*>?"#,
                    html::TAG,
                ),
            ])?,
            attributes: RegexHighlighter::new(&[
                TokenRule::new(r#""[^"]*"?"#, html::DOUBLE_STRING),
                TokenRule::new(r"'[^']*'?", html::SINGLE_STRING),
                TokenRule::new(r"[A-Za-z_:][-\w:.]*", html::ATTRIBUTE),
            ])?,
        })
    }

    fn is_void(&self, name: &str) -> bool {
        self.kind == LexerKind::Html
            && HTML_VOID_ELEMENTS
                .iter()
                .any(|void| void.eq_ignore_ascii_case(name))
    }
}

impl Lexer for MarkupLexer {
    fn kind(&self) -> LexerKind {
        self.kind
    }

    fn lex(&self, text: &str) -> Styling {
        let mut styles = vec![html::DEFAULT; text.len()];
        let mut folds = Vec::new();

        for (range, style) in self.markup.tokens(text) {
            styles[range.clone()].fill(style);
            if style != html::TAG {
                continue;
            }

            let tag = &text[range.clone()];
            let bytes = tag.as_bytes();
            let prefix = match bytes.get(1) {
                Some(b'/' | b'!' | b'?') => 2,
                _ => 1,
            };
            let name_end = tag[prefix..]
                .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '"' | '\''))
                .map_or(tag.len(), |end| prefix + end);
            let tail = if tag.ends_with("/>") {
                2
            } else if tag.ends_with('>') {
                1
            } else {
                0
            };
            let body_end = (tag.len() - tail).max(name_end);
            self.attributes.highlight(
                &tag[name_end..body_end],
                range.start + name_end,
                &mut styles,
            );

            match bytes.get(1) {
                Some(b'/') => folds.push((range.start, false)),
                Some(b'!' | b'?') => {}
                _ if tail == 2 || self.is_void(&tag[prefix..name_end]) => {}
                _ => folds.push((range.start, true)),
            }
        }

        Styling {
            fold_levels: fold_levels(text, &folds),
            styles,
        }
    }
}

/// C-like lexer: strings, character literals, line comments, operators and brace folding.
#[derive(Debug, Clone)]
pub struct BraceLexer {
    tokens: RegexHighlighter,
}

impl BraceLexer {
    /// Create the lexer.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tokens: RegexHighlighter::new(&[
                TokenRule::new(r"//[^\n]*", cpp::COMMENT_LINE),
                TokenRule::new(r#""(?:\\.|[^"\\\n])*"?"#, cpp::STRING),
                TokenRule::new(r"'(?:\\.|[^'\\\n])*'?", cpp::CHARACTER),
                TokenRule::new(r"[-{}()\[\];,.+*/%=<>!&|^~?:]", cpp::OPERATOR),
            ])?,
        })
    }
}

impl Lexer for BraceLexer {
    fn kind(&self) -> LexerKind {
        LexerKind::Cpp
    }

    fn lex(&self, text: &str) -> Styling {
        let mut styles = vec![cpp::DEFAULT; text.len()];
        let mut folds = Vec::new();
        for (range, style) in self.tokens.tokens(text) {
            styles[range.clone()].fill(style);
            if style == cpp::OPERATOR {
                match text.as_bytes()[range.start] {
                    b'{' => folds.push((range.start, true)),
                    b'}' => folds.push((range.start, false)),
                    _ => {}
                }
            }
        }
        Styling {
            fold_levels: fold_levels(text, &folds),
            styles,
        }
    }
}

/// Fold levels from fold open (`true`) / close (`false`) events sorted by byte position.
///
/// A line is a header when it ends deeper than it starts. The level of a line is the depth at
/// its start.
fn fold_levels(text: &str, folds: &[(usize, bool)]) -> Vec<FoldLevel> {
    let mut levels = Vec::new();
    let mut depth = 0u32;
    let mut next = 0;
    let mut line_start = 0;
    for line in text.split('\n') {
        let line_end = line_start + line.len();
        let start_depth = depth;
        while let Some(&(pos, open)) = folds.get(next)
            && pos <= line_end
        {
            depth = if open {
                depth + 1
            } else {
                depth.saturating_sub(1)
            };
            next += 1;
        }
        let mut level = if depth > start_depth {
            FoldLevel::header_at_depth(start_depth)
        } else {
            FoldLevel::at_depth(start_depth)
        };
        if line.trim().is_empty() {
            level.0 |= FoldLevel::WHITE_FLAG;
        }
        levels.push(level);
        line_start = line_end + 1;
    }
    levels
}
