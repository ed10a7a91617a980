#![warn(missing_docs)]
//! `editor-surface-lang` - lexer identities and style numbering for `editor-surface`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any lexing or
//! highlighting system. The editor surface treats style ids as opaque, except for the small
//! fixed set of values defined here that it must avoid matching inside (quoted attribute
//! strings, CDATA sections).

/// Lexical style tag attached to each byte of a styled buffer.
pub type StyleId = u32;

/// The characters the brace matcher treats as braces.
pub const BRACE_CHARS: &[u8] = b"[](){}";

/// Returns `true` if `ch` is one of `()[]{}`.
pub fn is_brace(ch: u8) -> bool {
    BRACE_CHARS.contains(&ch)
}

/// Returns the closing counterpart of an opening bracket.
pub fn closing_brace(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}

/// Identity of the lexer currently styling a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexerKind {
    /// No lexer: plain text.
    #[default]
    Null,
    /// The host styles the text itself.
    Container,
    /// `.properties` / `.ini` style files.
    Properties,
    /// Compiler output / error lists.
    ErrorList,
    /// Markdown.
    Markdown,
    /// txt2tags markup.
    Txt2Tags,
    /// XML.
    Xml,
    /// HTML (with embedded scripts).
    Html,
    /// Stand-alone PHP script.
    PhpScript,
    /// C-family languages.
    Cpp,
    /// Any other lexer, identified by name.
    Other(&'static str),
}

impl LexerKind {
    /// Resolve a language name (as shown in a language menu) to a lexer.
    pub fn for_language(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "" | "text" | "plain" | "plain text" => Self::Null,
            "xml" | "xsd" | "xslt" | "svg" => Self::Xml,
            "html" | "htm" | "xhtml" => Self::Html,
            "php" => Self::PhpScript,
            "c" | "c++" | "cpp" | "c#" | "java" | "javascript" | "rust" => Self::Cpp,
            "ini" | "properties" => Self::Properties,
            "markdown" | "md" => Self::Markdown,
            "txt2tags" => Self::Txt2Tags,
            _ => Self::Null,
        }
    }

    /// Lexers whose documents get XML/HTML tag matching.
    pub fn supports_tag_matching(self) -> bool {
        matches!(self, Self::Xml | Self::Html | Self::PhpScript)
    }

    /// Lexers where typing `>` may auto-close an element and `[`/`-` may close CDATA/comments.
    pub fn supports_xml_auto_close(self) -> bool {
        matches!(self, Self::Xml | Self::Html)
    }

    /// Lexers where brace semantics apply at all.
    ///
    /// Plain, container-styled, properties, error-list, markdown and txt2tags documents never
    /// get automatic brace insertion.
    pub fn supports_auto_braces(self) -> bool {
        !matches!(
            self,
            Self::Null
                | Self::Container
                | Self::Properties
                | Self::ErrorList
                | Self::Markdown
                | Self::Txt2Tags
        )
    }
}

/// Style numbering used by the HTML/XML lexers.
pub mod html {
    use super::StyleId;

    /// Text outside any tag.
    pub const DEFAULT: StyleId = 0;
    /// Known tag name / tag punctuation.
    pub const TAG: StyleId = 1;
    /// Unknown tag.
    pub const TAG_UNKNOWN: StyleId = 2;
    /// Attribute name.
    pub const ATTRIBUTE: StyleId = 3;
    /// Unquoted attribute value.
    pub const VALUE: StyleId = 19;
    /// Double-quoted attribute value.
    pub const DOUBLE_STRING: StyleId = 6;
    /// Single-quoted attribute value.
    pub const SINGLE_STRING: StyleId = 7;
    /// `<!-- ... -->`.
    pub const COMMENT: StyleId = 9;
    /// `<![CDATA[ ... ]]>`.
    pub const CDATA: StyleId = 17;
}

/// Style numbering used by the C-family lexer.
pub mod cpp {
    use super::StyleId;

    /// Default text.
    pub const DEFAULT: StyleId = 0;
    /// `// ...` comments.
    pub const COMMENT_LINE: StyleId = 2;
    /// Double-quoted strings.
    pub const STRING: StyleId = 6;
    /// Single-quoted character literals.
    pub const CHARACTER: StyleId = 7;
    /// Operators, including braces.
    pub const OPERATOR: StyleId = 10;
}

/// The styles a tag scan must not look inside.
///
/// Which numeric ids these are depends on the active lexer; the defaults match [`html`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlStringStyles {
    /// Double-quoted attribute value style.
    pub double_string: StyleId,
    /// Single-quoted attribute value style.
    pub single_string: StyleId,
    /// CDATA section style.
    pub cdata: StyleId,
}

impl XmlStringStyles {
    /// Returns `true` for either quoted attribute value style.
    pub fn is_string(&self, style: StyleId) -> bool {
        style == self.double_string || style == self.single_string
    }

    /// Returns `true` for the CDATA style.
    pub fn is_cdata(&self, style: StyleId) -> bool {
        style == self.cdata
    }
}

impl Default for XmlStringStyles {
    fn default() -> Self {
        Self {
            double_string: html::DOUBLE_STRING,
            single_string: html::SINGLE_STRING,
            cdata: html::CDATA,
        }
    }
}
