//! Settings consumed by the editor surface.
//!
//! The surface reads key/value settings through the [`SettingsProvider`] trait, at the time an
//! event is handled. [`IniSettings`] is the bundled provider: sections of scalar values, loadable
//! from a TOML document such as
//!
//! ```toml
//! [View]
//! autobrace = 1
//! indentguides = "lookboth"
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::buffer::IndentGuides;
use crate::error::ConfigError;

/// The section the view settings live in.
pub const VIEW_SECTION: &str = "View";

/// Key/value settings source.
pub trait SettingsProvider {
    /// Integer value of `section.key`, or `default` when absent.
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// String value of `section.key`, or `default` when absent.
    fn get_str(&self, section: &str, key: &str, default: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SettingValue {
    Int(i64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Int(i64),
    Bool(bool),
    Str(String),
    Other(toml::Value),
}

/// In-memory settings, grouped in sections.
#[derive(Debug, Default)]
pub struct IniSettings {
    sections: RefCell<BTreeMap<String, BTreeMap<String, SettingValue>>>,
}

impl IniSettings {
    /// Create empty settings; every lookup returns its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from TOML. Top-level tables are sections; booleans read as `0`/`1`.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, BTreeMap<String, RawValue>> = toml::from_str(source)?;
        let mut sections = BTreeMap::new();
        for (section, entries) in raw {
            let mut values = BTreeMap::new();
            for (key, value) in entries {
                let value = match value {
                    RawValue::Int(v) => SettingValue::Int(v),
                    RawValue::Bool(v) => SettingValue::Int(i64::from(v)),
                    RawValue::Str(v) => SettingValue::Str(v),
                    RawValue::Other(_) => {
                        return Err(ConfigError::UnsupportedValue { section, key });
                    }
                };
                values.insert(key, value);
            }
            sections.insert(section, values);
        }
        Ok(Self {
            sections: RefCell::new(sections),
        })
    }

    /// Read and parse a TOML settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Set an integer value.
    pub fn set_int(&self, section: &str, key: &str, value: i64) {
        self.set(section, key, SettingValue::Int(value));
    }

    /// Set a string value.
    pub fn set_str(&self, section: &str, key: &str, value: &str) {
        self.set(section, key, SettingValue::Str(value.to_string()));
    }

    fn set(&self, section: &str, key: &str, value: SettingValue) {
        self.sections
            .borrow_mut()
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn get(&self, section: &str, key: &str) -> Option<SettingValue> {
        self.sections
            .borrow()
            .get(section)
            .and_then(|values| values.get(key))
            .cloned()
    }
}

impl SettingsProvider for IniSettings {
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.get(section, key) {
            Some(SettingValue::Int(v)) => v,
            Some(SettingValue::Str(s)) => s.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    fn get_str(&self, section: &str, key: &str, default: &str) -> String {
        match self.get(section, key) {
            Some(SettingValue::Str(s)) => s,
            Some(SettingValue::Int(v)) => v.to_string(),
            None => default.to_string(),
        }
    }
}

/// Typed snapshot of the `[View]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    /// Insert closing braces automatically.
    pub auto_brace: bool,
    /// Auto-close XML/HTML tags, CDATA sections and comments.
    pub auto_brace_xml: bool,
    /// Fill the brace-match indicator between matched braces.
    pub brace_highlight_text: bool,
    /// Tab width in columns.
    pub tab_size: usize,
    /// Indent with tabs rather than spaces.
    pub use_tabs: bool,
    /// Indentation guide mode.
    pub indent_guides: IndentGuides,
    /// Hide the mouse cursor after this much inactivity; `None` never hides it.
    pub hide_cursor_timeout: Option<Duration>,
    /// Show the line-number margin.
    pub line_numbers: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            auto_brace: true,
            auto_brace_xml: true,
            brace_highlight_text: true,
            tab_size: 4,
            use_tabs: true,
            indent_guides: IndentGuides::LookBoth,
            hide_cursor_timeout: Some(Duration::from_millis(3000)),
            line_numbers: true,
        }
    }
}

impl ViewSettings {
    /// Read the view settings, falling back to the defaults for absent keys.
    pub fn load(settings: &dyn SettingsProvider) -> Self {
        let flag = |key: &str| settings.get_int(VIEW_SECTION, key, 1) != 0;
        let tab_size = settings.get_int(VIEW_SECTION, "tabsize", 4);
        let hide_ms = settings.get_int(VIEW_SECTION, "hidecursortimeout", 3000);
        Self {
            auto_brace: flag("autobrace"),
            auto_brace_xml: flag("autobracexml"),
            brace_highlight_text: flag("bracehighlighttext"),
            tab_size: usize::try_from(tab_size).ok().filter(|&w| w > 0).unwrap_or(4),
            use_tabs: flag("usetabs"),
            indent_guides: IndentGuides::from_setting(&settings.get_str(
                VIEW_SECTION,
                "indentguides",
                "lookboth",
            )),
            hide_cursor_timeout: u64::try_from(hide_ms)
                .ok()
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis),
            line_numbers: flag("linenumbers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        assert_eq!(ViewSettings::load(&IniSettings::new()), ViewSettings::default());
    }

    #[test]
    fn test_from_toml() {
        let settings = IniSettings::from_toml_str(
            r#"
            [View]
            autobrace = 0
            bracehighlighttext = false
            tabsize = 8
            indentguides = "real"
            hidecursortimeout = 0
            "#,
        )
        .expect("valid settings");
        let view = ViewSettings::load(&settings);
        assert!(!view.auto_brace);
        assert!(view.auto_brace_xml);
        assert!(!view.brace_highlight_text);
        assert_eq!(view.tab_size, 8);
        assert_eq!(view.indent_guides, IndentGuides::Real);
        assert_eq!(view.hide_cursor_timeout, None);
    }

    #[test]
    fn test_unsupported_value() {
        let err = IniSettings::from_toml_str("[View]\ntabsize = 1.5\n");
        assert!(matches!(
            err,
            Err(ConfigError::UnsupportedValue { ref section, ref key }) if section == "View" && key == "tabsize"
        ));
        assert!(matches!(
            IniSettings::from_toml_str("[View"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_changes_are_seen() {
        let settings = IniSettings::new();
        settings.set_int(VIEW_SECTION, "linenumbers", 0);
        settings.set_str(VIEW_SECTION, "tabsize", "2");
        let view = ViewSettings::load(&settings);
        assert!(!view.line_numbers);
        assert_eq!(view.tab_size, 2);
    }
}
