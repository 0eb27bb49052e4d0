//! Localized default messages.
//!
//! A [`Locale`] is a catalog of message templates keyed by issue code.
//! Templates reference issue properties with `{name}` placeholders. Custom
//! catalogs are written in YAML and layered over the English defaults, so a
//! catalog only needs the messages it changes.
//!
//! # Example YAML
//!
//! ```yaml
//! name: de
//! messages:
//!   invalid_type: "Ungültige Eingabe: {expected} erwartet, {received} erhalten"
//!   too_small: "{origin} muss mindestens {minimum} sein"
//!   too_small.exclusive: "{origin} muss größer als {minimum} sein"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::issue::{IssueCode, RawIssue};
use crate::value::Value;

const TOO_BIG_EXCLUSIVE: &str = "too_big.exclusive";
const TOO_SMALL_EXCLUSIVE: &str = "too_small.exclusive";

const EN_MESSAGES: &[(&str, &str)] = &[
    ("invalid_type", "Invalid input: expected {expected}, received {received}"),
    ("too_big", "{origin} must be at most {maximum}"),
    (TOO_BIG_EXCLUSIVE, "{origin} must be less than {maximum}"),
    ("too_small", "{origin} must be at least {minimum}"),
    (TOO_SMALL_EXCLUSIVE, "{origin} must be greater than {minimum}"),
    ("invalid_format", "Invalid {format}"),
    ("not_multiple_of", "Number must be a multiple of {divisor}"),
    ("unrecognized_keys", "Unrecognized key(s) in object: {keys}"),
    ("invalid_union", "Invalid input"),
    ("invalid_key", "Invalid key in {origin}"),
    ("invalid_element", "Invalid value in {origin}"),
    ("invalid_value", "Invalid input: expected one of {values}"),
    ("custom", "Refinement failed"),
];

#[derive(Debug, Deserialize)]
struct LocaleFile {
    name: String,
    #[serde(default)]
    messages: BTreeMap<String, String>,
}

/// A message catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    name: String,
    messages: BTreeMap<String, String>,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::en()
    }
}

impl Locale {
    /// The built-in English catalog.
    pub fn en() -> Self {
        Self {
            name: "en".to_string(),
            messages: EN_MESSAGES
                .iter()
                .map(|(id, template)| (id.to_string(), template.to_string()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parses a YAML catalog and layers it over the English defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] for malformed YAML and
    /// [`ConfigError::UnknownMessageId`] for a message id that is neither an
    /// issue code nor an `.exclusive` variant of a size code.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::Locale;
    ///
    /// let locale = Locale::from_yaml("name: terse\nmessages:\n  custom: nope\n").unwrap();
    /// assert_eq!(locale.name(), "terse");
    /// assert_eq!(locale.template("custom"), Some("nope"));
    /// assert_eq!(locale.template("invalid_format"), Some("Invalid {format}"));
    /// ```
    pub fn from_yaml(src: &str) -> Result<Self, ConfigError> {
        let file: LocaleFile = serde_yaml::from_str(src)?;
        let mut locale = Locale::en();
        locale.name = file.name;
        for (id, template) in file.messages {
            locale = locale.with_message(&id, &template)?;
        }
        Ok(locale)
    }

    /// Loads a YAML catalog from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`from_yaml`](Self::from_yaml).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_yaml(&src)
    }

    /// Replaces one template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMessageId`] for an unrecognized id.
    pub fn with_message(mut self, id: &str, template: &str) -> Result<Self, ConfigError> {
        let known = id.parse::<IssueCode>().is_ok()
            || id == TOO_BIG_EXCLUSIVE
            || id == TOO_SMALL_EXCLUSIVE;
        if !known {
            return Err(ConfigError::UnknownMessageId(id.to_string()));
        }
        self.messages.insert(id.to_string(), template.to_string());
        Ok(self)
    }

    pub fn template(&self, id: &str) -> Option<&str> {
        self.messages.get(id).map(String::as_str)
    }

    /// Renders the catalog message for `issue`, if the catalog has one.
    pub fn message(&self, issue: &RawIssue) -> Option<String> {
        let exclusive_id = match issue.code {
            IssueCode::TooBig if !issue.inclusive() => Some(TOO_BIG_EXCLUSIVE),
            IssueCode::TooSmall if !issue.inclusive() => Some(TOO_SMALL_EXCLUSIVE),
            _ => None,
        };
        let template = exclusive_id
            .and_then(|id| self.template(id))
            .or_else(|| self.template(issue.code.as_str()))?;
        Some(render(template, issue))
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render(template: &str, issue: &RawIssue) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match placeholder(name, issue) {
            Some(text) => out.push_str(&text),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn placeholder(name: &str, issue: &RawIssue) -> Option<String> {
    let text = match name {
        "expected" => issue.expected(),
        "received" => issue.received(),
        "minimum" => display(&issue.minimum()),
        "maximum" => display(&issue.maximum()),
        "origin" => {
            let origin = issue.origin();
            if origin.is_empty() {
                "value".to_string()
            } else {
                origin
            }
        }
        "format" => issue.format(),
        "pattern" => issue.pattern(),
        "divisor" => display(&issue.divisor()),
        "keys" => issue
            .keys()
            .iter()
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(", "),
        "values" => issue
            .values()
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("|"),
        "key" => display(&issue.key()),
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::issue::{create_too_big_issue, create_too_small_issue};

    #[test]
    fn test_en_has_every_code() {
        let en = Locale::en();
        for code in IssueCode::ALL {
            assert!(en.template(code.as_str()).is_some(), "missing {code}");
        }
    }

    #[test]
    fn test_exclusive_bounds_use_exclusive_template() {
        let en = Locale::en();
        let input = Value::Int(0);
        let raw = create_too_small_issue(0i64, false, "int", &input);
        assert_eq!(en.message(&raw).unwrap(), "int must be greater than 0");
        let raw = create_too_big_issue(10i64, true, "array", &input);
        assert_eq!(en.message(&raw).unwrap(), "array must be at most 10");
    }

    #[test]
    fn test_render_values_and_keys() {
        let raw = RawIssue::new(IssueCode::InvalidValue, Value::from("c"))
            .with_values(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(
            Locale::en().message(&raw).unwrap(),
            "Invalid input: expected one of \"a\"|\"b\""
        );
        let raw = RawIssue::new(IssueCode::UnrecognizedKeys, Value::Null)
            .with_keys(vec!["Trout".into()]);
        assert_eq!(
            Locale::en().message(&raw).unwrap(),
            "Unrecognized key(s) in object: \"Trout\""
        );
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        let locale = Locale::en().with_message("custom", "bad {nope} {").unwrap();
        let raw = RawIssue::new(IssueCode::Custom, Value::Null);
        assert_eq!(locale.message(&raw).unwrap(), "bad {nope} {");
    }

    #[test]
    fn test_unknown_message_id_rejected() {
        let err = Locale::en().with_message("too_tall", "x").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMessageId(id) if id == "too_tall"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name: fr\nmessages:\n  invalid_format: \"Format {{format}} invalide\"\n"
        )
        .unwrap();
        let locale = Locale::load(file.path()).unwrap();
        assert_eq!(locale.name(), "fr");
        let raw = RawIssue::new(IssueCode::InvalidFormat, Value::from("x")).with_format("email");
        assert_eq!(locale.message(&raw).unwrap(), "Format email invalide");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Locale::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
