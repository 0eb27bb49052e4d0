//! Issue model: raw issues, their property bag, and finalization.
//!
//! A check that fails builds a [`RawIssue`]: an [`IssueCode`], the offending
//! input, the path at the moment of failure and a bag of named properties
//! set through `with_*` builder methods. Raw issues are cheap and cannot
//! fail to construct.
//!
//! [`finalize_issue`] turns a raw issue into a flat [`Issue`] with typed
//! fields and a resolved message. Property entries of an unexpected type are
//! dropped rather than reported, so error reporting never panics.
//!
//! # Examples
//!
//! ```
//! use zodkit_core::{Config, IssueCode, RawIssue, Value, finalize_issue};
//!
//! let raw = RawIssue::new(IssueCode::TooSmall, Value::from("hi"))
//!     .with_minimum(5u32)
//!     .with_inclusive(true)
//!     .with_origin("string");
//! let issue = finalize_issue(&raw, None, &Config::default());
//! assert_eq!(issue.message, "string must be at least 5");
//! assert_eq!(issue.input, Some(Value::from("hi")));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::context::ParseContext;
use crate::params::ErrorMessage;
use crate::value::{PathSegment, Value};

/// Closed set of issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    TooBig,
    TooSmall,
    InvalidFormat,
    NotMultipleOf,
    UnrecognizedKeys,
    InvalidUnion,
    InvalidKey,
    InvalidElement,
    InvalidValue,
    Custom,
}

impl IssueCode {
    pub const ALL: [IssueCode; 11] = [
        IssueCode::InvalidType,
        IssueCode::TooBig,
        IssueCode::TooSmall,
        IssueCode::InvalidFormat,
        IssueCode::NotMultipleOf,
        IssueCode::UnrecognizedKeys,
        IssueCode::InvalidUnion,
        IssueCode::InvalidKey,
        IssueCode::InvalidElement,
        IssueCode::InvalidValue,
        IssueCode::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::TooBig => "too_big",
            IssueCode::TooSmall => "too_small",
            IssueCode::InvalidFormat => "invalid_format",
            IssueCode::NotMultipleOf => "not_multiple_of",
            IssueCode::UnrecognizedKeys => "unrecognized_keys",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::InvalidKey => "invalid_key",
            IssueCode::InvalidElement => "invalid_element",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::Custom => "custom",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Well-known property names.
pub mod prop {
    pub const EXPECTED: &str = "expected";
    pub const RECEIVED: &str = "received";
    pub const MINIMUM: &str = "minimum";
    pub const MAXIMUM: &str = "maximum";
    pub const INCLUSIVE: &str = "inclusive";
    pub const FORMAT: &str = "format";
    pub const PATTERN: &str = "pattern";
    pub const DIVISOR: &str = "divisor";
    pub const KEYS: &str = "keys";
    pub const VALUES: &str = "values";
    pub const ORIGIN: &str = "origin";
    pub const KEY: &str = "key";
    pub const PARAMS: &str = "params";
    pub const ERRORS: &str = "errors";
}

/// A property-bag entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Text(String),
    Flag(bool),
    Value(Value),
    Texts(Vec<String>),
    Values(Vec<Value>),
    Params(BTreeMap<String, Value>),
    Issues(Vec<Vec<Issue>>),
}

/// An issue as raised by a check, before message resolution.
#[derive(Debug, Clone)]
pub struct RawIssue {
    pub code: IssueCode,
    pub input: Value,
    pub path: Vec<PathSegment>,
    /// Explicit message; takes precedence over every other source.
    pub message: Option<String>,
    /// Stops remaining checks of the same schema from running.
    pub abort: bool,
    pub properties: BTreeMap<String, Property>,
    /// Error override of the schema or check that raised the issue.
    pub inst: Option<ErrorMessage>,
}

impl RawIssue {
    /// Creates an issue with an empty property bag.
    pub fn new(code: IssueCode, input: impl Into<Value>) -> Self {
        Self {
            code,
            input: input.into(),
            path: Vec::new(),
            message: None,
            abort: false,
            properties: BTreeMap::new(),
            inst: None,
        }
    }

    /// Creates a `custom` issue carrying an explicit message.
    pub fn from_message(
        message: impl Into<String>,
        input: impl Into<Value>,
        inst: Option<ErrorMessage>,
    ) -> Self {
        let mut issue = RawIssue::new(IssueCode::Custom, input);
        let message = message.into();
        if !message.is_empty() {
            issue.message = Some(message);
        }
        issue.inst = inst;
        issue
    }

    pub fn set(mut self, name: &str, property: Property) -> Self {
        self.properties.insert(name.to_string(), property);
        self
    }

    pub fn with_expected(self, expected: impl Into<String>) -> Self {
        self.set(prop::EXPECTED, Property::Text(expected.into()))
    }

    pub fn with_received(self, received: impl Into<String>) -> Self {
        self.set(prop::RECEIVED, Property::Text(received.into()))
    }

    pub fn with_minimum(self, minimum: impl Into<Value>) -> Self {
        self.set(prop::MINIMUM, Property::Value(minimum.into()))
    }

    pub fn with_maximum(self, maximum: impl Into<Value>) -> Self {
        self.set(prop::MAXIMUM, Property::Value(maximum.into()))
    }

    pub fn with_inclusive(self, inclusive: bool) -> Self {
        self.set(prop::INCLUSIVE, Property::Flag(inclusive))
    }

    pub fn with_format(self, format: impl Into<String>) -> Self {
        self.set(prop::FORMAT, Property::Text(format.into()))
    }

    pub fn with_pattern(self, pattern: impl Into<String>) -> Self {
        self.set(prop::PATTERN, Property::Text(pattern.into()))
    }

    pub fn with_divisor(self, divisor: impl Into<Value>) -> Self {
        self.set(prop::DIVISOR, Property::Value(divisor.into()))
    }

    pub fn with_keys(self, keys: Vec<String>) -> Self {
        self.set(prop::KEYS, Property::Texts(keys))
    }

    pub fn with_values(self, values: Vec<Value>) -> Self {
        self.set(prop::VALUES, Property::Values(values))
    }

    pub fn with_origin(self, origin: impl Into<String>) -> Self {
        self.set(prop::ORIGIN, Property::Text(origin.into()))
    }

    pub fn with_key(self, key: impl Into<Value>) -> Self {
        self.set(prop::KEY, Property::Value(key.into()))
    }

    pub fn with_params(self, params: BTreeMap<String, Value>) -> Self {
        self.set(prop::PARAMS, Property::Params(params))
    }

    pub fn with_errors(self, errors: Vec<Vec<Issue>>) -> Self {
        self.set(prop::ERRORS, Property::Issues(errors))
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_abort(mut self, abort: bool) -> Self {
        self.abort = abort;
        self
    }

    pub fn with_inst(mut self, inst: Option<ErrorMessage>) -> Self {
        self.inst = inst;
        self
    }

    fn text(&self, name: &str) -> Option<String> {
        match self.properties.get(name) {
            Some(Property::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn value(&self, name: &str) -> Option<Value> {
        match self.properties.get(name) {
            Some(Property::Value(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Expected type name, empty when absent.
    pub fn expected(&self) -> String {
        self.text(prop::EXPECTED).unwrap_or_default()
    }

    /// Received type name; derived from the input when not set explicitly.
    pub fn received(&self) -> String {
        self.text(prop::RECEIVED)
            .unwrap_or_else(|| self.input.type_name().to_string())
    }

    pub fn minimum(&self) -> Value {
        self.value(prop::MINIMUM).unwrap_or_default()
    }

    pub fn maximum(&self) -> Value {
        self.value(prop::MAXIMUM).unwrap_or_default()
    }

    pub fn inclusive(&self) -> bool {
        matches!(self.properties.get(prop::INCLUSIVE), Some(Property::Flag(true)))
    }

    pub fn format(&self) -> String {
        self.text(prop::FORMAT).unwrap_or_default()
    }

    pub fn pattern(&self) -> String {
        self.text(prop::PATTERN).unwrap_or_default()
    }

    pub fn divisor(&self) -> Value {
        self.value(prop::DIVISOR).unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<String> {
        match self.properties.get(prop::KEYS) {
            Some(Property::Texts(keys)) => keys.clone(),
            _ => Vec::new(),
        }
    }

    pub fn values(&self) -> Vec<Value> {
        match self.properties.get(prop::VALUES) {
            Some(Property::Values(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    pub fn origin(&self) -> String {
        self.text(prop::ORIGIN).unwrap_or_default()
    }

    pub fn key(&self) -> Value {
        self.value(prop::KEY).unwrap_or_default()
    }

    pub fn params(&self) -> BTreeMap<String, Value> {
        match self.properties.get(prop::PARAMS) {
            Some(Property::Params(params)) => params.clone(),
            _ => BTreeMap::new(),
        }
    }

    pub fn errors(&self) -> Vec<Vec<Issue>> {
        match self.properties.get(prop::ERRORS) {
            Some(Property::Issues(errors)) => errors.clone(),
            _ => Vec::new(),
        }
    }
}

/// `invalid_type` issue for a value that is not of the `expected` type.
pub fn create_invalid_type_issue(expected: &str, input: &Value) -> RawIssue {
    RawIssue::new(IssueCode::InvalidType, input.clone())
        .with_expected(expected)
        .with_received(input.type_name())
}

/// `too_big` issue; `origin` names what was measured (`string`, `array`, `int`, ...).
pub fn create_too_big_issue(
    maximum: impl Into<Value>,
    inclusive: bool,
    origin: &str,
    input: &Value,
) -> RawIssue {
    RawIssue::new(IssueCode::TooBig, input.clone())
        .with_maximum(maximum)
        .with_inclusive(inclusive)
        .with_origin(origin)
}

/// `too_small` issue; `origin` names what was measured.
pub fn create_too_small_issue(
    minimum: impl Into<Value>,
    inclusive: bool,
    origin: &str,
    input: &Value,
) -> RawIssue {
    RawIssue::new(IssueCode::TooSmall, input.clone())
        .with_minimum(minimum)
        .with_inclusive(inclusive)
        .with_origin(origin)
}

pub fn create_invalid_format_issue(format: &str, input: &Value) -> RawIssue {
    RawIssue::new(IssueCode::InvalidFormat, input.clone())
        .with_format(format)
        .with_origin("string")
}

pub fn create_not_multiple_of_issue(
    divisor: impl Into<Value>,
    origin: &str,
    input: &Value,
) -> RawIssue {
    RawIssue::new(IssueCode::NotMultipleOf, input.clone())
        .with_divisor(divisor)
        .with_origin(origin)
}

/// `custom` issue with an optional explicit message and user parameters.
pub fn create_custom_issue(
    message: Option<&str>,
    params: BTreeMap<String, Value>,
    input: &Value,
) -> RawIssue {
    let mut issue = RawIssue::new(IssueCode::Custom, input.clone());
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        issue.message = Some(message.to_string());
    }
    if params.is_empty() {
        issue
    } else {
        issue.with_params(params)
    }
}

/// A finalized issue with typed fields and a resolved message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    pub path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisor: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Vec<Issue>>,
}

impl Issue {
    fn bare(code: IssueCode, path: Vec<PathSegment>) -> Self {
        Self {
            code,
            message: String::new(),
            path,
            input: None,
            expected: None,
            received: None,
            minimum: None,
            maximum: None,
            inclusive: None,
            format: None,
            pattern: None,
            divisor: None,
            keys: Vec::new(),
            values: Vec::new(),
            origin: None,
            key: None,
            params: BTreeMap::new(),
            errors: Vec::new(),
        }
    }
}

/// Finalizes a raw issue.
///
/// The message comes from the first source that yields one: the explicit
/// message, the raising schema's override, `ctx.error_map`,
/// `config.custom_error`, the configured locale, then a generic fallback.
/// `input` is reported unless `ctx` disables it.
pub fn finalize_issue(raw: &RawIssue, ctx: Option<&ParseContext>, config: &Config) -> Issue {
    let mut issue = Issue::bare(raw.code, raw.path.clone());

    for (name, property) in &raw.properties {
        match (name.as_str(), property) {
            (prop::EXPECTED, Property::Text(s)) => issue.expected = Some(s.clone()),
            (prop::RECEIVED, Property::Text(s)) => issue.received = Some(s.clone()),
            (prop::MINIMUM, Property::Value(v)) => issue.minimum = Some(v.clone()),
            (prop::MAXIMUM, Property::Value(v)) => issue.maximum = Some(v.clone()),
            (prop::INCLUSIVE, Property::Flag(b)) => issue.inclusive = Some(*b),
            (prop::FORMAT, Property::Text(s)) => issue.format = Some(s.clone()),
            (prop::PATTERN, Property::Text(s)) => issue.pattern = Some(s.clone()),
            (prop::DIVISOR, Property::Value(v)) => issue.divisor = Some(v.clone()),
            (prop::KEYS, Property::Texts(keys)) => issue.keys = keys.clone(),
            (prop::VALUES, Property::Values(values)) => issue.values = values.clone(),
            (prop::ORIGIN, Property::Text(s)) => issue.origin = Some(s.clone()),
            (prop::KEY, Property::Value(v)) => issue.key = Some(v.clone()),
            (prop::PARAMS, Property::Params(p)) => issue.params = p.clone(),
            (prop::ERRORS, Property::Issues(e)) => issue.errors = e.clone(),
            _ => {}
        }
    }

    if ctx.is_none_or(|ctx| ctx.report_input) {
        issue.input = Some(raw.input.clone());
    }

    issue.message = raw
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .or_else(|| raw.inst.as_ref().and_then(|inst| inst.resolve(raw)))
        .or_else(|| ctx.and_then(|ctx| ctx.error_map.as_ref()).and_then(|f| f(raw)))
        .or_else(|| config.custom_error.as_ref().and_then(|f| f(raw)))
        .or_else(|| config.locale.message(raw))
        .unwrap_or_else(|| "Invalid input".to_string());

    issue
}

/// Finalizes issues nested inside another issue (`invalid_union`,
/// `invalid_key`, `invalid_element`) against the current configuration.
pub(crate) fn finalize_nested(raws: &[RawIssue], ctx: &ParseContext) -> Vec<Issue> {
    let config = crate::config::config();
    raws.iter()
        .map(|raw| finalize_issue(raw, Some(ctx), &config))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::locale::Locale;

    #[test]
    fn test_new_raw_issue_has_empty_properties() {
        let raw = RawIssue::new(IssueCode::Custom, Value::Null);
        assert!(raw.properties.is_empty());
        assert!(raw.path.is_empty());
    }

    #[test]
    fn test_accessors_fall_back_on_wrong_type() {
        let raw = RawIssue::new(IssueCode::TooSmall, Value::Null)
            .set(prop::MINIMUM, Property::Text("five".into()))
            .set(prop::INCLUSIVE, Property::Text("yes".into()));
        assert_eq!(raw.minimum(), Value::Null);
        assert!(!raw.inclusive());
        let issue = finalize_issue(&raw, None, &Config::default());
        assert_eq!(issue.minimum, None);
        assert_eq!(issue.inclusive, None);
    }

    #[test]
    fn test_code_round_trips_through_str() {
        for code in IssueCode::ALL {
            assert_eq!(code.as_str().parse::<IssueCode>(), Ok(code));
        }
        assert!("nope".parse::<IssueCode>().is_err());
    }

    #[test]
    fn test_default_messages() {
        let config = Config::default();
        let input = Value::from(3i64);
        let cases = vec![
            (create_invalid_type_issue("string", &input), "Invalid input: expected string, received int"),
            (create_invalid_format_issue("email", &Value::from("x")), "Invalid email"),
            (create_not_multiple_of_issue(4i64, "int", &input), "Number must be a multiple of 4"),
            (create_custom_issue(None, BTreeMap::new(), &input), "Refinement failed"),
        ];
        for (raw, expected) in cases {
            assert_eq!(finalize_issue(&raw, None, &config).message, expected);
        }
    }

    #[test]
    fn test_message_priority_chain() {
        let raw = create_invalid_type_issue("string", &Value::Int(1));
        let ctx = ParseContext::default().with_error_map(|_| Some("from ctx".into()));
        let config = Config {
            custom_error: Some(Arc::new(|_| Some("from config".into()))),
            locale: Locale::en(),
        };

        let with_inst = raw.clone().with_inst(Some("from schema".into()));
        assert_eq!(finalize_issue(&with_inst, Some(&ctx), &config).message, "from schema");
        assert_eq!(finalize_issue(&raw, Some(&ctx), &config).message, "from ctx");
        assert_eq!(finalize_issue(&raw, None, &config).message, "from config");

        let explicit = raw.with_message("explicit");
        assert_eq!(finalize_issue(&explicit, Some(&ctx), &config).message, "explicit");
    }

    #[test]
    fn test_error_map_may_defer() {
        let raw = create_invalid_type_issue("string", &Value::Int(1))
            .with_inst(Some(ErrorMessage::map(|_| None)));
        let issue = finalize_issue(&raw, None, &Config::default());
        assert_eq!(issue.message, "Invalid input: expected string, received int");
    }

    #[test]
    fn test_report_input_flag() {
        let raw = create_invalid_type_issue("string", &Value::Int(1));
        let hidden = finalize_issue(&raw, Some(&ParseContext::default().without_input()), &Config::default());
        assert_eq!(hidden.input, None);
        let shown = finalize_issue(&raw, Some(&ParseContext::default()), &Config::default());
        assert_eq!(shown.input, Some(Value::Int(1)));
    }

    #[test]
    fn test_serialized_issue_omits_empty_fields() {
        let raw = create_invalid_type_issue("string", &Value::Int(1))
            .with_path(vec![PathSegment::from("name")]);
        let issue = finalize_issue(&raw, None, &Config::default());
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "invalid_type");
        assert_eq!(json["path"], serde_json::json!(["name"]));
        assert!(json.get("keys").is_none());
        assert!(json.get("minimum").is_none());
    }
}
