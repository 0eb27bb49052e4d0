//! Construction-time parameters shared by schemas and checks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::issue::RawIssue;
use crate::value::{PathSegment, Value};

/// Function that maps a raw issue to a message.
///
/// Returning `None` defers to the next source in the message resolution
/// chain.
pub type ErrorMap = Arc<dyn Fn(&RawIssue) -> Option<String> + Send + Sync>;

/// Per-schema or per-check error override.
#[derive(Clone)]
pub enum ErrorMessage {
    /// Fixed message used for every issue.
    Text(String),
    /// Message computed from the issue.
    Map(ErrorMap),
}

impl ErrorMessage {
    /// Wraps a closure as an [`ErrorMessage::Map`].
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        ErrorMessage::Map(Arc::new(f))
    }

    pub fn resolve(&self, issue: &RawIssue) -> Option<String> {
        match self {
            ErrorMessage::Text(text) => Some(text.clone()),
            ErrorMessage::Map(f) => f(issue),
        }
    }
}

impl fmt::Debug for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ErrorMessage::Map(_) => f.write_str("Map(<fn>)"),
        }
    }
}

impl From<&str> for ErrorMessage {
    fn from(v: &str) -> Self {
        ErrorMessage::Text(v.to_string())
    }
}

impl From<String> for ErrorMessage {
    fn from(v: String) -> Self {
        ErrorMessage::Text(v)
    }
}

/// Optional settings accepted by schema constructors and checks.
///
/// # Examples
///
/// ```
/// use zodkit_core::{SchemaParams, int};
///
/// let schema = int().with_params(SchemaParams::new().coerce().with_error("not a number"));
/// assert_eq!(schema.parse("7").unwrap().as_i64(), Some(7));
/// assert_eq!(schema.parse("seven").unwrap_err().to_string(), "not a number");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaParams {
    /// Run the type's coercer before type inference.
    pub coerce: bool,
    /// Message override for issues raised by this schema or check.
    pub error: Option<ErrorMessage>,
    /// Free-form description, carried for introspection.
    pub description: Option<String>,
    /// Stop running further checks after this check fails.
    pub abort: bool,
    /// Extra path appended to issues raised by this check.
    pub path: Vec<PathSegment>,
    /// User parameters copied onto custom issues.
    pub params: BTreeMap<String, Value>,
}

impl SchemaParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    pub fn abort(mut self) -> Self {
        self.abort = true;
        self
    }

    pub fn with_error(mut self, error: impl Into<ErrorMessage>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }
}

impl From<&str> for SchemaParams {
    fn from(v: &str) -> Self {
        SchemaParams::new().with_error(v)
    }
}

impl From<String> for SchemaParams {
    fn from(v: String) -> Self {
        SchemaParams::new().with_error(v)
    }
}

impl From<ErrorMessage> for SchemaParams {
    fn from(v: ErrorMessage) -> Self {
        SchemaParams {
            error: Some(v),
            ..SchemaParams::default()
        }
    }
}
