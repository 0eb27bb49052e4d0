//! Error types surfaced by parsing, coercion, and configuration.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::issue::{Issue, IssueCode};
use crate::value::format_path;

/// Aggregate parse failure: the finalized issues in the order they were
/// raised.
///
/// Displays as the first issue's message.
///
/// # Examples
///
/// ```
/// use zodkit_core::{IssueCode, string};
///
/// let err = string().min(3).parse("hi").unwrap_err();
/// assert_eq!(err.issues().len(), 1);
/// assert_eq!(err.issues()[0].code, IssueCode::TooSmall);
/// assert_eq!(err.to_string(), "string must be at least 3");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{}", first_message(.issues))]
pub struct ZodError {
    issues: Vec<Issue>,
}

fn first_message(issues: &[Issue]) -> &str {
    issues
        .first()
        .map_or("validation failed", |issue| issue.message.as_str())
}

/// Issues grouped by their first path segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedError {
    /// Messages of issues raised at the root.
    pub form_errors: Vec<String>,
    /// Messages keyed by the first path segment.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ZodError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn first(&self) -> Option<&Issue> {
        self.issues.first()
    }

    /// Code of the first issue.
    pub fn code(&self) -> Option<IssueCode> {
        self.first().map(|issue| issue.code)
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    pub fn flatten(&self) -> FlattenedError {
        let mut flat = FlattenedError::default();
        for issue in &self.issues {
            match issue.path.first() {
                Some(segment) => flat
                    .field_errors
                    .entry(segment.to_string())
                    .or_default()
                    .push(issue.message.clone()),
                None => flat.form_errors.push(issue.message.clone()),
            }
        }
        flat
    }

    /// One line per issue: `✖ message` followed by `→ at path` when the
    /// issue is nested.
    pub fn format_pretty(&self) -> String {
        let mut lines = Vec::new();
        for issue in &self.issues {
            lines.push(format!("✖ {}", issue.message));
            if !issue.path.is_empty() {
                lines.push(format!("  → at {}", format_path(&issue.path)));
            }
        }
        lines.join("\n")
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.issues).unwrap_or(serde_json::Value::Null)
    }
}

/// Deterministic rejections raised before or outside the check loop.
///
/// The parse driver converts these into issues; they surface directly from
/// the standalone coercion helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("expected numeric type, received {0}")]
    ExpectedNumeric(String),
    #[error("expected complex number, received {0}")]
    ExpectedComplex(String),
    #[error("expected map, received {0}")]
    ExpectedMap(String),
    #[error("cannot transform null {0}")]
    CannotTransformNull(String),
    #[error("invalid complex number format: {0}")]
    InvalidComplexFormat(String),
    #[error("function signature mismatch: expected {expected}, received {received}")]
    SignatureMismatch { expected: String, received: String },
    /// Coercion found no conversion from the input to the target type.
    #[error("cannot convert {received} to {target}")]
    Unconvertible {
        received: String,
        target: &'static str,
    },
}

/// Errors raised while loading configuration or message catalogs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A catalog defines a message id that no issue uses.
    #[error("unknown message id: {0}")]
    UnknownMessageId(String),
}
