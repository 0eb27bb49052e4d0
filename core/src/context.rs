//! Per-parse state: the caller's context and the payload threaded through
//! nested parses.

use std::fmt;
use std::sync::Arc;

use crate::issue::{IssueCode, RawIssue};
use crate::params::ErrorMap;
use crate::value::{PathSegment, Value};

/// Runtime overrides supplied by the caller of a parse.
#[derive(Clone)]
pub struct ParseContext {
    /// Include the offending input in finalized issues.
    pub report_input: bool,
    /// Message override consulted after the schema's own override.
    pub error_map: Option<ErrorMap>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            report_input: true,
            error_map: None,
        }
    }
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elides inputs from finalized issues, for sensitive data.
    pub fn without_input(mut self) -> Self {
        self.report_input = false;
        self
    }

    pub fn with_error_map<F>(mut self, f: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.error_map = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("report_input", &self.report_input)
            .field("error_map", &self.error_map.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Mutable triple threaded through a parse: the working value, the issues
/// raised so far, and the path of the current position.
#[derive(Debug, Clone, Default)]
pub struct ParsePayload {
    pub value: Value,
    pub issues: Vec<RawIssue>,
    pub path: Vec<PathSegment>,
}

impl ParsePayload {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            issues: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Payload for a nested position one segment below this one.
    pub(crate) fn child(&self, value: Value, segment: impl Into<PathSegment>) -> ParsePayload {
        let mut path = self.path.clone();
        path.push(segment.into());
        ParsePayload {
            value,
            issues: Vec::new(),
            path,
        }
    }

    /// Payload at the same position with a different value and no issues.
    pub(crate) fn fork(&self, value: Value) -> ParsePayload {
        ParsePayload {
            value,
            issues: Vec::new(),
            path: self.path.clone(),
        }
    }

    /// Records a fresh issue, prefixing its path with the current path.
    pub fn add_issue(&mut self, mut issue: RawIssue) {
        if !self.path.is_empty() {
            let mut path = self.path.clone();
            path.append(&mut issue.path);
            issue.path = path;
        }
        self.issues.push(issue);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// `true` once an aborting issue has been recorded.
    pub fn is_aborted(&self) -> bool {
        self.issues.iter().any(|issue| issue.abort)
    }
}

/// Handle given to transforms for reporting issues against the current
/// position.
pub struct RefinementCtx<'a> {
    payload: &'a mut ParsePayload,
}

impl<'a> RefinementCtx<'a> {
    pub(crate) fn new(payload: &'a mut ParsePayload) -> Self {
        Self { payload }
    }

    /// The value being transformed.
    pub fn value(&self) -> &Value {
        &self.payload.value
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.payload.path
    }

    pub fn add_issue(&mut self, issue: RawIssue) {
        self.payload.add_issue(issue);
    }

    /// Shorthand for a `custom` issue with `message`.
    pub fn add_message(&mut self, message: impl Into<String>) {
        let input = self.payload.value.clone();
        self.payload
            .add_issue(RawIssue::new(IssueCode::Custom, input).with_message(message));
    }
}
