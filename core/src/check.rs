//! Value-level checks.
//!
//! A [`Check`] inspects the working value of a [`ParsePayload`] and appends
//! issues when it fails. Checks live on a schema's definition in insertion
//! order and run in that order; every check runs and every failure is
//! reported, unless a failing check was configured to abort.
//!
//! Checks that do not apply to the value's kind (a length bound on a number,
//! a format on a non-string) pass silently; type mismatches are reported by
//! the parse driver before any check runs.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::Zero;
use regex::Regex;

use crate::context::ParsePayload;
use crate::error::SchemaError;
use crate::format::StringFormat;
use crate::issue::{
    RawIssue, create_custom_issue, create_invalid_format_issue, create_not_multiple_of_issue,
    create_too_big_issue, create_too_small_issue,
};
use crate::params::{ErrorMessage, SchemaParams};
use crate::value::{Ptr, Value, compare};

/// Predicate used by refinements.
///
/// An `Err` means the predicate could not be applied to the value (for
/// example a typed predicate received a value of another type).
pub type RefineFn = Arc<dyn Fn(&Value) -> Result<bool, SchemaError> + Send + Sync>;

/// Raw payload access for checks that emit their own issues.
pub type PayloadFn = Arc<dyn Fn(&mut ParsePayload) + Send + Sync>;

/// Value rewrite applied in place by normalizing checks (`trim`, ...).
pub type OverwriteFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// The built-in check kinds.
#[derive(Clone)]
pub enum CheckKind {
    /// `value > bound` (or `>=` when inclusive); emits `too_small`.
    GreaterThan { bound: Value, inclusive: bool },
    /// `value < bound` (or `<=` when inclusive); emits `too_big`.
    LessThan { bound: Value, inclusive: bool },
    /// Emits `not_multiple_of`.
    MultipleOf(Value),
    /// Minimum length of a string (in characters), array or map.
    MinLength(usize),
    MaxLength(usize),
    /// Exact length; emits `too_small` or `too_big`.
    Length(usize),
    /// Lower bound resolved against the produced value: its length for
    /// strings, arrays and maps, its ordering otherwise.
    Min(Value),
    Max(Value),
    Regex(Regex),
    Format(StringFormat),
    StartsWith(String),
    EndsWith(String),
    Includes(String),
    Lowercase,
    Uppercase,
    Overwrite(OverwriteFn),
    /// User predicate; emits `custom` when it returns `false`.
    Refine(RefineFn),
    /// User check with raw payload access.
    Custom(PayloadFn),
}

impl fmt::Debug for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::GreaterThan { bound, inclusive } => f
                .debug_struct("GreaterThan")
                .field("bound", bound)
                .field("inclusive", inclusive)
                .finish(),
            CheckKind::LessThan { bound, inclusive } => f
                .debug_struct("LessThan")
                .field("bound", bound)
                .field("inclusive", inclusive)
                .finish(),
            CheckKind::MultipleOf(d) => f.debug_tuple("MultipleOf").field(d).finish(),
            CheckKind::MinLength(n) => f.debug_tuple("MinLength").field(n).finish(),
            CheckKind::MaxLength(n) => f.debug_tuple("MaxLength").field(n).finish(),
            CheckKind::Length(n) => f.debug_tuple("Length").field(n).finish(),
            CheckKind::Min(v) => f.debug_tuple("Min").field(v).finish(),
            CheckKind::Max(v) => f.debug_tuple("Max").field(v).finish(),
            CheckKind::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            CheckKind::Format(fmt) => f.debug_tuple("Format").field(fmt).finish(),
            CheckKind::StartsWith(s) => f.debug_tuple("StartsWith").field(s).finish(),
            CheckKind::EndsWith(s) => f.debug_tuple("EndsWith").field(s).finish(),
            CheckKind::Includes(s) => f.debug_tuple("Includes").field(s).finish(),
            CheckKind::Lowercase => f.write_str("Lowercase"),
            CheckKind::Uppercase => f.write_str("Uppercase"),
            CheckKind::Overwrite(_) => f.write_str("Overwrite(<fn>)"),
            CheckKind::Refine(_) => f.write_str("Refine(<fn>)"),
            CheckKind::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// A check together with its parameters.
#[derive(Debug, Clone)]
pub struct Check {
    pub kind: CheckKind,
    pub params: SchemaParams,
}

impl Check {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            params: SchemaParams::default(),
        }
    }

    pub fn with_params(kind: CheckKind, params: SchemaParams) -> Self {
        Self { kind, params }
    }

    /// Runs the check against `payload.value`.
    ///
    /// `origin` names the schema type for numeric bounds; `inst` is the
    /// owning schema's error override, used when the check has none.
    pub fn run(&self, payload: &mut ParsePayload, origin: &str, inst: Option<&ErrorMessage>) {
        let inst = self.params.error.clone().or_else(|| inst.cloned());
        let before = payload.issues.len();

        let issue = match &self.kind {
            CheckKind::Custom(f) => {
                f(payload);
                for issue in &mut payload.issues[before..] {
                    if issue.inst.is_none() {
                        issue.inst = inst.clone();
                    }
                }
                None
            }
            CheckKind::Overwrite(f) => {
                let next = f(payload.value.deref());
                if next != *payload.value.deref() {
                    payload.value = if payload.value.is_ptr() {
                        Value::Ptr(Ptr::new(next))
                    } else {
                        next
                    };
                }
                None
            }
            kind => evaluate(kind, payload.value.deref(), origin, &self.params),
        };

        if let Some(issue) = issue {
            let issue = issue
                .with_inst(inst)
                .with_abort(self.params.abort)
                .with_path(self.params.path.clone());
            payload.add_issue(issue);
        }
    }
}

/// Runs `checks` in order, stopping after an aborting failure.
pub(crate) fn run_checks(
    checks: &[Check],
    payload: &mut ParsePayload,
    origin: &str,
    inst: Option<&ErrorMessage>,
) {
    let start = payload.issues.len();
    for check in checks {
        check.run(payload, origin, inst);
        if payload.issues[start..].iter().any(|issue| issue.abort) {
            break;
        }
    }
}

fn length_of(value: &Value) -> Option<(usize, &'static str)> {
    match value {
        Value::String(s) => Some((s.chars().count(), "string")),
        Value::Array(items) => Some((items.len(), "array")),
        Value::Map(map) => Some((map.len(), "object")),
        _ => None,
    }
}

/// A length bound given as a value; negative or non-integer bounds are 0.
fn size_bound(bound: &Value) -> usize {
    bound
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

fn evaluate(kind: &CheckKind, value: &Value, origin: &str, params: &SchemaParams) -> Option<RawIssue> {
    use std::cmp::Ordering;

    match kind {
        CheckKind::GreaterThan { bound, inclusive } => {
            let ordering = compare(value, bound)?;
            let ok = ordering == Ordering::Greater || (*inclusive && ordering == Ordering::Equal);
            (!ok).then(|| create_too_small_issue(bound.clone(), *inclusive, origin, value))
        }
        CheckKind::LessThan { bound, inclusive } => {
            let ordering = compare(value, bound)?;
            let ok = ordering == Ordering::Less || (*inclusive && ordering == Ordering::Equal);
            (!ok).then(|| create_too_big_issue(bound.clone(), *inclusive, origin, value))
        }
        CheckKind::MultipleOf(divisor) => {
            let ok = is_multiple(value, divisor)?;
            (!ok).then(|| create_not_multiple_of_issue(divisor.clone(), origin, value))
        }
        CheckKind::MinLength(min) => {
            let (len, origin) = length_of(value)?;
            (len < *min).then(|| create_too_small_issue(*min, true, origin, value))
        }
        CheckKind::MaxLength(max) => {
            let (len, origin) = length_of(value)?;
            (len > *max).then(|| create_too_big_issue(*max, true, origin, value))
        }
        CheckKind::Length(exact) => {
            let (len, origin) = length_of(value)?;
            if len < *exact {
                Some(create_too_small_issue(*exact, true, origin, value))
            } else if len > *exact {
                Some(create_too_big_issue(*exact, true, origin, value))
            } else {
                None
            }
        }
        CheckKind::Min(bound) => match length_of(value) {
            Some((len, origin)) => {
                let min = size_bound(bound);
                (len < min).then(|| create_too_small_issue(min, true, origin, value))
            }
            None => {
                let ok = compare(value, bound)? != Ordering::Less;
                (!ok).then(|| create_too_small_issue(bound.clone(), true, origin, value))
            }
        },
        CheckKind::Max(bound) => match length_of(value) {
            Some((len, origin)) => {
                let max = size_bound(bound);
                (len > max).then(|| create_too_big_issue(max, true, origin, value))
            }
            None => {
                let ok = compare(value, bound)? != Ordering::Greater;
                (!ok).then(|| create_too_big_issue(bound.clone(), true, origin, value))
            }
        },
        CheckKind::Regex(re) => {
            let s = value.as_str()?;
            (!re.is_match(s)).then(|| {
                create_invalid_format_issue("regex", value).with_pattern(re.as_str())
            })
        }
        CheckKind::Format(format) => {
            let s = value.as_str()?;
            (!format.matches(s)).then(|| create_invalid_format_issue(format.name(), value))
        }
        CheckKind::StartsWith(prefix) => {
            let s = value.as_str()?;
            (!s.starts_with(prefix.as_str())).then(|| {
                create_invalid_format_issue("starts_with", value).with_pattern(prefix.clone())
            })
        }
        CheckKind::EndsWith(suffix) => {
            let s = value.as_str()?;
            (!s.ends_with(suffix.as_str())).then(|| {
                create_invalid_format_issue("ends_with", value).with_pattern(suffix.clone())
            })
        }
        CheckKind::Includes(needle) => {
            let s = value.as_str()?;
            (!s.contains(needle.as_str())).then(|| {
                create_invalid_format_issue("includes", value).with_pattern(needle.clone())
            })
        }
        CheckKind::Lowercase => {
            let s = value.as_str()?;
            (s != s.to_lowercase()).then(|| create_invalid_format_issue("lowercase", value))
        }
        CheckKind::Uppercase => {
            let s = value.as_str()?;
            (s != s.to_uppercase()).then(|| create_invalid_format_issue("uppercase", value))
        }
        CheckKind::Refine(predicate) => match predicate(value) {
            Ok(true) => None,
            Ok(false) => Some(create_custom_issue(None, params.params.clone(), value)),
            Err(err) => Some(create_custom_issue(
                Some(&err.to_string()),
                params.params.clone(),
                value,
            )),
        },
        CheckKind::Custom(_) | CheckKind::Overwrite(_) => None,
    }
}

/// `Some(true)` when `value` is a multiple of `divisor`; `None` when the
/// pair is not numeric or the divisor is zero.
fn is_multiple(value: &Value, divisor: &Value) -> Option<bool> {
    match (value, divisor.deref()) {
        (Value::BigInt(_), _) | (_, Value::BigInt(_)) => {
            let v = bigint_of(value)?;
            let d = bigint_of(divisor)?;
            if d.is_zero() {
                return None;
            }
            Some((v % d).is_zero())
        }
        (Value::Int(_) | Value::Uint(_), Value::Int(_) | Value::Uint(_)) => {
            let v = int_of(value)?;
            let d = int_of(divisor)?;
            if d == 0 {
                return None;
            }
            Some(v % d == 0)
        }
        _ => {
            let v = value.as_f64()?;
            let d = divisor.as_f64()?;
            if d == 0.0 || !v.is_finite() {
                return None;
            }
            let quotient = v / d;
            let tolerance = 1e-9 * quotient.abs().max(1.0);
            Some((quotient - quotient.round()).abs() <= tolerance)
        }
    }
}

fn int_of(value: &Value) -> Option<i128> {
    match value.deref() {
        Value::Int(i) => Some(i128::from(*i)),
        Value::Uint(u) => Some(i128::from(*u)),
        _ => None,
    }
}

fn bigint_of(value: &Value) -> Option<BigInt> {
    match value.deref() {
        Value::BigInt(b) => Some(b.clone()),
        Value::Int(i) => Some(BigInt::from(*i)),
        Value::Uint(u) => Some(BigInt::from(*u)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueCode;

    fn run(kind: CheckKind, value: impl Into<Value>) -> Vec<RawIssue> {
        let mut payload = ParsePayload::new(value);
        Check::new(kind).run(&mut payload, "int", None);
        payload.issues
    }

    #[test]
    fn test_greater_than_inclusive_and_exclusive() {
        let gte = CheckKind::GreaterThan { bound: Value::Int(5), inclusive: true };
        assert!(run(gte.clone(), 5i64).is_empty());
        let issues = run(gte, 4i64);
        assert_eq!(issues[0].code, IssueCode::TooSmall);
        assert_eq!(issues[0].minimum(), Value::Int(5));
        assert!(issues[0].inclusive());
        assert_eq!(issues[0].origin(), "int");

        let gt = CheckKind::GreaterThan { bound: Value::Int(5), inclusive: false };
        assert_eq!(run(gt, 5i64).len(), 1);
    }

    #[test]
    fn test_less_than_on_floats() {
        let lt = CheckKind::LessThan { bound: Value::Float(1.5), inclusive: false };
        assert!(run(lt.clone(), 1.4f64).is_empty());
        assert_eq!(run(lt, 1.5f64)[0].code, IssueCode::TooBig);
    }

    #[test]
    fn test_multiple_of() {
        assert!(run(CheckKind::MultipleOf(Value::Int(3)), 9i64).is_empty());
        assert_eq!(run(CheckKind::MultipleOf(Value::Int(3)), 10i64)[0].code, IssueCode::NotMultipleOf);
        assert!(run(CheckKind::MultipleOf(Value::Float(0.1)), 0.3f64).is_empty());
        assert_eq!(run(CheckKind::MultipleOf(Value::Float(0.25)), 0.3f64).len(), 1);
        let big: BigInt = "100000000000000000000".parse().unwrap();
        assert!(run(CheckKind::MultipleOf(Value::Int(10)), Value::BigInt(big)).is_empty());
    }

    #[test]
    fn test_lengths_count_characters() {
        assert!(run(CheckKind::MinLength(3), "héé").is_empty());
        let issues = run(CheckKind::MaxLength(2), vec![1i64, 2, 3]);
        assert_eq!(issues[0].code, IssueCode::TooBig);
        assert_eq!(issues[0].origin(), "array");
        assert_eq!(run(CheckKind::Length(2), "abc")[0].code, IssueCode::TooBig);
        assert_eq!(run(CheckKind::Length(4), "abc")[0].code, IssueCode::TooSmall);
    }

    #[test]
    fn test_checks_skip_other_kinds() {
        assert!(run(CheckKind::MinLength(3), 1i64).is_empty());
        assert!(run(CheckKind::Format(StringFormat::Email), 1i64).is_empty());
        let gt = CheckKind::GreaterThan { bound: Value::Int(5), inclusive: true };
        assert!(run(gt, "abc").is_empty());
    }

    #[test]
    fn test_regex_reports_pattern() {
        let issues = run(CheckKind::Regex(Regex::new("^a+$").unwrap()), "abc");
        assert_eq!(issues[0].code, IssueCode::InvalidFormat);
        assert_eq!(issues[0].format(), "regex");
        assert_eq!(issues[0].pattern(), "^a+$");
    }

    #[test]
    fn test_refine_error_becomes_message() {
        let f: RefineFn = Arc::new(|_| {
            Err(SchemaError::SignatureMismatch {
                expected: "string".into(),
                received: "int".into(),
            })
        });
        let issues = run(CheckKind::Refine(f), 1i64);
        assert_eq!(issues[0].code, IssueCode::Custom);
        assert!(issues[0].message.as_deref().unwrap().contains("signature mismatch"));
    }

    #[test]
    fn test_abort_stops_remaining_checks() {
        let checks = vec![
            Check::with_params(CheckKind::MinLength(5), SchemaParams::new().abort()),
            Check::new(CheckKind::Format(StringFormat::Email)),
        ];
        let mut payload = ParsePayload::new("abc");
        run_checks(&checks, &mut payload, "string", None);
        assert_eq!(payload.issues.len(), 1);

        let checks = vec![
            Check::new(CheckKind::MinLength(5)),
            Check::new(CheckKind::Format(StringFormat::Email)),
        ];
        let mut payload = ParsePayload::new("abc");
        run_checks(&checks, &mut payload, "string", None);
        assert_eq!(payload.issues.len(), 2);
    }

    #[test]
    fn test_custom_check_emits_multiple_issues() {
        let f: PayloadFn = Arc::new(|payload: &mut ParsePayload| {
            payload.add_issue(RawIssue::new(IssueCode::TooBig, Value::Null));
            payload.add_issue(RawIssue::new(IssueCode::InvalidValue, Value::Null));
        });
        let check = Check::with_params(CheckKind::Custom(f), SchemaParams::from("custom msg"));
        let mut payload = ParsePayload::new(1i64);
        check.run(&mut payload, "int", None);
        assert_eq!(payload.issues.len(), 2);
        assert!(payload.issues.iter().all(|i| i.inst.is_some()));
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let f: OverwriteFn = Arc::new(|v| Value::from(v.as_str().unwrap_or_default().trim()));
        let mut payload = ParsePayload::new("  hi ");
        Check::new(CheckKind::Overwrite(f)).run(&mut payload, "string", None);
        assert_eq!(payload.value, Value::from("hi"));
    }
}
