//! Primitive schema kinds: constructors, type narrowing and the coercer
//! dispatch used by the leaf driver.

use std::collections::BTreeSet;

use num_complex::Complex64;
use serde::Deserialize;

use crate::coerce;
use crate::error::SchemaError;
use crate::issue::{IssueCode, RawIssue, create_too_big_issue, create_too_small_issue};
use crate::schema::{Schema, TypeDef};
use crate::value::{Kind, Value};

/// The closed set of real number schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
}

impl NumericKind {
    pub fn name(self) -> &'static str {
        match self {
            NumericKind::Int => "int",
            NumericKind::Int8 => "int8",
            NumericKind::Int16 => "int16",
            NumericKind::Int32 => "int32",
            NumericKind::Int64 => "int64",
            NumericKind::Uint => "uint",
            NumericKind::Uint8 => "uint8",
            NumericKind::Uint16 => "uint16",
            NumericKind::Uint32 => "uint32",
            NumericKind::Uint64 => "uint64",
            NumericKind::Float32 => "float32",
            NumericKind::Float64 => "float64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, NumericKind::Float32 | NumericKind::Float64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            NumericKind::Int
                | NumericKind::Int8
                | NumericKind::Int16
                | NumericKind::Int32
                | NumericKind::Int64
        )
    }

    pub fn value_kind(self) -> Kind {
        if self.is_float() {
            Kind::Float
        } else if self.is_signed() {
            Kind::Int
        } else {
            Kind::Uint
        }
    }

    /// Inclusive range of the integer kinds; `None` for floats.
    pub fn int_range(self) -> Option<(i128, i128)> {
        let range = match self {
            NumericKind::Int | NumericKind::Int64 => (i64::MIN.into(), i64::MAX.into()),
            NumericKind::Int8 => (i8::MIN.into(), i8::MAX.into()),
            NumericKind::Int16 => (i16::MIN.into(), i16::MAX.into()),
            NumericKind::Int32 => (i32::MIN.into(), i32::MAX.into()),
            NumericKind::Uint | NumericKind::Uint64 => (0, u64::MAX.into()),
            NumericKind::Uint8 => (0, u8::MAX.into()),
            NumericKind::Uint16 => (0, u16::MAX.into()),
            NumericKind::Uint32 => (0, u32::MAX.into()),
            NumericKind::Float32 | NumericKind::Float64 => return None,
        };
        Some(range)
    }
}

/// Complex number widths. `Complex64` stores both parts at `f32`
/// precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplexKind {
    Complex64,
    Complex128,
}

impl ComplexKind {
    pub fn name(self) -> &'static str {
        match self {
            ComplexKind::Complex64 => "complex64",
            ComplexKind::Complex128 => "complex128",
        }
    }
}

/// Case handling of [`StringBoolOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Sensitive,
    #[default]
    Insensitive,
}

/// Truthy and falsy spellings accepted by [`string_bool`].
///
/// In sensitive mode only exact spellings match; a differently cased
/// entry is no match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StringBoolOptions {
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
    pub case: Case,
}

impl Default for StringBoolOptions {
    fn default() -> Self {
        Self {
            truthy: ["true", "1", "yes", "on", "y", "enabled"]
                .map(String::from)
                .to_vec(),
            falsy: ["false", "0", "no", "off", "n", "disabled"]
                .map(String::from)
                .to_vec(),
            case: Case::Insensitive,
        }
    }
}

impl StringBoolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_truthy<I, S>(mut self, truthy: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.truthy = truthy.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_falsy<I, S>(mut self, falsy: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.falsy = falsy.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_case(mut self, case: Case) -> Self {
        self.case = case;
        self
    }

    /// Reads `s` as a boolean, `None` when it is in neither set.
    pub fn resolve(&self, s: &str) -> Option<bool> {
        let matches = |set: &[String]| match self.case {
            Case::Sensitive => set.iter().any(|entry| entry == s),
            Case::Insensitive => set.iter().any(|entry| entry.eq_ignore_ascii_case(s)),
        };
        if matches(&self.truthy) {
            Some(true)
        } else if matches(&self.falsy) {
            Some(false)
        } else {
            None
        }
    }

    fn spellings(&self) -> Vec<Value> {
        self.truthy
            .iter()
            .chain(&self.falsy)
            .map(|s| Value::from(s.as_str()))
            .collect()
    }
}

/// Why a leaf rejected a value.
pub(crate) enum Rejection {
    /// Wrong kind; reported as `invalid_type`.
    Type,
    /// A kind-specific issue (out of width, not an allowed value).
    Issue(RawIssue),
}

/// `true` when `value` already has the kind `kind` produces, so coercion
/// must not run.
pub(crate) fn is_target(kind: &TypeDef, value: &Value) -> bool {
    match kind {
        TypeDef::String => matches!(value, Value::String(_)),
        TypeDef::Number(n) if n.is_float() => {
            matches!(value, Value::Float(_) | Value::Int(_) | Value::Uint(_))
        }
        TypeDef::Number(_) => matches!(value, Value::Int(_) | Value::Uint(_)),
        TypeDef::Bool => matches!(value, Value::Bool(_)),
        TypeDef::BigInt => matches!(value, Value::BigInt(_)),
        TypeDef::Complex(_) => matches!(value, Value::Complex(_)),
        TypeDef::Date => matches!(value, Value::Date(_)),
        TypeDef::Enum(_) | TypeDef::StringBool(_) => matches!(value, Value::String(_)),
        _ => true,
    }
}

/// Runs the coercer for `kind`.
pub(crate) fn coerce(kind: &TypeDef, value: &Value) -> Result<Value, SchemaError> {
    match kind {
        TypeDef::String => coerce::to_string(value),
        TypeDef::Number(n) if n.is_float() => coerce::to_float(value),
        TypeDef::Number(_) => coerce::to_int(value),
        TypeDef::Bool => coerce::to_bool(value),
        TypeDef::BigInt => coerce::to_bigint(value),
        TypeDef::Complex(_) => coerce::to_complex(value),
        TypeDef::Date => coerce::to_date(value),
        TypeDef::Enum(_) | TypeDef::StringBool(_) => coerce::to_string(value),
        _ => Ok(value.clone()),
    }
}

/// Narrows `value` to the type `kind` describes.
pub(crate) fn accept(kind: &TypeDef, value: &Value) -> Result<Value, Rejection> {
    match (kind, value) {
        (TypeDef::String, Value::String(_))
        | (TypeDef::Bool, Value::Bool(_))
        | (TypeDef::BigInt, Value::BigInt(_))
        | (TypeDef::Date, Value::Date(_))
        | (TypeDef::Any | TypeDef::Unknown, _)
        | (TypeDef::Null | TypeDef::Undefined, Value::Null) => Ok(value.clone()),
        (TypeDef::Number(n), _) => accept_number(*n, value),
        (TypeDef::Complex(ComplexKind::Complex128), Value::Complex(c)) => Ok(Value::Complex(*c)),
        (TypeDef::Complex(ComplexKind::Complex64), Value::Complex(c)) => Ok(Value::Complex(
            Complex64::new(f64::from(c.re as f32), f64::from(c.im as f32)),
        )),
        (TypeDef::Literal(values) | TypeDef::Enum(values), _) => {
            if values.iter().any(|v| v == value) {
                Ok(value.clone())
            } else {
                Err(Rejection::Issue(
                    RawIssue::new(IssueCode::InvalidValue, value.clone()).with_values(values.clone()),
                ))
            }
        }
        (TypeDef::StringBool(options), Value::String(s)) => match options.resolve(s) {
            Some(b) => Ok(Value::Bool(b)),
            None => Err(Rejection::Issue(
                RawIssue::new(IssueCode::InvalidValue, value.clone())
                    .with_values(options.spellings()),
            )),
        },
        _ => Err(Rejection::Type),
    }
}

fn accept_number(kind: NumericKind, value: &Value) -> Result<Value, Rejection> {
    let Some((min, max)) = kind.int_range() else {
        return accept_float(kind, value);
    };
    let n = match value {
        Value::Int(i) => i128::from(*i),
        Value::Uint(u) => i128::from(*u),
        _ => return Err(Rejection::Type),
    };
    if n > max {
        return Err(Rejection::Issue(create_too_big_issue(
            int_value(max),
            true,
            kind.name(),
            value,
        )));
    }
    if n < min {
        return Err(Rejection::Issue(create_too_small_issue(
            int_value(min),
            true,
            kind.name(),
            value,
        )));
    }
    Ok(if kind.is_signed() {
        Value::Int(n as i64)
    } else {
        Value::Uint(n as u64)
    })
}

fn accept_float(kind: NumericKind, value: &Value) -> Result<Value, Rejection> {
    let f = match value {
        Value::Float(f) if f.is_nan() => return Err(Rejection::Type),
        Value::Float(f) => *f,
        Value::Int(_) | Value::Uint(_) => value.as_f64().ok_or(Rejection::Type)?,
        _ => return Err(Rejection::Type),
    };
    if kind == NumericKind::Float32 && f.is_finite() {
        let limit = f64::from(f32::MAX);
        if f > limit {
            return Err(Rejection::Issue(create_too_big_issue(limit, true, kind.name(), value)));
        }
        if f < -limit {
            return Err(Rejection::Issue(create_too_small_issue(-limit, true, kind.name(), value)));
        }
    }
    Ok(Value::Float(f))
}

fn int_value(n: i128) -> Value {
    match i64::try_from(n) {
        Ok(i) => Value::Int(i),
        Err(_) => Value::Uint(n as u64),
    }
}

fn number(kind: NumericKind) -> Schema {
    Schema::from_def(TypeDef::Number(kind))
}

pub fn string() -> Schema {
    Schema::from_def(TypeDef::String)
}

/// Signed integer in the `i64` range.
pub fn int() -> Schema {
    number(NumericKind::Int)
}

pub fn int8() -> Schema {
    number(NumericKind::Int8)
}

pub fn int16() -> Schema {
    number(NumericKind::Int16)
}

pub fn int32() -> Schema {
    number(NumericKind::Int32)
}

pub fn int64() -> Schema {
    number(NumericKind::Int64)
}

/// Unsigned integer in the `u64` range.
pub fn uint() -> Schema {
    number(NumericKind::Uint)
}

pub fn uint8() -> Schema {
    number(NumericKind::Uint8)
}

pub fn uint16() -> Schema {
    number(NumericKind::Uint16)
}

pub fn uint32() -> Schema {
    number(NumericKind::Uint32)
}

pub fn uint64() -> Schema {
    number(NumericKind::Uint64)
}

pub fn float32() -> Schema {
    number(NumericKind::Float32)
}

/// Any real number; integers are widened. `NaN` is rejected.
pub fn float64() -> Schema {
    number(NumericKind::Float64)
}

pub fn boolean() -> Schema {
    Schema::from_def(TypeDef::Bool)
}

pub fn bigint() -> Schema {
    Schema::from_def(TypeDef::BigInt)
}

pub fn complex64() -> Schema {
    Schema::from_def(TypeDef::Complex(ComplexKind::Complex64))
}

pub fn complex128() -> Schema {
    Schema::from_def(TypeDef::Complex(ComplexKind::Complex128))
}

pub fn date() -> Schema {
    Schema::from_def(TypeDef::Date)
}

/// Accepts exactly one of `values`.
///
/// # Examples
///
/// ```
/// use zodkit_core::{IssueCode, literal};
///
/// let schema = literal(["admin", "owner"]);
/// assert!(schema.parse("admin").is_ok());
/// assert_eq!(schema.parse("guest").unwrap_err().code(), Some(IssueCode::InvalidValue));
/// ```
pub fn literal<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Schema::from_def(TypeDef::Literal(values.into_iter().map(Into::into).collect()))
}

/// Accepts one of the listed strings. Duplicates are dropped.
pub fn enumeration(options: &[&str]) -> Schema {
    let mut seen = BTreeSet::new();
    let values = options
        .iter()
        .filter(|o| seen.insert(**o))
        .map(|o| Value::from(*o))
        .collect();
    Schema::from_def(TypeDef::Enum(values))
}

/// Accepts every value, null included.
pub fn any() -> Schema {
    Schema::from_def(TypeDef::Any)
}

pub fn unknown() -> Schema {
    Schema::from_def(TypeDef::Unknown)
}

/// Rejects every value.
pub fn never() -> Schema {
    Schema::from_def(TypeDef::Never)
}

/// Accepts only null.
pub fn null() -> Schema {
    Schema::from_def(TypeDef::Null)
}

pub fn undefined() -> Schema {
    Schema::from_def(TypeDef::Undefined)
}

/// Reads booleans from strings using configurable spellings.
///
/// # Examples
///
/// ```
/// use zodkit_core::{StringBoolOptions, Value, string_bool};
///
/// let schema = string_bool(StringBoolOptions::new().with_truthy(["y"]).with_falsy(["n"]));
/// assert_eq!(schema.parse("Y").unwrap(), Value::Bool(true));
/// assert!(schema.parse("yes").is_err());
/// ```
pub fn string_bool(options: StringBoolOptions) -> Schema {
    Schema::from_def(TypeDef::StringBool(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_widths_report_bounds() {
        let err = int8().parse(300).unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.code, IssueCode::TooBig);
        assert_eq!(issue.maximum, Some(Value::Int(127)));
        assert_eq!(issue.origin.as_deref(), Some("int8"));

        let err = uint8().parse(-1).unwrap_err();
        assert_eq!(err.code(), Some(IssueCode::TooSmall));
        assert_eq!(uint64().parse(u64::MAX).unwrap(), Value::Uint(u64::MAX));
        assert_eq!(int().parse(5u8).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_int_rejects_floats() {
        let err = int().parse(3.5).unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.code, IssueCode::InvalidType);
        assert_eq!(issue.expected.as_deref(), Some("int"));
        assert_eq!(issue.received.as_deref(), Some("float"));
    }

    #[test]
    fn test_float_widens_and_rejects_nan() {
        assert_eq!(float64().parse(3).unwrap(), Value::Float(3.0));
        let err = float64().parse(f64::NAN).unwrap_err();
        assert_eq!(err.first().unwrap().received.as_deref(), Some("NaN"));
        assert!(float32().parse(1e300).is_err());
        assert!(float64().parse(f64::INFINITY).is_ok());
    }

    #[test]
    fn test_complex_widths() {
        let c = Complex64::new(0.1, 0.2);
        assert_eq!(complex128().parse(c).unwrap(), Value::Complex(c));
        match complex64().parse(c).unwrap() {
            Value::Complex(out) => assert_eq!(out.re, f64::from(0.1f32)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(complex128().parse(1.0).is_err());
    }

    #[test]
    fn test_never_rejects_everything() {
        for input in [Value::from(1), Value::from("x"), Value::Null] {
            let err = never().parse(input).unwrap_err();
            assert_eq!(err.code(), Some(IssueCode::InvalidType));
        }
    }

    #[test]
    fn test_null_and_any() {
        assert_eq!(null().parse(Value::Null).unwrap(), Value::Null);
        assert!(null().parse(0).is_err());
        assert_eq!(any().parse(Value::Null).unwrap(), Value::Null);
        assert_eq!(unknown().parse("x").unwrap(), Value::from("x"));
    }

    #[test]
    fn test_enumeration_reports_options() {
        let schema = enumeration(&["Tuna", "Salmon", "Tuna"]);
        let err = schema.parse("Trout").unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.code, IssueCode::InvalidValue);
        assert_eq!(issue.values, vec![Value::from("Tuna"), Value::from("Salmon")]);
        assert_eq!(issue.message, "Invalid input: expected one of \"Tuna\"|\"Salmon\"");
    }

    #[test]
    fn test_string_bool_case_modes() {
        let default = string_bool(StringBoolOptions::default());
        assert_eq!(default.parse("ENABLED").unwrap(), Value::Bool(true));
        assert_eq!(default.parse("off").unwrap(), Value::Bool(false));

        let sensitive = string_bool(
            StringBoolOptions::new()
                .with_truthy(["Yes"])
                .with_falsy(["No"])
                .with_case(Case::Sensitive),
        );
        assert_eq!(sensitive.parse("Yes").unwrap(), Value::Bool(true));
        let err = sensitive.parse("no").unwrap_err();
        assert_eq!(err.code(), Some(IssueCode::InvalidValue));

        let err = default.parse(1).unwrap_err();
        assert_eq!(err.first().unwrap().expected.as_deref(), Some("string"));
    }

    #[test]
    fn test_string_bool_options_from_yaml() {
        let options: StringBoolOptions =
            serde_yaml::from_str("truthy: [si]\nfalsy: [no]\ncase: sensitive\n").unwrap();
        assert_eq!(options.resolve("si"), Some(true));
        assert_eq!(options.resolve("SI"), None);
    }
}
