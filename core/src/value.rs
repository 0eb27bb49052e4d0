//! Dynamic value model consumed and produced by every schema.
//!
//! Inputs arrive as a [`Value`], a closed enum over the primitive kinds the
//! engine understands (booleans, the integer and float families, big
//! integers, complex numbers, strings, timestamps) plus arrays, ordered maps
//! and shared references ([`Ptr`]).
//!
//! [`Ptr`] plays the role of a caller-owned pointer: a schema that receives a
//! `Ptr` hands back the very same `Ptr` when validation succeeds without
//! changing the value, so callers can rely on [`Ptr::ptr_eq`] identity.
//!
//! # Examples
//!
//! ```
//! use zodkit_core::{Ptr, Value};
//!
//! let v = Value::from("hello");
//! assert_eq!(v.as_str(), Some("hello"));
//!
//! let p = Ptr::new(42i64);
//! assert_eq!(Value::Ptr(p.clone()).deref().as_i64(), Some(42));
//! assert!(p.ptr_eq(&p.clone()));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::ToPrimitive;
use serde::{Serialize, Serializer};

/// Ordered string-keyed map used for object and record values.
pub type Map = IndexMap<String, Value>;

static NULL: Value = Value::Null;

/// Runtime kind of a [`Value`].
///
/// Used for the `received` side of type issues and for typed null pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Null,
    Bool,
    Int,
    Uint,
    Float,
    BigInt,
    Complex,
    String,
    Date,
    Array,
    Map,
}

impl Kind {
    /// Human-readable kind name used in issue messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::BigInt => "bigint",
            Kind::Complex => "complex",
            Kind::String => "string",
            Kind::Date => "date",
            Kind::Array => "array",
            Kind::Map => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared reference to a value, or a typed null.
///
/// Cloning a `Ptr` clones the handle, not the target.
#[derive(Debug, Clone)]
pub struct Ptr {
    target: Option<Arc<Value>>,
    elem: Kind,
}

impl Ptr {
    /// Wraps `value` in a new shared reference.
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        let elem = value.kind();
        Self {
            target: Some(Arc::new(value)),
            elem,
        }
    }

    /// Creates a null reference to a value of kind `elem`.
    pub fn null(elem: Kind) -> Self {
        Self { target: None, elem }
    }

    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// Returns the referenced value, `None` for a null reference.
    pub fn get(&self) -> Option<&Value> {
        self.target.as_deref()
    }

    /// Kind of the referenced value (or declared kind of a typed null).
    pub fn elem(&self) -> Kind {
        self.elem
    }

    /// Identity comparison.
    ///
    /// Two non-null references are identical when they share the same
    /// allocation; two null references when they declare the same kind.
    pub fn ptr_eq(&self, other: &Ptr) -> bool {
        match (&self.target, &other.target) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => self.elem == other.elem,
            _ => false,
        }
    }
}

/// A dynamically typed input or output value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    BigInt(BigInt),
    Complex(Complex64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Map(Map),
    Ptr(Ptr),
}

impl Value {
    /// Runtime kind; references report the kind of their target.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::BigInt(_) => Kind::BigInt,
            Value::Complex(_) => Kind::Complex,
            Value::String(_) => Kind::String,
            Value::Date(_) => Kind::Date,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Ptr(p) => p.get().map_or(Kind::Null, Value::kind),
        }
    }

    /// Name of the value's kind, as reported in `received`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Float(f) if f.is_nan() => "NaN",
            Value::Ptr(p) => p.get().map_or("null", Value::type_name),
            other => other.kind().name(),
        }
    }

    /// `true` only for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` for [`Value::Null`] and for null references.
    pub fn is_nullish(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Ptr(p) => p.is_null(),
            _ => false,
        }
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Value::Ptr(_))
    }

    /// Follows a reference to its target; a null reference yields `Null`.
    pub fn deref(&self) -> &Value {
        match self {
            Value::Ptr(p) => p.get().map_or(&NULL, Value::deref),
            other => other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.deref() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.deref() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of `Int`, `Uint` and `BigInt` values that fit an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self.deref() {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            Value::BigInt(b) => b.to_i64(),
            _ => None,
        }
    }

    /// Float view of any real number.
    pub fn as_f64(&self) -> Option<f64> {
        match self.deref() {
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            Value::Float(f) => Some(*f),
            Value::BigInt(b) => b.to_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self.deref() {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self.deref() {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// `true` for the real number kinds (integers, floats, big integers).
    pub fn is_number(&self) -> bool {
        matches!(
            self.deref(),
            Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::BigInt(_)
        )
    }

    /// Converts to a JSON value.
    ///
    /// Big integers, complex numbers and timestamps become strings; null
    /// references become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Uint(u) => Json::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::BigInt(b) => Json::String(b.to_string()),
            Value::Complex(c) => Json::String(format_complex(c)),
            Value::String(s) => Json::String(s.clone()),
            Value::Date(d) => Json::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Ptr(p) => p.get().map_or(Json::Null, Value::to_json),
        }
    }
}

pub(crate) fn format_complex(c: &Complex64) -> String {
    if c.im < 0.0 {
        format!("{}-{}i", c.re, -c.im)
    } else {
        format!("{}+{}i", c.re, c.im)
    }
}

/// Orders two values when both are comparable.
///
/// Numbers compare across integer, float and big-integer kinds; strings,
/// timestamps and booleans compare within their own kind.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.deref(), b.deref()) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Uint(x), Value::Uint(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Uint(y)) => Some(i128::from(*x).cmp(&i128::from(*y))),
        (Value::Uint(x), Value::Int(y)) => Some(i128::from(*x).cmp(&i128::from(*y))),
        (Value::BigInt(x), other) | (other, Value::BigInt(x)) if other.is_number() => {
            let ordering = match other {
                Value::BigInt(y) => x.cmp(y),
                Value::Int(y) => x.cmp(&BigInt::from(*y)),
                Value::Uint(y) => x.cmp(&BigInt::from(*y)),
                Value::Float(y) => x.to_f64()?.partial_cmp(y)?,
                _ => return None,
            };
            // Restore argument order when the big integer was on the right.
            if matches!(a.deref(), Value::BigInt(_)) {
                Some(ordering)
            } else {
                Some(ordering.reverse())
            }
        }
        (x, y) if x.is_number() && y.is_number() => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(_) | Value::Uint(_), Value::Int(_) | Value::Uint(_)) => {
                compare(self, other) == Some(Ordering::Equal)
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Ptr(a), Value::Ptr(b)) => match (a.get(), b.get()) {
                (Some(x), Some(y)) => x == y,
                (None, None) => a.elem() == b.elem(),
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Uint(u64::from(v))
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint(v as u64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Value::BigInt(v)
    }
}

impl From<Complex64> for Value {
    fn from(v: Complex64) -> Self {
        Value::Complex(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl From<Ptr> for Value {
    fn from(v: Ptr) -> Self {
        Value::Ptr(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Typed extraction from a [`Value`].
///
/// Implementations follow references and return `None` when the value has a
/// different kind. Used by typed refinements and transforms.
pub trait FromValue: Sized {
    /// Name of the Rust-side type, reported on signature mismatches.
    fn type_name() -> &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn type_name() -> &'static str {
        "any"
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    fn type_name() -> &'static str {
        "string"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for bool {
    fn type_name() -> &'static str {
        "bool"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn type_name() -> &'static str {
        "int"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.deref() {
            Value::Int(_) | Value::Uint(_) => value.as_i64(),
            _ => None,
        }
    }
}

impl FromValue for u64 {
    fn type_name() -> &'static str {
        "uint"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.deref() {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::Uint(u) => Some(*u),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn type_name() -> &'static str {
        "float"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.deref() {
            Value::Float(f) => Some(*f),
            Value::Int(_) | Value::Uint(_) => value.as_f64(),
            _ => None,
        }
    }
}

impl FromValue for BigInt {
    fn type_name() -> &'static str {
        "bigint"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.deref() {
            Value::BigInt(b) => Some(b.clone()),
            Value::Int(i) => Some(BigInt::from(*i)),
            Value::Uint(u) => Some(BigInt::from(*u)),
            _ => None,
        }
    }
}

impl FromValue for Complex64 {
    fn type_name() -> &'static str {
        "complex"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.deref() {
            Value::Complex(c) => Some(*c),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn type_name() -> &'static str {
        "date"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.deref() {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromValue for Map {
    fn type_name() -> &'static str {
        "object"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_map().cloned()
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn type_name() -> &'static str {
        "array"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(T::from_value).collect()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn type_name() -> &'static str {
        T::type_name()
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_nullish() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

/// One step of an issue path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(v: &str) -> Self {
        PathSegment::Key(v.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(v: String) -> Self {
        PathSegment::Key(v)
    }
}

impl From<usize> for PathSegment {
    fn from(v: usize) -> Self {
        PathSegment::Index(v)
    }
}

/// Renders a path as `a.b[0].c`; the empty path renders as an empty string.
pub fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}
