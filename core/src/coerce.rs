//! Coercing constructors and the conversions behind them.
//!
//! A coercing schema converts its input to the target type before type
//! inference, so `coerce::int()` accepts `"42"` and yields `42`. Inputs
//! already of the target type are never converted.
//!
//! The `to_*` functions are the per-type coercers. They can be used on
//! their own and report failures as [`SchemaError`]s.
//!
//! # Examples
//!
//! ```
//! use zodkit_core::{Value, coerce};
//!
//! assert_eq!(coerce::int().parse("42").unwrap(), Value::Int(42));
//! assert_eq!(coerce::boolean().parse("true").unwrap(), Value::Bool(true));
//! assert_eq!(coerce::string().parse(7).unwrap(), Value::from("7"));
//!
//! assert!(coerce::to_complex(&Value::from("1+2i")).is_ok());
//! assert!(coerce::to_complex(&Value::from("1+")).is_err());
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::error::SchemaError;
use crate::primitive;
use crate::schema::Schema;
use crate::value::{Value, format_complex};

pub fn string() -> Schema {
    primitive::string().coerced()
}

pub fn int() -> Schema {
    primitive::int().coerced()
}

pub fn int64() -> Schema {
    primitive::int64().coerced()
}

pub fn uint64() -> Schema {
    primitive::uint64().coerced()
}

pub fn float64() -> Schema {
    primitive::float64().coerced()
}

pub fn boolean() -> Schema {
    primitive::boolean().coerced()
}

pub fn bigint() -> Schema {
    primitive::bigint().coerced()
}

pub fn complex64() -> Schema {
    primitive::complex64().coerced()
}

pub fn complex128() -> Schema {
    primitive::complex128().coerced()
}

pub fn date() -> Schema {
    primitive::date().coerced()
}

/// Converts scalars to their string form.
///
/// # Errors
///
/// [`SchemaError::Unconvertible`] for null, arrays and maps.
pub fn to_string(value: &Value) -> Result<Value, SchemaError> {
    let text = match value.deref() {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::BigInt(b) => b.to_string(),
        Value::Complex(c) => format_complex(c),
        date @ Value::Date(_) => match date.to_json() {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        },
        other => return Err(unconvertible(other, "string")),
    };
    Ok(Value::String(text))
}

/// Converts to an integer, yielding `Int` or, beyond `i64`, `Uint`.
///
/// Strings are trimmed and may spell an integral float (`"3.0"`).
///
/// # Errors
///
/// [`SchemaError::ExpectedNumeric`] for non-numeric input and
/// [`SchemaError::Unconvertible`] for fractional or out-of-range numbers.
pub fn to_int(value: &Value) -> Result<Value, SchemaError> {
    match value.deref() {
        v @ (Value::Int(_) | Value::Uint(_)) => Ok(v.clone()),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => float_to_int(*f, value),
        Value::BigInt(b) => {
            if let Some(i) = b.to_i64() {
                Ok(Value::Int(i))
            } else if let Some(u) = b.to_u64() {
                Ok(Value::Uint(u))
            } else {
                Err(unconvertible(value, "int"))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::Int(i))
            } else if let Ok(u) = s.parse::<u64>() {
                Ok(Value::Uint(u))
            } else if let Ok(f) = s.parse::<f64>() {
                float_to_int(f, value)
            } else {
                Err(SchemaError::ExpectedNumeric("string".to_string()))
            }
        }
        other => Err(SchemaError::ExpectedNumeric(other.type_name().to_string())),
    }
}

fn float_to_int(f: f64, original: &Value) -> Result<Value, SchemaError> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(Value::Int(f as i64))
    } else {
        Err(unconvertible(original, "int"))
    }
}

/// Converts to a float.
///
/// # Errors
///
/// [`SchemaError::ExpectedNumeric`] when no numeric reading exists.
pub fn to_float(value: &Value) -> Result<Value, SchemaError> {
    match value.deref() {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| SchemaError::ExpectedNumeric("string".to_string())),
        other => other
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| SchemaError::ExpectedNumeric(other.type_name().to_string())),
    }
}

/// Lenient boolean reading.
///
/// Strings `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off` in any case;
/// numbers are `true` when non-zero.
///
/// # Errors
///
/// [`SchemaError::Unconvertible`] for any other string or kind.
pub fn to_bool(value: &Value) -> Result<Value, SchemaError> {
    let b = match value.deref() {
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Uint(u) => *u != 0,
        Value::Float(f) => *f != 0.0,
        Value::BigInt(b) => !b.is_zero(),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => return Err(unconvertible(value, "bool")),
        },
        other => return Err(unconvertible(other, "bool")),
    };
    Ok(Value::Bool(b))
}

/// Converts to a big integer.
///
/// # Errors
///
/// [`SchemaError::ExpectedNumeric`] for non-numeric input and
/// [`SchemaError::Unconvertible`] for fractional floats.
pub fn to_bigint(value: &Value) -> Result<Value, SchemaError> {
    match value.deref() {
        Value::BigInt(b) => Ok(Value::BigInt(b.clone())),
        Value::Int(i) => Ok(Value::BigInt(BigInt::from(*i))),
        Value::Uint(u) => Ok(Value::BigInt(BigInt::from(*u))),
        Value::Bool(b) => Ok(Value::BigInt(BigInt::from(u8::from(*b)))),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => BigInt::from_f64(*f)
            .map(Value::BigInt)
            .ok_or_else(|| unconvertible(value, "bigint")),
        Value::Float(_) => Err(unconvertible(value, "bigint")),
        Value::String(s) => s
            .trim()
            .parse::<BigInt>()
            .map(Value::BigInt)
            .map_err(|_| SchemaError::ExpectedNumeric("string".to_string())),
        other => Err(SchemaError::ExpectedNumeric(other.type_name().to_string())),
    }
}

/// Converts to a complex number. Real numbers get a zero imaginary part;
/// strings use the `a+bi` notation (`"3"`, `"-2i"`, `"1.5-4i"`).
///
/// # Errors
///
/// [`SchemaError::InvalidComplexFormat`] for unparseable strings and
/// [`SchemaError::ExpectedComplex`] for other kinds.
pub fn to_complex(value: &Value) -> Result<Value, SchemaError> {
    match value.deref() {
        Value::Complex(c) => Ok(Value::Complex(*c)),
        Value::String(s) => parse_complex(s).map(Value::Complex),
        other => other
            .as_f64()
            .map(|re| Value::Complex(Complex64::new(re, 0.0)))
            .ok_or_else(|| SchemaError::ExpectedComplex(other.type_name().to_string())),
    }
}

fn parse_complex(src: &str) -> Result<Complex64, SchemaError> {
    let invalid = || SchemaError::InvalidComplexFormat(src.to_string());
    let compact: String = src.chars().filter(|c| !c.is_whitespace()).collect();
    let s = compact
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(&compact);
    if s.is_empty() {
        return Err(invalid());
    }

    let Some(body) = s.strip_suffix('i') else {
        let re = s.parse::<f64>().map_err(|_| invalid())?;
        return Ok(Complex64::new(re, 0.0));
    };

    // Split at the last sign that does not belong to an exponent.
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'));
    let (re, im) = match split {
        Some(i) => (&body[..i], &body[i..]),
        None => ("", body),
    };
    let re = if re.is_empty() {
        0.0
    } else {
        re.parse::<f64>().map_err(|_| invalid())?
    };
    let im = match im {
        "" | "+" => 1.0,
        "-" => -1.0,
        im => im.parse::<f64>().map_err(|_| invalid())?,
    };
    Ok(Complex64::new(re, im))
}

/// Converts to a UTC timestamp: RFC 3339 strings, `YYYY-MM-DD` dates
/// (midnight UTC) and Unix seconds.
///
/// # Errors
///
/// [`SchemaError::Unconvertible`] when no reading applies.
pub fn to_date(value: &Value) -> Result<Value, SchemaError> {
    let date = match value.deref() {
        Value::Date(d) => Some(*d),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|d| d.and_utc())
                })
        }
        Value::Int(secs) => DateTime::from_timestamp(*secs, 0),
        Value::Uint(secs) => i64::try_from(*secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::Float(secs) if secs.is_finite() => {
            DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
        }
        _ => None,
    };
    date.map(Value::Date)
        .ok_or_else(|| unconvertible(value, "date"))
}

/// Reads a map, parsing JSON object text.
///
/// # Errors
///
/// [`SchemaError::ExpectedMap`] for anything that is not a map or JSON
/// object text.
pub fn to_map(value: &Value) -> Result<Value, SchemaError> {
    match value.deref() {
        Value::Map(m) => Ok(Value::Map(m.clone())),
        Value::String(s) => match serde_json::from_str::<serde_json::Value>(s) {
            Ok(json @ serde_json::Value::Object(_)) => Ok(Value::from(json)),
            _ => Err(SchemaError::ExpectedMap("string".to_string())),
        },
        other => Err(SchemaError::ExpectedMap(other.type_name().to_string())),
    }
}

fn unconvertible(value: &Value, target: &'static str) -> SchemaError {
    SchemaError::Unconvertible {
        received: value.type_name().to_string(),
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&Value::from(" 42 ")).unwrap(), Value::Int(42));
        assert_eq!(to_int(&Value::from("3.0")).unwrap(), Value::Int(3));
        assert_eq!(to_int(&Value::from(true)).unwrap(), Value::Int(1));
        assert_eq!(
            to_int(&Value::from("18446744073709551615")).unwrap(),
            Value::Uint(u64::MAX)
        );
        assert!(matches!(
            to_int(&Value::from("forty")),
            Err(SchemaError::ExpectedNumeric(_))
        ));
        assert!(matches!(
            to_int(&Value::from(2.5)),
            Err(SchemaError::Unconvertible { target: "int", .. })
        ));
    }

    #[test]
    fn test_to_bool() {
        for s in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(to_bool(&Value::from(s)).unwrap(), Value::Bool(true), "{s}");
        }
        for s in ["false", "0", "No", "off"] {
            assert_eq!(to_bool(&Value::from(s)).unwrap(), Value::Bool(false), "{s}");
        }
        assert_eq!(to_bool(&Value::from(0i64)).unwrap(), Value::Bool(false));
        assert_eq!(to_bool(&Value::from(-3i64)).unwrap(), Value::Bool(true));
        assert!(to_bool(&Value::from("maybe")).is_err());
    }

    #[test]
    fn test_to_complex() {
        let parse = |s: &str| match to_complex(&Value::from(s)).unwrap() {
            Value::Complex(c) => (c.re, c.im),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(parse("1+2i"), (1.0, 2.0));
        assert_eq!(parse("1.5 - 4i"), (1.5, -4.0));
        assert_eq!(parse("-2i"), (0.0, -2.0));
        assert_eq!(parse("i"), (0.0, 1.0));
        assert_eq!(parse("3"), (3.0, 0.0));
        assert_eq!(parse("(1e2+1e-1i)"), (100.0, 0.1));
        assert!(matches!(
            to_complex(&Value::from("abc")),
            Err(SchemaError::InvalidComplexFormat(_))
        ));
        assert!(matches!(
            to_complex(&Value::from(vec![1i64])),
            Err(SchemaError::ExpectedComplex(_))
        ));
    }

    #[test]
    fn test_to_date() {
        let d = to_date(&Value::from("2024-01-15T10:30:00Z")).unwrap();
        assert_eq!(d.to_string(), "\"2024-01-15T10:30:00Z\"");
        let d = to_date(&Value::from("2024-01-15")).unwrap();
        assert_eq!(d.to_string(), "\"2024-01-15T00:00:00Z\"");
        let d = to_date(&Value::from(0i64)).unwrap();
        assert_eq!(d.to_string(), "\"1970-01-01T00:00:00Z\"");
        assert!(to_date(&Value::from("yesterday")).is_err());
    }

    #[test]
    fn test_to_string_and_map() {
        assert_eq!(to_string(&Value::from(2.5)).unwrap(), Value::from("2.5"));
        assert!(to_string(&Value::Null).is_err());
        let m = to_map(&Value::from(r#"{"a": 1}"#)).unwrap();
        assert_eq!(m.as_map().unwrap()["a"], Value::Int(1));
        assert!(matches!(to_map(&Value::from("[1]")), Err(SchemaError::ExpectedMap(_))));
    }
}
