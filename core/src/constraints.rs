//! Leaf-specific builder methods.
//!
//! Size methods (`min`, `max`, `length`) measure length on strings, arrays
//! and maps, and compare values on numbers, big integers and dates. All of
//! them reach through `default` and `prefault` wrappers to the schema they
//! wrap.

use std::sync::Arc;

use regex::Regex;

use crate::check::{Check, CheckKind, OverwriteFn};
use crate::format::StringFormat;
use crate::params::SchemaParams;
use crate::schema::{Schema, TypeDef};
use crate::value::Value;

/// Largest integer exactly representable as an `f64`.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

impl Schema {
    fn measures_length(&self) -> bool {
        matches!(
            self.leaf_kind(),
            TypeDef::String
                | TypeDef::Array(_)
                | TypeDef::Tuple { .. }
                | TypeDef::Object(_)
                | TypeDef::Record(_)
        )
    }

    fn is_ordered(&self) -> bool {
        matches!(
            self.leaf_kind(),
            TypeDef::Number(_) | TypeDef::BigInt | TypeDef::Date
        )
    }

    fn leaf(&self, kind: CheckKind) -> Schema {
        self.add_leaf_check(Check::new(kind))
    }

    /// Appends a check with parameters (message, abort, path).
    pub fn with_check(&self, kind: CheckKind, params: impl Into<SchemaParams>) -> Schema {
        self.add_leaf_check(Check::with_params(kind, params.into()))
    }

    /// Minimum length, or inclusive lower bound for numbers and dates.
    /// Schemas whose output type is only known at parse time (pipes,
    /// unions, transforms) decide per value.
    pub fn min(&self, bound: impl Into<Value>) -> Schema {
        let bound = bound.into();
        if self.measures_length() {
            self.leaf(CheckKind::MinLength(length_of(&bound)))
        } else if self.is_ordered() {
            self.gte(bound)
        } else {
            self.leaf(CheckKind::Min(bound))
        }
    }

    /// Maximum length, or inclusive upper bound for numbers and dates.
    pub fn max(&self, bound: impl Into<Value>) -> Schema {
        let bound = bound.into();
        if self.measures_length() {
            self.leaf(CheckKind::MaxLength(length_of(&bound)))
        } else if self.is_ordered() {
            self.lte(bound)
        } else {
            self.leaf(CheckKind::Max(bound))
        }
    }

    /// Exact length.
    pub fn length(&self, len: usize) -> Schema {
        self.leaf(CheckKind::Length(len))
    }

    /// At least one character, element or entry.
    pub fn nonempty(&self) -> Schema {
        self.leaf(CheckKind::MinLength(1))
    }

    pub fn gt(&self, bound: impl Into<Value>) -> Schema {
        self.leaf(CheckKind::GreaterThan {
            bound: bound.into(),
            inclusive: false,
        })
    }

    pub fn gte(&self, bound: impl Into<Value>) -> Schema {
        self.leaf(CheckKind::GreaterThan {
            bound: bound.into(),
            inclusive: true,
        })
    }

    pub fn lt(&self, bound: impl Into<Value>) -> Schema {
        self.leaf(CheckKind::LessThan {
            bound: bound.into(),
            inclusive: false,
        })
    }

    pub fn lte(&self, bound: impl Into<Value>) -> Schema {
        self.leaf(CheckKind::LessThan {
            bound: bound.into(),
            inclusive: true,
        })
    }

    pub fn positive(&self) -> Schema {
        self.gt(0)
    }

    pub fn negative(&self) -> Schema {
        self.lt(0)
    }

    pub fn nonnegative(&self) -> Schema {
        self.gte(0)
    }

    pub fn nonpositive(&self) -> Schema {
        self.lte(0)
    }

    pub fn multiple_of(&self, divisor: impl Into<Value>) -> Schema {
        self.leaf(CheckKind::MultipleOf(divisor.into()))
    }

    /// Alias of [`multiple_of`](Self::multiple_of).
    pub fn step(&self, divisor: impl Into<Value>) -> Schema {
        self.multiple_of(divisor)
    }

    /// Restricts to integers exactly representable as `f64`.
    pub fn safe(&self) -> Schema {
        self.gte(-MAX_SAFE_INTEGER).lte(MAX_SAFE_INTEGER)
    }

    /// Rejects infinities.
    pub fn finite(&self) -> Schema {
        self.gte(-f64::MAX).lte(f64::MAX)
    }

    /// # Examples
    ///
    /// ```
    /// use regex::Regex;
    /// use zodkit_core::string;
    ///
    /// let schema = string().regex(Regex::new(r"^\d{3}$").unwrap());
    /// assert!(schema.parse("123").is_ok());
    /// let err = schema.parse("12a").unwrap_err();
    /// assert_eq!(err.first().unwrap().pattern.as_deref(), Some(r"^\d{3}$"));
    /// ```
    pub fn regex(&self, re: Regex) -> Schema {
        self.leaf(CheckKind::Regex(re))
    }

    pub fn format(&self, format: StringFormat) -> Schema {
        self.leaf(CheckKind::Format(format))
    }

    pub fn email(&self) -> Schema {
        self.format(StringFormat::Email)
    }

    pub fn url(&self) -> Schema {
        self.format(StringFormat::Url)
    }

    pub fn uuid(&self) -> Schema {
        self.format(StringFormat::Uuid)
    }

    pub fn ipv4(&self) -> Schema {
        self.format(StringFormat::Ipv4)
    }

    pub fn ipv6(&self) -> Schema {
        self.format(StringFormat::Ipv6)
    }

    pub fn cidr(&self) -> Schema {
        self.format(StringFormat::Cidr)
    }

    pub fn base64(&self) -> Schema {
        self.format(StringFormat::Base64)
    }

    pub fn hostname(&self) -> Schema {
        self.format(StringFormat::Hostname)
    }

    pub fn iso_date(&self) -> Schema {
        self.format(StringFormat::IsoDate)
    }

    pub fn iso_time(&self) -> Schema {
        self.format(StringFormat::IsoTime)
    }

    pub fn iso_datetime(&self) -> Schema {
        self.format(StringFormat::IsoDatetime)
    }

    pub fn e164(&self) -> Schema {
        self.format(StringFormat::E164)
    }

    pub fn cuid(&self) -> Schema {
        self.format(StringFormat::Cuid)
    }

    pub fn starts_with(&self, prefix: &str) -> Schema {
        self.leaf(CheckKind::StartsWith(prefix.to_string()))
    }

    pub fn ends_with(&self, suffix: &str) -> Schema {
        self.leaf(CheckKind::EndsWith(suffix.to_string()))
    }

    pub fn includes(&self, needle: &str) -> Schema {
        self.leaf(CheckKind::Includes(needle.to_string()))
    }

    pub fn lowercase(&self) -> Schema {
        self.leaf(CheckKind::Lowercase)
    }

    pub fn uppercase(&self) -> Schema {
        self.leaf(CheckKind::Uppercase)
    }

    /// Strips surrounding whitespace; later checks see the trimmed value.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::{Value, string};
    ///
    /// let schema = string().trim().min(1);
    /// assert_eq!(schema.parse("  ok ").unwrap(), Value::from("ok"));
    /// assert!(schema.parse("   ").is_err());
    /// ```
    pub fn trim(&self) -> Schema {
        self.overwrite(|s| s.trim().to_string())
    }

    pub fn to_lowercase(&self) -> Schema {
        self.overwrite(str::to_lowercase)
    }

    pub fn to_uppercase(&self) -> Schema {
        self.overwrite(str::to_uppercase)
    }

    fn overwrite(&self, f: fn(&str) -> String) -> Schema {
        let f: OverwriteFn = Arc::new(move |value: &Value| match value.as_str() {
            Some(s) => Value::String(f(s)),
            None => value.clone(),
        });
        self.leaf(CheckKind::Overwrite(f))
    }

    /// Allowed values of an enum or literal schema.
    pub fn options(&self) -> Vec<Value> {
        match self.leaf_kind() {
            TypeDef::Enum(values) | TypeDef::Literal(values) => values.clone(),
            _ => Vec::new(),
        }
    }

    /// Enum restricted to `keep`.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::{Value, enumeration};
    ///
    /// let fish = enumeration(&["Salmon", "Tuna", "Trout"]);
    /// let salty = fish.extract(&["Salmon", "Tuna"]);
    /// assert_eq!(salty.options(), vec![Value::from("Salmon"), Value::from("Tuna")]);
    /// assert!(fish.exclude(&["Trout"]).parse("Trout").is_err());
    /// ```
    pub fn extract(&self, keep: &[&str]) -> Schema {
        self.filter_options(|v| v.as_str().is_some_and(|s| keep.contains(&s)))
    }

    /// Enum without `drop`.
    pub fn exclude(&self, drop: &[&str]) -> Schema {
        self.filter_options(|v| !v.as_str().is_some_and(|s| drop.contains(&s)))
    }

    fn filter_options(&self, keep: impl Fn(&Value) -> bool) -> Schema {
        let values: Vec<Value> = self.options().into_iter().filter(|v| keep(v)).collect();
        match self.get_internals().def.kind {
            TypeDef::Literal(_) => self.modify(|i| i.def.kind = TypeDef::Literal(values)),
            TypeDef::Enum(_) => self.modify(|i| i.def.kind = TypeDef::Enum(values)),
            _ => self.clone(),
        }
    }
}

fn length_of(bound: &Value) -> usize {
    bound
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use num_bigint::BigInt;

    use super::*;
    use crate::{IssueCode, array, bigint, date, float64, int, string};

    #[test]
    fn test_min_measures_length_or_value() {
        assert!(string().min(3).parse("abc").is_ok());
        assert!(string().min(3).parse("ab").is_err());
        assert!(array(int()).min(2).parse(vec![1]).is_err());
        assert!(int().min(3).parse(3).is_ok());
        let err = int().min(3).parse(2).unwrap_err();
        assert_eq!(err.to_string(), "int must be at least 3");
    }

    #[test]
    fn test_exclusive_bounds_messages() {
        assert_eq!(
            int().positive().parse(0).unwrap_err().to_string(),
            "int must be greater than 0"
        );
        assert_eq!(
            float64().lt(1.5).parse(2.0).unwrap_err().to_string(),
            "float64 must be less than 1.5"
        );
        assert!(int().nonnegative().parse(0).is_ok());
        assert!(int().nonpositive().parse(1).is_err());
        assert!(int().negative().parse(-1).is_ok());
    }

    #[test]
    fn test_all_failing_checks_reported() {
        let err = string().min(5).email().parse("ab").unwrap_err();
        let codes: Vec<_> = err.issues().iter().map(|i| i.code).collect();
        assert_eq!(codes, vec![IssueCode::TooSmall, IssueCode::InvalidFormat]);
    }

    #[test]
    fn test_step_and_safe() {
        assert!(int().step(5).parse(15).is_ok());
        assert_eq!(
            int().step(5).parse(16).unwrap_err().to_string(),
            "Number must be a multiple of 5"
        );
        assert!(int().safe().parse(MAX_SAFE_INTEGER).is_ok());
        assert!(int().safe().parse(MAX_SAFE_INTEGER + 1).is_err());
        assert!(float64().finite().parse(f64::INFINITY).is_err());
    }

    #[test]
    fn test_bigint_and_date_bounds() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert!(bigint().gt(0).parse(big.clone()).is_ok());
        assert!(bigint().lt(0).parse(big).is_err());

        let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let err = date().min(cutoff).parse(early).unwrap_err();
        assert_eq!(err.first().unwrap().origin.as_deref(), Some("date"));
    }

    #[test]
    fn test_string_content_checks() {
        assert!(string().starts_with("ab").parse("abc").is_ok());
        assert!(string().ends_with("bc").parse("abd").is_err());
        assert!(string().includes("zz").parse("abc").is_err());
        assert!(string().lowercase().parse("abc").is_ok());
        assert!(string().uppercase().parse("Abc").is_err());
        let err = string().uuid().parse("nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid uuid");
    }

    #[test]
    fn test_overwrites_feed_later_checks() {
        let schema = string().to_uppercase().uppercase();
        assert_eq!(schema.parse("abc").unwrap(), Value::from("ABC"));
        assert_eq!(string().to_lowercase().parse("AbC").unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_with_check_params() {
        let schema = string().with_check(CheckKind::MinLength(2), "need two");
        assert_eq!(schema.parse("a").unwrap_err().to_string(), "need two");
    }

    #[test]
    fn test_min_max_through_pipe_and_union() {
        let schema = string().pipe(&string()).min(3);
        assert_eq!(schema.parse("a").unwrap_err().code(), Some(IssueCode::TooSmall));
        assert!(schema.parse("abc").is_ok());

        let schema = crate::union([string(), int()]).max(3);
        assert_eq!(schema.parse("abcd").unwrap_err().code(), Some(IssueCode::TooBig));
        assert_eq!(schema.parse(5).unwrap_err().code(), Some(IssueCode::TooBig));
        assert!(schema.parse("abc").is_ok());
        assert!(schema.parse(3).is_ok());

        let schema = string().transform(|s: String, _| Ok::<_, String>(s.len() as i64)).min(2);
        assert_eq!(schema.parse("a").unwrap_err().code(), Some(IssueCode::TooSmall));
    }
}
