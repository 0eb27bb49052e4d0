//! The schema value and its parse entry points.
//!
//! A [`Schema`] is a cheap handle to immutable [`Internals`]: a definition
//! ([`Def`]) plus the runtime flags consulted by the parse driver. Every
//! builder method clones the internals, edits the copy, and returns a new
//! handle, so chaining never affects the receiver.
//!
//! # Examples
//!
//! ```
//! use zodkit_core::{int, IssueCode};
//!
//! let base = int();
//! let bounded = base.min(0).max(10);
//!
//! assert!(bounded.parse(11).is_err());
//! assert_eq!(base.parse(11).unwrap().as_i64(), Some(11));
//! assert_eq!(bounded.parse(-1).unwrap_err().code(), Some(IssueCode::TooSmall));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::check::{Check, run_checks};
use crate::config::config;
use crate::context::{ParseContext, ParsePayload, RefinementCtx};
use crate::error::ZodError;
use crate::issue::{RawIssue, create_custom_issue, create_invalid_type_issue, finalize_issue};
use crate::object::ObjectDef;
use crate::params::{ErrorMessage, SchemaParams};
use crate::primitive::{ComplexKind, NumericKind, StringBoolOptions};
use crate::record::RecordDef;
use crate::value::{FromValue, Kind, Ptr, Value};
use crate::{array, driver, intersection, object, record, union, wrappers};

/// Produces a value on demand (`default_func`, `prefault_func`).
pub type ValueFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Post-validation transformation. An `Err` becomes a `custom` issue.
pub type TransformFn = Arc<dyn Fn(Value, &mut RefinementCtx<'_>) -> Result<Value, String> + Send + Sync>;

/// A stored substitute value.
#[derive(Clone)]
pub enum Fallback {
    Value(Value),
    Func(ValueFn),
}

impl Fallback {
    pub fn get(&self) -> Value {
        match self {
            Fallback::Value(v) => v.clone(),
            Fallback::Func(f) => f(),
        }
    }
}

/// Type tag and per-type state of a schema.
#[derive(Clone)]
pub enum TypeDef {
    String,
    Number(NumericKind),
    Bool,
    BigInt,
    Complex(ComplexKind),
    Date,
    Literal(Vec<Value>),
    Enum(Vec<Value>),
    StringBool(StringBoolOptions),
    Any,
    Unknown,
    Never,
    Null,
    Undefined,
    Object(ObjectDef),
    Record(RecordDef),
    Array(Schema),
    Tuple {
        items: Vec<Schema>,
        rest: Option<Schema>,
    },
    Union(Vec<Schema>),
    Intersection(Schema, Schema),
    Default {
        inner: Schema,
        value: Fallback,
    },
    Prefault {
        inner: Schema,
        value: Fallback,
    },
    Transform {
        inner: Schema,
        f: TransformFn,
    },
    Pipe {
        input: Schema,
        output: Schema,
    },
}

impl TypeDef {
    /// Type name reported as `expected` and used as the `origin` of
    /// numeric bounds.
    pub fn name(&self) -> &'static str {
        match self {
            TypeDef::String => "string",
            TypeDef::Number(kind) => kind.name(),
            TypeDef::Bool => "bool",
            TypeDef::BigInt => "bigint",
            TypeDef::Complex(kind) => kind.name(),
            TypeDef::Date => "date",
            TypeDef::Literal(_) => "literal",
            TypeDef::Enum(_) => "enum",
            TypeDef::StringBool(_) => "stringbool",
            TypeDef::Any => "any",
            TypeDef::Unknown => "unknown",
            TypeDef::Never => "never",
            TypeDef::Null => "null",
            TypeDef::Undefined => "undefined",
            TypeDef::Object(_) => "object",
            TypeDef::Record(_) => "record",
            TypeDef::Array(_) => "array",
            TypeDef::Tuple { .. } => "tuple",
            TypeDef::Union(_) => "union",
            TypeDef::Intersection(..) => "intersection",
            TypeDef::Default { .. } => "default",
            TypeDef::Prefault { .. } => "prefault",
            TypeDef::Transform { .. } => "transform",
            TypeDef::Pipe { .. } => "pipe",
        }
    }

    /// Kind of the value a successful parse produces, used for typed nulls.
    pub fn value_kind(&self) -> Kind {
        match self {
            TypeDef::String | TypeDef::Enum(_) => Kind::String,
            TypeDef::Number(kind) => kind.value_kind(),
            TypeDef::Bool | TypeDef::StringBool(_) => Kind::Bool,
            TypeDef::BigInt => Kind::BigInt,
            TypeDef::Complex(_) => Kind::Complex,
            TypeDef::Date => Kind::Date,
            TypeDef::Object(_) | TypeDef::Record(_) => Kind::Map,
            TypeDef::Array(_) | TypeDef::Tuple { .. } => Kind::Array,
            TypeDef::Default { inner, .. } | TypeDef::Prefault { inner, .. } => {
                inner.def().kind.value_kind()
            }
            TypeDef::Pipe { output, .. } => output.def().kind.value_kind(),
            _ => Kind::Null,
        }
    }

    /// Kinds that receive null inputs themselves instead of rejecting them
    /// in the nil gate.
    fn handles_null(&self) -> bool {
        matches!(
            self,
            TypeDef::Any
                | TypeDef::Unknown
                | TypeDef::Null
                | TypeDef::Undefined
                | TypeDef::Literal(_)
                | TypeDef::Union(_)
                | TypeDef::Intersection(..)
                | TypeDef::Transform { .. }
                | TypeDef::Pipe { .. }
        )
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declarative part of a schema.
#[derive(Debug, Clone)]
pub struct Def {
    pub kind: TypeDef,
    /// Checks in insertion order.
    pub checks: Vec<Check>,
    /// Message override for issues raised by this schema.
    pub error: Option<ErrorMessage>,
    pub description: Option<String>,
    /// User metadata, not consulted by parsing.
    pub meta: BTreeMap<String, Value>,
}

impl Def {
    pub fn new(kind: TypeDef) -> Self {
        Self {
            kind,
            checks: Vec::new(),
            error: None,
            description: None,
            meta: BTreeMap::new(),
        }
    }
}

/// Runtime part of a schema.
#[derive(Debug, Clone)]
pub struct Internals {
    pub def: Def,
    /// Null input yields null.
    pub optional: bool,
    /// Null input yields a typed null reference.
    pub nilable: bool,
    /// Run the type's coercer before type inference.
    pub coerce: bool,
}

/// An immutable, shareable validator.
///
/// Cloning is cheap and yields a handle to the same internals.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<Internals>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type", &self.type_name())
            .field("optional", &self.inner.optional)
            .field("nilable", &self.inner.nilable)
            .field("coerce", &self.inner.coerce)
            .field("checks", &self.inner.def.checks.len())
            .finish()
    }
}

impl Schema {
    /// Builds a schema from a bare type definition.
    pub fn from_def(kind: TypeDef) -> Self {
        Self::from_internals(Internals {
            def: Def::new(kind),
            optional: false,
            nilable: false,
            coerce: false,
        })
    }

    pub fn from_internals(internals: Internals) -> Self {
        Self {
            inner: Arc::new(internals),
        }
    }

    /// Framework access to the runtime state, for wrapper implementations.
    pub fn get_internals(&self) -> &Internals {
        &self.inner
    }

    pub fn def(&self) -> &Def {
        &self.inner.def
    }

    pub fn type_name(&self) -> &'static str {
        self.inner.def.kind.name()
    }

    pub fn is_optional(&self) -> bool {
        self.inner.optional
    }

    pub fn is_nilable(&self) -> bool {
        self.inner.nilable
    }

    /// Clones the internals, applies `f`, and wraps the copy in a new
    /// schema. All builder methods go through here.
    pub(crate) fn modify(&self, f: impl FnOnce(&mut Internals)) -> Schema {
        let mut internals = Internals::clone(&self.inner);
        f(&mut internals);
        Schema::from_internals(internals)
    }

    /// Returns a copy with `check` appended to this schema's checks.
    pub fn add_check(&self, check: Check) -> Schema {
        self.modify(|i| i.def.checks.push(check))
    }

    /// Appends `check` to the innermost value schema, looking through
    /// `default` and `prefault` wrappers so leaf methods keep working after
    /// wrapping.
    pub(crate) fn add_leaf_check(&self, check: Check) -> Schema {
        self.modify_leaf(|i| i.def.checks.push(check))
    }

    /// Like [`modify`](Self::modify), applied to the schema under any
    /// `default` and `prefault` wrappers.
    pub(crate) fn modify_leaf(&self, f: impl FnOnce(&mut Internals)) -> Schema {
        match &self.inner.def.kind {
            TypeDef::Default { inner, value } => {
                let inner = inner.modify_leaf(f);
                let value = value.clone();
                self.modify(|i| i.def.kind = TypeDef::Default { inner, value })
            }
            TypeDef::Prefault { inner, value } => {
                let inner = inner.modify_leaf(f);
                let value = value.clone();
                self.modify(|i| i.def.kind = TypeDef::Prefault { inner, value })
            }
            _ => self.modify(f),
        }
    }

    /// Type definition of the schema leaf methods apply to.
    pub(crate) fn leaf_kind(&self) -> &TypeDef {
        match &self.inner.def.kind {
            TypeDef::Default { inner, .. } | TypeDef::Prefault { inner, .. } => inner.leaf_kind(),
            kind => kind,
        }
    }

    /// Applies constructor parameters: coercion, message override,
    /// description, and user params as metadata.
    pub fn with_params(&self, params: impl Into<SchemaParams>) -> Schema {
        let params = params.into();
        self.modify(|i| {
            if params.coerce {
                i.coerce = true;
            }
            if params.error.is_some() {
                i.def.error = params.error;
            }
            if params.description.is_some() {
                i.def.description = params.description;
            }
            i.def.meta.extend(params.params);
        })
    }

    /// Enables input coercion.
    pub fn coerced(&self) -> Schema {
        self.modify(|i| i.coerce = true)
    }

    /// Sets the message of the most recent check, or of the schema itself
    /// when it has no checks.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::string;
    ///
    /// let schema = string().min(3).message("too short");
    /// assert_eq!(schema.parse("ab").unwrap_err().to_string(), "too short");
    /// ```
    pub fn message(&self, error: impl Into<ErrorMessage>) -> Schema {
        let error = error.into();
        self.modify_leaf(|i| match i.def.checks.last_mut() {
            Some(check) => check.params.error = Some(error),
            None => i.def.error = Some(error),
        })
    }

    /// Sets the message override for every issue this schema raises.
    pub fn error(&self, error: impl Into<ErrorMessage>) -> Schema {
        let error = error.into();
        self.modify_leaf(|i| i.def.error = Some(error))
    }

    pub fn describe(&self, description: &str) -> Schema {
        self.modify(|i| i.def.description = Some(description.to_string()))
    }

    pub fn description(&self) -> Option<&str> {
        self.inner.def.description.as_deref()
    }

    /// Attaches user metadata.
    pub fn meta(&self, name: &str, value: impl Into<Value>) -> Schema {
        let value = value.into();
        self.modify(|i| {
            i.def.meta.insert(name.to_string(), value);
        })
    }

    pub fn get_meta(&self, name: &str) -> Option<&Value> {
        self.inner.def.meta.get(name)
    }

    /// Parses `input`, returning the validated (possibly transformed)
    /// value.
    ///
    /// # Errors
    ///
    /// Returns a [`ZodError`] carrying every finalized issue.
    pub fn parse(&self, input: impl Into<Value>) -> Result<Value, ZodError> {
        self.parse_with(input, &ParseContext::default())
    }

    /// Parses with runtime overrides.
    pub fn parse_with(&self, input: impl Into<Value>, ctx: &ParseContext) -> Result<Value, ZodError> {
        trace!(schema = self.type_name(), "Parsing input");
        let mut payload = ParsePayload::new(input);
        self.run(&mut payload, ctx);
        if payload.issues.is_empty() {
            return Ok(payload.value);
        }
        let config = config();
        let issues = payload
            .issues
            .iter()
            .map(|raw| finalize_issue(raw, Some(ctx), &config))
            .collect::<Vec<_>>();
        debug!(schema = self.type_name(), issues = issues.len(), "Parse failed");
        Err(ZodError::new(issues))
    }

    /// Same as [`parse`](Self::parse).
    pub fn safe_parse(&self, input: impl Into<Value>) -> Result<Value, ZodError> {
        self.parse(input)
    }

    /// Parses or panics with the aggregate error.
    ///
    /// # Panics
    ///
    /// Panics when `input` is invalid.
    pub fn must_parse(&self, input: impl Into<Value>) -> Value {
        match self.parse(input) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Parses and extracts the result as `T`.
    ///
    /// # Errors
    ///
    /// Fails with the parse error, or with a `custom` issue when the parsed
    /// value is not a `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::coerce;
    ///
    /// let n: i64 = coerce::int().parse_as("42").unwrap();
    /// assert_eq!(n, 42);
    /// ```
    pub fn parse_as<T: FromValue>(&self, input: impl Into<Value>) -> Result<T, ZodError> {
        let value = self.parse(input)?;
        T::from_value(&value).ok_or_else(|| {
            let err = crate::SchemaError::SignatureMismatch {
                expected: T::type_name().to_string(),
                received: value.type_name().to_string(),
            };
            let raw = create_custom_issue(Some(&err.to_string()), BTreeMap::new(), &value);
            ZodError::new(vec![finalize_issue(&raw, None, &config())])
        })
    }

    /// Issue for an input of the wrong type, carrying this schema's
    /// message override.
    pub(crate) fn invalid_type(&self, input: &Value) -> RawIssue {
        let expected = match &self.inner.def.kind {
            TypeDef::Transform { inner, .. }
            | TypeDef::Default { inner, .. }
            | TypeDef::Prefault { inner, .. }
            | TypeDef::Pipe { input: inner, .. } => {
                let issue = inner.invalid_type(input);
                return match &self.inner.def.error {
                    Some(error) => issue.with_inst(Some(error.clone())),
                    None => issue,
                };
            }
            TypeDef::StringBool(_) => "string",
            TypeDef::Tuple { .. } => "array",
            kind => kind.name(),
        };
        create_invalid_type_issue(expected, input).with_inst(self.inner.def.error.clone())
    }

    /// Runs the schema against `payload`, accumulating issues.
    ///
    /// This is the driver entry shared by [`parse`](Self::parse) and by
    /// compound schemas parsing their children; both produce the same
    /// result for the same input.
    pub fn run(&self, payload: &mut ParsePayload, ctx: &ParseContext) {
        let internals = &*self.inner;
        let kind = &internals.def.kind;
        let before = payload.issues.len();

        match kind {
            TypeDef::Default { inner, value } => {
                if payload.value.is_nullish() {
                    debug!(schema = inner.type_name(), "Substituting default for null input");
                    payload.value = value.get();
                    return;
                }
                inner.run(payload, ctx);
            }
            TypeDef::Prefault { inner, value } => wrappers::run_prefault(inner, value, payload, ctx),
            _ => {
                if payload.value.is_nullish() && self.nil_gate(payload) {
                    return;
                }
                match kind {
                    TypeDef::Object(def) => object::run(self, def, payload, ctx),
                    TypeDef::Record(def) => record::run(self, def, payload, ctx),
                    TypeDef::Array(item) => array::run_array(self, item, payload, ctx),
                    TypeDef::Tuple { items, rest } => {
                        array::run_tuple(self, items, rest.as_ref(), payload, ctx)
                    }
                    TypeDef::Union(options) => union::run(self, options, payload, ctx),
                    TypeDef::Intersection(left, right) => {
                        intersection::run(self, left, right, payload, ctx)
                    }
                    TypeDef::Transform { inner, f } => wrappers::run_transform(inner, f, payload, ctx),
                    TypeDef::Pipe { input, output } => wrappers::run_pipe(input, output, payload, ctx),
                    _ => driver::run_leaf(self, payload),
                }
            }
        }

        if payload.issues.len() == before && !internals.def.checks.is_empty() {
            run_checks(
                &internals.def.checks,
                payload,
                kind.name(),
                internals.def.error.as_ref(),
            );
        }
    }

    /// Handles a null input ahead of type-specific parsing. Returns `true`
    /// when the input has been fully handled.
    fn nil_gate(&self, payload: &mut ParsePayload) -> bool {
        let internals = &*self.inner;
        if internals.optional {
            return true;
        }
        if internals.nilable {
            let kind = internals.def.kind.value_kind();
            let keep = match &payload.value {
                Value::Ptr(p) => kind == Kind::Null || p.elem() == kind,
                _ => false,
            };
            if !keep {
                payload.value = Value::Ptr(Ptr::null(kind));
            }
            return true;
        }
        if internals.def.kind.handles_null() {
            return false;
        }
        let issue = self.invalid_type(&payload.value);
        payload.add_issue(issue);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IssueCode, int, string};

    #[test]
    fn test_chaining_does_not_mutate_receiver() {
        let base = string();
        let longer = base.min(3);
        assert!(base.parse("a").is_ok());
        assert!(longer.parse("a").is_err());
        assert_eq!(base.def().checks.len(), 0);
        assert_eq!(longer.def().checks.len(), 1);
    }

    #[test]
    fn test_parse_and_run_agree() {
        let schema = int().min(5);
        for input in [Value::from(3i64), Value::from(7i64), Value::from("x")] {
            let mut payload = ParsePayload::new(input.clone());
            schema.run(&mut payload, &ParseContext::default());
            let parsed = schema.parse(input);
            assert_eq!(payload.issues.is_empty(), parsed.is_ok());
            if let Ok(v) = parsed {
                assert_eq!(v, payload.value);
            }
        }
    }

    #[test]
    fn test_null_rejected_without_flags() {
        let err = string().parse(Value::Null).unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.code, IssueCode::InvalidType);
        assert_eq!(issue.expected.as_deref(), Some("string"));
        assert_eq!(issue.received.as_deref(), Some("null"));
    }

    #[test]
    fn test_message_targets_last_check() {
        let schema = string().min(3).message("short").max(5);
        let err = schema.parse("ab").unwrap_err();
        assert_eq!(err.to_string(), "short");
        let err = schema.parse("abcdef").unwrap_err();
        assert_eq!(err.to_string(), "string must be at most 5");
    }

    #[test]
    fn test_schema_error_overrides_type_issue() {
        let schema = int().error("need a number");
        assert_eq!(schema.parse("x").unwrap_err().to_string(), "need a number");
    }

    #[test]
    fn test_describe_and_meta() {
        let schema = string().describe("user name").meta("example", "ada");
        assert_eq!(schema.description(), Some("user name"));
        assert_eq!(schema.get_meta("example"), Some(&Value::from("ada")));
    }

    #[test]
    fn test_with_params_sets_coerce_and_description() {
        let schema = int().with_params(SchemaParams::new().coerce().with_description("count"));
        assert!(schema.get_internals().coerce);
        assert_eq!(schema.description(), Some("count"));
        assert_eq!(schema.parse("12").unwrap(), Value::Int(12));
    }

    #[test]
    fn test_parse_as_reports_mismatch() {
        let err = string().parse_as::<i64>("abc").unwrap_err();
        assert_eq!(err.code(), Some(IssueCode::Custom));
        assert!(err.to_string().contains("signature mismatch"));
    }

    #[test]
    #[should_panic(expected = "Invalid input: expected int, received string")]
    fn test_must_parse_panics() {
        int().must_parse("nope");
    }
}
