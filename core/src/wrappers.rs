//! Composition modifiers available on every schema.
//!
//! Precedence, outermost first:
//!
//! - `default`: a null input yields the default, unchecked. Anything else
//!   goes to the wrapped schema.
//! - `prefault`: the wrapped schema runs first; on any failure the
//!   fallback is parsed through the wrapped schema instead and its result
//!   (or its error) is surfaced.
//! - `optional` / `nilable`: flags consulted before type parsing. A null
//!   input yields null or a typed null reference.
//! - `transform`: runs after the wrapped schema succeeded. A null result
//!   from an optional or nilable schema passes through untouched.
//! - `pipe`: the second schema sees only successful, non-null outputs of
//!   the first.
//!
//! When prefaults nest, the innermost fallback that validates wins.
//!
//! # Examples
//!
//! ```
//! use zodkit_core::{Value, string};
//!
//! let schema = string().min(5).prefault("fallback").default("d");
//! assert_eq!(schema.parse(Value::Null).unwrap(), Value::from("d"));
//! assert_eq!(schema.parse("hi").unwrap(), Value::from("fallback"));
//! assert_eq!(schema.parse("hello").unwrap(), Value::from("hello"));
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use tracing::debug;

use crate::check::{Check, CheckKind, PayloadFn, RefineFn};
use crate::context::{ParseContext, ParsePayload, RefinementCtx};
use crate::error::SchemaError;
use crate::issue::create_custom_issue;
use crate::params::SchemaParams;
use crate::schema::{Fallback, Schema, TransformFn, TypeDef};
use crate::value::{FromValue, Value};

impl Schema {
    /// Null input yields null.
    pub fn optional(&self) -> Schema {
        self.modify(|i| i.optional = true)
    }

    /// Null input yields a typed null reference.
    pub fn nilable(&self) -> Schema {
        self.modify(|i| i.nilable = true)
    }

    /// Both [`optional`](Self::optional) and [`nilable`](Self::nilable).
    pub fn nullish(&self) -> Schema {
        self.modify(|i| {
            i.optional = true;
            i.nilable = true;
        })
    }

    /// Substitutes `value` for null input without validating it.
    pub fn default(&self, value: impl Into<Value>) -> Schema {
        Schema::from_def(TypeDef::Default {
            inner: self.clone(),
            value: Fallback::Value(value.into()),
        })
    }

    /// Like [`default`](Self::default), calling `f` on every use.
    pub fn default_func<F>(&self, f: F) -> Schema
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Schema::from_def(TypeDef::Default {
            inner: self.clone(),
            value: Fallback::Func(Arc::new(f)),
        })
    }

    /// Parses `value` through this schema whenever the input fails.
    pub fn prefault(&self, value: impl Into<Value>) -> Schema {
        Schema::from_def(TypeDef::Prefault {
            inner: self.clone(),
            value: Fallback::Value(value.into()),
        })
    }

    pub fn prefault_func<F>(&self, f: F) -> Schema
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Schema::from_def(TypeDef::Prefault {
            inner: self.clone(),
            value: Fallback::Func(Arc::new(f)),
        })
    }

    /// Adds a typed predicate; `false` raises a `custom` issue.
    ///
    /// A value that is not a `T` raises a `custom` issue describing the
    /// signature mismatch.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::string;
    ///
    /// let schema = string().refine(|s: &String| s.contains('@'));
    /// assert!(schema.parse("a@b").is_ok());
    /// assert_eq!(schema.parse("ab").unwrap_err().to_string(), "Refinement failed");
    /// ```
    pub fn refine<T, F>(&self, f: F) -> Schema
    where
        T: FromValue,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.refine_with(f, SchemaParams::default())
    }

    /// [`refine`](Self::refine) with a message, path, abort flag or user
    /// params.
    pub fn refine_with<T, F>(&self, f: F, params: impl Into<SchemaParams>) -> Schema
    where
        T: FromValue,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: RefineFn = Arc::new(move |value: &Value| match T::from_value(value) {
            Some(typed) => Ok(f(&typed)),
            None => Err(SchemaError::SignatureMismatch {
                expected: T::type_name().to_string(),
                received: value.type_name().to_string(),
            }),
        });
        self.add_check(Check::with_params(CheckKind::Refine(predicate), params.into()))
    }

    /// Adds an untyped predicate.
    pub fn refine_any<F>(&self, f: F) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_any_with(f, SchemaParams::default())
    }

    pub fn refine_any_with<F>(&self, f: F, params: impl Into<SchemaParams>) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let predicate: RefineFn = Arc::new(move |value: &Value| Ok(f(value)));
        self.add_check(Check::with_params(CheckKind::Refine(predicate), params.into()))
    }

    /// Adds a check with raw payload access, free to raise any number of
    /// issues with any code.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::{IssueCode, ParsePayload, RawIssue, int};
    ///
    /// let schema = int().check(|payload: &mut ParsePayload| {
    ///     if payload.value.as_i64() == Some(13) {
    ///         let issue = RawIssue::new(IssueCode::InvalidValue, payload.value.clone())
    ///             .with_message("unlucky");
    ///         payload.add_issue(issue);
    ///     }
    /// });
    /// assert_eq!(schema.parse(13).unwrap_err().to_string(), "unlucky");
    /// ```
    pub fn check<F>(&self, f: F) -> Schema
    where
        F: Fn(&mut ParsePayload) + Send + Sync + 'static,
    {
        let f: PayloadFn = Arc::new(f);
        self.add_check(Check::new(CheckKind::Custom(f)))
    }

    /// Maps the parsed value through a typed function.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::convert::Infallible;
    /// use zodkit_core::{Value, string};
    ///
    /// let len = string().transform(|s: String, _| Ok::<_, Infallible>(s.len() as i64));
    /// assert_eq!(len.parse("four").unwrap(), Value::Int(4));
    /// ```
    pub fn transform<T, U, E, F>(&self, f: F) -> Schema
    where
        T: FromValue,
        U: Into<Value>,
        E: Display,
        F: Fn(T, &mut RefinementCtx<'_>) -> Result<U, E> + Send + Sync + 'static,
    {
        let source = self.type_name();
        let adapter: TransformFn = Arc::new(move |value: Value, ctx: &mut RefinementCtx<'_>| {
            match T::from_value(&value) {
                Some(typed) => f(typed, ctx).map(Into::into).map_err(|e| e.to_string()),
                None if value.is_nullish() => {
                    Err(SchemaError::CannotTransformNull(source.to_string()).to_string())
                }
                None => Err(SchemaError::SignatureMismatch {
                    expected: T::type_name().to_string(),
                    received: value.type_name().to_string(),
                }
                .to_string()),
            }
        });
        Schema::from_def(TypeDef::Transform {
            inner: self.clone(),
            f: adapter,
        })
    }

    /// Maps the parsed value through an untyped function.
    pub fn transform_any<E, F>(&self, f: F) -> Schema
    where
        E: Display,
        F: Fn(Value, &mut RefinementCtx<'_>) -> Result<Value, E> + Send + Sync + 'static,
    {
        let adapter: TransformFn = Arc::new(move |value: Value, ctx: &mut RefinementCtx<'_>| {
            f(value, ctx).map_err(|e| e.to_string())
        });
        Schema::from_def(TypeDef::Transform {
            inner: self.clone(),
            f: adapter,
        })
    }

    /// Feeds successful output into `next`.
    pub fn pipe(&self, next: &Schema) -> Schema {
        Schema::from_def(TypeDef::Pipe {
            input: self.clone(),
            output: next.clone(),
        })
    }

    /// Removes the outermost modifier: the optional/nilable flags first,
    /// then a wrapping `default`, `prefault`, `transform` or `pipe`. Arrays
    /// unwrap to their element schema.
    pub fn unwrap(&self) -> Schema {
        let internals = self.get_internals();
        if internals.optional || internals.nilable {
            return self.modify(|i| {
                i.optional = false;
                i.nilable = false;
            });
        }
        match &internals.def.kind {
            TypeDef::Default { inner, .. }
            | TypeDef::Prefault { inner, .. }
            | TypeDef::Transform { inner, .. } => inner.clone(),
            TypeDef::Pipe { input, .. } => input.clone(),
            TypeDef::Array(item) => item.clone(),
            _ => self.clone(),
        }
    }
}

pub(crate) fn run_prefault(
    inner: &Schema,
    fallback: &Fallback,
    payload: &mut ParsePayload,
    ctx: &ParseContext,
) {
    let mut attempt = payload.fork(payload.value.clone());
    inner.run(&mut attempt, ctx);
    if attempt.issues.is_empty() {
        payload.value = attempt.value;
        return;
    }

    debug!(
        schema = inner.type_name(),
        issues = attempt.issues.len(),
        "Input rejected, parsing prefault value"
    );
    let mut retry = payload.fork(fallback.get());
    inner.run(&mut retry, ctx);
    payload.value = retry.value;
    payload.issues.append(&mut retry.issues);
}

impl Schema {
    /// `true` when a null output can come from an optional or nilable
    /// schema somewhere upstream, rather than from a type that accepts null.
    pub(crate) fn yields_nil(&self) -> bool {
        if self.is_optional() || self.is_nilable() {
            return true;
        }
        match &self.get_internals().def.kind {
            TypeDef::Transform { inner, .. } => inner.yields_nil(),
            TypeDef::Pipe { input, output } => input.yields_nil() || output.yields_nil(),
            TypeDef::Union(options) => options.iter().any(Schema::yields_nil),
            _ => false,
        }
    }
}

pub(crate) fn run_transform(
    inner: &Schema,
    f: &TransformFn,
    payload: &mut ParsePayload,
    ctx: &ParseContext,
) {
    let before = payload.issues.len();
    inner.run(payload, ctx);
    if payload.issues.len() > before {
        return;
    }
    if payload.value.is_nullish() && inner.yields_nil() {
        return;
    }

    let value = payload.value.clone();
    let result = {
        let mut refinement = RefinementCtx::new(payload);
        f(value, &mut refinement)
    };
    match result {
        Ok(out) => payload.value = out,
        Err(message) => {
            let issue = create_custom_issue(Some(&message), BTreeMap::new(), &payload.value);
            payload.add_issue(issue);
        }
    }
}

pub(crate) fn run_pipe(input: &Schema, output: &Schema, payload: &mut ParsePayload, ctx: &ParseContext) {
    let before = payload.issues.len();
    input.run(payload, ctx);
    if payload.issues.len() > before || payload.value.is_nullish() {
        return;
    }
    output.run(payload, ctx);
}
