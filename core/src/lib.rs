//! Runtime schema validation and coercion.
//!
//! Schemas are immutable values built from constructor functions and
//! refined with chained builder methods. Parsing runs an input [`Value`]
//! through the schema and yields either the validated (possibly
//! transformed) value or a [`ZodError`] listing every [`Issue`] found.
//!
//! - Primitives: [`string`], [`int`] and the fixed-width integers,
//!   [`float64`], [`boolean`], [`bigint`], [`complex128`], [`date`],
//!   [`literal`], [`enumeration`], [`string_bool`], [`any`], [`unknown`],
//!   [`never`], [`null`], [`undefined`].
//! - Compounds: [`object`], [`record`], [`partial_record`], [`array`],
//!   [`tuple`], [`union`], [`intersection`].
//! - Wrappers: `optional`, `nilable`, `nullish`, `default`, `prefault`,
//!   `transform`, `pipe`, `refine`, `check`.
//! - Coercing constructors live in [`coerce`], with root aliases such as
//!   [`coerced_int`].
//!
//! Issue messages come from the schema's own override, the per-parse
//! [`ParseContext`] error map, the process-wide [`Config`], then the
//! configured [`Locale`].
//!
//! # Example
//!
//! ```
//! use zodkit_core::*;
//!
//! let user = object([
//!     ("name", string().min(1)),
//!     ("age", int().gte(0).optional()),
//!     ("role", enumeration(&["admin", "user"]).default("user")),
//! ]);
//!
//! let input: Value = [("name", Value::from("Ada"))].into_iter().collect();
//! let out = user.parse(input).unwrap();
//! assert_eq!(out.as_map().unwrap()["role"], Value::from("user"));
//!
//! let bad: Value = [("name", Value::from("")), ("age", Value::from(-1))]
//!     .into_iter()
//!     .collect();
//! let err = user.parse(bad).unwrap_err();
//! assert_eq!(err.issues().len(), 2);
//! assert_eq!(format_path(&err.issues()[1].path), "age");
//! ```

mod array;
mod check;
pub mod coerce;
mod config;
mod constraints;
mod context;
mod driver;
mod error;
mod format;
mod intersection;
mod issue;
mod locale;
mod merge;
mod object;
mod params;
mod primitive;
mod record;
mod schema;
mod union;
mod value;
mod wrappers;

pub use array::{array, tuple};
pub use check::{Check, CheckKind, OverwriteFn, PayloadFn, RefineFn};
pub use coerce::{
    bigint as coerced_bigint, boolean as coerced_bool, complex64 as coerced_complex64,
    complex128 as coerced_complex128, float64 as coerced_float64, int as coerced_int,
    string as coerced_string,
};
pub use config::{Config, config, set_config, update_config};
pub use constraints::MAX_SAFE_INTEGER;
pub use context::{ParseContext, ParsePayload, RefinementCtx};
pub use error::{ConfigError, FlattenedError, SchemaError, ZodError};
pub use format::StringFormat;
pub use intersection::intersection;
pub use issue::{
    Issue, IssueCode, Property, RawIssue, create_custom_issue, create_invalid_format_issue,
    create_invalid_type_issue, create_not_multiple_of_issue, create_too_big_issue,
    create_too_small_issue, finalize_issue, prop,
};
pub use locale::Locale;
pub use merge::{MergeConflict, merge_values};
pub use object::{ObjectDef, UnknownKeys, object};
pub use params::{ErrorMap, ErrorMessage, SchemaParams};
pub use primitive::{
    Case, ComplexKind, NumericKind, StringBoolOptions, any, bigint, boolean, complex64,
    complex128, date, enumeration, float32, float64, int, int8, int16, int32, int64, literal,
    never, null, string, string_bool, uint, uint8, uint16, uint32, uint64, undefined, unknown,
};
pub use record::{RecordDef, partial_record, record};
pub use schema::{Def, Fallback, Internals, Schema, TransformFn, TypeDef, ValueFn};
pub use union::union;
pub use value::{FromValue, Kind, Map, PathSegment, Ptr, Value, format_path};
