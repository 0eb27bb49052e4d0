//! Object schemas: a fixed shape of named fields.
//!
//! Fields are parsed in declaration order and the output map keeps that
//! order. A missing field is left out when its schema is optional and
//! filled in when it carries a default or prefault; any other missing
//! field reports `invalid_type` at its own path, even when nilable. Keys outside the shape
//! follow the [`UnknownKeys`] policy.
//!
//! # Examples
//!
//! ```
//! use zodkit_core::{IssueCode, Value, int, object, string};
//!
//! let user = object([("name", string()), ("age", int().optional())]);
//!
//! let input: Value = [("name", Value::from("Ada")), ("extra", Value::from(1))]
//!     .into_iter()
//!     .collect();
//! let out = user.parse(input.clone()).unwrap();
//! assert_eq!(out.as_map().unwrap().len(), 1);
//!
//! let err = user.strict().parse(input).unwrap_err();
//! assert_eq!(err.code(), Some(IssueCode::UnrecognizedKeys));
//! ```

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::coerce;
use crate::context::{ParseContext, ParsePayload};
use crate::driver::restore_ref;
use crate::issue::{IssueCode, RawIssue};
use crate::primitive::enumeration;
use crate::schema::{Schema, TypeDef};
use crate::value::{Map, Value};

/// Handling of input keys that are not part of the shape.
#[derive(Debug, Clone, Default)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Report them as `unrecognized_keys`.
    Strict,
    /// Copy them to the output unvalidated.
    Passthrough,
    /// Validate them with a schema.
    Catchall(Schema),
}

#[derive(Debug, Clone, Default)]
pub struct ObjectDef {
    pub shape: IndexMap<String, Schema>,
    pub unknown: UnknownKeys,
}

/// An object schema with `fields` in the given order.
pub fn object<I, K>(fields: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Schema::from_def(TypeDef::Object(ObjectDef {
        shape: fields.into_iter().map(|(k, s)| (k.into(), s)).collect(),
        unknown: UnknownKeys::Strip,
    }))
}

pub(crate) fn run(schema: &Schema, def: &ObjectDef, payload: &mut ParsePayload, ctx: &ParseContext) {
    let input = payload.value.clone();
    let map: Cow<'_, Map> = match input.deref() {
        Value::Map(map) => Cow::Borrowed(map),
        other if schema.get_internals().coerce => match coerce::to_map(other) {
            Ok(Value::Map(map)) => Cow::Owned(map),
            _ => {
                payload.add_issue(schema.invalid_type(&input));
                return;
            }
        },
        _ => {
            payload.add_issue(schema.invalid_type(&input));
            return;
        }
    };

    let mut out = Map::with_capacity(def.shape.len());
    for (key, field) in &def.shape {
        let present = map.contains_key(key);
        let value = match map.get(key) {
            Some(value) => value.clone(),
            None if field.is_optional() => continue,
            None if field.fills_missing() => Value::Null,
            None => {
                let mut child = payload.child(Value::Null, key.as_str());
                child.add_issue(field.invalid_type(&Value::Null));
                payload.issues.append(&mut child.issues);
                continue;
            }
        };
        let mut child = payload.child(value, key.as_str());
        field.run(&mut child, ctx);
        if child.issues.is_empty() {
            if present || !child.value.is_nullish() {
                out.insert(key.clone(), child.value);
            }
        } else {
            payload.issues.append(&mut child.issues);
        }
    }

    let unknown: Vec<&String> = map.keys().filter(|k| !def.shape.contains_key(*k)).collect();
    match &def.unknown {
        UnknownKeys::Strip => {}
        UnknownKeys::Strict => {
            if !unknown.is_empty() {
                let issue = RawIssue::new(IssueCode::UnrecognizedKeys, input.clone())
                    .with_keys(unknown.iter().map(|k| k.to_string()).collect())
                    .with_inst(schema.def().error.clone());
                payload.add_issue(issue);
            }
        }
        UnknownKeys::Passthrough => {
            for key in unknown {
                out.insert(key.clone(), map[key.as_str()].clone());
            }
        }
        UnknownKeys::Catchall(rest) => {
            for key in unknown {
                let mut child = payload.child(map[key.as_str()].clone(), key.as_str());
                rest.run(&mut child, ctx);
                if child.issues.is_empty() {
                    out.insert(key.clone(), child.value);
                } else {
                    payload.issues.append(&mut child.issues);
                }
            }
        }
    }

    payload.value = restore_ref(&input, Value::Map(out));
}

impl Schema {
    /// `true` when a missing key is filled in by a default or prefault,
    /// possibly under transforms and pipes.
    pub(crate) fn fills_missing(&self) -> bool {
        match &self.get_internals().def.kind {
            TypeDef::Default { .. } | TypeDef::Prefault { .. } => true,
            TypeDef::Transform { inner, .. } => inner.fills_missing(),
            TypeDef::Pipe { input, .. } => input.fills_missing(),
            _ => false,
        }
    }

    /// The field schemas of an object schema.
    pub fn shape(&self) -> Option<&IndexMap<String, Schema>> {
        match self.leaf_kind() {
            TypeDef::Object(def) => Some(&def.shape),
            _ => None,
        }
    }

    fn with_object(&self, f: impl FnOnce(&mut ObjectDef)) -> Schema {
        if !matches!(self.get_internals().def.kind, TypeDef::Object(_)) {
            return self.clone();
        }
        self.modify(|i| {
            if let TypeDef::Object(def) = &mut i.def.kind {
                f(def);
            }
        })
    }

    /// Reports unknown keys as `unrecognized_keys`.
    pub fn strict(&self) -> Schema {
        self.with_object(|def| def.unknown = UnknownKeys::Strict)
    }

    /// Drops unknown keys (the default).
    pub fn strip(&self) -> Schema {
        self.with_object(|def| def.unknown = UnknownKeys::Strip)
    }

    /// Keeps unknown keys unvalidated.
    pub fn passthrough(&self) -> Schema {
        self.with_object(|def| def.unknown = UnknownKeys::Passthrough)
    }

    /// Validates unknown keys with `rest`.
    pub fn catchall(&self, rest: &Schema) -> Schema {
        let rest = rest.clone();
        self.with_object(|def| def.unknown = UnknownKeys::Catchall(rest))
    }

    /// Adds or replaces fields.
    pub fn extend<I, K>(&self, fields: I) -> Schema
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let fields: Vec<(String, Schema)> = fields.into_iter().map(|(k, s)| (k.into(), s)).collect();
        self.with_object(|def| def.shape.extend(fields))
    }

    /// Adds `other`'s fields, which win on conflicts, and adopts its
    /// unknown-key policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use zodkit_core::{int, object, string};
    ///
    /// let a = object([("id", int()), ("name", string())]);
    /// let b = object([("name", int()), ("tag", string())]);
    /// let keys: Vec<_> = a.merge(&b).shape().unwrap().keys().cloned().collect();
    /// assert_eq!(keys, ["id", "name", "tag"]);
    /// assert_eq!(a.merge(&b).shape().unwrap()["name"].type_name(), "int");
    /// ```
    pub fn merge(&self, other: &Schema) -> Schema {
        let TypeDef::Object(other_def) = &other.get_internals().def.kind else {
            return self.clone();
        };
        let other_def = other_def.clone();
        self.with_object(|def| {
            def.shape.extend(other_def.shape);
            def.unknown = other_def.unknown;
        })
    }

    /// Keeps only `keys`.
    pub fn pick(&self, keys: &[&str]) -> Schema {
        self.with_object(|def| def.shape.retain(|k, _| keys.contains(&k.as_str())))
    }

    /// Drops `keys`.
    pub fn omit(&self, keys: &[&str]) -> Schema {
        self.with_object(|def| def.shape.retain(|k, _| !keys.contains(&k.as_str())))
    }

    /// Makes every field optional.
    pub fn partial(&self) -> Schema {
        self.with_object(|def| {
            for field in def.shape.values_mut() {
                *field = field.optional();
            }
        })
    }

    /// Clears the optional flag of every field.
    pub fn required(&self) -> Schema {
        self.with_object(|def| {
            for field in def.shape.values_mut() {
                *field = field.modify(|i| i.optional = false);
            }
        })
    }

    /// Enum of the field names.
    pub fn keyof(&self) -> Schema {
        let keys: Vec<&str> = self
            .shape()
            .map(|shape| shape.keys().map(String::as_str).collect())
            .unwrap_or_default();
        enumeration(&keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PathSegment;
    use crate::{array, int, string};

    fn map(pairs: &[(&str, Value)]) -> Value {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_fields_in_declared_order() {
        let schema = object([("b", int()), ("a", int())]);
        let out = schema
            .parse(map(&[("a", Value::from(1)), ("b", Value::from(2))]))
            .unwrap();
        let keys: Vec<_> = out.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_missing_required_field() {
        let schema = object([("name", string())]);
        let err = schema.parse(map(&[])).unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.code, IssueCode::InvalidType);
        assert_eq!(issue.path, vec![PathSegment::from("name")]);
        assert_eq!(issue.received.as_deref(), Some("null"));
    }

    #[test]
    fn test_missing_optional_and_default_fields() {
        let schema = object([("a", int().optional()), ("b", int().default(5))]);
        let out = schema.parse(map(&[])).unwrap();
        let out = out.as_map().unwrap();
        assert!(!out.contains_key("a"));
        assert_eq!(out["b"], Value::Int(5));
    }

    #[test]
    fn test_nested_paths() {
        let schema = object([("tags", array(string().min(2)))]);
        let input = map(&[("tags", Value::from(vec!["ok", "x"]))]);
        let err = schema.parse(input).unwrap_err();
        assert_eq!(
            err.first().unwrap().path,
            vec![PathSegment::from("tags"), PathSegment::from(1usize)]
        );
    }

    #[test]
    fn test_unknown_key_policies() {
        let base = object([("a", int())]);
        let input = map(&[("a", Value::from(1)), ("z", Value::from("x"))]);

        assert!(!base.parse(input.clone()).unwrap().as_map().unwrap().contains_key("z"));
        let kept = base.passthrough().parse(input.clone()).unwrap();
        assert_eq!(kept.as_map().unwrap()["z"], Value::from("x"));

        let err = base.strict().parse(input.clone()).unwrap_err();
        assert_eq!(err.first().unwrap().keys, vec!["z".to_string()]);
        assert_eq!(err.to_string(), "Unrecognized key(s) in object: \"z\"");

        let err = base.catchall(&int()).parse(input).unwrap_err();
        assert_eq!(err.first().unwrap().path, vec![PathSegment::from("z")]);
    }

    #[test]
    fn test_shape_helpers() {
        let base = object([("id", int()), ("name", string()), ("email", string())]);
        assert_eq!(base.pick(&["id"]).shape().unwrap().len(), 1);
        assert_eq!(base.omit(&["id"]).shape().unwrap().len(), 2);
        assert!(base.partial().parse(map(&[])).is_ok());
        assert!(base.partial().required().parse(map(&[])).is_err());
        let extended = base.extend([("age", int())]);
        assert_eq!(extended.shape().unwrap().len(), 4);
        assert_eq!(base.shape().unwrap().len(), 3);
        let keys = base.keyof();
        assert!(keys.parse("email").is_ok());
        assert!(keys.parse("phone").is_err());
    }

    #[test]
    fn test_coerced_object_reads_json_text() {
        let schema = object([("a", int())]).coerced();
        let out = schema.parse(r#"{"a": 3}"#).unwrap();
        assert_eq!(out.as_map().unwrap()["a"], Value::Int(3));
        assert!(object([("a", int())]).parse(r#"{"a": 3}"#).is_err());
    }

    #[test]
    fn test_missing_nilable_field_is_invalid_type() {
        let schema = object([("a", string().nilable())]);
        let err = schema.parse(map(&[])).unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.code, crate::IssueCode::InvalidType);
        assert_eq!(issue.path, vec![PathSegment::from("a")]);

        let out = schema.parse(map(&[("a", Value::Null)])).unwrap();
        assert!(out.as_map().unwrap()["a"].is_nullish());
    }

    #[test]
    fn test_missing_field_filled_through_transform() {
        let schema = object([("a", int().default(2).transform_any(|v, _| Ok::<_, String>(v)))]);
        let out = schema.parse(map(&[])).unwrap();
        assert_eq!(out.as_map().unwrap()["a"], Value::Int(2));
    }
}
