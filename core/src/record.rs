//! Record schemas: maps with homogeneous keys and values.
//!
//! Every key is parsed by the key schema and every value by the value
//! schema. A key failure raises `invalid_key` and a value failure raises
//! `invalid_element`; both sit at the entry's path and carry the nested
//! issues in `errors`. Output keeps the input's key order.
//!
//! When the key schema is an enum or literal the record is exhaustive:
//! keys outside the set raise `unrecognized_keys`, and listed keys missing
//! from the input are parsed as null (so a required value reports
//! `invalid_type`). [`partial_record`] lifts the second rule.

use tracing::trace;

use crate::context::{ParseContext, ParsePayload};
use crate::driver::restore_ref;
use crate::issue::{IssueCode, RawIssue, finalize_nested};
use crate::schema::{Schema, TypeDef};
use crate::value::{Map, Value};

#[derive(Debug, Clone)]
pub struct RecordDef {
    pub key: Schema,
    pub value: Schema,
    /// Allow enumerated keys to be missing.
    pub partial: bool,
}

/// A record keyed by `key` with values matching `value`.
///
/// # Examples
///
/// ```
/// use zodkit_core::{IssueCode, Value, enumeration, record, string};
///
/// let fish = record(enumeration(&["Tuna", "Salmon"]), string());
/// let input: Value = [("Tuna", "a"), ("Salmon", "b"), ("Trout", "c")].into_iter().collect();
/// let err = fish.parse(input).unwrap_err();
/// assert_eq!(err.code(), Some(IssueCode::UnrecognizedKeys));
/// assert_eq!(err.first().unwrap().keys, vec!["Trout".to_string()]);
/// ```
pub fn record(key: Schema, value: Schema) -> Schema {
    Schema::from_def(TypeDef::Record(RecordDef {
        key,
        value,
        partial: false,
    }))
}

/// A record whose enumerated keys may be missing.
pub fn partial_record(key: Schema, value: Schema) -> Schema {
    Schema::from_def(TypeDef::Record(RecordDef {
        key,
        value,
        partial: true,
    }))
}

/// Allowed keys when the key schema is an enum or literal, as map keys
/// paired with the value the key schema expects.
fn enumerated_keys(key: &Schema) -> Option<Vec<(String, Value)>> {
    match key.leaf_kind() {
        TypeDef::Enum(values) | TypeDef::Literal(values) => Some(
            values
                .iter()
                .map(|v| (v.as_str().map_or_else(|| v.to_string(), str::to_string), v.clone()))
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn run(schema: &Schema, def: &RecordDef, payload: &mut ParsePayload, ctx: &ParseContext) {
    let input = payload.value.clone();
    let Some(map) = input.deref().as_map() else {
        payload.add_issue(schema.invalid_type(&input));
        return;
    };

    let allowed = enumerated_keys(&def.key);
    let mut out = Map::with_capacity(map.len());
    let mut unrecognized = Vec::new();

    for (key, value) in map {
        let key_value = match &allowed {
            Some(allowed) => match allowed.iter().find(|(name, _)| name == key) {
                Some((_, value)) => value.clone(),
                None => {
                    unrecognized.push(key.clone());
                    continue;
                }
            },
            None => Value::from(key.as_str()),
        };

        let mut key_payload = payload.fork(key_value);
        def.key.run(&mut key_payload, ctx);
        if !key_payload.issues.is_empty() {
            let issue = RawIssue::new(IssueCode::InvalidKey, key.as_str())
                .with_origin("record")
                .with_errors(vec![finalize_nested(&key_payload.issues, ctx)])
                .with_path(vec![key.as_str().into()])
                .with_inst(schema.def().error.clone());
            payload.add_issue(issue);
            continue;
        }
        let out_key = match key_payload.value.deref() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let mut child = payload.child(value.clone(), key.as_str());
        def.value.run(&mut child, ctx);
        if !child.issues.is_empty() {
            let issue = RawIssue::new(IssueCode::InvalidElement, value.clone())
                .with_origin("record")
                .with_key(key.as_str())
                .with_errors(vec![finalize_nested(&child.issues, ctx)])
                .with_path(vec![key.as_str().into()])
                .with_inst(schema.def().error.clone());
            payload.add_issue(issue);
            continue;
        }
        out.insert(out_key, child.value);
    }

    if !unrecognized.is_empty() {
        trace!(keys = ?unrecognized, "Record keys outside the enumerated set");
        let issue = RawIssue::new(IssueCode::UnrecognizedKeys, input.clone())
            .with_keys(unrecognized)
            .with_inst(schema.def().error.clone());
        payload.add_issue(issue);
    }

    if let Some(allowed) = allowed.filter(|_| !def.partial) {
        for (key, _) in allowed.iter().filter(|(k, _)| !map.contains_key(k.as_str())) {
            if def.value.is_optional() {
                continue;
            }
            let mut child = payload.child(Value::Null, key.as_str());
            if !def.value.fills_missing() {
                child.add_issue(def.value.invalid_type(&Value::Null));
                payload.issues.append(&mut child.issues);
                continue;
            }
            def.value.run(&mut child, ctx);
            if child.issues.is_empty() {
                if !child.value.is_nullish() {
                    out.insert(key.clone(), child.value);
                }
            } else {
                payload.issues.append(&mut child.issues);
            }
        }
    }

    payload.value = restore_ref(&input, Value::Map(out));
}
