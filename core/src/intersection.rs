//! Intersection schemas: both sides must accept the input and their
//! outputs are deep-merged with [`merge_values`](crate::merge_values).

use std::collections::BTreeMap;

use tracing::debug;

use crate::context::{ParseContext, ParsePayload};
use crate::issue::create_invalid_type_issue;
use crate::merge::merge_values;
use crate::schema::{Schema, TypeDef};
use crate::value::{PathSegment, Value, format_path};

/// A schema accepting values accepted by both `left` and `right`.
///
/// # Examples
///
/// ```
/// use zodkit_core::{Value, int, intersection, object, string};
///
/// let named = object([("name", string())]).passthrough();
/// let aged = object([("age", int())]).passthrough();
/// let person = intersection(named, aged);
///
/// let input: Value = [("name", Value::from("Ada")), ("age", Value::from(36))]
///     .into_iter()
///     .collect();
/// assert_eq!(person.parse(input.clone()).unwrap(), input);
/// ```
pub fn intersection(left: Schema, right: Schema) -> Schema {
    Schema::from_def(TypeDef::Intersection(left, right))
}

impl Schema {
    /// Intersection of `self` and `other`.
    pub fn and(&self, other: &Schema) -> Schema {
        intersection(self.clone(), other.clone())
    }
}

pub(crate) fn run(
    schema: &Schema,
    left: &Schema,
    right: &Schema,
    payload: &mut ParsePayload,
    ctx: &ParseContext,
) {
    let input = payload.value.clone();
    let mut a = payload.fork(input.clone());
    left.run(&mut a, ctx);
    let mut b = payload.fork(input.clone());
    right.run(&mut b, ctx);

    if !a.issues.is_empty() || !b.issues.is_empty() {
        payload.issues.append(&mut a.issues);
        payload.issues.append(&mut b.issues);
        return;
    }

    match merge_values(&a.value, &b.value) {
        Ok(merged) => payload.value = merged,
        Err(conflict) => {
            let mut full = payload.path.clone();
            full.extend(conflict.path.iter().cloned());
            debug!(path = %format_path(&full), "Intersection results conflict");
            let issue = create_invalid_type_issue("intersection", &input)
                .with_params(merge_params(&conflict.path))
                .with_message(format!("Unmergable intersection at path {}", format_path(&full)))
                .with_inst(schema.def().error.clone());
            payload.add_issue(issue);
        }
    }
}

fn merge_params(path: &[PathSegment]) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("merge_conflict".to_string(), Value::Bool(true)),
        ("merge_path".to_string(), Value::from(format_path(path))),
    ])
}
