//! Leaf parse driver.
//!
//! Every primitive schema parses through [`run_leaf`]: coercion when
//! enabled, narrowing to the schema's type, then reference restoration so a
//! [`Ptr`] input comes back as the same `Ptr`. Null inputs never reach the
//! driver; [`Schema::run`] settles them first.
//!
//! Type-specific behavior enters only through [`primitive::is_target`],
//! [`primitive::coerce`] and [`primitive::accept`].

use std::borrow::Cow;

use tracing::debug;

use crate::context::ParsePayload;
use crate::primitive::{self, Rejection};
use crate::schema::Schema;
use crate::value::{Ptr, Value};

pub(crate) fn run_leaf(schema: &Schema, payload: &mut ParsePayload) {
    let internals = schema.get_internals();
    let kind = &internals.def.kind;
    let input = &payload.value;
    let target = input.deref();

    let working = if internals.coerce && !primitive::is_target(kind, target) {
        match primitive::coerce(kind, target) {
            Ok(value) => Cow::Owned(value),
            Err(err) => {
                debug!(schema = kind.name(), error = %err, "Coercion failed");
                let issue = schema.invalid_type(input);
                payload.add_issue(issue);
                return;
            }
        }
    } else {
        Cow::Borrowed(target)
    };

    match primitive::accept(kind, &working) {
        Ok(value) => {
            payload.value = restore_ref(&payload.value, value);
        }
        Err(Rejection::Type) => {
            let issue = schema.invalid_type(input);
            payload.add_issue(issue);
        }
        Err(Rejection::Issue(issue)) => {
            let issue = issue.with_inst(internals.def.error.clone());
            payload.add_issue(issue);
        }
    }
}

/// Returns `output` shaped like `input`.
///
/// A reference input whose target equals `output` comes back as the very
/// same reference; a changed value is wrapped in a new reference. Plain
/// inputs yield `output` unchanged.
pub(crate) fn restore_ref(input: &Value, output: Value) -> Value {
    match input {
        Value::Ptr(p) => {
            if *input.deref() == output {
                Value::Ptr(p.clone())
            } else if output.is_ptr() {
                output
            } else {
                Value::Ptr(Ptr::new(output))
            }
        }
        _ => output,
    }
}
