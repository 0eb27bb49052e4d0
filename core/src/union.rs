//! Union schemas: the first option that accepts the input wins.

use tracing::debug;

use crate::context::{ParseContext, ParsePayload};
use crate::issue::{IssueCode, RawIssue, finalize_nested};
use crate::schema::{Schema, TypeDef};

/// A union of `options`, tried in order.
///
/// # Examples
///
/// ```
/// use zodkit_core::{IssueCode, Value, int, string, union};
///
/// let id = union([string(), int()]);
/// assert_eq!(id.parse(7).unwrap(), Value::Int(7));
///
/// let err = id.parse(true).unwrap_err();
/// assert_eq!(err.code(), Some(IssueCode::InvalidUnion));
/// assert_eq!(err.first().unwrap().errors.len(), 2);
/// ```
pub fn union<I>(options: I) -> Schema
where
    I: IntoIterator<Item = Schema>,
{
    Schema::from_def(TypeDef::Union(options.into_iter().collect()))
}

impl Schema {
    /// Union of `self` and `other`.
    pub fn or(&self, other: &Schema) -> Schema {
        union([self.clone(), other.clone()])
    }
}

pub(crate) fn run(schema: &Schema, options: &[Schema], payload: &mut ParsePayload, ctx: &ParseContext) {
    let mut failures = Vec::with_capacity(options.len());

    for (index, option) in options.iter().enumerate() {
        let mut branch = payload.fork(payload.value.clone());
        option.run(&mut branch, ctx);
        if branch.issues.is_empty() {
            debug!(index, option = option.type_name(), "Union option matched");
            payload.value = branch.value;
            return;
        }
        failures.push(finalize_nested(&branch.issues, ctx));
    }

    debug!(options = options.len(), "No union option matched");
    let issue = RawIssue::new(IssueCode::InvalidUnion, payload.value.clone())
        .with_errors(failures)
        .with_inst(schema.def().error.clone());
    payload.add_issue(issue);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{PathSegment, Value};
    use crate::{int, literal, object, string};

    #[test]
    fn test_first_matching_option_wins() {
        let schema = union([string().transform_any(|_, _| Ok::<_, String>(Value::from("first"))), string()]);
        assert_eq!(schema.parse("x").unwrap(), Value::from("first"));
    }

    #[test]
    fn test_exhaustion_collects_branch_errors() {
        let schema = union([string(), int()]);
        let err = schema.parse(1.5).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        let issue = err.first().unwrap();
        assert_eq!(issue.code, IssueCode::InvalidUnion);
        assert_eq!(issue.errors[0][0].expected.as_deref(), Some("string"));
        assert_eq!(issue.errors[1][0].expected.as_deref(), Some("int"));
        assert_eq!(err.to_string(), "Invalid input");
    }

    #[test]
    fn test_nested_union_path() {
        let schema = object([("id", union([literal(["a"]), int()]))]);
        let input: Value = [("id", "b")].into_iter().collect();
        let err = schema.parse(input).unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.path, vec![PathSegment::from("id")]);
        assert_eq!(issue.errors[0][0].path, vec![PathSegment::from("id")]);
    }

    #[test]
    fn test_null_reaches_nilable_option() {
        let schema = union([string(), int().nilable()]);
        assert!(schema.parse(Value::Null).is_ok());
        assert!(union([string(), int()]).parse(Value::Null).is_err());
    }

    #[test]
    fn test_or_builds_union() {
        let schema = string().or(&int());
        assert_eq!(schema.type_name(), "union");
        assert!(schema.parse(3).is_ok());
    }

    #[test]
    fn test_union_error_override() {
        let schema = union([string(), int()]).error("must be text or a number");
        assert_eq!(schema.parse(false).unwrap_err().to_string(), "must be text or a number");
    }
}
