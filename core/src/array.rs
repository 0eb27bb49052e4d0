//! Array and tuple schemas.

use crate::context::{ParseContext, ParsePayload};
use crate::driver::restore_ref;
use crate::issue::{create_too_big_issue, create_too_small_issue};
use crate::schema::{Schema, TypeDef};
use crate::value::Value;

/// A homogeneous array of `item`.
///
/// # Examples
///
/// ```
/// use zodkit_core::{PathSegment, Value, array, int};
///
/// let schema = array(int()).min(1);
/// assert!(schema.parse(vec![1, 2]).is_ok());
/// let err = schema.parse(vec![Value::from(1), Value::from("x")]).unwrap_err();
/// assert_eq!(err.first().unwrap().path, vec![PathSegment::Index(1)]);
/// ```
pub fn array(item: Schema) -> Schema {
    Schema::from_def(TypeDef::Array(item))
}

/// A fixed-position array. Trailing optional items may be omitted.
pub fn tuple<I>(items: I) -> Schema
where
    I: IntoIterator<Item = Schema>,
{
    Schema::from_def(TypeDef::Tuple {
        items: items.into_iter().collect(),
        rest: None,
    })
}

impl Schema {
    /// Element schema of an array.
    pub fn element(&self) -> Option<&Schema> {
        match self.leaf_kind() {
            TypeDef::Array(item) => Some(item),
            _ => None,
        }
    }

    /// Validates tuple elements past the fixed positions with `rest`.
    pub fn rest(&self, rest: &Schema) -> Schema {
        let TypeDef::Tuple { items, .. } = &self.get_internals().def.kind else {
            return self.clone();
        };
        let items = items.clone();
        let rest = Some(rest.clone());
        self.modify(|i| i.def.kind = TypeDef::Tuple { items, rest })
    }
}

pub(crate) fn run_array(schema: &Schema, item: &Schema, payload: &mut ParsePayload, ctx: &ParseContext) {
    let input = payload.value.clone();
    let Some(elements) = input.deref().as_array() else {
        payload.add_issue(schema.invalid_type(&input));
        return;
    };

    let mut out = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let mut child = payload.child(element.clone(), index);
        item.run(&mut child, ctx);
        payload.issues.append(&mut child.issues);
        out.push(child.value);
    }
    payload.value = restore_ref(&input, Value::Array(out));
}

pub(crate) fn run_tuple(
    schema: &Schema,
    items: &[Schema],
    rest: Option<&Schema>,
    payload: &mut ParsePayload,
    ctx: &ParseContext,
) {
    let input = payload.value.clone();
    let Some(elements) = input.deref().as_array() else {
        payload.add_issue(schema.invalid_type(&input));
        return;
    };

    let required = items.len() - items.iter().rev().take_while(|s| s.is_optional()).count();
    if elements.len() < required {
        let issue = create_too_small_issue(required, true, "array", &input)
            .with_inst(schema.def().error.clone());
        payload.add_issue(issue);
        return;
    }
    if rest.is_none() && elements.len() > items.len() {
        let issue = create_too_big_issue(items.len(), true, "array", &input)
            .with_inst(schema.def().error.clone());
        payload.add_issue(issue);
        return;
    }

    let mut out = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let Some(item) = items.get(index).or(rest) else {
            break;
        };
        let mut child = payload.child(element.clone(), index);
        item.run(&mut child, ctx);
        payload.issues.append(&mut child.issues);
        out.push(child.value);
    }
    payload.value = restore_ref(&input, Value::Array(out));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{PathSegment, Ptr};
    use crate::{IssueCode, int, string};

    #[test]
    fn test_array_collects_all_element_issues() {
        let schema = array(int());
        let input = Value::Array(vec![Value::from("a"), Value::from(1), Value::from("b")]);
        let err = schema.parse(input).unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path.clone()).collect();
        assert_eq!(
            paths,
            vec![vec![PathSegment::Index(0)], vec![PathSegment::Index(2)]]
        );
    }

    #[test]
    fn test_array_length_checks() {
        let schema = array(int()).max(2);
        let err = schema.parse(vec![1, 2, 3]).unwrap_err();
        assert_eq!(err.to_string(), "array must be at most 2");
        assert!(array(int()).nonempty().parse(Vec::<i64>::new()).is_err());
        assert!(array(int()).length(2).parse(vec![1, 2]).is_ok());
    }

    #[test]
    fn test_array_pointer_identity() {
        let p = Ptr::new(vec![1, 2]);
        match array(int()).parse(Value::Ptr(p.clone())).unwrap() {
            Value::Ptr(q) => assert!(p.ptr_eq(&q)),
            other => panic!("expected pointer, got {other:?}"),
        }
    }

    #[test]
    fn test_tuple_positions_and_length() {
        let schema = tuple([string(), int()]);
        assert!(schema.parse(Value::Array(vec!["a".into(), 1.into()])).is_ok());

        let err = schema.parse(Value::Array(vec!["a".into()])).unwrap_err();
        let issue = err.first().unwrap();
        assert_eq!(issue.code, IssueCode::TooSmall);
        assert_eq!(issue.minimum, Some(Value::Uint(2)));

        let err = schema
            .parse(Value::Array(vec!["a".into(), 1.into(), 2.into()]))
            .unwrap_err();
        assert_eq!(err.code(), Some(IssueCode::TooBig));

        let err = schema.parse(Value::Array(vec![1.into(), 1.into()])).unwrap_err();
        assert_eq!(err.first().unwrap().path, vec![PathSegment::Index(0)]);
    }

    #[test]
    fn test_tuple_optional_tail_and_rest() {
        let schema = tuple([string(), int().optional()]);
        assert!(schema.parse(Value::Array(vec!["a".into()])).is_ok());

        let schema = tuple([string()]).rest(&int());
        assert!(schema.parse(Value::Array(vec!["a".into(), 1.into(), 2.into()])).is_ok());
        let err = schema
            .parse(Value::Array(vec!["a".into(), 1.into(), "x".into()]))
            .unwrap_err();
        assert_eq!(err.first().unwrap().path, vec![PathSegment::Index(2)]);
    }

    #[test]
    fn test_element_accessor() {
        assert_eq!(array(string()).element().unwrap().type_name(), "string");
        assert!(string().element().is_none());
    }
}
