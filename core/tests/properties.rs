//! Property tests for invariants that hold across schemas and inputs.

use std::convert::Infallible;

use proptest::prelude::*;
use zodkit_core::{
    IssueCode, Kind, PathSegment, Ptr, Value, array, int, intersection, object, string, union,
};

fn as_map(pairs: Vec<(String, Value)>) -> Value {
    pairs.into_iter().collect()
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
        (-1e6f64..1e6).prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn pointer_identity_preserved(n in any::<i64>()) {
        let p = Ptr::new(n);
        match int().parse(Value::Ptr(p.clone())) {
            Ok(Value::Ptr(q)) => prop_assert!(p.ptr_eq(&q)),
            other => prop_assert!(false, "expected pointer, got {:?}", other),
        }
    }

    #[test]
    fn pointer_identity_through_containers(items in prop::collection::vec(any::<i32>(), 0..8)) {
        let p = Ptr::new(items);
        match array(int()).parse(Value::Ptr(p.clone())) {
            Ok(Value::Ptr(q)) => prop_assert!(p.ptr_eq(&q)),
            other => prop_assert!(false, "expected pointer, got {:?}", other),
        }
    }

    #[test]
    fn chaining_leaves_original_untouched(n in 0i64..=10) {
        let base = int().max(10);
        let _narrowed = base.min(20).optional().default(3);
        prop_assert!(base.parse(n).is_ok());
        prop_assert!(base.parse(Value::Null).is_err());
    }

    #[test]
    fn null_accepted_only_by_nil_wrappers(d in "[a-z]{1,6}") {
        prop_assert!(string().parse(Value::Null).is_err());
        prop_assert_eq!(string().optional().parse(Value::Null).unwrap(), Value::Null);
        match string().nilable().parse(Value::Null).unwrap() {
            Value::Ptr(p) => {
                prop_assert!(p.is_null());
                prop_assert_eq!(p.elem(), Kind::String);
            }
            other => prop_assert!(false, "expected typed null, got {:?}", other),
        }
        prop_assert_eq!(string().default(d.as_str()).parse(Value::Null).unwrap(), Value::from(d));
    }

    #[test]
    fn parse_is_idempotent(s in "[ a-zA-Z]{0,16}") {
        let schema = string().trim().to_lowercase();
        let once = schema.parse(s).unwrap();
        prop_assert_eq!(schema.parse(once.clone()).unwrap(), once);
    }

    #[test]
    fn pipe_into_transform_applies_function(n in -1000i64..1000) {
        let double = |v: i64| v * 2;
        let schema = int().pipe(&zodkit_core::any().transform(move |v: i64, _| Ok::<_, Infallible>(double(v))));
        let direct = int().parse(n).unwrap().as_i64().map(double);
        prop_assert_eq!(schema.parse(n).unwrap().as_i64(), direct);
    }

    #[test]
    fn default_beats_prefault_on_null(d in "[a-z]{1,6}", p in "[A-Z]{1,6}") {
        let schema = string().default(d.as_str()).prefault(p.as_str());
        prop_assert_eq!(schema.parse(Value::Null).unwrap(), Value::from(d));
    }

    #[test]
    fn prefault_only_on_failure(s in "[a-z]{0,6}") {
        let schema = string().min(3).prefault("fallback");
        let out = schema.parse(s.as_str()).unwrap();
        if s.chars().count() >= 3 {
            prop_assert_eq!(out, Value::from(s));
        } else {
            prop_assert_eq!(out, Value::from("fallback"));
        }
    }

    #[test]
    fn disjoint_intersection_commutes(a in any::<i64>(), b in "[a-z]{0,6}") {
        let left = object([("a", int())]);
        let right = object([("b", string())]);
        let input = as_map(vec![("a".into(), Value::from(a)), ("b".into(), Value::from(b))]);
        let ab = intersection(left.clone(), right.clone()).parse(input.clone()).unwrap();
        let ba = intersection(right, left).parse(input).unwrap();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn union_picks_matching_arm(value in arb_leaf()) {
        let schema = union([string(), int()]);
        match (&value, schema.parse(value.clone())) {
            (Value::String(_) | Value::Int(_), Ok(out)) => prop_assert_eq!(out, value),
            (Value::Bool(_) | Value::Float(_), Err(err)) => {
                prop_assert_eq!(err.code(), Some(IssueCode::InvalidUnion));
            }
            (value, result) => prop_assert!(false, "{:?} gave {:?}", value, result),
        }
    }

    #[test]
    fn compound_issue_paths_start_at_failing_child(items in prop::collection::vec(arb_leaf(), 1..8)) {
        let input = Value::Array(items.clone());
        if let Err(err) = array(int()).parse(input) {
            for issue in err.issues() {
                let Some(PathSegment::Index(i)) = issue.path.first() else {
                    return Err(TestCaseError::fail("issue without index path"));
                };
                prop_assert!(!matches!(items[*i], Value::Int(_)));
            }
        }
    }
}
