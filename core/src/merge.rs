//! Deep merging of two parsed values, used by intersections.
//!
//! Maps merge key by key (left keys first, then right-only keys), arrays of
//! equal length merge element-wise, and equal values merge to themselves.
//! A null side yields the other side. Anything else is a conflict reported
//! at the path where the two values disagree.
//!
//! # Example
//!
//! ```
//! use zodkit_core::{Value, merge_values};
//!
//! let a: Value = [("id", Value::from(1)), ("name", Value::from("Ada"))].into_iter().collect();
//! let b: Value = [("id", Value::from(1)), ("admin", Value::from(true))].into_iter().collect();
//! let merged = merge_values(&a, &b).unwrap();
//! assert_eq!(merged.as_map().unwrap().len(), 3);
//!
//! let c: Value = [("id", Value::from(2))].into_iter().collect();
//! let err = merge_values(&a, &c).unwrap_err();
//! assert_eq!(err.to_string(), "Unmergable intersection at path id");
//! ```

use thiserror::Error;

use crate::driver::restore_ref;
use crate::value::{Map, PathSegment, Value, format_path};

/// Two values that cannot be combined.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unmergable intersection at path {}", format_path(.path))]
pub struct MergeConflict {
    /// Location of the disagreement, relative to the merged values.
    pub path: Vec<PathSegment>,
}

/// Merges `left` and `right` into one value.
pub fn merge_values(left: &Value, right: &Value) -> Result<Value, MergeConflict> {
    let mut path = Vec::new();
    merge_at(left, right, &mut path)
}

fn merge_at(left: &Value, right: &Value, path: &mut Vec<PathSegment>) -> Result<Value, MergeConflict> {
    if left.is_nullish() {
        return Ok(right.clone());
    }
    if right.is_nullish() {
        return Ok(left.clone());
    }

    let merged = match (left.deref(), right.deref()) {
        (Value::Map(a), Value::Map(b)) => {
            let mut out = Map::with_capacity(a.len() + b.len());
            for (key, value) in a {
                let value = match b.get(key) {
                    Some(other) => {
                        path.push(PathSegment::from(key.as_str()));
                        let merged = merge_at(value, other, path)?;
                        path.pop();
                        merged
                    }
                    None => value.clone(),
                };
                out.insert(key.clone(), value);
            }
            for (key, value) in b {
                if !a.contains_key(key) {
                    out.insert(key.clone(), value.clone());
                }
            }
            Value::Map(out)
        }
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => {
            let mut out = Vec::with_capacity(a.len());
            for (index, (x, y)) in a.iter().zip(b).enumerate() {
                path.push(PathSegment::Index(index));
                out.push(merge_at(x, y, path)?);
                path.pop();
            }
            Value::Array(out)
        }
        (a, b) if a == b => a.clone(),
        _ => {
            return Err(MergeConflict { path: path.clone() });
        }
    };
    Ok(restore_ref(left, merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Ptr;

    fn map(pairs: &[(&str, Value)]) -> Value {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_map_key_order_left_first() {
        let a = map(&[("b", Value::from(1)), ("a", Value::from(2))]);
        let b = map(&[("c", Value::from(3)), ("a", Value::from(2))]);
        let merged = merge_values(&a, &b).unwrap();
        let keys: Vec<_> = merged.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn test_nested_conflict_path() {
        let a = map(&[("tags", Value::from(vec!["x", "y"]))]);
        let b = map(&[("tags", Value::from(vec!["x", "z"]))]);
        let err = merge_values(&a, &b).unwrap_err();
        assert_eq!(err.path, vec![PathSegment::from("tags"), PathSegment::Index(1)]);
        assert_eq!(err.to_string(), "Unmergable intersection at path tags[1]");
    }

    #[test]
    fn test_arrays_of_different_length_conflict() {
        let err = merge_values(&Value::from(vec![1]), &Value::from(vec![1, 2])).unwrap_err();
        assert!(err.path.is_empty());
    }

    #[test]
    fn test_null_side_yields_other() {
        assert_eq!(merge_values(&Value::Null, &Value::from(3)).unwrap(), Value::Int(3));
        assert_eq!(merge_values(&Value::from("a"), &Value::Null).unwrap(), Value::from("a"));
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        assert!(merge_values(&Value::Int(4), &Value::Uint(4)).is_ok());
        assert!(merge_values(&Value::from(4), &Value::from("4")).is_err());
    }

    #[test]
    fn test_pointer_kept_when_unchanged() {
        let p = Ptr::new(map(&[("a", Value::from(1))]));
        let merged = merge_values(&Value::Ptr(p.clone()), &map(&[("a", Value::from(1))])).unwrap();
        match merged {
            Value::Ptr(q) => assert!(p.ptr_eq(&q)),
            other => panic!("expected pointer, got {other:?}"),
        }
    }
}
