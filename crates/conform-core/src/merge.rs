//! # Output Merging
//!
//! Intersection schemas produce one output per option and fold them into a
//! single value with [`merge_outputs`]. The merge is structural:
//!
//! - scalars (and dates, by timestamp) merge only when strictly equal;
//! - objects merge key by key over the union of their keys, recursing on
//!   keys present in both;
//! - arrays merge position by position and only at equal length.
//!
//! Anything else is incompatible. The merge reports no detail about where
//! the conflict was found.

use crate::value::{Object, Value};

/// Merge two option outputs, or `None` if they are incompatible.
pub fn merge_outputs(a: &Value, b: &Value) -> Option<Value> {
    if a.strict_eq(b) {
        return Some(a.clone());
    }
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            let mut merged = Object::with_capacity(left.len().max(right.len()));
            for (key, value) in left {
                let value = match right.get(key) {
                    Some(other) => merge_outputs(value, other)?,
                    None => value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            for (key, value) in right {
                if !left.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Some(Value::Object(merged))
        }
        (Value::Array(left), Value::Array(right)) if left.len() == right.len() => left
            .iter()
            .zip(right)
            .map(|(l, r)| merge_outputs(l, r))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}
