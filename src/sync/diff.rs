//! Structural difference between two shared objects.
//!
//! The diff is one level deep: values are compared as opaque JSON values, so a
//! nested object that differs anywhere is reported as one changed key.

use crate::core::SharedObject;

/// Keys that differ between an older and a newer object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// Keys that are new in `newer` or whose value differs, with the new value.
    pub changed: SharedObject,
    /// Keys present in `older` but missing from `newer`, in key order.
    pub removed: Vec<String>,
}

impl DiffResult {
    /// Number of entries that applying this diff touches.
    pub fn len(&self) -> usize {
        self.changed.len() + self.removed.len()
    }

    /// True if the two objects were equal.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compute the difference from `older` to `newer`.
pub fn diff(older: &SharedObject, newer: &SharedObject) -> DiffResult {
    let changed = newer
        .iter()
        .filter(|(key, value)| older.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let removed = older
        .keys()
        .filter(|key| !newer.contains_key(key.as_str()))
        .cloned()
        .collect();

    DiffResult { changed, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn obj(value: Value) -> SharedObject {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_identical_objects() {
        let a = obj(json!({"a": 1, "b": [1, 2]}));
        let result = diff(&a, &a);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_changed_added_removed() {
        let older = obj(json!({"a": 1, "b": 2, "c": 3}));
        let newer = obj(json!({"a": 1, "b": 20, "d": 4}));

        let result = diff(&older, &newer);
        assert_eq!(result.changed, obj(json!({"b": 20, "d": 4})));
        assert_eq!(result.removed, vec!["c".to_string()]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_empty_older() {
        let newer = obj(json!({"x": true, "y": "s"}));
        let result = diff(&SharedObject::new(), &newer);
        assert_eq!(result.changed, newer);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_empty_newer() {
        let older = obj(json!({"x": true, "y": "s"}));
        let result = diff(&older, &SharedObject::new());
        assert!(result.changed.is_empty());
        assert_eq!(result.removed, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_nested_values_compare_structurally() {
        let older = obj(json!({"n": {"deep": [1, {"k": "v"}]}, "m": {"z": 1}}));
        let newer = obj(json!({"n": {"deep": [1, {"k": "v"}]}, "m": {"z": 2}}));

        let result = diff(&older, &newer);
        assert_eq!(result.changed, obj(json!({"m": {"z": 2}})));
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_type_change_is_a_change() {
        let older = obj(json!({"a": 1}));
        let newer = obj(json!({"a": "1"}));
        assert_eq!(diff(&older, &newer).changed, newer);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::from),
            (0i64..5).prop_map(Value::from),
            "[a-c]{0,2}".prop_map(Value::from),
        ]
    }

    fn object_strategy() -> impl Strategy<Value = SharedObject> {
        prop::collection::btree_map("[a-f]", value_strategy(), 0..6)
            .prop_map(|map| map.into_iter().collect())
    }

    proptest! {
        #[test]
        fn changed_is_exactly_new_or_different(a in object_strategy(), b in object_strategy()) {
            let result = diff(&a, &b);
            for (key, value) in &b {
                let expected = a.get(key) != Some(value);
                prop_assert_eq!(result.changed.contains_key(key), expected);
            }
            for (key, value) in &result.changed {
                prop_assert_eq!(b.get(key), Some(value));
            }
        }

        #[test]
        fn removed_is_exactly_older_minus_newer(a in object_strategy(), b in object_strategy()) {
            let result = diff(&a, &b);
            let expected: Vec<String> = a.keys().filter(|k| !b.contains_key(*k)).cloned().collect();
            prop_assert_eq!(result.removed, expected);
        }

        #[test]
        fn self_diff_is_empty(a in object_strategy()) {
            prop_assert!(diff(&a, &a).is_empty());
        }

        #[test]
        fn applying_diff_reaches_newer(a in object_strategy(), b in object_strategy()) {
            let result = diff(&a, &b);
            let mut patched = a.clone();
            for (key, value) in result.changed {
                patched.insert(key, value);
            }
            for key in result.removed {
                patched.remove(&key);
            }
            prop_assert_eq!(patched, b);
        }
    }
}
