//! Props Resolver - splits incoming properties into declared props and attrs.

use serde_json::{Map, Value};

/// Declared prop names mapped to arbitrary schema values.
///
/// Only key presence is consulted; validators and defaults stored as values
/// are left for other layers.
pub type PropsSchema = Map<String, Value>;

/// Incoming properties whose keys are declared in the schema.
pub type Props = Map<String, Value>;

/// Incoming properties whose keys are not declared in the schema.
pub type Attrs = Map<String, Value>;

/// Partition `incoming` by the keys of `schema`.
///
/// Both results keep the incoming order. Missing `incoming` yields two empty
/// maps. No validation, coercion or defaults happen here.
pub fn resolve_props(
    schema: &PropsSchema,
    incoming: Option<&Map<String, Value>>,
) -> (Props, Attrs) {
    let mut props = Props::new();
    let mut attrs = Attrs::new();

    for (key, value) in incoming.into_iter().flatten() {
        if schema.contains_key(key) {
            props.insert(key.clone(), value.clone());
        } else {
            attrs.insert(key.clone(), value.clone());
        }
    }

    (props, attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::{BTreeMap, BTreeSet};

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_declared_and_undeclared_split() {
        let schema = map(json!({ "msg": true }));
        let incoming = map(json!({ "msg": "hi", "extra": 1 }));

        let (props, attrs) = resolve_props(&schema, Some(&incoming));

        assert_eq!(Value::Object(props), json!({ "msg": "hi" }));
        assert_eq!(Value::Object(attrs), json!({ "extra": 1 }));
    }

    #[test]
    fn test_missing_incoming_is_empty() {
        let schema = map(json!({ "msg": true }));
        let (props, attrs) = resolve_props(&schema, None);
        assert!(props.is_empty());
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_empty_schema_routes_everything_to_attrs() {
        let incoming = map(json!({ "class": "btn", "id": "go" }));
        let (props, attrs) = resolve_props(&PropsSchema::new(), Some(&incoming));
        assert!(props.is_empty());
        assert_eq!(attrs.keys().collect::<Vec<_>>(), vec!["class", "id"]);
    }

    #[test]
    fn test_declared_but_absent_prop_is_not_invented() {
        let schema = map(json!({ "msg": true, "size": { "default": 3 } }));
        let incoming = map(json!({ "size": 5 }));

        let (props, attrs) = resolve_props(&schema, Some(&incoming));
        assert_eq!(Value::Object(props), json!({ "size": 5 }));
        assert!(attrs.is_empty());
    }

    proptest! {
        #[test]
        fn prop_partition_is_disjoint_and_complete(
            declared in proptest::collection::btree_set("[a-f]{1,2}", 0..8),
            incoming in proptest::collection::btree_map("[a-f]{1,2}", any::<i64>(), 0..10),
        ) {
            let schema: PropsSchema =
                declared.iter().map(|k| (k.clone(), Value::Bool(true))).collect();
            let incoming: Map<String, Value> =
                incoming.into_iter().map(|(k, v)| (k, Value::from(v))).collect();

            let (props, attrs) = resolve_props(&schema, Some(&incoming));

            let prop_keys: BTreeSet<&String> = props.keys().collect();
            let attr_keys: BTreeSet<&String> = attrs.keys().collect();
            let incoming_keys: BTreeSet<&String> = incoming.keys().collect();

            prop_assert!(prop_keys.is_disjoint(&attr_keys));
            prop_assert_eq!(
                prop_keys.union(&attr_keys).cloned().collect::<BTreeSet<_>>(),
                incoming_keys
            );
            prop_assert!(prop_keys.iter().all(|k| declared.contains(*k)));

            // Values travel unchanged
            let merged: BTreeMap<&String, &Value> = props.iter().chain(attrs.iter()).collect();
            for (key, value) in &incoming {
                prop_assert_eq!(merged.get(key), Some(&value));
            }
        }
    }
}
