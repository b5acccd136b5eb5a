//! Projection and rename for phase 5

use serde_json::{Map, Value};

use super::planner::{Projection, Selection};

/// Applies inclusion or exclusion, then renames, then drops null values
/// and empty keys.
pub fn project_row(row: Map<String, Value>, projection: &Projection) -> Map<String, Value> {
    let mut projected = Map::new();
    for (key, value) in row {
        let selected = match &projection.selection {
            Selection::All => true,
            Selection::Only(names) => names.contains(&key),
            Selection::Except(names) => !names.contains(&key),
        };
        if !selected {
            continue;
        }
        let key = projection
            .renames
            .iter()
            .rev()
            .find(|(inner, _)| *inner == key)
            .map_or(key, |(_, outer)| outer.clone());
        projected.insert(key, value);
    }
    projected.retain(|key, value| !key.is_empty() && !value.is_null());
    projected
}

/// Projects a row value; rows are always objects.
pub fn project(row: Value, projection: &Projection) -> Value {
    match row {
        Value::Object(map) => Value::Object(project_row(map, projection)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_only_keeps_exactly_named() {
        let projection = Projection {
            selection: Selection::Only(vec!["id".into(), "name".into()]),
            renames: vec![],
        };
        let out = project_row(row(json!({"id": 1, "name": "a", "age": 3})), &projection);
        assert_eq!(Value::Object(out), json!({"id": 1, "name": "a"}));
    }

    #[test]
    fn test_only_with_inline_rename() {
        let projection = Projection {
            selection: Selection::Only(vec!["id".into(), "name".into()]),
            renames: vec![("name".into(), "title".into())],
        };
        let out = project_row(row(json!({"id": 1, "name": "a", "age": 3})), &projection);
        assert_eq!(Value::Object(out), json!({"id": 1, "title": "a"}));
    }

    #[test]
    fn test_except_then_rename() {
        let projection = Projection {
            selection: Selection::Except(vec!["a".into()]),
            renames: vec![("b".into(), "b2".into())],
        };
        let out = project_row(row(json!({"a": 1, "b": 2, "c": 3})), &projection);
        assert_eq!(Value::Object(out), json!({"b2": 2, "c": 3}));
    }

    #[test]
    fn test_nulls_and_empty_keys_dropped() {
        let out = project_row(
            row(json!({"a": null, "": 1, "b": false, "c": 0})),
            &Projection::default(),
        );
        assert_eq!(Value::Object(out), json!({"b": false, "c": 0}));
    }

    #[test]
    fn test_only_drops_nulls_of_kept_fields() {
        let projection = Projection {
            selection: Selection::Only(vec!["id".into(), "name".into()]),
            renames: vec![],
        };
        let out = project_row(row(json!({"id": 1, "name": null})), &projection);
        assert_eq!(Value::Object(out), json!({"id": 1}));
    }
}
