//! Entity Store and Helper Store
//!
//! Named, flat-file-backed data used by schema evaluation:
//! - An *entity* is an ordered list of JSON objects (`__from__`)
//! - A *helper* is a schema node template (`__helper__`)
//!
//! Resources are read fresh on every lookup. Nothing is cached between calls,
//! so concurrent sessions always see independently loaded data.

mod errors;
mod file;
mod memory;

use serde_json::{Map, Value};

use crate::patterns;

pub use errors::{ResourceKind, StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Control key naming the helper of a schema node
pub const HELPER_KEY: &str = "__helper__";

/// Source of entities and helper templates.
pub trait SourceStore {
    /// Loads entity `name` as an ordered list of objects.
    fn query_entity(&self, name: &str) -> StoreResult<Vec<Map<String, Value>>>;

    /// Loads helper `name` as a schema node.
    fn helper_node(&self, name: &str) -> StoreResult<Map<String, Value>>;
}

/// Loads helper `name` and lays every key of `caller` except `__helper__`
/// over it. Caller keys win.
pub fn helper_schema<S: SourceStore + ?Sized>(
    store: &S,
    name: &str,
    caller: &Map<String, Value>,
) -> StoreResult<Map<String, Value>> {
    let mut merged = store.helper_node(name)?;
    for (key, value) in caller {
        if key == HELPER_KEY {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

/// Resource names are bare identifiers; anything else cannot exist.
pub fn is_resource_name(name: &str) -> bool {
    patterns::identifier().is_match(name)
}

/// Parses raw resource text into an entity.
pub(crate) fn entity_from_text(name: &str, text: &str) -> StoreResult<Vec<Map<String, Value>>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::parse(ResourceKind::Entity, name, e))?;
    entity_from_value(name, value)
}

/// Checks that `value` is a list whose every element is an object.
pub(crate) fn entity_from_value(name: &str, value: Value) -> StoreResult<Vec<Map<String, Value>>> {
    let Value::Array(items) = value else {
        return Err(StoreError::shape(ResourceKind::Entity, name));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            _ => Err(StoreError::shape(ResourceKind::Entity, name)),
        })
        .collect()
}

/// Parses raw resource text into a helper node.
pub(crate) fn helper_from_text(name: &str, text: &str) -> StoreResult<Map<String, Value>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::parse(ResourceKind::Helper, name, e))?;
    helper_from_value(name, value)
}

pub(crate) fn helper_from_value(name: &str, value: Value) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(node) => Ok(node),
        _ => Err(StoreError::shape(ResourceKind::Helper, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_names() {
        assert!(is_resource_name("Person"));
        assert!(is_resource_name("page_2"));
        assert!(!is_resource_name(""));
        assert!(!is_resource_name("../secret"));
        assert!(!is_resource_name("a/b"));
    }

    #[test]
    fn test_entity_shape() {
        assert_eq!(
            entity_from_value("E", json!([{"id": 1}, {}])).unwrap().len(),
            2
        );
        assert_eq!(
            entity_from_value("E", json!({"id": 1})).unwrap_err(),
            StoreError::shape(ResourceKind::Entity, "E")
        );
        assert_eq!(
            entity_from_value("E", json!([{"id": 1}, 2])).unwrap_err(),
            StoreError::shape(ResourceKind::Entity, "E")
        );
    }

    #[test]
    fn test_entity_parse_error() {
        let err = entity_from_text("E", "[{").unwrap_err();
        assert_eq!(err.code(), "PQL_PARSE_ERROR");
    }

    #[test]
    fn test_helper_merge_caller_wins() {
        let mut store = MemoryStore::new();
        store.insert_helper("page", json!({"start": "0", "total": "1", "__item__": [0]}));

        let caller = json!({"__helper__": "page", "total": "99", "all": "[]"});
        let merged = helper_schema(&store, "page", caller.as_object().unwrap()).unwrap();

        assert_eq!(
            Value::Object(merged),
            json!({"start": "0", "total": "99", "__item__": [0], "all": "[]"})
        );
    }

    #[test]
    fn test_helper_must_be_object() {
        let mut store = MemoryStore::new();
        store.insert_helper("bad", json!([1]));
        let err = helper_schema(&store, "bad", &Map::new()).unwrap_err();
        assert_eq!(err, StoreError::shape(ResourceKind::Helper, "bad"));
    }
}
