//! In-memory store for tests and embedding.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::errors::{ResourceKind, StoreError, StoreResult};
use super::{entity_from_value, helper_from_value, SourceStore};

/// Store holding resources as raw JSON values.
///
/// Shape is checked on lookup, the same as for file-backed resources.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: HashMap<String, Value>,
    helpers: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) entity `name`.
    pub fn insert_entity(&mut self, name: impl Into<String>, value: Value) {
        self.entities.insert(name.into(), value);
    }

    /// Registers (or replaces) helper `name`.
    pub fn insert_helper(&mut self, name: impl Into<String>, value: Value) {
        self.helpers.insert(name.into(), value);
    }

    /// Builder form of [`MemoryStore::insert_entity`].
    pub fn with_entity(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert_entity(name, value);
        self
    }

    /// Builder form of [`MemoryStore::insert_helper`].
    pub fn with_helper(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert_helper(name, value);
        self
    }
}

impl SourceStore for MemoryStore {
    fn query_entity(&self, name: &str) -> StoreResult<Vec<Map<String, Value>>> {
        let value = self
            .entities
            .get(name)
            .ok_or_else(|| StoreError::not_found(ResourceKind::Entity, name))?;
        entity_from_value(name, value.clone())
    }

    fn helper_node(&self, name: &str) -> StoreResult<Map<String, Value>> {
        let value = self
            .helpers
            .get(name)
            .ok_or_else(|| StoreError::not_found(ResourceKind::Helper, name))?;
        helper_from_value(name, value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_returns_fresh_copy() {
        let store = MemoryStore::new().with_entity("Person", json!([{"id": 1}]));

        let mut first = store.query_entity("Person").unwrap();
        first[0].insert("id".to_string(), json!(99));

        let second = store.query_entity("Person").unwrap();
        assert_eq!(second[0]["id"], json!(1));
    }

    #[test]
    fn test_missing_resources() {
        let store = MemoryStore::new();
        assert_eq!(store.query_entity("X").unwrap_err().code(), "PQL_NOT_FOUND");
        assert_eq!(store.helper_node("x").unwrap_err().code(), "PQL_NOT_FOUND");
    }

    #[test]
    fn test_shape_checked_on_lookup() {
        let store = MemoryStore::new()
            .with_entity("Bad", json!("rows"))
            .with_helper("bad", json!(null));
        assert_eq!(store.query_entity("Bad").unwrap_err().code(), "PQL_SHAPE_ERROR");
        assert_eq!(store.helper_node("bad").unwrap_err().code(), "PQL_SHAPE_ERROR");
    }
}
