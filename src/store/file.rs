//! Flat-file store
//!
//! Resources live under the data directory:
//! - `<data_dir>/entity/<Name>.json`
//! - `<data_dir>/helper/<name>.json`
//!
//! Files are read on every lookup so edits made while a session is running
//! are visible to the next request.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use super::errors::{ResourceKind, StoreError, StoreResult};
use super::{entity_from_text, helper_from_text, is_resource_name, SourceStore};

/// Store reading entities and helpers from JSON files.
#[derive(Debug, Clone)]
pub struct FileStore {
    entity_dir: PathBuf,
    helper_dir: PathBuf,
}

impl FileStore {
    /// Creates a store over the default layout of `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_dirs(data_dir.join("entity"), data_dir.join("helper"))
    }

    /// Creates a store with explicit entity and helper directories.
    pub fn with_dirs(entity_dir: impl Into<PathBuf>, helper_dir: impl Into<PathBuf>) -> Self {
        Self {
            entity_dir: entity_dir.into(),
            helper_dir: helper_dir.into(),
        }
    }

    pub fn entity_dir(&self) -> &Path {
        &self.entity_dir
    }

    pub fn helper_dir(&self) -> &Path {
        &self.helper_dir
    }

    fn resource_path(&self, kind: ResourceKind, name: &str) -> PathBuf {
        let dir = match kind {
            ResourceKind::Entity => &self.entity_dir,
            ResourceKind::Helper => &self.helper_dir,
        };
        dir.join(format!("{}.json", name))
    }

    /// Reads the raw text of a resource.
    ///
    /// Names outside `\w+` never reach the filesystem.
    fn read_resource(&self, kind: ResourceKind, name: &str) -> StoreResult<String> {
        if !is_resource_name(name) {
            return Err(StoreError::not_found(kind, name));
        }

        let path = self.resource_path(kind, name);
        debug!(kind = kind.as_str(), path = %path.display(), "reading resource");

        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::not_found(kind, name),
            _ => StoreError::parse(kind, name, format!("failed to read file: {}", e)),
        })
    }
}

impl SourceStore for FileStore {
    fn query_entity(&self, name: &str) -> StoreResult<Vec<Map<String, Value>>> {
        let text = self.read_resource(ResourceKind::Entity, name)?;
        entity_from_text(name, &text)
    }

    fn helper_node(&self, name: &str) -> StoreResult<Map<String, Value>> {
        let text = self.read_resource(ResourceKind::Helper, name)?;
        helper_from_text(name, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_query_entity_preserves_order() {
        let (_dir, store) = store_with(&[(
            "entity/Person.json",
            r#"[{"id": 2, "name": "b"}, {"id": 1, "name": "a"}]"#,
        )]);

        let rows = store.query_entity("Person").unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(2), json!(1)]);
    }

    #[test]
    fn test_missing_entity() {
        let (_dir, store) = store_with(&[]);
        assert_eq!(
            store.query_entity("Nobody").unwrap_err(),
            StoreError::not_found(ResourceKind::Entity, "Nobody")
        );
    }

    #[test]
    fn test_path_like_name_is_not_found() {
        let (_dir, store) = store_with(&[("secret.json", "[]")]);
        assert_eq!(
            store.query_entity("../secret").unwrap_err().code(),
            "PQL_NOT_FOUND"
        );
    }

    #[test]
    fn test_invalid_json() {
        let (_dir, store) = store_with(&[("entity/Broken.json", "[{\"id\": ")]);
        assert_eq!(store.query_entity("Broken").unwrap_err().code(), "PQL_PARSE_ERROR");
    }

    #[test]
    fn test_entity_wrong_shape() {
        let (_dir, store) = store_with(&[("entity/Obj.json", r#"{"id": 1}"#)]);
        assert_eq!(store.query_entity("Obj").unwrap_err().code(), "PQL_SHAPE_ERROR");
    }

    #[test]
    fn test_helper_node() {
        let (_dir, store) = store_with(&[("helper/page.json", r#"{"start": "0"}"#)]);
        assert_eq!(
            Value::Object(store.helper_node("page").unwrap()),
            json!({"start": "0"})
        );
        assert_eq!(store.helper_node("nope").unwrap_err().code(), "PQL_NOT_FOUND");
    }

    #[test]
    fn test_custom_dirs() {
        let (dir, _) = store_with(&[("rows/Item.json", "[{}]")]);
        let store = FileStore::with_dirs(dir.path().join("rows"), dir.path().join("tpl"));
        assert_eq!(store.query_entity("Item").unwrap().len(), 1);
    }
}
