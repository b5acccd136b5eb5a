//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use pqlmock::store::FileStore;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Five people; Cid and Eve are Ann's children, Dee is Bob's.
pub fn people() -> Value {
    json!([
        {"id": 1, "name": "Ann", "parent": null, "birthday": "1970-01-01"},
        {"id": 2, "name": "Bob", "parent": null, "birthday": "1965-05-05"},
        {"id": 3, "name": "Cid", "parent": 1, "birthday": "1995-03-03"},
        {"id": 4, "name": "Dee", "parent": 2, "birthday": "1990-01-01"},
        {"id": 5, "name": "Eve", "parent": 1, "birthday": "1993-02-02"}
    ])
}

/// Pagination template; callers override `all`.
pub fn page_helper() -> Value {
    json!({
        "all": "[]",
        "start": "(page-1)*limit",
        "total": "len(it['all'])",
        "list": "it['all'][it['start']:][:limit]",
        "__except__": ["all"],
        "__item__": [0]
    })
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Data directory with the `Person` entity and the `page` helper.
pub fn data_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_json(&tmp.path().join("entity/Person.json"), &people());
    write_json(&tmp.path().join("helper/page.json"), &page_helper());
    tmp
}

pub fn file_store() -> (TempDir, FileStore) {
    let tmp = data_dir();
    let store = FileStore::new(tmp.path());
    (tmp, store)
}
