//! CLI Session Tests
//!
//! Drives the JSON line protocol the way `pqlmock start` does:
//! - Render requests assemble the environment from request namespaces
//! - Example cursors persist across requests of one session
//! - Every failure becomes one error line and the session continues

mod common;

use std::io::Cursor;

use pqlmock::cli::{serve, write_default_config, Config, Session};
use pqlmock::store::FileStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn run_lines(config: &Config, lines: &[Value]) -> Vec<Value> {
    let input = lines
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    let mut out = Vec::new();
    serve(config, Cursor::new(input), &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn config_for(tmp: &TempDir) -> Config {
    Config::with_data_dir(tmp.path().to_string_lossy())
}

#[test]
fn test_render_with_coerced_query() {
    let tmp = common::data_dir();
    let request = json!({
        "schema": {
            "__from__": "Person",
            "__filter__": "it['id'] == query['id']",
            "__only__": ["name"],
            "__item__": [0]
        },
        "request": {"query": {"id": "3"}}
    });

    let responses = run_lines(&config_for(&tmp), &[request]);

    assert_eq!(responses, vec![json!({"status": "ok", "data": {"name": "Cid"}})]);
}

#[test]
fn test_render_helper_with_env_vars() {
    let tmp = common::data_dir();
    let request = json!({
        "op": "render",
        "schema": {"__helper__": "page", "all": {"__from__": "Person", "__only__": ["id"]}},
        "env": {"page": 3, "limit": 2}
    });

    let responses = run_lines(&config_for(&tmp), &[request]);

    assert_eq!(
        responses[0]["data"],
        json!({"start": 4, "total": 5, "list": [{"id": 5}]})
    );
}

#[test]
fn test_header_names_are_lowercased() {
    let tmp = common::data_dir();
    let request = json!({
        "schema": {"token": "header['x-token']", "__item__": [0]},
        "request": {"header": {"X-Token": "42"}}
    });

    let responses = run_lines(&config_for(&tmp), &[request]);

    assert_eq!(responses[0]["data"], json!({"token": 42}));
}

#[test]
fn test_example_rotation_across_requests() {
    let tmp = common::data_dir();
    let example = json!({"op": "example", "example": {"state": ["on", "off"]}});

    let responses = run_lines(&config_for(&tmp), &[example.clone(), example.clone(), example]);

    let states: Vec<&Value> = responses.iter().map(|r| &r["data"]["state"]).collect();
    assert_eq!(states, vec![&json!("on"), &json!("off"), &json!("on")]);
}

#[test]
fn test_errors_do_not_end_session() {
    let tmp = common::data_dir();
    let lines = [
        json!({"schema": {"x": "it["}}),
        json!({"op": "launch"}),
        json!({"schema": {"all": {"__from__": "Person", "y": "it['missing']"}}}),
        json!({"op": "example", "example": {"v": [1], "v[]": -0.5}}),
        json!({"schema": {"n": "len('abc')", "__item__": [0]}}),
    ];

    let responses = run_lines(&config_for(&tmp), &lines);

    assert_eq!(responses.len(), 5);
    assert_eq!(responses[0]["code"], json!("PQL_SYNTAX_ERROR"));
    assert_eq!(responses[0]["path"], json!("x"));
    assert_eq!(responses[1]["code"], json!("CLI_BAD_REQUEST"));
    assert_eq!(responses[2]["code"], json!("PQL_RUNTIME_ERROR"));
    assert_eq!(responses[2]["path"], json!("all/y"));
    assert!(responses[2]["message"]
        .as_str()
        .unwrap()
        .starts_with("all/y: runtime error: (KeyError)"));
    assert_eq!(responses[3]["code"], json!("EXAMPLE_INVALID_REPEAT"));
    assert_eq!(responses[4], json!({"status": "ok", "data": {"n": 3}}));
}

#[test]
fn test_default_config_points_next_to_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("pqlmock.json");

    assert!(write_default_config(&path).unwrap());
    let config = Config::load(&path).unwrap();

    assert_eq!(config.entity_path(), tmp.path().join("data").join("entity"));
    assert_eq!(config.helper_path(), tmp.path().join("data").join("helper"));
    assert!(config.coerce_params);
    assert!(!config.is_initialized());
}

#[test]
fn test_session_over_file_store() {
    let tmp = common::data_dir();
    let mut session = Session::new(FileStore::new(tmp.path()), false);

    let response = session.handle(json!({
        "schema": {"q": "query['id']", "__item__": [0]},
        "request": {"query": {"id": "3"}}
    }));

    assert!(response.is_ok());
    // coercion disabled keeps the raw string
    assert_eq!(response.to_json()["data"], json!({"q": "3"}));
}
