//! Request environment assembly
//!
//! Builds the root [`Environment`] for a schema evaluation from the four
//! request namespaces: `query`, `path`, `header` and `body`.

mod params;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::evaluator::Environment;

pub use params::{coerce_namespace, coerce_param, lowercase_names};

/// Request data as seen by a schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestData {
    pub query: Map<String, Value>,
    pub path: Map<String, Value>,
    pub header: Map<String, Value>,
    pub body: Value,
}

impl RequestData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Binds the four namespaces into a fresh environment.
    ///
    /// With `coerce`, string parameters in `query`, `path` and `header`
    /// become numbers where they parse as one.
    pub fn into_environment(self, coerce: bool) -> Environment {
        let header = lowercase_names(self.header);
        let (query, path, header) = if coerce {
            (
                coerce_namespace(self.query),
                coerce_namespace(self.path),
                coerce_namespace(header),
            )
        } else {
            (self.query, self.path, header)
        };

        Environment::new()
            .with("query", Value::Object(query))
            .with("path", Value::Object(path))
            .with("header", Value::Object(header))
            .with("body", self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_namespaces() {
        let env = RequestData::new()
            .with_query("limit", "3")
            .with_path("id", "42")
            .with_header("X-Page", "2")
            .with_body(json!({"name": "x"}))
            .into_environment(true);

        assert_eq!(env.get("query"), Some(&json!({"limit": 3})));
        assert_eq!(env.get("path"), Some(&json!({"id": 42})));
        assert_eq!(env.get("header"), Some(&json!({"x-page": 2})));
        assert_eq!(env.get("body"), Some(&json!({"name": "x"})));
    }

    #[test]
    fn test_without_coercion() {
        let env = RequestData::new().with_query("limit", "3").into_environment(false);
        assert_eq!(env.get("query"), Some(&json!({"limit": "3"})));
    }

    #[test]
    fn test_deserialize_partial() {
        let data: RequestData = serde_json::from_value(json!({"query": {"page": "1"}})).unwrap();
        assert_eq!(data.body, Value::Null);
        assert!(data.header.is_empty());
    }
}
