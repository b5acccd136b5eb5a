//! Parameter coercion for query, path and header values.

use serde_json::{Map, Number, Value};

/// Converts a raw parameter string to an integer, else a finite float,
/// else leaves it as a string.
pub fn coerce_param(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(num) = Number::from_f64(f) {
            return Value::Number(num);
        }
    }
    Value::String(raw.to_string())
}

/// Coerces every string value of a parameter namespace.
///
/// Non-string values (already typed by the caller) are kept.
pub fn coerce_namespace(params: Map<String, Value>) -> Map<String, Value> {
    params
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(raw) => (name, coerce_param(&raw)),
            other => (name, other),
        })
        .collect()
}

/// Header names compare case-insensitively; store them lower-cased.
pub fn lowercase_names(headers: Map<String, Value>) -> Map<String, Value> {
    headers
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_param() {
        assert_eq!(coerce_param("10"), json!(10));
        assert_eq!(coerce_param("-3"), json!(-3));
        assert_eq!(coerce_param("2.5"), json!(2.5));
        assert_eq!(coerce_param("abc"), json!("abc"));
        assert_eq!(coerce_param(""), json!(""));
        assert_eq!(coerce_param("inf"), json!("inf"));
        assert_eq!(coerce_param("NaN"), json!("NaN"));
    }

    #[test]
    fn test_coerce_namespace_keeps_typed_values() {
        let params = json!({"page": "1", "tags": ["a"], "q": "x"});
        let Value::Object(map) = params else { unreachable!() };
        assert_eq!(
            Value::Object(coerce_namespace(map)),
            json!({"page": 1, "tags": ["a"], "q": "x"})
        );
    }

    #[test]
    fn test_lowercase_names() {
        let Value::Object(map) = json!({"X-Token": "t"}) else { unreachable!() };
        assert_eq!(Value::Object(lowercase_names(map)), json!({"x-token": "t"}));
    }
}
