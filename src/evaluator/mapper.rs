//! Field merge for phase 2.

use serde_json::{Map, Value};

use super::planner::FieldKey;

/// Merges a field's final value into the row.
///
/// Plain keys are stored verbatim. A splice merges every entry of an object
/// value under a prefixed key; `null` contributes nothing and any other value
/// is rejected with the returned reason.
pub fn merge_field(
    row: &mut Map<String, Value>,
    target: &FieldKey,
    value: Value,
) -> Result<(), String> {
    match target {
        FieldKey::Plain(key) => {
            row.insert(key.clone(), value);
            Ok(())
        }
        FieldKey::Splice(prefix) => match value {
            Value::Null => Ok(()),
            Value::Object(entries) => {
                for (sub_key, sub_value) in entries {
                    row.insert(splice_key(prefix, &sub_key), sub_value);
                }
                Ok(())
            }
            other => Err(format!(
                "spliced value must be an object or null, got {}; consider __item__",
                crate::expr::type_name(&other)
            )),
        },
    }
}

/// `prefix_` + `key` keeps the key as is; any other prefix capitalises it.
pub fn splice_key(prefix: &str, key: &str) -> String {
    if prefix.ends_with('_') {
        return format!("{}{}", prefix, key);
    }
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", prefix, first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}
