//! Repeat-annotated example expansion

use serde_json::{Map, Value};
use tracing::trace;

use super::cursor::CursorRegistry;
use super::errors::{ExampleError, ExampleResult};

/// Root key whose value replaces the whole expanded example
pub const UNWRAP_KEY: &str = "$";
/// Root key holding a post-processing chain; removed before expansion
pub const CHAIN_KEY: &str = "@";
/// Largest repeat count accepted
pub const MAX_REPEAT: u64 = 10_000;

/// Expands examples using cursors that outlive a single call.
pub struct ExampleExpander<'r> {
    cursors: &'r mut CursorRegistry,
}

impl<'r> ExampleExpander<'r> {
    pub fn new(cursors: &'r mut CursorRegistry) -> Self {
        Self { cursors }
    }

    /// Expands a stored example into a response value.
    pub fn expand(&mut self, example: &Value) -> ExampleResult<Value> {
        let expanded = match example {
            Value::Object(map) if map.contains_key(CHAIN_KEY) => {
                let stripped: Map<String, Value> = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != CHAIN_KEY)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                self.single(&Value::Object(stripped), "")?
            }
            other => self.single(other, "")?,
        };
        match expanded {
            Value::Object(mut map) if map.contains_key(UNWRAP_KEY) => {
                Ok(map.remove(UNWRAP_KEY).unwrap_or(Value::Null))
            }
            other => Ok(other),
        }
    }

    /// Expands `value` at the root as if annotated with `repeat`.
    pub fn expand_with(&mut self, value: &Value, repeat: &Value) -> ExampleResult<Value> {
        self.repeat(value, repeat, "", "[]")
    }

    fn single(&mut self, value: &Value, location: &str) -> ExampleResult<Value> {
        match value {
            Value::Array(items) => Ok(self.pick(items, location)),
            Value::Object(map) => self.object(map, location),
            other => Ok(other.clone()),
        }
    }

    fn object(&mut self, map: &Map<String, Value>, location: &str) -> ExampleResult<Value> {
        let mut expanded = Map::new();
        for (key, value) in map {
            if key.contains("[]") {
                continue;
            }
            let child = pointer(location, key);
            let repeat_key = format!("{}[]", key);
            let out = match map.get(&repeat_key) {
                Some(repeat) => self.repeat(value, repeat, &child, &pointer(location, &repeat_key))?,
                None => self.single(value, &child)?,
            };
            expanded.insert(key.clone(), out);
        }
        Ok(Value::Object(expanded))
    }

    fn repeat(
        &mut self,
        value: &Value,
        repeat: &Value,
        location: &str,
        repeat_location: &str,
    ) -> ExampleResult<Value> {
        match repeat {
            Value::Bool(false) => self.single(value, location),
            Value::Bool(true) => match value {
                Value::Array(_) => Ok(value.clone()),
                other => Ok(Value::Array(vec![other.clone()])),
            },
            Value::Null => Ok(Value::Null),
            Value::Number(n) => {
                let count = n.as_i64().ok_or_else(|| {
                    ExampleError::invalid_repeat(repeat_location, format!("{} is not an integer", n))
                })?;
                self.count(value, count, location, repeat_location)
            }
            Value::Array(counts) => {
                let Some(position) = self.cursors.advance(repeat_location, counts.len()) else {
                    return Ok(Value::Null);
                };
                trace!(location = repeat_location, position, "picked repeat count");
                match &counts[position] {
                    Value::Null => Ok(Value::Null),
                    Value::Number(n) if n.as_u64().is_some() => {
                        let count = n.as_i64().ok_or_else(|| {
                            ExampleError::invalid_repeat(repeat_location, "count too large")
                        })?;
                        self.count(value, count, location, repeat_location)
                    }
                    other => Err(ExampleError::invalid_repeat(
                        repeat_location,
                        format!("count {} must be null or a non-negative integer", other),
                    )),
                }
            }
            other => Err(ExampleError::invalid_repeat(
                repeat_location,
                format!("unsupported repeat {}", other),
            )),
        }
    }

    /// `|count|` successive expansions, reversed for a negative count.
    fn count(
        &mut self,
        value: &Value,
        count: i64,
        location: &str,
        repeat_location: &str,
    ) -> ExampleResult<Value> {
        let times = count.unsigned_abs();
        if times > MAX_REPEAT {
            return Err(ExampleError::invalid_repeat(
                repeat_location,
                format!("count {} exceeds {}", count, MAX_REPEAT),
            ));
        }

        let mut out = Vec::with_capacity(times as usize);
        for _ in 0..times {
            out.push(match value {
                Value::Array(items) => self.pick(items, location),
                other => self.single(other, location)?,
            });
        }
        if count < 0 {
            out.reverse();
        }
        Ok(Value::Array(out))
    }

    /// Next element of a list in round-robin order; `null` when empty.
    fn pick(&mut self, items: &[Value], location: &str) -> Value {
        match self.cursors.advance(location, items.len()) {
            Some(position) => items[position].clone(),
            None => Value::Null,
        }
    }
}

/// Appends `key` to a JSON pointer, escaping `~` and `/`.
fn pointer(location: &str, key: &str) -> String {
    format!("{}/{}", location, key.replace('~', "~0").replace('/', "~1"))
}
