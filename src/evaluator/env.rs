//! Variable environments for schema evaluation.

use serde_json::{Map, Value};

use crate::expr::Scope;

/// Name bound to the row under construction
pub const IT: &str = "it";

/// Variables visible to expressions during one schema evaluation.
///
/// Recursion into a nested node receives its own copy, so bindings made
/// while evaluating one field are never observed by its siblings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: Map<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Builder form of [`Environment::bind`].
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bind(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.vars
    }
}

impl From<Map<String, Value>> for Environment {
    fn from(vars: Map<String, Value>) -> Self {
        Self { vars }
    }
}

impl Scope for Environment {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// Scope seen by field, filter and sort expressions: `it` and the
/// node's alias resolve to the row, everything else to the environment.
pub(crate) struct RowScope<'a> {
    env: &'a Environment,
    row: &'a Value,
    alias: Option<&'a str>,
}

impl<'a> RowScope<'a> {
    pub fn new(env: &'a Environment, row: &'a Value, alias: Option<&'a str>) -> Self {
        Self { env, row, alias }
    }
}

impl Scope for RowScope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        if name == IT || self.alias == Some(name) {
            Some(self.row)
        } else {
            self.env.get(name)
        }
    }
}

/// Scope without the current row: only `it` is hidden.
pub(crate) struct DetachedScope<'a> {
    env: &'a Environment,
}

impl<'a> DetachedScope<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }
}

impl Scope for DetachedScope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        if name == IT {
            None
        } else {
            self.env.get(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_scope_shadows_environment() {
        let env = Environment::new()
            .with("it", json!({"id": 0}))
            .with("page", json!(2));
        let row = json!({"id": 7});
        let scope = RowScope::new(&env, &row, Some("pa"));

        assert_eq!(scope.lookup("it"), Some(&row));
        assert_eq!(scope.lookup("pa"), Some(&row));
        assert_eq!(scope.lookup("page"), Some(&json!(2)));
        assert_eq!(scope.lookup("missing"), None);
    }

    #[test]
    fn test_detached_scope_hides_only_it() {
        let env = Environment::new()
            .with("it", json!({}))
            .with("pa", json!({"id": 1}))
            .with("desc", json!(true));
        let scope = DetachedScope::new(&env);

        assert_eq!(scope.lookup("it"), None);
        assert_eq!(scope.lookup("pa"), Some(&json!({"id": 1})));
        assert_eq!(scope.lookup("desc"), Some(&json!(true)));
    }

    #[test]
    fn test_clone_is_isolated() {
        let parent = Environment::new().with("x", json!(1));
        let mut child = parent.clone();
        child.bind("x", json!(2));
        assert_eq!(parent.get("x"), Some(&json!(1)));
    }
}
