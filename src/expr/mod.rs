//! Expression Evaluator
//!
//! Compiles a small, restricted expression language into a reusable
//! [`Expression`] and evaluates it against a variable [`Scope`].
//!
//! # Language
//!
//! - Literals: integers, floats, quoted strings, `True/False/None`
//!   (also `true/false/null`), `[...]` lists and `{'k': v}` dicts
//! - Identifiers resolve only against the scope
//! - Boolean `and/or/not`, comparisons, `in`, `is`, arithmetic,
//!   `x if c else y`
//! - Subscripts `x[i]`, slices `x[a:b:c]`, member access `x.name`
//! - Calls to a fixed builtin set (`len`, `str`, `int`, ...)
//!
//! There is no way to reach anything outside the scope: no attribute
//! traversal into host objects, no imports, no user-defined callees.

mod ast;
mod builtins;
mod errors;
mod eval;
mod lexer;
mod ops;
mod parser;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

pub use ast::{BinaryOp, Builtin, CompareOp, Expr, UnaryOp};
pub use errors::{ExprError, ExprResult, RuntimeCategory};
pub use ops::{compare, py_eq, resolve_index, slice_positions, truthy, type_name};

use eval::Evaluator;
use parser::Parser;

/// Variable lookup used during evaluation.
pub trait Scope {
    /// Returns the value bound to `name`, if any
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl Scope for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Scope for Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// A compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parses `source` into an expression.
    pub fn compile(source: &str) -> ExprResult<Self> {
        let ast = Parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    /// Returns the original text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the syntax tree
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluates the expression once against `scope`.
    pub fn evaluate<S: Scope + ?Sized>(&self, scope: &S) -> ExprResult<Value> {
        Evaluator::new(scope).eval(&self.ast).map(|v| v.into_owned())
    }

    /// Evaluates and reduces the result to its truth value.
    pub fn test<S: Scope + ?Sized>(&self, scope: &S) -> ExprResult<bool> {
        Evaluator::new(scope).eval(&self.ast).map(|v| truthy(&v))
    }
}

/// Compiled expressions memoised by source text.
///
/// Owned by one evaluator session; nothing is shared process-wide.
#[derive(Debug, Default)]
pub struct ExpressionCache {
    compiled: HashMap<String, Arc<Expression>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled form of `source`, compiling it on first use.
    pub fn get_or_compile(&mut self, source: &str) -> ExprResult<Arc<Expression>> {
        if let Some(expr) = self.compiled.get(source) {
            return Ok(Arc::clone(expr));
        }
        let expr = Arc::new(Expression::compile(source)?);
        self.compiled.insert(source.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    /// Number of distinct expressions compiled so far
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_evaluate_against_scope() {
        let vars = scope(json!({"page": 2, "limit": 10}));
        let expr = Expression::compile("(page-1)*limit").unwrap();
        assert_eq!(expr.evaluate(&vars).unwrap(), json!(10));
    }

    #[test]
    fn test_unbound_name_is_runtime_error() {
        let expr = Expression::compile("missing + 1").unwrap();
        let err = expr.evaluate(&Map::new()).unwrap_err();
        assert_eq!(err.category(), Some(RuntimeCategory::NameError));
    }

    #[test]
    fn test_cache_compiles_once() {
        let mut cache = ExpressionCache::new();
        let a = cache.get_or_compile("it['id']").unwrap();
        let b = cache.get_or_compile("it['id']").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let mut cache = ExpressionCache::new();
        assert!(cache.get_or_compile("it[").is_err());
        assert!(cache.is_empty());
    }
}
