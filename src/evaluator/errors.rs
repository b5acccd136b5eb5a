//! Schema evaluator error types
//!
//! Error codes:
//! - PQL_SYNTAX_ERROR: malformed expression text
//! - PQL_RUNTIME_ERROR: a well-formed expression failed while evaluating
//! - PQL_STRUCTURE_ERROR: malformed schema node
//! - PQL_NOT_FOUND / PQL_PARSE_ERROR / PQL_SHAPE_ERROR: entity or helper resource failures
//!
//! Every error carries the slash-separated path of the failing key. Each
//! enclosing field prefixes its name on the way out.

use std::fmt;

use crate::expr::ExprError;
use crate::store::StoreError;

/// Schema evaluator error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorCode {
    PqlSyntaxError,
    PqlRuntimeError,
    PqlStructureError,
    PqlNotFound,
    PqlParseError,
    PqlShapeError,
}

impl EvalErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            EvalErrorCode::PqlSyntaxError => "PQL_SYNTAX_ERROR",
            EvalErrorCode::PqlRuntimeError => "PQL_RUNTIME_ERROR",
            EvalErrorCode::PqlStructureError => "PQL_STRUCTURE_ERROR",
            EvalErrorCode::PqlNotFound => "PQL_NOT_FOUND",
            EvalErrorCode::PqlParseError => "PQL_PARSE_ERROR",
            EvalErrorCode::PqlShapeError => "PQL_SHAPE_ERROR",
        }
    }

    /// Whether the failure depends only on the schema node, never on data
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EvalErrorCode::PqlSyntaxError | EvalErrorCode::PqlStructureError
        )
    }
}

impl fmt::Display for EvalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema evaluation failure
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    code: EvalErrorCode,
    path: String,
    reason: String,
}

impl EvalError {
    /// Malformed schema node at `path`
    pub fn structure(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: EvalErrorCode::PqlStructureError,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Expression failure at `path`
    pub fn expression(path: impl Into<String>, err: ExprError) -> Self {
        let code = if err.is_syntax() {
            EvalErrorCode::PqlSyntaxError
        } else {
            EvalErrorCode::PqlRuntimeError
        };
        Self {
            code,
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Entity or helper failure at `path`
    pub fn store(path: impl Into<String>, err: StoreError) -> Self {
        let code = match err {
            StoreError::NotFound { .. } => EvalErrorCode::PqlNotFound,
            StoreError::Parse { .. } => EvalErrorCode::PqlParseError,
            StoreError::Shape { .. } => EvalErrorCode::PqlShapeError,
        };
        Self {
            code,
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Prefixes the name of the enclosing field onto the path.
    pub fn with_prefix(mut self, key: &str) -> Self {
        self.path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", key, self.path)
        };
        self
    }

    pub fn code(&self) -> EvalErrorCode {
        self.code
    }

    /// Slash-separated path of the failing key
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl std::error::Error for EvalError {}

/// Result type for schema evaluation
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::store::ResourceKind;

    #[test]
    fn test_display_is_path_and_reason() {
        let err = EvalError::structure("__only__", "__only__ and __except__ are exclusive");
        assert_eq!(
            err.to_string(),
            "__only__: __only__ and __except__ are exclusive"
        );
    }

    #[test]
    fn test_prefix_accumulates() {
        let err = EvalError::structure("__item__", "bad")
            .with_prefix("pa")
            .with_prefix("all");
        assert_eq!(err.path(), "all/pa/__item__");
    }

    #[test]
    fn test_prefix_on_empty_path() {
        let err = EvalError::structure("", "bad").with_prefix("children");
        assert_eq!(err.path(), "children");
    }

    #[test]
    fn test_expression_codes() {
        let syntax = Expression::compile("it[").unwrap_err();
        assert_eq!(
            EvalError::expression("x", syntax).code(),
            EvalErrorCode::PqlSyntaxError
        );

        let runtime = Expression::compile("1/0")
            .unwrap()
            .evaluate(&serde_json::Map::new())
            .unwrap_err();
        let err = EvalError::expression("x", runtime);
        assert_eq!(err.code(), EvalErrorCode::PqlRuntimeError);
        assert!(err.reason().starts_with("runtime error: (ZeroDivisionError)"));
    }

    #[test]
    fn test_store_codes() {
        let err = EvalError::store("__from__", StoreError::not_found(ResourceKind::Entity, "X"));
        assert_eq!(err.code().code(), "PQL_NOT_FOUND");
        assert_eq!(err.to_string(), "__from__: entity not found (X)");
        assert!(!err.code().is_structural());
    }
}
