//! Expression error types
//!
//! Error codes:
//! - PQL_SYNTAX_ERROR: the expression text does not parse
//! - PQL_RUNTIME_ERROR: a well-formed expression failed while evaluating

use std::fmt;

use thiserror::Error;

/// Category of a runtime failure, reported alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeCategory {
    /// Identifier not bound in the environment
    NameError,
    /// Operation applied to a value of the wrong type
    TypeError,
    /// Missing object key
    KeyError,
    /// Sequence index out of range
    IndexError,
    /// Right type, unusable value
    ValueError,
    /// Division or modulo by zero
    ZeroDivisionError,
    /// Missing member in `x.name`
    AttributeError,
    /// Integer result does not fit
    OverflowError,
}

impl RuntimeCategory {
    /// Returns the category name
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeCategory::NameError => "NameError",
            RuntimeCategory::TypeError => "TypeError",
            RuntimeCategory::KeyError => "KeyError",
            RuntimeCategory::IndexError => "IndexError",
            RuntimeCategory::ValueError => "ValueError",
            RuntimeCategory::ZeroDivisionError => "ZeroDivisionError",
            RuntimeCategory::AttributeError => "AttributeError",
            RuntimeCategory::OverflowError => "OverflowError",
        }
    }
}

impl fmt::Display for RuntimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure compiling or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error: {message} (at offset {offset})")]
    Syntax { message: String, offset: usize },

    #[error("runtime error: ({category}) {message}")]
    Runtime {
        category: RuntimeCategory,
        message: String,
    },
}

impl ExprError {
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        ExprError::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub fn runtime(category: RuntimeCategory, message: impl Into<String>) -> Self {
        ExprError::Runtime {
            category,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeCategory::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeCategory::ValueError, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::runtime(
            RuntimeCategory::NameError,
            format!("name '{}' is not defined", name),
        )
    }

    pub fn key_error(key: &str) -> Self {
        Self::runtime(RuntimeCategory::KeyError, format!("'{}'", key))
    }

    pub fn index_error(what: &str) -> Self {
        Self::runtime(
            RuntimeCategory::IndexError,
            format!("{} index out of range", what),
        )
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeCategory::ZeroDivisionError, message)
    }

    pub fn overflow() -> Self {
        Self::runtime(RuntimeCategory::OverflowError, "integer result out of range")
    }

    /// Returns true for parse failures
    pub fn is_syntax(&self) -> bool {
        matches!(self, ExprError::Syntax { .. })
    }

    /// Returns the runtime category, if this is a runtime failure
    pub fn category(&self) -> Option<RuntimeCategory> {
        match self {
            ExprError::Runtime { category, .. } => Some(*category),
            ExprError::Syntax { .. } => None,
        }
    }
}

/// Result type for expression operations
pub type ExprResult<T> = Result<T, ExprError>;
