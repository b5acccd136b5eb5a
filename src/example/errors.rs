//! Example expansion errors
//!
//! Error codes:
//! - EXAMPLE_INVALID_REPEAT: a `k[]` annotation has an unsupported value

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExampleError {
    #[error("invalid repeat at '{location}': {reason}")]
    InvalidRepeat { location: String, reason: String },
}

impl ExampleError {
    pub fn invalid_repeat(location: impl Into<String>, reason: impl Into<String>) -> Self {
        ExampleError::InvalidRepeat {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExampleError::InvalidRepeat { .. } => "EXAMPLE_INVALID_REPEAT",
        }
    }

    /// JSON pointer of the offending annotation
    pub fn location(&self) -> &str {
        match self {
            ExampleError::InvalidRepeat { location, .. } => location,
        }
    }
}

pub type ExampleResult<T> = Result<T, ExampleError>;
