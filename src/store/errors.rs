//! Store error types
//!
//! Error codes:
//! - PQL_NOT_FOUND: entity or helper resource is absent
//! - PQL_PARSE_ERROR: resource content is not valid JSON
//! - PQL_SHAPE_ERROR: resource JSON has the wrong shape

use thiserror::Error;

/// Kind of named resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Entity,
    Helper,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Entity => "entity",
            ResourceKind::Helper => "helper",
        }
    }

    /// Shape the resource must have
    fn expected_shape(&self) -> &'static str {
        match self {
            ResourceKind::Entity => "a list of objects",
            ResourceKind::Helper => "an object",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure to load an entity or helper
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{kind} not found ({name})")]
    NotFound { kind: ResourceKind, name: String },

    #[error("{kind} is not valid JSON ({name}): {reason}")]
    Parse {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("{kind} must be {} ({name})", .kind.expected_shape())]
    Shape { kind: ResourceKind, name: String },
}

impl StoreError {
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn parse(kind: ResourceKind, name: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Parse {
            kind,
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn shape(kind: ResourceKind, name: impl Into<String>) -> Self {
        StoreError::Shape {
            kind,
            name: name.into(),
        }
    }

    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "PQL_NOT_FOUND",
            StoreError::Parse { .. } => "PQL_PARSE_ERROR",
            StoreError::Shape { .. } => "PQL_SHAPE_ERROR",
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreError::not_found(ResourceKind::Entity, "Person").code(), "PQL_NOT_FOUND");
        assert_eq!(
            StoreError::parse(ResourceKind::Helper, "page", "eof").code(),
            "PQL_PARSE_ERROR"
        );
        assert_eq!(StoreError::shape(ResourceKind::Entity, "Person").code(), "PQL_SHAPE_ERROR");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::not_found(ResourceKind::Entity, "Person").to_string(),
            "entity not found (Person)"
        );
        assert_eq!(
            StoreError::shape(ResourceKind::Entity, "Person").to_string(),
            "entity must be a list of objects (Person)"
        );
        assert_eq!(
            StoreError::shape(ResourceKind::Helper, "page").to_string(),
            "helper must be an object (page)"
        );
    }
}
