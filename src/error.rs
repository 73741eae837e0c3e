//! Error types for SQL generation
//!
//! Generation is pure and deterministic, so none of these errors is worth
//! retrying. They split into two groups:
//!
//! - caller errors: the parameter value map breaks the contract of the tree
//!   (see [`SqlGenError::is_caller_error`])
//! - programming errors: the tree itself has an unsupported shape, or a
//!   type mapping is missing for an explicit cast

use thiserror::Error;

/// Errors raised while generating a relational command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlGenError {
    /// No type mapping could be found for a cast target or a runtime value
    #[error("no type mapping found for {0}")]
    UnsupportedType(String),

    /// A parameter typed as a collection was bound to null
    #[error("parameter '{0}' is typed as a collection and cannot be bound to null")]
    ExpectedNonNullParameter(String),

    /// A parameter needed to shape the SQL text has no bound value
    #[error("no value was supplied for parameter '{0}'")]
    MissingParameter(String),

    /// The expression tree violates a structural invariant
    #[error("invalid expression tree: {0}")]
    InvalidTree(String),
}

impl SqlGenError {
    pub fn unsupported_type(what: impl Into<String>) -> Self {
        Self::UnsupportedType(what.into())
    }

    pub fn expected_non_null_parameter(name: impl Into<String>) -> Self {
        Self::ExpectedNonNullParameter(name.into())
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    pub fn invalid_tree(message: impl Into<String>) -> Self {
        Self::InvalidTree(message.into())
    }

    /// True when the caller supplied an invalid parameter value map.
    ///
    /// Everything else is a bug in whatever built the expression tree.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::ExpectedNonNullParameter(_) | Self::MissingParameter(_)
        )
    }
}

/// Result alias used throughout the crate
pub type SqlGenResult<T> = Result<T, SqlGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SqlGenError::expected_non_null_parameter("ids");
        assert_eq!(
            err.to_string(),
            "parameter 'ids' is typed as a collection and cannot be bound to null"
        );

        let err = SqlGenError::invalid_tree("sub-select in FROM has no alias");
        assert_eq!(
            err.to_string(),
            "invalid expression tree: sub-select in FROM has no alias"
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(SqlGenError::expected_non_null_parameter("p").is_caller_error());
        assert!(SqlGenError::missing_parameter("p").is_caller_error());
        assert!(!SqlGenError::unsupported_type("Bytes").is_caller_error());
        assert!(!SqlGenError::invalid_tree("x").is_caller_error());
    }
}
