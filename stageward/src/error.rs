//! Error types for the stageward quality-check and promotion engine.
//!
//! This module provides a comprehensive error handling strategy using `thiserror`
//! for automatic error trait implementations. All errors in the library are
//! represented by the `StagewardError` enum.
//!
//! Check failures (`CheckStatus::Fail`) are data, not errors: they are logged
//! and the pipeline proceeds. Only infrastructure failures are surfaced here.

use thiserror::Error;

/// The main error type for the stageward library.
#[derive(Error, Debug)]
pub enum StagewardError {
    /// A backend query failed (syntax, permission, timeout, connectivity,
    /// missing table). Retryable by the caller, never by this crate.
    #[error("Execution error for statement `{statement}`: {message}")]
    Execution {
        /// The statement that was being executed
        statement: String,
        /// Detailed error message from the backend
        message: String,
    },

    /// A quality-log write failed. Must propagate: an unrecorded FAIL is a
    /// silent data-quality regression.
    #[error("Persistence error: {message}")]
    Persistence {
        /// Detailed error message
        message: String,
    },

    /// A rule or pipeline is malformed (missing range bounds, invalid
    /// identifier, empty natural key, promotion-order violation). Detected
    /// before any execution.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error for unexpected conditions, such as a check
    /// query returning no rows.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, StagewardError>`.
///
/// This is the standard `Result` type used throughout the library.
pub type Result<T> = std::result::Result<T, StagewardError>;

impl StagewardError {
    /// Creates a new execution error for the given statement.
    pub fn execution(statement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Creates a new persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns a short, stable name for the error kind, suitable for
    /// reports and structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Execution { .. } => "execution",
            Self::Persistence { .. } => "persistence",
            Self::Configuration(_) => "configuration",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_carries_statement() {
        let err = StagewardError::execution("SELECT 1", "table not found");
        assert_eq!(
            err.to_string(),
            "Execution error for statement `SELECT 1`: table not found"
        );
        assert_eq!(err.kind(), "execution");
    }

    #[test]
    fn test_persistence_error() {
        let err = StagewardError::persistence("quality log insert rejected");
        assert_eq!(
            err.to_string(),
            "Persistence error: quality log insert rejected"
        );
        assert_eq!(err.kind(), "persistence");
    }

    #[test]
    fn test_configuration_error() {
        let err = StagewardError::configuration("range check requires bounds");
        assert_eq!(
            err.to_string(),
            "Configuration error: range check requires bounds"
        );
        assert_eq!(err.kind(), "configuration");
    }
}
