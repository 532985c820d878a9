//! Error types for tablemap.
//!
//! All fallible operations return [`DbResult`]. Driver failures are carried
//! through unchanged in [`DbError::Driver`]; the remaining variants describe
//! problems detected by this layer itself.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// The model declaration is malformed. Raised at registration, never retryable.
    #[error("Schema error: {message} (model: {model})")]
    Schema { message: String, model: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Timeout: {operation} exceeded {limit:?}")]
    Timeout { operation: String, limit: Duration },

    #[error("Unexpected row count for {operation}: expected {expected}, got {actual}")]
    RowCount {
        operation: String,
        expected: u64,
        actual: u64,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Error reported by the database driver, passed through as-is.
    #[error(transparent)]
    Driver(#[from] sqlx::Error),
}

impl DbError {
    /// Create a schema-definition error for the given model.
    pub fn schema(message: impl Into<String>, model: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            model: model.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit,
        }
    }

    /// Create a row count mismatch error.
    pub fn row_count(operation: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::RowCount {
            operation: operation.into(),
            expected,
            actual,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => true,
            Self::Driver(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }

    /// True for errors raised by a malformed model declaration.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Borrow the underlying driver error, if this is one.
    pub fn as_driver(&self) -> Option<&sqlx::Error> {
        match self {
            Self::Driver(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for tablemap operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_schema_error_display() {
        let err = DbError::schema("Primary key not found", "Account");
        assert_eq!(
            err.to_string(),
            "Schema error: Primary key not found (model: Account)"
        );
        assert!(err.is_schema());
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::connection("refused", "Check that the server is running");
        assert_eq!(err.suggestion(), Some("Check that the server is running"));
        assert_eq!(DbError::invalid_input("bad").suggestion(), None);
    }

    #[test]
    fn test_error_retryable() {
        assert!(DbError::timeout("query", Duration::from_secs(30)).is_retryable());
        assert!(DbError::connection("err", "sugg").is_retryable());
        assert!(DbError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!DbError::schema("dup", "User").is_retryable());
        assert!(!DbError::invalid_input("limit").is_retryable());
    }

    #[test]
    fn test_driver_error_is_transparent() {
        let driver = sqlx::Error::RowNotFound;
        let expected = driver.to_string();
        let err = DbError::from(driver);
        assert_eq!(err.to_string(), expected);
        assert!(matches!(err.as_driver(), Some(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_timeout_display_keeps_sub_second_limits() {
        let err = DbError::timeout("write operation", Duration::from_millis(50));
        assert_eq!(err.to_string(), "Timeout: write operation exceeded 50ms");

        let err = DbError::timeout("connection acquire", Duration::from_secs(30));
        assert_eq!(err.to_string(), "Timeout: connection acquire exceeded 30s");
    }

    #[test]
    fn test_row_count_display() {
        let err = DbError::row_count("insert", 1, 0);
        assert_eq!(
            err.to_string(),
            "Unexpected row count for insert: expected 1, got 0"
        );
    }
}
