//! Error types for the ledgersync-db crate.

use thiserror::Error;

/// Mirror store errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A natural-key (remote id) uniqueness violation.
    ///
    /// Raised when a write would leave two local rows sharing one remote id.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record failed validation before reaching the backend.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl DbError {
    /// Check if this error is a natural-key conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }

    /// Check if this error indicates a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        // Unique violations on the remote_id indexes surface as conflicts so
        // callers can treat both backends the same way.
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DbError::Conflict(db_err.message().to_string());
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return DbError::NotFound("row not found".to_string());
        }
        DbError::QueryFailed(err)
    }
}

/// Result type for store operations.
pub type DbResult<T> = Result<T, DbError>;
