//! Database error types
//!
//! Driver errors are first narrowed into [`DatabaseError`] by PostgreSQL
//! SQLSTATE, then classified exactly once into the shared taxonomy via
//! `From<DatabaseError> for CoreError`. Repositories add entity-specific
//! messages on top of that classification.

use thiserror::Error;

use core_kernel::{CoreError, ErrorKind};

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// Query expected a row and got none
    #[error("Record not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Duplicate entry: {message}")]
    DuplicateEntry {
        message: String,
        constraint: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    /// Foreign key constraint violation
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
        constraint: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    /// Check or not-null constraint violation
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted(#[source] sqlx::Error),

    /// Any other driver failure
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),
}

impl DatabaseError {
    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound)
    }

    /// Checks if this error is a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::DuplicateEntry { .. })
    }

    /// Checks if this error is a foreign key violation
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DatabaseError::ForeignKeyViolation { .. })
    }

    /// Returns the taxonomy classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::NotFound => ErrorKind::NotFound,
            DatabaseError::DuplicateEntry { .. } => ErrorKind::Conflict,
            DatabaseError::ForeignKeyViolation { .. } | DatabaseError::ConstraintViolation { .. } => {
                ErrorKind::Unprocessable
            }
            DatabaseError::ConnectionFailed(_)
            | DatabaseError::PoolExhausted(_)
            | DatabaseError::QueryFailed(_) => ErrorKind::Internal,
        }
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// PostgreSQL error codes:
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted(sqlx::Error::PoolTimedOut),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                let message = db_err.message().to_string();
                let constraint = db_err.constraint().map(str::to_string);
                let source = sqlx::Error::Database(db_err);

                match code.as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry {
                        message,
                        constraint,
                        source,
                    },
                    Some("23503") => DatabaseError::ForeignKeyViolation {
                        message,
                        constraint,
                        source,
                    },
                    Some("23514") | Some("23502") => {
                        DatabaseError::ConstraintViolation { message, source }
                    }
                    _ => DatabaseError::QueryFailed(source),
                }
            }
            other => DatabaseError::QueryFailed(other),
        }
    }
}

impl From<DatabaseError> for CoreError {
    fn from(error: DatabaseError) -> Self {
        CoreError::new(error.kind(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_not_found() {
        let error = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
        assert_eq!(CoreError::from(error).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_pool_timeout_is_internal() {
        let error = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, DatabaseError::PoolExhausted(_)));
        assert_eq!(error.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_other_driver_errors_are_internal() {
        let error = DatabaseError::from(sqlx::Error::PoolClosed);
        assert_eq!(CoreError::from(error).kind(), ErrorKind::Internal);
    }
}
