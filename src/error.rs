// Error taxonomy for the task store

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors returned by [`crate::TaskStore`] and the connection helpers.
///
/// Database errors are classified once, in `From<rusqlite::Error>`, so every
/// `?` in the store lands in the right variant.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A label name did not resolve, or a delete touched zero rows.
    #[error("not found: {0}")]
    NotFound(String),

    /// The database rejected a statement (foreign key, NOT NULL, UNIQUE).
    #[error("constraint violation: {0}")]
    Constraint(#[source] rusqlite::Error),

    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The underlying database file could not be reached or locked.
    #[error("connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    /// Any other database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }

    /// Pool checkout failures and connection-level SQLite failures.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Pool(_) | StoreError::Connection(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(failure, _) => failure.code,
            _ => return StoreError::Sqlite(err),
        };

        match code {
            ErrorCode::ConstraintViolation => StoreError::Constraint(err),
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::PermissionDenied
            | ErrorCode::FileLockingProtocolFailed => StoreError::Connection(err),
            _ => StoreError::Sqlite(err),
        }
    }
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), Some("boom".to_string()))
    }

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound("label \"urgent\"".to_string());
        assert_eq!(err.to_string(), "not found: label \"urgent\"");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_constraint_classification() {
        let err: StoreError = failure(ffi::SQLITE_CONSTRAINT).into();
        assert!(err.is_constraint());
        assert!(!err.is_connectivity());
    }

    #[test]
    fn test_connectivity_classification() {
        let busy: StoreError = failure(ffi::SQLITE_BUSY).into();
        assert!(busy.is_connectivity());

        let cant_open: StoreError = failure(ffi::SQLITE_CANTOPEN).into();
        assert!(matches!(cant_open, StoreError::Connection(_)));
    }

    #[test]
    fn test_other_errors_are_generic() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert!(err.to_string().starts_with("sqlite error"));

        let err: StoreError = failure(ffi::SQLITE_ERROR).into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
