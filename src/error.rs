//! # Error Handling
//!
//! Error taxonomy for store operations. Backend failures surface unchanged
//! inside [`StoreError::Database`]; unique violations are classified as
//! [`StoreError::Conflict`] so callers can branch on them without inspecting
//! driver codes.

use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// Errors returned by [`crate::repositories::IntegrationStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl StoreError {
    /// Classify a backend error, mapping unique violations to `Conflict`.
    pub fn from_db(error: DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return StoreError::Conflict(error.to_string());
        }
        StoreError::Database(error)
    }

    pub fn validation_error<S: Into<String>>(message: S) -> Self {
        StoreError::Validation(message.into())
    }
}

pub(crate) fn is_unique_violation(error: &DbErr) -> bool {
    const PG_UNIQUE: &str = "23505";
    const MYSQL_DUPLICATE_CODES: &[&str] = &["1022", "1062", "1169", "1586"];
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code_str = code.as_ref();
        return code_str == PG_UNIQUE
            || MYSQL_DUPLICATE_CODES.contains(&code_str)
            || SQLITE_DUPLICATE_CODES.contains(&code_str);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_is_not_a_conflict() {
        let error = StoreError::from_db(DbErr::RecordNotFound("integrations".to_string()));
        assert!(matches!(error, StoreError::Database(DbErr::RecordNotFound(_))));
    }

    #[test]
    fn custom_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&DbErr::Custom("boom".to_string())));
    }

    #[test]
    fn validation_message_is_rendered() {
        let error = StoreError::validation_error("integration name must not be empty");
        assert_eq!(
            error.to_string(),
            "validation failed: integration name must not be empty"
        );
    }
}
