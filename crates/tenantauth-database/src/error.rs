//! Mapping from sqlx failures to application errors.

use tenantauth_core::error::{AppError, ErrorKind};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE class 23: integrity constraint violations.
const CONSTRAINT_CLASS: &str = "23";

/// Check if an error is a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

/// Check if an error is a foreign key violation.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Classify a SQLSTATE code reported by the server.
///
/// Constraint violations are caller errors and never retryable; any other
/// server-side failure is `Unavailable`.
pub fn kind_for_sqlstate(code: &str) -> ErrorKind {
    match code {
        UNIQUE_VIOLATION => ErrorKind::Conflict,
        FOREIGN_KEY_VIOLATION => ErrorKind::NotFound,
        c if c.starts_with(CONSTRAINT_CLASS) => ErrorKind::Validation,
        _ => ErrorKind::Unavailable,
    }
}

/// Convert a sqlx error raised while performing `operation`.
///
/// Constraint violations map by SQLSTATE (see [`kind_for_sqlstate`]), a
/// missing row is `NotFound`, row decoding problems are `Internal`, and
/// connection or transport failures are retryable `Unavailable`.
pub fn map_sqlx_error(operation: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::Database(_) => match sqlstate(&err) {
            Some(code) => kind_for_sqlstate(&code),
            None => ErrorKind::Unavailable,
        },
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => ErrorKind::Internal,
        _ => ErrorKind::Unavailable,
    };
    let message = match kind {
        ErrorKind::Conflict => format!("Unique constraint violated in {operation}"),
        ErrorKind::NotFound => format!("Referenced record not found in {operation}"),
        ErrorKind::Validation => format!("Constraint violated in {operation}: {err}"),
        _ => format!("Database error in {operation}: {err}"),
    };
    AppError::with_source(kind, message, err)
}
