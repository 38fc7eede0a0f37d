//! Mapping of SQLite failures onto the common error taxonomy.

use rusqlite::ErrorCode;
use userstore_common::Error;

/// Convert a rusqlite error into the matching `userstore_common::Error`.
///
/// Constraint and file-access failures are recognised by their SQLite result
/// code. Missing tables and syntax errors share the generic `SQLITE_ERROR`
/// code, so they are told apart by message.
pub fn classify_error(err: rusqlite::Error) -> Error {
    let message = err.to_string();
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Error::constraint(message),
        Some(
            ErrorCode::CannotOpen
            | ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure,
        ) => Error::store(message),
        _ if message.contains("no such table") => Error::missing_table(message),
        _ if message.contains("syntax error") || message.contains("incomplete input") => {
            Error::syntax(message)
        }
        _ => Error::database(message),
    }
}
