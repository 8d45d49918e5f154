//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError` from
//! `mealplanner_core::storage`. Constraint failures become `AlreadyExists`;
//! everything else is a storage failure carrying the engine message.

use mealplanner_core::storage::RepositoryError;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
pub fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Whether the error is SQLite refusing a lock held by another connection.
pub fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if matches!(
                sqlite_err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
    )
}

fn is_key_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Maps a rusqlite error raised while writing the record identified by `key`.
///
/// # Error Mapping
///
/// - `SQLITE_CONSTRAINT_UNIQUE` → `RepositoryError::AlreadyExists`
/// - `SQLITE_CONSTRAINT_PRIMARYKEY` → `RepositoryError::AlreadyExists`
/// - All other errors → `RepositoryError::Storage`
pub fn map_write_error(
    err: rusqlite::Error,
    entity_type: &'static str,
    key: &str,
) -> RepositoryError {
    if is_key_conflict(&err) {
        RepositoryError::AlreadyExists {
            entity_type,
            key: key.to_string(),
        }
    } else {
        map_rusqlite_error(err)
    }
}

pub fn map_rusqlite_error(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// This is the main entry point for error mapping in async code.
pub fn map_tokio_rusqlite_error(err: tokio_rusqlite::Error) -> RepositoryError {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => map_rusqlite_error(rusqlite_err),
        tokio_rusqlite::Error::ConnectionClosed => {
            RepositoryError::Storage("Connection closed".to_string())
        }
        tokio_rusqlite::Error::Close((_, rusqlite_err)) => {
            RepositoryError::Storage(format!("Failed to close connection: {rusqlite_err}"))
        }
        other => RepositoryError::Storage(other.to_string()),
    }
}
