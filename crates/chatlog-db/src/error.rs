use thiserror::Error;

/// Failures of the storage medium.
///
/// Expected outcomes such as a duplicate username or an unknown sender are
/// not errors; the repositories report those through their outcome enums.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store is not connected")]
    NotConnected,
    #[error("constraint violated: {0}")]
    Constraint(String),
}
