use rusqlite;
use std::io;
use thiserror::Error;

/// Terminal failures of the persistence layer. Nothing here is retried
/// internally; callers decide whether to retry, surface, or abort.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Write failed: {context} affected {affected} rows, expected exactly 1")]
    WriteFailed { context: String, affected: usize },
    #[error("Invalid field type: {0}")]
    InvalidFieldType(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
