//! Storage-level error types and their mapping into the rates domain.

use subtally_rates::RateError;
use thiserror::Error;

/// Errors raised by the SQLite storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Database connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for RateError {
    fn from(err: StorageError) -> Self {
        RateError::Store(err.to_string())
    }
}
