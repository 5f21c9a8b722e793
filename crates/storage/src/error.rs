//! Error types for the storage tiers.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("database query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("user '{0}' already exists")]
    UserAlreadyExists(String),
}

impl From<bb8::RunError<tokio_postgres::Error>> for StorageError {
    fn from(err: bb8::RunError<tokio_postgres::Error>) -> Self {
        StorageError::Pool(err.to_string())
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
