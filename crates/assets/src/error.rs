//! Error types for object-store access.

use thiserror::Error;

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("invalid object store configuration: {0}")]
    Configuration(String),

    #[error("failed to upload object '{key}'")]
    Upload {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to stat object '{key}'")]
    Stat {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to presign read url for object '{key}'")]
    Presign {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, AssetStoreError>;
