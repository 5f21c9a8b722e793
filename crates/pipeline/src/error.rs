//! Error types for the resolution pipeline.

use thiserror::Error;

use mangavault_assets::AssetStoreError;
use mangavault_catalog::CatalogError;
use mangavault_storage::StorageError;

/// Errors surfaced by the resolution pipeline.
///
/// Only the not-found variants are expected in normal operation; the
/// remaining variants mean both the local tiers and the remote catalog
/// failed to produce an answer.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("manga not found")]
    MangaNotFound,

    #[error("chapter not found")]
    ChapterNotFound,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Assets(#[from] AssetStoreError),
}

impl PipelineError {
    /// Whether this error carries 404 semantics for the caller.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PipelineError::MangaNotFound | PipelineError::ChapterNotFound
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
