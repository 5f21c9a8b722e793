//! Error types for catalog access.

use thiserror::Error;

/// Errors from the remote catalog.
///
/// A genuine 404 is not an error: lookup operations return `Ok(None)` for
/// it. Everything here represents a transport failure or an unexpected
/// remote response and must propagate to the caller.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("catalog responded with status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid catalog base url: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
