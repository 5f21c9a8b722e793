//! Durable object storage for page images and covers.
//!
//! Binary assets are content-addressed by deterministic keys derived from
//! the catalog ids, so every tier can locate an asset from the ids alone.
//! The [`AssetStore`] trait is the seam the resolution pipeline depends
//! on; [`S3AssetStore`] is the S3-compatible implementation.

mod error;
mod keys;
mod s3;
mod traits;

pub use error::{AssetStoreError, Result};
pub use keys::{chapter_prefix, cover_key, page_key};
pub use s3::S3AssetStore;
pub use traits::{AssetStore, DEFAULT_SIGNED_URL_TTL};
