//! The object-store seam the resolution pipeline depends on.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Default lifetime of presigned read URLs.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Durable binary storage with existence checks and time-limited reads.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store a manga's cover image, returning the object key.
    async fn upload_cover(
        &self,
        manga_id: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    /// Store a single page image, returning the object key.
    async fn upload_page(
        &self,
        manga_id: &str,
        chapter_id: &str,
        page_number: i32,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Presigned, time-limited read URL for `key`.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String>;
}
