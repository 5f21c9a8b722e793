//! The catalog seam the resolution pipeline depends on.

use async_trait::async_trait;

use crate::error::Result;
use crate::wire::{CatalogChapter, CatalogCover, CatalogManga};

/// Requested cover thumbnail size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoverSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl CoverSize {
    /// File-name suffix the catalog's upload host expects.
    pub fn suffix(self) -> &'static str {
        match self {
            CoverSize::Small => "256",
            CoverSize::Medium => "512",
            CoverSize::Large => "original",
        }
    }
}

/// Read-only access to the remote catalog.
///
/// Lookup operations distinguish a genuine remote 404 (`Ok(None)`) from
/// transport or server failures (`Err`), which callers must handle.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Search manga by title. Results arrive in remote relevance order,
    /// descending.
    async fn search_manga(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogManga>>;

    /// Fetch a single manga by id.
    async fn get_manga(&self, id: &str) -> Result<Option<CatalogManga>>;

    /// Fetch the chapter feed for a manga, ascending by chapter number,
    /// restricted to the working language.
    async fn get_chapters(&self, manga_id: &str) -> Result<Vec<CatalogChapter>>;

    /// Fetch cover-art metadata by cover id.
    async fn get_cover_art(&self, cover_id: &str) -> Result<Option<CatalogCover>>;

    /// Fetch the directly fetchable page URLs for a chapter, in page
    /// order. The URLs are session-scoped and should be consumed promptly.
    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<Vec<String>>;

    /// Build the externally hosted cover URL. Deterministic, no network.
    fn build_cover_url(&self, manga_id: &str, file_name: &str, size: CoverSize) -> String;

    /// Download raw bytes from a catalog-hosted URL (covers, pages).
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}
