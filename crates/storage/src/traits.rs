//! The storage contract shared by every tier.

use async_trait::async_trait;
use uuid::Uuid;

use mangavault_types::{
    ChapterRecord, ChapterUpdate, ContentRating, MangaRecord, MangaStats, MangaUpdate, NewChapter,
    NewManga, NewUser, User,
};

use crate::error::Result;

/// Structured read/write operations over manga, chapter, stats, and user
/// records.
///
/// Implemented by the primary store, the fallback store, and the failover
/// facade, so callers never care which tier actually served them.
///
/// # Write semantics
/// `create_manga` and `create_chapter` are idempotent upserts: two
/// concurrent resolutions of the same unresolved id may both persist, and
/// the second write must land as an update rather than a duplicate-key
/// failure. `increment_views` must be atomic per manga id: concurrent
/// increments may not lose updates.
#[async_trait]
pub trait MangaStore: Send + Sync {
    // === Manga operations ===

    /// Insert a manga, or overwrite its catalog-sourced fields when the id
    /// already exists. Local `created_at` is preserved across upserts.
    async fn create_manga(&self, manga: &NewManga) -> Result<MangaRecord>;

    async fn get_manga(&self, id: &str) -> Result<Option<MangaRecord>>;

    /// Apply a partial update. Returns `None` when the manga is absent.
    async fn update_manga(&self, id: &str, updates: &MangaUpdate) -> Result<Option<MangaRecord>>;

    /// Case-insensitive substring search over title, description, and
    /// tags, paginated after filtering.
    async fn search_manga(&self, query: &str, limit: u32, offset: u32)
    -> Result<Vec<MangaRecord>>;

    async fn get_manga_by_content_rating(
        &self,
        ratings: &[ContentRating],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>>;

    /// Manga ordered by view count, descending. Absent stats count as
    /// zero views; tie order is undefined.
    async fn get_popular_manga(&self, limit: u32) -> Result<Vec<MangaRecord>>;

    /// Manga ordered by catalog-reported update time, descending. Missing
    /// timestamps sort as epoch zero.
    async fn get_recently_updated_manga(&self, limit: u32) -> Result<Vec<MangaRecord>>;

    // === Chapter operations ===

    /// Insert a chapter, upserting like [`create_manga`](Self::create_manga).
    async fn create_chapter(&self, chapter: &NewChapter) -> Result<ChapterRecord>;

    async fn get_chapter(&self, id: &str) -> Result<Option<ChapterRecord>>;

    async fn get_chapters_by_manga(&self, manga_id: &str) -> Result<Vec<ChapterRecord>>;

    /// Apply a partial update. Returns `None` when the chapter is absent.
    async fn update_chapter(
        &self,
        id: &str,
        updates: &ChapterUpdate,
    ) -> Result<Option<ChapterRecord>>;

    // === Stats operations ===

    /// Create or replace the stats row for a manga.
    async fn upsert_stats(&self, stats: &MangaStats) -> Result<MangaStats>;

    async fn get_stats(&self, manga_id: &str) -> Result<Option<MangaStats>>;

    /// Atomically add one view, creating the stats row with `views = 1`
    /// when absent, and stamping `last_viewed_at`.
    async fn increment_views(&self, manga_id: &str) -> Result<()>;

    // === User operations ===

    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
}
