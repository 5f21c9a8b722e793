//! Primary-with-fallback storage facade.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{trace, warn};
use uuid::Uuid;

use mangavault_types::{
    ChapterRecord, ChapterUpdate, ContentRating, MangaRecord, MangaStats, MangaUpdate, NewChapter,
    NewManga, NewUser, User,
};

use crate::backends::MemoryStorage;
use crate::error::Result;
use crate::traits::MangaStore;

/// Which tier actually served a facade operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served<T> {
    Primary(T),
    Fallback(T),
}

impl<T> Served<T> {
    pub fn into_inner(self) -> T {
        match self {
            Served::Primary(value) | Served::Fallback(value) => value,
        }
    }

    pub fn tier(&self) -> &'static str {
        match self {
            Served::Primary(_) => "primary",
            Served::Fallback(_) => "fallback",
        }
    }
}

/// Storage facade: every operation is attempted against the primary store
/// first, and any primary failure causes a transparent retry of the
/// identical operation against the fallback store, whose result
/// (including "not found") becomes the call's result.
///
/// There is no third retry and no reconciliation between the tiers: the
/// fallback is a best-effort continuation during an outage, not a
/// replica. A primary failure is invisible to callers unless the
/// fallback fails too, in which case that error propagates.
pub struct FailoverStorage {
    primary: Option<Arc<dyn MangaStore>>,
    fallback: Arc<dyn MangaStore>,
}

impl FailoverStorage {
    pub fn new(primary: Option<Arc<dyn MangaStore>>, fallback: Arc<dyn MangaStore>) -> Self {
        Self { primary, fallback }
    }

    /// Facade over an optional primary with a fresh in-process fallback,
    /// the production wiring.
    pub fn with_memory_fallback(primary: Option<Arc<dyn MangaStore>>) -> Self {
        Self::new(primary, Arc::new(MemoryStorage::new()))
    }

    /// The failover combinator every facade operation goes through.
    ///
    /// Both futures are lazy; the fallback one is dropped unpolled when
    /// the primary answers. The returned tag records which tier served
    /// the call.
    async fn failover<T, P, F>(
        &self,
        op: &'static str,
        primary: Option<P>,
        fallback: F,
    ) -> Result<Served<T>>
    where
        P: Future<Output = Result<T>> + Send,
        F: Future<Output = Result<T>> + Send,
    {
        if let Some(primary_call) = primary {
            match primary_call.await {
                Ok(value) => {
                    trace!(op, tier = "primary", "storage call served");
                    return Ok(Served::Primary(value));
                }
                Err(error) => {
                    warn!(op, %error, "primary store failed; retrying on fallback");
                }
            }
        }
        let value = fallback.await?;
        trace!(op, tier = "fallback", "storage call served");
        Ok(Served::Fallback(value))
    }
}

#[async_trait]
impl MangaStore for FailoverStorage {
    async fn create_manga(&self, manga: &NewManga) -> Result<MangaRecord> {
        self.failover(
            "create_manga",
            self.primary.as_ref().map(|p| p.create_manga(manga)),
            self.fallback.create_manga(manga),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_manga(&self, id: &str) -> Result<Option<MangaRecord>> {
        self.failover(
            "get_manga",
            self.primary.as_ref().map(|p| p.get_manga(id)),
            self.fallback.get_manga(id),
        )
        .await
        .map(Served::into_inner)
    }

    async fn update_manga(&self, id: &str, updates: &MangaUpdate) -> Result<Option<MangaRecord>> {
        self.failover(
            "update_manga",
            self.primary.as_ref().map(|p| p.update_manga(id, updates)),
            self.fallback.update_manga(id, updates),
        )
        .await
        .map(Served::into_inner)
    }

    async fn search_manga(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>> {
        self.failover(
            "search_manga",
            self.primary
                .as_ref()
                .map(|p| p.search_manga(query, limit, offset)),
            self.fallback.search_manga(query, limit, offset),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_manga_by_content_rating(
        &self,
        ratings: &[ContentRating],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>> {
        self.failover(
            "get_manga_by_content_rating",
            self.primary
                .as_ref()
                .map(|p| p.get_manga_by_content_rating(ratings, limit, offset)),
            self.fallback
                .get_manga_by_content_rating(ratings, limit, offset),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_popular_manga(&self, limit: u32) -> Result<Vec<MangaRecord>> {
        self.failover(
            "get_popular_manga",
            self.primary.as_ref().map(|p| p.get_popular_manga(limit)),
            self.fallback.get_popular_manga(limit),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_recently_updated_manga(&self, limit: u32) -> Result<Vec<MangaRecord>> {
        self.failover(
            "get_recently_updated_manga",
            self.primary
                .as_ref()
                .map(|p| p.get_recently_updated_manga(limit)),
            self.fallback.get_recently_updated_manga(limit),
        )
        .await
        .map(Served::into_inner)
    }

    async fn create_chapter(&self, chapter: &NewChapter) -> Result<ChapterRecord> {
        self.failover(
            "create_chapter",
            self.primary.as_ref().map(|p| p.create_chapter(chapter)),
            self.fallback.create_chapter(chapter),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_chapter(&self, id: &str) -> Result<Option<ChapterRecord>> {
        self.failover(
            "get_chapter",
            self.primary.as_ref().map(|p| p.get_chapter(id)),
            self.fallback.get_chapter(id),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_chapters_by_manga(&self, manga_id: &str) -> Result<Vec<ChapterRecord>> {
        self.failover(
            "get_chapters_by_manga",
            self.primary
                .as_ref()
                .map(|p| p.get_chapters_by_manga(manga_id)),
            self.fallback.get_chapters_by_manga(manga_id),
        )
        .await
        .map(Served::into_inner)
    }

    async fn update_chapter(
        &self,
        id: &str,
        updates: &ChapterUpdate,
    ) -> Result<Option<ChapterRecord>> {
        self.failover(
            "update_chapter",
            self.primary.as_ref().map(|p| p.update_chapter(id, updates)),
            self.fallback.update_chapter(id, updates),
        )
        .await
        .map(Served::into_inner)
    }

    async fn upsert_stats(&self, stats: &MangaStats) -> Result<MangaStats> {
        self.failover(
            "upsert_stats",
            self.primary.as_ref().map(|p| p.upsert_stats(stats)),
            self.fallback.upsert_stats(stats),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_stats(&self, manga_id: &str) -> Result<Option<MangaStats>> {
        self.failover(
            "get_stats",
            self.primary.as_ref().map(|p| p.get_stats(manga_id)),
            self.fallback.get_stats(manga_id),
        )
        .await
        .map(Served::into_inner)
    }

    async fn increment_views(&self, manga_id: &str) -> Result<()> {
        self.failover(
            "increment_views",
            self.primary.as_ref().map(|p| p.increment_views(manga_id)),
            self.fallback.increment_views(manga_id),
        )
        .await
        .map(Served::into_inner)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.failover(
            "create_user",
            self.primary.as_ref().map(|p| p.create_user(user)),
            self.fallback.create_user(user),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.failover(
            "get_user",
            self.primary.as_ref().map(|p| p.get_user(id)),
            self.fallback.get_user(id),
        )
        .await
        .map(Served::into_inner)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.failover(
            "get_user_by_username",
            self.primary.as_ref().map(|p| p.get_user_by_username(username)),
            self.fallback.get_user_by_username(username),
        )
        .await
        .map(Served::into_inner)
    }
}
