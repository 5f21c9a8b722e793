//! Request resolution over the storage facade, object store, and catalog.

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use mangavault_assets::{AssetStore, DEFAULT_SIGNED_URL_TTL, page_key};
use mangavault_catalog::{Catalog, CatalogManga, CoverSize};
use mangavault_storage::MangaStore;
use mangavault_types::{ChapterRecord, ContentRating, MangaRecord};

use crate::error::{PipelineError, Result};
use crate::normalize::{normalize_chapter, normalize_manga};

/// Content type stored for cover and page images.
const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Where a listing response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    Local,
    MangaDx,
}

/// Where a chapter's page URLs came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSource {
    S3,
    MangaDx,
}

/// A search result set and the tier that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub data: Vec<MangaRecord>,
    pub source: ListingSource,
}

/// A chapter's page URLs and the tier that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterPages {
    pub pages: Vec<String>,
    pub source: PageSource,
}

/// The resolution pipeline.
///
/// All dependencies are injected; the only state beyond them is the
/// per-id guard map used to coalesce concurrent first resolutions of the
/// same manga id.
pub struct ResolutionPipeline {
    storage: Arc<dyn MangaStore>,
    catalog: Arc<dyn Catalog>,
    assets: Arc<dyn AssetStore>,
    resolving: DashMap<String, Arc<Mutex<()>>>,
}

impl ResolutionPipeline {
    pub fn new(
        storage: Arc<dyn MangaStore>,
        catalog: Arc<dyn Catalog>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            storage,
            catalog,
            assets,
            resolving: DashMap::new(),
        }
    }

    // === Manga ===

    /// Resolve a manga by id: serve the local record when present,
    /// otherwise pull it from the catalog, warm its cover, persist, and
    /// serve. Every successful resolution counts a view.
    pub async fn get_manga(&self, id: &str) -> Result<MangaRecord> {
        if let Some(found) = self.storage.get_manga(id).await? {
            self.spawn_view_increment(&found.id);
            return Ok(found);
        }

        // Coalesce concurrent first resolutions of one id: a single
        // holder talks to the catalog while the rest re-check the local
        // store after it finishes.
        let guard = self
            .resolving
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let outcome = {
            let _held = guard.lock().await;
            match self.storage.get_manga(id).await {
                Ok(Some(found)) => Ok(found),
                Ok(None) => self.resolve_manga_from_catalog(id).await,
                Err(error) => Err(error.into()),
            }
        };
        self.resolving.remove(id);

        let record = outcome?;
        self.spawn_view_increment(&record.id);
        Ok(record)
    }

    async fn resolve_manga_from_catalog(&self, id: &str) -> Result<MangaRecord> {
        let remote = match self.catalog.get_manga(id).await {
            Ok(found) => found,
            Err(error) => {
                // An id absent locally with no catalog answer resolves as
                // not-found, not as a remote failure.
                warn!(manga_id = %id, %error, "catalog unavailable during manga resolution");
                None
            }
        };
        match remote {
            Some(manga) => Ok(self.ingest_manga(&manga).await),
            None => Err(PipelineError::MangaNotFound),
        }
    }

    /// Normalize and persist a catalog manga, warming its cover first.
    /// Persistence failure degrades to serving the unstored record.
    async fn ingest_manga(&self, manga: &CatalogManga) -> MangaRecord {
        let (cover_image_url, cover_image_key) = self.resolve_cover(manga).await;
        let new_manga = normalize_manga(manga, cover_image_url, cover_image_key);
        match self.storage.create_manga(&new_manga).await {
            Ok(record) => record,
            Err(error) => {
                warn!(manga_id = %new_manga.id, %error, "failed to persist manga; serving unstored record");
                new_manga.into_record(Utc::now())
            }
        }
    }

    /// Resolve cover metadata and copy the image into the object store.
    /// Every step is best-effort: without a durable copy the record still
    /// carries the externally hosted URL, and without metadata it simply
    /// has no cover.
    async fn resolve_cover(&self, manga: &CatalogManga) -> (Option<String>, Option<String>) {
        let Some(cover_id) = manga.cover_art_id() else {
            return (None, None);
        };
        let cover = match self.catalog.get_cover_art(cover_id).await {
            Ok(Some(cover)) => cover,
            Ok(None) => return (None, None),
            Err(error) => {
                warn!(manga_id = %manga.id, cover_id, %error, "failed to fetch cover metadata");
                return (None, None);
            }
        };
        let url =
            self.catalog
                .build_cover_url(&manga.id, &cover.attributes.file_name, CoverSize::default());

        let key = match self.catalog.fetch_bytes(&url).await {
            Ok(bytes) => match self
                .assets
                .upload_cover(&manga.id, bytes, IMAGE_CONTENT_TYPE)
                .await
            {
                Ok(key) => Some(key),
                Err(error) => {
                    warn!(manga_id = %manga.id, %error, "failed to store cover image");
                    None
                }
            },
            Err(error) => {
                warn!(manga_id = %manga.id, %error, "failed to download cover image");
                None
            }
        };
        (Some(url), key)
    }

    fn spawn_view_increment(&self, manga_id: &str) {
        let storage = Arc::clone(&self.storage);
        let manga_id = manga_id.to_string();
        // Fire-and-forget relative to the response.
        tokio::spawn(async move {
            if let Err(error) = storage.increment_views(&manga_id).await {
                warn!(%manga_id, %error, "failed to increment view count");
            }
        });
    }

    // === Search and listings ===

    /// Search manga. Local results take absolute precedence: the catalog
    /// is only consulted when the partition-filtered local set is empty,
    /// never to augment a partial one.
    pub async fn search_manga(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
        adult: bool,
    ) -> Result<SearchOutcome> {
        let local = self.storage.search_manga(query, limit, offset).await?;
        let local = filter_partition(local, adult);
        if !local.is_empty() {
            return Ok(SearchOutcome {
                data: local,
                source: ListingSource::Local,
            });
        }

        debug!(query, "no local results; searching catalog");
        let remote = self.catalog.search_manga(query, limit, offset).await?;
        let mut ingested = Vec::with_capacity(remote.len());
        for manga in &remote {
            ingested.push(self.ingest_manga(manga).await);
        }
        Ok(SearchOutcome {
            data: filter_partition(ingested, adult),
            source: ListingSource::MangaDx,
        })
    }

    pub async fn get_popular(&self, limit: u32, adult: bool) -> Result<Vec<MangaRecord>> {
        Ok(filter_partition(
            self.storage.get_popular_manga(limit).await?,
            adult,
        ))
    }

    pub async fn get_recent(&self, limit: u32, adult: bool) -> Result<Vec<MangaRecord>> {
        Ok(filter_partition(
            self.storage.get_recently_updated_manga(limit).await?,
            adult,
        ))
    }

    pub async fn get_by_rating(
        &self,
        ratings: &[ContentRating],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>> {
        Ok(self
            .storage
            .get_manga_by_content_rating(ratings, limit, offset)
            .await?)
    }

    // === Chapters ===

    /// Resolve a manga's chapter list. A non-empty local list is
    /// authoritative even if stale; only an empty one triggers a feed
    /// fetch, with per-chapter persistence that skips failures.
    pub async fn get_chapters(&self, manga_id: &str) -> Result<Vec<ChapterRecord>> {
        let local = self.storage.get_chapters_by_manga(manga_id).await?;
        if !local.is_empty() {
            return Ok(local);
        }

        let feed = self.catalog.get_chapters(manga_id).await?;
        let mut chapters = Vec::with_capacity(feed.len());
        for remote in &feed {
            let new_chapter = normalize_chapter(manga_id, remote);
            match self.storage.create_chapter(&new_chapter).await {
                Ok(record) => chapters.push(record),
                Err(error) => {
                    warn!(chapter_id = %new_chapter.id, %error, "failed to persist chapter; continuing");
                    chapters.push(new_chapter.into_record(Utc::now()));
                }
            }
        }
        Ok(chapters)
    }

    // === Pages ===

    /// Resolve the page URLs for a chapter.
    ///
    /// A chapter is served from the object store only when *every* page
    /// `1..=page_count` exists there; the response then carries a fresh
    /// presigned URL per page. Otherwise the remote page list drives a
    /// best-effort cache warm where any page that fails to download or
    /// upload falls back to its remote URL, so the response always has
    /// one entry per remote page.
    pub async fn get_chapter_pages(&self, chapter_id: &str) -> Result<ChapterPages> {
        let Some(chapter) = self.storage.get_chapter(chapter_id).await? else {
            return Err(PipelineError::ChapterNotFound);
        };
        let page_count = chapter.page_count.unwrap_or(0);

        if page_count > 0 && self.fully_cached(&chapter, page_count).await {
            let mut pages = Vec::with_capacity(page_count as usize);
            for page_number in 1..=page_count {
                let key = page_key(&chapter.manga_id, &chapter.id, page_number);
                pages.push(self.assets.signed_url(&key, DEFAULT_SIGNED_URL_TTL).await?);
            }
            return Ok(ChapterPages {
                pages,
                source: PageSource::S3,
            });
        }

        let remote_pages = self.catalog.get_chapter_pages(chapter_id).await?;
        let mut pages = Vec::with_capacity(remote_pages.len());
        for (index, remote_url) in remote_pages.iter().enumerate() {
            let page_number = (index + 1) as i32;
            match self.cache_page(&chapter, page_number, remote_url).await {
                Ok(signed) => pages.push(signed),
                Err(error) => {
                    warn!(chapter_id = %chapter.id, page_number, %error, "failed to cache page; serving remote url");
                    pages.push(remote_url.clone());
                }
            }
        }
        Ok(ChapterPages {
            pages,
            source: PageSource::MangaDx,
        })
    }

    /// Whether every page of the chapter already exists in the object
    /// store. Short-circuits on the first miss; an existence check that
    /// errors counts as a miss.
    async fn fully_cached(&self, chapter: &ChapterRecord, page_count: i32) -> bool {
        for page_number in 1..=page_count {
            let key = page_key(&chapter.manga_id, &chapter.id, page_number);
            match self.assets.exists(&key).await {
                Ok(true) => {}
                Ok(false) => return false,
                Err(error) => {
                    warn!(%key, %error, "existence check failed; treating chapter as uncached");
                    return false;
                }
            }
        }
        true
    }

    async fn cache_page(
        &self,
        chapter: &ChapterRecord,
        page_number: i32,
        remote_url: &str,
    ) -> Result<String> {
        let bytes = self.catalog.fetch_bytes(remote_url).await?;
        let key = self
            .assets
            .upload_page(
                &chapter.manga_id,
                &chapter.id,
                page_number,
                bytes,
                IMAGE_CONTENT_TYPE,
            )
            .await?;
        Ok(self.assets.signed_url(&key, DEFAULT_SIGNED_URL_TTL).await?)
    }
}

/// Keep only the records visible in the requested partition.
fn filter_partition(records: Vec<MangaRecord>, adult: bool) -> Vec<MangaRecord> {
    records
        .into_iter()
        .filter(|record| record.content_rating.is_adult() == adult)
        .collect()
}

#[cfg(test)]
mod tests;
