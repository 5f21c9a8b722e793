use super::*;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use mangavault_assets::{AssetStoreError, cover_key};
use mangavault_catalog::{
    CatalogChapter, CatalogChapterAttributes, CatalogCover, CatalogCoverAttributes, CatalogError,
    CatalogMangaAttributes, CatalogRelationship, LocaleMap,
};
use mangavault_storage::{MemoryStorage, StorageError};
use mangavault_types::{
    ChapterUpdate, MangaStats, MangaStatus, MangaUpdate, NewChapter, NewManga, NewUser, User,
};

// === Mock seams ===

fn remote_error() -> CatalogError {
    CatalogError::Status {
        status: 503,
        url: "https://api.test/manga".to_string(),
    }
}

#[derive(Default)]
struct MockCatalog {
    manga: HashMap<String, CatalogManga>,
    search_results: Vec<CatalogManga>,
    chapters: Vec<CatalogChapter>,
    covers: HashMap<String, CatalogCover>,
    pages: Vec<String>,
    /// Every operation fails, as if the remote were unreachable.
    unreachable: bool,
    /// URLs whose byte download fails.
    failing_urls: HashSet<String>,
    manga_calls: AtomicUsize,
    search_calls: AtomicUsize,
    chapter_calls: AtomicUsize,
    page_calls: AtomicUsize,
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search_manga(
        &self,
        _query: &str,
        _limit: u32,
        _offset: u32,
    ) -> mangavault_catalog::Result<Vec<CatalogManga>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(remote_error());
        }
        Ok(self.search_results.clone())
    }

    async fn get_manga(&self, id: &str) -> mangavault_catalog::Result<Option<CatalogManga>> {
        self.manga_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(remote_error());
        }
        // Widen the race window for the coalescing test.
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(self.manga.get(id).cloned())
    }

    async fn get_chapters(
        &self,
        _manga_id: &str,
    ) -> mangavault_catalog::Result<Vec<CatalogChapter>> {
        self.chapter_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(remote_error());
        }
        Ok(self.chapters.clone())
    }

    async fn get_cover_art(
        &self,
        cover_id: &str,
    ) -> mangavault_catalog::Result<Option<CatalogCover>> {
        if self.unreachable {
            return Err(remote_error());
        }
        Ok(self.covers.get(cover_id).cloned())
    }

    async fn get_chapter_pages(&self, _chapter_id: &str) -> mangavault_catalog::Result<Vec<String>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(remote_error());
        }
        Ok(self.pages.clone())
    }

    fn build_cover_url(&self, manga_id: &str, file_name: &str, size: CoverSize) -> String {
        format!(
            "https://uploads.test/covers/{manga_id}/{file_name}.{}.jpg",
            size.suffix()
        )
    }

    async fn fetch_bytes(&self, url: &str) -> mangavault_catalog::Result<Vec<u8>> {
        if self.unreachable || self.failing_urls.contains(url) {
            return Err(remote_error());
        }
        Ok(vec![0xFF, 0xD8])
    }
}

#[derive(Default)]
struct MockAssets {
    objects: StdMutex<HashSet<String>>,
    fail_uploads: bool,
}

impl MockAssets {
    fn seed(&self, key: String) {
        self.objects.lock().unwrap().insert(key);
    }

    fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains(key)
    }
}

#[async_trait]
impl AssetStore for MockAssets {
    async fn upload_cover(
        &self,
        manga_id: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> mangavault_assets::Result<String> {
        if self.fail_uploads {
            return Err(AssetStoreError::Configuration("uploads disabled".to_string()));
        }
        let key = cover_key(manga_id);
        self.seed(key.clone());
        Ok(key)
    }

    async fn upload_page(
        &self,
        manga_id: &str,
        chapter_id: &str,
        page_number: i32,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> mangavault_assets::Result<String> {
        if self.fail_uploads {
            return Err(AssetStoreError::Configuration("uploads disabled".to_string()));
        }
        let key = page_key(manga_id, chapter_id, page_number);
        self.seed(key.clone());
        Ok(key)
    }

    async fn exists(&self, key: &str) -> mangavault_assets::Result<bool> {
        Ok(self.contains(key))
    }

    async fn signed_url(
        &self,
        key: &str,
        _expires_in: Duration,
    ) -> mangavault_assets::Result<String> {
        Ok(format!("https://signed.test/{key}"))
    }
}

/// Storage whose writes fail while reads keep working, for the
/// degraded-durability paths.
struct BrokenWrites(MemoryStorage);

fn write_refused<T>() -> mangavault_storage::Result<T> {
    Err(StorageError::Pool("writes disabled".to_string()))
}

#[async_trait]
impl MangaStore for BrokenWrites {
    async fn create_manga(&self, _: &NewManga) -> mangavault_storage::Result<MangaRecord> {
        write_refused()
    }
    async fn get_manga(&self, id: &str) -> mangavault_storage::Result<Option<MangaRecord>> {
        self.0.get_manga(id).await
    }
    async fn update_manga(
        &self,
        _: &str,
        _: &MangaUpdate,
    ) -> mangavault_storage::Result<Option<MangaRecord>> {
        write_refused()
    }
    async fn search_manga(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> mangavault_storage::Result<Vec<MangaRecord>> {
        self.0.search_manga(query, limit, offset).await
    }
    async fn get_manga_by_content_rating(
        &self,
        ratings: &[ContentRating],
        limit: u32,
        offset: u32,
    ) -> mangavault_storage::Result<Vec<MangaRecord>> {
        self.0.get_manga_by_content_rating(ratings, limit, offset).await
    }
    async fn get_popular_manga(&self, limit: u32) -> mangavault_storage::Result<Vec<MangaRecord>> {
        self.0.get_popular_manga(limit).await
    }
    async fn get_recently_updated_manga(
        &self,
        limit: u32,
    ) -> mangavault_storage::Result<Vec<MangaRecord>> {
        self.0.get_recently_updated_manga(limit).await
    }
    async fn create_chapter(&self, _: &NewChapter) -> mangavault_storage::Result<ChapterRecord> {
        write_refused()
    }
    async fn get_chapter(&self, id: &str) -> mangavault_storage::Result<Option<ChapterRecord>> {
        self.0.get_chapter(id).await
    }
    async fn get_chapters_by_manga(
        &self,
        manga_id: &str,
    ) -> mangavault_storage::Result<Vec<ChapterRecord>> {
        self.0.get_chapters_by_manga(manga_id).await
    }
    async fn update_chapter(
        &self,
        _: &str,
        _: &ChapterUpdate,
    ) -> mangavault_storage::Result<Option<ChapterRecord>> {
        write_refused()
    }
    async fn upsert_stats(&self, _: &MangaStats) -> mangavault_storage::Result<MangaStats> {
        write_refused()
    }
    async fn get_stats(&self, manga_id: &str) -> mangavault_storage::Result<Option<MangaStats>> {
        self.0.get_stats(manga_id).await
    }
    async fn increment_views(&self, _: &str) -> mangavault_storage::Result<()> {
        write_refused()
    }
    async fn create_user(&self, _: &NewUser) -> mangavault_storage::Result<User> {
        write_refused()
    }
    async fn get_user(&self, id: Uuid) -> mangavault_storage::Result<Option<User>> {
        self.0.get_user(id).await
    }
    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> mangavault_storage::Result<Option<User>> {
        self.0.get_user_by_username(username).await
    }
}

// === Fixture builders ===

fn locale(pairs: &[(&str, &str)]) -> LocaleMap {
    LocaleMap::from_pairs(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn remote_manga(id: &str, title: &str) -> CatalogManga {
    CatalogManga {
        id: id.to_string(),
        attributes: CatalogMangaAttributes {
            title: locale(&[("en", title)]),
            description: locale(&[("en", "A description.")]),
            status: Some("ongoing".to_string()),
            year: Some(2021),
            content_rating: Some("safe".to_string()),
            tags: Vec::new(),
            last_updated: Some("2024-03-01T12:00:00+00:00".to_string()),
        },
        relationships: Vec::new(),
    }
}

fn remote_manga_with_cover(id: &str, title: &str, cover_id: &str) -> CatalogManga {
    let mut manga = remote_manga(id, title);
    manga.relationships.push(CatalogRelationship {
        id: cover_id.to_string(),
        kind: "cover_art".to_string(),
    });
    manga
}

fn remote_cover(id: &str, file_name: &str) -> CatalogCover {
    CatalogCover {
        id: id.to_string(),
        attributes: CatalogCoverAttributes {
            file_name: file_name.to_string(),
        },
    }
}

fn feed_chapter(id: &str, number: &str, pages: i32) -> CatalogChapter {
    CatalogChapter {
        id: id.to_string(),
        attributes: CatalogChapterAttributes {
            title: Some(format!("Chapter {number}")),
            chapter: Some(number.to_string()),
            volume: None,
            translated_language: Some("en".to_string()),
            pages: Some(pages),
            publish_at: Some("2023-06-01T00:00:00+00:00".to_string()),
        },
    }
}

fn stored_manga(id: &str, title: &str, rating: ContentRating) -> NewManga {
    NewManga {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        status: MangaStatus::Ongoing,
        year: None,
        content_rating: rating,
        tags: Vec::new(),
        cover_image_url: None,
        cover_image_key: None,
        last_updated: None,
    }
}

fn stored_chapter(id: &str, manga_id: &str, page_count: i32) -> NewChapter {
    NewChapter {
        id: id.to_string(),
        manga_id: manga_id.to_string(),
        title: None,
        chapter_number: 1.0,
        volume_number: None,
        language: "en".to_string(),
        page_count: Some(page_count),
        storage_base_key: None,
        published_at: None,
    }
}

struct Harness {
    storage: Arc<MemoryStorage>,
    catalog: Arc<MockCatalog>,
    assets: Arc<MockAssets>,
    pipeline: ResolutionPipeline,
}

fn harness(catalog: MockCatalog) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let catalog = Arc::new(catalog);
    let assets = Arc::new(MockAssets::default());
    let pipeline = ResolutionPipeline::new(
        storage.clone() as Arc<dyn MangaStore>,
        catalog.clone() as Arc<dyn Catalog>,
        assets.clone() as Arc<dyn AssetStore>,
    );
    Harness {
        storage,
        catalog,
        assets,
        pipeline,
    }
}

async fn wait_for_views(storage: &MemoryStorage, manga_id: &str, expected: i64) {
    for _ in 0..100 {
        if let Some(stats) = storage.get_stats(manga_id).await.unwrap() {
            if stats.views >= expected {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("view count never reached {expected} for {manga_id}");
}

// === Manga resolution ===

#[tokio::test]
async fn resolves_manga_from_catalog_and_warms_cover() {
    let mut catalog = MockCatalog::default();
    catalog
        .manga
        .insert("m1".to_string(), remote_manga_with_cover("m1", "Dragon's Awakening", "c1"));
    catalog
        .covers
        .insert("c1".to_string(), remote_cover("c1", "file-name"));
    let h = harness(catalog);

    let record = h.pipeline.get_manga("m1").await.unwrap();
    assert_eq!(record.title, "Dragon's Awakening");
    assert_eq!(record.content_rating, ContentRating::Safe);
    assert_eq!(record.cover_image_key.as_deref(), Some("manga/m1/cover.jpg"));
    assert!(h.assets.contains("manga/m1/cover.jpg"));
    assert!(h.storage.get_manga("m1").await.unwrap().is_some());
}

#[tokio::test]
async fn second_resolution_is_idempotent_and_local() {
    let mut catalog = MockCatalog::default();
    catalog.manga.insert("m1".to_string(), remote_manga("m1", "Stable"));
    let h = harness(catalog);

    let first = h.pipeline.get_manga("m1").await.unwrap();
    let second = h.pipeline.get_manga("m1").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.title, second.title);
    assert_eq!(first.content_rating, second.content_rating);
    assert_eq!(h.catalog.manga_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn catalog_miss_is_not_found() {
    let h = harness(MockCatalog::default());
    let error = h.pipeline.get_manga("missing").await.unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn unreachable_catalog_with_empty_stores_is_not_found() {
    let h = harness(MockCatalog {
        unreachable: true,
        ..Default::default()
    });
    let error = h.pipeline.get_manga("unknown").await.unwrap_err();
    assert!(error.is_not_found(), "expected 404 semantics, got {error}");
}

#[tokio::test]
async fn cover_failure_is_not_fatal_to_resolution() {
    let mut catalog = MockCatalog::default();
    catalog
        .manga
        .insert("m1".to_string(), remote_manga_with_cover("m1", "Coverless", "c1"));
    catalog.covers.insert("c1".to_string(), remote_cover("c1", "f"));
    catalog
        .failing_urls
        .insert("https://uploads.test/covers/m1/f.512.jpg".to_string());
    let h = harness(catalog);

    let record = h.pipeline.get_manga("m1").await.unwrap();
    assert_eq!(record.cover_image_key, None);
    assert_eq!(
        record.cover_image_url.as_deref(),
        Some("https://uploads.test/covers/m1/f.512.jpg")
    );
}

#[tokio::test]
async fn cover_upload_failure_keeps_the_external_url() {
    let mut catalog = MockCatalog::default();
    catalog
        .manga
        .insert("m1".to_string(), remote_manga_with_cover("m1", "Sturdy", "c1"));
    catalog.covers.insert("c1".to_string(), remote_cover("c1", "f"));
    let storage = Arc::new(MemoryStorage::new());
    let assets = Arc::new(MockAssets {
        fail_uploads: true,
        ..Default::default()
    });
    let pipeline = ResolutionPipeline::new(
        storage.clone() as Arc<dyn MangaStore>,
        Arc::new(catalog) as Arc<dyn Catalog>,
        assets.clone() as Arc<dyn AssetStore>,
    );

    let record = pipeline.get_manga("m1").await.unwrap();
    assert_eq!(record.cover_image_key, None);
    assert!(record.cover_image_url.is_some());
    assert!(!assets.contains("manga/m1/cover.jpg"));
}

#[tokio::test]
async fn persistence_failure_degrades_to_unstored_record() {
    let mut catalog = MockCatalog::default();
    catalog.manga.insert("m1".to_string(), remote_manga("m1", "Ephemeral"));
    let catalog = Arc::new(catalog);
    let assets = Arc::new(MockAssets::default());
    let pipeline = ResolutionPipeline::new(
        Arc::new(BrokenWrites(MemoryStorage::new())) as Arc<dyn MangaStore>,
        catalog.clone() as Arc<dyn Catalog>,
        assets as Arc<dyn AssetStore>,
    );

    let record = pipeline.get_manga("m1").await.unwrap();
    assert_eq!(record.title, "Ephemeral");
}

#[tokio::test]
async fn resolution_counts_a_view() {
    let mut catalog = MockCatalog::default();
    catalog.manga.insert("m1".to_string(), remote_manga("m1", "Seen"));
    let h = harness(catalog);

    h.pipeline.get_manga("m1").await.unwrap();
    wait_for_views(&h.storage, "m1", 1).await;
}

#[tokio::test]
async fn concurrent_first_resolutions_coalesce_into_one_fetch() {
    let mut catalog = MockCatalog::default();
    catalog.manga.insert("m1".to_string(), remote_manga("m1", "Popular"));
    let h = harness(catalog);
    let pipeline = Arc::new(h.pipeline);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline.get_manga("m1").await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(h.catalog.manga_calls.load(Ordering::SeqCst), 1);
}

// === Search and listings ===

#[tokio::test]
async fn search_gives_local_results_absolute_precedence() {
    let h = harness(MockCatalog::default());
    h.storage
        .create_manga(&stored_manga("m1", "Dragon Tale", ContentRating::Safe))
        .await
        .unwrap();

    let outcome = h.pipeline.search_manga("dragon", 20, 0, false).await.unwrap();
    assert_eq!(outcome.source, ListingSource::Local);
    assert_eq!(outcome.data.len(), 1);
    assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn search_falls_back_to_catalog_and_persists() {
    let mut catalog = MockCatalog::default();
    catalog
        .search_results
        .push(remote_manga_with_cover("m1", "Dragon's Awakening", "c1"));
    catalog.covers.insert("c1".to_string(), remote_cover("c1", "f"));
    let h = harness(catalog);

    let outcome = h.pipeline.search_manga("Dragon", 20, 0, false).await.unwrap();
    assert_eq!(outcome.source, ListingSource::MangaDx);
    assert_eq!(outcome.data.len(), 1);
    assert_eq!(outcome.data[0].title, "Dragon's Awakening");
    assert_eq!(
        outcome.data[0].cover_image_key.as_deref(),
        Some("manga/m1/cover.jpg")
    );
    assert!(h.assets.contains("manga/m1/cover.jpg"));
    assert!(h.storage.get_manga("m1").await.unwrap().is_some());
}

#[tokio::test]
async fn search_remote_failure_propagates_when_no_local_results() {
    let h = harness(MockCatalog {
        unreachable: true,
        ..Default::default()
    });
    let error = h.pipeline.search_manga("dragon", 20, 0, false).await.unwrap_err();
    assert!(!error.is_not_found());
}

#[tokio::test]
async fn search_filters_by_content_rating_partition() {
    let h = harness(MockCatalog::default());
    h.storage
        .create_manga(&stored_manga("m1", "Dragon Nights", ContentRating::Erotica))
        .await
        .unwrap();

    // Adult mode sees the local match without touching the catalog.
    let adult = h.pipeline.search_manga("dragon", 20, 0, true).await.unwrap();
    assert_eq!(adult.source, ListingSource::Local);
    assert_eq!(adult.data.len(), 1);
    assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 0);

    // Regular mode cannot see it, so the filtered local set is empty and
    // the catalog is consulted.
    let regular = h.pipeline.search_manga("dragon", 20, 0, false).await.unwrap();
    assert_eq!(regular.source, ListingSource::MangaDx);
    assert!(regular.data.is_empty());
    assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn listings_filter_by_partition() {
    let h = harness(MockCatalog::default());
    h.storage
        .create_manga(&stored_manga("m1", "Safe One", ContentRating::Safe))
        .await
        .unwrap();
    h.storage
        .create_manga(&stored_manga("m2", "Adult One", ContentRating::Pornographic))
        .await
        .unwrap();

    let regular = h.pipeline.get_popular(10, false).await.unwrap();
    assert_eq!(regular.len(), 1);
    assert_eq!(regular[0].id, "m1");

    let adult = h.pipeline.get_recent(10, true).await.unwrap();
    assert_eq!(adult.len(), 1);
    assert_eq!(adult[0].id, "m2");
}

#[tokio::test]
async fn by_rating_passes_explicit_ratings_through() {
    let h = harness(MockCatalog::default());
    h.storage
        .create_manga(&stored_manga("m1", "A", ContentRating::Safe))
        .await
        .unwrap();
    h.storage
        .create_manga(&stored_manga("m2", "B", ContentRating::Suggestive))
        .await
        .unwrap();

    let found = h
        .pipeline
        .get_by_rating(&[ContentRating::Suggestive], 10, 0)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "m2");
}

// === Chapters ===

#[tokio::test]
async fn chapters_fetch_once_then_serve_local() {
    let mut catalog = MockCatalog::default();
    catalog.chapters = vec![feed_chapter("c1", "1", 10), feed_chapter("c2", "2.5", 12)];
    let h = harness(catalog);

    let first = h.pipeline.get_chapters("m1").await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].chapter_number, 2.5);
    assert_eq!(
        first[0].storage_base_key.as_deref(),
        Some("manga/m1/chapters/c1")
    );

    let second = h.pipeline.get_chapters("m1").await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(h.catalog.chapter_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn chapter_persistence_failure_skips_and_continues() {
    let mut catalog = MockCatalog::default();
    catalog.chapters = vec![feed_chapter("c1", "1", 10), feed_chapter("c2", "2", 12)];
    let catalog = Arc::new(catalog);
    let pipeline = ResolutionPipeline::new(
        Arc::new(BrokenWrites(MemoryStorage::new())) as Arc<dyn MangaStore>,
        catalog.clone() as Arc<dyn Catalog>,
        Arc::new(MockAssets::default()) as Arc<dyn AssetStore>,
    );

    // Both chapters still come back even though neither persisted.
    let chapters = pipeline.get_chapters("m1").await.unwrap();
    assert_eq!(chapters.len(), 2);
}

// === Pages ===

#[tokio::test]
async fn fully_cached_chapter_serves_signed_urls() {
    let mut catalog = MockCatalog::default();
    catalog.pages = vec!["https://remote.test/1".to_string()];
    let h = harness(catalog);
    h.storage
        .create_chapter(&stored_chapter("ch1", "m1", 3))
        .await
        .unwrap();
    for page in 1..=3 {
        h.assets.seed(page_key("m1", "ch1", page));
    }

    let pages = h.pipeline.get_chapter_pages("ch1").await.unwrap();
    assert_eq!(pages.source, PageSource::S3);
    assert_eq!(
        pages.pages,
        vec![
            "https://signed.test/manga/m1/chapters/ch1/pages/001.jpg".to_string(),
            "https://signed.test/manga/m1/chapters/ch1/pages/002.jpg".to_string(),
            "https://signed.test/manga/m1/chapters/ch1/pages/003.jpg".to_string(),
        ]
    );
    assert_eq!(h.catalog.page_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn partially_cached_chapter_rewarns_from_remote() {
    let mut catalog = MockCatalog::default();
    catalog.pages = (1..=3)
        .map(|page| format!("https://remote.test/{page}"))
        .collect();
    let h = harness(catalog);
    h.storage
        .create_chapter(&stored_chapter("ch1", "m1", 3))
        .await
        .unwrap();
    // Pages 1 and 2 are cached, 3 is missing: the chapter is not fully
    // cached and the whole list is served (and re-warmed) remotely.
    h.assets.seed(page_key("m1", "ch1", 1));
    h.assets.seed(page_key("m1", "ch1", 2));

    let pages = h.pipeline.get_chapter_pages("ch1").await.unwrap();
    assert_eq!(pages.source, PageSource::MangaDx);
    assert_eq!(pages.pages.len(), 3);
    for page in 1..=3 {
        assert!(h.assets.contains(&page_key("m1", "ch1", page)));
    }
}

#[tokio::test]
async fn page_cache_failure_falls_back_to_remote_url() {
    let mut catalog = MockCatalog::default();
    catalog.pages = (1..=3)
        .map(|page| format!("https://remote.test/{page}"))
        .collect();
    catalog
        .failing_urls
        .insert("https://remote.test/2".to_string());
    let h = harness(catalog);
    h.storage
        .create_chapter(&stored_chapter("ch1", "m1", 3))
        .await
        .unwrap();

    let pages = h.pipeline.get_chapter_pages("ch1").await.unwrap();
    assert_eq!(pages.source, PageSource::MangaDx);
    // Exactly one URL per remote page, with the failed one served raw.
    assert_eq!(pages.pages.len(), 3);
    assert_eq!(pages.pages[1], "https://remote.test/2");
    assert!(pages.pages[0].starts_with("https://signed.test/"));
    assert!(pages.pages[2].starts_with("https://signed.test/"));
    assert!(!h.assets.contains(&page_key("m1", "ch1", 2)));
}

#[tokio::test]
async fn unknown_chapter_is_not_found() {
    let h = harness(MockCatalog::default());
    let error = h.pipeline.get_chapter_pages("missing").await.unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn zero_page_chapter_is_never_treated_as_cached() {
    let mut catalog = MockCatalog::default();
    catalog.pages = vec!["https://remote.test/1".to_string()];
    let h = harness(catalog);
    h.storage
        .create_chapter(&stored_chapter("ch1", "m1", 0))
        .await
        .unwrap();

    let pages = h.pipeline.get_chapter_pages("ch1").await.unwrap();
    assert_eq!(pages.source, PageSource::MangaDx);
    assert_eq!(pages.pages.len(), 1);
}
