//! In-process fallback storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use mangavault_types::{
    ChapterRecord, ChapterUpdate, ContentRating, MangaRecord, MangaStats, MangaUpdate, NewChapter,
    NewManga, NewUser, User,
};

use crate::error::{Result, StorageError};
use crate::traits::MangaStore;

/// Process-local, ephemeral mirror of the primary store's query surface.
///
/// Used by the failover facade when the primary store is unreachable or
/// not configured. Everything lives in keyed maps plus one explicit
/// secondary index (`manga_id -> chapter ids`, in insertion order) kept
/// consistent by the write path alone. Contents are lost on process exit
/// and never reconciled back into the primary store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    manga: DashMap<String, MangaRecord>,
    chapters: DashMap<String, ChapterRecord>,
    stats: DashMap<String, MangaStats>,
    users: DashMap<Uuid, User>,
    /// Secondary index: manga id -> chapter ids in insertion order.
    manga_chapters: DashMap<String, Vec<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(record: &MangaRecord, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        record.title.to_lowercase().contains(&needle)
            || record
                .description
                .as_ref()
                .is_some_and(|description| description.to_lowercase().contains(&needle))
            || record
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

#[async_trait]
impl MangaStore for MemoryStorage {
    async fn create_manga(&self, manga: &NewManga) -> Result<MangaRecord> {
        let now = Utc::now();
        let record = match self.manga.entry(manga.id.clone()) {
            Entry::Occupied(mut occupied) => {
                let created_at = occupied.get().created_at;
                let mut record = manga.clone().into_record(now);
                record.created_at = created_at;
                occupied.insert(record.clone());
                record
            }
            Entry::Vacant(vacant) => {
                let record = manga.clone().into_record(now);
                vacant.insert(record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn get_manga(&self, id: &str) -> Result<Option<MangaRecord>> {
        Ok(self.manga.get(id).map(|entry| entry.clone()))
    }

    async fn update_manga(&self, id: &str, updates: &MangaUpdate) -> Result<Option<MangaRecord>> {
        match self.manga.get_mut(id) {
            Some(mut entry) => {
                updates.apply(entry.value_mut(), Utc::now());
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn search_manga(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>> {
        let results = self
            .manga
            .iter()
            .filter(|entry| Self::matches(entry.value(), query))
            .map(|entry| entry.clone())
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(results)
    }

    async fn get_manga_by_content_rating(
        &self,
        ratings: &[ContentRating],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>> {
        let results = self
            .manga
            .iter()
            .filter(|entry| ratings.contains(&entry.content_rating))
            .map(|entry| entry.clone())
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(results)
    }

    async fn get_popular_manga(&self, limit: u32) -> Result<Vec<MangaRecord>> {
        let mut with_views: Vec<(i64, MangaRecord)> = self
            .manga
            .iter()
            .map(|entry| {
                let views = self
                    .stats
                    .get(entry.key())
                    .map(|stats| stats.views)
                    .unwrap_or(0);
                (views, entry.clone())
            })
            .collect();
        with_views.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(with_views
            .into_iter()
            .take(limit as usize)
            .map(|(_, record)| record)
            .collect())
    }

    async fn get_recently_updated_manga(&self, limit: u32) -> Result<Vec<MangaRecord>> {
        let mut records: Vec<MangaRecord> = self.manga.iter().map(|entry| entry.clone()).collect();
        records.sort_by_key(|record| {
            std::cmp::Reverse(record.last_updated.unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
        });
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn create_chapter(&self, chapter: &NewChapter) -> Result<ChapterRecord> {
        let now = Utc::now();
        let record = match self.chapters.entry(chapter.id.clone()) {
            Entry::Occupied(mut occupied) => {
                let created_at = occupied.get().created_at;
                let mut record = chapter.clone().into_record(now);
                record.created_at = created_at;
                occupied.insert(record.clone());
                record
            }
            Entry::Vacant(vacant) => {
                let record = chapter.clone().into_record(now);
                vacant.insert(record.clone());
                record
            }
        };

        let mut index = self.manga_chapters.entry(chapter.manga_id.clone()).or_default();
        if !index.contains(&chapter.id) {
            index.push(chapter.id.clone());
        }

        Ok(record)
    }

    async fn get_chapter(&self, id: &str) -> Result<Option<ChapterRecord>> {
        Ok(self.chapters.get(id).map(|entry| entry.clone()))
    }

    async fn get_chapters_by_manga(&self, manga_id: &str) -> Result<Vec<ChapterRecord>> {
        let Some(ids) = self.manga_chapters.get(manga_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| self.chapters.get(id).map(|entry| entry.clone()))
            .collect())
    }

    async fn update_chapter(
        &self,
        id: &str,
        updates: &ChapterUpdate,
    ) -> Result<Option<ChapterRecord>> {
        match self.chapters.get_mut(id) {
            Some(mut entry) => {
                updates.apply(entry.value_mut(), Utc::now());
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn upsert_stats(&self, stats: &MangaStats) -> Result<MangaStats> {
        self.stats.insert(stats.manga_id.clone(), stats.clone());
        Ok(stats.clone())
    }

    async fn get_stats(&self, manga_id: &str) -> Result<Option<MangaStats>> {
        Ok(self.stats.get(manga_id).map(|entry| entry.clone()))
    }

    async fn increment_views(&self, manga_id: &str) -> Result<()> {
        let now = Utc::now();
        // The entry API holds the shard lock for the whole read-modify-
        // write, so concurrent increments cannot be lost.
        self.stats
            .entry(manga_id.to_string())
            .and_modify(|stats| {
                stats.views += 1;
                stats.last_viewed_at = Some(now);
            })
            .or_insert_with(|| MangaStats {
                manga_id: manga_id.to_string(),
                views: 1,
                rating: None,
                follows: 0,
                last_viewed_at: Some(now),
            });
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        if self
            .users
            .iter()
            .any(|entry| entry.username == user.username)
        {
            return Err(StorageError::UserAlreadyExists(user.username.clone()));
        }
        let record = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            password: user.password.clone(),
        };
        self.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.clone()))
    }
}
