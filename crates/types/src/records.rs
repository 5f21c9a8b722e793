//! Structured records persisted by the storage tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::rating::ContentRating;

/// Publication status of a manga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
}

impl MangaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MangaStatus::Ongoing => "ongoing",
            MangaStatus::Completed => "completed",
            MangaStatus::Hiatus => "hiatus",
            MangaStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MangaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MangaStatus {
    type Err = UnknownMangaStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ongoing" => Ok(MangaStatus::Ongoing),
            "completed" => Ok(MangaStatus::Completed),
            "hiatus" => Ok(MangaStatus::Hiatus),
            "cancelled" => Ok(MangaStatus::Cancelled),
            other => Err(UnknownMangaStatus(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized status value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMangaStatus(pub String);

impl fmt::Display for UnknownMangaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown manga status: {}", self.0)
    }
}

impl std::error::Error for UnknownMangaStatus {}

/// A manga as stored locally.
///
/// `id` is the opaque catalog identifier and is stable across every tier:
/// the same string keys the database row, the object-store prefix, and
/// catalog lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: MangaStatus,
    pub year: Option<i32>,
    pub content_rating: ContentRating,
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    pub cover_image_key: Option<String>,
    /// Catalog-reported last update time.
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a manga; the storage tier stamps the local timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManga {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: MangaStatus,
    pub year: Option<i32>,
    pub content_rating: ContentRating,
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    pub cover_image_key: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl NewManga {
    /// Materialize a full record with local bookkeeping timestamps.
    pub fn into_record(self, now: DateTime<Utc>) -> MangaRecord {
        MangaRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            year: self.year,
            content_rating: self.content_rating,
            tags: self.tags,
            cover_image_url: self.cover_image_url,
            cover_image_key: self.cover_image_key,
            last_updated: self.last_updated,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to an existing manga record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MangaUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<MangaStatus>,
    pub year: Option<i32>,
    pub content_rating: Option<ContentRating>,
    pub tags: Option<Vec<String>>,
    pub cover_image_url: Option<String>,
    pub cover_image_key: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl MangaUpdate {
    /// Apply the set fields to `record`, bumping `updated_at`.
    pub fn apply(&self, record: &mut MangaRecord, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(year) = self.year {
            record.year = Some(year);
        }
        if let Some(rating) = self.content_rating {
            record.content_rating = rating;
        }
        if let Some(tags) = &self.tags {
            record.tags = tags.clone();
        }
        if let Some(url) = &self.cover_image_url {
            record.cover_image_url = Some(url.clone());
        }
        if let Some(key) = &self.cover_image_key {
            record.cover_image_key = Some(key.clone());
        }
        if let Some(last_updated) = self.last_updated {
            record.last_updated = Some(last_updated);
        }
        record.updated_at = now;
    }
}

/// A chapter as stored locally. `manga_id` must refer to a manga that
/// exists locally or is resolvable from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub id: String,
    pub manga_id: String,
    pub title: Option<String>,
    /// Ordered and numeric; fractional numbers ("5.5") are valid.
    pub chapter_number: f64,
    pub volume_number: Option<String>,
    pub language: String,
    pub page_count: Option<i32>,
    /// Object-store prefix under which this chapter's pages live.
    pub storage_base_key: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChapter {
    pub id: String,
    pub manga_id: String,
    pub title: Option<String>,
    pub chapter_number: f64,
    pub volume_number: Option<String>,
    pub language: String,
    pub page_count: Option<i32>,
    pub storage_base_key: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewChapter {
    /// Materialize a full record with local bookkeeping timestamps.
    pub fn into_record(self, now: DateTime<Utc>) -> ChapterRecord {
        ChapterRecord {
            id: self.id,
            manga_id: self.manga_id,
            title: self.title,
            chapter_number: self.chapter_number,
            volume_number: self.volume_number,
            language: self.language,
            page_count: self.page_count,
            storage_base_key: self.storage_base_key,
            published_at: self.published_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to an existing chapter record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterUpdate {
    pub title: Option<String>,
    pub volume_number: Option<String>,
    pub page_count: Option<i32>,
    pub storage_base_key: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ChapterUpdate {
    /// Apply the set fields to `record`, bumping `updated_at`.
    pub fn apply(&self, record: &mut ChapterRecord, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            record.title = Some(title.clone());
        }
        if let Some(volume) = &self.volume_number {
            record.volume_number = Some(volume.clone());
        }
        if let Some(pages) = self.page_count {
            record.page_count = Some(pages);
        }
        if let Some(key) = &self.storage_base_key {
            record.storage_base_key = Some(key.clone());
        }
        if let Some(published_at) = self.published_at {
            record.published_at = Some(published_at);
        }
        record.updated_at = now;
    }
}

/// Per-manga view statistics, created lazily on the first view increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaStats {
    pub manga_id: String,
    /// Monotonic view counter; increments must never be lost.
    pub views: i64,
    pub rating: Option<f64>,
    pub follows: i64,
    pub last_viewed_at: Option<DateTime<Utc>>,
}

impl MangaStats {
    /// Stats row for a manga that has never been viewed.
    pub fn empty(manga_id: impl Into<String>) -> Self {
        Self {
            manga_id: manga_id.into(),
            views: 0,
            rating: None,
            follows: 0,
            last_viewed_at: None,
        }
    }
}

/// Minimal user account. Shares the storage facade contract but is
/// otherwise unrelated to content resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

/// Insert shape for a user; the storage tier assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
}
