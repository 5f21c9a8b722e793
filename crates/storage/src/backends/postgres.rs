//! PostgreSQL-backed primary storage.

use async_trait::async_trait;
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use chrono::Utc;
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};
use tracing::info;
use uuid::Uuid;

use mangavault_types::{
    ChapterRecord, ChapterUpdate, ContentRating, MangaRecord, MangaStats, MangaUpdate, NewChapter,
    NewManga, NewUser, User,
};

use crate::error::{Result, StorageError};
use crate::traits::MangaStore;

/// Schema applied idempotently at startup.
const SCHEMA: &str = include_str!("schema.sql");

const MANGA_COLUMNS: &str = "id, title, description, status, year, content_rating, tags, \
     cover_image_url, cover_image_key, last_updated, created_at, updated_at";

const CHAPTER_COLUMNS: &str = "id, manga_id, title, chapter_number, volume_number, language, \
     page_count, storage_base_key, published_at, created_at, updated_at";

const STATS_COLUMNS: &str = "manga_id, views, rating, follows, last_viewed_at";

/// Durable primary store over a pooled PostgreSQL connection.
///
/// Pool construction does not require connectivity; each operation checks
/// out a connection and surfaces pool or query failures to the caller
/// (the failover facade turns those into fallback retries).
#[derive(Clone)]
pub struct PostgresStorage {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresStorage {
    /// Build a store from a connection string.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let manager = PostgresConnectionManager::new_from_stringlike(database_url, NoTls)?;
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .await
            .map_err(StorageError::Query)?;
        Ok(Self { pool })
    }

    /// Create the tables and indexes when they do not exist yet.
    pub async fn apply_schema(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.batch_execute(SCHEMA).await?;
        info!("database schema applied");
        Ok(())
    }

    async fn conn(
        &self,
    ) -> Result<bb8::PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        Ok(self.pool.get().await?)
    }
}

/// Escape LIKE metacharacters and wrap in wildcards for substring match.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn manga_from_row(row: &Row) -> Result<MangaRecord> {
    let status: String = row.try_get("status")?;
    let content_rating: String = row.try_get("content_rating")?;
    Ok(MangaRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: status
            .parse()
            .map_err(|_| StorageError::InvalidRecord(format!("manga status '{status}'")))?,
        year: row.try_get("year")?,
        content_rating: content_rating.parse().map_err(|_| {
            StorageError::InvalidRecord(format!("content rating '{content_rating}'"))
        })?,
        tags: row.try_get("tags")?,
        cover_image_url: row.try_get("cover_image_url")?,
        cover_image_key: row.try_get("cover_image_key")?,
        last_updated: row.try_get("last_updated")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn chapter_from_row(row: &Row) -> Result<ChapterRecord> {
    Ok(ChapterRecord {
        id: row.try_get("id")?,
        manga_id: row.try_get("manga_id")?,
        title: row.try_get("title")?,
        chapter_number: row.try_get("chapter_number")?,
        volume_number: row.try_get("volume_number")?,
        language: row.try_get("language")?,
        page_count: row.try_get("page_count")?,
        storage_base_key: row.try_get("storage_base_key")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn stats_from_row(row: &Row) -> Result<MangaStats> {
    Ok(MangaStats {
        manga_id: row.try_get("manga_id")?,
        views: row.try_get("views")?,
        rating: row.try_get("rating")?,
        follows: row.try_get("follows")?,
        last_viewed_at: row.try_get("last_viewed_at")?,
    })
}

fn user_from_row(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
    })
}

#[async_trait]
impl MangaStore for PostgresStorage {
    async fn create_manga(&self, manga: &NewManga) -> Result<MangaRecord> {
        let conn = self.conn().await?;
        let now = Utc::now();
        let status = manga.status.as_str();
        let content_rating = manga.content_rating.as_str();
        // Concurrent first resolutions may race on the insert; the upsert
        // keeps the second write from failing on the primary key.
        let sql = format!(
            "INSERT INTO manga (id, title, description, status, year, content_rating, \
             tags, cover_image_url, cover_image_key, last_updated, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             ON CONFLICT (id) DO UPDATE SET \
             title = EXCLUDED.title, description = EXCLUDED.description, \
             status = EXCLUDED.status, year = EXCLUDED.year, \
             content_rating = EXCLUDED.content_rating, tags = EXCLUDED.tags, \
             cover_image_url = EXCLUDED.cover_image_url, \
             cover_image_key = EXCLUDED.cover_image_key, \
             last_updated = EXCLUDED.last_updated, updated_at = EXCLUDED.updated_at \
             RETURNING {MANGA_COLUMNS}"
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[
                    &manga.id,
                    &manga.title,
                    &manga.description,
                    &status,
                    &manga.year,
                    &content_rating,
                    &manga.tags,
                    &manga.cover_image_url,
                    &manga.cover_image_key,
                    &manga.last_updated,
                    &now,
                ],
            )
            .await?;
        manga_from_row(&row)
    }

    async fn get_manga(&self, id: &str) -> Result<Option<MangaRecord>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {MANGA_COLUMNS} FROM manga WHERE id = $1");
        let row = conn.query_opt(sql.as_str(), &[&id]).await?;
        row.as_ref().map(manga_from_row).transpose()
    }

    async fn update_manga(&self, id: &str, updates: &MangaUpdate) -> Result<Option<MangaRecord>> {
        let Some(mut record) = self.get_manga(id).await? else {
            return Ok(None);
        };
        updates.apply(&mut record, Utc::now());

        let conn = self.conn().await?;
        let status = record.status.as_str();
        let content_rating = record.content_rating.as_str();
        conn.execute(
            "UPDATE manga SET title = $2, description = $3, status = $4, year = $5, \
             content_rating = $6, tags = $7, cover_image_url = $8, cover_image_key = $9, \
             last_updated = $10, updated_at = $11 WHERE id = $1",
            &[
                &record.id,
                &record.title,
                &record.description,
                &status,
                &record.year,
                &content_rating,
                &record.tags,
                &record.cover_image_url,
                &record.cover_image_key,
                &record.last_updated,
                &record.updated_at,
            ],
        )
        .await?;
        Ok(Some(record))
    }

    async fn search_manga(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>> {
        let conn = self.conn().await?;
        let pattern = like_pattern(query);
        let sql = format!(
            "SELECT {MANGA_COLUMNS} FROM manga \
             WHERE title ILIKE $1 OR description ILIKE $1 \
             OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $1) \
             ORDER BY created_at OFFSET $2 LIMIT $3"
        );
        let rows = conn
            .query(
                sql.as_str(),
                &[&pattern, &i64::from(offset), &i64::from(limit)],
            )
            .await?;
        rows.iter().map(manga_from_row).collect()
    }

    async fn get_manga_by_content_rating(
        &self,
        ratings: &[ContentRating],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MangaRecord>> {
        let conn = self.conn().await?;
        let ratings: Vec<&str> = ratings.iter().map(|rating| rating.as_str()).collect();
        let sql = format!(
            "SELECT {MANGA_COLUMNS} FROM manga WHERE content_rating = ANY($1) \
             ORDER BY created_at OFFSET $2 LIMIT $3"
        );
        let rows = conn
            .query(
                sql.as_str(),
                &[&ratings, &i64::from(offset), &i64::from(limit)],
            )
            .await?;
        rows.iter().map(manga_from_row).collect()
    }

    async fn get_popular_manga(&self, limit: u32) -> Result<Vec<MangaRecord>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {MANGA_COLUMNS} FROM manga m \
             LEFT JOIN manga_stats s ON s.manga_id = m.id \
             ORDER BY COALESCE(s.views, 0) DESC LIMIT $1"
        );
        let rows = conn.query(sql.as_str(), &[&i64::from(limit)]).await?;
        rows.iter().map(manga_from_row).collect()
    }

    async fn get_recently_updated_manga(&self, limit: u32) -> Result<Vec<MangaRecord>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {MANGA_COLUMNS} FROM manga \
             ORDER BY last_updated DESC NULLS LAST LIMIT $1"
        );
        let rows = conn.query(sql.as_str(), &[&i64::from(limit)]).await?;
        rows.iter().map(manga_from_row).collect()
    }

    async fn create_chapter(&self, chapter: &NewChapter) -> Result<ChapterRecord> {
        let conn = self.conn().await?;
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO chapters (id, manga_id, title, chapter_number, volume_number, \
             language, page_count, storage_base_key, published_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             ON CONFLICT (id) DO UPDATE SET \
             manga_id = EXCLUDED.manga_id, title = EXCLUDED.title, \
             chapter_number = EXCLUDED.chapter_number, \
             volume_number = EXCLUDED.volume_number, language = EXCLUDED.language, \
             page_count = EXCLUDED.page_count, \
             storage_base_key = EXCLUDED.storage_base_key, \
             published_at = EXCLUDED.published_at, updated_at = EXCLUDED.updated_at \
             RETURNING {CHAPTER_COLUMNS}"
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[
                    &chapter.id,
                    &chapter.manga_id,
                    &chapter.title,
                    &chapter.chapter_number,
                    &chapter.volume_number,
                    &chapter.language,
                    &chapter.page_count,
                    &chapter.storage_base_key,
                    &chapter.published_at,
                    &now,
                ],
            )
            .await?;
        chapter_from_row(&row)
    }

    async fn get_chapter(&self, id: &str) -> Result<Option<ChapterRecord>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1");
        let row = conn.query_opt(sql.as_str(), &[&id]).await?;
        row.as_ref().map(chapter_from_row).transpose()
    }

    async fn get_chapters_by_manga(&self, manga_id: &str) -> Result<Vec<ChapterRecord>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE manga_id = $1 \
             ORDER BY chapter_number ASC"
        );
        let rows = conn.query(sql.as_str(), &[&manga_id]).await?;
        rows.iter().map(chapter_from_row).collect()
    }

    async fn update_chapter(
        &self,
        id: &str,
        updates: &ChapterUpdate,
    ) -> Result<Option<ChapterRecord>> {
        let Some(mut record) = self.get_chapter(id).await? else {
            return Ok(None);
        };
        updates.apply(&mut record, Utc::now());

        let conn = self.conn().await?;
        conn.execute(
            "UPDATE chapters SET title = $2, volume_number = $3, page_count = $4, \
             storage_base_key = $5, published_at = $6, updated_at = $7 WHERE id = $1",
            &[
                &record.id,
                &record.title,
                &record.volume_number,
                &record.page_count,
                &record.storage_base_key,
                &record.published_at,
                &record.updated_at,
            ],
        )
        .await?;
        Ok(Some(record))
    }

    async fn upsert_stats(&self, stats: &MangaStats) -> Result<MangaStats> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO manga_stats (manga_id, views, rating, follows, last_viewed_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (manga_id) DO UPDATE SET views = EXCLUDED.views, \
             rating = EXCLUDED.rating, follows = EXCLUDED.follows, \
             last_viewed_at = EXCLUDED.last_viewed_at \
             RETURNING {STATS_COLUMNS}"
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[
                    &stats.manga_id,
                    &stats.views,
                    &stats.rating,
                    &stats.follows,
                    &stats.last_viewed_at,
                ],
            )
            .await?;
        stats_from_row(&row)
    }

    async fn get_stats(&self, manga_id: &str) -> Result<Option<MangaStats>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {STATS_COLUMNS} FROM manga_stats WHERE manga_id = $1");
        let row = conn.query_opt(sql.as_str(), &[&manga_id]).await?;
        row.as_ref().map(stats_from_row).transpose()
    }

    async fn increment_views(&self, manga_id: &str) -> Result<()> {
        let conn = self.conn().await?;
        // Single-statement upsert-increment; the database serializes
        // concurrent increments for the same id.
        conn.execute(
            "INSERT INTO manga_stats (manga_id, views, follows, last_viewed_at) \
             VALUES ($1, 1, 0, now()) \
             ON CONFLICT (manga_id) DO UPDATE SET \
             views = manga_stats.views + 1, last_viewed_at = now()",
            &[&manga_id],
        )
        .await?;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn().await?;
        let id = Uuid::new_v4();
        let result = conn
            .query_one(
                "INSERT INTO users (id, username, password) VALUES ($1, $2, $3) \
                 RETURNING id, username, password",
                &[&id, &user.username, &user.password],
            )
            .await;
        match result {
            Ok(row) => user_from_row(&row),
            Err(err) if err.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(StorageError::UserAlreadyExists(user.username.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt("SELECT id, username, password FROM users WHERE id = $1", &[&id])
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, username, password FROM users WHERE username = $1",
                &[&username],
            )
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}
