//! reqwest-backed implementation of the [`Catalog`] trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::traits::{Catalog, CoverSize};
use crate::wire::{AtHomeResponse, CatalogChapter, CatalogCover, CatalogManga};

pub const DEFAULT_API_URL: &str = "https://api.mangadex.org";
pub const DEFAULT_UPLOADS_URL: &str = "https://uploads.mangadx.org";

/// Per-request timeout. The catalog gives no latency guarantees; a hung
/// call must only ever stall the request that issued it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How many chapters a single feed request asks for.
const CHAPTER_FEED_LIMIT: u32 = 100;

/// Client for the MangaDx HTTP API.
#[derive(Debug, Clone)]
pub struct MangaDxClient {
    http: reqwest::Client,
    api_url: String,
    uploads_url: String,
}

/// `{"data": [...]}` envelope used by list endpoints.
#[derive(serde::Deserialize)]
struct DataList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// `{"data": {...}}` envelope used by single-entity endpoints.
#[derive(serde::Deserialize)]
struct DataOne<T> {
    data: T,
}

impl MangaDxClient {
    /// Client against the production catalog hosts.
    pub fn new() -> Result<Self> {
        Self::with_urls(DEFAULT_API_URL, DEFAULT_UPLOADS_URL)
    }

    /// Client against explicit API and upload hosts (test or mirror
    /// deployments).
    pub fn with_urls(api_url: &str, uploads_url: &str) -> Result<Self> {
        for base in [api_url, uploads_url] {
            url::Url::parse(base).map_err(|_| CatalogError::InvalidUrl(base.to_string()))?;
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            uploads_url: uploads_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON endpoint; any non-success status is an error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        match self.get_json_optional(path, query).await? {
            Some(value) => Ok(value),
            None => Err(CatalogError::Status {
                status: 404,
                url: format!("{}{}", self.api_url, path),
            }),
        }
    }

    /// GET a JSON endpoint, mapping a remote 404 to `None`.
    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.api_url, path);
        debug!(%url, "catalog request");
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl Catalog for MangaDxClient {
    async fn search_manga(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogManga>> {
        let list: DataList<CatalogManga> = self
            .get_json(
                "/manga",
                &[
                    ("title", query.to_string()),
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                    ("includes[]", "cover_art".to_string()),
                    ("order[relevance]", "desc".to_string()),
                ],
            )
            .await?;
        Ok(list.data)
    }

    async fn get_manga(&self, id: &str) -> Result<Option<CatalogManga>> {
        let found: Option<DataOne<CatalogManga>> = self
            .get_json_optional(
                &format!("/manga/{id}"),
                &[("includes[]", "cover_art".to_string())],
            )
            .await?;
        Ok(found.map(|envelope| envelope.data))
    }

    async fn get_chapters(&self, manga_id: &str) -> Result<Vec<CatalogChapter>> {
        let list: DataList<CatalogChapter> = self
            .get_json(
                &format!("/manga/{manga_id}/feed"),
                &[
                    ("limit", CHAPTER_FEED_LIMIT.to_string()),
                    ("offset", "0".to_string()),
                    ("translatedLanguage[]", "en".to_string()),
                    ("order[chapter]", "asc".to_string()),
                ],
            )
            .await?;
        Ok(list.data)
    }

    async fn get_cover_art(&self, cover_id: &str) -> Result<Option<CatalogCover>> {
        let found: Option<DataOne<CatalogCover>> = self
            .get_json_optional(&format!("/cover/{cover_id}"), &[])
            .await?;
        Ok(found.map(|envelope| envelope.data))
    }

    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<Vec<String>> {
        let response: AtHomeResponse = self
            .get_json(&format!("/at-home/server/{chapter_id}"), &[])
            .await?;
        Ok(response.page_urls())
    }

    fn build_cover_url(&self, manga_id: &str, file_name: &str, size: CoverSize) -> String {
        format!(
            "{}/covers/{}/{}.{}.jpg",
            self.uploads_url,
            manga_id,
            file_name,
            size.suffix()
        )
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "fetching bytes");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
