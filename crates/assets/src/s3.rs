//! S3-compatible implementation of the [`AssetStore`] trait.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, retry::RetryConfig};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Duration;
use tracing::debug;

use crate::error::{AssetStoreError, Result};
use crate::keys::{cover_key, page_key};
use crate::traits::AssetStore;

/// Images are immutable once written; downstream caches may hold them for
/// a year.
const CACHE_CONTROL: &str = "max-age=31536000";

/// S3-compatible object store for page images and covers.
///
/// Works against AWS S3 as well as S3-compatible services (MinIO,
/// Backblaze, ...) via an optional custom endpoint with path-style
/// addressing.
#[derive(Debug, Clone)]
pub struct S3AssetStore {
    client: Client,
    bucket: String,
}

impl S3AssetStore {
    /// Create a store from explicit credentials.
    ///
    /// Missing credentials are a configuration error here, not a failure
    /// deferred into the pipeline.
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        endpoint: Option<String>,
    ) -> Result<Self> {
        let bucket = bucket.into();
        let key_id = key_id.into();
        let key_secret = key_secret.into();
        if bucket.is_empty() {
            return Err(AssetStoreError::Configuration(
                "bucket name must not be empty".to_string(),
            ));
        }
        if key_id.is_empty() || key_secret.is_empty() {
            return Err(AssetStoreError::Configuration(
                "object store credentials are not set".to_string(),
            ));
        }

        let credentials = Credentials::new(key_id, key_secret, None, None, "mangavault-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Ok(Self {
            client: Client::from_conf(config_builder.build()),
            bucket,
        })
    }

    async fn put(&self, key: String, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        debug!(key = %key, size = bytes.len(), "uploading object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .cache_control(CACHE_CONTROL)
            .send()
            .await
            .map_err(|e| AssetStoreError::Upload {
                key: key.clone(),
                source: Box::new(e),
            })?;
        Ok(key)
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn upload_cover(
        &self,
        manga_id: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        self.put(cover_key(manga_id), bytes, content_type).await
    }

    async fn upload_page(
        &self,
        manga_id: &str,
        chapter_id: &str,
        page_number: i32,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        self.put(page_key(manga_id, chapter_id, page_number), bytes, content_type)
            .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(AssetStoreError::Stat {
                        key: key.to_string(),
                        source: Box::new(service_error),
                    })
                }
            }
        }
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|e| {
            AssetStoreError::Presign {
                key: key.to_string(),
                source: Box::new(e),
            }
        })?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| AssetStoreError::Presign {
                key: key.to_string(),
                source: Box::new(e),
            })?;
        Ok(request.uri().to_string())
    }
}
