//! Environment-driven configuration.
//!
//! Everything is read from the process environment with development
//! defaults; a missing `DATABASE_URL` is not an error, the service then
//! runs on the in-process fallback store alone.

use config::{Config, Environment};
use mangavault_catalog::{DEFAULT_API_URL, DEFAULT_UPLOADS_URL};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// PostgreSQL connection string. Absent: primary storage is skipped.
    pub database_url: Option<String>,
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub s3_bucket_name: String,
    /// Custom endpoint for S3-compatible services.
    pub s3_endpoint: Option<String>,
    pub mangadx_api_url: String,
    pub mangadx_uploads_url: String,
    pub bind_address: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("aws_region", "us-east-1")?
            .set_default("s3_bucket_name", "manga-vault-storage")?
            .set_default("mangadx_api_url", DEFAULT_API_URL)?
            .set_default("mangadx_uploads_url", DEFAULT_UPLOADS_URL)?
            .set_default("bind_address", "0.0.0.0:5000")?
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }

    /// Render for `mangavault config`, with secrets elided.
    pub fn summary(&self) -> String {
        format!(
            "database_url: {}\n\
             aws_region: {}\n\
             aws_access_key_id: {}\n\
             s3_bucket_name: {}\n\
             s3_endpoint: {}\n\
             mangadx_api_url: {}\n\
             mangadx_uploads_url: {}\n\
             bind_address: {}",
            self.database_url.as_deref().map(|_| "(set)").unwrap_or("(not set)"),
            self.aws_region,
            self.aws_access_key_id
                .as_deref()
                .map(|_| "(set)")
                .unwrap_or("(not set)"),
            self.s3_bucket_name,
            self.s3_endpoint.as_deref().unwrap_or("(default)"),
            self.mangadx_api_url,
            self.mangadx_uploads_url,
            self.bind_address,
        )
    }
}
