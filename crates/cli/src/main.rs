mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use mangavault_api::{AppState, router};
use mangavault_assets::S3AssetStore;
use mangavault_catalog::MangaDxClient;
use mangavault_pipeline::ResolutionPipeline;
use mangavault_storage::{FailoverStorage, MangaStore, PostgresStorage};

use crate::cli::{Cli, Commands};
use crate::config::Settings;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match cli.command {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Config => {
            println!("{}", Settings::from_env()?.summary());
            Ok(())
        }
    }
}

async fn serve(bind_override: Option<String>) -> eyre::Result<()> {
    let settings = Settings::from_env()?;

    let primary = connect_primary(&settings).await;
    let storage = Arc::new(FailoverStorage::with_memory_fallback(primary));

    let catalog = Arc::new(MangaDxClient::with_urls(
        &settings.mangadx_api_url,
        &settings.mangadx_uploads_url,
    )?);

    let assets = Arc::new(S3AssetStore::new(
        settings.s3_bucket_name.clone(),
        settings.aws_region.clone(),
        settings.aws_access_key_id.clone().unwrap_or_default(),
        settings.aws_secret_access_key.clone().unwrap_or_default(),
        settings.s3_endpoint.clone(),
    )?);

    let pipeline = Arc::new(ResolutionPipeline::new(
        storage as Arc<dyn MangaStore>,
        catalog,
        assets,
    ));
    let app = router(AppState { pipeline });

    let bind = bind_override.unwrap_or(settings.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(%bind, "mangavault listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Connect the primary store if a database is configured. Any failure
/// here degrades to fallback-only operation instead of aborting startup.
async fn connect_primary(settings: &Settings) -> Option<Arc<dyn MangaStore>> {
    let Some(url) = &settings.database_url else {
        warn!("DATABASE_URL is not set; serving from in-process fallback storage");
        return None;
    };
    match PostgresStorage::connect(url).await {
        Ok(storage) => {
            if let Err(error) = storage.apply_schema().await {
                warn!(%error, "could not apply database schema; operations will fail over until the database recovers");
            }
            Some(Arc::new(storage))
        }
        Err(error) => {
            warn!(%error, "database unavailable; serving from in-process fallback storage");
            None
        }
    }
}
