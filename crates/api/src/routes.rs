//! Route definitions and handlers.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use mangavault_pipeline::{ChapterPages, ResolutionPipeline, SearchOutcome};
use mangavault_types::{ChapterRecord, ContentRating, MangaRecord};

use crate::error::ApiError;

const DEFAULT_LIMIT: u32 = 20;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ResolutionPipeline>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/manga/search", get(search_manga))
        .route("/api/manga/popular", get(popular_manga))
        .route("/api/manga/recent", get(recent_manga))
        .route("/api/manga/by-rating", get(manga_by_rating))
        .route("/api/manga/{id}", get(manga_by_id))
        .route("/api/manga/{id}/chapters", get(manga_chapters))
        .route("/api/chapters/{id}/pages", get(chapter_pages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
    adult: Option<bool>,
}

async fn search_manga(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let Some(query) = params.q.filter(|q| !q.is_empty()) else {
        return Err(ApiError::bad_request("Search query is required"));
    };
    let outcome = state
        .pipeline
        .search_manga(
            &query,
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.offset.unwrap_or(0),
            params.adult.unwrap_or(false),
        )
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to search manga"))?;
    Ok(Json(outcome))
}

async fn manga_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MangaRecord>, ApiError> {
    let manga = state
        .pipeline
        .get_manga(&id)
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to fetch manga"))?;
    Ok(Json(manga))
}

async fn manga_chapters(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChapterRecord>>, ApiError> {
    let chapters = state
        .pipeline
        .get_chapters(&id)
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to fetch chapters"))?;
    Ok(Json(chapters))
}

async fn chapter_pages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChapterPages>, ApiError> {
    let pages = state
        .pipeline
        .get_chapter_pages(&id)
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to fetch chapter pages"))?;
    Ok(Json(pages))
}

#[derive(Debug, Deserialize)]
struct ListingParams {
    limit: Option<u32>,
    adult: Option<bool>,
}

async fn popular_manga(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Vec<MangaRecord>>, ApiError> {
    let manga = state
        .pipeline
        .get_popular(
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.adult.unwrap_or(false),
        )
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to fetch popular manga"))?;
    Ok(Json(manga))
}

async fn recent_manga(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Vec<MangaRecord>>, ApiError> {
    let manga = state
        .pipeline
        .get_recent(
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.adult.unwrap_or(false),
        )
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to fetch recent manga"))?;
    Ok(Json(manga))
}

#[derive(Debug, Deserialize)]
struct RatingParams {
    ratings: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

/// Parse the comma-separated `ratings` parameter; empty or unknown
/// values are client errors.
fn parse_ratings(raw: &str) -> Result<Vec<ContentRating>, ApiError> {
    let ratings = raw
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<ContentRating>()
                .map_err(|_| ApiError::bad_request(format!("Unknown content rating: {value}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ratings.is_empty() {
        return Err(ApiError::bad_request("Content ratings are required"));
    }
    Ok(ratings)
}

async fn manga_by_rating(
    State(state): State<AppState>,
    Query(params): Query<RatingParams>,
) -> Result<Json<Vec<MangaRecord>>, ApiError> {
    let Some(raw) = params.ratings else {
        return Err(ApiError::bad_request("Content ratings are required"));
    };
    let ratings = parse_ratings(&raw)?;
    let manga = state
        .pipeline
        .get_by_rating(
            &ratings,
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.offset.unwrap_or(0),
        )
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to fetch manga by content rating"))?;
    Ok(Json(manga))
}
