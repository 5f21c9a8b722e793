//! Read-only client for the remote MangaDx catalog.
//!
//! This crate maps the catalog's wire shapes into plain structs and exposes
//! the [`Catalog`] trait as the seam the resolution pipeline depends on.
//! It performs no normalization beyond deserialization: per-locale maps are
//! handed to the caller as-is, in wire order.

mod client;
mod error;
mod traits;
mod wire;

pub use client::{DEFAULT_API_URL, DEFAULT_UPLOADS_URL, MangaDxClient};
pub use error::{CatalogError, Result};
pub use traits::{Catalog, CoverSize};
pub use wire::{
    AtHomeChapter, AtHomeResponse, CatalogChapter, CatalogChapterAttributes, CatalogCover,
    CatalogCoverAttributes, CatalogManga, CatalogMangaAttributes, CatalogRelationship, CatalogTag,
    CatalogTagAttributes, LocaleMap,
};
