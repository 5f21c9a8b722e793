//! Shared record types for the MangaVault storage and resolution crates.
//!
//! Everything here is plain data: the structured records persisted by the
//! storage tiers and served over the API, plus the closed enums they carry.
//! Wire serialization is camelCase for records and lowercase for enums.

mod rating;
mod records;

pub use rating::{ContentRating, UnknownContentRating};
pub use records::{
    ChapterRecord, ChapterUpdate, MangaRecord, MangaStats, MangaStatus, MangaUpdate, NewChapter,
    NewManga, NewUser, UnknownMangaStatus, User,
};
