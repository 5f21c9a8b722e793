//! Deterministic object keys.
//!
//! Keys are pure functions of the catalog ids so that existence checks,
//! uploads, and signed reads all agree without coordination.

/// Key under which a manga's cover image is stored.
pub fn cover_key(manga_id: &str) -> String {
    format!("manga/{manga_id}/cover.jpg")
}

/// Prefix under which a chapter's pages are stored.
pub fn chapter_prefix(manga_id: &str, chapter_id: &str) -> String {
    format!("manga/{manga_id}/chapters/{chapter_id}")
}

/// Key of a single page image. Page numbers are 1-based and zero-padded
/// to three digits so keys sort in page order.
pub fn page_key(manga_id: &str, chapter_id: &str, page_number: i32) -> String {
    format!("manga/{manga_id}/chapters/{chapter_id}/pages/{page_number:03}.jpg")
}
