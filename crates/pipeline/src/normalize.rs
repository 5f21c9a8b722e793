//! Normalization of catalog wire records into local records.
//!
//! Locale reduction happens here, not in the catalog client: prefer the
//! working locale, fall back to the first value in wire order.

use chrono::{DateTime, Utc};

use mangavault_assets::chapter_prefix;
use mangavault_catalog::{CatalogChapter, CatalogManga};
use mangavault_types::{ContentRating, MangaStatus, NewChapter, NewManga};

/// The single working language for titles, descriptions, and chapters.
pub(crate) const WORKING_LOCALE: &str = "en";

/// Reduce a catalog manga to its stored form.
///
/// Unknown status or rating strings normalize leniently (`ongoing`,
/// `safe`) rather than failing resolution; the catalog's domain is wider
/// than ours and a lookup that got this far should not 500 on labels.
pub(crate) fn normalize_manga(
    manga: &CatalogManga,
    cover_image_url: Option<String>,
    cover_image_key: Option<String>,
) -> NewManga {
    let attributes = &manga.attributes;
    NewManga {
        id: manga.id.clone(),
        title: attributes
            .title
            .preferred(WORKING_LOCALE)
            .unwrap_or("Untitled")
            .to_string(),
        description: attributes
            .description
            .preferred(WORKING_LOCALE)
            .map(str::to_string),
        status: attributes
            .status
            .as_deref()
            .and_then(|status| status.parse().ok())
            .unwrap_or(MangaStatus::Ongoing),
        year: attributes.year,
        content_rating: attributes
            .content_rating
            .as_deref()
            .and_then(|rating| rating.parse().ok())
            .unwrap_or(ContentRating::Safe),
        tags: attributes
            .tags
            .iter()
            .filter_map(|tag| tag.attributes.name.preferred(WORKING_LOCALE))
            .map(str::to_string)
            .collect(),
        cover_image_url,
        cover_image_key,
        last_updated: attributes
            .last_updated
            .as_deref()
            .and_then(parse_timestamp),
    }
}

/// Reduce a catalog chapter to its stored form. The wire chapter number
/// is a string and may be fractional; unparseable numbers sort first as
/// zero.
pub(crate) fn normalize_chapter(manga_id: &str, chapter: &CatalogChapter) -> NewChapter {
    let attributes = &chapter.attributes;
    NewChapter {
        id: chapter.id.clone(),
        manga_id: manga_id.to_string(),
        title: attributes.title.clone().filter(|title| !title.is_empty()),
        chapter_number: attributes
            .chapter
            .as_deref()
            .and_then(|number| number.parse().ok())
            .unwrap_or(0.0),
        volume_number: attributes.volume.clone(),
        language: attributes
            .translated_language
            .clone()
            .unwrap_or_else(|| WORKING_LOCALE.to_string()),
        page_count: attributes.pages,
        storage_base_key: Some(chapter_prefix(manga_id, &chapter.id)),
        published_at: attributes.publish_at.as_deref().and_then(parse_timestamp),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangavault_catalog::{
        CatalogChapterAttributes, CatalogMangaAttributes, CatalogTag, CatalogTagAttributes,
        LocaleMap,
    };

    fn locale(pairs: &[(&str, &str)]) -> LocaleMap {
        LocaleMap::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn title_prefers_working_locale_then_first_value() {
        let mut manga = CatalogManga {
            id: "m1".to_string(),
            attributes: CatalogMangaAttributes {
                title: locale(&[("ja", "日本語"), ("en", "English Title")]),
                ..Default::default()
            },
            relationships: Vec::new(),
        };
        assert_eq!(normalize_manga(&manga, None, None).title, "English Title");

        manga.attributes.title = locale(&[("ja", "日本語"), ("fr", "Français")]);
        assert_eq!(normalize_manga(&manga, None, None).title, "日本語");

        manga.attributes.title = locale(&[]);
        assert_eq!(normalize_manga(&manga, None, None).title, "Untitled");
    }

    #[test]
    fn unknown_labels_normalize_leniently() {
        let manga = CatalogManga {
            id: "m1".to_string(),
            attributes: CatalogMangaAttributes {
                title: locale(&[("en", "T")]),
                status: Some("on_break".to_string()),
                content_rating: Some("unlabelled".to_string()),
                ..Default::default()
            },
            relationships: Vec::new(),
        };
        let normalized = normalize_manga(&manga, None, None);
        assert_eq!(normalized.status, MangaStatus::Ongoing);
        assert_eq!(normalized.content_rating, ContentRating::Safe);
    }

    #[test]
    fn tags_reduce_like_titles() {
        let manga = CatalogManga {
            id: "m1".to_string(),
            attributes: CatalogMangaAttributes {
                title: locale(&[("en", "T")]),
                tags: vec![
                    CatalogTag {
                        id: "t1".to_string(),
                        attributes: CatalogTagAttributes {
                            name: locale(&[("en", "Action")]),
                        },
                    },
                    CatalogTag {
                        id: "t2".to_string(),
                        attributes: CatalogTagAttributes {
                            name: locale(&[("ja", "冒険")]),
                        },
                    },
                ],
                ..Default::default()
            },
            relationships: Vec::new(),
        };
        assert_eq!(normalize_manga(&manga, None, None).tags, vec!["Action", "冒険"]);
    }

    #[test]
    fn chapter_numbers_parse_fractions() {
        let chapter = CatalogChapter {
            id: "c1".to_string(),
            attributes: CatalogChapterAttributes {
                chapter: Some("5.5".to_string()),
                pages: Some(20),
                publish_at: Some("2023-06-01T00:00:00+00:00".to_string()),
                ..Default::default()
            },
        };
        let normalized = normalize_chapter("m1", &chapter);
        assert_eq!(normalized.chapter_number, 5.5);
        assert_eq!(normalized.language, "en");
        assert_eq!(
            normalized.storage_base_key.as_deref(),
            Some("manga/m1/chapters/c1")
        );
        assert!(normalized.published_at.is_some());
    }

    #[test]
    fn oneshot_chapters_sort_as_zero() {
        let chapter = CatalogChapter {
            id: "c1".to_string(),
            attributes: CatalogChapterAttributes {
                chapter: Some("Oneshot".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(normalize_chapter("m1", &chapter).chapter_number, 0.0);
    }
}
