//! Wire shapes of the MangaDx catalog API.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// A per-locale text map, e.g. `{"en": "...", "ja": "..."}`.
///
/// The catalog guarantees nothing about which locales are present, and the
/// fallback rule ("first value present") is defined in terms of wire order,
/// so entries are kept as an ordered list rather than a sorted map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocaleMap(Vec<(String, String)>);

impl LocaleMap {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Value for an exact locale.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == locale)
            .map(|(_, value)| value.as_str())
    }

    /// First value in wire order.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(|(_, value)| value.as_str())
    }

    /// Value for `locale`, falling back to the first value present.
    pub fn preferred(&self, locale: &str) -> Option<&str> {
        self.get(locale).or_else(|| self.first())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for LocaleMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LocaleMapVisitor;

        impl<'de> Visitor<'de> for LocaleMapVisitor {
            type Value = LocaleMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of locale codes to strings")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((locale, value)) = access.next_entry::<String, String>()? {
                    entries.push((locale, value));
                }
                Ok(LocaleMap(entries))
            }
        }

        deserializer.deserialize_map(LocaleMapVisitor)
    }
}

/// A manga as the catalog reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogManga {
    pub id: String,
    pub attributes: CatalogMangaAttributes,
    #[serde(default)]
    pub relationships: Vec<CatalogRelationship>,
}

impl CatalogManga {
    /// Id of the related cover-art entity, when one is attached.
    pub fn cover_art_id(&self) -> Option<&str> {
        self.relationships
            .iter()
            .find(|rel| rel.kind == "cover_art")
            .map(|rel| rel.id.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMangaAttributes {
    #[serde(default)]
    pub title: LocaleMap,
    #[serde(default)]
    pub description: LocaleMap,
    pub status: Option<String>,
    pub year: Option<i32>,
    pub content_rating: Option<String>,
    #[serde(default)]
    pub tags: Vec<CatalogTag>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRelationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTag {
    pub id: String,
    pub attributes: CatalogTagAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogTagAttributes {
    #[serde(default)]
    pub name: LocaleMap,
}

/// A chapter as the catalog's feed endpoint reports it. Chapter and volume
/// numbers come over the wire as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogChapter {
    pub id: String,
    pub attributes: CatalogChapterAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogChapterAttributes {
    pub title: Option<String>,
    pub chapter: Option<String>,
    pub volume: Option<String>,
    pub translated_language: Option<String>,
    pub pages: Option<i32>,
    pub publish_at: Option<String>,
}

/// Cover-art metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogCover {
    pub id: String,
    pub attributes: CatalogCoverAttributes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCoverAttributes {
    pub file_name: String,
}

/// Response of the at-home server endpoint: a session-scoped base URL plus
/// the page file list. The serving host may rotate between sessions, so
/// the URLs this yields must be consumed promptly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtHomeResponse {
    pub base_url: String,
    pub chapter: AtHomeChapter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtHomeChapter {
    pub hash: String,
    #[serde(default)]
    pub data: Vec<String>,
}

impl AtHomeResponse {
    /// Directly fetchable page URLs, in page order.
    pub fn page_urls(&self) -> Vec<String> {
        self.chapter
            .data
            .iter()
            .map(|file| {
                format!(
                    "{}/data/{}/{}",
                    self.base_url.trim_end_matches('/'),
                    self.chapter.hash,
                    file
                )
            })
            .collect()
    }
}
