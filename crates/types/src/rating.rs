//! Content rating classification and the adult/regular visibility partition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content rating reported by the catalog for a manga.
///
/// The four values are split into two disjoint visibility partitions:
/// every rating belongs to exactly one of them, and listing operations
/// only ever serve one partition per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
    Pornographic,
}

impl ContentRating {
    /// Every defined rating value.
    pub const ALL: [ContentRating; 4] = [
        ContentRating::Safe,
        ContentRating::Suggestive,
        ContentRating::Erotica,
        ContentRating::Pornographic,
    ];

    /// Whether this rating belongs to the adult partition.
    pub fn is_adult(self) -> bool {
        matches!(self, ContentRating::Erotica | ContentRating::Pornographic)
    }

    /// The ratings visible in the given mode.
    pub fn partition(adult: bool) -> &'static [ContentRating] {
        if adult {
            &[ContentRating::Erotica, ContentRating::Pornographic]
        } else {
            &[ContentRating::Safe, ContentRating::Suggestive]
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentRating::Safe => "safe",
            ContentRating::Suggestive => "suggestive",
            ContentRating::Erotica => "erotica",
            ContentRating::Pornographic => "pornographic",
        }
    }
}

impl fmt::Display for ContentRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentRating {
    type Err = UnknownContentRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(ContentRating::Safe),
            "suggestive" => Ok(ContentRating::Suggestive),
            "erotica" => Ok(ContentRating::Erotica),
            "pornographic" => Ok(ContentRating::Pornographic),
            other => Err(UnknownContentRating(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized content rating value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentRating(pub String);

impl fmt::Display for UnknownContentRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown content rating: {}", self.0)
    }
}

impl std::error::Error for UnknownContentRating {}
