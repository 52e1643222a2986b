//! Record types produced by the crawler
//!
//! Column names follow the CSV header used by the per-user artifacts so the
//! same types serialize straight to disk and back.

use serde::{de, Deserialize, Deserializer, Serialize};

/// One film entry from a member's listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmRecord {
    /// Film title from the poster's alt text; None when the markup lacks it
    #[serde(rename = "Title")]
    pub title: Option<String>,

    /// Star rating in half-point steps; None when no glyphs were present
    #[serde(rename = "Rating")]
    pub rating: Option<f64>,

    /// Absolute link to the member's review
    #[serde(rename = "Review URL")]
    pub review_url: Option<String>,

    /// Whether the liked marker was present
    #[serde(rename = "Liked", deserialize_with = "deserialize_flag")]
    pub liked: bool,
}

/// Reads a boolean cell written by any of the usual tabular tools
///
/// Accepts `true`/`false` in any case, `1`/`0`, and an empty cell as false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(de::Error::custom(format!("invalid liked flag '{}'", other))),
    }
}

/// All records harvested for one member, in page then DOM order
#[derive(Debug, Clone, PartialEq)]
pub struct UserDataset {
    pub username: String,
    pub records: Vec<FilmRecord>,
}

impl UserDataset {
    pub fn new(username: impl Into<String>, records: Vec<FilmRecord>) -> Self {
        Self {
            username: username.into(),
            records,
        }
    }

    pub fn empty(username: impl Into<String>) -> Self {
        Self::new(username, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A film record carrying the username it was harvested for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedFilmRecord {
    #[serde(rename = "user")]
    pub username: String,

    #[serde(rename = "Title")]
    pub title: Option<String>,

    #[serde(rename = "Rating")]
    pub rating: Option<f64>,

    #[serde(rename = "Review URL")]
    pub review_url: Option<String>,

    #[serde(rename = "Liked", deserialize_with = "deserialize_flag")]
    pub liked: bool,
}

impl TaggedFilmRecord {
    pub fn new(username: &str, record: FilmRecord) -> Self {
        Self {
            username: username.to_string(),
            title: record.title,
            rating: record.rating,
            review_url: record.review_url,
            liked: record.liked,
        }
    }
}
