//! HTML parser for extracting film records from listing pages
//!
//! Each listing page holds a grid of poster entries. For every entry this
//! module extracts:
//! - The film title (poster image alt text)
//! - The member's star rating, decoded from glyphs
//! - A link to the member's review, if one exists
//! - Whether the member marked the film as liked

use crate::crawler::records::FilmRecord;
use crate::url::SiteUrls;
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};

/// Glyph for one full star
pub const FULL_STAR: char = '★';

/// Glyph for a trailing half star
pub const HALF_STAR: char = '½';

const FILM_ENTRY: &str = "li.poster-container";
const POSTER_IMAGE: &str = "img";
const RATING: &str = "span.rating";
const REVIEW_LINK: &str = "a.review-micro";
const LIKED_MARKER: &str = "span.like.liked-micro";

/// Converts a star glyph string such as `★★★½` into a numeric rating
///
/// Returns None for absent or blank input and for text carrying no glyphs.
///
/// # Example
///
/// ```
/// use reel_harvest::crawler::convert_star_rating;
///
/// assert_eq!(convert_star_rating(Some("★★★½")), Some(3.5));
/// assert_eq!(convert_star_rating(Some("★")), Some(1.0));
/// assert_eq!(convert_star_rating(None), None);
/// ```
pub fn convert_star_rating(text: Option<&str>) -> Option<f64> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }

    let full = text.chars().filter(|c| *c == FULL_STAR).count();
    let half = text.contains(HALF_STAR);

    if full == 0 && !half {
        return None;
    }

    Some(full as f64 + if half { 0.5 } else { 0.0 })
}

/// Renders a rating as star glyphs, rounding to the nearest half star
///
/// A rating of zero has no glyph form and renders as an empty string.
pub fn star_glyphs(rating: f64) -> String {
    let halves = (rating.clamp(0.0, 5.0) * 2.0).round() as usize;
    let mut glyphs: String = std::iter::repeat(FULL_STAR).take(halves / 2).collect();
    if halves % 2 == 1 {
        glyphs.push(HALF_STAR);
    }
    glyphs
}

/// Parses listing pages into film records
#[derive(Debug, Clone)]
pub struct FilmRecordExtractor {
    site: SiteUrls,
    entry: Selector,
    poster_image: Selector,
    rating: Selector,
    review_link: Selector,
    liked_marker: Selector,
}

impl FilmRecordExtractor {
    /// Creates an extractor resolving review links against `site`
    pub fn new(site: SiteUrls) -> Result<Self, HarvestError> {
        Ok(Self {
            site,
            entry: compile(FILM_ENTRY)?,
            poster_image: compile(POSTER_IMAGE)?,
            rating: compile(RATING)?,
            review_link: compile(REVIEW_LINK)?,
            liked_marker: compile(LIKED_MARKER)?,
        })
    }

    /// Extracts every film entry on the page, in document order
    ///
    /// Entries are never filtered here: an entry without a rating or a liked
    /// marker still yields a record.
    pub fn extract(&self, html: &str) -> Vec<FilmRecord> {
        let document = Html::parse_document(html);

        document
            .select(&self.entry)
            .map(|entry| self.extract_entry(entry))
            .collect()
    }

    fn extract_entry(&self, entry: ElementRef<'_>) -> FilmRecord {
        let title = entry
            .select(&self.poster_image)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .map(str::to_string);

        let rating_text = entry
            .select(&self.rating)
            .next()
            .map(|span| span.text().collect::<String>());
        let rating = convert_star_rating(rating_text.as_deref());

        let review_url = entry
            .select(&self.review_link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| self.site.absolutize(href));

        let liked = entry.select(&self.liked_marker).next().is_some();

        FilmRecord {
            title,
            rating,
            review_url,
            liked,
        }
    }
}

fn compile(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
