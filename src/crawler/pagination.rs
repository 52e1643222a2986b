//! Total page discovery for a member's listing

use crate::crawler::fetcher::PageFetcher;
use scraper::{Html, Selector};

/// Reads the page count from a listing's pagination control
///
/// The count is the numeric text of the last link inside `div.pagination`.
/// A missing control, a non-numeric last link or a zero all give 1.
pub fn page_count_from_html(html: &str) -> u32 {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("div.pagination a") else {
        return 1;
    };

    document
        .select(&selector)
        .last()
        .and_then(|link| {
            link.text()
                .collect::<String>()
                .trim()
                .replace(',', "")
                .parse::<u32>()
                .ok()
        })
        .filter(|count| *count >= 1)
        .unwrap_or(1)
}

/// Discovers how many listing pages a member has
#[derive(Debug, Clone)]
pub struct PaginationResolver {
    fetcher: PageFetcher,
}

impl PaginationResolver {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetches the first listing page at `base_url` and returns its page count
    ///
    /// Never fails: a failed fetch falls back to a single page so the crawl
    /// still attempts page 1.
    pub async fn resolve(&self, base_url: &str) -> u32 {
        match self.fetcher.fetch(base_url).await {
            Ok(html) => {
                let pages = page_count_from_html(&html);
                tracing::debug!("{} has {} listing page(s)", base_url, pages);
                pages
            }
            Err(e) => {
                tracing::warn!("Could not resolve pagination, assuming 1 page: {}", e);
                1
            }
        }
    }
}
