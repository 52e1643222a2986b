//! Popular-member discovery
//!
//! Walks the site's popular-members directory page by page and collects
//! unique usernames to feed the batch scheduler.

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::url::{username_from_href, SiteUrls};
use crate::HarvestError;
use scraper::{Html, Selector};
use std::collections::HashSet;

const USERNAME_LINK: &str = "a.name";

/// Extracts usernames from the profile links on a directory page
///
/// Links carrying the `name` class point at `/{username}/`.
pub fn usernames_from_html(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(USERNAME_LINK) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(username_from_href)
        .collect()
}

/// Collects usernames from the popular-members directory
#[derive(Debug, Clone)]
pub struct PopularUserDiscovery {
    site: SiteUrls,
    fetcher: PageFetcher,
    max_pages: u32,
}

impl PopularUserDiscovery {
    pub fn new(site: SiteUrls, fetcher: PageFetcher, max_pages: u32) -> Self {
        Self {
            site,
            fetcher,
            max_pages,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        Ok(Self::new(
            SiteUrls::new(&config.site.origin)?,
            PageFetcher::from_config(config)?,
            config.discovery.max_pages,
        ))
    }

    /// Returns up to `target` unique usernames in first-seen order
    ///
    /// Stops early at the first page without any profile links, or after
    /// `max_pages` pages. Failed pages are logged and skipped.
    pub async fn discover(&self, target: usize) -> Result<Vec<String>, HarvestError> {
        let mut seen = HashSet::new();
        let mut usernames = Vec::new();

        for page in 1..=self.max_pages {
            if usernames.len() >= target {
                break;
            }

            let url = self.site.popular_members_url(page)?;
            let html = match self.fetcher.fetch(url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Error fetching data from {}: {}", url, e);
                    continue;
                }
            };

            let found = usernames_from_html(&html);
            if found.is_empty() {
                tracing::info!("No members listed on page {}, stopping discovery", page);
                break;
            }

            for username in found {
                if seen.insert(username.clone()) {
                    usernames.push(username);
                }
            }

            tracing::debug!(
                "Discovery page {}: {} unique users so far",
                page,
                usernames.len()
            );
        }

        usernames.truncate(target);
        tracing::info!("Discovered {} popular users", usernames.len());
        Ok(usernames)
    }
}
