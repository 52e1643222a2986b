//! Per-member crawl: pagination, bounded page fan-out and aggregation

use crate::config::{Config, ScheduleConfig};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pagination::PaginationResolver;
use crate::crawler::parser::FilmRecordExtractor;
use crate::crawler::records::{FilmRecord, UserDataset};
use crate::state::{CrawlJob, JobState};
use crate::url::SiteUrls;
use crate::HarvestError;
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::time::Duration;

/// Result of crawling one member
#[derive(Debug, Clone)]
pub struct UserCrawl {
    pub dataset: UserDataset,
    pub job: CrawlJob,
}

/// Crawls every listing page of one member
///
/// Page fetches run concurrently up to `max_concurrent_pages`; a failed page
/// contributes no records but never aborts the crawl.
#[derive(Debug, Clone)]
pub struct UserCrawler {
    site: SiteUrls,
    fetcher: PageFetcher,
    resolver: PaginationResolver,
    extractor: FilmRecordExtractor,
    max_concurrent_pages: usize,
    courtesy_delay_ms: (u64, u64),
}

impl UserCrawler {
    pub fn new(
        site: SiteUrls,
        fetcher: PageFetcher,
        schedule: &ScheduleConfig,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            resolver: PaginationResolver::new(fetcher.clone()),
            extractor: FilmRecordExtractor::new(site.clone())?,
            site,
            fetcher,
            max_concurrent_pages: schedule.max_concurrent_pages.max(1),
            courtesy_delay_ms: (
                schedule.courtesy_delay_min_ms,
                schedule.courtesy_delay_max_ms,
            ),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let site = SiteUrls::new(&config.site.origin)?;
        let fetcher = PageFetcher::from_config(config)?;
        Self::new(site, fetcher, &config.schedule)
    }

    /// Harvests all of `username`'s listing pages
    ///
    /// Always returns a dataset, possibly empty. The job ends Succeeded when
    /// at least one page was fetched and Failed otherwise. The courtesy delay
    /// is served before returning.
    pub async fn crawl(&self, username: &str) -> UserCrawl {
        tracing::info!("Scraping data for user: {}", username);

        let mut job = CrawlJob::new(username, "");
        let records = match self.crawl_pages(&mut job).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Crawl of {} aborted: {}", username, e);
                job.note_error(e.to_string());
                Vec::new()
            }
        };

        job.record_count = records.len();
        let outcome = if job.failed_pages < job.total_pages {
            JobState::Succeeded
        } else {
            JobState::Failed
        };
        if let Err(e) = job.transition(outcome) {
            tracing::warn!("Job for {} left in {}: {}", username, job.state, e);
        }

        tracing::info!(
            "Finished {}: {} records from {} page(s), {} failed",
            username,
            job.record_count,
            job.total_pages,
            job.failed_pages
        );

        self.courtesy_pause().await;

        UserCrawl {
            dataset: UserDataset::new(username, records),
            job,
        }
    }

    async fn crawl_pages(&self, job: &mut CrawlJob) -> Result<Vec<FilmRecord>, HarvestError> {
        job.transition(JobState::Running)?;

        let username = job.username.clone();
        let base_url = self.site.films_url(&username)?;
        job.base_url = base_url.to_string();

        let total_pages = self.resolver.resolve(base_url.as_str()).await;
        job.total_pages = total_pages;

        // `buffered` keeps results in page order while bounding concurrency
        let pages: Vec<(u32, Result<Vec<FilmRecord>, HarvestError>)> = stream::iter(1..=total_pages)
            .map(|page| {
                let username = username.as_str();
                async move { (page, self.scrape_page(username, page).await) }
            })
            .buffered(self.max_concurrent_pages)
            .collect()
            .await;

        let mut records = Vec::new();
        for (page, result) in pages {
            match result {
                Ok(page_records) => records.extend(page_records),
                Err(e) => {
                    tracing::warn!("Page {} of {} contributed nothing: {}", page, username, e);
                    job.failed_pages += 1;
                    job.note_error(e.to_string());
                }
            }
        }

        Ok(records)
    }

    /// Fetches and extracts a single listing page
    pub async fn scrape_page(
        &self,
        username: &str,
        page: u32,
    ) -> Result<Vec<FilmRecord>, HarvestError> {
        let url = self.site.films_page_url(username, page)?;
        tracing::debug!("Scraping page {} of {}", page, username);

        let html = self.fetcher.fetch(url.as_str()).await?;
        Ok(self.extractor.extract(&html))
    }

    /// Draws the pause served after a member's crawl
    ///
    /// Uniform over the configured range; a minimum above the maximum is
    /// lowered to the maximum.
    pub fn courtesy_delay(&self) -> Duration {
        let (min, max) = self.courtesy_delay_ms;
        if max == 0 {
            return Duration::ZERO;
        }
        let millis = rand::rng().random_range(min.min(max)..=max);
        Duration::from_millis(millis)
    }

    async fn courtesy_pause(&self) {
        let delay = self.courtesy_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
