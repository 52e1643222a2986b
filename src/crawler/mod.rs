//! Crawler module for harvesting film listings
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with rate-limit backoff
//! - Pagination discovery and film record extraction
//! - Per-user page fan-out and batched user scheduling
//! - Popular-member discovery
//! - Overall run coordination

mod coordinator;
mod discovery;
mod fetcher;
mod pagination;
mod parser;
mod records;
mod scheduler;
mod user;

pub use coordinator::{run_harvest, Coordinator, HarvestOutcome};
pub use discovery::{usernames_from_html, PopularUserDiscovery};
pub use fetcher::{build_http_client, format_user_agent, FetchError, PageFetcher, RetryPolicy};
pub use pagination::{page_count_from_html, PaginationResolver};
pub use parser::{convert_star_rating, star_glyphs, FilmRecordExtractor, FULL_STAR, HALF_STAR};
pub use records::{FilmRecord, TaggedFilmRecord, UserDataset};
pub use scheduler::{partition, unique_usernames, BatchScheduler, RunReport};
pub use user::{UserCrawl, UserCrawler};
