//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `JobState`: lifecycle of one user crawl (pending, running, succeeded, failed)
//! - `CrawlJob`: per-user bookkeeping carried into the run report

mod crawl_job;
mod job_state;

// Re-export main types
pub use crawl_job::CrawlJob;
pub use job_state::JobState;
