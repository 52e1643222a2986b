//! Batch scheduler for crawling many members under a politeness budget
//!
//! This module handles:
//! - Partitioning usernames into fixed-size batches
//! - Running every member of a batch concurrently and joining them all
//! - Persisting each member's dataset as soon as its crawl finishes
//! - Cooling down between strictly sequential batches

use crate::config::{Config, ScheduleConfig};
use crate::crawler::user::{UserCrawl, UserCrawler};
use crate::output::ResultSink;
use crate::state::{CrawlJob, JobState};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Splits `usernames` into ordered batches of `batch_size`
///
/// The final batch may be shorter. A batch size of zero is treated as one.
pub fn partition(usernames: &[String], batch_size: usize) -> Vec<&[String]> {
    usernames.chunks(batch_size.max(1)).collect()
}

/// Drops repeated usernames, keeping the first occurrence of each
pub fn unique_usernames(usernames: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    usernames
        .iter()
        .filter(|username| {
            let first = seen.insert(username.as_str());
            if !first {
                tracing::warn!("Ignoring duplicate username: {}", username);
            }
            first
        })
        .cloned()
        .collect()
}

/// Everything the scheduler observed during one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One job per username, in input order
    pub jobs: Vec<CrawlJob>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Time spent in inter-batch cooldowns
    pub cooldown_total: Duration,

    /// Number of batches executed
    pub batches: usize,
}

impl RunReport {
    pub fn count_in_state(&self, state: JobState) -> usize {
        self.jobs.iter().filter(|job| job.state == state).count()
    }

    pub fn total_records(&self) -> usize {
        self.jobs.iter().map(|job| job.record_count).sum()
    }
}

/// Runs user crawls batch by batch
///
/// Batches never overlap. Within a batch every member is crawled
/// concurrently, so fan-out is bounded by the batch size.
pub struct BatchScheduler {
    crawler: UserCrawler,
    sink: Arc<dyn ResultSink + Send + Sync>,
    batch_size: usize,
    cooldown: Duration,
}

impl BatchScheduler {
    pub fn new(
        crawler: UserCrawler,
        sink: Arc<dyn ResultSink + Send + Sync>,
        schedule: &ScheduleConfig,
    ) -> Self {
        Self {
            crawler,
            sink,
            batch_size: schedule.batch_size.max(1),
            cooldown: schedule.cooldown(),
        }
    }

    pub fn from_config(
        config: &Config,
        sink: Arc<dyn ResultSink + Send + Sync>,
    ) -> Result<Self, crate::HarvestError> {
        let crawler = UserCrawler::from_config(config)?;
        Ok(Self::new(crawler, sink, &config.schedule))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Crawls every username and returns the per-user jobs
    ///
    /// Each username is crawled once per run; later repeats are dropped.
    /// Individual failures never stop a batch or the run. The cooldown is
    /// served after every batch, including the last.
    pub async fn run(&self, usernames: &[String]) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();

        let usernames = unique_usernames(usernames);
        let batches = partition(&usernames, self.batch_size);
        let batch_count = batches.len();
        let mut jobs = Vec::with_capacity(usernames.len());
        let mut cooldown_total = Duration::ZERO;

        for (index, batch) in batches.into_iter().enumerate() {
            tracing::info!(
                "Processing batch {}/{} of {} users...",
                index + 1,
                batch_count,
                batch.len()
            );

            let finished = join_all(batch.iter().map(|username| self.process_user(username))).await;
            jobs.extend(finished);

            tracing::debug!("Batch {} done, cooling down for {:?}", index + 1, self.cooldown);
            tokio::time::sleep(self.cooldown).await;
            cooldown_total += self.cooldown;
        }

        let report = RunReport {
            jobs,
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
            cooldown_total,
            batches: batch_count,
        };

        tracing::info!(
            "Run finished: {} users ({} succeeded, {} failed), {} records in {:?}",
            report.jobs.len(),
            report.count_in_state(JobState::Succeeded),
            report.count_in_state(JobState::Failed),
            report.total_records(),
            report.elapsed
        );

        report
    }

    async fn process_user(&self, username: &str) -> CrawlJob {
        let UserCrawl { dataset, mut job } = self.crawler.crawl(username).await;

        match self.sink.save_user(&dataset) {
            Ok(location) => {
                tracing::info!("Data for {} saved to {}", username, location.display());
            }
            Err(e) => {
                tracing::error!("Failed to save data for {}: {}", username, e);
                job.note_error(format!("save failed: {}", e));
            }
        }

        job
    }
}
