//! Harvest coordinator - top-level run orchestration
//!
//! Wires the configuration into a scheduler and a CSV sink, runs the crawl
//! over a list of usernames, then merges whatever landed on disk.

use crate::config::Config;
use crate::crawler::scheduler::{BatchScheduler, RunReport};
use crate::output::{AggregateDataset, CsvSink, ResultSink};
use crate::HarvestError;
use std::sync::Arc;

/// Crawl report plus the merged dataset built from disk afterwards
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub report: RunReport,
    pub aggregate: AggregateDataset,
}

/// Owns the scheduler and the sink for one harvest run
pub struct Coordinator {
    scheduler: BatchScheduler,
    sink: Arc<CsvSink>,
}

impl Coordinator {
    /// Builds the HTTP client, crawler, scheduler and sink from `config`
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let sink = Arc::new(CsvSink::from_config(&config.output)?);
        let scheduler = BatchScheduler::from_config(config, sink.clone())?;
        Ok(Self { scheduler, sink })
    }

    pub fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }

    /// Crawls `usernames` and merges the per-user files
    pub async fn run(&self, usernames: &[String]) -> Result<HarvestOutcome, HarvestError> {
        tracing::info!(
            "Starting harvest of {} users in batches of {}",
            usernames.len(),
            self.scheduler.batch_size()
        );

        let report = self.scheduler.run(usernames).await;
        let aggregate = self.sink.merge_all()?;

        Ok(HarvestOutcome { report, aggregate })
    }
}

/// Runs a complete harvest: crawl every user, then merge
///
/// # Example
///
/// ```no_run
/// use reel_harvest::config::load_config;
/// use reel_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let users = vec!["alice".to_string(), "bob".to_string()];
/// let outcome = run_harvest(&config, &users).await?;
/// println!("{} rows merged", outcome.aggregate.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: &Config,
    usernames: &[String],
) -> Result<HarvestOutcome, HarvestError> {
    Coordinator::new(config)?.run(usernames).await
}
