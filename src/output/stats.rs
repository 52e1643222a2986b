//! Statistics generation from a finished run
//!
//! This module condenses a `RunReport` and the merged aggregate into
//! numbers worth printing at the end of a harvest.

use crate::crawler::RunReport;
use crate::output::AggregateDataset;
use crate::state::JobState;
use std::collections::HashMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of users scheduled
    pub total_users: usize,

    /// Count of users by final job state
    pub users_by_state: HashMap<JobState, usize>,

    /// Records extracted across all users
    pub total_records: usize,

    /// Listing pages across all users, including failed ones
    pub total_pages: u64,

    /// Listing pages that could not be fetched
    pub failed_pages: u64,

    /// Users that finished with zero records
    pub empty_users: usize,

    pub batches: usize,
    pub elapsed: Duration,
    pub cooldown_total: Duration,

    /// Rows in the merged dataset, when a merge ran
    pub aggregate_rows: Option<usize>,

    /// Last error recorded for each failed user
    pub failures: Vec<(String, String)>,
}

impl CrawlStatistics {
    /// Builds statistics from a run report
    pub fn from_report(report: &RunReport) -> Self {
        let mut users_by_state = HashMap::new();
        for state in JobState::all_states() {
            let count = report.count_in_state(state);
            if count > 0 {
                users_by_state.insert(state, count);
            }
        }

        let failures = report
            .jobs
            .iter()
            .filter(|job| job.state == JobState::Failed)
            .map(|job| {
                (
                    job.username.clone(),
                    job.last_error.clone().unwrap_or_default(),
                )
            })
            .collect();

        Self {
            total_users: report.jobs.len(),
            users_by_state,
            total_records: report.total_records(),
            total_pages: report.jobs.iter().map(|j| u64::from(j.total_pages)).sum(),
            failed_pages: report.jobs.iter().map(|j| u64::from(j.failed_pages)).sum(),
            empty_users: report.jobs.iter().filter(|j| j.record_count == 0).count(),
            batches: report.batches,
            elapsed: report.elapsed,
            cooldown_total: report.cooldown_total,
            aggregate_rows: None,
            failures,
        }
    }

    /// Attaches the size of the merged dataset
    pub fn with_aggregate(mut self, aggregate: &AggregateDataset) -> Self {
        self.aggregate_rows = Some(aggregate.len());
        self
    }

    pub fn users_in(&self, state: JobState) -> usize {
        self.users_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Share of users whose crawl succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_users == 0 {
            return 0.0;
        }
        (self.users_in(JobState::Succeeded) as f64 / self.total_users as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Users scheduled: {}", stats.total_users);
    println!("  Batches: {}", stats.batches);
    println!("  Records extracted: {}", stats.total_records);
    if let Some(rows) = stats.aggregate_rows {
        println!("  Rows in combined dataset: {}", rows);
    }
    println!(
        "  Elapsed: {:.1}s (cooldown {:.1}s)",
        stats.elapsed.as_secs_f64(),
        stats.cooldown_total.as_secs_f64()
    );
    println!();

    println!("Users by State:");
    let mut state_counts: Vec<_> = stats.users_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));
    for (state, count) in state_counts {
        println!("  {}: {}", state, count);
    }
    println!("  (with no records: {})", stats.empty_users);
    println!();

    println!(
        "Pages: {} fetched, {} failed",
        stats.total_pages - stats.failed_pages,
        stats.failed_pages
    );

    if !stats.failures.is_empty() {
        println!("\nFailed Users ({}):", stats.failures.len());
        for (user, error) in &stats.failures {
            println!("  - {}: {}", user, error);
        }
    }

    println!(
        "\nSuccess Rate: {:.1}% ({} / {} users)",
        stats.success_rate(),
        stats.users_in(JobState::Succeeded),
        stats.total_users
    );
}
