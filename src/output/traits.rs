//! Result sink trait and types
//!
//! This module defines the trait interface for persisting harvested
//! datasets and the merged aggregate built from them.

use crate::crawler::{TaggedFilmRecord, UserDataset};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Username-tagged union of every non-empty per-user dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateDataset {
    /// Rows in file enumeration order, each user's rows in their original order
    pub rows: Vec<TaggedFilmRecord>,

    /// Users whose datasets held no records
    pub skipped: Vec<String>,

    /// Users whose files could not be read, or whose every row was rejected
    pub unreadable: Vec<String>,
}

impl AggregateDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct usernames present in the rows, in first-seen order
    pub fn users(&self) -> Vec<&str> {
        let mut users: Vec<&str> = Vec::new();
        for row in &self.rows {
            if users.last() != Some(&row.username.as_str()) {
                users.push(&row.username);
            }
        }
        users
    }
}

/// Trait for result sinks
///
/// A sink stores one artifact per user and can later rebuild the aggregate
/// from those artifacts alone, independently of any crawl in memory.
pub trait ResultSink {
    /// Persists one user's dataset, including the empty case
    ///
    /// # Returns
    ///
    /// Where the artifact was written
    fn save_user(&self, dataset: &UserDataset) -> OutputResult<PathBuf>;

    /// Merges every stored dataset into one aggregate and persists it
    fn merge_all(&self) -> OutputResult<AggregateDataset>;
}
