//! Output module for persisting harvested datasets
//!
//! This module handles:
//! - Writing one CSV per user as soon as that user's crawl finishes
//! - Merging the per-user files into one tagged dataset
//! - Reading and writing username lists
//! - Summarizing a finished run

mod csv_sink;
pub mod stats;
mod traits;
mod usernames;

pub use csv_sink::{
    merge_directory, read_user_file, write_aggregate, write_user_file, CsvSink, USER_FILE_SUFFIX,
};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{AggregateDataset, OutputError, OutputResult, ResultSink};
pub use usernames::{read_usernames, write_usernames};
