//! CSV-backed result sink
//!
//! One `{username}_film_data.csv` per user in the data directory, a merged
//! CSV with a leading `user` column, and a one-column list of skipped users.

use crate::config::OutputConfig;
use crate::crawler::{FilmRecord, TaggedFilmRecord, UserDataset};
use crate::output::traits::{AggregateDataset, OutputError, OutputResult, ResultSink};
use crate::output::usernames::write_usernames;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// File name suffix identifying per-user datasets
pub const USER_FILE_SUFFIX: &str = "_film_data.csv";

const USER_HEADER: [&str; 4] = ["Title", "Rating", "Review URL", "Liked"];
const AGGREGATE_HEADER: [&str; 5] = ["user", "Title", "Rating", "Review URL", "Liked"];

/// Result sink writing CSV files
#[derive(Debug, Clone)]
pub struct CsvSink {
    data_dir: PathBuf,
    aggregate_path: PathBuf,
    skipped_path: PathBuf,
}

impl CsvSink {
    /// Creates the sink, making sure the data directory exists
    pub fn new(
        data_dir: impl Into<PathBuf>,
        aggregate_path: impl Into<PathBuf>,
        skipped_path: impl Into<PathBuf>,
    ) -> OutputResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            data_dir,
            aggregate_path: aggregate_path.into(),
            skipped_path: skipped_path.into(),
        })
    }

    pub fn from_config(config: &OutputConfig) -> OutputResult<Self> {
        Self::new(&config.data_dir, &config.aggregate_path, &config.skipped_path)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the artifact for `username`
    pub fn user_path(&self, username: &str) -> PathBuf {
        self.data_dir.join(format!("{}{}", username, USER_FILE_SUFFIX))
    }
}

impl ResultSink for CsvSink {
    fn save_user(&self, dataset: &UserDataset) -> OutputResult<PathBuf> {
        let path = self.user_path(&dataset.username);
        write_user_file(&path, &dataset.records)?;
        Ok(path)
    }

    fn merge_all(&self) -> OutputResult<AggregateDataset> {
        let aggregate = merge_directory(&self.data_dir)?;

        if aggregate.is_empty() {
            tracing::warn!("No data to combine, all {} files were empty", aggregate.skipped.len());
        }
        write_aggregate(&self.aggregate_path, &aggregate)?;
        tracing::info!(
            "Combined {} rows from {} users into {}",
            aggregate.len(),
            aggregate.users().len(),
            self.aggregate_path.display()
        );

        // Rewritten every run so a previous run's list never lingers
        write_usernames(&self.skipped_path, &aggregate.skipped)?;
        if !aggregate.skipped.is_empty() {
            tracing::info!(
                "Skipped {} empty datasets, listed in {}",
                aggregate.skipped.len(),
                self.skipped_path.display()
            );
        }

        if !aggregate.unreadable.is_empty() {
            tracing::warn!(
                "Could not read datasets for {} users: {}",
                aggregate.unreadable.len(),
                aggregate.unreadable.join(", ")
            );
        }

        Ok(aggregate)
    }
}

/// Writes one user's records; the header is written even with no records
pub fn write_user_file(path: &Path, records: &[FilmRecord]) -> OutputResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);

    writer.write_record(USER_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads one user's records back from disk
///
/// A zero-byte or header-only file yields no records. Rows that do not
/// parse are logged and left out.
pub fn read_user_file(path: &Path) -> OutputResult<Vec<FilmRecord>> {
    Ok(load_user_file(path)?.records)
}

struct UserFile {
    records: Vec<FilmRecord>,
    rejected: usize,
}

fn load_user_file(path: &Path) -> OutputResult<UserFile> {
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;

    let mut file = UserFile {
        records: Vec::new(),
        rejected: 0,
    };
    for row in reader.deserialize::<FilmRecord>() {
        match row {
            Ok(record) => file.records.push(record),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Skipping bad row in {}: {}", path.display(), e);
                file.rejected += 1;
            }
        }
    }

    Ok(file)
}

/// Merges every `*_film_data.csv` in `dir` into a tagged aggregate
///
/// Files are visited in file-name order. Files without records are listed
/// as skipped. Files that cannot be read, or whose rows were all rejected,
/// are listed as unreadable. Neither contributes rows.
pub fn merge_directory(dir: &Path) -> OutputResult<AggregateDataset> {
    let mut files: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let username = name.strip_suffix(USER_FILE_SUFFIX)?.to_string();
            Some((name, username))
        })
        .map(|(name, username)| (username, dir.join(name)))
        .collect();
    files.sort_by(|a, b| a.1.cmp(&b.1));

    let mut aggregate = AggregateDataset::new();

    for (username, path) in files {
        match load_user_file(&path) {
            Ok(file) if file.records.is_empty() && file.rejected > 0 => {
                tracing::warn!(
                    "Every row of {} was rejected ({} rows)",
                    path.display(),
                    file.rejected
                );
                aggregate.unreadable.push(username);
            }
            Ok(file) if file.records.is_empty() => {
                tracing::debug!("Skipping empty file: {}", path.display());
                aggregate.skipped.push(username);
            }
            Ok(file) => {
                aggregate.rows.extend(
                    file.records
                        .into_iter()
                        .map(|record| TaggedFilmRecord::new(&username, record)),
                );
            }
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                aggregate.unreadable.push(username);
            }
        }
    }

    Ok(aggregate)
}

/// Writes the aggregate with its leading `user` column
pub fn write_aggregate(path: &Path, aggregate: &AggregateDataset) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);

    writer.write_record(AGGREGATE_HEADER)?;
    for row in &aggregate.rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .map_err(|e| OutputError::Write(format!("{}: {}", path.display(), e)))?;
    Ok(())
}
