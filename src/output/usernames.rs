//! Username list files
//!
//! A single-column CSV with a `user` header, used both as crawl input and
//! for the list of skipped users.

use crate::output::traits::OutputResult;
use crate::url::validate_username;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    user: String,
}

/// Reads usernames from a `user` column
///
/// Blank cells are ignored, as are names that are not valid path segments.
pub fn read_usernames(path: &Path) -> OutputResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let mut usernames = Vec::new();
    for row in reader.deserialize::<UserRow>() {
        let row = row?;
        if row.user.is_empty() {
            continue;
        }
        if validate_username(&row.user).is_err() {
            tracing::warn!("Ignoring invalid username {:?} in {}", row.user, path.display());
            continue;
        }
        usernames.push(row.user);
    }

    Ok(usernames)
}

/// Writes `usernames` under a `user` header
pub fn write_usernames(path: &Path, usernames: &[String]) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for user in usernames {
        writer.serialize(UserRow { user: user.clone() })?;
    }
    if usernames.is_empty() {
        writer.write_record(["user"])?;
    }
    writer.flush()?;
    Ok(())
}
