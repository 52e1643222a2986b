//! Integration tests for merging per-user datasets from disk

use crate::common::create_test_config;
use reel_harvest::crawler::{FilmRecord, UserDataset};
use reel_harvest::output::{merge_directory, CsvSink, ResultSink};
use std::fs;
use tempfile::TempDir;

fn film(title: &str, rating: Option<f64>) -> FilmRecord {
    FilmRecord {
        title: Some(title.to_string()),
        rating,
        review_url: None,
        liked: false,
    }
}

#[test]
fn test_merge_one_empty_one_populated() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config("https://letterboxd.com", dir.path());
    let sink = CsvSink::from_config(&config.output).expect("Failed to create sink");

    sink.save_user(&UserDataset::empty("quiet"))
        .expect("Failed to save empty dataset");
    sink.save_user(&UserDataset::new(
        "busy",
        vec![
            film("Heat", Some(4.5)),
            film("Ran", Some(5.0)),
            film("Tenet", None),
        ],
    ))
    .expect("Failed to save dataset");

    let aggregate = sink.merge_all().expect("Merge failed");

    assert_eq!(aggregate.len(), 3);
    assert!(aggregate.rows.iter().all(|row| row.username == "busy"));
    assert_eq!(aggregate.skipped, vec!["quiet".to_string()]);
}

#[test]
fn test_merge_reads_files_written_elsewhere() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("carol_film_data.csv"),
        "Title,Rating,Review URL,Liked\n\
         Heat,4.5,https://letterboxd.com/carol/film/heat/,true\n\
         Ran,,,false\n",
    )
    .expect("Failed to write fixture");
    fs::write(
        dir.path().join("dave_film_data.csv"),
        "Title,Rating,Review URL,Liked\n",
    )
    .expect("Failed to write fixture");

    let aggregate = merge_directory(dir.path()).expect("Merge failed");

    assert_eq!(aggregate.len(), 2);
    assert_eq!(aggregate.rows[0].username, "carol");
    assert_eq!(aggregate.rows[0].rating, Some(4.5));
    assert!(aggregate.rows[0].liked);
    assert_eq!(aggregate.rows[1].rating, None);
    assert_eq!(aggregate.rows[1].review_url, None);
    assert_eq!(aggregate.skipped, vec!["dave".to_string()]);
}

#[test]
fn test_merge_empty_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config("https://letterboxd.com", dir.path());
    let sink = CsvSink::from_config(&config.output).expect("Failed to create sink");

    let aggregate = sink.merge_all().expect("Merge failed");

    assert!(aggregate.is_empty());
    assert!(aggregate.skipped.is_empty());

    let combined = fs::read_to_string(dir.path().join("combined.csv"))
        .expect("Combined file should exist");
    assert_eq!(combined, "user,Title,Rating,Review URL,Liked\n");
    let skipped = fs::read_to_string(dir.path().join("skipped_users.csv"))
        .expect("Skipped list should exist");
    assert_eq!(skipped, "user\n");
}

#[test]
fn test_merge_reads_capitalized_liked_flags() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("carol_film_data.csv"),
        "Title,Rating,Review URL,Liked\nHeat,4.5,,True\nRan,,,False\n",
    )
    .expect("Failed to write fixture");

    let aggregate = merge_directory(dir.path()).expect("Merge failed");

    assert_eq!(aggregate.len(), 2);
    assert_eq!(aggregate.users(), vec!["carol"]);
    assert!(aggregate.rows[0].liked);
    assert!(aggregate.skipped.is_empty());
    assert!(aggregate.unreadable.is_empty());
}
