//! Integration tests for Reel-Harvest
//!
//! These tests use wiremock to stand in for the film site and tempfile for
//! the output directory.

mod crawl_tests;
mod fetch_tests;
mod merge_tests;
