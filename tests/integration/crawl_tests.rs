//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full harvest cycle end-to-end.

use crate::common::{create_test_config, listing_page, members_page};
use reel_harvest::crawler::{Coordinator, PopularUserDiscovery, UserCrawler};
use reel_harvest::output::read_user_file;
use reel_harvest::state::JobState;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a member with the given films per page
async fn mount_member(server: &MockServer, username: &str, pages: &[&[&str]]) {
    let last_page = pages.len() as u32;

    Mock::given(method("GET"))
        .and(path(format!("/{}/films/", username)))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(username, pages[0], last_page)),
        )
        .mount(server)
        .await;

    for (i, films) in pages.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/{}/films/page/{}/", username, i + 1)))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_page(username, films, last_page)),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_user_crawl_collects_pages_in_order() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_member(
        &mock_server,
        "alice",
        &[&["Heat", "Ran", "Alien"], &["Tenet", "Up"]],
    )
    .await;

    let crawler = UserCrawler::from_config(&config).expect("Failed to build crawler");
    let crawl = crawler.crawl("alice").await;

    assert_eq!(crawl.job.state, JobState::Succeeded);
    assert_eq!(crawl.job.total_pages, 2);
    assert_eq!(crawl.job.failed_pages, 0);
    assert_eq!(crawl.dataset.len(), 5);

    let titles: Vec<_> = crawl
        .dataset
        .records
        .iter()
        .filter_map(|r| r.title.as_deref())
        .collect();
    assert_eq!(titles, vec!["Heat", "Ran", "Alien", "Tenet", "Up"]);

    let first = &crawl.dataset.records[0];
    assert_eq!(first.rating, Some(4.5));
    assert!(first.liked);
    assert_eq!(
        first.review_url.as_deref(),
        Some(format!("{}/alice/film/heat/", mock_server.uri()).as_str())
    );

    let second = &crawl.dataset.records[1];
    assert_eq!(second.rating, None);
    assert!(!second.liked);
}

#[tokio::test]
async fn test_failed_page_does_not_abort_user() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), dir.path());

    let first = listing_page("bob", &["Heat", "Ran"], 3);
    Mock::given(method("GET"))
        .and(path("/bob/films/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(first.clone()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bob/films/page/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(first))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bob/films/page/2/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bob/films/page/3/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page("bob", &["Up"], 3)),
        )
        .mount(&mock_server)
        .await;

    let crawler = UserCrawler::from_config(&config).expect("Failed to build crawler");
    let crawl = crawler.crawl("bob").await;

    assert_eq!(crawl.job.state, JobState::Succeeded);
    assert_eq!(crawl.job.total_pages, 3);
    assert_eq!(crawl.job.failed_pages, 1);
    assert!(crawl.job.last_error.is_some());
    assert_eq!(crawl.dataset.len(), 3);
}

#[tokio::test]
async fn test_unreachable_user_yields_empty_dataset() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), dir.path());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let crawler = UserCrawler::from_config(&config).expect("Failed to build crawler");
    let crawl = crawler.crawl("ghost").await;

    assert_eq!(crawl.job.state, JobState::Failed);
    assert_eq!(crawl.job.total_pages, 1);
    assert_eq!(crawl.job.failed_pages, 1);
    assert!(crawl.dataset.is_empty());
    assert_eq!(crawl.dataset.username, "ghost");
}

#[tokio::test]
async fn test_invalid_username_fails_without_requests() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), dir.path());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let crawler = UserCrawler::from_config(&config).expect("Failed to build crawler");
    let crawl = crawler.crawl("../admin").await;

    assert_eq!(crawl.job.state, JobState::Failed);
    assert!(crawl.dataset.is_empty());
}

#[tokio::test]
async fn test_full_harvest_two_users() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_member(
        &mock_server,
        "alice",
        &[&["Heat", "Ran", "Alien"], &["Tenet", "Up"]],
    )
    .await;
    mount_member(
        &mock_server,
        "bob",
        &[&["Jaws", "Rocky", "Brazil"], &["Fargo", "Ikiru"]],
    )
    .await;

    let users = vec!["alice".to_string(), "bob".to_string()];
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator.run(&users).await.expect("Harvest failed");

    // Report covers both users, one batch each
    let report = &outcome.report;
    assert_eq!(report.batches, 2);
    assert_eq!(report.count_in_state(JobState::Succeeded), 2);
    assert_eq!(report.total_records(), 10);
    assert!(report.cooldown_total >= Duration::from_millis(100));
    assert!(report.elapsed >= Duration::from_millis(100));

    // Aggregate holds every row, tagged with its owner
    let aggregate = &outcome.aggregate;
    assert_eq!(aggregate.len(), 10);
    assert!(aggregate.skipped.is_empty());
    assert_eq!(aggregate.users(), vec!["alice", "bob"]);
    assert_eq!(
        aggregate.rows.iter().filter(|r| r.username == "alice").count(),
        5
    );
    assert_eq!(
        aggregate.rows.iter().filter(|r| r.username == "bob").count(),
        5
    );

    // Per-user files landed on disk
    let alice = read_user_file(&dir.path().join("data").join("alice_film_data.csv"))
        .expect("Failed to read alice's file");
    assert_eq!(alice.len(), 5);
    assert!(dir.path().join("combined.csv").exists());
}

#[tokio::test]
async fn test_harvest_lists_empty_users_as_skipped() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.schedule.batch_size = 2;

    mount_member(&mock_server, "alice", &[&["Heat", "Ran"]]).await;
    Mock::given(method("GET"))
        .and(path("/ghost/films/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ghost/films/page/1/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let users = vec!["alice".to_string(), "ghost".to_string()];
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator.run(&users).await.expect("Harvest failed");

    assert_eq!(outcome.report.batches, 1);
    assert_eq!(outcome.report.count_in_state(JobState::Failed), 1);
    assert_eq!(outcome.aggregate.len(), 2);
    assert_eq!(outcome.aggregate.skipped, vec!["ghost".to_string()]);

    let skipped = std::fs::read_to_string(dir.path().join("skipped_users.csv"))
        .expect("Failed to read skipped users");
    assert_eq!(skipped, "user\nghost\n");
}

#[tokio::test]
async fn test_repeated_username_is_crawled_once() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.schedule.batch_size = 2;

    // Each listing page may be requested only once
    mount_member(&mock_server, "alice", &[&["Heat", "Ran"]]).await;

    let users = vec!["alice".to_string(), "alice".to_string()];
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator.run(&users).await.expect("Harvest failed");

    assert_eq!(outcome.report.jobs.len(), 1);
    assert_eq!(outcome.report.batches, 1);
    assert_eq!(outcome.report.total_records(), 2);
    assert_eq!(outcome.aggregate.len(), outcome.report.total_records());
}

#[tokio::test]
async fn test_courtesy_delay_follows_each_user() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.schedule.courtesy_delay_min_ms = 150;
    config.schedule.courtesy_delay_max_ms = 250;

    mount_member(&mock_server, "alice", &[&["Heat"]]).await;

    let crawler = UserCrawler::from_config(&config).expect("Failed to build crawler");
    let start = Instant::now();
    let crawl = crawler.crawl("alice").await;

    assert_eq!(crawl.dataset.len(), 1);
    assert!(start.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_page_fetches_bounded_by_concurrency_limit() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.schedule.max_concurrent_pages = 2;

    let delay = Duration::from_millis(150);
    Mock::given(method("GET"))
        .and(path("/carol/films/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page("carol", &["Heat"], 6)),
        )
        .mount(&mock_server)
        .await;
    for page in 1..=6 {
        Mock::given(method("GET"))
            .and(path(format!("/carol/films/page/{}/", page)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing_page("carol", &["Heat"], 6))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let crawler = UserCrawler::from_config(&config).expect("Failed to build crawler");
    let start = Instant::now();
    let crawl = crawler.crawl("carol").await;
    let elapsed = start.elapsed();

    assert_eq!(crawl.dataset.len(), 6);
    // Two at a time means three rounds; one at a time would take six
    assert!(elapsed >= delay * 3, "finished too fast: {:?}", elapsed);
    assert!(elapsed < delay * 6, "pages ran one by one: {:?}", elapsed);
}

#[tokio::test]
async fn test_batch_members_run_concurrently() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.schedule.batch_size = 2;
    config.schedule.cooldown_ms = 0;

    let delay = Duration::from_millis(300);
    for user in ["alice", "bob"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}/films/", user)))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_page(user, &["Heat"], 1)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/films/page/1/", user)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing_page(user, &["Heat"], 1))
                    .set_delay(delay),
            )
            .mount(&mock_server)
            .await;
    }

    let users = vec!["alice".to_string(), "bob".to_string()];
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let outcome = coordinator.run(&users).await.expect("Harvest failed");

    assert_eq!(outcome.report.batches, 1);
    assert_eq!(outcome.aggregate.len(), 2);
    assert!(outcome.report.elapsed >= delay);
    assert!(
        outcome.report.elapsed < delay * 2,
        "batch members ran one after another: {:?}",
        outcome.report.elapsed
    );
}

#[tokio::test]
async fn test_discovery_deduplicates_and_stops_on_empty_page() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/members/popular/page/1/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(members_page(&["alice", "bob"])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/members/popular/page/2/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(members_page(&["bob", "carol"])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/members/popular/page/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(members_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/members/popular/page/4/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let discovery = PopularUserDiscovery::from_config(&config).expect("Failed to build discovery");
    let users = discovery.discover(10).await.expect("Discovery failed");

    assert_eq!(users, vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn test_discovery_truncates_to_target() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/members/popular/page/1/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(members_page(&["a", "b", "c", "d"])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let discovery = PopularUserDiscovery::from_config(&config).expect("Failed to build discovery");
    let users = discovery.discover(3).await.expect("Discovery failed");

    assert_eq!(users, vec!["a", "b", "c"]);
}
