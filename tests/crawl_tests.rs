//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! dispatcher/worker cycle against the in-memory frontier backend.

use quarry::config::{Config, CrawlerConfig, Settings, StoreConfig};
use quarry::{Crawler, EnqueueMode, Namespace, QuarryError};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration over the in-memory backend
///
/// The poll interval is shortened so quiescence detection completes in well
/// under a second instead of the production several-second cadence.
fn test_config(base_url: &str, max_block_errors: u32) -> Config {
    Config {
        store: StoreConfig {
            kind: "memory".to_string(),
            url: String::new(),
        },
        crawler: CrawlerConfig {
            workers: 4,
            max_in_flight: 100,
            max_block_errors,
            poll_interval_ms: 50,
            ..CrawlerConfig::default()
        },
        scope: Some(Settings {
            base_url: base_url.to_string(),
            ..Settings::default()
        }),
    }
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Seed page links in scope, in scope with a query, and out of scope
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/a">A</a>
            <a href="/b?x=1">B</a>
            <a href="http://other.invalid/c">C</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/a", "<html><body>leaf</body></html>").await;
    mount_page(&server, "/b", "<html><body>leaf</body></html>").await;

    let crawler = Crawler::new(test_config(&base, 20), None)
        .await
        .expect("failed to create crawler");
    crawler.seed_base_url().await.expect("failed to seed");
    crawler.run().await.expect("crawl failed");

    let frontier = crawler.frontier();

    // Seed and both in-scope links completed; the query was stripped
    assert!(frontier.contains(Namespace::Done, &base).await.unwrap());
    assert!(frontier
        .contains(Namespace::Done, &format!("{}/a", base))
        .await
        .unwrap());
    assert!(frontier
        .contains(Namespace::Done, &format!("{}/b", base))
        .await
        .unwrap());

    // The out-of-scope link never entered any namespace
    let all = frontier.export_all().await.unwrap();
    assert!(
        !all.iter().any(|url| url.contains("other.invalid")),
        "out-of-scope URL leaked into the frontier: {:?}",
        all
    );

    // Quiescence leaves nothing pending or in flight
    let sizes = frontier.sizes().await.unwrap();
    assert_eq!(sizes.todo, 0);
    assert_eq!(sizes.doing, 0);
    assert_eq!(crawler.state().parsed(), 3);
}

#[tokio::test]
async fn test_termination_with_link_cycles() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Pages link to each other in a cycle; dedup must still terminate
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/a">A</a><a href="/b">B</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/a",
        r#"<html><body><a href="/">Home</a><a href="/b">B</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/b",
        r#"<html><body><a href="/a">A</a><a href="/">Home</a></body></html>"#,
    )
    .await;

    let crawler = Crawler::new(test_config(&base, 20), None).await.unwrap();
    crawler.seed_base_url().await.unwrap();
    crawler.run().await.expect("crawl failed to terminate");

    let sizes = crawler.frontier().sizes().await.unwrap();
    assert_eq!(sizes.todo, 0);
    assert_eq!(sizes.doing, 0);
    assert!(sizes.done >= 3);
}

#[tokio::test]
async fn test_hard_failures_go_to_trash() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/missing">Gone</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let crawler = Crawler::new(test_config(&base, 20), None).await.unwrap();
    crawler.seed_base_url().await.unwrap();
    crawler.run().await.expect("crawl failed");

    let frontier = crawler.frontier();
    assert!(frontier
        .contains(Namespace::Trash, &format!("{}/missing", base))
        .await
        .unwrap());
    assert!(frontier.contains(Namespace::Done, &base).await.unwrap());

    // 404 is a permanent failure, not a block: the breaker stayed quiet
    assert_eq!(crawler.state().block_errors(), 0);
}

#[tokio::test]
async fn test_block_circuit_breaker_aborts_run() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/b1">1</a>
            <a href="/b2">2</a>
            <a href="/b3">3</a>
        </body></html>"#,
    )
    .await;
    for blocked in ["/b1", "/b2", "/b3"] {
        Mock::given(method("GET"))
            .and(path(blocked))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
    }

    let crawler = Crawler::new(test_config(&base, 3), None).await.unwrap();
    crawler.seed_base_url().await.unwrap();

    let result = crawler.run().await;
    assert!(matches!(result, Err(QuarryError::Blocked { count }) if count >= 3));
}

#[tokio::test]
async fn test_backpressure_and_external_stop() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/t", "<html><body>target</body></html>").await;

    let mut config = test_config(&base, 20);
    config.crawler.max_in_flight = 2;
    let crawler = Arc::new(Crawler::new(config, None).await.unwrap());
    let frontier = crawler.frontier();

    // Pre-load doing past the in-flight cap, as a crashed run would leave it
    let stuck: Vec<String> = (0..4).map(|i| format!("{}/stuck{}", base, i)).collect();
    for url in &stuck {
        frontier.enqueue(url, EnqueueMode::Dedup).await.unwrap();
    }
    frontier.move_to_doing(&stuck).await.unwrap();

    frontier
        .enqueue(&format!("{}/t", base), EnqueueMode::Dedup)
        .await
        .unwrap();

    let runner = Arc::clone(&crawler);
    let handle = tokio::spawn(async move { runner.run().await });

    // Many poll cycles later the backpressured dispatcher must not have
    // claimed the todo URL
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(frontier
        .contains(Namespace::Todo, &format!("{}/t", base))
        .await
        .unwrap());
    assert_eq!(crawler.state().parsed(), 0);

    // External stop winds the run down cleanly
    crawler.state().stop();
    let result = handle.await.expect("run task panicked");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_extraction_payload_stored_with_done() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <span class="price">9.99</span>
        </body></html>"#,
    )
    .await;

    let mut config = test_config(&base, 20);
    config.scope.as_mut().unwrap().pluck_rules =
        r#"[{"name": "title", "selector": "title", "first": true}]"#.to_string();

    let crawler = Crawler::new(config, None).await.unwrap();
    crawler.seed_base_url().await.unwrap();
    crawler.run().await.expect("crawl failed");

    let done = crawler.export_done().await.unwrap();
    assert_eq!(done.get(&base).map(String::as_str), Some(r#"{"title":"Home"}"#));
}

#[tokio::test]
async fn test_missing_scope_and_settings_is_fatal_before_crawling() {
    // No [scope] section and nothing persisted in the store: startup fails
    let mut bare = test_config("http://example.com", 20);
    bare.scope = None;
    let result = Crawler::new(bare, None).await;
    assert!(matches!(result, Err(QuarryError::NoSettings)));
}

#[tokio::test]
async fn test_dont_follow_links_suppresses_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/a">A</a><a href="/b">B</a></body></html>"#,
    )
    .await;

    let mut config = test_config(&base, 20);
    config.scope.as_mut().unwrap().dont_follow_links = true;

    let crawler = Crawler::new(config, None).await.unwrap();
    crawler.seed_base_url().await.unwrap();
    crawler.run().await.expect("crawl failed");

    let sizes = crawler.frontier().sizes().await.unwrap();
    assert_eq!(sizes.done, 1);
    assert_eq!(sizes.todo, 0);
}
