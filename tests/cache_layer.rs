//! Integration tests for the response cache in front of the real client.

use reqwest::Method;
use secrecy::SecretString;
use serde_json::json;
use starfeed::cache::{
    CacheEntry, CacheKey, CacheStore, CachedTransport, DiskStore, MemoryStore, DEFAULT_TTL,
};
use starfeed::github::GitHubClient;
use starfeed::http::{ApiResponse, FetchError, RateLimiter, Transport};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> GitHubClient {
    GitHubClient::new(
        &SecretString::from("test-token".to_string()),
        RateLimiter::new(100.0).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap()
}

const RELEASE: &str = "/repos/o/r/releases/latest";

fn release_body() -> serde_json::Value {
    json!({"name": "r 1.0", "tag_name": "v1", "html_url": "https://github.com/o/r/releases/tag/v1"})
}

#[tokio::test]
async fn test_one_live_call_within_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELEASE))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_body()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = CachedTransport::new(client(), MemoryStore::default(), DEFAULT_TTL);
    let url = format!("{}{RELEASE}", server.uri());

    let first = cache.get(&url).await.unwrap();
    let second = cache.get(&url).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second.status, 200);
}

#[tokio::test]
async fn test_equivalent_urls_share_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/starred"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let cache = CachedTransport::new(client(), MemoryStore::default(), DEFAULT_TTL);
    cache
        .get(&format!("{}/user/starred?per_page=100&page=1", server.uri()))
        .await
        .unwrap();
    cache
        .get(&format!("{}/user/starred?page=1&per_page=100#top", server.uri()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stale_entry_served_when_upstream_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELEASE))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RELEASE))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Zero TTL: every entry is stale, so each call goes upstream first
    let cache = CachedTransport::new(client(), MemoryStore::default(), Duration::ZERO);
    let url = format!("{}{RELEASE}", server.uri());

    let live = cache.get(&url).await.unwrap();
    let stale = cache.get(&url).await.unwrap();
    assert_eq!(stale.status, 200);
    assert_eq!(stale.body, live.body);
}

#[tokio::test]
async fn test_upstream_failure_without_entry_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let cache = CachedTransport::new(client(), MemoryStore::default(), DEFAULT_TTL);
    let response = cache
        .get(&format!("{}{RELEASE}", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
    assert!(cache.store().is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_with_entry() {
    // Nothing listens on the discard port: every live call is refused
    let url = "http://127.0.0.1:9/repos/o/r/releases/latest";
    let store = MemoryStore::default();
    let seeded = ApiResponse {
        url: url.to_string(),
        status: 200,
        body: release_body().to_string(),
        link: None,
    };
    store
        .save(&CacheEntry::new(CacheKey::new(&Method::GET, url).unwrap(), &seeded))
        .await
        .unwrap();

    let cache = CachedTransport::new(client(), store, Duration::ZERO);
    assert_eq!(cache.get(url).await.unwrap(), seeded);

    let miss = cache.get("http://127.0.0.1:9/repos/x/y/releases/latest").await;
    assert!(matches!(
        miss,
        Err(FetchError::Network(_)) | Err(FetchError::Timeout(_))
    ));
}

#[tokio::test]
async fn test_disk_store_reused_across_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELEASE))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_body()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}{RELEASE}", server.uri());

    let first_run = CachedTransport::new(client(), DiskStore::open(dir.path()).unwrap(), DEFAULT_TTL);
    let live = first_run.get(&url).await.unwrap();
    drop(first_run);

    let second_run = CachedTransport::new(client(), DiskStore::open(dir.path()).unwrap(), DEFAULT_TTL);
    let cached = second_run.get(&url).await.unwrap();
    assert_eq!(cached, live);
}

#[tokio::test]
async fn test_cache_hits_skip_rate_limiter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_body()))
        .mount(&server)
        .await;

    let cache = CachedTransport::new(client(), MemoryStore::default(), DEFAULT_TTL);
    let url = format!("{}{RELEASE}", server.uri());
    let capacity = cache.inner().limiter().capacity();

    cache.get(&url).await.unwrap();
    for _ in 0..10 {
        cache.get(&url).await.unwrap();
    }
    assert_eq!(cache.inner().limiter().available().await, capacity - 1);
}
