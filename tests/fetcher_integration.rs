//! Integration tests for the fetch pipeline.
//!
//! A mock server plays both the catalog API and the file host.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;
use wallfetch_core::api::ApiClient;
use wallfetch_core::cache::Cache;
use wallfetch_core::download::DownloadStatus;
use wallfetch_core::fetcher::{FetchOptions, Fetcher, IdSource, LatestSource};
use wallfetch_core::http::{RateLimiter, RetryPolicy};
use wallfetch_core::wallpaper::{Category, ERROR_PATH, Payload, Purity};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn api_for(server: &MockServer) -> ApiClient {
    ApiClient::with_client(
        Client::new(),
        &format!("{}/api/v1/", server.uri()),
        Arc::new(RateLimiter::disabled()),
        RetryPolicy::new(3, Duration::from_millis(10)),
    )
    .expect("mock server URL should be a valid base")
}

fn options(base: &TempDir, download_files: bool) -> FetchOptions {
    FetchOptions {
        fetch_details: true,
        download_files,
        base_dir: base.path().to_path_buf(),
        show_progress: false,
        ..FetchOptions::default()
    }
}

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

async fn mount_detail(server: &MockServer, id: &str, file_path: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/w/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": id,
                "path": format!("{}{file_path}", server.uri()),
                "category": "anime",
                "purity": "sfw",
                "created_at": "2022-02-02 02:02:02"
            }
        })))
        .mount(server)
        .await;
}

async fn mount_file(server: &MockServer, file_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}

#[tokio::test]
async fn test_cached_ids_never_hit_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/w/cached1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cache = Cache::in_memory();
    cache.put(
        "cached1",
        payload(json!({"id": "cached1", "path": "https://host/full/ca/wallhaven-cached1.jpg"})),
    );
    let base = TempDir::new().expect("temp dir");
    let mut fetcher =
        Fetcher::new(api_for(&server), cache, options(&base, false)).expect("fetcher");

    let summary = fetcher
        .run(&IdSource::new(["cached1"]))
        .await
        .expect("run");

    assert_eq!(summary.collected, 1);
    assert_eq!(summary.enrich.cached, 1);
    assert_eq!(summary.enrich.fetched, 0);
    assert_eq!(
        summary.wallpapers[0].path(),
        Some("https://host/full/ca/wallhaven-cached1.jpg")
    );
    assert!(summary.downloads.is_none());
}

#[tokio::test]
async fn test_failed_detail_marks_sentinel_and_batch_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/w/bad000"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_detail(&server, "good11", "/full/go/wallhaven-good11.jpg").await;
    mount_file(&server, "/full/go/wallhaven-good11.jpg", b"good image bytes").await;

    let base = TempDir::new().expect("temp dir");
    let mut fetcher = Fetcher::new(api_for(&server), Cache::in_memory(), options(&base, true))
        .expect("fetcher");

    let summary = fetcher
        .run(&IdSource::new(["bad000", "good11"]))
        .await
        .expect("run completes despite the failed entity");

    assert_eq!(summary.enrich.fetched, 1);
    assert_eq!(summary.enrich.failed, 1);
    assert_eq!(summary.wallpapers[0].path(), Some(ERROR_PATH));
    assert!(summary.wallpapers[0].is_error());
    assert_eq!(summary.wallpapers[1].category(), Some(Category::ANIME));

    assert!(fetcher.cache().contains("good11"));
    assert!(!fetcher.cache().contains("bad000"));

    let report = summary.downloads.expect("download report");
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    let failed: Vec<&str> = report.failures().map(|o| o.id.as_str()).collect();
    assert_eq!(failed, vec!["bad000"]);

    let saved = base.path().join("go").join("wallhaven-good11.jpg");
    assert_eq!(std::fs::read(saved).expect("downloaded file"), b"good image bytes");
}

#[tokio::test]
async fn test_cache_is_flushed_to_disk() {
    let server = MockServer::start().await;
    mount_detail(&server, "aaa111", "/full/aa/wallhaven-aaa111.jpg").await;
    mount_detail(&server, "bbb222", "/full/bb/wallhaven-bbb222.jpg").await;

    let dir = TempDir::new().expect("temp dir");
    let cache_path = dir.path().join("cache").join("wallhaven_cache.bin");
    let cache = Cache::load(&cache_path).expect("empty cache");
    let mut opts = options(&dir, false);
    opts.cache_flush_every = 1;

    let mut fetcher = Fetcher::new(api_for(&server), cache, opts).expect("fetcher");
    fetcher
        .run(&IdSource::new(["aaa111", "bbb222"]))
        .await
        .expect("run");

    let reloaded = Cache::load(&cache_path).expect("reload cache");
    assert_eq!(reloaded.ids(), vec!["aaa111", "bbb222"]);
    let entry = reloaded.wallpaper("aaa111").expect("cached entry");
    assert_eq!(entry.purity(), Some(Purity::SFW));
}

/// Answers a detail request after recording which ids the cache file held at
/// that moment (`None` while the file does not exist yet).
struct CacheFileSnapshot {
    cache_path: PathBuf,
    body: Value,
    seen: Arc<Mutex<Vec<Option<Vec<String>>>>>,
}

impl Respond for CacheFileSnapshot {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let on_disk = self.cache_path.is_file().then(|| {
            Cache::load(&self.cache_path)
                .map(|cache| cache.ids().into_iter().map(String::from).collect())
                .unwrap_or_default()
        });
        self.seen.lock().expect("snapshot lock").push(on_disk);
        ResponseTemplate::new(200).set_body_json(&self.body)
    }
}

/// Runs two uncached ids and returns the cache file contents observed while
/// the second detail request was in flight.
async fn cache_on_disk_mid_run(dir: &Path, flush_every: usize) -> Option<Vec<String>> {
    let server = MockServer::start().await;
    let cache_path = dir.join("wallhaven_cache.bin");
    let seen = Arc::new(Mutex::new(Vec::new()));

    mount_detail(&server, "aaa111", "/full/aa/wallhaven-aaa111.jpg").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/w/bbb222"))
        .respond_with(CacheFileSnapshot {
            cache_path: cache_path.clone(),
            body: json!({
                "data": {"id": "bbb222", "path": "https://host/full/bb/wallhaven-bbb222.jpg"}
            }),
            seen: Arc::clone(&seen),
        })
        .mount(&server)
        .await;

    let cache = Cache::load(&cache_path).expect("empty cache");
    let opts = FetchOptions {
        fetch_details: true,
        download_files: false,
        base_dir: dir.to_path_buf(),
        show_progress: false,
        cache_flush_every: flush_every,
    };
    let mut fetcher = Fetcher::new(api_for(&server), cache, opts).expect("fetcher");
    fetcher
        .run(&IdSource::new(["aaa111", "bbb222"]))
        .await
        .expect("run");

    let reloaded = Cache::load(&cache_path).expect("reload cache");
    assert_eq!(reloaded.ids(), vec!["aaa111", "bbb222"]);

    let mut seen = seen.lock().expect("snapshot lock");
    assert_eq!(seen.len(), 1);
    seen.pop().flatten()
}

#[tokio::test]
async fn test_cache_checkpoint_is_written_during_enrichment() {
    let dir = TempDir::new().expect("temp dir");
    let on_disk = cache_on_disk_mid_run(dir.path(), 1).await;
    assert_eq!(on_disk, Some(vec!["aaa111".to_string()]));
}

#[tokio::test]
async fn test_cache_without_checkpoints_is_written_only_at_phase_end() {
    let dir = TempDir::new().expect("temp dir");
    let on_disk = cache_on_disk_mid_run(dir.path(), 0).await;
    assert_eq!(on_disk, None);
}

#[tokio::test]
async fn test_second_run_reports_existing_files_without_requests() {
    let server = MockServer::start().await;
    mount_detail(&server, "ccc333", "/full/cc/wallhaven-ccc333.jpg").await;
    mount_file(&server, "/full/cc/wallhaven-ccc333.jpg", b"pixels").await;

    let base = TempDir::new().expect("temp dir");
    let mut fetcher = Fetcher::new(api_for(&server), Cache::in_memory(), options(&base, true))
        .expect("fetcher");
    let source = IdSource::new(["ccc333"]);

    let first = fetcher.run(&source).await.expect("first run");
    let second = fetcher.run(&source).await.expect("second run");

    let first = first.downloads.expect("report");
    let second = second.downloads.expect("report");
    assert_eq!(first.outcomes()[0].status, DownloadStatus::Succeeded);
    assert_eq!(second.outcomes()[0].status, DownloadStatus::Existed);
    assert_eq!(requests_to(&server, "/full/cc/wallhaven-ccc333.jpg").await, 1);
    assert_eq!(requests_to(&server, "/api/v1/w/ccc333").await, 1);
}

#[tokio::test]
async fn test_download_failure_leaves_no_file() {
    let server = MockServer::start().await;
    mount_detail(&server, "ddd444", "/full/dd/wallhaven-ddd444.jpg").await;
    Mock::given(method("GET"))
        .and(path("/full/dd/wallhaven-ddd444.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base = TempDir::new().expect("temp dir");
    let mut fetcher = Fetcher::new(api_for(&server), Cache::in_memory(), options(&base, true))
        .expect("fetcher");
    let summary = fetcher
        .run(&IdSource::new(["ddd444"]))
        .await
        .expect("run");

    let report = summary.downloads.expect("report");
    assert_eq!(report.failed(), 1);
    assert!(!base.path().join("dd").join("wallhaven-ddd444.jpg").exists());
    assert_eq!(requests_to(&server, "/full/dd/wallhaven-ddd444.jpg").await, 1);
}

#[tokio::test]
async fn test_throttled_download_is_retried() {
    let server = MockServer::start().await;
    mount_detail(&server, "eee555", "/full/ee/wallhaven-eee555.jpg").await;
    Mock::given(method("GET"))
        .and(path("/full/ee/wallhaven-eee555.jpg"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_file(&server, "/full/ee/wallhaven-eee555.jpg", b"after backoff").await;

    let base = TempDir::new().expect("temp dir");
    let mut fetcher = Fetcher::new(api_for(&server), Cache::in_memory(), options(&base, true))
        .expect("fetcher");
    let summary = fetcher
        .run(&IdSource::new(["eee555"]))
        .await
        .expect("run");

    assert_eq!(summary.downloads.expect("report").succeeded(), 1);
    assert_eq!(requests_to(&server, "/full/ee/wallhaven-eee555.jpg").await, 2);
}

#[tokio::test]
async fn test_latest_source_skips_failed_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("page", "1"))
        .and(query_param("sorting", "date_added"))
        .and(query_param("purity", "110"))
        .and(query_param("categories", "111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "p1a", "purity": "sfw"},
                {"id": "p1b", "purity": "sketchy"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "p3a"}]
        })))
        .mount(&server)
        .await;

    let base = TempDir::new().expect("temp dir");
    let mut opts = options(&base, false);
    opts.fetch_details = false;
    let mut fetcher = Fetcher::new(api_for(&server), Cache::in_memory(), opts).expect("fetcher");

    let source = LatestSource::new(vec![1, 2, 3], Purity::SFW_SKETCHY, Category::ALL);
    let summary = fetcher.run(&source).await.expect("run");

    let ids: Vec<&str> = summary.wallpapers.iter().map(|w| w.id()).collect();
    assert_eq!(ids, vec!["p1a", "p1b", "p3a"]);
    assert_eq!(summary.collected, 3);
    assert_eq!(summary.enrich.fetched, 0);
    assert_eq!(summary.wallpapers[1].purity(), Some(Purity::SKETCHY));
}
