//! End-to-end tests for the ingestion pipeline
//!
//! A wiremock server stands in for the publisher (listing page and file
//! bodies) and a local-directory sink stands in for the object store, so the
//! full discover -> filter -> download -> fingerprint -> upload -> commit
//! path runs against real HTTP and a real filesystem.

use async_trait::async_trait;
use chrono::NaiveDate;
use statlake_common::checksum::{compute_checksum, ChecksumAlgorithm};
use statlake_ingest::config::Settings;
use statlake_ingest::error::{IngestError, Result};
use statlake_ingest::pipeline::IngestPipeline;
use statlake_ingest::state::{FingerprintStore, Fingerprints};
use statlake_ingest::storage::ObjectSink;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that lands objects in a local directory tree
struct LocalDirSink {
    root: PathBuf,
}

impl LocalDirSink {
    fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectSink for LocalDirSink {
    async fn put_file(&self, local_path: &Path, key: &str) -> Result<()> {
        let dest = self.object_path(key);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IngestError::UploadFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        }
        std::fs::copy(local_path, &dest).map_err(|e| IngestError::UploadFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Sink whose uploads always fail
struct FailingSink;

#[async_trait]
impl ObjectSink for FailingSink {
    async fn put_file(&self, _local_path: &Path, key: &str) -> Result<()> {
        Err(IngestError::UploadFailed {
            key: key.to_string(),
            reason: "injected failure".to_string(),
        })
    }
}

fn sha256(data: &[u8]) -> String {
    compute_checksum(&mut std::io::Cursor::new(data), ChecksumAlgorithm::Sha256).unwrap()
}

fn static_settings(dir: &TempDir, base_url: &str, url_path: &str, pattern: &str) -> Settings {
    let yaml = format!(
        r#"
http:
  max_retries: 1
local:
  staging_dir: {dir}/staging
  state_file: {dir}/state/fingerprints.json
storage:
  bucket: test-bucket
  raw_prefix: raw
datasets:
  - name: ipc
    source:
      type: static
      url: {base_url}{url_path}
    patterns: ['{pattern}']
"#,
        dir = dir.path().display(),
    );
    Settings::from_yaml_str(&yaml).unwrap()
}

fn listing_settings(dir: &TempDir, base_url: &str) -> Settings {
    let yaml = format!(
        r#"
http:
  max_retries: 1
local:
  staging_dir: {dir}/staging
  state_file: {dir}/state/fingerprints.json
storage:
  bucket: test-bucket
  raw_prefix: raw
datasets:
  - name: ipc
    source:
      type: listing
      page_url: {base_url}/prices/
      link_prefix: /files/
    patterns: ['sh_ipc_\d{{2}}_\d{{2}}\.xls']
"#,
        dir = dir.path().display(),
    );
    Settings::from_yaml_str(&yaml).unwrap()
}

async fn mount_file(server: &MockServer, url_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, links: &[&str]) {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">file</a>"#, l))
        .collect();
    let html = format!("<html><body>{}</body></html>", anchors);

    Mock::given(method("GET"))
        .and(path("/prices/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_run_uploads_and_second_run_skips() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = b"may 2024 price index";
    mount_file(&server, "/files/sh_ipc_05_24.xls", body).await;

    let settings = static_settings(&dir, &server.uri(), "/files/sh_ipc_05_24.xls", "sh_ipc");
    let sink = LocalDirSink::new(dir.path().join("lake"));

    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.unchanged, 0);

    // Landed under the period partition derived from the filename.
    let object = sink.object_path("raw/ipc/2024/05/sh_ipc_05_24.xls");
    assert_eq!(std::fs::read(&object).unwrap(), body);

    // Fingerprint committed under the dataset key.
    let state = FingerprintStore::new(settings.local.state_file.clone())
        .load()
        .unwrap();
    assert_eq!(state.get("ipc"), Some(&sha256(body)));

    // Same remote content again: zero uploads, zero new commits.
    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 0);
    assert_eq!(summary.unchanged, 1);
}

#[tokio::test]
async fn test_changed_content_is_reuploaded_and_state_updated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = b"revised series";
    mount_file(&server, "/files/sh_ipc_05_24.xls", body).await;

    let settings = static_settings(&dir, &server.uri(), "/files/sh_ipc_05_24.xls", "sh_ipc");
    let sink = LocalDirSink::new(dir.path().join("lake"));

    // Seed the ledger with a stale digest for this key.
    let store = FingerprintStore::new(settings.local.state_file.clone());
    let mut seeded = Fingerprints::new();
    seeded.insert("ipc".to_string(), sha256(b"original series"));
    store.commit(&seeded).unwrap();

    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 1);
    assert_eq!(store.load().unwrap().get("ipc"), Some(&sha256(body)));
}

#[tokio::test]
async fn test_matching_digest_skips_upload() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = b"unchanged series";
    mount_file(&server, "/files/sh_ipc_05_24.xls", body).await;

    let settings = static_settings(&dir, &server.uri(), "/files/sh_ipc_05_24.xls", "sh_ipc");
    let sink = LocalDirSink::new(dir.path().join("lake"));

    let store = FingerprintStore::new(settings.local.state_file.clone());
    let mut seeded = Fingerprints::new();
    seeded.insert("ipc".to_string(), sha256(body));
    store.commit(&seeded).unwrap();

    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 0);
    assert_eq!(summary.unchanged, 1);
    assert!(!sink.object_path("raw/ipc/2024/05/sh_ipc_05_24.xls").exists());
}

#[tokio::test]
async fn test_listing_scrape_filters_by_pattern_without_downloading_rejects() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, &["/files/sh_ipc_05_24.xls", "/files/readme.txt"]).await;
    mount_file(&server, "/files/sh_ipc_05_24.xls", b"may").await;

    // A rejected candidate must never be fetched.
    Mock::given(method("GET"))
        .and(path("/files/readme.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = listing_settings(&dir, &server.uri());
    let sink = LocalDirSink::new(dir.path().join("lake"));

    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.rejected, 1);

    // Listing candidates are keyed by filename.
    let state = FingerprintStore::new(settings.local.state_file.clone())
        .load()
        .unwrap();
    assert!(state.contains_key("sh_ipc_05_24.xls"));
}

#[tokio::test]
async fn test_one_failed_download_does_not_affect_other_candidates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(
        &server,
        &[
            "/files/sh_ipc_01_24.xls",
            "/files/sh_ipc_02_24.xls",
            "/files/sh_ipc_03_24.xls",
        ],
    )
    .await;
    mount_file(&server, "/files/sh_ipc_01_24.xls", b"january").await;
    Mock::given(method("GET"))
        .and(path("/files/sh_ipc_02_24.xls"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_file(&server, "/files/sh_ipc_03_24.xls", b"march").await;

    let settings = listing_settings(&dir, &server.uri());
    let sink = LocalDirSink::new(dir.path().join("lake"));

    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 2);
    assert_eq!(summary.failed, 1);

    let state = FingerprintStore::new(settings.local.state_file.clone())
        .load()
        .unwrap();
    assert!(state.contains_key("sh_ipc_01_24.xls"));
    assert!(!state.contains_key("sh_ipc_02_24.xls"));
    assert!(state.contains_key("sh_ipc_03_24.xls"));
}

#[tokio::test]
async fn test_out_of_range_month_rejects_candidate_without_upload() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_file(&server, "/files/sh_ipc_13_24.xls", b"bad month").await;

    let settings = static_settings(&dir, &server.uri(), "/files/sh_ipc_13_24.xls", "sh_ipc");
    let sink = LocalDirSink::new(dir.path().join("lake"));

    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.uploaded, 0);

    let state = FingerprintStore::new(settings.local.state_file.clone())
        .load()
        .unwrap();
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_unrecognized_filename_lands_under_processing_date() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = b"historic series";
    mount_file(&server, "/files/serie_historica.xls", body).await;

    let settings = static_settings(&dir, &server.uri(), "/files/serie_historica.xls", "serie");
    let sink = LocalDirSink::new(dir.path().join("lake"));

    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .with_processing_date(NaiveDate::from_ymd_opt(2026, 8, 29).unwrap())
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 1);

    let object = sink.object_path("raw/ipc/2026/08/serie_historica.xls");
    assert_eq!(std::fs::read(&object).unwrap(), body);
}

#[tokio::test]
async fn test_failed_upload_is_not_committed_and_retries_next_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = b"may 2024";
    mount_file(&server, "/files/sh_ipc_05_24.xls", body).await;

    let settings = static_settings(&dir, &server.uri(), "/files/sh_ipc_05_24.xls", "sh_ipc");
    let store = FingerprintStore::new(settings.local.state_file.clone());

    let failing = FailingSink;
    let summary = IngestPipeline::new(&settings, &failing)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert!(store.load().unwrap().is_empty());

    // The next run sees no fingerprint and publishes the file.
    let sink = LocalDirSink::new(dir.path().join("lake"));
    let summary = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 1);
    assert_eq!(store.load().unwrap().get("ipc"), Some(&sha256(body)));
}

#[tokio::test]
async fn test_unreachable_listing_aborts_the_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/prices/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let settings = listing_settings(&dir, &server.uri());
    let sink = LocalDirSink::new(dir.path().join("lake"));

    let err = IngestPipeline::new(&settings, &sink)
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::SourceUnavailable(_)));
}
