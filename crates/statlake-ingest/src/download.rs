//! Candidate file download into the local staging area
//!
//! Each candidate's bytes are staged under a deterministic name derived from
//! the remote filename; a same-run collision overwrites, which is fine
//! because every staged file is fingerprinted before use. Fetch failures are
//! isolated to the candidate.

use crate::config::HttpConfig;
use crate::error::{IngestError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP downloader with a fixed staging directory
pub struct Downloader {
    client: Client,
    staging_dir: PathBuf,
    max_retries: u32,
}

impl Downloader {
    pub fn new(http: &HttpConfig, staging_dir: impl Into<PathBuf>) -> Result<Self> {
        let staging_dir = staging_dir.into();
        std::fs::create_dir_all(&staging_dir).map_err(|e| {
            IngestError::Config(format!(
                "failed to create staging dir {}: {}",
                staging_dir.display(),
                e
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(|e| IngestError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            staging_dir,
            max_retries: http.max_retries.max(1),
        })
    }

    /// Fetch the remote resource's current bytes into the staging area.
    ///
    /// Retries with exponential backoff; after the last attempt the error is
    /// `FetchFailed` and the orchestrator moves on to the next candidate.
    pub async fn fetch(&self, url: &str, filename: &str) -> Result<PathBuf> {
        let dest = self.staging_dir.join(filename);
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.fetch_once(url, &dest).await {
                Ok(()) => {
                    debug!(url = %url, path = %dest.display(), "Staged candidate file");
                    return Ok(dest);
                },
                Err(reason) => {
                    warn!(
                        url = %url,
                        attempt,
                        max_retries = self.max_retries,
                        "Download attempt failed: {}",
                        reason
                    );
                    last_error = reason;

                    if attempt < self.max_retries {
                        let backoff_secs = 2u64.pow(attempt);
                        info!("Retrying in {} seconds...", backoff_secs);
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    }
                },
            }
        }

        Err(IngestError::FetchFailed {
            url: url.to_string(),
            reason: last_error,
        })
    }

    async fn fetch_once(&self, url: &str, dest: &Path) -> std::result::Result<(), String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status()));
        }

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| format!("failed to write {}: {}", dest.display(), e))?;

        Ok(())
    }
}
