//! Fingerprint store: the idempotency ledger across runs
//!
//! A flat `key -> hex digest` mapping persisted as pretty JSON so it stays
//! human-readable and safe to inspect or edit for recovery. Absence of a key
//! means "never ingested". Commits are all-or-nothing: the new content is
//! written to a sibling temp file and renamed over the old one, so a crash
//! never leaves a partial mapping visible.

use crate::error::{IngestError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The persisted key -> digest mapping
pub type Fingerprints = BTreeMap<String, String>;

/// Persistent fingerprint mapping at a fixed path
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the committed mapping. A missing file is the first run and
    /// yields an empty mapping.
    pub fn load(&self) -> Result<Fingerprints> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No fingerprint state yet, starting empty");
            return Ok(Fingerprints::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            IngestError::State(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            IngestError::State(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    /// Atomically persist the full mapping, replacing prior content.
    pub fn commit(&self, fingerprints: &Fingerprints) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                IngestError::State(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(fingerprints)
            .map_err(|e| IngestError::State(format!("failed to serialize state: {}", e)))?;

        // Write-then-rename keeps the swap atomic on the same filesystem.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content.as_bytes()).map_err(|e| {
            IngestError::State(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            IngestError::State(format!(
                "failed to swap {} into place: {}",
                tmp.display(),
                e
            ))
        })?;

        debug!(
            path = %self.path.display(),
            entries = fingerprints.len(),
            "Committed fingerprint state"
        );

        Ok(())
    }
}
