//! Error types for the ingestion pipeline
//!
//! The taxonomy separates run-fatal failures (configuration, state store,
//! source listing) from candidate-scoped ones (fetch, period, upload): the
//! orchestrator records a candidate-scoped failure and moves on, while a
//! fatal error aborts the run.

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    /// The listing fetch or parse failed; there is nothing to iterate.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// One candidate's download failed after retries.
    #[error("Fetch failed for '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The filename matched the period grammar but the month is out of range.
    #[error("Invalid period in '{filename}': month {month} is not in 1..=12")]
    InvalidPeriod { filename: String, month: u32 },

    /// Uploading one candidate to the durable store failed. The fingerprint
    /// is not committed, so the candidate is retried on the next run.
    #[error("Upload failed for '{key}': {reason}")]
    UploadFailed { key: String, reason: String },

    /// Fingerprinting the staged file failed.
    #[error("Checksum error: {0}")]
    Checksum(#[from] statlake_common::StatlakeError),

    /// The fingerprint store could not be read or committed.
    #[error("State store error: {0}")]
    State(String),

    /// Bucket provisioning or layout initialization failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Settings are missing, unreadable, or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl IngestError {
    /// Whether this failure is local to a single candidate.
    ///
    /// Candidate-scoped failures never abort the run; everything else does.
    pub fn is_candidate_scoped(&self) -> bool {
        matches!(
            self,
            IngestError::FetchFailed { .. }
                | IngestError::InvalidPeriod { .. }
                | IngestError::UploadFailed { .. }
                | IngestError::Checksum(_)
        )
    }
}
