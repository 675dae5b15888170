//! Change detection and ingestion orchestration
//!
//! One pass over every configured dataset: discover candidates, filter by
//! filename pattern, download, fingerprint, compare against the committed
//! ledger, and publish only what changed. Identical content is never
//! re-uploaded, even when the publisher re-serves the same bytes under a
//! touched timestamp.
//!
//! Each candidate's fetch -> compare -> upload -> commit sequence is the
//! unit of atomicity. The ledger is committed after every successful upload
//! rather than at end of run, so a mid-run crash cannot re-upload work that
//! already landed. A failed upload leaves the ledger untouched and the
//! candidate is retried on the next run.

use crate::config::{DatasetConfig, Partitioning, Settings};
use crate::download::Downloader;
use crate::error::{IngestError, Result};
use crate::pattern::PatternSet;
use crate::period::{self, Period};
use crate::source::{self, Candidate};
use crate::state::{FingerprintStore, Fingerprints};
use crate::storage::ObjectSink;
use chrono::{NaiveDate, Utc};
use statlake_common::checksum::{compute_file_checksum, ChecksumAlgorithm};
use tracing::{info, warn};

/// Terminal state of one processed candidate
#[derive(Debug)]
pub enum CandidateOutcome {
    /// No configured pattern matched; nothing was downloaded.
    Rejected,

    /// A candidate-scoped failure; the run continues.
    Failed(IngestError),

    /// Content digest equals the committed one; upload skipped.
    Unchanged,

    /// New or changed content was published and committed.
    Uploaded { destination: String },
}

/// Per-run tally of candidate outcomes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub uploaded: usize,
    pub unchanged: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &CandidateOutcome) {
        match outcome {
            CandidateOutcome::Rejected => self.rejected += 1,
            CandidateOutcome::Failed(_) => self.failed += 1,
            CandidateOutcome::Unchanged => self.unchanged += 1,
            CandidateOutcome::Uploaded { .. } => self.uploaded += 1,
        }
    }
}

/// The ingestion orchestrator, generic over the durable sink
pub struct IngestPipeline<'a, S: ObjectSink> {
    settings: &'a Settings,
    sink: &'a S,
    store: FingerprintStore,
    downloader: Downloader,
    processing_date: NaiveDate,
}

impl<'a, S: ObjectSink> IngestPipeline<'a, S> {
    pub fn new(settings: &'a Settings, sink: &'a S) -> Result<Self> {
        let store = FingerprintStore::new(&settings.local.state_file);
        let downloader = Downloader::new(&settings.http, &settings.local.staging_dir)?;

        Ok(Self {
            settings,
            sink,
            store,
            downloader,
            processing_date: Utc::now().date_naive(),
        })
    }

    /// Pin the processing date used for period fallbacks and
    /// ingestion-date partitions. Tests use this; production runs take
    /// today's date.
    pub fn with_processing_date(mut self, date: NaiveDate) -> Self {
        self.processing_date = date;
        self
    }

    /// Run one full ingestion pass over every configured dataset.
    ///
    /// Candidate-scoped failures are recorded and skipped; a failed listing
    /// or a ledger commit failure aborts the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut fingerprints = self.store.load()?;
        let mut summary = RunSummary::default();

        for dataset in &self.settings.datasets {
            info!(dataset = %dataset.name, "Processing dataset");

            let patterns = PatternSet::compile(&dataset.patterns)?;
            if patterns.is_empty() {
                warn!(dataset = %dataset.name, "No patterns configured; nothing will match");
            }

            let adapter = source::for_dataset(dataset, &self.settings.http)?;
            let candidates = adapter.list_candidates().await?;

            info!(
                dataset = %dataset.name,
                count = candidates.len(),
                "Discovered candidates"
            );

            for candidate in &candidates {
                let outcome = self
                    .process_candidate(dataset, &patterns, candidate, &mut fingerprints)
                    .await?;

                match &outcome {
                    CandidateOutcome::Rejected => {
                        info!(filename = %candidate.filename, "Rejected by pattern filter")
                    },
                    CandidateOutcome::Failed(e) => {
                        warn!(filename = %candidate.filename, error = %e, "Candidate failed")
                    },
                    CandidateOutcome::Unchanged => {
                        info!(key = %candidate.key, "No changes detected, skipping upload")
                    },
                    CandidateOutcome::Uploaded { destination } => {
                        info!(key = %candidate.key, destination = %destination, "Uploaded")
                    },
                }

                summary.record(&outcome);
            }
        }

        info!(
            uploaded = summary.uploaded,
            unchanged = summary.unchanged,
            rejected = summary.rejected,
            failed = summary.failed,
            "Ingestion finished"
        );

        Ok(summary)
    }

    /// Process one candidate to a terminal state.
    ///
    /// Candidate-scoped errors become `Failed` outcomes; anything else
    /// (ledger commit, store IO) propagates and aborts the run.
    async fn process_candidate(
        &self,
        dataset: &DatasetConfig,
        patterns: &PatternSet,
        candidate: &Candidate,
        fingerprints: &mut Fingerprints,
    ) -> Result<CandidateOutcome> {
        if !patterns.matches(&candidate.filename) {
            return Ok(CandidateOutcome::Rejected);
        }

        match self.ingest_candidate(dataset, candidate, fingerprints).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_candidate_scoped() => Ok(CandidateOutcome::Failed(e)),
            Err(e) => Err(e),
        }
    }

    async fn ingest_candidate(
        &self,
        dataset: &DatasetConfig,
        candidate: &Candidate,
        fingerprints: &mut Fingerprints,
    ) -> Result<CandidateOutcome> {
        let local_path = self
            .downloader
            .fetch(&candidate.url, &candidate.filename)
            .await?;

        let digest = compute_file_checksum(&local_path, ChecksumAlgorithm::Sha256)?;

        if fingerprints.get(&candidate.key) == Some(&digest) {
            return Ok(CandidateOutcome::Unchanged);
        }

        let destination = self.destination_key(dataset, &candidate.filename)?;
        self.sink.put_file(&local_path, &destination).await?;

        // Upload confirmed; commit the new fingerprint immediately so a
        // crash later in the run cannot lose it.
        fingerprints.insert(candidate.key.clone(), digest);
        self.store.commit(fingerprints)?;

        Ok(CandidateOutcome::Uploaded { destination })
    }

    /// Destination key in the durable store for one candidate file.
    fn destination_key(&self, dataset: &DatasetConfig, filename: &str) -> Result<String> {
        let raw_prefix = &self.settings.storage.raw_prefix;

        match dataset.partitioning {
            Partitioning::Period => {
                let period = period::extract(filename)?
                    .unwrap_or_else(|| Period::from_date(self.processing_date));

                Ok(format!(
                    "{}/{}/{}/{}",
                    raw_prefix,
                    dataset.name,
                    period.partition_segment(),
                    filename
                ))
            },
            Partitioning::IngestionDate => Ok(format!(
                "{}/{}/ingestion_date={}/{}",
                raw_prefix,
                dataset.name,
                self.processing_date.format("%Y-%m-%d"),
                filename
            )),
        }
    }
}
