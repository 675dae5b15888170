//! Statlake Ingest Library
//!
//! Change-detecting ingestion of periodically-published statistical files
//! into a partitioned, date-organized object store.
//!
//! Each run discovers candidate files at a remote source (a scraped listing
//! page or a static manifest), filters them by filename pattern, downloads
//! the survivors, and fingerprints their content. Only content whose digest
//! differs from the committed ledger is uploaded, under a partition path
//! derived from the file's embedded year/month period. The ledger commit
//! follows every successful upload, so re-running is always safe.
//!
//! # Example
//!
//! ```no_run
//! use statlake_ingest::config::Settings;
//! use statlake_ingest::pipeline::IngestPipeline;
//! use statlake_ingest::storage::Storage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(std::path::Path::new("config/settings.yaml"))?;
//!     let storage = Storage::new(&settings.storage).await?;
//!     let summary = IngestPipeline::new(&settings, &storage)?.run().await?;
//!     println!("{} file(s) uploaded", summary.uploaded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod layout;
pub mod pattern;
pub mod period;
pub mod pipeline;
pub mod source;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use error::{IngestError, Result};
pub use pipeline::{CandidateOutcome, IngestPipeline, RunSummary};
