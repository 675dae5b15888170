//! Remote source adapters
//!
//! A source adapter answers one question: which files does the publisher
//! currently offer? Two variants exist behind the same seam, so the
//! orchestrator is written once:
//!
//! - [`StaticManifestSource`]: the dataset declares its file URL directly in
//!   configuration.
//! - [`ListingPageSource`]: a listing page is scraped for links starting
//!   with a configured prefix.

pub mod listing;
pub mod manifest;

pub use listing::ListingPageSource;
pub use manifest::StaticManifestSource;

use crate::config::{DatasetConfig, HttpConfig, SourceConfig};
use crate::error::Result;
use async_trait::async_trait;

/// A file offered by the remote source, before filename filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Fingerprint ledger key: the dataset name for static sources, the
    /// filename for scraped listings.
    pub key: String,

    /// Remote filename; drives pattern matching, staging, and the
    /// destination path.
    pub filename: String,

    /// Absolute URL to fetch.
    pub url: String,
}

/// Discovery seam between the orchestrator and the publisher
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// List the currently offered candidate files, in a deterministic order.
    ///
    /// Fails with `SourceUnavailable` when the listing itself cannot be
    /// obtained; an empty result is not an error.
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;
}

/// Build the adapter for a dataset's configured source.
pub fn for_dataset(
    dataset: &DatasetConfig,
    http: &HttpConfig,
) -> Result<Box<dyn SourceAdapter>> {
    match &dataset.source {
        SourceConfig::Static { url } => Ok(Box::new(StaticManifestSource::new(
            dataset.name.clone(),
            url.clone(),
        ))),
        SourceConfig::Listing {
            page_url,
            link_prefix,
        } => Ok(Box::new(ListingPageSource::new(
            page_url.clone(),
            link_prefix.clone(),
            http,
        )?)),
    }
}
