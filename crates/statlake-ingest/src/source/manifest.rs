//! Static-manifest source: the dataset's file URL is declared in settings

use super::{Candidate, SourceAdapter};
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use url::Url;

/// Source adapter that returns the configured dataset URL verbatim
pub struct StaticManifestSource {
    dataset: String,
    url: String,
}

impl StaticManifestSource {
    pub fn new(dataset: String, url: String) -> Self {
        Self { dataset, url }
    }
}

#[async_trait]
impl SourceAdapter for StaticManifestSource {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let filename = filename_of(&self.url)?;

        Ok(vec![Candidate {
            key: self.dataset.clone(),
            filename,
            url: self.url.clone(),
        }])
    }
}

/// Last path segment of the URL, the remote filename.
fn filename_of(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| IngestError::SourceUnavailable(format!("invalid URL '{}': {}", raw, e)))?;

    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .ok_or_else(|| {
            IngestError::SourceUnavailable(format!("URL '{}' has no filename component", raw))
        })
}
