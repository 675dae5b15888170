//! Filename pattern matching
//!
//! Candidates are filtered before any download happens. Patterns use regex
//! search semantics: a match anywhere in the filename counts. Matching never
//! mutates state; each pattern's verdict is emitted at debug level for
//! diagnostics.

use crate::error::{IngestError, Result};
use regex::Regex;
use tracing::debug;

/// A compiled set of filename match patterns for one dataset
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile the configured pattern strings. An invalid pattern is a
    /// configuration error and fails run setup.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| IngestError::Config(format!("invalid pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// True when any pattern matches the filename.
    ///
    /// An empty set never matches: a dataset without patterns selects
    /// nothing, deliberately.
    pub fn matches(&self, filename: &str) -> bool {
        let mut matched = false;
        for pattern in &self.patterns {
            let hit = pattern.is_match(filename);
            debug!(
                filename = %filename,
                pattern = %pattern.as_str(),
                matched = hit,
                "Pattern check"
            );
            matched = matched || hit;
        }
        matched
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
