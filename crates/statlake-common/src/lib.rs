//! Statlake Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared building blocks for the statlake workspace members:
//!
//! - **Error Handling**: the workspace-wide error type and result alias
//! - **Checksums**: streaming content fingerprints for change detection
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use statlake_common::checksum::{compute_file_checksum, ChecksumAlgorithm};
//! use statlake_common::Result;
//!
//! fn fingerprint(path: &str) -> Result<String> {
//!     compute_file_checksum(path, ChecksumAlgorithm::Sha256)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, StatlakeError};
