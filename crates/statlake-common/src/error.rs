//! Error types shared across the statlake workspace

use thiserror::Error;

/// Result type alias for statlake operations
pub type Result<T> = std::result::Result<T, StatlakeError>;

/// Workspace-wide error type
#[derive(Error, Debug)]
pub enum StatlakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
