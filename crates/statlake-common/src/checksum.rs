//! Streaming checksum utilities
//!
//! Content fingerprints drive the change-detection ledger: a file is only
//! re-published when its digest differs from the last committed one. Digests
//! are computed by streaming fixed-size chunks, so memory use stays bounded
//! regardless of file size.

use crate::error::{Result, StatlakeError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::io::Read;
use std::path::Path;

/// Read buffer size for streaming digests
const CHUNK_SIZE: usize = 8192;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

/// Compute the hex digest of a file's full byte content
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute the hex digest of any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => hash_reader::<Sha256, R>(reader),
        ChecksumAlgorithm::Sha512 => hash_reader::<Sha512, R>(reader),
    }
}

fn hash_reader<D: Digest, R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify that a file's content matches an expected digest
pub fn verify_file_checksum(
    path: impl AsRef<Path>,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<bool> {
    let actual = compute_file_checksum(path, algorithm)?;
    if actual == expected {
        Ok(true)
    } else {
        Err(StatlakeError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
