//! Streaming file hashing and verification.
//!
//! Digests are computed with a fixed-size read loop so artifact size never
//! affects peak memory. Both SHA-256 and SHA-512 are supported because
//! PKGBUILDs in the wild publish either family; a multi-digest helper
//! serves recipes that publish more than one.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use tokio::io::AsyncReadExt;

use crate::constants::HASH_CHUNK_SIZE;

/// Hash algorithms understood by the recipe format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// The lowercase name used in configuration and PKGBUILD field prefixes
    /// (`sha256`, `sha512`).
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl Default for HashAlgorithm {
    /// PKGBUILDs maintained by this tool publish SHA-512 sums by default.
    fn default() -> Self {
        HashAlgorithm::Sha512
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(HashError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Errors from digest computation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HashError {
    /// The file to hash does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Reading the file failed after it was opened.
    #[error("failed to read {path}: {reason}")]
    Io {
        /// The file being hashed.
        path: PathBuf,
        /// The underlying I/O error text.
        reason: String,
    },

    /// The algorithm name is not one of the supported set.
    #[error("unsupported hash algorithm '{0}', supported: sha256, sha512")]
    UnsupportedAlgorithm(String),
}

/// Compute the hex digest of a file with the given algorithm.
///
/// The file is read in [`HASH_CHUNK_SIZE`] chunks; it is never loaded
/// whole. A missing file yields [`HashError::FileNotFound`] distinct from
/// other I/O failures.
pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String, HashError> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HashError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(HashError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    match algorithm {
        HashAlgorithm::Sha256 => digest_reader::<Sha256>(file, path).await,
        HashAlgorithm::Sha512 => digest_reader::<Sha512>(file, path).await,
    }
}

async fn digest_reader<D: Digest>(
    mut file: tokio::fs::File,
    path: &Path,
) -> Result<String, HashError> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await.map_err(|e| HashError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file against an expected hex digest, case-insensitively.
///
/// Returns `false` (never an error) for any computation failure, including
/// a missing file.
pub async fn verify_file_hash(path: &Path, expected: &str, algorithm: HashAlgorithm) -> bool {
    match hash_file(path, algorithm).await {
        Ok(actual) => actual.eq_ignore_ascii_case(expected),
        Err(_) => false,
    }
}

/// Compute several digests of one file in a single call.
///
/// Used for recipes that publish more than one checksum family.
pub async fn hash_file_multi(
    path: &Path,
    algorithms: &[HashAlgorithm],
) -> Result<BTreeMap<HashAlgorithm, String>, HashError> {
    let mut digests = BTreeMap::new();
    for &algorithm in algorithms {
        digests.insert(algorithm, hash_file(path, algorithm).await?);
    }
    Ok(digests)
}
