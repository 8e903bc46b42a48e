//! Error taxonomy for package updates.
//!
//! Every way a package update can fail is an explicit [`UpdateError`]
//! variant, so partial success (some architectures updated, others not) is
//! representable and testable rather than exception-shaped. Transport and
//! parse failures are converted into these values at their origin and
//! never unwind past a component boundary; one package's error never
//! aborts its siblings.
//!
//! "No update needed" is deliberately *not* here — it is the `UpToDate`
//! outcome, a success with no side effects.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Arch;

/// Failure reasons for a package update, or for one of its architectures.
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    /// The upstream metadata could not be fetched, or no version could be
    /// extracted from it. The package is skipped and reported; the fetch is
    /// not retried at this layer.
    #[error("cannot determine upstream version for '{package}': {reason}")]
    MetadataUnavailable {
        /// The affected package.
        package: String,
        /// Fetch or extraction failure text.
        reason: String,
    },

    /// No download URL could be extracted for one architecture. Only that
    /// architecture is skipped; siblings proceed.
    #[error("no download URL resolved for architecture {arch}")]
    ArchUrlUnresolved {
        /// The affected architecture.
        arch: Arch,
    },

    /// All retries were exhausted for one architecture's download.
    #[error("download failed for {arch} after {retries} retries: {reason}")]
    DownloadFailed {
        /// The affected architecture.
        arch: Arch,
        /// Retries consumed.
        retries: u32,
        /// The last attempt's error text.
        reason: String,
    },

    /// Every architecture of the package failed to produce an artifact.
    #[error("all architecture downloads failed for '{package}'")]
    AllDownloadsFailed {
        /// The affected package.
        package: String,
    },

    /// A downloaded artifact did not match its externally declared digest.
    /// The artifact is not promoted into the recipe and the package fails.
    #[error("checksum mismatch for {arch}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The affected architecture.
        arch: Arch,
        /// The declared digest.
        expected: String,
        /// The computed digest.
        actual: String,
    },

    /// Digest computation failed for a downloaded artifact.
    #[error("hashing failed for {arch}: {reason}")]
    HashFailed {
        /// The affected architecture.
        arch: Arch,
        /// The hash error text.
        reason: String,
    },

    /// A recipe field targeted by the update was never rewritten.
    ///
    /// Field writes silently no-op on missing patterns; this surfaces when
    /// the post-mutation read-back shows the update did not land.
    #[error("recipe field '{field}' not found in {path}")]
    RecipeFieldNotFound {
        /// The missing field.
        field: String,
        /// The recipe path.
        path: PathBuf,
    },

    /// Reading or writing the recipe file failed.
    #[error("failed to persist {path}: {reason}")]
    PersistenceFailure {
        /// The recipe path.
        path: PathBuf,
        /// Underlying I/O error text.
        reason: String,
    },

    /// The requested package is not present in the configuration.
    #[error("package '{name}' is not defined in the configuration")]
    UnknownPackage {
        /// The requested name.
        name: String,
    },
}
