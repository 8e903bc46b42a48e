//! Global constants used throughout the aurup codebase.
//!
//! This module contains default download policy values, well-known file
//! names, and other constants shared across modules. Defining them
//! centrally keeps the serde defaults in `config` and the documentation
//! in sync.

/// Default configuration file name, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Directory downloaded artifacts are written to unless overridden in the
/// configuration (`settings.download.download_dir`).
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// User agent sent with every upstream request.
pub const USER_AGENT: &str = concat!("aurup/", env!("CARGO_PKG_VERSION"));

/// Environment variable that disables all progress indicators when set.
///
/// The `--no-progress` flag sets this for the current process, so both
/// paths share one switch.
pub const NO_PROGRESS_ENV: &str = "AURUP_NO_PROGRESS";

/// Default cap on simultaneously in-flight artifact downloads for one package.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// Default cap on packages updated simultaneously in a multi-package run.
///
/// Deliberately coarser than the download cap: every package update holds
/// its own download limiter, so total transfer concurrency is bounded by
/// the product of the two.
pub const DEFAULT_MAX_CONCURRENT_PACKAGES: usize = 4;

/// Default number of retries after a failed download attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay in seconds for exponential download backoff.
///
/// The wait before retry `k` (1-based) is `base * 2^(k-1)`; the first
/// attempt never waits.
pub const DEFAULT_BASE_DELAY_SECS: f64 = 1.0;

/// Default connect/overall timeout in seconds for upstream requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default granularity in bytes for streaming writes during download.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Read buffer size in bytes for streaming file hashing.
pub const HASH_CHUNK_SIZE: usize = 8192;
