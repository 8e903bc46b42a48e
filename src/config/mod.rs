//! Configuration loading and validation.
//!
//! aurup is driven by a single YAML document (`config.yaml` by default)
//! with two sections: global `settings` (download policy and run-level
//! concurrency) and a `packages` map describing every managed PKGBUILD.
//! Unknown keys are tolerated and every setting has a default, so a
//! minimal configuration only names packages.
//!
//! Configuration errors are the one class of failure allowed to terminate
//! a whole run: an unreadable file, invalid YAML, or a package referencing
//! an unknown parser is reported before any network or disk work starts.
//!
//! # Example
//!
//! ```yaml
//! settings:
//!   download:
//!     max_concurrent: 3
//!     max_retries: 3
//!     show_progress: true
//! packages:
//!   linuxqq:
//!     name: linuxqq
//!     fetch_url: https://im.qq.com/rainbow/linuxQQDownload
//!     parser: qq
//!     pkgbuild: pkgbuilds/linuxqq/PKGBUILD
//!     arch: [x86_64, aarch64, loong64, mips64el]
//!     default_extension: .deb
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_BASE_DELAY_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_DOWNLOAD_DIR,
    DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_MAX_CONCURRENT_PACKAGES, DEFAULT_MAX_RETRIES,
    DEFAULT_TIMEOUT_SECS,
};
use crate::hash::HashAlgorithm;
use crate::models::Arch;
use crate::parsers;

/// Download policy shared by every package update in a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Maximum simultaneously in-flight downloads for one package.
    pub max_concurrent: usize,
    /// Retries after a failed download attempt (`max_retries + 1` attempts total).
    pub max_retries: u32,
    /// Base delay in seconds for exponential retry backoff.
    pub base_delay: f64,
    /// Connect/overall timeout in seconds for upstream requests.
    pub timeout: u64,
    /// Streaming write granularity in bytes.
    pub chunk_size: usize,
    /// Whether to render per-download progress bars.
    pub show_progress: bool,
    /// Directory downloaded artifacts are written to.
    pub download_dir: PathBuf,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY_SECS,
            timeout: DEFAULT_TIMEOUT_SECS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            show_progress: true,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
        }
    }
}

impl DownloadSettings {
    /// The retry base delay as a [`Duration`].
    pub fn base_delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.base_delay.max(0.0))
    }

    /// The transport timeout as a [`Duration`].
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Global run settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Packages processed simultaneously in a multi-package run.
    ///
    /// Distinct from — and coarser than — the per-package download cap.
    pub max_concurrent_packages: usize,
    /// Download policy.
    pub download: DownloadSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_concurrent_packages: DEFAULT_MAX_CONCURRENT_PACKAGES,
            download: DownloadSettings::default(),
        }
    }
}

/// Identity and update policy for one managed package.
///
/// Immutable once loaded; the orchestrator only reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageConfig {
    /// Package name, also used in generated artifact file names.
    pub name: String,
    /// Human-readable upstream page, shown by `aurup list`. Never fetched.
    #[serde(default)]
    pub upstream: String,
    /// Metadata source fetched to discover the latest version.
    pub fetch_url: String,
    /// Extractor selector key, resolved via [`parsers::parser_for`].
    pub parser: String,
    /// Path to the PKGBUILD this package rewrites.
    pub pkgbuild: PathBuf,
    /// Supported architectures.
    #[serde(default)]
    pub arch: Vec<Arch>,
    /// Whether per-arch `source_<arch>` entries are rewritten on update.
    #[serde(default = "default_true")]
    pub update_source_url: bool,
    /// Re-download and rewrite checksums even when upstream is not newer.
    #[serde(default)]
    pub force_update: bool,
    /// Disabled packages are listed but skipped by whole-run updates.
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Checksum family the recipe publishes.
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    /// Optional epoch pinned into the recipe on update.
    #[serde(default)]
    pub epoch: Option<u64>,
    /// Externally declared digests per architecture. Normally empty: when
    /// present for an arch, the downloaded artifact must match or the
    /// package fails.
    #[serde(default)]
    pub expected_checksums: BTreeMap<Arch, String>,
    /// Extension used when the artifact URL carries none (e.g. `.deb`).
    #[serde(default)]
    pub default_extension: Option<String>,
}

/// The full configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Global run settings.
    #[serde(default)]
    pub settings: Settings,
    /// Managed packages, keyed by name.
    #[serde(default)]
    pub packages: BTreeMap<String, PackageConfig>,
}

impl Config {
    /// Load and validate a configuration file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a configuration document.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("invalid YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, pkg) in &self.packages {
            if pkg.name.is_empty() {
                bail!("package '{key}' has an empty name");
            }
            if parsers::parser_for(&pkg.parser).is_none() {
                bail!(
                    "package '{}' references unknown parser '{}'",
                    pkg.name,
                    pkg.parser
                );
            }
            if pkg.arch.is_empty() {
                bail!("package '{}' declares no supported architectures", pkg.name);
            }
        }
        Ok(())
    }

    /// Look up a package by name.
    pub fn package(&self, name: &str) -> Option<&PackageConfig> {
        self.packages.get(name)
    }

    /// Names of all enabled packages, in deterministic order.
    pub fn enabled_package_names(&self) -> Vec<String> {
        self.packages
            .values()
            .filter(|p| p.enable)
            .map(|p| p.name.clone())
            .collect()
    }
}

fn default_true() -> bool {
    true
}
