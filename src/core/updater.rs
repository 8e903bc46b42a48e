//! The per-package update state machine and multi-package fan-out.
//!
//! [`PackageUpdater`] drives one package through
//! `FetchingMetadata → Comparing → (UpToDate | Downloading) → Verifying →
//! Mutating → Saved`, with `Failed` reachable from any state. The states
//! are explicit values surfaced in log lines, and the result is a
//! [`UpdateReport`] carrying the failure reason and per-architecture
//! detail — control flow is never exception-shaped, so partial success
//! (some architectures updated, others skipped) stays representable.
//!
//! Multi-package runs execute each package's state machine independently
//! under a package-level concurrency cap that is distinct from (and
//! coarser than) the per-package download cap; every package-update call
//! gets its own download limiter. One package failing never blocks or
//! rolls back another.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use tracing::{debug, info, warn};

use crate::config::{Config, PackageConfig};
use crate::core::error::UpdateError;
use crate::download::{DownloadRequest, Downloader};
use crate::fetch::{ArtifactFetcher, HttpFetcher};
use crate::models::Arch;
use crate::parsers;
use crate::pkgbuild::{PkgbuildEditor, RecipeUpdate};
use crate::utils::url::generate_download_filename;
use crate::version;

/// States of one package's update, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    /// Fetching and parsing upstream metadata.
    FetchingMetadata,
    /// Comparing the upstream version against the recipe.
    Comparing,
    /// Downloading artifacts for every supported architecture.
    Downloading,
    /// Computing and checking artifact digests.
    Verifying,
    /// Rewriting recipe fields in memory.
    Mutating,
    /// Recipe persisted; terminal success.
    Saved,
    /// Upstream is not newer; terminal success with no side effects.
    UpToDate,
    /// Terminal failure.
    Failed,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateState::FetchingMetadata => "fetching metadata",
            UpdateState::Comparing => "comparing versions",
            UpdateState::Downloading => "downloading",
            UpdateState::Verifying => "verifying",
            UpdateState::Mutating => "mutating recipe",
            UpdateState::Saved => "saved",
            UpdateState::UpToDate => "up to date",
            UpdateState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of one package update.
#[derive(Debug, Clone)]
pub enum UpdateStatus {
    /// The recipe was rewritten and persisted.
    Updated {
        /// The version written into the recipe (unchanged for forced
        /// checksum-only refreshes).
        version: String,
    },
    /// Upstream is not newer and no refresh was forced; nothing touched.
    UpToDate,
    /// The update failed with a reason.
    Failed(UpdateError),
}

impl UpdateStatus {
    /// Whether this outcome counts as success for exit-code purposes.
    pub fn is_success(&self) -> bool {
        !matches!(self, UpdateStatus::Failed(_))
    }
}

/// Per-package result of an update run.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    /// The package this report belongs to.
    pub package: String,
    /// Terminal outcome.
    pub status: UpdateStatus,
    /// Architectures whose checksums were refreshed in the recipe.
    pub updated_archs: Vec<Arch>,
    /// Architectures skipped or failed while the package itself succeeded
    /// (or before it failed).
    pub arch_failures: Vec<(Arch, UpdateError)>,
}

impl UpdateReport {
    fn failed(package: &str, error: UpdateError) -> Self {
        Self {
            package: package.to_string(),
            status: UpdateStatus::Failed(error),
            updated_archs: Vec::new(),
            arch_failures: Vec::new(),
        }
    }

    /// Whether this package's update counts as success.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Orchestrates package updates over a fetch capability and configuration.
pub struct PackageUpdater {
    config: Config,
    fetcher: Arc<dyn ArtifactFetcher>,
}

impl PackageUpdater {
    /// Create an updater with the production HTTP fetcher.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config.settings.download)?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
        })
    }

    /// Create an updater over a custom fetch capability.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn ArtifactFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Update one named package.
    ///
    /// Explicitly named packages are updated even when disabled in the
    /// configuration; the `enable` flag only scopes whole-run updates.
    pub async fn update_package(&self, name: &str) -> UpdateReport {
        let Some(pkg) = self.config.package(name) else {
            return UpdateReport::failed(
                name,
                UpdateError::UnknownPackage {
                    name: name.to_string(),
                },
            );
        };

        match self.try_update(pkg).await {
            Ok(report) => report,
            Err(error) => {
                warn!(package = %pkg.name, state = %UpdateState::Failed, "{error}");
                UpdateReport::failed(&pkg.name, error)
            }
        }
    }

    /// Update a set of named packages concurrently.
    ///
    /// Bounded by `settings.max_concurrent_packages`; reports are returned
    /// sorted by package name regardless of completion order.
    pub async fn update_packages(&self, names: &[String]) -> Vec<UpdateReport> {
        let cap = self.config.settings.max_concurrent_packages.max(1);
        let mut reports: Vec<UpdateReport> =
            stream::iter(names.iter().map(|name| self.update_package(name)))
                .buffer_unordered(cap)
                .collect()
                .await;
        reports.sort_by(|a, b| a.package.cmp(&b.package));
        reports
    }

    /// Update every enabled package.
    pub async fn update_all(&self) -> Vec<UpdateReport> {
        let names = self.config.enabled_package_names();
        self.update_packages(&names).await
    }

    async fn try_update(&self, pkg: &PackageConfig) -> Result<UpdateReport, UpdateError> {
        // FETCHING_METADATA
        debug!(package = %pkg.name, state = %UpdateState::FetchingMetadata, url = %pkg.fetch_url);
        let parser = parsers::parser_for(&pkg.parser).ok_or_else(|| {
            // configuration validation makes this unreachable in practice
            UpdateError::MetadataUnavailable {
                package: pkg.name.clone(),
                reason: format!("unknown parser '{}'", pkg.parser),
            }
        })?;

        let page = self.fetcher.fetch_text(&pkg.fetch_url).await.map_err(|e| {
            UpdateError::MetadataUnavailable {
                package: pkg.name.clone(),
                reason: e.to_string(),
            }
        })?;

        let latest =
            parser
                .parse_version(&page)
                .ok_or_else(|| UpdateError::MetadataUnavailable {
                    package: pkg.name.clone(),
                    reason: "no version found in upstream metadata".to_string(),
                })?;

        // COMPARING
        debug!(package = %pkg.name, state = %UpdateState::Comparing, upstream = %latest);
        let mut editor = PkgbuildEditor::load(&pkg.pkgbuild).await.map_err(|e| {
            UpdateError::PersistenceFailure {
                path: pkg.pkgbuild.clone(),
                reason: e.to_string(),
            }
        })?;

        let current = editor.pkgver().ok_or_else(|| UpdateError::RecipeFieldNotFound {
            field: "pkgver".to_string(),
            path: pkg.pkgbuild.clone(),
        })?;

        let version_changed = version::is_newer(&latest, &current);
        if !version_changed && !pkg.force_update {
            info!(package = %pkg.name, version = %current, state = %UpdateState::UpToDate);
            return Ok(UpdateReport {
                package: pkg.name.clone(),
                status: UpdateStatus::UpToDate,
                updated_archs: Vec::new(),
                arch_failures: Vec::new(),
            });
        }

        // DOWNLOADING
        debug!(package = %pkg.name, state = %UpdateState::Downloading, version = %latest);
        let mut arch_failures: Vec<(Arch, UpdateError)> = Vec::new();
        let mut requests: BTreeMap<Arch, DownloadRequest> = BTreeMap::new();
        let mut dests: BTreeMap<Arch, std::path::PathBuf> = BTreeMap::new();
        let mut urls: BTreeMap<Arch, String> = BTreeMap::new();

        for &arch in &pkg.arch {
            match parser.parse_url(arch, &page) {
                Some(url) => {
                    let filename = generate_download_filename(
                        &pkg.name,
                        &latest,
                        arch,
                        &url,
                        pkg.default_extension.as_deref(),
                    );
                    let dest = self.config.settings.download.download_dir.join(filename);
                    dests.insert(arch, dest.clone());
                    urls.insert(arch, url.clone());
                    requests.insert(arch, DownloadRequest { url, dest });
                }
                None => {
                    warn!(package = %pkg.name, %arch, "no download URL resolved, skipping architecture");
                    arch_failures.push((arch, UpdateError::ArchUrlUnresolved { arch }));
                }
            }
        }

        if requests.is_empty() {
            return Err(UpdateError::AllDownloadsFailed {
                package: pkg.name.clone(),
            });
        }

        let downloader = Downloader::new(
            Arc::clone(&self.fetcher),
            self.config.settings.download.clone(),
        );
        let outcomes = downloader.download_all(&pkg.name, requests).await;

        // VERIFYING
        debug!(package = %pkg.name, state = %UpdateState::Verifying);
        let mut checksums: BTreeMap<Arch, String> = BTreeMap::new();

        for (&arch, outcome) in &outcomes {
            let Some(path) = outcome.file_path() else {
                // exhausted retries; drop the partial file, keep siblings going
                if let Some(dest) = dests.get(&arch) {
                    tokio::fs::remove_file(dest).await.ok();
                }
                arch_failures.push((
                    arch,
                    UpdateError::DownloadFailed {
                        arch,
                        retries: outcome.retries(),
                        reason: outcome.error().unwrap_or("unknown error").to_string(),
                    },
                ));
                continue;
            };

            let digest = match crate::hash::hash_file(path, pkg.hash_algorithm).await {
                Ok(digest) => digest,
                Err(e) => {
                    tokio::fs::remove_file(path).await.ok();
                    arch_failures.push((
                        arch,
                        UpdateError::HashFailed {
                            arch,
                            reason: e.to_string(),
                        },
                    ));
                    continue;
                }
            };

            if let Some(expected) = pkg.expected_checksums.get(&arch) {
                if !digest.eq_ignore_ascii_case(expected) {
                    tokio::fs::remove_file(path).await.ok();
                    return Err(UpdateError::ChecksumMismatch {
                        arch,
                        expected: expected.clone(),
                        actual: digest,
                    });
                }
            }

            checksums.insert(arch, digest);
        }

        if checksums.is_empty() {
            return Err(UpdateError::AllDownloadsFailed {
                package: pkg.name.clone(),
            });
        }

        // MUTATING
        debug!(package = %pkg.name, state = %UpdateState::Mutating);
        let mut update = RecipeUpdate {
            algorithm: pkg.hash_algorithm,
            epoch: pkg.epoch,
            ..RecipeUpdate::default()
        };
        if version_changed {
            update.version = Some(latest.clone());
            update.pkgrel = Some(1);
        }

        // Single-arch recipes without a per-arch sums entry publish the
        // generic form; read-before-write decides, since a write against a
        // missing field would silently no-op.
        let use_generic = pkg.arch.len() == 1
            && checksums.len() == 1
            && editor.checksum(Some(pkg.arch[0]), pkg.hash_algorithm).is_none();
        if use_generic {
            update.generic_checksum = checksums.values().next().cloned();
        } else {
            update.arch_checksums = checksums.clone();
        }

        if pkg.update_source_url {
            update.source_urls = urls
                .into_iter()
                .filter(|(arch, _)| checksums.contains_key(arch))
                .collect();
        }

        editor.apply_update(&update);

        if version_changed && editor.pkgver().as_deref() != Some(latest.as_str()) {
            return Err(UpdateError::RecipeFieldNotFound {
                field: "pkgver".to_string(),
                path: pkg.pkgbuild.clone(),
            });
        }

        // SAVED
        editor.save().await.map_err(|e| UpdateError::PersistenceFailure {
            path: pkg.pkgbuild.clone(),
            reason: e.to_string(),
        })?;
        info!(
            package = %pkg.name,
            version = %latest,
            archs = checksums.len(),
            state = %UpdateState::Saved,
        );

        Ok(UpdateReport {
            package: pkg.name.clone(),
            status: UpdateStatus::Updated { version: latest },
            updated_archs: checksums.keys().copied().collect(),
            arch_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{ArtifactStream, FetchError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher serving a fixed metadata page and artifact body, counting
    /// stream opens so tests can assert no downloads happened.
    struct FixtureFetcher {
        page: String,
        body: Vec<u8>,
        streams_opened: AtomicUsize,
    }

    impl FixtureFetcher {
        fn new(page: &str, body: &[u8]) -> Self {
            Self {
                page: page.to_string(),
                body: body.to_vec(),
                streams_opened: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ArtifactFetcher for FixtureFetcher {
        async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
            Ok(self.page.clone())
        }

        async fn open_stream(&self, _url: &str) -> Result<ArtifactStream, FetchError> {
            self.streams_opened.fetch_add(1, Ordering::SeqCst);
            let chunks = vec![Ok(Bytes::from(self.body.clone()))];
            Ok(ArtifactStream::new(
                Some(self.body.len() as u64),
                futures::stream::iter(chunks),
            ))
        }
    }

    const NAVICAT_PKGBUILD: &str = "\
pkgname=navicat-premium-cs
pkgver=17.0.0
pkgrel=3
source_x86_64=('https://old.example.com/navicat-x86_64.AppImage')
source_aarch64=('https://old.example.com/navicat-aarch64.AppImage')
sha512sums_x86_64=('oldsum')
sha512sums_aarch64=('oldsum')
";

    fn fixture_config(dir: &std::path::Path, force_update: bool) -> Config {
        let pkgbuild = dir.join("PKGBUILD");
        let downloads = dir.join("downloads");
        let text = format!(
            r#"
settings:
  download:
    show_progress: false
    download_dir: {downloads}
packages:
  navicat-premium-cs:
    name: navicat-premium-cs
    fetch_url: https://example.com/release-note
    parser: navicat-premium-cs
    pkgbuild: {pkgbuild}
    arch: [x86_64, aarch64]
    force_update: {force_update}
"#,
            downloads = downloads.display(),
            pkgbuild = pkgbuild.display(),
        );
        Config::parse(&text).unwrap()
    }

    #[tokio::test]
    async fn unknown_package_fails_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKGBUILD"), NAVICAT_PKGBUILD).unwrap();
        let fetcher = Arc::new(FixtureFetcher::new("", b""));
        let updater = PackageUpdater::with_fetcher(fixture_config(dir.path(), false), fetcher);

        let report = updater.update_package("no-such-package").await;
        assert!(!report.is_success());
        assert!(matches!(
            report.status,
            UpdateStatus::Failed(UpdateError::UnknownPackage { .. })
        ));
    }

    #[tokio::test]
    async fn equal_version_without_force_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKGBUILD"), NAVICAT_PKGBUILD).unwrap();

        let page = "Navicat Premium CS (Linux) updated to version 17.0.0";
        let fetcher = Arc::new(FixtureFetcher::new(page, b"artifact"));
        let updater =
            PackageUpdater::with_fetcher(fixture_config(dir.path(), false), fetcher.clone());

        let report = updater.update_package("navicat-premium-cs").await;
        assert!(matches!(report.status, UpdateStatus::UpToDate));

        // no artifact traffic beyond the metadata fetch, recipe untouched
        assert_eq!(fetcher.streams_opened.load(Ordering::SeqCst), 0);
        let on_disk = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
        assert_eq!(on_disk, NAVICAT_PKGBUILD);
    }

    #[tokio::test]
    async fn newer_version_rewrites_the_recipe() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKGBUILD"), NAVICAT_PKGBUILD).unwrap();

        let page = "Navicat Premium CS (Linux) updated to version 17.3.5";
        let body = b"new artifact bytes";
        let fetcher = Arc::new(FixtureFetcher::new(page, body));
        let updater = PackageUpdater::with_fetcher(fixture_config(dir.path(), false), fetcher);

        let report = updater.update_package("navicat-premium-cs").await;
        assert!(report.is_success(), "status: {:?}", report.status);
        assert!(matches!(
            &report.status,
            UpdateStatus::Updated { version } if version == "17.3.5"
        ));
        assert_eq!(report.updated_archs, vec![Arch::X86_64, Arch::Aarch64]);

        let on_disk = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
        assert!(on_disk.contains("pkgver=17.3.5"));
        assert!(on_disk.contains("pkgrel=1"));

        let expected_digest = {
            use sha2::{Digest, Sha512};
            hex::encode(Sha512::digest(body))
        };
        assert!(on_disk.contains(&format!("sha512sums_x86_64=('{expected_digest}')")));
        assert!(on_disk.contains(&format!("sha512sums_aarch64=('{expected_digest}')")));
        // source URLs rewritten to the vendor's static table
        assert!(on_disk.contains("source_x86_64=('https://dn.navicat.com/download/navicat17-premium-cs-x86_64.AppImage')"));
    }

    #[tokio::test]
    async fn forced_refresh_keeps_version_and_release() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKGBUILD"), NAVICAT_PKGBUILD).unwrap();

        let page = "Navicat Premium CS (Linux) updated to version 17.0.0";
        let body = b"silently reissued artifact";
        let fetcher = Arc::new(FixtureFetcher::new(page, body));
        let updater = PackageUpdater::with_fetcher(fixture_config(dir.path(), true), fetcher);

        let report = updater.update_package("navicat-premium-cs").await;
        assert!(report.is_success(), "status: {:?}", report.status);

        let on_disk = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
        // version and release untouched, checksums refreshed
        assert!(on_disk.contains("pkgver=17.0.0"));
        assert!(on_disk.contains("pkgrel=3"));
        assert!(!on_disk.contains("oldsum"));
    }

    #[tokio::test]
    async fn metadata_without_version_fails_the_package() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKGBUILD"), NAVICAT_PKGBUILD).unwrap();

        let fetcher = Arc::new(FixtureFetcher::new("maintenance page, no version", b""));
        let updater = PackageUpdater::with_fetcher(fixture_config(dir.path(), false), fetcher);

        let report = updater.update_package("navicat-premium-cs").await;
        assert!(matches!(
            report.status,
            UpdateStatus::Failed(UpdateError::MetadataUnavailable { .. })
        ));
    }
}
