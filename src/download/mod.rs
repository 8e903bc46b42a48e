//! Concurrent artifact downloading with retry and backoff.
//!
//! One [`Downloader`] serves one package-update call: all of the package's
//! per-architecture artifacts are handed over as a single batch and run
//! concurrently, bounded by a semaphore. Each request retries
//! independently with exponential backoff; the permit acquired for a
//! request is held across its retries, so a retrying download never
//! consumes a second slot.
//!
//! Bodies are streamed to disk in bounded chunks, so peak memory does not
//! depend on artifact size. Every request produces exactly one
//! [`DownloadOutcome`]; outcomes are never patched in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::DownloadSettings;
use crate::fetch::ArtifactFetcher;
use crate::models::Arch;
use crate::utils::progress::DownloadProgress;

/// One artifact to download: source URL and destination path.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// The artifact URL.
    pub url: String,
    /// Where the artifact is written.
    pub dest: PathBuf,
}

/// The immutable result of one download attempt sequence.
///
/// Success and failure are mutually exclusive by construction: a
/// successful outcome carries the resolved file path, a failed one carries
/// the last error text.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    arch: Arch,
    result: Result<PathBuf, String>,
    retries: u32,
    elapsed: Duration,
    bytes_downloaded: u64,
}

impl DownloadOutcome {
    /// The architecture this outcome belongs to.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Whether the download succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The downloaded file path; present exactly when the download succeeded.
    pub fn file_path(&self) -> Option<&Path> {
        self.result.as_deref().ok()
    }

    /// The last error; present exactly when the download failed.
    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }

    /// Retries consumed (attempts used minus one).
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Wall time spent on this request, including backoff waits.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Bytes written by the successful attempt; zero on failure.
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }
}

/// Semaphore-bounded batch downloader with per-request retry/backoff.
pub struct Downloader {
    fetcher: Arc<dyn ArtifactFetcher>,
    settings: DownloadSettings,
    limiter: Arc<Semaphore>,
}

impl Downloader {
    /// Create a downloader over the given fetch capability and policy.
    pub fn new(fetcher: Arc<dyn ArtifactFetcher>, settings: DownloadSettings) -> Self {
        let limiter = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));
        Self {
            fetcher,
            settings,
            limiter,
        }
    }

    /// Download a batch of artifacts concurrently.
    ///
    /// All requests run at once, subject only to the concurrency limiter;
    /// there is no ordering between architectures. The returned map holds
    /// one outcome per request, success or not.
    pub async fn download_all(
        &self,
        package: &str,
        requests: BTreeMap<Arch, DownloadRequest>,
    ) -> BTreeMap<Arch, DownloadOutcome> {
        if requests.is_empty() {
            return BTreeMap::new();
        }

        let progress = DownloadProgress::new(self.settings.show_progress);
        let tasks = requests.into_iter().map(|(arch, request)| {
            let bar = progress.add_download(package, arch);
            async move { (arch, self.download_one(arch, request, bar).await) }
        });

        futures::future::join_all(tasks).await.into_iter().collect()
    }

    /// Run one request through the retry loop, holding a limiter permit
    /// for the whole sequence.
    async fn download_one(
        &self,
        arch: Arch,
        request: DownloadRequest,
        bar: ProgressBar,
    ) -> DownloadOutcome {
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return DownloadOutcome {
                    arch,
                    result: Err("download limiter closed".to_string()),
                    retries: 0,
                    elapsed: Duration::ZERO,
                    bytes_downloaded: 0,
                };
            }
        };

        let started = Instant::now();
        let mut last_error = String::new();

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.settings.base_delay_duration(), attempt);
                debug!(
                    %arch,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying download after backoff"
                );
                tokio::time::sleep(delay).await;
                bar.set_position(0);
            }

            match self.attempt(&request, &bar).await {
                Ok(bytes) => {
                    bar.finish();
                    return DownloadOutcome {
                        arch,
                        result: Ok(request.dest.clone()),
                        retries: attempt,
                        elapsed: started.elapsed(),
                        bytes_downloaded: bytes,
                    };
                }
                Err(e) => {
                    warn!(%arch, url = %request.url, attempt, "download attempt failed: {e}");
                    last_error = e;
                }
            }
        }

        bar.abandon();
        DownloadOutcome {
            arch,
            result: Err(last_error),
            retries: self.settings.max_retries,
            elapsed: started.elapsed(),
            bytes_downloaded: 0,
        }
    }

    /// One attempt: open the stream and write it out in bounded chunks.
    async fn attempt(&self, request: &DownloadRequest, bar: &ProgressBar) -> Result<u64, String> {
        if let Some(parent) = request.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }

        let mut stream = self
            .fetcher
            .open_stream(&request.url)
            .await
            .map_err(|e| e.to_string())?;

        if let Some(total) = stream.content_length() {
            bar.set_length(total);
        }

        let mut file = tokio::fs::File::create(&request.dest)
            .await
            .map_err(|e| format!("failed to create {}: {e}", request.dest.display()))?;

        let chunk_size = self.settings.chunk_size.max(1);
        let mut written = 0u64;

        while let Some(chunk) = stream.next_chunk().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            for piece in chunk.chunks(chunk_size) {
                file.write_all(piece)
                    .await
                    .map_err(|e| format!("failed to write {}: {e}", request.dest.display()))?;
                written += piece.len() as u64;
                bar.inc(piece.len() as u64);
            }
        }

        file.flush()
            .await
            .map_err(|e| format!("failed to flush {}: {e}", request.dest.display()))?;

        Ok(written)
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << (attempt - 1).min(16))
}
