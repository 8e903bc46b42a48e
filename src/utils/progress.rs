//! Download progress indicators.
//!
//! Wraps [`indicatif`] with the conventions used across aurup: one byte
//! bar per in-flight artifact under a shared [`MultiProgress`], automatic
//! disabling via the `AURUP_NO_PROGRESS` environment variable (set by the
//! `--no-progress` flag), and hidden bars when disabled so call sites
//! never branch.
//!
//! Progress is strictly a side channel: download outcomes are identical
//! whether or not bars are rendered.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::constants::NO_PROGRESS_ENV;
use crate::models::Arch;

/// Checks whether progress bars are globally disabled.
///
/// Set `AURUP_NO_PROGRESS` to any value to disable all progress output;
/// useful for CI and when piping output.
pub fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

fn byte_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:>24.bold} {bar:30.cyan/blue} {bytes:>10}/{total_bytes:<10} {bytes_per_sec:>12}",
    )
    .expect("static progress template")
    .progress_chars("=> ")
}

/// Per-batch progress container for one package's downloads.
///
/// When disabled (either by configuration or the global switch) every bar
/// it hands out is hidden, so the downloader's reporting path is identical
/// in both modes.
#[derive(Debug)]
pub struct DownloadProgress {
    multi: MultiProgress,
    enabled: bool,
}

impl DownloadProgress {
    /// Create a progress container.
    ///
    /// `enabled` normally comes from `settings.download.show_progress`; the
    /// global disable switch overrides it.
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            enabled: enabled && !is_progress_disabled(),
        }
    }

    /// Whether bars will actually render.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Add a byte bar for one (package, architecture) download.
    ///
    /// The bar starts with an unknown length; the downloader sets the
    /// length once the server declares a content length.
    pub fn add_download(&self, package: &str, arch: Arch) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let bar = self.multi.add(ProgressBar::no_length());
        bar.set_style(byte_bar_style());
        bar.set_prefix(format!("[{package}] {arch}"));
        bar
    }
}
