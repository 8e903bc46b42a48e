//! Upstream metadata extractors.
//!
//! Each supported package family ships one extractor implementing
//! [`UpstreamParser`]: given the already-fetched upstream page text, it
//! pulls out the latest version string and a per-architecture download
//! URL. The set of families is small and closed, so extractors are plain
//! structs behind a trait object selected by the configuration `parser`
//! key — see [`parser_for`].
//!
//! Extraction is infallible by contract: a pattern miss, malformed
//! embedded JSON, or an unsupported architecture all yield `None`. The
//! orchestrator maps an absent version to "skip the package" and an
//! absent URL to "skip that architecture only".

mod navicat;
mod qq;

pub use navicat::NavicatPremiumCsParser;
pub use qq::QqParser;

use crate::models::Arch;

/// Version and URL extraction over fetched upstream page text.
pub trait UpstreamParser: Send + Sync {
    /// Extract the latest upstream version, if the page yields one.
    fn parse_version(&self, page: &str) -> Option<String>;

    /// Extract the download URL for one architecture, if the page (or the
    /// family's static table) yields one.
    fn parse_url(&self, arch: Arch, page: &str) -> Option<String>;
}

/// Resolve a configuration `parser` key to its extractor.
///
/// Returns `None` for unknown keys; configuration validation turns that
/// into a load-time error so the orchestrator never sees one.
pub fn parser_for(key: &str) -> Option<Box<dyn UpstreamParser>> {
    match key {
        "qq" => Some(Box::new(QqParser)),
        "navicat-premium-cs" => Some(Box::new(NavicatPremiumCsParser)),
        _ => None,
    }
}
