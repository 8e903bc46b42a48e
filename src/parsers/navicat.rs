//! Extractor for Navicat Premium CS releases.
//!
//! The vendor publishes release notes as free text; the version is matched
//! out of it anchored on the product-name/platform marker. Download URLs
//! are version-invariant, so no page parsing is involved — they come from
//! a static per-architecture table (Linux builds exist for x86_64 and
//! aarch64 only).

use std::sync::LazyLock;

use regex::Regex;

use super::UpstreamParser;
use crate::models::Arch;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Navicat[^()]*\(Linux\)[^v]*version[^\d]*)(\d+\.\d+\.\d+)")
        .expect("static version pattern")
});

const URL_X86_64: &str = "https://dn.navicat.com/download/navicat17-premium-cs-x86_64.AppImage";
const URL_AARCH64: &str = "https://dn.navicat.com/download/navicat17-premium-cs-aarch64.AppImage";

/// Extractor for Navicat Premium CS releases.
pub struct NavicatPremiumCsParser;

impl UpstreamParser for NavicatPremiumCsParser {
    fn parse_version(&self, page: &str) -> Option<String> {
        VERSION_RE.captures(page).map(|caps| caps[2].to_string())
    }

    fn parse_url(&self, arch: Arch, _page: &str) -> Option<String> {
        match arch {
            Arch::X86_64 => Some(URL_X86_64.to_string()),
            Arch::Aarch64 => Some(URL_AARCH64.to_string()),
            _ => None,
        }
    }
}
