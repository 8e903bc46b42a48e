//! Extractor for the Linux QQ download page.
//!
//! The vendor page embeds its download manifest as a JavaScript object
//! literal (`var params = {...};`) inside a script block. The object maps
//! per-architecture keys to either a nested object keyed by package format
//! or, for some architectures, a bare URL string. The version is not
//! published separately; it is recovered from the x86_64 deb file name.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::UpstreamParser;
use crate::models::Arch;

static PARAMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var params\s*=\s*(\{.*?\});").expect("static params pattern")
});

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"QQ_([\d._]+)_amd64").expect("static version pattern"));

/// Extractor for Linux QQ releases.
pub struct QqParser;

impl QqParser {
    /// The manifest key holding this architecture's download entry.
    fn arch_key(arch: Arch) -> &'static str {
        match arch {
            Arch::X86_64 => "x64DownloadUrl",
            Arch::Aarch64 => "armDownloadUrl",
            Arch::Loong64 => "loongarchDownloadUrl",
            Arch::Mips64el => "mipsDownloadUrl",
        }
    }
}

/// A manifest entry is either a bare URL or an object keyed by package
/// format; the `deb` variant is the one packaged here.
fn direct_or_deb(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Object(map) => map.get("deb").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

impl UpstreamParser for QqParser {
    fn parse_version(&self, page: &str) -> Option<String> {
        let url = self.parse_url(Arch::X86_64, page)?;
        VERSION_RE
            .captures(&url)
            .map(|caps| caps[1].to_string())
    }

    fn parse_url(&self, arch: Arch, page: &str) -> Option<String> {
        let raw = PARAMS_RE.captures(page)?.get(1)?.as_str().to_string();

        let params: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                debug!("embedded download manifest is not valid JSON: {e}");
                return None;
            }
        };

        params.get(Self::arch_key(arch)).and_then(direct_or_deb)
    }
}
