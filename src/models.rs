//! Shared data models for the update pipeline.
//!
//! The central type here is [`Arch`], the CPU architecture tag used as a
//! map key throughout the downloader, the recipe editor, and the upstream
//! parsers. It is totally ordered so that `BTreeMap<Arch, _>` iteration is
//! deterministic, which the per-architecture reports and tests rely on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architectures a managed package can declare support for.
///
/// `Display` and `FromStr` round-trip the Arch Linux spelling of each tag
/// (`x86_64`, `aarch64`, `loong64`, `mips64el`), which is also the spelling
/// used in PKGBUILD field suffixes such as `sha512sums_x86_64`.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// 64-bit x86.
    #[serde(rename = "x86_64")]
    X86_64,
    /// 64-bit ARM.
    #[serde(rename = "aarch64")]
    Aarch64,
    /// LoongArch 64-bit.
    #[serde(rename = "loong64")]
    Loong64,
    /// MIPS64 little-endian.
    #[serde(rename = "mips64el")]
    Mips64el,
}

impl Arch {
    /// All supported architectures, in their canonical order.
    pub const ALL: [Arch; 4] = [Arch::X86_64, Arch::Aarch64, Arch::Loong64, Arch::Mips64el];

    /// The Arch Linux spelling of this tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Loong64 => "loong64",
            Arch::Mips64el => "mips64el",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = UnknownArch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arch::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownArch(s.to_string()))
    }
}

/// Error returned when an architecture string is not one of the supported tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown architecture '{0}'")]
pub struct UnknownArch(pub String);
