//! In-memory PKGBUILD field editing.
//!
//! [`PkgbuildEditor`] loads the recipe text once and exposes field-scoped
//! read/write operations, each a single-field substitution confined to
//! whole matching lines. Everything outside the recognized fields is
//! preserved byte-for-byte, and values stay single-quoted, so hand-written
//! recipes survive automated updates untouched except for the fields that
//! actually changed.
//!
//! Writes against a missing field are no-ops, not errors; callers that
//! need certainty re-read the field after writing. Nothing touches disk
//! until [`PkgbuildEditor::save`]; [`PkgbuildEditor::reload`] discards
//! pending edits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::hash::HashAlgorithm;
use crate::models::Arch;

static PKGVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^pkgver=(.*)$").expect("static pkgver pattern"));
static PKGREL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^pkgrel=(.*)$").expect("static pkgrel pattern"));
static EPOCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^epoch=(.*)$").expect("static epoch pattern"));

/// Errors from loading or persisting a recipe file.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// Reading or writing the recipe file failed.
    #[error("{operation} failed for {path}: {reason}")]
    Io {
        /// "reading" or "writing".
        operation: &'static str,
        /// The recipe path.
        path: PathBuf,
        /// Underlying I/O error text.
        reason: String,
    },
}

/// A batch of field updates applied in one fixed order:
/// version, release, epoch, generic checksum, per-arch checksums,
/// per-arch source URLs.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    /// New `pkgver` value, when the version changed.
    pub version: Option<String>,
    /// New `pkgrel` value (reset to 1 on version bumps).
    pub pkgrel: Option<u32>,
    /// Epoch to pin, replacing or inserting the `epoch=` line.
    pub epoch: Option<u64>,
    /// Checksum family being written.
    pub algorithm: HashAlgorithm,
    /// Generic (architecture-independent) checksum.
    pub generic_checksum: Option<String>,
    /// Per-architecture checksums.
    pub arch_checksums: BTreeMap<Arch, String>,
    /// Per-architecture source URLs.
    pub source_urls: BTreeMap<Arch, String>,
}

/// One recipe file held in memory for field-level editing.
#[derive(Debug, Clone)]
pub struct PkgbuildEditor {
    path: PathBuf,
    content: String,
}

impl PkgbuildEditor {
    /// Load a recipe file.
    pub async fn load(path: &Path) -> Result<Self, RecipeError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| RecipeError::Io {
            operation: "reading",
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// The recipe path this editor was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current (possibly edited, unsaved) recipe text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current `pkgver` value, if the field exists.
    pub fn pkgver(&self) -> Option<String> {
        PKGVER_RE.captures(&self.content).map(|caps| caps[1].to_string())
    }

    /// Replace the `pkgver` line. No-op when the field is absent.
    pub fn set_pkgver(&mut self, version: &str) {
        self.replace_line(&PKGVER_RE, &format!("pkgver={version}"));
    }

    /// Current `pkgrel` value; defaults to 1 when absent or malformed.
    pub fn pkgrel(&self) -> u32 {
        PKGREL_RE
            .captures(&self.content)
            .and_then(|caps| caps[1].trim().parse().ok())
            .unwrap_or(1)
    }

    /// Replace the `pkgrel` line. No-op when the field is absent.
    pub fn set_pkgrel(&mut self, pkgrel: u32) {
        self.replace_line(&PKGREL_RE, &format!("pkgrel={pkgrel}"));
    }

    /// Current `epoch` value; `None` when the field is absent.
    pub fn epoch(&self) -> Option<u64> {
        EPOCH_RE
            .captures(&self.content)
            .and_then(|caps| caps[1].trim().parse().ok())
    }

    /// Set the `epoch` field.
    ///
    /// Replaces an existing `epoch=` line, or inserts one immediately
    /// before the `pkgver=` line without disturbing any other line. When
    /// neither field exists the document is unchanged.
    pub fn set_epoch(&mut self, epoch: u64) {
        if EPOCH_RE.is_match(&self.content) {
            self.replace_line(&EPOCH_RE, &format!("epoch={epoch}"));
        } else if let Some(m) = PKGVER_RE.find(&self.content) {
            self.content.insert_str(m.start(), &format!("epoch={epoch}\n"));
        }
    }

    /// Current checksum value for the given algorithm, generic or per-arch.
    pub fn checksum(&self, arch: Option<Arch>, algorithm: HashAlgorithm) -> Option<String> {
        let field = checksum_field(arch, algorithm);
        let pattern = Regex::new(&format!(r"(?m)^{field}=\('(.*)'\)$"))
            .expect("checksum field pattern");
        pattern.captures(&self.content).map(|caps| caps[1].to_string())
    }

    /// Replace the generic checksum entry for the given algorithm.
    pub fn set_checksum(&mut self, algorithm: HashAlgorithm, digest: &str) {
        self.replace_field_value(&checksum_field(None, algorithm), digest);
    }

    /// Replace the per-arch checksum entry for the given algorithm.
    pub fn set_arch_checksum(&mut self, arch: Arch, algorithm: HashAlgorithm, digest: &str) {
        self.replace_field_value(&checksum_field(Some(arch), algorithm), digest);
    }

    /// Replace the per-arch source URL entry.
    pub fn set_source_url(&mut self, arch: Arch, url: &str) {
        self.replace_field_value(&format!("source_{arch}"), url);
    }

    /// Compute a file's digest and write it into the matching checksum field.
    pub async fn update_checksum_from_file(
        &mut self,
        file: &Path,
        arch: Option<Arch>,
        algorithm: HashAlgorithm,
    ) -> Result<(), crate::hash::HashError> {
        let digest = crate::hash::hash_file(file, algorithm).await?;
        match arch {
            Some(arch) => self.set_arch_checksum(arch, algorithm, &digest),
            None => self.set_checksum(algorithm, &digest),
        }
        Ok(())
    }

    /// Apply a batch update entirely in memory.
    ///
    /// Field order is fixed: version, release, epoch, generic checksum,
    /// per-arch checksums, per-arch source URLs.
    pub fn apply_update(&mut self, update: &RecipeUpdate) {
        if let Some(version) = &update.version {
            self.set_pkgver(version);
        }
        if let Some(pkgrel) = update.pkgrel {
            self.set_pkgrel(pkgrel);
        }
        if let Some(epoch) = update.epoch {
            self.set_epoch(epoch);
        }
        if let Some(digest) = &update.generic_checksum {
            self.set_checksum(update.algorithm, digest);
        }
        for (&arch, digest) in &update.arch_checksums {
            self.set_arch_checksum(arch, update.algorithm, digest);
        }
        for (&arch, url) in &update.source_urls {
            self.set_source_url(arch, url);
        }
    }

    /// Write the current text back to the recipe file.
    pub async fn save(&self) -> Result<(), RecipeError> {
        tokio::fs::write(&self.path, &self.content).await.map_err(|e| RecipeError::Io {
            operation: "writing",
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Re-read the recipe from disk, discarding in-memory edits.
    pub async fn reload(&mut self) -> Result<(), RecipeError> {
        let fresh = Self::load(&self.path).await?;
        self.content = fresh.content;
        Ok(())
    }

    /// Replace the first whole line matching `pattern` with `replacement`.
    ///
    /// Leaves the document unchanged when the pattern does not match.
    fn replace_line(&mut self, pattern: &Regex, replacement: &str) {
        self.content = pattern.replace(&self.content, NoExpand(replacement)).into_owned();
    }

    /// Replace a `field=('value')` line, preserving the quoting style.
    fn replace_field_value(&mut self, field: &str, value: &str) {
        let pattern = Regex::new(&format!(r"(?m)^{field}=\(.*\)$"))
            .expect("field value pattern");
        let replacement = format!("{field}=('{value}')");
        self.content = pattern.replace(&self.content, NoExpand(&replacement)).into_owned();
    }
}

/// The PKGBUILD field name for a checksum entry.
fn checksum_field(arch: Option<Arch>, algorithm: HashAlgorithm) -> String {
    match arch {
        Some(arch) => format!("{algorithm}sums_{arch}"),
        None => format!("{algorithm}sums"),
    }
}
