//! Artifact file-name derivation from download URLs.
//!
//! Downloaded artifacts are named deterministically from package name,
//! version, and architecture, with the extension taken from the source
//! URL. Compound archive extensions (`.tar.gz` and friends) are
//! recognized as a unit so `pkg_1.0_x86_64.tar.gz` does not degrade to
//! `.gz`.

use std::path::Path;

use crate::models::Arch;

/// Compound extensions that must be preserved as a unit.
const COMPOUND_EXTENSIONS: [&str; 4] = [".tar.gz", ".tar.bz2", ".tar.xz", ".tar.zst"];

/// Extract the file name (with extension) from a URL.
///
/// Query strings and fragments are stripped; a URL whose path ends in `/`
/// or has no path yields an empty string.
pub fn extract_filename_from_url(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme.split_once('/').map_or("", |(_, rest)| rest);
    let path = path.split(['?', '#']).next().unwrap_or("");
    path.rsplit('/').next().unwrap_or("")
}

/// Extract the extension (including the leading dot) from a URL.
///
/// Returns `""` when the file name has none.
pub fn extract_extension_from_url(url: &str) -> String {
    let filename = extract_filename_from_url(url);

    for compound in COMPOUND_EXTENSIONS {
        if filename.ends_with(compound) {
            return compound.to_string();
        }
    }

    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Build the deterministic download file name for one artifact.
///
/// The extension comes from the URL, falling back to `default_extension`
/// (which should include its leading dot) when the URL has none.
///
/// ```
/// use aurup::models::Arch;
/// use aurup::utils::url::generate_download_filename;
///
/// let name = generate_download_filename("qq", "1.2.3", Arch::X86_64, "https://x/qq.deb", None);
/// assert_eq!(name, "qq_1.2.3_x86_64.deb");
/// ```
pub fn generate_download_filename(
    package: &str,
    version: &str,
    arch: Arch,
    url: &str,
    default_extension: Option<&str>,
) -> String {
    let mut extension = extract_extension_from_url(url);
    if extension.is_empty() {
        if let Some(fallback) = default_extension {
            extension = fallback.to_string();
        }
    }
    format!("{package}_{version}_{arch}{extension}")
}
