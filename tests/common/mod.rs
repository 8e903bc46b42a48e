//! Shared fixtures for integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// A two-architecture PKGBUILD as maintained for the QQ client packages.
pub const QQ_PKGBUILD: &str = "\
# Maintainer: Example <example@example.org>
pkgname=qq-test
pkgver=1.0.0
pkgrel=7
pkgdesc='QQ Linux client'
arch=('x86_64' 'aarch64')
source_x86_64=('https://old.example.com/amd64.deb')
source_aarch64=('https://old.example.com/arm64.deb')
sha512sums_x86_64=('oldsum-x86')
sha512sums_aarch64=('oldsum-arm')

package() {
    bsdtar -xf data.tar.xz -C \"$pkgdir\"
}
";

/// Write a PKGBUILD fixture into `dir` and return its path.
pub fn write_pkgbuild(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("PKGBUILD");
    std::fs::write(&path, content).unwrap();
    path
}

/// A vendor download page embedding the per-arch manifest the `qq` parser
/// extracts, with artifact URLs pointing at the given mock server.
pub fn qq_page(server_uri: &str, version: &str) -> String {
    format!(
        r#"<html><script>
var params = {{"x64DownloadUrl":{{"deb":"{server_uri}/artifacts/QQ_{version}_amd64_01.deb"}},"armDownloadUrl":{{"deb":"{server_uri}/artifacts/QQ_{version}_arm64_01.deb"}}}};
</script></html>"#
    )
}

/// Configuration for one `qq`-family package against a mock server.
///
/// Retries and backoff are tightened so failure scenarios stay fast.
pub fn qq_config_yaml(
    server_uri: &str,
    downloads: &Path,
    pkgbuild: &Path,
    extra_package_lines: &str,
) -> String {
    format!(
        r#"
settings:
  download:
    show_progress: false
    max_retries: 1
    base_delay: 0.01
    download_dir: {downloads}
packages:
  qq-test:
    name: qq-test
    fetch_url: {server_uri}/meta
    parser: qq
    pkgbuild: {pkgbuild}
    arch: [x86_64, aarch64]
{extra_package_lines}"#,
        downloads = downloads.display(),
        pkgbuild = pkgbuild.display(),
    )
}
