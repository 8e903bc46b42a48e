//! End-to-end update scenarios against a stub HTTP server.
//!
//! These drive the full pipeline — metadata fetch, version comparison,
//! concurrent downloads, hashing, recipe mutation, persistence — through
//! the production `HttpFetcher`.

mod common;

use common::{QQ_PKGBUILD, qq_config_yaml, qq_page, write_pkgbuild};

use sha2::{Digest, Sha512};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aurup::config::Config;
use aurup::core::{PackageUpdater, UpdateError, UpdateStatus};
use aurup::models::Arch;

const AMD_BODY: &[u8] = b"amd64 artifact body";
const ARM_BODY: &[u8] = b"arm64 artifact body, differs";

async fn mount_meta(server: &MockServer, version: &str) {
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_string(qq_page(&server.uri(), version)))
        .mount(server)
        .await;
}

async fn mount_artifact(server: &MockServer, name: &str, body: &'static [u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/artifacts/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

fn updater_for(server: &MockServer, dir: &std::path::Path, extra: &str) -> PackageUpdater {
    let pkgbuild = write_pkgbuild(dir, QQ_PKGBUILD);
    let yaml = qq_config_yaml(&server.uri(), &dir.join("downloads"), &pkgbuild, extra);
    let config = Config::parse(&yaml).unwrap();
    PackageUpdater::new(config).unwrap()
}

#[tokio::test]
async fn newer_upstream_version_updates_the_recipe() {
    let server = MockServer::start().await;
    mount_meta(&server, "1.1.0").await;
    mount_artifact(&server, "QQ_1.1.0_amd64_01.deb", AMD_BODY).await;
    mount_artifact(&server, "QQ_1.1.0_arm64_01.deb", ARM_BODY).await;

    let dir = tempfile::tempdir().unwrap();
    let updater = updater_for(&server, dir.path(), "");

    let report = updater.update_package("qq-test").await;
    assert!(report.is_success(), "status: {:?}", report.status);
    assert!(matches!(
        &report.status,
        UpdateStatus::Updated { version } if version == "1.1.0"
    ));
    assert_eq!(report.updated_archs, vec![Arch::X86_64, Arch::Aarch64]);
    assert!(report.arch_failures.is_empty());

    let recipe = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
    assert!(recipe.contains("pkgver=1.1.0"));
    assert!(recipe.contains("pkgrel=1"));

    let amd_digest = hex::encode(Sha512::digest(AMD_BODY));
    let arm_digest = hex::encode(Sha512::digest(ARM_BODY));
    assert!(recipe.contains(&format!("sha512sums_x86_64=('{amd_digest}')")));
    assert!(recipe.contains(&format!("sha512sums_aarch64=('{arm_digest}')")));

    // source URLs rewritten to the freshly resolved artifact URLs
    assert!(recipe.contains(&format!(
        "source_x86_64=('{}/artifacts/QQ_1.1.0_amd64_01.deb')",
        server.uri()
    )));

    // artifacts land under deterministic names in the download dir
    let amd = dir.path().join("downloads/qq-test_1.1.0_x86_64.deb");
    assert_eq!(std::fs::read(amd).unwrap(), AMD_BODY);
    let arm = dir.path().join("downloads/qq-test_1.1.0_aarch64.deb");
    assert_eq!(std::fs::read(arm).unwrap(), ARM_BODY);

    // untouched lines survive byte-for-byte
    assert!(recipe.contains("pkgdesc='QQ Linux client'"));
    assert!(recipe.contains("bsdtar -xf data.tar.xz"));
}

#[tokio::test]
async fn equal_upstream_version_downloads_nothing() {
    let server = MockServer::start().await;
    mount_meta(&server, "1.0.0").await;

    // any artifact request would be a contract violation
    Mock::given(method("GET"))
        .and(path("/artifacts/QQ_1.0.0_amd64_01.deb"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/artifacts/QQ_1.0.0_arm64_01.deb"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let updater = updater_for(&server, dir.path(), "");

    let report = updater.update_package("qq-test").await;
    assert!(matches!(report.status, UpdateStatus::UpToDate));

    let recipe = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
    assert_eq!(recipe, QQ_PKGBUILD);
}

#[tokio::test]
async fn failing_architecture_does_not_block_siblings() {
    let server = MockServer::start().await;
    mount_meta(&server, "1.1.0").await;
    mount_artifact(&server, "QQ_1.1.0_amd64_01.deb", AMD_BODY).await;
    Mock::given(method("GET"))
        .and(path("/artifacts/QQ_1.1.0_arm64_01.deb"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let updater = updater_for(&server, dir.path(), "");

    let report = updater.update_package("qq-test").await;
    assert!(report.is_success(), "status: {:?}", report.status);
    assert_eq!(report.updated_archs, vec![Arch::X86_64]);
    assert_eq!(report.arch_failures.len(), 1);
    assert!(matches!(
        report.arch_failures[0],
        (Arch::Aarch64, UpdateError::DownloadFailed { retries: 1, .. })
    ));

    let recipe = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
    let amd_digest = hex::encode(Sha512::digest(AMD_BODY));
    assert!(recipe.contains(&format!("sha512sums_x86_64=('{amd_digest}')")));
    // the failed architecture keeps its old checksum and source
    assert!(recipe.contains("sha512sums_aarch64=('oldsum-arm')"));
    assert!(recipe.contains("source_aarch64=('https://old.example.com/arm64.deb')"));
}

#[tokio::test]
async fn all_architectures_failing_fails_the_package() {
    let server = MockServer::start().await;
    mount_meta(&server, "1.1.0").await;
    for artifact in ["QQ_1.1.0_amd64_01.deb", "QQ_1.1.0_arm64_01.deb"] {
        Mock::given(method("GET"))
            .and(path(format!("/artifacts/{artifact}")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let updater = updater_for(&server, dir.path(), "");

    let report = updater.update_package("qq-test").await;
    assert!(matches!(
        report.status,
        UpdateStatus::Failed(UpdateError::AllDownloadsFailed { .. })
    ));

    // recipe untouched on failure
    let recipe = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
    assert_eq!(recipe, QQ_PKGBUILD);
}

#[tokio::test]
async fn declared_digest_mismatch_fails_the_package() {
    let server = MockServer::start().await;
    mount_meta(&server, "1.1.0").await;
    mount_artifact(&server, "QQ_1.1.0_amd64_01.deb", AMD_BODY).await;
    mount_artifact(&server, "QQ_1.1.0_arm64_01.deb", ARM_BODY).await;

    let dir = tempfile::tempdir().unwrap();
    let extra = "    expected_checksums:\n      x86_64: deadbeef\n";
    let updater = updater_for(&server, dir.path(), extra);

    let report = updater.update_package("qq-test").await;
    assert!(matches!(
        report.status,
        UpdateStatus::Failed(UpdateError::ChecksumMismatch { arch: Arch::X86_64, .. })
    ));

    // the mismatching artifact is not kept around
    assert!(!dir.path().join("downloads/qq-test_1.1.0_x86_64.deb").exists());
    // recipe untouched
    let recipe = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
    assert_eq!(recipe, QQ_PKGBUILD);
}

#[tokio::test]
async fn unreachable_metadata_fails_without_touching_anything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let updater = updater_for(&server, dir.path(), "");

    let report = updater.update_package("qq-test").await;
    assert!(matches!(
        report.status,
        UpdateStatus::Failed(UpdateError::MetadataUnavailable { .. })
    ));

    let recipe = std::fs::read_to_string(dir.path().join("PKGBUILD")).unwrap();
    assert_eq!(recipe, QQ_PKGBUILD);
}
