//! CLI surface tests: exit codes and offline behavior.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{QQ_PKGBUILD, write_pkgbuild};

fn write_config(dir: &std::path::Path) {
    let pkgbuild = write_pkgbuild(dir, QQ_PKGBUILD);
    let yaml = format!(
        r#"
packages:
  linuxqq:
    name: linuxqq
    upstream: https://im.qq.com/linuxqq
    fetch_url: https://im.qq.com/rainbow/linuxQQDownload
    parser: qq
    pkgbuild: {}
    arch: [x86_64, aarch64]
  navicat-premium-cs:
    name: navicat-premium-cs
    fetch_url: https://www.navicat.com.cn/products/navicat-premium-release-note
    parser: navicat-premium-cs
    pkgbuild: {}
    arch: [x86_64]
    enable: false
"#,
        pkgbuild.display(),
        pkgbuild.display(),
    );
    std::fs::write(dir.join("config.yaml"), yaml).unwrap();
}

#[test]
fn list_shows_packages_without_network() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    Command::cargo_bin("aurup")
        .unwrap()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("linuxqq"))
        .stdout(predicate::str::contains("navicat-premium-cs"))
        .stdout(predicate::str::contains("disabled"));
}

#[test]
fn updating_an_unknown_package_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    Command::cargo_bin("aurup")
        .unwrap()
        .current_dir(dir.path())
        .args(["--no-progress", "update", "no-such-package"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("not defined in the configuration"));
}

#[test]
fn missing_configuration_file_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("aurup")
        .unwrap()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_configuration_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "packages: [not, a, map]").unwrap();

    Command::cargo_bin("aurup")
        .unwrap()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .failure();
}

#[test]
fn explicit_config_path_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    let config = dir.path().join("config.yaml");

    Command::cargo_bin("aurup")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linuxqq"));
}
