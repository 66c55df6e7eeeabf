//! Integration tests for the `models` subcommand.
//!
//! Artifacts are installed from local files only.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use blurgate_test_support::{ClassifierArtifactBuilder, SyntheticFrameBuilder};
use predicates::prelude::*;

fn blurgate(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("blurgate").unwrap();
    cmd.current_dir(home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"));
    cmd
}

fn models_dir(home: &Path) -> PathBuf {
    home.join("data").join("blurgate").join("models")
}

#[test]
fn test_models_path_prints_data_dir() {
    let home = tempfile::tempdir().unwrap();
    blurgate(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blurgate"))
        .stdout(predicate::str::contains("models"));
}

#[test]
fn test_install_local_artifact_is_used_by_check() {
    let home = tempfile::tempdir().unwrap();
    let artifact = home.path().join("downloaded.safetensors");
    ClassifierArtifactBuilder::sharp(8).write_to(&artifact).unwrap();
    SyntheticFrameBuilder::black(32, 32)
        .to_dynamic()
        .save(home.path().join("black.png"))
        .unwrap();

    blurgate(home.path())
        .args(["models", "install"])
        .arg(&artifact)
        .assert()
        .success()
        .stdout(predicate::str::contains("blur_classifier.safetensors"));

    assert!(models_dir(home.path())
        .join("blur_classifier.safetensors")
        .is_file());

    blurgate(home.path())
        .args(["models", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 model(s) installed"));

    blurgate(home.path())
        .arg(home.path().join("black.png"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"kind\":\"model\""));
}

#[test]
fn test_install_rejects_url_without_network_access() {
    let home = tempfile::tempdir().unwrap();

    blurgate(home.path())
        .args([
            "models",
            "install",
            "https://example.com/blur_classifier.safetensors",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a local file"));

    assert!(!models_dir(home.path()).exists());
}

#[test]
fn test_install_checksum_mismatch_installs_nothing() {
    let home = tempfile::tempdir().unwrap();
    let artifact = home.path().join("downloaded.safetensors");
    ClassifierArtifactBuilder::sharp(8).write_to(&artifact).unwrap();

    blurgate(home.path())
        .args(["models", "install"])
        .arg(&artifact)
        .args(["--sha256", &"0".repeat(64)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Checksum mismatch"));

    assert!(!models_dir(home.path())
        .join("blur_classifier.safetensors")
        .exists());
}
