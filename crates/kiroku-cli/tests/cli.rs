use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn kiroku() -> Command {
    Command::cargo_bin("kiroku").unwrap()
}

/// Config with every provider slot switched off.
fn offline_config(dir: &TempDir) -> String {
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "providers": {
                "cloud": { "enabled": false },
                "onnx": { "enabled": false },
                "tesseract": { "enabled": false }
            }
        }"#,
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn help_lists_subcommands() {
    kiroku()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("attendance"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_init_then_get() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kiroku.json");
    let path_str = path.to_string_lossy().into_owned();

    kiroku()
        .args(["config", "init", "--output", &path_str])
        .assert()
        .success();
    assert!(path.exists());

    kiroku()
        .args(["-c", &path_str, "config", "get", "orchestrator.provider_timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30"));

    kiroku()
        .args(["config", "init", "--output", &path_str])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kiroku.json");
    let path_str = path.to_string_lossy().into_owned();

    kiroku()
        .args(["-c", &path_str, "config", "set", "identity.match_threshold", "0.8"])
        .assert()
        .success();
    kiroku()
        .args(["-c", &path_str, "config", "get", "identity.match_threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.8"));

    kiroku()
        .args(["-c", &path_str, "config", "set", "identity.nope", "1"])
        .assert()
        .failure();
}

#[test]
fn process_missing_file_fails() {
    kiroku()
        .args(["process", "does-not-exist.jpg", "--type", "residence-card"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_undecodable_image_reports_malformed_document() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(&dir);
    let image = dir.path().join("card.jpg");
    fs::write(&image, b"definitely not an image").unwrap();

    kiroku()
        .args(["-c", &config, "process"])
        .arg(&image)
        .args(["--type", "residence-card"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("malformed_document"));
}

#[test]
fn attendance_rejects_non_pdf() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(&dir);
    let pdf = dir.path().join("sheet.pdf");
    fs::write(&pdf, b"plain text, no PDF header").unwrap();

    kiroku()
        .args(["-c", &config, "attendance"])
        .arg(&pdf)
        .assert()
        .failure();
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("*.png").to_string_lossy().into_owned();

    kiroku()
        .args(["batch", &pattern, "--type", "resume"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}
