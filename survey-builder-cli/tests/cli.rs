//! Non-interactive subcommands of the `survey-builder` binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

fn survey_builder() -> Command {
    Command::cargo_bin("survey-builder").expect("survey-builder binary")
}

#[test]
fn list_bundles_prints_catalog() {
    survey_builder()
        .arg("list-bundles")
        .assert()
        .success()
        .stdout(predicate::str::contains("bundle_simple_repeat_v2"))
        .stdout(predicate::str::contains("bundle_matrix_v1"))
        .stdout(predicate::str::contains("Age Question (with validation)"));
}

#[test]
fn show_bundle_prints_json() {
    let output = survey_builder()
        .args(["show-bundle", "bundle_age_v1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let bundle: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(bundle["id"], "bundle_age_v1");
    assert_eq!(bundle["questionSchemas"][0]["name"], "age");
    assert_eq!(bundle["questionSchemas"][0]["type"], "text");
}

#[test]
fn show_unknown_bundle_fails() {
    survey_builder()
        .env("RUST_LOG", "error")
        .args(["show-bundle", "bundle_missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown bundle 'bundle_missing'"));
}

#[test]
fn export_requires_a_bundle() {
    survey_builder().arg("export").assert().failure();
}

#[test]
fn export_writes_survey_with_metadata() {
    let temp = tempfile::tempdir().unwrap();

    survey_builder()
        .current_dir(temp.path())
        .args([
            "export",
            "--bundle",
            "bundle_age_v1",
            "--bundle",
            "bundle_email_v1",
            "--bundle",
            "bundle_age_v1",
            "--out-dir",
        ])
        .arg(temp.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("survey_export_with_metadata.json"));

    let text =
        fs::read_to_string(temp.path().join("out").join("survey_export_with_metadata.json"))
            .unwrap();
    let export: Value = serde_json::from_str(&text).unwrap();

    let names: Vec<&str> = export["survey"]["pages"][0]["elements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["age", "has_email", "email_address"]);
    assert_eq!(export["metadata"]["totalBundlesAdded"], 2);
    assert_eq!(export["metadata"]["exportVersion"], "1.0");
    assert!(export["metadata"]["exportedAt"].is_string());
}

#[test]
fn export_dir_from_config_file() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("survey-builder.toml"),
        "[export]\ndir = \"exports\"\n",
    )
    .unwrap();

    survey_builder()
        .current_dir(temp.path())
        .args(["export", "--bundle", "bundle_defaults_v1"])
        .assert()
        .success();

    assert!(
        temp.path()
            .join("exports")
            .join("survey_export_with_metadata.json")
            .exists()
    );
}

#[test]
fn invalid_config_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("broken.toml");
    fs::write(&config, "[export\n").unwrap();

    survey_builder()
        .env("RUST_LOG", "error")
        .arg("--config")
        .arg(&config)
        .arg("list-bundles")
        .assert()
        .failure()
        .stderr(predicate::str::contains("load survey-builder.toml config"));
}
