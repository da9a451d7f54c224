//! Integration tests for the civic-ledger CLI
//!
//! These tests run the binary in a scratch project directory, testing the
//! full cycle of: init → submit → review → issues


use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a civic-ledger command
fn civic_ledger() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(cargo::cargo_bin!("civic-ledger"));
    cmd.env_remove("CIVIC_LEDGER_CONFIG");
    cmd
}

/// Helper to create a project with the starter config
fn init_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    civic_ledger().arg("init").current_dir(temp.path()).assert().success();
    temp
}

/// Run a command with `--json` and parse its output
fn json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = civic_ledger()
        .args(args)
        .arg("--json")
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// INIT
// =============================================================================

#[test]
fn test_init_creates_config_and_data_dir() {
    let temp = TempDir::new().unwrap();

    civic_ledger()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    assert!(temp.path().join("civic-ledger.toml").exists());
    assert!(temp.path().join(".civic-ledger").is_dir());
}

#[test]
fn test_init_twice_keeps_existing_config() {
    let temp = init_project();
    let config = temp.path().join("civic-ledger.toml");
    fs::write(&config, "years = [\"2020-21\"]\n").unwrap();

    civic_ledger()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Already initialized"));

    assert_eq!(fs::read_to_string(&config).unwrap(), "years = [\"2020-21\"]\n");
}

#[test]
fn test_commands_without_config_fail() {
    let temp = TempDir::new().unwrap();

    civic_ledger()
        .args(["issues", "--config", "absent.toml"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("civic-ledger init"));
}

#[test]
fn test_version() {
    civic_ledger()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("civic-ledger v"));
}

// =============================================================================
// SUBMIT AND SHOW
// =============================================================================

#[test]
fn test_open_field_is_applied_and_persisted() {
    let temp = init_project();

    let out = json(temp.path(), &["submit", "cardiff", "total-debt", "42,000", "-s", "SoA p.3"]);
    assert_eq!(out["status"], "applied");
    assert_eq!(out["version"], 1);

    let shown = json(temp.path(), &["show", "cardiff", "total-debt"]);
    assert_eq!(shown["record"]["value"], 42000.0);
    assert_eq!(shown["record"]["version"], 1);

    civic_ledger()
        .args(["show", "cardiff", "total-debt", "--year", "2023-24"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("42000"));
}

#[test]
fn test_tier_zero_is_refused() {
    let temp = init_project();

    civic_ledger()
        .args(["submit", "cardiff", "total-debt", "1", "--tier", "0"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("may not submit"));
}

#[test]
fn test_unknown_council_is_reported() {
    let temp = init_project();

    civic_ledger()
        .args(["submit", "atlantis", "total-debt", "1"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("council 'atlantis'"));
}

#[test]
fn test_non_numeric_value_is_refused() {
    let temp = init_project();

    civic_ledger()
        .args(["submit", "cardiff", "total-debt", "lots"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a number"));
}

// =============================================================================
// ISSUES
// =============================================================================

#[test]
fn test_scan_respects_limit() {
    let temp = init_project();

    let out = json(temp.path(), &["scan", "--limit", "3"]);
    assert_eq!(out.as_array().unwrap().len(), 3);
}

#[test]
fn test_issues_lists_missing_values() {
    let temp = init_project();

    let out = json(temp.path(), &["issues", "--kind", "missing", "--council", "cardiff"]);
    // total-debt for three years, usable-reserves for two
    assert_eq!(out["total"], 5);

    civic_ledger()
        .args(["issues", "--council", "cardiff", "--year", "2023-24"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cardiff/total-debt/2023-24"));
}
