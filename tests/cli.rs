//! End-to-end tests for the command-line surface.
//!
//! Only offline paths are exercised: argument validation, manifest loading,
//! and error reporting against the local filesystem.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn modsync() -> Command {
    Command::cargo_bin("modsync").expect("binary built")
}

#[test]
fn help_lists_subcommands() {
    modsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("sync-all"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn sync_requires_url_for_missing_path() {
    let dir = TempDir::new().unwrap();
    modsync()
        .arg("sync")
        .arg(dir.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no --url was given"));
}

#[test]
fn unknown_strategy_is_rejected_at_parse_time() {
    modsync()
        .args(["sync", "some/path", "--strategy", "fast-forward"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy"));
}

#[test]
fn sync_all_reports_missing_manifest() {
    let dir = TempDir::new().unwrap();
    modsync()
        .arg("sync-all")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to read manifest"));
}

#[test]
fn sync_all_rejects_invalid_manifest() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("modsync.toml");
    std::fs::write(
        &manifest,
        r#"
            [[module]]
            name = "shop"
            path = "/var/modules/shop"
            strategy = "default"
        "#,
    )
    .unwrap();

    modsync()
        .arg("sync-all")
        .arg("--config")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid manifest"));
}

#[test]
fn sync_all_succeeds_on_empty_manifest() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("modsync.toml");
    std::fs::write(&manifest, "").unwrap();

    modsync()
        .arg("sync-all")
        .arg("--config")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 module(s): 0 updated, 0 failed"));
}

#[test]
fn status_fails_outside_a_repository() {
    let dir = TempDir::new().unwrap();
    modsync()
        .arg("status")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a git repository"));
}
