//! CLI behaviour that needs no remote: status, state errors, usage errors.

use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use chrono::{Duration, Utc};
use predicates::str::contains;
use tempfile::TempDir;

use ghkit_core::{store, CacheMeta, OwnerKind, Repository, Snapshot, Visibility, Workspace};

fn ghkit_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ghkit"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("GHKIT_TRANSPORT")
        .env_remove("GHKIT_LOG");
    cmd
}

fn write_snapshot(home: &Path, synced_days_ago: i64) -> Snapshot {
    let now = Utc::now();
    let snapshot = Snapshot::new(
        Workspace {
            login: "acme".into(),
            kind: OwnerKind::Organization,
            id: "O_1".into(),
        },
        vec![],
        vec![Repository {
            name: "api".into(),
            id: "R_1".into(),
            full_name: "acme/api".into(),
            default_branch: "main".into(),
            visibility: Visibility::Private,
        }],
        CacheMeta {
            initialized_at: now - Duration::days(30),
            last_synced_at: Some(now - Duration::days(synced_days_ago)),
            toolkit_version: env!("CARGO_PKG_VERSION").into(),
        },
    );
    store::save_snapshot_at(home, &snapshot).expect("save snapshot");
    snapshot
}

#[test]
fn status_without_snapshot_is_stale() {
    let home = TempDir::new().expect("home");
    ghkit_cmd(home.path())
        .args(["status", "acme"])
        .assert()
        .success()
        .stdout(contains("STALE"))
        .stdout(contains("no snapshot"))
        .stdout(contains("ghkit init acme"));
}

#[test]
fn status_reports_fresh_snapshot() {
    let home = TempDir::new().expect("home");
    write_snapshot(home.path(), 1);
    ghkit_cmd(home.path())
        .args(["status", "acme"])
        .assert()
        .success()
        .stdout(contains("FRESH"))
        .stdout(contains("acme (organization)"));
}

#[test]
fn status_json_respects_max_age() {
    let home = TempDir::new().expect("home");
    write_snapshot(home.path(), 3);

    let output = ghkit_cmd(home.path())
        .args(["status", "acme", "--json", "--max-age-days", "2"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["status"], "stale");
    assert_eq!(json["stale"], true);
    assert_eq!(json["max_age_days"], 2);
    assert_eq!(json["repositories"], 1);
    assert_eq!(json["kind"], "organization");
}

#[test]
fn stale_after_days_comes_from_config() {
    let home = TempDir::new().expect("home");
    write_snapshot(home.path(), 3);
    std::fs::write(
        home.path().join(".ghkit").join("config.yaml"),
        "stale_after_days: 10\n",
    )
    .expect("write config");

    ghkit_cmd(home.path())
        .args(["status", "acme"])
        .assert()
        .success()
        .stdout(contains("FRESH"));
}

#[test]
fn refresh_before_init_fails() {
    let home = TempDir::new().expect("home");
    ghkit_cmd(home.path())
        .args(["refresh", "acme"])
        .assert()
        .failure()
        .stderr(contains("not initialized"));
}

#[test]
fn diff_before_init_fails() {
    let home = TempDir::new().expect("home");
    ghkit_cmd(home.path())
        .args(["diff", "acme"])
        .assert()
        .failure()
        .stderr(contains("not initialized"));
}

#[test]
fn init_on_existing_snapshot_fails() {
    let home = TempDir::new().expect("home");
    write_snapshot(home.path(), 0);
    ghkit_cmd(home.path())
        .args(["init", "acme", "--kind", "org"])
        .assert()
        .failure()
        .stderr(contains("already initialized"));
}

#[test]
fn init_rejects_qualified_repository_names() {
    let home = TempDir::new().expect("home");
    ghkit_cmd(home.path())
        .args(["init", "acme", "--repo", "acme/api"])
        .assert()
        .failure()
        .stderr(contains("bare name"));
    assert!(!home.path().join(".ghkit/workspaces/acme").exists());
}

#[test]
fn unknown_scope_is_rejected_by_the_parser() {
    let home = TempDir::new().expect("home");
    ghkit_cmd(home.path())
        .args(["refresh", "acme", "--scope", "fields"])
        .assert()
        .failure()
        .stderr(contains("unknown refresh scope"));
}

#[test]
fn invalid_page_size_is_a_config_error() {
    let home = TempDir::new().expect("home");
    ghkit_cmd(home.path())
        .env("GHKIT_PAGE_SIZE", "500")
        .args(["status", "acme"])
        .assert()
        .failure()
        .stderr(contains("page_size"));
}
