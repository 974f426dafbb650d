#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn zenus_cmd(data: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("zenus"));
    cmd.env_remove("ZENUS_DATA_DIR")
        .env_remove("ZENUS_LOG")
        .arg("--data")
        .arg(data.path());
    cmd
}

#[test]
fn test_new_then_list() {
    let data = TempDir::new().unwrap();

    zenus_cmd(&data)
        .args(["new", "--title", "Groceries", "--tag", "home"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created block 1"));

    zenus_cmd(&data)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("#home"));

    let files: Vec<_> = fs::read_dir(data.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_naked_invocation_lists() {
    let data = TempDir::new().unwrap();
    zenus_cmd(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("No blocks yet"));
}

#[test]
fn test_move_and_json_listing() {
    let data = TempDir::new().unwrap();
    for title in ["A", "B", "C"] {
        zenus_cmd(&data).args(["new", "-t", title]).assert().success();
    }

    zenus_cmd(&data).args(["move", "3", "1"]).assert().success();

    let output = zenus_cmd(&data).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let blocks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let titles: Vec<_> = blocks
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
    assert_eq!(blocks[0]["order"], 0);
}

#[test]
fn test_archive_round_trip() {
    let data = TempDir::new().unwrap();
    zenus_cmd(&data).args(["new", "-t", "Old idea"]).assert().success();
    zenus_cmd(&data).args(["new", "-t", "Current"]).assert().success();

    zenus_cmd(&data).args(["archive", "1"]).assert().success();
    assert!(data.path().join("archive").is_dir());

    zenus_cmd(&data)
        .args(["list", "--archived"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Old idea"));

    zenus_cmd(&data).args(["unarchive", "1"]).assert().success();

    let output = zenus_cmd(&data).args(["list", "--json"]).output().unwrap();
    let blocks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(blocks[0]["title"], "Current");
    assert_eq!(blocks[1]["title"], "Old idea");
}

#[test]
fn test_open_follows_title() {
    let data = TempDir::new().unwrap();
    zenus_cmd(&data)
        .args(["new", "-t", "Inbox", "-c", "see [[Project Plan]]"])
        .assert()
        .success();
    zenus_cmd(&data)
        .args(["new", "-t", "Project Plan", "-c", "ship it"])
        .assert()
        .success();

    zenus_cmd(&data)
        .args(["refs", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[[Project Plan]] -> 2. Project Plan"));

    zenus_cmd(&data)
        .args(["open", "Project Plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ship it"));

    zenus_cmd(&data)
        .args(["open", "Nowhere"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing matches"));
}

#[test]
fn test_unknown_block_fails() {
    let data = TempDir::new().unwrap();
    zenus_cmd(&data)
        .args(["show", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no block at '7'"));
}
