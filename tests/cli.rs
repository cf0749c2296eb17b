// ABOUTME: Integration tests for the image-sync CLI commands.
// ABOUTME: Validates --help output, init, dry-run sync and argument errors.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn image_sync_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("image-sync"))
}

const DRY_RUN_CONFIG: &str = r#"
registry: reg.example.com
namespace: team
images:
  - vendor/app:1.0
  - app
"#;

#[test]
fn help_shows_commands() {
    image_sync_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("purge"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("sync.yml");

    image_sync_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--registry", "mirror.local:5000"])
        .assert()
        .success();

    assert!(config_path.exists(), "sync.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("registry: mirror.local:5000"));
    assert!(content.contains("images:"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("sync.yml");

    fs::write(&config_path, "existing: config").unwrap();

    image_sync_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "existing: config");
}

#[test]
fn dry_run_sync_logs_every_stage() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("sync.yml"), DRY_RUN_CONFIG).unwrap();

    image_sync_cmd()
        .current_dir(temp_dir.path())
        .args(["sync", "--dry-run", "--socket", "/nonexistent/runtime.sock"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Image Pull >>> vendor/app:1.0"))
        .stdout(predicate::str::contains(
            "Image Tag  >>> app:latest => reg.example.com/team/app:latest",
        ))
        .stdout(predicate::str::contains(
            "Image Push >>> reg.example.com/team/app:1.0",
        ))
        .stdout(predicate::str::contains("Synced 2 of 2 image(s)"));
}

#[test]
fn dry_run_sync_can_show_push_records() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("mirror.yml");
    fs::write(&config_path, DRY_RUN_CONFIG).unwrap();

    image_sync_cmd()
        .arg("sync")
        .arg(&config_path)
        .args(["--dry-run", "--show-push"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Layer already exists"))
        .stdout(predicate::str::contains("Digest:"));
}

#[test]
fn dry_run_sync_reports_bad_entries_and_continues() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("sync.yml"),
        "registry: reg.example.com\nimages: ['bad spec', app]\n",
    )
    .unwrap();

    image_sync_cmd()
        .current_dir(temp_dir.path())
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid Image Spec"))
        .stdout(predicate::str::contains("Image Push >>> reg.example.com/app:latest"))
        .stdout(predicate::str::contains("Synced 1 of 2 image(s)"));
}

#[test]
fn json_mode_prints_json_lines() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("sync.yml"), DRY_RUN_CONFIG).unwrap();

    let output = image_sync_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "sync", "--dry-run"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(events.iter().any(|e| e["event"] == "log" && e["level"] == "info"));
    let summary = events.last().unwrap();
    assert_eq!(summary["event"], "summary");
    assert_eq!(summary["synced"].as_array().unwrap().len(), 2);
}

#[test]
fn sync_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    image_sync_cmd()
        .current_dir(temp_dir.path())
        .args(["sync", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn purge_without_target_fails() {
    image_sync_cmd()
        .arg("purge")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to purge"));
}

#[test]
fn purge_fails_when_runtime_socket_is_missing() {
    image_sync_cmd()
        .args([
            "--runtime",
            "docker",
            "--socket",
            "/nonexistent/runtime.sock",
            "purge",
            "--dangling",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn json_mode_reports_errors_as_json() {
    let temp_dir = tempfile::tempdir().unwrap();

    let output = image_sync_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "sync", "--dry-run"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    let line = stderr.lines().last().unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["event"], "error");
    assert!(
        event["message"]
            .as_str()
            .unwrap()
            .contains("configuration file not found")
    );
    assert!(!stderr.contains("Error:"));
}
