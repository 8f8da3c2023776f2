//! End-to-end CLI tests for chathtml.
//!
//! These tests run the actual binary against staged exports and check the
//! files it writes and the summary it prints.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test cli_e2e
//! ```

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

// ============================================================================
// Test Fixtures
// ============================================================================

const TRANSCRIPT: &str = "\
[05/03/2021, 9:15:03 am] Alice: Hello *world*!
[05/03/2021, 14:02:00] Bob: check http://x.io
[05/03/2021, 14:03:00] Bob: <attached: 00000002-PHOTO-2021-03-05-14-03-00.jpg>
";

/// Creates a temp dir with a staged export under `staging/`.
fn setup_fixtures() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");
    let staging = dir.path().join("staging");
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("_chat.txt"), TRANSCRIPT).unwrap();
    fs::write(staging.join("00000002-PHOTO-2021-03-05-14-03-00.jpg"), b"jpeg").unwrap();
    dir
}

fn chathtml() -> Command {
    Command::cargo_bin("chathtml").unwrap()
}

fn path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// ============================================================================
// Render
// ============================================================================

#[test]
fn test_render_single_chat() {
    let dir = setup_fixtures();
    let output = path(&dir, "site");

    chathtml()
        .arg("render")
        .arg(path(&dir, "staging"))
        .args(["--recipient", "Alice", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ Done!"))
        .stdout(predicate::str::contains("Messages:     3"));

    let html = read(&output.join("Alice.html"));
    assert!(html.contains("<div class=\"message recipient\">"));
    assert!(html.contains("Hello <strong>world</strong>!"));
    assert!(html.contains(r#"<a href="http://x.io" target="_blank">http://x.io</a>"#));
    assert!(html.contains("Alice/00000002-PHOTO-2021-03-05-14-03-00.jpg"));
    assert!(
        output
            .join("Alice/00000002-PHOTO-2021-03-05-14-03-00.jpg")
            .is_file()
    );
}

#[test]
fn test_render_with_options() {
    let dir = setup_fixtures();
    let output = path(&dir, "site");
    let header = path(&dir, "header.html");
    fs::write(&header, "<h1>%chatTitle%</h1>\n").unwrap();

    chathtml()
        .arg("render")
        .arg(path(&dir, "staging"))
        .args(["-r", "Alice", "-o"])
        .arg(&output)
        .arg("--header")
        .arg(&header)
        .args(["--group", "--title", "Team", "--file-name", "team"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Group chat"));

    let html = read(&output.join("team.html"));
    assert!(html.starts_with("<h1>Team</h1>\n"));
    assert!(html.contains("<span class=\"message-info name\">Bob</span>"));
}

#[test]
fn test_render_missing_media_fails() {
    let dir = setup_fixtures();
    fs::remove_file(path(&dir, "staging/00000002-PHOTO-2021-03-05-14-03-00.jpg")).unwrap();

    chathtml()
        .arg("render")
        .arg(path(&dir, "staging"))
        .args(["--recipient", "Alice", "--output"])
        .arg(path(&dir, "site"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Missing media file"));
}

#[test]
fn test_render_missing_staging_dir_fails() {
    let dir = tempdir().unwrap();
    chathtml()
        .arg("render")
        .arg(dir.path().join("nope"))
        .args(["--recipient", "Alice", "--output"])
        .arg(dir.path().join("site"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("❌ Error"));
}

#[test]
fn test_render_requires_recipient() {
    let dir = setup_fixtures();
    chathtml()
        .arg("render")
        .arg(path(&dir, "staging"))
        .arg("--output")
        .arg(path(&dir, "site"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--recipient"));
}

// ============================================================================
// Batch
// ============================================================================

#[test]
fn test_batch_command() {
    let dir = setup_fixtures();
    let output = path(&dir, "site");
    let jobs = serde_json::json!([
        {"staging_dir": path(&dir, "staging"), "recipient": "Alice", "output_dir": output},
        {"staging_dir": path(&dir, "staging"), "recipient": "Bob", "output_dir": output},
    ]);
    let jobs_path = path(&dir, "jobs.json");
    fs::write(&jobs_path, jobs.to_string()).unwrap();

    chathtml()
        .arg("batch")
        .arg(&jobs_path)
        .args(["--workers", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 completed, 0 failed, 0 rejected"));

    assert!(read(&output.join("Bob.html")).contains("<div class=\"message recipient\">"));
    assert!(output.join("Alice.html").is_file());
}

#[test]
fn test_batch_with_rejected_job_exits_nonzero() {
    let dir = setup_fixtures();
    let jobs = serde_json::json!([
        {"staging_dir": path(&dir, "staging"), "recipient": "Alice", "output_dir": path(&dir, "site")},
        {"recipient": "Bob"},
    ]);
    let jobs_path = path(&dir, "jobs.json");
    fs::write(&jobs_path, jobs.to_string()).unwrap();

    chathtml()
        .arg("batch")
        .arg(&jobs_path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("🚫 #1 rejected"))
        .stdout(predicate::str::contains("1 completed, 0 failed, 1 rejected"))
        .stderr(predicate::str::contains("Batch incomplete"))
        .stderr(predicate::str::contains("Invalid job").not());

    assert!(path(&dir, "site/Alice.html").is_file());
}

#[test]
fn test_batch_invalid_json() {
    let dir = tempdir().unwrap();
    let jobs_path = dir.path().join("jobs.json");
    fs::write(&jobs_path, "{not json").unwrap();

    chathtml()
        .arg("batch")
        .arg(&jobs_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));
}

// ============================================================================
// Misc
// ============================================================================

#[test]
fn test_version() {
    chathtml()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    chathtml()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("batch"));
}
