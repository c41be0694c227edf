//! Integration tests for the prdesc binary.
//!
//! These tests exercise the compiled binary using assert_cmd, each in its own
//! temporary working directory with the CI environment cleared.

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const HEADER: &str = "<!-- This is an auto-generated comment: created by prdesc -->";

/// A prdesc command running in `dir` with no inherited CI or prdesc settings
fn prdesc(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prdesc"));
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join("user-config"))
        .env_remove("GITHUB_EVENT_PATH")
        .env_remove("GITHUB_REF")
        .env_remove("GITHUB_OUTPUT")
        .env_remove("PRDESC_CONFIG")
        .env_remove("PRDESC_CONTENT")
        .env_remove("PRDESC_PR")
        .env_remove("PRDESC_SECTION")
        .env_remove("PRDESC_STORE")
        .env_remove("PRDESC_TOOL")
        .env_remove("RUST_LOG");
    cmd
}

fn stored(dir: &TempDir, document: &str) -> String {
    fs::read_to_string(dir.path().join(".prdesc/documents").join(format!("{document}.md")))
        .unwrap()
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("patch"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn test_patch_requires_section() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-c", "x", "--pr", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--section"));
}

// ============================================================================
// Patch
// ============================================================================

#[test]
fn test_patch_creates_description() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "coverage", "-c", "93%", "--pr", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added section"));

    assert_eq!(
        stored(&dir, "12"),
        format!("{HEADER}\n\n<!-- coverage -->\n93%\n<!-- end: coverage -->\n")
    );
}

#[test]
fn test_patch_replaces_only_its_section() {
    let dir = tempdir().unwrap();
    let documents = dir.path().join(".prdesc/documents");
    fs::create_dir_all(&documents).unwrap();
    fs::write(
        documents.join("4.md"),
        "Fixes the login flow.\n\n<!-- coverage -->\n80%\n<!-- end: coverage -->\n\nThanks!\n",
    )
    .unwrap();

    prdesc(dir.path())
        .args(["patch", "-s", "coverage", "-c", "95%", "--pr", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated section"));

    assert_eq!(
        stored(&dir, "4"),
        "Fixes the login flow.\n\n<!-- coverage -->\n95%\n<!-- end: coverage -->\n\nThanks!\n"
    );
}

#[test]
fn test_patch_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    for _ in 0..2 {
        prdesc(dir.path())
            .args(["patch", "-s", "a", "-c", "same", "--pr", "2"])
            .assert()
            .success();
    }

    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "same", "--pr", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));
    assert_eq!(stored(&dir, "2").matches(HEADER).count(), 1);
}

#[test]
fn test_patch_content_from_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("report.md"), "line one\nline two\n").unwrap();

    prdesc(dir.path())
        .args(["patch", "-s", "report", "--content-file", "report.md", "--pr", "8"])
        .assert()
        .success();

    assert!(stored(&dir, "8").contains("<!-- report -->\nline one\nline two\n<!-- end: report -->\n"));
}

#[test]
fn test_patch_content_from_stdin() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "tests", "--pr", "6"])
        .write_stdin("all green\n")
        .assert()
        .success();

    assert!(stored(&dir, "6").contains("<!-- tests -->\nall green\n<!-- end: tests -->\n"));
}

#[test]
fn test_patch_dry_run_prints_diff() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X", "--pr", "3", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+<!-- a -->"))
        .stdout(predicate::str::contains("Dry run:"));

    assert!(!dir.path().join(".prdesc/documents/3.md").exists());
}

#[test]
fn test_patch_json_report() {
    let dir = tempdir().unwrap();
    let output = prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X", "--pr", "5", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["document"], "5");
    assert_eq!(report["section"], "a");
    assert_eq!(report["was_update"], false);
    assert_eq!(report["written"], true);
}

#[test]
fn test_patch_writes_github_output() {
    let dir = tempdir().unwrap();
    let output_file = dir.path().join("step-output");

    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X", "--pr", "9"])
        .env("GITHUB_OUTPUT", &output_file)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output_file).unwrap(),
        "was-update=false\nchanged=true\ndocument=9\n"
    );
}

#[test]
fn test_patch_custom_tool_and_store() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X", "--pr", "1", "--tool", "bench-bot", "--store", "bodies"])
        .assert()
        .success();

    let document = fs::read_to_string(dir.path().join("bodies/1.md")).unwrap();
    assert!(document.starts_with("<!-- This is an auto-generated comment: created by bench-bot -->"));
}

// ============================================================================
// Target resolution
// ============================================================================

#[test]
fn test_target_from_git_ref() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X"])
        .env("GITHUB_REF", "refs/pull/77/merge")
        .assert()
        .success();

    assert!(dir.path().join(".prdesc/documents/77.md").exists());
}

#[test]
fn test_target_from_event_payload() {
    let dir = tempdir().unwrap();
    let event = dir.path().join("event.json");
    fs::write(&event, r#"{"action": "opened", "pull_request": {"number": 31}}"#).unwrap();

    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X"])
        .env("GITHUB_EVENT_PATH", &event)
        .env("GITHUB_REF", "refs/pull/99/merge")
        .assert()
        .success();

    assert!(dir.path().join(".prdesc/documents/31.md").exists());
    assert!(!dir.path().join(".prdesc/documents/99.md").exists());
}

#[test]
fn test_unresolved_target_fails() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X"])
        .env("GITHUB_REF", "refs/heads/main")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not determine which description"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_section_leaves_document_untouched() {
    let dir = tempdir().unwrap();
    let documents = dir.path().join(".prdesc/documents");
    fs::create_dir_all(&documents).unwrap();
    let broken = "<!-- a -->\nnever closed\n";
    fs::write(documents.join("1.md"), broken).unwrap();

    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X", "--pr", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Malformed section 'a'"));

    assert_eq!(stored(&dir, "1"), broken);
}

#[test]
fn test_invalid_section_identifier() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "end: a", "-c", "X", "--pr", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid section identifier"));
}

#[test]
fn test_multiline_tool_is_rejected() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X", "--pr", "1", "--tool", "bot\nv2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid tool identity"));

    assert!(!dir.path().join(".prdesc/documents/1.md").exists());
}

#[test]
fn test_broken_config_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".prdesc.toml"), "tool = [\n").unwrap();

    prdesc(dir.path())
        .args(["patch", "-s", "a", "-c", "X", "--pr", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(".prdesc.toml"));
}

// ============================================================================
// Render, show, list
// ============================================================================

#[test]
fn test_render_from_stdin() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["render", "-s", "a", "-c", "X"])
        .write_stdin("Human text\n")
        .assert()
        .success()
        .stdout(format!(
            "{HEADER}\n\nHuman text\n\n<!-- a -->\nX\n<!-- end: a -->\n"
        ));
}

#[test]
fn test_render_stdin_needs_content_flag() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["render", "-s", "a"])
        .write_stdin("Human text\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no content given"));
}

#[test]
fn test_show_prints_section_content() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["patch", "-s", "lint", "-c", "clean", "--pr", "10"])
        .assert()
        .success();

    prdesc(dir.path())
        .args(["show", "-s", "lint", "--pr", "10"])
        .assert()
        .success()
        .stdout("clean\n");
}

#[test]
fn test_show_missing_section_fails() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["show", "-s", "lint", "--pr", "10"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("section 'lint' not found"));
}

#[test]
fn test_list_sections_json() {
    let dir = tempdir().unwrap();
    for (section, content) in [("coverage", "93%"), ("lint", "clean")] {
        prdesc(dir.path())
            .args(["patch", "-s", section, "-c", content, "--pr", "11"])
            .assert()
            .success();
    }

    let output = prdesc(dir.path())
        .args(["list", "--pr", "11", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let sections: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = sections.iter().filter_map(|s| s["id"].as_str()).collect();
    assert_eq!(ids, vec!["coverage", "lint"]);
    assert_eq!(sections[1]["content"], "clean");
}

#[test]
fn test_list_empty_description() {
    let dir = tempdir().unwrap();
    prdesc(dir.path())
        .args(["list", "--pr", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sections"));
}
