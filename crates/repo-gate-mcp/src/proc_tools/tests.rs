// crates/repo-gate-mcp/src/proc_tools/tests.rs
// ============================================================================
// Module: Process Tool Tests
// Description: Unit tests for the subprocess handlers.
// Purpose: Verify allowlist gating, timeouts, and non-zero-exit semantics.
// Dependencies: repo-gate-core, serde_json, tempfile, tokio
// ============================================================================

//! ## Overview
//! Tests use a permissive allowlist for spawn behavior and the builtin
//! allowlist for rejection behavior. Output truncation is tested directly on
//! the helper to avoid generating megabytes of subprocess output.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions are permitted."
)]

use std::path::Path;

use repo_gate_core::AllowedCommandSet;
use repo_gate_core::CommandGuard;
use repo_gate_core::ErrorCode;
use repo_gate_core::PathGuard;
use serde_json::json;

use super::git_diff;
use super::git_status;
use super::run_command;
use super::truncate_output;
use crate::tools::GitDiffArgs;
use crate::tools::GitStatusArgs;
use crate::tools::RunCommandArgs;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn fixture() -> (tempfile::TempDir, PathGuard) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
    let guard = PathGuard::new(dir.path()).expect("guard");
    (dir, guard)
}

/// Guard whose allowlist covers the binaries used in these tests.
fn permissive_guard() -> CommandGuard {
    CommandGuard::new(AllowedCommandSet::new(
        ["echo", "pwd", "sleep", "false"].map(str::to_string),
    ))
}

fn args(value: serde_json::Value) -> RunCommandArgs {
    serde_json::from_value(value).expect("args")
}

/// Runs a git subcommand in the fixture, panicking on failure.
fn git(root: &Path, argv: &[&str]) {
    let status = std::process::Command::new("git")
        .arg("-C")
        .arg(root)
        .args(argv)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .expect("spawn git");
    assert!(status.success(), "git {argv:?} failed");
}

/// Temporary root initialized as a git repository with one committed file.
fn git_fixture() -> (tempfile::TempDir, PathGuard) {
    let (dir, guard) = fixture();
    git(dir.path(), &["init", "--quiet"]);
    git(dir.path(), &["config", "user.email", "dev@example.invalid"]);
    git(dir.path(), &["config", "user.name", "Dev"]);
    std::fs::write(dir.path().join("notes.md"), "one\n").expect("write");
    git(dir.path(), &["add", "notes.md"]);
    git(dir.path(), &["commit", "--quiet", "-m", "initial"]);
    (dir, guard)
}

fn status_args(value: serde_json::Value) -> GitStatusArgs {
    serde_json::from_value(value).expect("args")
}

fn diff_args(value: serde_json::Value) -> GitDiffArgs {
    serde_json::from_value(value).expect("args")
}

// ============================================================================
// SECTION: Run Command Tests
// ============================================================================

#[tokio::test]
async fn runs_allowlisted_command() {
    let (_dir, path_guard) = fixture();
    let value = run_command(
        &permissive_guard(),
        &path_guard,
        args(json!({ "command": "echo", "args": ["hi"] })),
    )
    .await
    .expect("run");
    assert_eq!(value["stdout"], "hi\n");
    assert_eq!(value["exitCode"], 0);
}

#[tokio::test]
async fn non_zero_exit_is_a_successful_outcome() {
    let (_dir, path_guard) = fixture();
    let value = run_command(&permissive_guard(), &path_guard, args(json!({ "command": "false" })))
        .await
        .expect("run");
    assert_eq!(value["exitCode"], 1);
}

#[tokio::test]
async fn disallowed_command_is_rejected_before_spawn() {
    let (_dir, path_guard) = fixture();
    let guard = CommandGuard::default();
    let err = run_command(&guard, &path_guard, args(json!({ "command": "rm -rf /" })))
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::CommandNotAllowed);
}

#[tokio::test]
async fn injection_in_extra_args_is_rejected() {
    let (_dir, path_guard) = fixture();
    let err = run_command(
        &permissive_guard(),
        &path_guard,
        args(json!({ "command": "echo", "args": ["hi; rm -rf /"] })),
    )
    .await
    .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::CommandNotAllowed);
}

#[tokio::test]
async fn cwd_outside_root_is_rejected() {
    let (_dir, path_guard) = fixture();
    let err = run_command(
        &permissive_guard(),
        &path_guard,
        args(json!({ "command": "pwd", "cwd": "../elsewhere" })),
    )
    .await
    .expect_err("escape");
    assert_eq!(err.code(), ErrorCode::PathTraversal);
}

#[tokio::test]
async fn cwd_inside_root_is_honored() {
    let (dir, path_guard) = fixture();
    let value = run_command(
        &permissive_guard(),
        &path_guard,
        args(json!({ "command": "pwd", "cwd": "sub" })),
    )
    .await
    .expect("run");
    let stdout = value["stdout"].as_str().unwrap();
    assert!(stdout.trim_end().ends_with("sub"), "unexpected cwd: {stdout}");
    drop(dir);
}

#[tokio::test]
async fn timeout_kills_the_command() {
    let (_dir, path_guard) = fixture();
    let err = run_command(
        &permissive_guard(),
        &path_guard,
        args(json!({ "command": "sleep", "args": ["5"], "timeout": 1 })),
    )
    .await
    .expect_err("timeout");
    assert_eq!(err.code(), ErrorCode::OperationFailed);
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn unspawnable_command_is_operation_failed() {
    let (_dir, path_guard) = fixture();
    let guard = CommandGuard::new(AllowedCommandSet::new(
        ["definitely-not-a-real-binary".to_string()],
    ));
    let err = run_command(
        &guard,
        &path_guard,
        args(json!({ "command": "definitely-not-a-real-binary" })),
    )
    .await
    .expect_err("spawn failure");
    assert_eq!(err.code(), ErrorCode::OperationFailed);
}

// ============================================================================
// SECTION: Git Status Tests
// ============================================================================

#[tokio::test]
async fn git_status_short_flag_lists_untracked_entries() {
    let (dir, _guard) = git_fixture();
    std::fs::write(dir.path().join("scratch.txt"), "x").expect("write");
    let value = git_status(dir.path(), status_args(json!({ "short": true })))
        .await
        .expect("status");
    assert_eq!(value["exitCode"], 0);
    let output = value["output"].as_str().unwrap();
    assert!(output.contains("?? scratch.txt"), "unexpected status: {output}");
}

#[tokio::test]
async fn git_status_outside_a_repository_reports_the_exit_code() {
    let (dir, _guard) = fixture();
    let value = git_status(dir.path(), status_args(json!({}))).await.expect("status");
    assert_ne!(value["exitCode"], 0);
    assert!(!value["stderr"].as_str().unwrap().is_empty());
}

// ============================================================================
// SECTION: Git Diff Tests
// ============================================================================

#[tokio::test]
async fn git_diff_path_outside_root_is_rejected() {
    let (_dir, guard) = fixture();
    let err = git_diff(&guard, diff_args(json!({ "path": "../../etc/passwd" })))
        .await
        .expect_err("escape");
    assert_eq!(err.code(), ErrorCode::PathTraversal);
}

#[tokio::test]
async fn git_diff_reports_working_tree_changes() {
    let (dir, guard) = git_fixture();
    std::fs::write(dir.path().join("notes.md"), "two\n").expect("write");
    let value = git_diff(&guard, diff_args(json!({}))).await.expect("diff");
    assert_eq!(value["exitCode"], 0);
    assert_eq!(value["truncated"], false);
    let diff = value["diff"].as_str().unwrap();
    assert!(diff.contains("-one"), "unexpected diff: {diff}");
    assert!(diff.contains("+two"), "unexpected diff: {diff}");
}

#[tokio::test]
async fn git_diff_staged_flag_selects_the_index() {
    let (dir, guard) = git_fixture();
    std::fs::write(dir.path().join("notes.md"), "two\n").expect("write");
    git(dir.path(), &["add", "notes.md"]);

    let staged = git_diff(&guard, diff_args(json!({ "staged": true }))).await.expect("diff");
    assert!(staged["diff"].as_str().unwrap().contains("+two"));

    // Fully staged, so the working-tree diff is empty.
    let working = git_diff(&guard, diff_args(json!({}))).await.expect("diff");
    assert_eq!(working["diff"], "");
}

#[tokio::test]
async fn git_diff_scopes_to_a_guarded_path() {
    let (dir, guard) = git_fixture();
    std::fs::write(dir.path().join("other.md"), "base\n").expect("write");
    git(dir.path(), &["add", "other.md"]);
    git(dir.path(), &["commit", "--quiet", "-m", "second"]);
    std::fs::write(dir.path().join("notes.md"), "two\n").expect("write");
    std::fs::write(dir.path().join("other.md"), "changed\n").expect("write");

    let value = git_diff(&guard, diff_args(json!({ "path": "notes.md" }))).await.expect("diff");
    let diff = value["diff"].as_str().unwrap();
    assert!(diff.contains("notes.md"), "unexpected diff: {diff}");
    assert!(!diff.contains("other.md"), "unexpected diff: {diff}");
}

#[tokio::test]
async fn git_diff_max_lines_truncates_and_flags() {
    let (dir, guard) = git_fixture();
    std::fs::write(dir.path().join("notes.md"), "two\n").expect("write");
    let value =
        git_diff(&guard, diff_args(json!({ "maxLines": 2 }))).await.expect("diff");
    assert_eq!(value["truncated"], true);
    assert_eq!(value["diff"].as_str().unwrap().lines().count(), 2);
}

// ============================================================================
// SECTION: Output Helper Tests
// ============================================================================

#[test]
fn output_under_cap_is_untouched() {
    let (text, truncated) = truncate_output(b"hello", 16);
    assert_eq!(text, "hello");
    assert!(!truncated);
}

#[test]
fn output_over_cap_is_truncated() {
    let (text, truncated) = truncate_output(&[b'a'; 32], 16);
    assert_eq!(text.len(), 16);
    assert!(truncated);
}
