// crates/repo-gate-mcp/src/fs_tools/tests.rs
// ============================================================================
// Module: Filesystem Tool Tests
// Description: Unit tests for the guarded filesystem handlers.
// Purpose: Verify confinement, caps, and best-effort patch semantics.
// Dependencies: repo-gate-core, serde_json, tempfile, tokio
// ============================================================================

//! ## Overview
//! Handler tests over a temporary repository root: read encodings, hidden
//! entry filtering, glob caps and exclusions, and per-entry patch reporting.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions are permitted."
)]

use repo_gate_core::ErrorCode;
use repo_gate_core::PathGuard;
use serde_json::json;

use super::apply_patch;
use super::glob_search;
use super::list_directory;
use super::read_file;
use crate::tools::ApplyPatchArgs;
use crate::tools::GlobSearchArgs;
use crate::tools::ListDirectoryArgs;
use crate::tools::ReadFileArgs;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a temporary root with a small file tree and its guard.
fn fixture() -> (tempfile::TempDir, PathGuard) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("notes.md"), "hello").expect("write");
    std::fs::write(dir.path().join(".hidden"), "x").expect("write");
    std::fs::create_dir(dir.path().join("src")).expect("mkdir");
    std::fs::write(dir.path().join("src/main.rs"), "fn main() {}").expect("write");
    std::fs::write(dir.path().join("src/lib.rs"), "").expect("write");
    let guard = PathGuard::new(dir.path()).expect("guard");
    (dir, guard)
}

fn read_args(path: &str) -> ReadFileArgs {
    serde_json::from_value(json!({ "path": path })).expect("args")
}

// ============================================================================
// SECTION: Read File Tests
// ============================================================================

#[tokio::test]
async fn reads_utf8_content() {
    let (_dir, guard) = fixture();
    let value = read_file(&guard, 1024, read_args("notes.md")).await.expect("read");
    assert_eq!(value["content"], "hello");
    assert_eq!(value["encoding"], "utf-8");
    assert_eq!(value["sizeBytes"], 5);
    assert_eq!(value["path"], "notes.md");
}

#[tokio::test]
async fn reads_base64_content() {
    let (_dir, guard) = fixture();
    let args = serde_json::from_value(json!({ "path": "notes.md", "encoding": "base64" }))
        .expect("args");
    let value = read_file(&guard, 1024, args).await.expect("read");
    assert_eq!(value["content"], "aGVsbG8=");
    assert_eq!(value["encoding"], "base64");
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let (_dir, guard) = fixture();
    let err = read_file(&guard, 2, read_args("notes.md")).await.expect_err("too large");
    assert_eq!(err.code(), ErrorCode::FileTooLarge);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let (_dir, guard) = fixture();
    let err = read_file(&guard, 1024, read_args("absent.md")).await.expect_err("missing");
    assert_eq!(err.code(), ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn directory_read_is_invalid_input() {
    let (_dir, guard) = fixture();
    let err = read_file(&guard, 1024, read_args("src")).await.expect_err("directory");
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}

// ============================================================================
// SECTION: List Directory Tests
// ============================================================================

#[tokio::test]
async fn lists_root_without_hidden_entries() {
    let (_dir, guard) = fixture();
    let value = list_directory(&guard, ListDirectoryArgs::default()).await.expect("list");
    let names: Vec<&str> =
        value["entries"].as_array().unwrap().iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["notes.md", "src"]);
    assert_eq!(value["count"], 2);
    assert_eq!(value["path"], ".");
}

#[tokio::test]
async fn include_hidden_lists_dot_entries() {
    let (_dir, guard) = fixture();
    let args = serde_json::from_value(json!({ "includeHidden": true })).expect("args");
    let value = list_directory(&guard, args).await.expect("list");
    let names: Vec<&str> =
        value["entries"].as_array().unwrap().iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, [".hidden", "notes.md", "src"]);
}

#[tokio::test]
async fn listing_a_file_is_invalid_input() {
    let (_dir, guard) = fixture();
    let args = serde_json::from_value(json!({ "path": "notes.md" })).expect("args");
    let err = list_directory(&guard, args).await.expect_err("file");
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}

// ============================================================================
// SECTION: Glob Search Tests
// ============================================================================

#[tokio::test]
async fn glob_matches_relative_paths() {
    let (_dir, guard) = fixture();
    let args: GlobSearchArgs =
        serde_json::from_value(json!({ "pattern": "src/*.rs" })).expect("args");
    let value = glob_search(&guard, 100, args).await.expect("search");
    let matches: Vec<&str> =
        value["matches"].as_array().unwrap().iter().map(|m| m.as_str().unwrap()).collect();
    assert_eq!(matches, ["src/lib.rs", "src/main.rs"]);
    assert_eq!(value["truncated"], false);
}

#[tokio::test]
async fn glob_respects_result_cap() {
    let (_dir, guard) = fixture();
    let args: GlobSearchArgs =
        serde_json::from_value(json!({ "pattern": "**/*", "maxResults": 1 })).expect("args");
    let value = glob_search(&guard, 100, args).await.expect("search");
    assert_eq!(value["matches"].as_array().unwrap().len(), 1);
    assert_eq!(value["truncated"], true);
}

#[tokio::test]
async fn glob_excludes_patterns() {
    let (_dir, guard) = fixture();
    let args: GlobSearchArgs = serde_json::from_value(json!({
        "pattern": "src/*.rs",
        "excludePatterns": ["**/main.rs"],
    }))
    .expect("args");
    let value = glob_search(&guard, 100, args).await.expect("search");
    let matches: Vec<&str> =
        value["matches"].as_array().unwrap().iter().map(|m| m.as_str().unwrap()).collect();
    assert_eq!(matches, ["src/lib.rs"]);
}

#[tokio::test]
async fn glob_drops_sensitive_matches() {
    let (dir, guard) = fixture();
    std::fs::write(dir.path().join("id_rsa"), "key").expect("write");
    let args: GlobSearchArgs = serde_json::from_value(json!({ "pattern": "*" })).expect("args");
    let value = glob_search(&guard, 100, args).await.expect("search");
    let matches: Vec<&str> =
        value["matches"].as_array().unwrap().iter().map(|m| m.as_str().unwrap()).collect();
    assert!(!matches.contains(&"id_rsa"));
}

#[tokio::test]
async fn malformed_glob_is_invalid_input() {
    let (_dir, guard) = fixture();
    let args: GlobSearchArgs =
        serde_json::from_value(json!({ "pattern": "src/[unclosed" })).expect("args");
    let err = glob_search(&guard, 100, args).await.expect_err("bad glob");
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}

#[tokio::test]
async fn glob_base_outside_root_is_rejected() {
    let (_dir, guard) = fixture();
    let args: GlobSearchArgs =
        serde_json::from_value(json!({ "pattern": "*", "paths": ["../outside"] })).expect("args");
    let err = glob_search(&guard, 100, args).await.expect_err("escape");
    assert_eq!(err.code(), ErrorCode::PathTraversal);
}

// ============================================================================
// SECTION: Apply Patch Tests
// ============================================================================

#[tokio::test]
async fn best_effort_batch_reports_per_entry() {
    let (dir, guard) = fixture();
    let args: ApplyPatchArgs = serde_json::from_value(json!({
        "changes": [
            { "path": "a.txt", "content": "one", "mode": "create" },
            { "path": "../escape.txt", "content": "two", "mode": "create" },
            { "path": "b/nested.txt", "content": "three", "mode": "create" },
        ],
    }))
    .expect("args");
    let value = apply_patch(&guard, args).await.expect("patch");
    assert_eq!(value["applied"].as_array().unwrap().len(), 2);
    assert_eq!(value["failed"].as_array().unwrap().len(), 1);
    assert_eq!(value["failed"][0]["path"], "../escape.txt");
    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "one");
    assert_eq!(std::fs::read_to_string(dir.path().join("b/nested.txt")).unwrap(), "three");
}

#[tokio::test]
async fn dry_run_leaves_filesystem_untouched() {
    let (dir, guard) = fixture();
    let args: ApplyPatchArgs = serde_json::from_value(json!({
        "changes": [
            { "path": "a.txt", "content": "one", "mode": "create" },
            { "path": "notes.md", "mode": "delete" },
        ],
        "dryRun": true,
    }))
    .expect("args");
    let value = apply_patch(&guard, args).await.expect("patch");
    assert_eq!(value["applied"].as_array().unwrap().len(), 2);
    assert_eq!(value["dryRun"], true);
    assert!(!dir.path().join("a.txt").exists());
    assert!(dir.path().join("notes.md").exists());
}

#[tokio::test]
async fn update_and_delete_apply() {
    let (dir, guard) = fixture();
    let args: ApplyPatchArgs = serde_json::from_value(json!({
        "changes": [
            { "path": "notes.md", "content": "updated", "mode": "update" },
            { "path": "src/lib.rs", "mode": "delete" },
        ],
    }))
    .expect("args");
    let value = apply_patch(&guard, args).await.expect("patch");
    assert_eq!(value["failed"].as_array().unwrap().len(), 0);
    assert_eq!(std::fs::read_to_string(dir.path().join("notes.md")).unwrap(), "updated");
    assert!(!dir.path().join("src/lib.rs").exists());
}

#[tokio::test]
async fn missing_content_fails_only_that_entry() {
    let (_dir, guard) = fixture();
    let args: ApplyPatchArgs = serde_json::from_value(json!({
        "changes": [
            { "path": "a.txt", "mode": "create" },
            { "path": "b.txt", "content": "ok", "mode": "create" },
        ],
    }))
    .expect("args");
    let value = apply_patch(&guard, args).await.expect("patch");
    assert_eq!(value["applied"].as_array().unwrap().len(), 1);
    assert_eq!(value["failed"].as_array().unwrap().len(), 1);
    assert_eq!(value["failed"][0]["path"], "a.txt");
}

#[tokio::test]
async fn sensitive_path_entry_is_reported_failed() {
    let (_dir, guard) = fixture();
    let args: ApplyPatchArgs = serde_json::from_value(json!({
        "changes": [
            { "path": ".env", "content": "SECRET=1", "mode": "create" },
        ],
    }))
    .expect("args");
    let value = apply_patch(&guard, args).await.expect("patch");
    assert_eq!(value["applied"].as_array().unwrap().len(), 0);
    assert_eq!(value["failed"].as_array().unwrap().len(), 1);
}
