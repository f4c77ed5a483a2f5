// crates/repo-gate-mcp/src/fs_tools.rs
// ============================================================================
// Module: Filesystem Tools
// Description: Handlers for read-file, list-directory, glob-search, apply-patch.
// Purpose: Perform guarded filesystem operations confined to the root.
// Dependencies: base64, globset, repo-gate-core, tokio, walkdir
// ============================================================================

//! ## Overview
//! Filesystem handlers. Every caller-supplied path passes through the path
//! guard before any I/O; glob traversal never leaves the repository root and
//! silently drops entries matching the sensitive-pattern denylist.
//! Security posture: `apply-patch` is deliberately best-effort per entry, not
//! transactional; one entry's failure never blocks the rest of the batch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use repo_gate_core::GatewayError;
use repo_gate_core::PathGuard;
use repo_gate_core::ValidatedPath;
use serde_json::Value;
use serde_json::json;
use walkdir::WalkDir;

use crate::tools::ApplyPatchArgs;
use crate::tools::FileEncoding;
use crate::tools::GlobSearchArgs;
use crate::tools::ListDirectoryArgs;
use crate::tools::PatchMode;
use crate::tools::ReadFileArgs;

// ============================================================================
// SECTION: Read File
// ============================================================================

/// Reads a guarded file as UTF-8 text or base64-encoded bytes.
///
/// # Errors
///
/// Returns guard failures, [`GatewayError::FileTooLarge`] past the size cap,
/// or [`GatewayError::InvalidInput`] for non-UTF-8 content read as text.
pub async fn read_file(
    guard: &PathGuard,
    max_file_size: u64,
    args: ReadFileArgs,
) -> Result<Value, GatewayError> {
    let path = guard.validate(&args.path)?;
    guard.validate_is_file(&path)?;
    guard.validate_file_size(&path, max_file_size)?;
    let bytes = tokio::fs::read(path.as_path()).await?;
    let size_bytes = bytes.len();
    let (content, encoding) = match args.encoding {
        FileEncoding::Utf8 => {
            let text = String::from_utf8(bytes).map_err(|_| {
                GatewayError::InvalidInput(format!(
                    "file is not valid utf-8, request base64 encoding: {}",
                    args.path
                ))
            })?;
            (text, "utf-8")
        }
        FileEncoding::Base64 => (BASE64.encode(bytes), "base64"),
    };
    Ok(json!({
        "path": relative_display(guard, &path),
        "content": content,
        "encoding": encoding,
        "sizeBytes": size_bytes,
    }))
}

// ============================================================================
// SECTION: List Directory
// ============================================================================

/// Lists a guarded directory, skipping dot-prefixed entries unless asked.
///
/// # Errors
///
/// Returns guard failures or [`GatewayError::InvalidInput`] when the path is
/// not a directory.
pub async fn list_directory(
    guard: &PathGuard,
    args: ListDirectoryArgs,
) -> Result<Value, GatewayError> {
    let requested = args.path.as_deref().unwrap_or(".");
    let path = guard.validate(requested)?;
    guard.validate_is_directory(&path)?;
    let mut reader = tokio::fs::read_dir(path.as_path()).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !args.include_hidden && name.starts_with('.') {
            continue;
        }
        let metadata = entry.metadata().await?;
        let kind = if metadata.is_dir() {
            "directory"
        } else if metadata.is_file() {
            "file"
        } else {
            "other"
        };
        let size_bytes = metadata.is_file().then(|| metadata.len());
        entries.push(json!({
            "name": name,
            "kind": kind,
            "sizeBytes": size_bytes,
        }));
    }
    entries.sort_by(|left, right| {
        let left = left["name"].as_str().unwrap_or_default();
        let right = right["name"].as_str().unwrap_or_default();
        left.cmp(right)
    });
    let count = entries.len();
    Ok(json!({
        "path": relative_display(guard, &path),
        "entries": entries,
        "count": count,
    }))
}

// ============================================================================
// SECTION: Glob Search
// ============================================================================

/// Finds files matching a glob pattern under guarded base paths.
///
/// Traversal is confined to the repository root; entries matching the
/// sensitive-pattern denylist are dropped from results rather than erroring
/// the whole search. The directory walk is synchronous, so it runs on the
/// blocking thread pool rather than a runtime worker.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidInput`] for malformed glob patterns and
/// guard failures for base paths outside the root.
pub async fn glob_search(
    guard: &PathGuard,
    max_results_cap: usize,
    args: GlobSearchArgs,
) -> Result<Value, GatewayError> {
    let guard = guard.clone();
    tokio::task::spawn_blocking(move || walk_globs(&guard, max_results_cap, args))
        .await
        .map_err(|err| GatewayError::Internal(format!("glob search task failed: {err}")))?
}

/// Performs the blocking glob walk; see [`glob_search`].
fn walk_globs(
    guard: &PathGuard,
    max_results_cap: usize,
    args: GlobSearchArgs,
) -> Result<Value, GatewayError> {
    let matcher = build_glob_set(std::slice::from_ref(&args.pattern))?;
    let exclude = match args.exclude_patterns.as_deref() {
        Some(patterns) if !patterns.is_empty() => Some(build_glob_set(patterns)?),
        _ => None,
    };
    let cap = max_results_cap.max(1);
    let limit = args.max_results.unwrap_or(cap).clamp(1, cap);

    let bases = match args.paths.as_deref() {
        Some(paths) if !paths.is_empty() => {
            let mut validated = Vec::with_capacity(paths.len());
            for base in paths {
                let path = guard.validate(base)?;
                guard.validate_is_directory(&path)?;
                validated.push(path);
            }
            validated
        }
        _ => {
            let root = guard.validate(".")?;
            guard.validate_is_directory(&root)?;
            vec![root]
        }
    };

    let mut matches = Vec::new();
    let mut truncated = false;
    'bases: for base in &bases {
        for entry in WalkDir::new(base.as_path()).sort_by_file_name() {
            let Ok(entry) = entry else {
                continue;
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(guard.root()) else {
                continue;
            };
            if !matcher.is_match(relative) {
                continue;
            }
            if exclude.as_ref().is_some_and(|set| set.is_match(relative)) {
                continue;
            }
            // Sensitive paths are dropped silently; a search result listing
            // blocked files would itself leak their existence.
            if guard.validate(&relative.to_string_lossy()).is_err() {
                continue;
            }
            if matches.len() == limit {
                truncated = true;
                break 'bases;
            }
            matches.push(relative.to_string_lossy().into_owned());
        }
    }

    let count = matches.len();
    Ok(json!({
        "pattern": args.pattern,
        "matches": matches,
        "count": count,
        "truncated": truncated,
    }))
}

/// Compiles a list of glob patterns into one matcher.
fn build_glob_set(patterns: &[String]) -> Result<GlobSet, GatewayError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| {
            GatewayError::InvalidInput(format!("invalid glob pattern `{pattern}`: {err}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| GatewayError::InvalidInput(format!("invalid glob set: {err}")))
}

// ============================================================================
// SECTION: Apply Patch
// ============================================================================

/// Applies a best-effort batch of file changes.
///
/// Each entry's path is validated independently; a failing entry is recorded
/// with its own error message and does not stop the rest of the batch. With
/// `dryRun` set, validation runs but nothing is mutated and valid entries are
/// still reported as applied.
///
/// # Errors
///
/// The batch itself only fails on argument-shape problems surfaced earlier;
/// per-entry failures are reported inside the success payload.
pub async fn apply_patch(guard: &PathGuard, args: ApplyPatchArgs) -> Result<Value, GatewayError> {
    let mut applied = Vec::new();
    let mut failed = Vec::new();
    for change in &args.changes {
        match apply_change(guard, change, args.dry_run).await {
            Ok(()) => applied.push(change.path.clone()),
            Err(err) => failed.push(json!({
                "path": change.path,
                "error": err.to_string(),
            })),
        }
    }
    Ok(json!({
        "applied": applied,
        "failed": failed,
        "dryRun": args.dry_run,
    }))
}

/// Validates and, outside dry-run, performs a single patch entry.
async fn apply_change(
    guard: &PathGuard,
    change: &crate::tools::PatchChange,
    dry_run: bool,
) -> Result<(), GatewayError> {
    let path = guard.validate(&change.path)?;
    match change.mode {
        PatchMode::Create | PatchMode::Update => {
            let content = change.content.as_deref().ok_or_else(|| {
                GatewayError::MissingParameter(format!(
                    "content is required for {} of {}",
                    mode_label(change.mode),
                    change.path
                ))
            })?;
            if dry_run {
                return Ok(());
            }
            if change.mode == PatchMode::Create
                && let Some(parent) = path.as_path().parent()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path.as_path(), content).await?;
        }
        PatchMode::Delete => {
            if dry_run {
                return Ok(());
            }
            tokio::fs::remove_file(path.as_path()).await?;
        }
    }
    Ok(())
}

/// Returns the wire label for a patch mode.
const fn mode_label(mode: PatchMode) -> &'static str {
    match mode {
        PatchMode::Create => "create",
        PatchMode::Update => "update",
        PatchMode::Delete => "delete",
    }
}

// ============================================================================
// SECTION: Display Helpers
// ============================================================================

/// Renders a validated path relative to the root for response payloads.
fn relative_display(guard: &PathGuard, path: &ValidatedPath) -> String {
    path.as_path()
        .strip_prefix(guard.root())
        .map_or_else(|_| path.as_path().display().to_string(), render_relative)
}

/// Renders a root-relative path, using `.` for the root itself.
fn render_relative(relative: &Path) -> String {
    if relative.as_os_str().is_empty() {
        ".".to_string()
    } else {
        relative.display().to_string()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
