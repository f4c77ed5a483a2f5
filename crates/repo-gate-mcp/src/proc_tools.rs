// crates/repo-gate-mcp/src/proc_tools.rs
// ============================================================================
// Module: Process Tools
// Description: Handlers for git-status, git-diff, and run-command.
// Purpose: Run bounded subprocesses confined to the repository root.
// Dependencies: repo-gate-core, tokio
// ============================================================================

//! ## Overview
//! Subprocess handlers. Commands are spawned directly from an argv vector,
//! never through a shell, so the metacharacter denylist in the command guard
//! is defense in depth rather than the only barrier. Every subprocess runs
//! under a timeout with bounded output buffers.
//! Security posture: a non-zero exit code is a valid, expected outcome and is
//! returned inside a success envelope; only the gateway's own failures (spawn
//! errors, timeouts) become error envelopes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use repo_gate_core::CommandGuard;
use repo_gate_core::GatewayError;
use repo_gate_core::PathGuard;
use serde_json::Value;
use serde_json::json;
use tokio::process::Command;

use crate::tools::GitDiffArgs;
use crate::tools::GitStatusArgs;
use crate::tools::RunCommandArgs;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default timeout for arbitrary commands, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
/// Output cap for general command stdout/stderr (1 MiB each).
pub const COMMAND_OUTPUT_CAP_BYTES: usize = 1024 * 1024;
/// Output cap for diff output (10 MiB).
pub const DIFF_OUTPUT_CAP_BYTES: usize = 10 * 1024 * 1024;
/// Timeout for git subprocess invocations, in seconds.
const GIT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// SECTION: Git Status
// ============================================================================

/// Reports version-control status for the repository root.
///
/// # Errors
///
/// Returns [`GatewayError::OperationFailed`] when git cannot be spawned or
/// times out.
pub async fn git_status(repo_root: &Path, args: GitStatusArgs) -> Result<Value, GatewayError> {
    let mut argv = vec!["status"];
    if args.short {
        argv.push("--short");
    }
    let output = run_git(repo_root, &argv).await?;
    Ok(json!({
        "output": truncate_output(&output.stdout, COMMAND_OUTPUT_CAP_BYTES).0,
        "stderr": truncate_output(&output.stderr, COMMAND_OUTPUT_CAP_BYTES).0,
        "exitCode": output.status.code().unwrap_or(-1),
    }))
}

// ============================================================================
// SECTION: Git Diff
// ============================================================================

/// Reports the working-tree or staged diff, optionally for one guarded path.
///
/// Diff output is capped at [`DIFF_OUTPUT_CAP_BYTES`] and then truncated to
/// `maxLines` lines when requested.
///
/// # Errors
///
/// Returns guard failures for the optional path, or
/// [`GatewayError::OperationFailed`] when git cannot be spawned or times out.
pub async fn git_diff(
    guard: &PathGuard,
    args: GitDiffArgs,
) -> Result<Value, GatewayError> {
    let mut argv: Vec<String> = vec!["diff".to_string()];
    if args.staged {
        argv.push("--staged".to_string());
    }
    if let Some(requested) = args.path.as_deref() {
        let path = guard.validate(requested)?;
        let relative = path
            .as_path()
            .strip_prefix(guard.root())
            .map_or_else(|_| path.as_path().to_path_buf(), Path::to_path_buf);
        argv.push("--".to_string());
        argv.push(relative.to_string_lossy().into_owned());
    }
    let argv_refs: Vec<&str> = argv.iter().map(String::as_str).collect();
    let output = run_git(guard.root(), &argv_refs).await?;

    let (mut diff, mut truncated) = truncate_output(&output.stdout, DIFF_OUTPUT_CAP_BYTES);
    if let Some(max_lines) = args.max_lines {
        let line_count = diff.lines().count();
        if line_count > max_lines {
            diff = diff.lines().take(max_lines).collect::<Vec<_>>().join("\n");
            truncated = true;
        }
    }
    Ok(json!({
        "diff": diff,
        "stderr": truncate_output(&output.stderr, COMMAND_OUTPUT_CAP_BYTES).0,
        "exitCode": output.status.code().unwrap_or(-1),
        "truncated": truncated,
    }))
}

/// Runs a git subcommand rooted at the repository.
async fn run_git(
    repo_root: &Path,
    argv: &[&str],
) -> Result<std::process::Output, GatewayError> {
    let mut command = Command::new("git");
    command
        .arg("-C")
        .arg(repo_root)
        .args(argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let duration = Duration::from_secs(GIT_TIMEOUT_SECS);
    match tokio::time::timeout(duration, command.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => Err(GatewayError::OperationFailed(format!("failed to run git: {err}"))),
        Err(_) => Err(GatewayError::OperationFailed(format!(
            "git timed out after {GIT_TIMEOUT_SECS}s"
        ))),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Runs an allowlisted command inside the repository root.
///
/// The full command line (command plus appended args) is validated by the
/// command guard, the working directory is validated by the path guard, and
/// the process is spawned from an argv vector without any shell.
///
/// # Errors
///
/// Returns guard failures, or [`GatewayError::OperationFailed`] when the
/// process cannot be spawned or exceeds its timeout.
pub async fn run_command(
    command_guard: &CommandGuard,
    path_guard: &PathGuard,
    args: RunCommandArgs,
) -> Result<Value, GatewayError> {
    let extra = args.args.unwrap_or_default();
    let full = if extra.is_empty() {
        args.command.clone()
    } else {
        format!("{} {}", args.command, extra.join(" "))
    };
    command_guard.validate(&full)?;

    let cwd = match args.cwd.as_deref() {
        Some(requested) => {
            let path = path_guard.validate(requested)?;
            path_guard.validate_is_directory(&path)?;
            path.into_path_buf()
        }
        None => path_guard.root().to_path_buf(),
    };

    let mut tokens = args.command.split_whitespace();
    let Some(program) = tokens.next() else {
        return Err(GatewayError::InvalidInput("command must not be empty".to_string()));
    };
    let timeout_secs = args.timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS);

    let mut process = Command::new(program);
    process
        .args(tokens)
        .args(&extra)
        .current_dir(&cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let duration = Duration::from_secs(timeout_secs);
    let output = match tokio::time::timeout(duration, process.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            return Err(GatewayError::OperationFailed(format!(
                "failed to run `{program}`: {err}"
            )));
        }
        Err(_) => {
            return Err(GatewayError::OperationFailed(format!(
                "command timed out after {timeout_secs}s"
            )));
        }
    };

    let (stdout, stdout_truncated) = truncate_output(&output.stdout, COMMAND_OUTPUT_CAP_BYTES);
    let (stderr, stderr_truncated) = truncate_output(&output.stderr, COMMAND_OUTPUT_CAP_BYTES);
    Ok(json!({
        "stdout": stdout,
        "stderr": stderr,
        "exitCode": output.status.code().unwrap_or(-1),
        "truncated": stdout_truncated || stderr_truncated,
    }))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Renders subprocess output as lossy UTF-8, capped at `max_bytes`.
fn truncate_output(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    if bytes.len() <= max_bytes {
        return (String::from_utf8_lossy(bytes).into_owned(), false);
    }
    (String::from_utf8_lossy(&bytes[..max_bytes]).into_owned(), true)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
