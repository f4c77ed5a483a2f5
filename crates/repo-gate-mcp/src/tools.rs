// crates/repo-gate-mcp/src/tools.rs
// ============================================================================
// Module: Tool Surface
// Description: Tool names, argument shapes, and listing metadata.
// Purpose: Define the fixed seven-tool surface exposed by the gateway.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The gateway exposes exactly seven tools. Dispatch is an exact name match
//! over [`ToolName`]; argument shapes deserialize strictly so unknown fields
//! are rejected rather than silently dropped.
//! Security posture: arguments are untrusted input; shape validation here is
//! only the first gate, the path and command guards run afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Closed set of tool names exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolName {
    /// Read a file inside the repository root.
    ReadFile,
    /// List a directory inside the repository root.
    ListDirectory,
    /// Glob-match files under the repository root.
    GlobSearch,
    /// Apply a best-effort batch of file changes.
    ApplyPatch,
    /// Report working-tree status.
    GitStatus,
    /// Report working-tree or staged diff.
    GitDiff,
    /// Run an allowlisted command.
    RunCommand,
}

impl ToolName {
    /// Parses a wire tool name, exact match only.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "read-file" => Some(Self::ReadFile),
            "list-directory" => Some(Self::ListDirectory),
            "glob-search" => Some(Self::GlobSearch),
            "apply-patch" => Some(Self::ApplyPatch),
            "git-status" => Some(Self::GitStatus),
            "git-diff" => Some(Self::GitDiff),
            "run-command" => Some(Self::RunCommand),
            _ => None,
        }
    }

    /// Returns the wire name for this tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadFile => "read-file",
            Self::ListDirectory => "list-directory",
            Self::GlobSearch => "glob-search",
            Self::ApplyPatch => "apply-patch",
            Self::GitStatus => "git-status",
            Self::GitDiff => "git-diff",
            Self::RunCommand => "run-command",
        }
    }
}

// ============================================================================
// SECTION: Argument Shapes
// ============================================================================

/// File content encoding for `read-file` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum FileEncoding {
    /// UTF-8 text content.
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    /// Base64-encoded binary content.
    #[serde(rename = "base64")]
    Base64,
}

/// Arguments for `read-file`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReadFileArgs {
    /// Path to read, relative to the root or absolute inside it.
    pub path: String,
    /// Content encoding, UTF-8 unless overridden.
    #[serde(default)]
    pub encoding: FileEncoding,
}

/// Arguments for `list-directory`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListDirectoryArgs {
    /// Directory to list; the repository root when omitted.
    #[serde(default)]
    pub path: Option<String>,
    /// Whether dot-prefixed entries are included.
    #[serde(default)]
    pub include_hidden: bool,
}

/// Arguments for `glob-search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GlobSearchArgs {
    /// Glob pattern matched against root-relative paths.
    pub pattern: String,
    /// Base paths to search under; the repository root when omitted.
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    /// Result cap for this call, bounded by the configured maximum.
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Glob patterns whose matches are excluded from results.
    #[serde(default)]
    pub exclude_patterns: Option<Vec<String>>,
}

/// Mutation mode for a single patch entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchMode {
    /// Create the file, parent directories included.
    Create,
    /// Overwrite the file with new content.
    Update,
    /// Remove the file.
    Delete,
}

/// A single file change inside an `apply-patch` batch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchChange {
    /// Target path, validated independently per entry.
    pub path: String,
    /// New file content; required for create and update.
    #[serde(default)]
    pub content: Option<String>,
    /// Mutation mode.
    pub mode: PatchMode,
}

/// Arguments for `apply-patch`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyPatchArgs {
    /// Batch of file changes, applied best-effort in order.
    pub changes: Vec<PatchChange>,
    /// Validate without mutating when set.
    #[serde(default)]
    pub dry_run: bool,
}

/// Arguments for `git-status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GitStatusArgs {
    /// Use the short status format when set.
    #[serde(default)]
    pub short: bool,
}

/// Arguments for `git-diff`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GitDiffArgs {
    /// Limit the diff to a single validated path.
    #[serde(default)]
    pub path: Option<String>,
    /// Diff the index instead of the working tree.
    #[serde(default)]
    pub staged: bool,
    /// Truncate diff output to this many lines.
    #[serde(default)]
    pub max_lines: Option<usize>,
}

/// Arguments for `run-command`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunCommandArgs {
    /// Command string validated against the allowlist.
    pub command: String,
    /// Extra arguments appended to the command.
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// Working directory, validated under the root; the root when omitted.
    #[serde(default)]
    pub cwd: Option<String>,
    /// Timeout in seconds; the default when omitted.
    #[serde(default)]
    pub timeout: Option<u64>,
}

// ============================================================================
// SECTION: Tool Listing
// ============================================================================

/// Tool metadata returned by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Wire tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    pub input_schema: Value,
}

/// Returns the definitions for all seven tools in dispatch order.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: ToolName::ReadFile,
            description: "Read a file inside the repository root as UTF-8 or base64.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "encoding": { "type": "string", "enum": ["utf-8", "base64"] }
                },
                "required": ["path"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: ToolName::ListDirectory,
            description: "List entries of a directory inside the repository root.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "includeHidden": { "type": "boolean" }
                },
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: ToolName::GlobSearch,
            description: "Find files under the repository root matching a glob pattern."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pattern": { "type": "string" },
                    "paths": { "type": "array", "items": { "type": "string" } },
                    "maxResults": { "type": "integer", "minimum": 1 },
                    "excludePatterns": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["pattern"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: ToolName::ApplyPatch,
            description: "Apply a best-effort batch of create/update/delete file changes."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "changes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "path": { "type": "string" },
                                "content": { "type": "string" },
                                "mode": { "type": "string", "enum": ["create", "update", "delete"] }
                            },
                            "required": ["path", "mode"],
                            "additionalProperties": false
                        }
                    },
                    "dryRun": { "type": "boolean" }
                },
                "required": ["changes"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: ToolName::GitStatus,
            description: "Report version-control status for the repository root.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "short": { "type": "boolean" }
                },
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: ToolName::GitDiff,
            description: "Report the working-tree or staged diff, optionally for one path."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "staged": { "type": "boolean" },
                    "maxLines": { "type": "integer", "minimum": 1 }
                },
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: ToolName::RunCommand,
            description: "Run an allowlisted command inside the repository root.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string" },
                    "args": { "type": "array", "items": { "type": "string" } },
                    "cwd": { "type": "string" },
                    "timeout": { "type": "integer", "minimum": 1 }
                },
                "required": ["command"],
                "additionalProperties": false
            }),
        },
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================
