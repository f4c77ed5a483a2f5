// crates/repo-gate-core/src/command_guard.rs
// ============================================================================
// Module: Command Guard
// Description: Allowlist and metacharacter validation for shell commands.
// Purpose: Deny-by-default command execution with injection blocking.
// Dependencies: serde_json (details payloads)
// ============================================================================

//! ## Overview
//! The command guard validates caller-supplied command strings against an
//! ordered allowlist and a fixed dangerous-substring set. The metacharacter
//! check runs before allowlist matching and cannot be bypassed by an allowed
//! base command: `git status; rm -rf /` is rejected for the `;` alone.
//! Security posture: commands are untrusted input; anything not matching the
//! allowlist is denied by default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;

use crate::error::GatewayError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default command allowlist, overridable via configuration.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "pytest",
    "ruff",
    "npm test",
    "npm run lint",
    "npm run build",
    "git status",
    "git diff",
    "git log",
];

/// Dangerous substrings rejected anywhere in a command string.
///
/// Checked before any allowlist matching; `||` is subsumed by `|` but is
/// listed to keep the denylist aligned with the documented contract.
const DANGEROUS_PATTERNS: &[&str] = &["|", ";", "&&", "||", ">", "<", "`", "$(", "\n", "\r"];

// ============================================================================
// SECTION: Allowed Command Set
// ============================================================================

/// Ordered set of allowed command strings, immutable after load.
///
/// # Invariants
/// - Entries are trimmed and non-empty.
/// - Order is preserved from configuration for deterministic error details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedCommandSet {
    /// Allowlist entries in configuration order.
    entries: Vec<String>,
}

impl AllowedCommandSet {
    /// Builds the set from a list of command strings.
    ///
    /// Empty entries are dropped; duplicates are kept in first-seen order.
    #[must_use]
    pub fn new(commands: impl IntoIterator<Item = String>) -> Self {
        let mut entries = Vec::new();
        for command in commands {
            let trimmed = command.trim();
            if !trimmed.is_empty() && !entries.iter().any(|existing| existing == trimmed) {
                entries.push(trimmed.to_string());
            }
        }
        Self {
            entries,
        }
    }

    /// Parses a comma-separated allowlist override from configuration.
    #[must_use]
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::to_string))
    }

    /// Returns the built-in default allowlist.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(DEFAULT_ALLOWED_COMMANDS.iter().map(|entry| (*entry).to_string()))
    }

    /// Returns the allowlist entries in configuration order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Default for AllowedCommandSet {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// SECTION: Command Guard
// ============================================================================

/// Command validation guard bound to an allowlist.
#[derive(Debug, Clone, Default)]
pub struct CommandGuard {
    /// Active allowlist for this guard.
    allowlist: AllowedCommandSet,
}

impl CommandGuard {
    /// Builds a guard over the given allowlist.
    #[must_use]
    pub const fn new(allowlist: AllowedCommandSet) -> Self {
        Self {
            allowlist,
        }
    }

    /// Returns the active allowlist.
    #[must_use]
    pub const fn allowlist(&self) -> &AllowedCommandSet {
        &self.allowlist
    }

    /// Validates a command string against the allowlist.
    ///
    /// Order of checks: empty rejection, dangerous-substring rejection, exact
    /// allowlist match, base-token match, then allowlist-entry prefix match
    /// (an allowed entry followed by a single space and flags).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] for empty commands and
    /// [`GatewayError::CommandNotAllowed`] for everything the allowlist or
    /// metacharacter check rejects.
    pub fn validate(&self, command: &str) -> Result<(), GatewayError> {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::InvalidInput("command must not be empty".to_string()));
        }
        for pattern in DANGEROUS_PATTERNS {
            if command.contains(pattern) {
                return Err(self.rejection(trimmed, format!(
                    "command contains dangerous sequence `{}`",
                    printable_pattern(pattern)
                )));
            }
        }
        if self.allowlist.entries.iter().any(|entry| entry == trimmed) {
            return Ok(());
        }
        let base = trimmed.split_whitespace().next().unwrap_or(trimmed);
        if self.allowlist.entries.iter().any(|entry| entry == base) {
            return Ok(());
        }
        // Supports flags appended to an allowed multi-word base, e.g.
        // "npm test --coverage" under an allowed "npm test".
        if self
            .allowlist
            .entries
            .iter()
            .any(|entry| trimmed.strip_prefix(entry.as_str()).is_some_and(|rest| rest.starts_with(' ')))
        {
            return Ok(());
        }
        Err(self.rejection(trimmed, "base command is not in the allowlist".to_string()))
    }

    /// Builds a rejection error carrying the attempted base command and the
    /// active allowlist.
    fn rejection(&self, command: &str, message: String) -> GatewayError {
        let base = command.split_whitespace().next().unwrap_or(command);
        GatewayError::CommandNotAllowed {
            message,
            details: json!({
                "attempted": base,
                "allowlist": self.allowlist.entries,
            }),
        }
    }
}

/// Non-throwing safety probe over the default allowlist.
#[must_use]
pub fn is_command_safe(command: &str) -> bool {
    CommandGuard::default().validate(command).is_ok()
}

/// Renders control characters in denylist patterns for error messages.
fn printable_pattern(pattern: &str) -> &str {
    match pattern {
        "\n" => "\\n",
        "\r" => "\\r",
        _ => pattern,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
