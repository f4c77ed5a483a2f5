// crates/repo-gate-core/src/path_guard.rs
// ============================================================================
// Module: Path Guard
// Description: Root confinement and sensitive-pattern blocking for paths.
// Purpose: Ensure every caller-supplied path stays inside the repository root.
// Dependencies: serde_json (details payloads), std::path
// ============================================================================

//! ## Overview
//! The path guard confines caller-supplied paths to a configured repository
//! root and blocks sensitive filename patterns. Containment is decided by
//! path **components**, not raw string prefixes, which closes the sibling
//! directory bypass where a root of `/work` would otherwise accept
//! `/work-other`. Normalization is purely lexical: no symlinks are resolved
//! and no filesystem access occurs during validation.
//! Security posture: requested paths are untrusted input; validation fails
//! closed and the sensitive-pattern denylist applies even inside the root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::error::GatewayError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Case-insensitive substrings that block a path regardless of containment.
pub const SENSITIVE_PATTERNS: &[&str] = &[
    ".env",
    "credentials.json",
    "private-key",
    ".ssh",
    "secrets",
    ".pem",
    "id_rsa",
    ".aws",
];

// ============================================================================
// SECTION: Validated Path
// ============================================================================

/// Normalized absolute path proven to live inside the repository root.
///
/// # Invariants
/// - Constructible only through [`PathGuard::validate`]; a value always has
///   the guard's root as a component-wise prefix.
/// - Ephemeral: recomputed per call, never cached across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    /// Normalized absolute path.
    inner: PathBuf,
}

impl ValidatedPath {
    /// Returns the validated path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.inner
    }

    /// Consumes the wrapper and returns the owned path.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.inner
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.inner
    }
}

// ============================================================================
// SECTION: Path Guard
// ============================================================================

/// Path confinement guard bound to a repository root.
///
/// # Invariants
/// - The root is absolute and lexically normalized at construction.
#[derive(Debug, Clone)]
pub struct PathGuard {
    /// Normalized absolute repository root.
    root: PathBuf,
}

impl PathGuard {
    /// Builds a guard for the given repository root.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when the root is not absolute.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let root = root.as_ref();
        if !root.is_absolute() {
            return Err(GatewayError::Configuration(format!(
                "repository root must be absolute: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: normalize_lexically(root),
        })
    }

    /// Returns the normalized repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates a caller-supplied path against the root.
    ///
    /// Absolute inputs are used as-is; relative inputs resolve against the
    /// root. The normalized result must have the root as a component-wise
    /// prefix and must not contain any sensitive pattern.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PathTraversal`] when the normalized path
    /// escapes the root, or [`GatewayError::PermissionDenied`] when it
    /// matches a sensitive pattern.
    pub fn validate(&self, requested: &str) -> Result<ValidatedPath, GatewayError> {
        if requested.trim().is_empty() {
            return Err(GatewayError::InvalidInput("path must not be empty".to_string()));
        }
        let candidate = Path::new(requested);
        let resolved =
            if candidate.is_absolute() { candidate.to_path_buf() } else { self.root.join(candidate) };
        let normalized = normalize_lexically(&resolved);
        if normalized.strip_prefix(&self.root).is_err() {
            return Err(GatewayError::PathTraversal(format!(
                "path escapes repository root: {requested}"
            )));
        }
        check_sensitive_patterns(&normalized)?;
        Ok(ValidatedPath {
            inner: normalized,
        })
    }

    /// Probes whether a path validates and exists, without raising.
    #[must_use]
    pub fn exists(&self, requested: &str) -> bool {
        self.validate(requested).is_ok_and(|path| path.as_path().exists())
    }

    /// Validates that a file does not exceed the size limit.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::FileTooLarge`] when the file exceeds
    /// `max_bytes`, or the underlying metadata error otherwise.
    pub fn validate_file_size(
        &self,
        path: &ValidatedPath,
        max_bytes: u64,
    ) -> Result<(), GatewayError> {
        let metadata = fs::metadata(path.as_path())?;
        if metadata.len() > max_bytes {
            return Err(GatewayError::FileTooLarge(format!(
                "file is {} bytes, limit is {max_bytes}",
                metadata.len()
            )));
        }
        Ok(())
    }

    /// Validates that the path refers to a regular file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] when the path is not a file.
    pub fn validate_is_file(&self, path: &ValidatedPath) -> Result<(), GatewayError> {
        let metadata = fs::metadata(path.as_path())?;
        if !metadata.is_file() {
            return Err(GatewayError::InvalidInput(format!(
                "not a regular file: {}",
                path.as_path().display()
            )));
        }
        Ok(())
    }

    /// Validates that the path refers to a directory.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] when the path is not a
    /// directory.
    pub fn validate_is_directory(&self, path: &ValidatedPath) -> Result<(), GatewayError> {
        let metadata = fs::metadata(path.as_path())?;
        if !metadata.is_dir() {
            return Err(GatewayError::InvalidInput(format!(
                "not a directory: {}",
                path.as_path().display()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Lexically normalizes a path, collapsing `.` and `..` segments.
///
/// `..` at the filesystem root is clamped rather than rejected; escape is
/// decided afterwards by component-wise containment, so clamping cannot
/// smuggle a path back inside the root.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = normalized.pop();
                if !popped {
                    normalized.push(Component::ParentDir.as_os_str());
                }
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }
    normalized
}

/// Rejects paths containing any sensitive pattern, case-insensitively.
fn check_sensitive_patterns(path: &Path) -> Result<(), GatewayError> {
    let haystack = path.to_string_lossy().to_ascii_lowercase();
    for pattern in SENSITIVE_PATTERNS {
        if haystack.contains(pattern) {
            return Err(GatewayError::PermissionDenied(format!(
                "path matches blocked pattern `{pattern}`"
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
