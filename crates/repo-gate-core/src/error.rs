// crates/repo-gate-core/src/error.rs
// ============================================================================
// Module: Error Taxonomy
// Description: Fixed error-code set and the structured gateway error type.
// Purpose: Give every failure a stable code for the result envelope.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failure surfaced by the gateway carries exactly one code from a
//! closed taxonomy. Security checks raise structured errors rather than
//! ambiguous falsy values, and anything unexpected is normalized to
//! `INTERNAL_ERROR` at the dispatch boundary.
//! Security posture: error codes are wire-stable; messages must not leak
//! secrets or absolute host paths beyond the configured root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Closed set of wire-stable error codes grouped by category.
///
/// # Invariants
/// - Variants serialize to their `SCREAMING_SNAKE_CASE` wire labels.
/// - The set is closed; handlers never invent ad-hoc codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Credential required but absent.
    AuthRequired,
    /// Credential present but failed verification.
    AuthInvalid,
    /// Credential expired.
    AuthExpired,
    /// Tenant not in the allowed-tenant list.
    TenantUnauthorized,
    /// Access to the resource is denied by policy.
    PermissionDenied,
    /// Input failed structural validation.
    ValidationError,
    /// Input value is malformed or out of range.
    InvalidInput,
    /// A required parameter is missing.
    MissingParameter,
    /// Referenced resource does not exist.
    ResourceNotFound,
    /// Operation conflicts with existing resource state.
    ResourceConflict,
    /// The requested operation failed.
    OperationFailed,
    /// Backing data store failure.
    DatabaseError,
    /// Downstream service failure.
    ExternalServiceError,
    /// Path escapes the configured repository root.
    PathTraversal,
    /// Command rejected by the allowlist or metacharacter check.
    CommandNotAllowed,
    /// File exceeds the configured size limit.
    FileTooLarge,
    /// Caller exceeded the permitted request rate.
    RateLimitExceeded,
    /// Unexpected internal failure.
    InternalError,
    /// Operation is recognized but not implemented.
    NotImplemented,
    /// Gateway configuration is invalid.
    ConfigurationError,
}

impl ErrorCode {
    /// Returns the stable wire label for this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::AuthInvalid => "AUTH_INVALID",
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::TenantUnauthorized => "TENANT_UNAUTHORIZED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceConflict => "RESOURCE_CONFLICT",
            Self::OperationFailed => "OPERATION_FAILED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            Self::PathTraversal => "PATH_TRAVERSAL",
            Self::CommandNotAllowed => "COMMAND_NOT_ALLOWED",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

// ============================================================================
// SECTION: Gateway Error
// ============================================================================

/// Structured gateway failure carrying a fixed error code.
///
/// # Invariants
/// - Every variant maps to exactly one [`ErrorCode`].
/// - `details` payloads contain caller-correctable context only, never
///   secrets or stack traces.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credential required but absent.
    #[error("authentication required: {0}")]
    AuthRequired(String),
    /// Credential present but failed verification.
    #[error("authentication invalid: {0}")]
    AuthInvalid(String),
    /// Credential expired.
    #[error("authentication expired: {0}")]
    AuthExpired(String),
    /// Tenant not in the allowed-tenant list.
    #[error("tenant unauthorized: {0}")]
    TenantUnauthorized(String),
    /// Access denied by policy (sensitive path patterns included).
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Input failed structural validation.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Input value is malformed or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A required parameter is missing.
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    /// Referenced resource does not exist.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    /// Operation conflicts with existing resource state.
    #[error("resource conflict: {0}")]
    ResourceConflict(String),
    /// The requested operation failed.
    #[error("operation failed: {0}")]
    OperationFailed(String),
    /// Path escapes the configured repository root.
    #[error("path traversal: {0}")]
    PathTraversal(String),
    /// Command rejected by the allowlist or metacharacter check.
    #[error("command not allowed: {message}")]
    CommandNotAllowed {
        /// Human-readable rejection reason.
        message: String,
        /// Attempted base command and the active allowlist.
        details: Value,
    },
    /// File exceeds the configured size limit.
    #[error("file too large: {0}")]
    FileTooLarge(String),
    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
    /// Operation is recognized but not implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// Gateway configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Returns the fixed error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AuthRequired(_) => ErrorCode::AuthRequired,
            Self::AuthInvalid(_) => ErrorCode::AuthInvalid,
            Self::AuthExpired(_) => ErrorCode::AuthExpired,
            Self::TenantUnauthorized(_) => ErrorCode::TenantUnauthorized,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::MissingParameter(_) => ErrorCode::MissingParameter,
            Self::ResourceNotFound(_) => ErrorCode::ResourceNotFound,
            Self::ResourceConflict(_) => ErrorCode::ResourceConflict,
            Self::OperationFailed(_) => ErrorCode::OperationFailed,
            Self::PathTraversal(_) => ErrorCode::PathTraversal,
            Self::CommandNotAllowed {
                ..
            } => ErrorCode::CommandNotAllowed,
            Self::FileTooLarge(_) => ErrorCode::FileTooLarge,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::NotImplemented(_) => ErrorCode::NotImplemented,
            Self::Configuration(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Returns caller-correctable detail payload when one exists.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        match self {
            Self::CommandNotAllowed {
                details, ..
            } => Some(details),
            _ => None,
        }
    }

    /// Returns true when the failure is diagnostic-only internal detail.
    ///
    /// Internal diagnostics are suppressed outside development deployments.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::ResourceNotFound(error.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(error.to_string()),
            _ => Self::Internal(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
