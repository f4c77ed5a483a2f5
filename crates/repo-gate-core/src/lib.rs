// crates/repo-gate-core/src/lib.rs
// ============================================================================
// Module: Repo Gate Core
// Description: Security and authorization kernel for the tool gateway.
// Purpose: Path confinement, command allowlisting, auth, and the envelope.
// Dependencies: jsonwebtoken, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core security kernel for Repo Gate: every tool handler composes the path
//! and command guards before touching any external collaborator, tenant
//! isolation is enforced at [`auth::TenantContext`] construction, and every
//! outcome flows through the two-shape [`envelope::ToolResponse`].
//!
//! ## Layer Responsibilities
//! - Confine caller-supplied paths to the repository root ([`path_guard`]).
//! - Deny commands outside the allowlist ([`command_guard`]).
//! - Validate credentials and scope tenants ([`auth`]).
//! - Carry every outcome in the uniform envelope ([`envelope`], [`error`]).
//!
//! ## Invariants
//! - Guards fail closed with structured, fixed-code errors.
//! - Validated values are per-call and never cached across calls.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod command_guard;
pub mod envelope;
pub mod error;
pub mod path_guard;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::TenantContext;
pub use auth::TokenClaims;
pub use auth::extract_bearer_token;
pub use auth::validate_token;
pub use command_guard::AllowedCommandSet;
pub use command_guard::CommandGuard;
pub use command_guard::DEFAULT_ALLOWED_COMMANDS;
pub use command_guard::is_command_safe;
pub use envelope::ToolResponse;
pub use error::ErrorCode;
pub use error::GatewayError;
pub use path_guard::PathGuard;
pub use path_guard::SENSITIVE_PATTERNS;
pub use path_guard::ValidatedPath;
