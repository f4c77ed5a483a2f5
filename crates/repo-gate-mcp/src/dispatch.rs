// crates/repo-gate-mcp/src/dispatch.rs
// ============================================================================
// Module: Tool Dispatcher
// Description: Exact-name tool dispatch behind the auth gate and the guards.
// Purpose: Route every call through validation and the result envelope.
// Dependencies: repo-gate-config, repo-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The dispatcher maps a tool name to its handler. Every call is authorized
//! first (when tenant auth is configured), then the handler parses its own
//! arguments and composes the path/command guards before any I/O. Whatever
//! happens, the caller receives exactly one envelope shape; no error escapes
//! the dispatch boundary as a bare failure.
//! Security posture: internal diagnostics are suppressed outside development
//! deployments; structured caller-correctable errors pass through intact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use repo_gate_config::GatewayConfig;
use repo_gate_config::TenantAuthSettings;
use repo_gate_core::CommandGuard;
use repo_gate_core::ErrorCode;
use repo_gate_core::GatewayError;
use repo_gate_core::PathGuard;
use repo_gate_core::TenantContext;
use repo_gate_core::ToolResponse;
use repo_gate_core::extract_bearer_token;
use repo_gate_core::validate_token;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::audit::AuditSink;
use crate::audit::DispatchAuditEvent;
use crate::audit::DispatchOutcome;
use crate::fs_tools;
use crate::proc_tools;
use crate::tools::ToolDefinition;
use crate::tools::ToolName;
use crate::tools::tool_definitions;

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Stateless tool dispatcher over the immutable gateway configuration.
///
/// # Invariants
/// - No mutable state beyond the audit sink; safe to share across concurrent
///   in-flight requests.
/// - When tenant auth is configured, no handler runs without a validated
///   [`TenantContext`].
pub struct ToolDispatcher {
    /// Path confinement guard bound to the repository root.
    path_guard: PathGuard,
    /// Command allowlist guard.
    command_guard: CommandGuard,
    /// Max readable file size in bytes.
    max_file_size_bytes: u64,
    /// Max glob-search result count.
    max_search_results: usize,
    /// Whether internal diagnostics are disclosed.
    development_mode: bool,
    /// Tenant-aware authorization settings, when configured.
    tenant_auth: Option<TenantAuthSettings>,
    /// Audit sink for dispatch outcomes.
    audit: Arc<dyn AuditSink>,
}

impl ToolDispatcher {
    /// Builds a dispatcher from the loaded gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when the repository root is
    /// invalid.
    pub fn from_config(
        config: &GatewayConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            path_guard: PathGuard::new(&config.repo_root)?,
            command_guard: CommandGuard::new(config.allowed_commands.clone()),
            max_file_size_bytes: config.max_file_size_bytes,
            max_search_results: config.max_search_results,
            development_mode: config.deployment_mode.is_development(),
            tenant_auth: config.tenant_auth.clone(),
            audit,
        })
    }

    /// Returns the definitions of every exposed tool.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Dispatches a tool call and always returns an envelope.
    ///
    /// Authorization runs first when tenant auth is configured; the handler
    /// only runs behind a validated [`TenantContext`]. Every outcome is
    /// audited with the server correlation identifier.
    pub async fn dispatch(
        &self,
        correlation_id: &str,
        auth_header: Option<&str>,
        name: &str,
        arguments: Value,
    ) -> ToolResponse {
        let started = Instant::now();
        let (tenant_id, result) = match self.authorize(auth_header) {
            Ok(context) => {
                let tenant_id = context.map(|ctx| ctx.tenant_id().to_string());
                (tenant_id, self.run_tool(name, arguments).await)
            }
            Err(err) => (None, Err(err)),
        };
        let elapsed = started.elapsed();
        let processing_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let (response, outcome, error_code) = match result {
            Ok(data) => (ToolResponse::success_timed(data, elapsed), DispatchOutcome::Ok, None),
            Err(err) => {
                let code = err.code();
                (
                    ToolResponse::failure(&err, self.development_mode),
                    outcome_for(code),
                    Some(code),
                )
            }
        };
        self.audit.record(&DispatchAuditEvent::new(
            correlation_id.to_string(),
            name.to_string(),
            outcome,
            error_code,
            tenant_id,
            processing_time_ms,
        ));
        response
    }

    /// Validates the bearer credential when tenant auth is configured.
    fn authorize(&self, header: Option<&str>) -> Result<Option<TenantContext>, GatewayError> {
        let Some(auth) = &self.tenant_auth else {
            return Ok(None);
        };
        let header = header.ok_or_else(|| {
            GatewayError::AuthRequired("authorization header is required".to_string())
        })?;
        let token = extract_bearer_token(header)?;
        let claims = validate_token(token, &auth.token_secret)?;
        let context = TenantContext::from_service_account(&claims, &auth.allowed_tenants)?;
        Ok(Some(context))
    }

    /// Runs the named handler; exact name match only.
    async fn run_tool(&self, name: &str, arguments: Value) -> Result<Value, GatewayError> {
        let Some(tool) = ToolName::parse(name) else {
            return Err(GatewayError::OperationFailed(format!("unknown tool `{name}`")));
        };
        match tool {
            ToolName::ReadFile => {
                fs_tools::read_file(
                    &self.path_guard,
                    self.max_file_size_bytes,
                    parse_args(arguments)?,
                )
                .await
            }
            ToolName::ListDirectory => {
                fs_tools::list_directory(&self.path_guard, parse_args(arguments)?).await
            }
            ToolName::GlobSearch => {
                fs_tools::glob_search(&self.path_guard, self.max_search_results, parse_args(arguments)?)
                    .await
            }
            ToolName::ApplyPatch => {
                fs_tools::apply_patch(&self.path_guard, parse_args(arguments)?).await
            }
            ToolName::GitStatus => {
                proc_tools::git_status(self.path_guard.root(), parse_args(arguments)?).await
            }
            ToolName::GitDiff => {
                proc_tools::git_diff(&self.path_guard, parse_args(arguments)?).await
            }
            ToolName::RunCommand => {
                proc_tools::run_command(&self.command_guard, &self.path_guard, parse_args(arguments)?)
                    .await
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses tool arguments, mapping absent fields to `MISSING_PARAMETER`.
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, GatewayError> {
    serde_json::from_value(arguments).map_err(|err| {
        let message = err.to_string();
        if message.contains("missing field") {
            GatewayError::MissingParameter(message)
        } else {
            GatewayError::Validation(message)
        }
    })
}

/// Classifies an error code as a security denial or a plain failure.
const fn outcome_for(code: ErrorCode) -> DispatchOutcome {
    match code {
        ErrorCode::AuthRequired
        | ErrorCode::AuthInvalid
        | ErrorCode::AuthExpired
        | ErrorCode::TenantUnauthorized
        | ErrorCode::PermissionDenied
        | ErrorCode::PathTraversal
        | ErrorCode::CommandNotAllowed => DispatchOutcome::Denied,
        _ => DispatchOutcome::Error,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
