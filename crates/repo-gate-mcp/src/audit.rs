// crates/repo-gate-mcp/src/audit.rs
// ============================================================================
// Module: Audit Logging
// Description: Structured audit events for tool dispatch outcomes.
// Purpose: Record security decisions without coupling to a log pipeline.
// Dependencies: repo-gate-core, serde, tracing
// ============================================================================

//! ## Overview
//! Audit event payloads and sinks for tool dispatch. The sink trait is
//! intentionally small so deployments can route events to their preferred
//! pipeline; the default routes through `tracing`, which the binary wires to
//! stderr or a log file.
//! Security posture: events carry identifiers and outcomes only, never file
//! contents, command output, or credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use repo_gate_core::ErrorCode;
use repo_gate_core::envelope::unix_timestamp_ms;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome classification for a dispatched tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Handler completed and returned a success envelope.
    Ok,
    /// A guard or the authorization layer rejected the call.
    Denied,
    /// The handler or a collaborator failed.
    Error,
}

/// Audit event emitted once per dispatched tool call.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u64,
    /// Server correlation identifier for the request.
    pub correlation_id: String,
    /// Tool name as requested by the caller.
    pub tool: String,
    /// Dispatch outcome.
    pub outcome: DispatchOutcome,
    /// Envelope error code for denied and failed calls.
    pub error_code: Option<&'static str>,
    /// Authorized tenant, when tenant auth is active.
    pub tenant_id: Option<String>,
    /// Handler processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl DispatchAuditEvent {
    /// Creates a dispatch audit event with a consistent timestamp.
    #[must_use]
    pub fn new(
        correlation_id: String,
        tool: String,
        outcome: DispatchOutcome,
        error_code: Option<ErrorCode>,
        tenant_id: Option<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            event: "tool_dispatch",
            timestamp_ms: unix_timestamp_ms(),
            correlation_id,
            tool,
            outcome,
            error_code: error_code.map(ErrorCode::as_str),
            tenant_id,
            processing_time_ms,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for dispatch events.
pub trait AuditSink: Send + Sync {
    /// Records a dispatch audit event.
    fn record(&self, event: &DispatchAuditEvent);
}

/// Audit sink routing events through `tracing`.
///
/// Denials and errors are logged at warn so a default `info` filter still
/// surfaces every security decision.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &DispatchAuditEvent) {
        match event.outcome {
            DispatchOutcome::Ok => tracing::info!(
                correlation_id = %event.correlation_id,
                tool = %event.tool,
                tenant_id = event.tenant_id.as_deref(),
                processing_time_ms = event.processing_time_ms,
                "tool dispatch ok"
            ),
            DispatchOutcome::Denied | DispatchOutcome::Error => tracing::warn!(
                correlation_id = %event.correlation_id,
                tool = %event.tool,
                error_code = event.error_code,
                tenant_id = event.tenant_id.as_deref(),
                processing_time_ms = event.processing_time_ms,
                "tool dispatch rejected"
            ),
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &DispatchAuditEvent) {}
}
