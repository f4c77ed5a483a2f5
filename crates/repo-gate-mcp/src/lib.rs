// crates/repo-gate-mcp/src/lib.rs
// ============================================================================
// Module: Repo Gate MCP
// Description: Tool surface, dispatcher, and stdio server for the gateway.
// Purpose: Expose the seven guarded repository tools over JSON-RPC.
// Dependencies: repo-gate-config, repo-gate-core, tokio
// ============================================================================

//! ## Overview
//! The MCP crate wires the security kernel to a tool surface: argument
//! shapes and listing metadata ([`tools`]), guarded filesystem and process
//! handlers ([`fs_tools`], [`proc_tools`]), the dispatch boundary that turns
//! every outcome into an envelope ([`dispatch`]), audit sinks ([`audit`]),
//! and the framed stdio JSON-RPC server ([`server`]).
//! Security posture: all request input is untrusted; handlers never touch a
//! collaborator before the guards pass.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod dispatch;
pub mod fs_tools;
pub mod proc_tools;
pub mod server;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use audit::TracingAuditSink;
pub use dispatch::ToolDispatcher;
pub use server::GatewayServer;
pub use server::ServerError;
pub use tools::ToolDefinition;
pub use tools::ToolName;
