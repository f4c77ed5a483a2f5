// crates/repo-gate-core/src/envelope.rs
// ============================================================================
// Module: Result Envelope
// Description: Two-shape success/error response contract for every handler.
// Purpose: Guarantee callers always receive exactly one envelope shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every tool outcome is converted at the dispatch boundary into exactly one
//! of two shapes: a success envelope carrying data plus metadata, or an error
//! envelope carrying a fixed-code error body. The enum representation makes
//! "both" and "neither" unrepresentable.
//! Security posture: internal diagnostic detail is attached only in
//! development deployments, never in production.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde_json::Value;

use crate::error::ErrorCode;
use crate::error::GatewayError;

// ============================================================================
// SECTION: Envelope Types
// ============================================================================

/// Uniform response envelope returned by every tool handler.
///
/// # Invariants
/// - A response is exactly one of the two shapes, never both, never neither.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    /// Successful outcome with data and metadata.
    Success(SuccessEnvelope),
    /// Failed outcome with a fixed-code error body.
    Error(ErrorEnvelope),
}

/// Success envelope shape.
///
/// # Invariants
/// - `success` is always `true` for this shape.
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope {
    /// Discriminator, always `true`.
    pub success: bool,
    /// Handler result payload.
    pub data: Value,
    /// Response metadata.
    pub metadata: ResponseMetadata,
}

/// Error envelope shape.
///
/// # Invariants
/// - `success` is always `false` for this shape.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    /// Discriminator, always `false`.
    pub success: bool,
    /// Structured error body.
    pub error: ErrorBody,
}

/// Metadata attached to successful responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Unix timestamp in milliseconds when the response was produced.
    pub timestamp: u64,
    /// Handler processing time in milliseconds, when measured.
    ///
    /// Serialized as `processingTime`; the field name keeps the unit suffix
    /// internally.
    #[serde(rename = "processingTime", skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

/// Structured error body carried by error envelopes.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Fixed error code.
    pub code: ErrorCode,
    /// Human-readable failure description.
    pub message: String,
    /// Caller-correctable detail payload, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Unix timestamp in milliseconds when the error was produced.
    pub timestamp: u64,
}

// ============================================================================
// SECTION: Construction
// ============================================================================

impl ToolResponse {
    /// Builds a success envelope around the handler payload.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self::Success(SuccessEnvelope {
            success: true,
            data,
            metadata: ResponseMetadata {
                timestamp: unix_timestamp_ms(),
                processing_time_ms: None,
            },
        })
    }

    /// Builds a success envelope with a measured processing time.
    #[must_use]
    pub fn success_timed(data: Value, elapsed: Duration) -> Self {
        Self::Success(SuccessEnvelope {
            success: true,
            data,
            metadata: ResponseMetadata {
                timestamp: unix_timestamp_ms(),
                processing_time_ms: Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
            },
        })
    }

    /// Builds an error envelope from a structured gateway error.
    ///
    /// Internal diagnostic messages are replaced with a generic description
    /// unless `development_mode` is set. Structured caller-correctable
    /// details always pass through with their code intact.
    #[must_use]
    pub fn failure(error: &GatewayError, development_mode: bool) -> Self {
        let message = if error.is_internal() && !development_mode {
            "an internal error occurred".to_string()
        } else {
            error.to_string()
        };
        Self::Error(ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: error.code(),
                message,
                details: error.details().cloned(),
                timestamp: unix_timestamp_ms(),
            },
        })
    }

    /// Returns true when this response is the success shape.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the error code for error-shape responses.
    #[must_use]
    pub const fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success(_) => None,
            Self::Error(envelope) => Some(envelope.error.code),
        }
    }
}

// ============================================================================
// SECTION: Time Helpers
// ============================================================================

/// Returns the current Unix timestamp in milliseconds.
///
/// Clock failure (a pre-epoch system clock) degrades to zero rather than
/// panicking; envelope timestamps are informational, not security-bearing.
#[must_use]
pub fn unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
