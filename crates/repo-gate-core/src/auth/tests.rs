// crates/repo-gate-core/src/auth/tests.rs
// ============================================================================
// Module: Authorization Tests
// Description: Unit tests for token validation and tenant context.
// Purpose: Prove fail-closed behavior for signatures, shapes, and tenancy.
// Dependencies: jsonwebtoken, repo-gate-core
// ============================================================================

//! ## Overview
//! Validates signature/expiry rejection, dual claim-shape normalization,
//! bearer header extraction, and the constructor-enforced tenant boundary.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonwebtoken::Algorithm;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use serde_json::Value;
use serde_json::json;

use super::ROLE_ADMIN;
use super::TenantContext;
use super::TokenClaims;
use super::extract_bearer_token;
use super::validate_token;
use crate::error::ErrorCode;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Shared signing secret for test tokens.
const SECRET: &str = "test-secret";

/// Signs a claim payload with the given secret.
fn sign(claims: &Value, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token signing")
}

/// Returns a Unix-seconds timestamp offset from now.
fn now_plus(seconds: i64) -> u64 {
    let now = i64::try_from(crate::envelope::unix_timestamp_ms() / 1000).expect("timestamp fits");
    u64::try_from(now + seconds).expect("offset timestamp fits")
}

/// Builds a modern-shape claim payload for `tenant-a`.
fn modern_claims() -> Value {
    json!({
        "userId": "user-1",
        "email": "user@example.com",
        "tenantId": "tenant-a",
        "role": "admin",
        "iat": now_plus(-60),
        "exp": now_plus(3600),
    })
}

/// Builds validated claims without going through a token, for context tests.
fn claims_for_tenant(tenant_id: &str) -> TokenClaims {
    TokenClaims {
        user_id: "user-1".to_string(),
        email: "user@example.com".to_string(),
        tenant_id: tenant_id.to_string(),
        role: ROLE_ADMIN.to_string(),
        issued_at: now_plus(-60),
        expires_at: now_plus(3600),
    }
}

/// Convenience allowed-tenant list.
fn allowed(tenants: &[&str]) -> Vec<String> {
    tenants.iter().map(|tenant| (*tenant).to_string()).collect()
}

// ============================================================================
// SECTION: Token Validation Tests
// ============================================================================

#[test]
fn valid_modern_token_normalizes_claims() {
    let token = sign(&modern_claims(), SECRET);
    let claims = validate_token(&token, SECRET).expect("valid token");
    assert_eq!(claims.user_id, "user-1");
    assert_eq!(claims.tenant_id, "tenant-a");
    assert_eq!(claims.role, "admin");
}

#[test]
fn legacy_shape_remaps_id_and_defaults_optionals() {
    let token = sign(
        &json!({
            "id": "legacy-7",
            "iat": now_plus(-60),
            "exp": now_plus(3600),
        }),
        SECRET,
    );
    let claims = validate_token(&token, SECRET).expect("legacy token");
    assert_eq!(claims.user_id, "legacy-7");
    assert_eq!(claims.email, "");
    assert_eq!(claims.tenant_id, "");
    assert_eq!(claims.role, "");
}

#[test]
fn wrong_secret_is_always_rejected() {
    let token = sign(&modern_claims(), "other-secret");
    let err = validate_token(&token, SECRET).expect_err("wrong secret");
    assert_eq!(err.code(), ErrorCode::AuthInvalid);
}

#[test]
fn expired_token_is_distinguished_from_invalid() {
    let mut claims = modern_claims();
    claims["exp"] = json!(now_plus(-7200));
    let token = sign(&claims, SECRET);
    let err = validate_token(&token, SECRET).expect_err("expired token");
    assert_eq!(err.code(), ErrorCode::AuthExpired);
}

#[test]
fn garbage_token_is_invalid() {
    let err = validate_token("not-a-token", SECRET).expect_err("garbage token");
    assert_eq!(err.code(), ErrorCode::AuthInvalid);
}

#[test]
fn unrecognized_shape_aggregates_both_parse_errors() {
    let token = sign(
        &json!({
            "subject": "nobody",
            "iat": now_plus(-60),
            "exp": now_plus(3600),
        }),
        SECRET,
    );
    let err = validate_token(&token, SECRET).expect_err("shape mismatch");
    assert_eq!(err.code(), ErrorCode::ValidationError);
    let message = err.to_string();
    assert!(message.contains("modern:"));
    assert!(message.contains("legacy:"));
}

// ============================================================================
// SECTION: Header Extraction Tests
// ============================================================================

#[test]
fn bearer_header_extracts_token() {
    assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    assert_eq!(extract_bearer_token("bearer abc").unwrap(), "abc");
}

#[test]
fn malformed_headers_are_rejected() {
    assert!(extract_bearer_token("Bearer").is_err());
    assert!(extract_bearer_token("Bearer a b").is_err());
    assert!(extract_bearer_token("Basic abc").is_err());
    assert!(extract_bearer_token("").is_err());
}

// ============================================================================
// SECTION: Tenant Context Tests
// ============================================================================

#[test]
fn authorized_tenant_constructs_context() {
    let claims = claims_for_tenant("tenant-a");
    let context = TenantContext::from_service_account(&claims, &allowed(&["tenant-a", "tenant-b"]))
        .expect("authorized tenant");
    assert_eq!(context.tenant_id(), "tenant-a");
    assert_eq!(context.tenant_filter().tenant_id, "tenant-a");
}

#[test]
fn unauthorized_tenant_never_yields_a_context() {
    let claims = claims_for_tenant("tenant-evil");
    let err = TenantContext::from_service_account(&claims, &allowed(&["tenant-a"]))
        .expect_err("unauthorized tenant");
    assert_eq!(err.code(), ErrorCode::TenantUnauthorized);
}

#[test]
fn empty_allowlist_is_a_misconfiguration() {
    let claims = claims_for_tenant("tenant-a");
    let err = TenantContext::from_service_account(&claims, &[]).expect_err("empty allowlist");
    assert_eq!(err.code(), ErrorCode::ConfigurationError);
}

#[test]
fn role_predicates_match_fixed_constants() {
    let claims = claims_for_tenant("tenant-a");
    let context =
        TenantContext::from_service_account(&claims, &allowed(&["tenant-a"])).expect("context");
    assert!(context.has_role(ROLE_ADMIN));
    assert!(context.is_admin());
    assert!(!context.is_super_admin());
    assert!(context.has_any_role(&["viewer", ROLE_ADMIN]));
    assert!(!context.has_any_role(&["viewer", "editor"]));
}
