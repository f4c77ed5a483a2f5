// crates/repo-gate-core/src/auth.rs
// ============================================================================
// Module: Authorization
// Description: Bearer token validation and tenant-scoped capability context.
// Purpose: Provide fail-closed tenant isolation for tool invocations.
// Dependencies: jsonwebtoken, serde, serde_json
// ============================================================================

//! ## Overview
//! Token validation verifies an HS256 signature and expiry, then normalizes
//! the payload from one of two accepted claim shapes (modern and legacy)
//! into [`TokenClaims`]. [`TenantContext`] is the authorization chokepoint:
//! its only public constructor enforces tenant membership, so an instance
//! can never exist in an unauthorized state — fail-closed by construction,
//! not by convention.
//! Security posture: tokens and headers are untrusted input; an empty
//! allowed-tenant list is treated as a misconfiguration, never as "nothing
//! is forbidden".

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use jsonwebtoken::errors::ErrorKind;
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Role name granting administrative predicates.
pub const ROLE_ADMIN: &str = "admin";
/// Role name granting cross-tenant administrative predicates.
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

// ============================================================================
// SECTION: Token Claims
// ============================================================================

/// Normalized identity claims produced only by successful validation.
///
/// # Invariants
/// - Produced exclusively by [`validate_token`]; both accepted wire shapes
///   normalize into this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Stable user identifier.
    pub user_id: String,
    /// User email, empty when the legacy shape omitted it.
    pub email: String,
    /// Tenant identifier, empty when the legacy shape omitted it.
    pub tenant_id: String,
    /// Role name, empty when the legacy shape omitted it.
    pub role: String,
    /// Issued-at time in Unix seconds.
    pub issued_at: u64,
    /// Expiry time in Unix seconds.
    pub expires_at: u64,
}

/// Modern claim shape: all identity fields present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModernClaims {
    /// Stable user identifier.
    user_id: String,
    /// User email address.
    email: String,
    /// Tenant identifier.
    tenant_id: String,
    /// Role name.
    role: String,
    /// Issued-at time in Unix seconds.
    iat: u64,
    /// Expiry time in Unix seconds.
    exp: u64,
}

/// Legacy claim shape: `id` instead of `userId`, optional identity fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyClaims {
    /// Legacy user identifier, remapped to `user_id`.
    id: String,
    /// Optional email address.
    #[serde(default)]
    email: Option<String>,
    /// Optional tenant identifier.
    #[serde(default)]
    tenant_id: Option<String>,
    /// Optional role name.
    #[serde(default)]
    role: Option<String>,
    /// Issued-at time in Unix seconds.
    iat: u64,
    /// Expiry time in Unix seconds.
    exp: u64,
}

impl From<ModernClaims> for TokenClaims {
    fn from(claims: ModernClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            tenant_id: claims.tenant_id,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

impl From<LegacyClaims> for TokenClaims {
    fn from(claims: LegacyClaims) -> Self {
        Self {
            user_id: claims.id,
            email: claims.email.unwrap_or_default(),
            tenant_id: claims.tenant_id.unwrap_or_default(),
            role: claims.role.unwrap_or_default(),
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

// ============================================================================
// SECTION: Token Validation
// ============================================================================

/// Verifies a bearer token and normalizes its claims.
///
/// Signature and expiry are verified first; only then is the payload parsed
/// under the modern shape, falling back to the legacy shape. A payload that
/// matches neither shape is rejected with both parse failures aggregated —
/// a partially-valid result is never silently picked.
///
/// # Errors
///
/// Returns [`GatewayError::AuthExpired`] for expired tokens,
/// [`GatewayError::AuthInvalid`] for any other verification failure, and
/// [`GatewayError::Validation`] when the payload matches neither shape.
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, GatewayError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    let decoded = jsonwebtoken::decode::<Value>(token, &key, &validation).map_err(|err| {
        match err.kind() {
            ErrorKind::ExpiredSignature => {
                GatewayError::AuthExpired("token has expired".to_string())
            }
            _ => GatewayError::AuthInvalid("token verification failed".to_string()),
        }
    })?;
    parse_claims(decoded.claims)
}

/// Parses a verified payload under the modern shape, then the legacy shape.
fn parse_claims(payload: Value) -> Result<TokenClaims, GatewayError> {
    let modern_err = match serde_json::from_value::<ModernClaims>(payload.clone()) {
        Ok(claims) => return Ok(claims.into()),
        Err(err) => err,
    };
    let legacy_err = match serde_json::from_value::<LegacyClaims>(payload) {
        Ok(claims) => return Ok(claims.into()),
        Err(err) => err,
    };
    Err(GatewayError::Validation(format!(
        "token claims match neither accepted shape (modern: {modern_err}; legacy: {legacy_err})"
    )))
}

/// Extracts the token from an `Authorization` header value.
///
/// The header must split into exactly two whitespace-separated parts with a
/// case-insensitive `Bearer` scheme.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidInput`] for any other header shape.
pub fn extract_bearer_token(header: &str) -> Result<&str, GatewayError> {
    let mut parts = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GatewayError::InvalidInput(
            "authorization header must be `Bearer <token>`".to_string(),
        ));
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GatewayError::InvalidInput(
            "authorization scheme must be Bearer".to_string(),
        ));
    }
    Ok(token)
}

// ============================================================================
// SECTION: Tenant Context
// ============================================================================

/// Tenant scoping filter for downstream data queries.
///
/// # Invariants
/// - Obtainable only from an authorized [`TenantContext`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantFilter {
    /// Tenant identifier every downstream query must be scoped to.
    pub tenant_id: String,
}

/// Immutable tenant/role capability context.
///
/// # Invariants
/// - [`TenantContext::from_service_account`] is the only public constructor
///   and enforces tenant membership before returning; no value with an
///   unauthorized tenant can exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// Authorized tenant identifier.
    tenant_id: String,
    /// Authenticated user identifier.
    user_id: String,
    /// Role name carried by the credential.
    role: String,
}

impl TenantContext {
    /// Builds a tenant context from validated claims, enforcing access.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when the allowed-tenant list
    /// is empty and [`GatewayError::TenantUnauthorized`] when the claimed
    /// tenant is not in the list.
    pub fn from_service_account(
        claims: &TokenClaims,
        allowed_tenants: &[String],
    ) -> Result<Self, GatewayError> {
        let context = Self {
            tenant_id: claims.tenant_id.clone(),
            user_id: claims.user_id.clone(),
            role: claims.role.clone(),
        };
        context.enforce_access(allowed_tenants)?;
        Ok(context)
    }

    /// Tests membership of this context's tenant in an allowed list.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when the list is empty; an
    /// empty allowlist is a misconfiguration, not "nothing is forbidden".
    pub fn validate_access(&self, allowed_tenants: &[String]) -> Result<bool, GatewayError> {
        if allowed_tenants.is_empty() {
            return Err(GatewayError::Configuration(
                "allowed-tenant list must not be empty".to_string(),
            ));
        }
        Ok(allowed_tenants.iter().any(|tenant| tenant == &self.tenant_id))
    }

    /// Enforces membership of this context's tenant in an allowed list.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TenantUnauthorized`] when membership fails
    /// and propagates [`GatewayError::Configuration`] for empty lists.
    pub fn enforce_access(&self, allowed_tenants: &[String]) -> Result<(), GatewayError> {
        if self.validate_access(allowed_tenants)? {
            return Ok(());
        }
        Err(GatewayError::TenantUnauthorized(format!(
            "tenant `{}` is not authorized",
            self.tenant_id
        )))
    }

    /// Returns the single sanctioned downstream scoping filter.
    #[must_use]
    pub fn tenant_filter(&self) -> TenantFilter {
        TenantFilter {
            tenant_id: self.tenant_id.clone(),
        }
    }

    /// Returns the authorized tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Returns the authenticated user identifier.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the role carried by the credential.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns true when the context carries exactly the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Returns true when the context carries any of the given roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.role == *role)
    }

    /// Returns true for administrative roles, super admin included.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_any_role(&[ROLE_ADMIN, ROLE_SUPER_ADMIN])
    }

    /// Returns true for the cross-tenant super admin role only.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
