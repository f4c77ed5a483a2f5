// crates/repo-gate-config/src/lib.rs
// ============================================================================
// Module: Gateway Configuration
// Description: Environment-driven configuration model and validation.
// Purpose: Load the gateway configuration once and expose it read-only.
// Dependencies: repo-gate-core, thiserror
// ============================================================================

//! ## Overview
//! Configuration is read from `REPO_GATE_*` environment variables, validated
//! at load, and cached behind a process-wide [`std::sync::OnceLock`]. After
//! initialization it is read-only for the remainder of the process lifetime;
//! there is no teardown path.
//!
//! ## Invariants
//! - The repository root is absolute, validated at load.
//! - Tenant-aware settings are all-or-nothing: a token secret without an
//!   allowed-tenant list (or the reverse) is a configuration error.
//! - Initialization happens at most once; later calls observe the same
//!   immutable value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::OnceLock;

use repo_gate_core::AllowedCommandSet;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required repository root variable.
pub const ENV_ROOT: &str = "REPO_GATE_ROOT";
/// Optional comma-separated command allowlist override.
pub const ENV_ALLOWED_COMMANDS: &str = "REPO_GATE_ALLOWED_COMMANDS";
/// Optional max readable file size in bytes.
pub const ENV_MAX_FILE_SIZE: &str = "REPO_GATE_MAX_FILE_SIZE";
/// Optional max glob-search result count.
pub const ENV_MAX_SEARCH_RESULTS: &str = "REPO_GATE_MAX_SEARCH_RESULTS";
/// Optional log level filter.
pub const ENV_LOG_LEVEL: &str = "REPO_GATE_LOG_LEVEL";
/// Optional log file path; stderr when unset.
pub const ENV_LOG_FILE: &str = "REPO_GATE_LOG_FILE";
/// Optional deployment mode (`development` or `production`).
pub const ENV_MODE: &str = "REPO_GATE_MODE";
/// Optional comma-separated allowed-tenant list.
pub const ENV_ALLOWED_TENANTS: &str = "REPO_GATE_ALLOWED_TENANTS";
/// Optional token-verification secret.
pub const ENV_TOKEN_SECRET: &str = "REPO_GATE_TOKEN_SECRET";

/// Default max readable file size (1 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;
/// Default max glob-search result count.
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 100;
/// Default log level filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Process-wide configuration cell, initialized at most once.
static CONFIG: OnceLock<GatewayConfig> = OnceLock::new();

// ============================================================================
// SECTION: Types
// ============================================================================

/// Deployment mode controlling diagnostic detail disclosure.
///
/// # Invariants
/// - Defaults to [`DeploymentMode::Production`]; detail disclosure is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Development deployment; internal diagnostics are disclosed.
    Development,
    /// Production deployment; internal diagnostics are suppressed.
    #[default]
    Production,
}

impl DeploymentMode {
    /// Returns true for development deployments.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Tenant-aware authorization settings.
///
/// # Invariants
/// - Present only when both the secret and the tenant list are configured.
#[derive(Debug, Clone)]
pub struct TenantAuthSettings {
    /// Token-verification secret.
    pub token_secret: String,
    /// Allowed tenant identifiers.
    pub allowed_tenants: Vec<String>,
}

/// Immutable gateway configuration.
///
/// # Invariants
/// - `repo_root` is absolute.
/// - Never mutated after load; cached process-wide without teardown.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Absolute repository root every path is confined to.
    pub repo_root: PathBuf,
    /// Active command allowlist.
    pub allowed_commands: AllowedCommandSet,
    /// Max readable file size in bytes.
    pub max_file_size_bytes: u64,
    /// Max glob-search result count.
    pub max_search_results: usize,
    /// Log level filter directive.
    pub log_level: String,
    /// Log file path; stderr when unset.
    pub log_file: Option<PathBuf>,
    /// Deployment mode.
    pub deployment_mode: DeploymentMode,
    /// Tenant-aware authorization settings, when configured.
    pub tenant_auth: Option<TenantAuthSettings>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration load and initialization failures.
///
/// # Invariants
/// - Variants are stable for startup diagnostics.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is missing.
    #[error("missing required variable `{0}`")]
    MissingVar(&'static str),
    /// A variable value failed to parse or validate.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// The process configuration was already initialized.
    #[error("configuration already initialized")]
    AlreadyInitialized,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl GatewayConfig {
    /// Loads and validates configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or any
    /// value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads and validates configuration from an arbitrary lookup.
    ///
    /// Exists so tests can exercise loading without mutating process-global
    /// environment state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or any
    /// value fails validation.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let root = lookup(ENV_ROOT).ok_or(ConfigError::MissingVar(ENV_ROOT))?;
        let repo_root = PathBuf::from(root.trim());
        if !repo_root.is_absolute() {
            return Err(ConfigError::InvalidVar {
                name: ENV_ROOT,
                reason: "repository root must be an absolute path".to_string(),
            });
        }

        let allowed_commands = lookup(ENV_ALLOWED_COMMANDS)
            .map_or_else(AllowedCommandSet::builtin, |raw| AllowedCommandSet::from_csv(&raw));
        if allowed_commands.entries().is_empty() {
            return Err(ConfigError::InvalidVar {
                name: ENV_ALLOWED_COMMANDS,
                reason: "allowlist override must contain at least one command".to_string(),
            });
        }

        let max_file_size_bytes =
            parse_or_default(&lookup, ENV_MAX_FILE_SIZE, DEFAULT_MAX_FILE_SIZE_BYTES)?;
        let max_search_results =
            parse_or_default(&lookup, ENV_MAX_SEARCH_RESULTS, DEFAULT_MAX_SEARCH_RESULTS)?;

        let log_level =
            lookup(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let log_file = lookup(ENV_LOG_FILE).map(PathBuf::from);
        let deployment_mode = parse_mode(lookup(ENV_MODE).as_deref())?;
        let tenant_auth = parse_tenant_auth(
            lookup(ENV_TOKEN_SECRET),
            lookup(ENV_ALLOWED_TENANTS),
        )?;

        Ok(Self {
            repo_root,
            allowed_commands,
            max_file_size_bytes,
            max_search_results,
            log_level,
            log_file,
            deployment_mode,
            tenant_auth,
        })
    }

    /// Installs this configuration as the process-wide singleton.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyInitialized`] when called twice.
    pub fn init(self) -> Result<&'static Self, ConfigError> {
        CONFIG.set(self).map_err(|_| ConfigError::AlreadyInitialized)?;
        CONFIG.get().ok_or(ConfigError::AlreadyInitialized)
    }

    /// Returns the installed process-wide configuration, when initialized.
    #[must_use]
    pub fn get() -> Option<&'static Self> {
        CONFIG.get()
    }
}

// ============================================================================
// SECTION: Parse Helpers
// ============================================================================

/// Parses an optional numeric variable, falling back to a default.
fn parse_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        reason: format!("expected a non-negative integer, got `{}`", raw.trim()),
    })
}

/// Parses the deployment mode variable.
fn parse_mode(raw: Option<&str>) -> Result<DeploymentMode, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DeploymentMode::default()),
        Some(value) if value.eq_ignore_ascii_case("development") => {
            Ok(DeploymentMode::Development)
        }
        Some(value) if value.eq_ignore_ascii_case("production") => Ok(DeploymentMode::Production),
        Some(value) => Err(ConfigError::InvalidVar {
            name: ENV_MODE,
            reason: format!("expected `development` or `production`, got `{value}`"),
        }),
    }
}

/// Parses the tenant-aware settings pair, all-or-nothing.
fn parse_tenant_auth(
    secret: Option<String>,
    tenants: Option<String>,
) -> Result<Option<TenantAuthSettings>, ConfigError> {
    let tenants = tenants.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|tenant| !tenant.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    });
    match (secret, tenants) {
        (None, None) => Ok(None),
        (Some(secret), Some(allowed_tenants)) => {
            if secret.trim().is_empty() {
                return Err(ConfigError::InvalidVar {
                    name: ENV_TOKEN_SECRET,
                    reason: "token secret must not be empty".to_string(),
                });
            }
            if allowed_tenants.is_empty() {
                return Err(ConfigError::InvalidVar {
                    name: ENV_ALLOWED_TENANTS,
                    reason: "allowed-tenant list must not be empty".to_string(),
                });
            }
            Ok(Some(TenantAuthSettings {
                token_secret: secret,
                allowed_tenants,
            }))
        }
        (Some(_), None) => Err(ConfigError::InvalidVar {
            name: ENV_ALLOWED_TENANTS,
            reason: "token secret configured without an allowed-tenant list".to_string(),
        }),
        (None, Some(_)) => Err(ConfigError::InvalidVar {
            name: ENV_TOKEN_SECRET,
            reason: "allowed-tenant list configured without a token secret".to_string(),
        }),
    }
}
