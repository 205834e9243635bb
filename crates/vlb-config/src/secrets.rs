//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"VLB_GITHUB_TOKEN"`).
//! - At startup, callers invoke [`resolve_secrets`] once and pass the
//!   returned [`ResolvedSecrets`] into constructors.
//! - `Debug` output redacts values.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! # Role-aware enforcement
//! - `Reconciler`: document store token is **required**; the stats-provider
//!   key is required only when `/source/transport` is `direct`.
//! - `Proxy`: stats-provider key is **required**; the store token is optional.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::ConfigRole;

pub const DEFAULT_STORE_TOKEN_ENV: &str = "VLB_GITHUB_TOKEN";
pub const DEFAULT_SOURCE_KEY_ENV: &str = "VLB_HENRIK_API_KEY";

/// All runtime-resolved secrets for one process.
#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    /// Document store (GitHub) token. `None` if the named env var was absent or empty.
    pub store_token: Option<String>,
    /// Stats provider API key. `None` if the named env var was absent or empty.
    pub source_api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("store_token", &self.store_token.as_ref().map(|_| "<REDACTED>"))
            .field(
                "source_api_key",
                &self.source_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct SecretEnvNames {
    store_token_var: String,
    source_key_var: String,
}

/// Non-empty trimmed string at `pointer`, or `None`.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        store_token_var: read_str_at(config_json, "/store/token_env")
            .unwrap_or_else(|| DEFAULT_STORE_TOKEN_ENV.to_string()),
        source_key_var: read_str_at(config_json, "/source/api_key_env")
            .unwrap_or_else(|| DEFAULT_SOURCE_KEY_ENV.to_string()),
    }
}

fn uses_direct_transport(config_json: &Value) -> bool {
    read_str_at(config_json, "/source/transport")
        .map(|t| t.eq_ignore_ascii_case("direct"))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve all secrets for `role` from the environment.
pub fn resolve_secrets(config_json: &Value, role: ConfigRole) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let store_token = resolve_env(&names.store_token_var);
    let source_api_key = resolve_env(&names.source_key_var);

    match role {
        ConfigRole::Reconciler => {
            if store_token.is_none() {
                bail!(
                    "SECRETS_MISSING (role=RECONCILER): document store token env var '{}' is not set or empty",
                    names.store_token_var
                );
            }
            if uses_direct_transport(config_json) && source_api_key.is_none() {
                bail!(
                    "SECRETS_MISSING (role=RECONCILER, transport=direct): stats provider key env var '{}' is not set or empty",
                    names.source_key_var
                );
            }
        }
        ConfigRole::Proxy => {
            if source_api_key.is_none() {
                bail!(
                    "SECRETS_MISSING (role=PROXY): stats provider key env var '{}' is not set or empty",
                    names.source_key_var
                );
            }
        }
    }

    Ok(ResolvedSecrets {
        store_token,
        source_api_key,
    })
}

/// Resolve whatever is present without enforcing requirements.
/// Used by read-only tooling (`status`, `config-hash`).
pub fn resolve_secrets_optional(config_json: &Value) -> ResolvedSecrets {
    let names = parse_env_names(config_json);
    ResolvedSecrets {
        store_token: resolve_env(&names.store_token_var),
        source_api_key: resolve_env(&names.source_key_var),
    }
}
