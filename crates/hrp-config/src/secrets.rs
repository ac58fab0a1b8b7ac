//! Object-store credential resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under `/store/keys_env/*`.
//! - At startup, callers invoke [`resolve_store_secrets`] once and pass the
//!   result into the store constructor; nothing else reads these env vars.
//! - `Debug` redacts values. Errors name the variable, never the value.
//!
//! Resolution never fails on its own: whether credentials are required is
//! decided by the backend that consumes them (see [`ResolvedStoreSecrets::require`]).

use serde_json::Value;

use crate::settings::ConfigurationError;

pub const DEFAULT_ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const DEFAULT_SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Credentials for the remote object store, resolved from the environment.
#[derive(Clone)]
pub struct ResolvedStoreSecrets {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Env var the access key id was read from.
    pub access_key_id_var: String,
    /// Env var the secret access key was read from.
    pub secret_access_key_var: String,
}

impl std::fmt::Debug for ResolvedStoreSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedStoreSecrets")
            .field(
                "access_key_id",
                &self.access_key_id.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field("access_key_id_var", &self.access_key_id_var)
            .field("secret_access_key_var", &self.secret_access_key_var)
            .finish()
    }
}

impl ResolvedStoreSecrets {
    /// Build from explicit values (tests, embedding callers).
    pub fn from_values(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            access_key_id_var: DEFAULT_ACCESS_KEY_ID_ENV.to_string(),
            secret_access_key_var: DEFAULT_SECRET_ACCESS_KEY_ENV.to_string(),
        }
    }

    /// No credentials at all.
    pub fn empty() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            access_key_id_var: DEFAULT_ACCESS_KEY_ID_ENV.to_string(),
            secret_access_key_var: DEFAULT_SECRET_ACCESS_KEY_ENV.to_string(),
        }
    }

    /// Both halves of the key pair, or the NAME of the first missing variable.
    pub fn require(&self) -> Result<(&str, &str), ConfigurationError> {
        let id = self
            .access_key_id
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingEnv {
                var: self.access_key_id_var.clone(),
            })?;
        let secret = self
            .secret_access_key
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingEnv {
                var: self.secret_access_key_var.clone(),
            })?;
        Ok((id, secret))
    }
}

/// Non-blank string at `pointer`.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Unset and blank both resolve to `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve store credentials from the environment using the env var names
/// configured under `/store/keys_env`, falling back to the AWS defaults.
pub fn resolve_store_secrets(config_json: &Value) -> ResolvedStoreSecrets {
    let access_key_id_var = read_str_at(config_json, "/store/keys_env/access_key_id")
        .unwrap_or_else(|| DEFAULT_ACCESS_KEY_ID_ENV.to_string());
    let secret_access_key_var = read_str_at(config_json, "/store/keys_env/secret_access_key")
        .unwrap_or_else(|| DEFAULT_SECRET_ACCESS_KEY_ENV.to_string());

    ResolvedStoreSecrets {
        access_key_id: resolve_env(&access_key_id_var),
        secret_access_key: resolve_env(&secret_access_key_var),
        access_key_id_var,
        secret_access_key_var,
    }
}
