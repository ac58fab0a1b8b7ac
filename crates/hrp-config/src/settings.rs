//! Typed settings view over the merged config JSON.
//!
//! | Pointer                  | Default                      |
//! |--------------------------|------------------------------|
//! | `/store/backend`         | `s3` (`s3` \| `local`)       |
//! | `/store/region`          | env `REGION_NAME`            |
//! | `/store/endpoint`        | AWS regional endpoint        |
//! | `/store/local_root`      | required for `local`         |
//! | `/registry/bucket`       | `heart-attack-predictor`     |
//! | `/registry/model_key`    | `model-registry/model.json`  |
//! | `/data/target_column`    | `Result`                     |
//! | `/evaluation/report_dir` | `../exports/evaluations`     |

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BUCKET: &str = "heart-attack-predictor";
pub const DEFAULT_MODEL_KEY: &str = "model-registry/model.json";
pub const DEFAULT_TARGET_COLUMN: &str = "Result";
pub const DEFAULT_REPORT_DIR: &str = "../exports/evaluations";

/// Region fallback when `/store/region` is absent.
pub const ENV_REGION_NAME: &str = "REGION_NAME";

/// Missing or invalid required settings. Not recoverable; fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("CONFIG_INVALID {pointer}: {reason}")]
    Invalid { pointer: String, reason: String },

    #[error("SECRETS_MISSING: required env var '{var}' is not set or empty")]
    MissingEnv { var: String },
}

impl ConfigurationError {
    fn invalid(pointer: &str, reason: impl Into<String>) -> Self {
        ConfigurationError::Invalid {
            pointer: pointer.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// S3-compatible REST service.
    S3,
    /// Directory tree on local disk; one sub-directory per bucket.
    Local { root: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl StoreSettings {
    /// Configured region, else `REGION_NAME` from the environment.
    pub fn region_or_env(&self) -> Option<String> {
        self.region.clone().or_else(|| {
            std::env::var(ENV_REGION_NAME)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub store: StoreSettings,
    pub bucket: String,
    pub model_key: String,
    pub target_column: String,
    pub report_dir: PathBuf,
}

impl RegistrySettings {
    pub fn from_config_json(config: &Value) -> Result<Self, ConfigurationError> {
        let backend = match read_str_at(config, "/store/backend")?
            .unwrap_or_else(|| "s3".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "s3" => StoreBackend::S3,
            "local" => {
                let root = read_str_at(config, "/store/local_root")?.ok_or_else(|| {
                    ConfigurationError::invalid(
                        "/store/local_root",
                        "required when /store/backend is 'local'",
                    )
                })?;
                StoreBackend::Local {
                    root: PathBuf::from(root),
                }
            }
            other => {
                return Err(ConfigurationError::invalid(
                    "/store/backend",
                    format!("unknown backend '{other}'; expected one of: s3 | local"),
                ))
            }
        };

        let bucket = read_str_at(config, "/registry/bucket")?
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());
        validate_bucket(&bucket)?;

        let model_key = read_str_at(config, "/registry/model_key")?
            .unwrap_or_else(|| DEFAULT_MODEL_KEY.to_string());
        if model_key.starts_with('/') || model_key.ends_with('/') {
            return Err(ConfigurationError::invalid(
                "/registry/model_key",
                "must be a fully-qualified object key (no leading or trailing '/')",
            ));
        }

        Ok(Self {
            store: StoreSettings {
                backend,
                region: read_str_at(config, "/store/region")?,
                endpoint: read_str_at(config, "/store/endpoint")?,
            },
            bucket,
            model_key,
            target_column: read_str_at(config, "/data/target_column")?
                .unwrap_or_else(|| DEFAULT_TARGET_COLUMN.to_string()),
            report_dir: PathBuf::from(
                read_str_at(config, "/evaluation/report_dir")?
                    .unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string()),
            ),
        })
    }
}

/// Non-blank string at `pointer`. Absent or null is `None`; any other
/// non-string value is an error.
fn read_str_at(config: &Value, pointer: &str) -> Result<Option<String>, ConfigurationError> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let t = s.trim();
            Ok(if t.is_empty() { None } else { Some(t.to_string()) })
        }
        Some(other) => Err(ConfigurationError::invalid(
            pointer,
            format!("expected a string, got {other}"),
        )),
    }
}

fn validate_bucket(bucket: &str) -> Result<(), ConfigurationError> {
    let ok_len = (3..=63).contains(&bucket.len());
    let ok_chars = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if ok_len && ok_chars {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(
            "/registry/bucket",
            format!("'{bucket}' is not a valid bucket name"),
        ))
    }
}
