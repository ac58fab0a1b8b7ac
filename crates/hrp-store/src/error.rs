use std::path::PathBuf;

use hrp_config::ConfigurationError;
use thiserror::Error;

/// Operator-facing error taxonomy shared by every registry layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing credentials / required settings. Fatal at startup.
    Configuration,
    /// Object absent. Callers often treat it as "first run".
    NotFound,
    /// Stored bytes are not a valid model / table.
    Deserialization,
    /// Network / service / local I/O failure. Not retried.
    Storage,
    /// Production model present but could not be scored.
    Evaluation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Deserialization => "DESERIALIZATION",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::Evaluation => "EVALUATION",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("storage {op} failed for {bucket}/{key}: {message}")]
    Storage {
        op: &'static str,
        bucket: String,
        key: String,
        message: String,
    },

    #[error("local file {op} failed for '{}': {source}", path.display())]
    LocalIo {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn storage(op: &'static str, bucket: &str, key: &str, message: impl Into<String>) -> Self {
        StoreError::Storage {
            op,
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Configuration(_) => ErrorKind::Configuration,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Storage { .. } | StoreError::LocalIo { .. } => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_onto_taxonomy() {
        assert_eq!(StoreError::not_found("b", "k").kind(), ErrorKind::NotFound);
        assert_eq!(
            StoreError::storage("get", "b", "k", "boom").kind(),
            ErrorKind::Storage
        );
        let cfg: StoreError = ConfigurationError::MissingEnv {
            var: "AWS_ACCESS_KEY_ID".into(),
        }
        .into();
        assert_eq!(cfg.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn display_is_operator_readable() {
        let err = StoreError::storage("put", "models", "model-registry/model.json", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "storage put failed for models/model-registry/model.json: HTTP 503"
        );
    }
}
