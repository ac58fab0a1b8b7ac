use std::path::PathBuf;

use hrp_store::{ErrorKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored bytes are not a valid model document.
    #[error("cannot decode model from {source_ref}: {reason}")]
    Deserialization { source_ref: String, reason: String },

    /// Malformed or non-rectangular table, or a schema mismatch.
    #[error("table error: {0}")]
    Table(String),

    #[error("unrecognised label value '{value}'")]
    Label { value: String },

    /// The model could not score the given rows (missing feature, null cell).
    #[error("predict failed: {0}")]
    Predict(String),

    #[error("local file {op} failed for '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Store(e) => e.kind(),
            RegistryError::Deserialization { .. } => ErrorKind::Deserialization,
            RegistryError::Table(_) | RegistryError::Label { .. } => ErrorKind::Deserialization,
            RegistryError::Predict(_) => ErrorKind::Evaluation,
            RegistryError::Io { .. } => ErrorKind::Storage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::Store(e) if e.is_not_found())
    }

    pub(crate) fn table(msg: impl Into<String>) -> Self {
        RegistryError::Table(msg.into())
    }
}
