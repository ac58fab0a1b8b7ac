use std::path::Path;

use chrono::Utc;
use hrp_registry::{ArtifactRef, ArtifactStore, RegistryError};
use hrp_store::FolderStatus;
use tracing::info;

use crate::types::{EvaluationResult, PromotionReceipt};

/// Overwrite `production` with the model file at `local_model_path`.
///
/// The file is read once; those exact bytes are hashed and uploaded, and the
/// local file is removed (with `delete_local`) only after the upload
/// succeeded. The parent folder marker is created first when missing. Readers holding a
/// warm [`hrp_registry::ModelHandle`] are unaffected; fresh handles see the
/// new bytes. Concurrent promotions are last-writer-wins.
pub async fn promote(
    store: &ArtifactStore,
    local_model_path: &Path,
    production: &ArtifactRef,
    delete_local: bool,
) -> Result<PromotionReceipt, RegistryError> {
    let bytes = tokio::fs::read(local_model_path)
        .await
        .map_err(|source| RegistryError::Io {
            op: "read",
            path: local_model_path.to_path_buf(),
            source,
        })?;
    let model_digest = hrp_config::sha256_hex(&bytes);

    let folder_created = match production.parent_folder() {
        Some(folder) => {
            store
                .connection()
                .ensure_folder(&production.bucket, folder)
                .await?
                == FolderStatus::Created
        }
        None => false,
    };

    let size = bytes.len() as u64;
    store
        .connection()
        .write_bytes(&production.bucket, &production.key, bytes)
        .await?;

    if delete_local {
        tokio::fs::remove_file(local_model_path)
            .await
            .map_err(|source| RegistryError::Io {
                op: "remove",
                path: local_model_path.to_path_buf(),
                source,
            })?;
    }

    let receipt = PromotionReceipt {
        model: production.clone(),
        model_digest,
        bytes: size,
        folder_created,
        promoted_at: Utc::now(),
    };
    info!(
        artifact = %production,
        digest = %receipt.model_digest,
        bytes = receipt.bytes,
        delete_local,
        "model promoted"
    );
    Ok(receipt)
}

/// Promote only when the gate accepted. A rejected candidate leaves both the
/// store and the local file untouched.
pub async fn promote_if_accepted(
    result: &EvaluationResult,
    store: &ArtifactStore,
    local_model_path: &Path,
    production: &ArtifactRef,
    delete_local: bool,
) -> Result<Option<PromotionReceipt>, RegistryError> {
    if !result.accepted {
        info!(
            artifact = %production,
            candidate_score = result.candidate_score,
            production_score = result.production_score,
            "candidate rejected; production model kept"
        );
        return Ok(None);
    }
    promote(store, local_model_path, production, delete_local)
        .await
        .map(Some)
}
