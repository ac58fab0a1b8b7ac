//! Model Handle: lazy, per-instance cached access to one stored model.
//!
//! The cache belongs to the handle. A handle that has already loaded keeps
//! predicting with that model even if the stored object is overwritten; a
//! freshly built handle sees whatever is stored at first use.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::warn;

use crate::artifact_ref::ArtifactRef;
use crate::error::RegistryError;
use crate::labels::Label;
use crate::model::Model;
use crate::store::ArtifactStore;
use crate::table::TabularBatch;

/// Result of an existence check that keeps lookup failures visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
    CheckFailed(String),
}

impl Presence {
    /// Failed checks count as absent.
    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present)
    }
}

pub struct ModelHandle {
    store: ArtifactStore,
    artifact: ArtifactRef,
    cached: OnceCell<Arc<dyn Model>>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("artifact", &self.artifact)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ModelHandle {
    pub fn new(store: ArtifactStore, artifact: ArtifactRef) -> Self {
        Self {
            store,
            artifact,
            cached: OnceCell::new(),
        }
    }

    pub fn artifact(&self) -> &ArtifactRef {
        &self.artifact
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.initialized()
    }

    /// Loaded model, fetching it on first call. A failed load is not cached,
    /// so the next call fetches again.
    pub async fn model(&self) -> Result<Arc<dyn Model>, RegistryError> {
        let model = self
            .cached
            .get_or_try_init(|| self.store.load_model(&self.artifact))
            .await?;
        Ok(model.clone())
    }

    pub async fn predict(&self, rows: &TabularBatch) -> Result<Vec<Label>, RegistryError> {
        self.model().await?.predict(rows)
    }

    pub async fn presence(&self) -> Presence {
        match self.store.has_model(&self.artifact).await {
            Ok(true) => Presence::Present,
            Ok(false) => Presence::Absent,
            Err(e) => Presence::CheckFailed(e.to_string()),
        }
    }

    /// Lookup failures degrade to `false` ("no production model yet").
    pub async fn is_present(&self) -> bool {
        match self.presence().await {
            Presence::CheckFailed(reason) => {
                warn!(artifact = %self.artifact, %reason, "model presence check failed; treating as absent");
                false
            }
            p => p.is_present(),
        }
    }
}
