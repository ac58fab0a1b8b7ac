//! Artifact Store: model and table persistence over one [`Connection`].

use std::path::Path;
use std::sync::Arc;

use hrp_store::Connection;
use tracing::{debug, info};

use crate::artifact_ref::ArtifactRef;
use crate::error::RegistryError;
use crate::model::{decode_model, encode_model, Model, ModelDocument};
use crate::table::{Column, TableSchema, TabularBatch};

/// Suffix of the schema object stored next to every saved table.
pub const TABLE_SCHEMA_SUFFIX: &str = ".schema.json";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    conn: Connection,
}

impl ArtifactStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Prefix existence of `artifact.key` (see [`Connection::exists`]).
    pub async fn has_model(&self, artifact: &ArtifactRef) -> Result<bool, RegistryError> {
        Ok(self.conn.exists(&artifact.bucket, &artifact.key).await?)
    }

    pub async fn load_model(&self, artifact: &ArtifactRef) -> Result<Arc<dyn Model>, RegistryError> {
        let bytes = self.conn.read(&artifact.bucket, &artifact.key).await?;
        let model = decode_model(&bytes, &artifact.to_string())?;
        info!(artifact = %artifact, family = model.family(), "model loaded");
        Ok(model)
    }

    /// Upload a serialized model file as-is.
    pub async fn save_model(
        &self,
        local_path: &Path,
        artifact: &ArtifactRef,
        delete_local: bool,
    ) -> Result<(), RegistryError> {
        self.conn
            .write_file(local_path, &artifact.bucket, &artifact.key, delete_local)
            .await?;
        info!(artifact = %artifact, path = %local_path.display(), delete_local, "model saved");
        Ok(())
    }

    pub async fn save_model_document(
        &self,
        doc: &ModelDocument,
        artifact: &ArtifactRef,
    ) -> Result<(), RegistryError> {
        let bytes = encode_model(doc)?;
        self.conn
            .write_bytes(&artifact.bucket, &artifact.key, bytes)
            .await?;
        info!(artifact = %artifact, family = doc.family(), "model document saved");
        Ok(())
    }

    /// The schema object that accompanies the table at `artifact`.
    pub fn table_schema_ref(artifact: &ArtifactRef) -> ArtifactRef {
        artifact.sibling(format!("{}{TABLE_SCHEMA_SUFFIX}", artifact.key))
    }

    /// Load a table saved by [`ArtifactStore::save_table`], restoring the
    /// recorded column types. A table without a schema object (uploaded by
    /// other tooling) has its column types inferred.
    pub async fn load_table(&self, artifact: &ArtifactRef) -> Result<TabularBatch, RegistryError> {
        let schema_ref = Self::table_schema_ref(artifact);
        let schema = match self.conn.read(&schema_ref.bucket, &schema_ref.key).await {
            Ok(bytes) => Some(serde_json::from_slice::<TableSchema>(&bytes).map_err(|e| {
                RegistryError::Deserialization {
                    source_ref: schema_ref.to_string(),
                    reason: e.to_string(),
                }
            })?),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };

        let bytes = self.conn.read(&artifact.bucket, &artifact.key).await?;
        let table = match &schema {
            Some(schema) => TabularBatch::from_csv_bytes_exact(&bytes, schema)?,
            None => TabularBatch::from_csv_bytes(&bytes)?,
        };
        debug!(
            artifact = %artifact,
            rows = table.n_rows(),
            cols = table.n_cols(),
            recorded_schema = schema.is_some(),
            "table loaded"
        );
        Ok(table)
    }

    /// Load with `schema` applied to the named columns; other columns are
    /// inferred. Any recorded schema object is ignored.
    pub async fn load_table_with_schema(
        &self,
        artifact: &ArtifactRef,
        schema: &[Column],
    ) -> Result<TabularBatch, RegistryError> {
        let bytes = self.conn.read(&artifact.bucket, &artifact.key).await?;
        let table = TabularBatch::from_csv_bytes_with_schema(&bytes, schema)?;
        debug!(artifact = %artifact, rows = table.n_rows(), cols = table.n_cols(), "table loaded");
        Ok(table)
    }

    /// Write the CSV text, then its schema object.
    pub async fn save_table(
        &self,
        table: &TabularBatch,
        artifact: &ArtifactRef,
    ) -> Result<(), RegistryError> {
        let bytes = table.to_csv_bytes()?;
        let schema = serde_json::to_vec_pretty(&table.schema())
            .map_err(|e| RegistryError::table(format!("encode schema: {e}")))?;
        self.conn
            .write_bytes(&artifact.bucket, &artifact.key, bytes)
            .await?;
        let schema_ref = Self::table_schema_ref(artifact);
        self.conn
            .write_bytes(&schema_ref.bucket, &schema_ref.key, schema)
            .await?;
        debug!(artifact = %artifact, rows = table.n_rows(), "table saved");
        Ok(())
    }

    /// sha256 hex of the stored bytes.
    pub async fn model_digest(&self, artifact: &ArtifactRef) -> Result<String, RegistryError> {
        let bytes = self.conn.read(&artifact.bucket, &artifact.key).await?;
        Ok(hrp_config::sha256_hex(&bytes))
    }
}
