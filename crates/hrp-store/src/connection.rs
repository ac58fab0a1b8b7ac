//! Registry-facing object-store client.
//!
//! [`Connection`] layers the registry contract (prefix existence, folder
//! markers, upload-then-delete) over any [`ObjectStore`] backend.
//! [`ConnectionSlot`] holds at most one connection for the lifetime of the
//! slot; concurrent first calls collapse to a single initialisation.

use std::path::Path;
use std::sync::Arc;

use hrp_config::{ResolvedStoreSecrets, StoreBackend, StoreSettings, ENV_REGION_NAME};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::local_fs::LocalFsObjectStore;
use crate::object_store::ObjectStore;
use crate::s3::S3ObjectStore;

/// Outcome of [`Connection::ensure_folder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    Existed,
    Created,
}

impl FolderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderStatus::Existed => "existed",
            FolderStatus::Created => "created",
        }
    }
}

/// Cheap-clone handle; clones share the same backend instance.
#[derive(Clone)]
pub struct Connection {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl Connection {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// True when both handles wrap the very same backend instance.
    pub fn same_as(&self, other: &Connection) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.store) as *const (),
            Arc::as_ptr(&other.store) as *const (),
        )
    }

    /// True iff at least one stored key starts with `key`.
    ///
    /// Prefix semantics: `model-registry/model` matches
    /// `model-registry/model.json`. Pass fully-qualified keys.
    pub async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let found = self.store.list_prefix(bucket, key, 1).await?;
        let exists = !found.is_empty();
        debug!(bucket, key, exists, "exists");
        Ok(exists)
    }

    pub async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let body = self.store.get(bucket, key).await?;
        debug!(bucket, key, bytes = body.len(), "read");
        Ok(body)
    }

    pub async fn write_bytes(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), StoreError> {
        let len = body.len();
        self.store.put(bucket, key, body).await?;
        info!(bucket, key, bytes = len, "object written");
        Ok(())
    }

    /// Upload `local_path` to `bucket/key`. With `delete_local`, the local
    /// file is removed only after the upload returned success.
    pub async fn write_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        delete_local: bool,
    ) -> Result<(), StoreError> {
        let body = tokio::fs::read(local_path)
            .await
            .map_err(|source| StoreError::LocalIo {
                op: "read",
                path: local_path.to_path_buf(),
                source,
            })?;
        self.write_bytes(bucket, key, body).await?;

        if delete_local {
            tokio::fs::remove_file(local_path)
                .await
                .map_err(|source| StoreError::LocalIo {
                    op: "remove",
                    path: local_path.to_path_buf(),
                    source,
                })?;
            debug!(path = %local_path.display(), "local file removed after upload");
        }
        Ok(())
    }

    /// Make sure the zero-byte marker `folder_key/` exists. Only a NotFound
    /// from the lookup leads to creation; any other error is returned.
    pub async fn ensure_folder(
        &self,
        bucket: &str,
        folder_key: &str,
    ) -> Result<FolderStatus, StoreError> {
        let marker = format!("{}/", folder_key.trim_end_matches('/'));
        match self.store.head(bucket, &marker).await {
            Ok(_) => {
                debug!(bucket, key = %marker, "folder marker present");
                Ok(FolderStatus::Existed)
            }
            Err(e) if e.is_not_found() => {
                self.store.put(bucket, &marker, Vec::new()).await?;
                info!(bucket, key = %marker, "folder marker created");
                Ok(FolderStatus::Created)
            }
            Err(e) => Err(e),
        }
    }
}

/// Build the backend named by `settings`.
///
/// S3 needs both credential halves and a region (config or `REGION_NAME`).
pub fn build_store(
    secrets: &ResolvedStoreSecrets,
    settings: &StoreSettings,
) -> Result<Arc<dyn ObjectStore>, StoreError> {
    match &settings.backend {
        StoreBackend::S3 => {
            let (id, secret) = secrets.require()?;
            let region = settings.region_or_env().ok_or_else(|| {
                hrp_config::ConfigurationError::MissingEnv {
                    var: ENV_REGION_NAME.to_string(),
                }
            })?;
            let store = match &settings.endpoint {
                Some(endpoint) => S3ObjectStore::new_with_endpoint(id, secret, region, endpoint)?,
                None => S3ObjectStore::new(id, secret, region)?,
            };
            info!(region = store.region(), endpoint = store.endpoint(), "s3 store ready");
            Ok(Arc::new(store))
        }
        StoreBackend::Local { root } => {
            info!(root = %root.display(), "local store ready");
            Ok(Arc::new(LocalFsObjectStore::new(root.clone())))
        }
    }
}

/// Holder for the one connection a process (or test) uses.
///
/// The first successful `connect*` wins; later calls return the existing
/// connection and ignore their arguments. A failed first attempt leaves the
/// slot empty so a corrected retry can succeed.
pub struct ConnectionSlot {
    cell: OnceCell<Connection>,
}

impl Default for ConnectionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn connect(
        &self,
        secrets: &ResolvedStoreSecrets,
        settings: &StoreSettings,
    ) -> Result<Connection, StoreError> {
        self.connect_with(|| build_store(secrets, settings))
    }

    pub fn connect_with<F>(&self, init: F) -> Result<Connection, StoreError>
    where
        F: FnOnce() -> Result<Arc<dyn ObjectStore>, StoreError>,
    {
        self.cell
            .get_or_try_init(|| {
                let store = init()?;
                info!(backend = store.backend_name(), "object store connection created");
                Ok(Connection::new(store))
            })
            .cloned()
    }

    pub fn get(&self) -> Option<Connection> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryObjectStore, StoreOp};
    use hrp_config::ConfigurationError;

    fn memory_conn() -> (Arc<MemoryObjectStore>, Connection) {
        let mem = Arc::new(MemoryObjectStore::new());
        let conn = Connection::new(mem.clone());
        (mem, conn)
    }

    #[tokio::test]
    async fn exists_is_prefix_match() {
        let (mem, conn) = memory_conn();
        mem.insert("b", "model-registry/model.json", b"{}".to_vec());

        assert!(conn.exists("b", "model-registry/model.json").await.unwrap());
        assert!(conn.exists("b", "model-registry/model").await.unwrap());
        assert!(!conn.exists("b", "model-registry/other").await.unwrap());
        assert!(!conn.exists("other", "model-registry/model.json").await.unwrap());
    }

    #[tokio::test]
    async fn ensure_folder_creates_once() {
        let (mem, conn) = memory_conn();
        assert_eq!(
            conn.ensure_folder("b", "model-registry").await.unwrap(),
            FolderStatus::Created
        );
        assert_eq!(mem.object("b", "model-registry/"), Some(Vec::new()));
        assert_eq!(
            conn.ensure_folder("b", "model-registry/").await.unwrap(),
            FolderStatus::Existed
        );
        assert_eq!(mem.calls().put, 1);
    }

    #[tokio::test]
    async fn ensure_folder_propagates_non_not_found_errors() {
        let (mem, conn) = memory_conn();
        mem.fail_on(StoreOp::Head);
        let err = conn.ensure_folder("b", "model-registry").await.unwrap_err();
        assert!(matches!(err, StoreError::Storage { op: "head", .. }));
        assert_eq!(mem.calls().put, 0);
    }

    #[test]
    fn s3_connect_without_credentials_is_configuration_error() {
        let slot = ConnectionSlot::new();
        let settings = StoreSettings {
            backend: StoreBackend::S3,
            region: Some("us-east-1".into()),
            endpoint: None,
        };
        let err = slot
            .connect(&ResolvedStoreSecrets::empty(), &settings)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Configuration(ConfigurationError::MissingEnv { ref var }) if var == "AWS_ACCESS_KEY_ID"
        ));
        assert!(slot.get().is_none());
    }

    #[test]
    fn second_connect_ignores_arguments() {
        let slot = ConnectionSlot::new();
        let first = slot
            .connect_with(|| Ok(Arc::new(MemoryObjectStore::new()) as Arc<dyn ObjectStore>))
            .unwrap();
        let second = slot
            .connect(&ResolvedStoreSecrets::empty(), &StoreSettings {
                backend: StoreBackend::S3,
                region: None,
                endpoint: None,
            })
            .unwrap();
        assert!(first.same_as(&second));
        assert_eq!(second.backend_name(), "memory");
    }
}
