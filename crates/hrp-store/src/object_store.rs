//! Backend boundary for object storage.
//!
//! Only the primitives live here. The registry-facing contract (prefix
//! existence, folder markers, file upload with local cleanup) is built on top
//! of these in [`crate::Connection`], so every backend gets identical
//! semantics for free.

use async_trait::async_trait;

use crate::error::StoreError;

/// Metadata returned by [`ObjectStore::head`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
}

/// Object-storage backend.
///
/// Implementations must be `Send + Sync` (one instance is shared by every
/// caller in the process) and object-safe (held as `Arc<dyn ObjectStore>`).
///
/// A `put` must replace the object atomically: a concurrent `get` observes
/// either the previous bytes or the new bytes, never a mix.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend identifier for logs (e.g. `"s3"`).
    fn backend_name(&self) -> &'static str;

    /// Exact-key lookup. Absent objects are [`StoreError::NotFound`].
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StoreError>;

    /// Keys starting with `prefix`, lexicographically ordered, at most `limit`.
    /// A bucket that does not exist lists as empty (`Ok(vec![])`), never as
    /// [`StoreError::NotFound`].
    async fn list_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Full object body. Absent objects are [`StoreError::NotFound`].
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Create or overwrite.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError>;
}
