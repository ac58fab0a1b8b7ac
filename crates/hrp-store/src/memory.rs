//! In-process object store.
//!
//! Used by tests and dry runs. Supports per-operation failure injection so
//! callers can exercise their storage-error paths deterministically.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::object_store::{ObjectMeta, ObjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreOp {
    Head,
    List,
    Get,
    Put,
}

impl StoreOp {
    fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Head => "head",
            StoreOp::List => "list",
            StoreOp::Get => "get",
            StoreOp::Put => "put",
        }
    }
}

/// Number of backend calls observed, per primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub head: u64,
    pub list: u64,
    pub get: u64,
    pub put: u64,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    faults: Mutex<BTreeSet<StoreOp>>,
    calls: Mutex<CallCounts>,
}

/// Poisoning only means another test thread panicked mid-call; the map
/// itself is never left half-written.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent call of `op` fails with a storage error until
    /// [`clear_faults`](Self::clear_faults).
    pub fn fail_on(&self, op: StoreOp) {
        lock(&self.faults).insert(op);
    }

    pub fn clear_faults(&self) {
        lock(&self.faults).clear();
    }

    pub fn calls(&self) -> CallCounts {
        *lock(&self.calls)
    }

    /// Direct read bypassing counters and faults.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Direct write bypassing counters and faults.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enter(&self, op: StoreOp, bucket: &str, key: &str) -> Result<(), StoreError> {
        {
            let mut c = lock(&self.calls);
            match op {
                StoreOp::Head => c.head += 1,
                StoreOp::List => c.list += 1,
                StoreOp::Get => c.get += 1,
                StoreOp::Put => c.put += 1,
            }
        }
        if lock(&self.faults).contains(&op) {
            return Err(StoreError::storage(
                op.as_str(),
                bucket,
                key,
                "injected failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        self.enter(StoreOp::Head, bucket, key)?;
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .map(|body| ObjectMeta {
                key: key.to_string(),
                size: body.len() as u64,
            })
            .ok_or_else(|| StoreError::not_found(bucket, key))
    }

    async fn list_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        self.enter(StoreOp::List, bucket, prefix)?;
        let objects = lock(&self.objects);
        Ok(objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .take(limit)
            .collect())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.enter(StoreOp::Get, bucket, key)?;
        self.object(bucket, key)
            .ok_or_else(|| StoreError::not_found(bucket, key))
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        self.enter(StoreOp::Put, bucket, key)?;
        self.insert(bucket, key, body);
        Ok(())
    }
}
