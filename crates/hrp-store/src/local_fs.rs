//! Directory-backed object store.
//!
//! Layout: `<root>/<bucket>/<encoded-key>`. Keys are flattened into a single
//! file name (`%` -> `%25`, `/` -> `%2F`) so that a folder marker `a/` and an
//! object `a` never collide with directory entries. Writes go to a temporary
//! sibling and are renamed into place.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;
use crate::object_store::{ObjectMeta, ObjectStore};

const TMP_PREFIX: &str = ".tmp-";

#[derive(Debug, Clone)]
pub struct LocalFsObjectStore {
    root: PathBuf,
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            other => out.push(other),
        }
    }
    out
}

fn decode_key(name: &str) -> String {
    // Only the two escapes produced by encode_key exist on disk.
    name.replace("%2F", "/").replace("%25", "%")
}

impl LocalFsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.bucket_dir(bucket).join(encode_key(key))
    }
}

fn io_err(op: &'static str, path: &Path, source: std::io::Error) -> StoreError {
    StoreError::LocalIo {
        op,
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl ObjectStore for LocalFsObjectStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        let path = self.object_path(bucket, key);
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => Ok(ObjectMeta {
                key: key.to_string(),
                size: m.len(),
            }),
            Ok(_) => Err(StoreError::not_found(bucket, key)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(StoreError::not_found(bucket, key)),
            Err(e) => Err(io_err("head", &path, e)),
        }
    }

    async fn list_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let dir = self.bucket_dir(bucket);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err("list", &dir, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_err("list", &dir, e))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with(TMP_PREFIX) {
                continue;
            }
            let key = decode_key(&name);
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        keys.truncate(limit);
        Ok(keys)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(StoreError::not_found(bucket, key)),
            Err(e) => Err(io_err("get", &path, e)),
        }
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let dir = self.bucket_dir(bucket);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_err("mkdir", &dir, e))?;

        let final_path = self.object_path(bucket, key);
        let tmp_path = dir.join(format!("{TMP_PREFIX}{}", uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp_path, &body)
            .await
            .map_err(|e| io_err("write", &tmp_path, e))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_err("rename", &final_path, e));
        }

        debug!(bucket, key, bytes = body.len(), "local object written");
        Ok(())
    }
}
