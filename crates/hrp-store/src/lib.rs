//! hrp-store
//!
//! Remote object-store client used by the model registry.
//!
//! - [`ObjectStore`]: backend primitives (`head`, `list_prefix`, `get`, `put`).
//! - Backends: [`S3ObjectStore`] (S3 REST + SigV4), [`LocalFsObjectStore`],
//!   [`MemoryObjectStore`] (tests / dry runs).
//! - [`Connection`]: the registry-facing contract (`exists`, `read`,
//!   `write_bytes`, `write_file`, `ensure_folder`) over one shared backend.
//! - [`ConnectionSlot`]: construct-once holder; concurrent first connects
//!   collapse to a single backend instance.
//!
//! No operation retries or times out internally. Callers that need a
//! deadline wrap the future themselves.

mod connection;
mod error;
mod local_fs;
mod memory;
mod object_store;
mod s3;
mod sigv4;

pub use connection::{build_store, Connection, ConnectionSlot, FolderStatus};
pub use error::{ErrorKind, StoreError};
pub use local_fs::LocalFsObjectStore;
pub use memory::{CallCounts, MemoryObjectStore, StoreOp};
pub use object_store::{ObjectMeta, ObjectStore};
pub use s3::S3ObjectStore;
