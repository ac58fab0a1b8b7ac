//! hrp-registry
//!
//! Model registry on top of the object-store connection:
//! - [`ArtifactStore`]: `has_model` / `load_model` / `save_model` and the
//!   table round trip (`load_table` / `save_table`).
//! - [`ModelHandle`]: lazily loaded, per-instance cached model with a
//!   fail-safe existence check.
//! - [`TabularBatch`]: typed rectangular data with a `na`-aware CSV codec.
//! - [`encode_label`]: the single raw-value -> [`Label`] mapping.
//! - [`Model`] / [`ModelDocument`]: the stored classifier encoding.

mod artifact_ref;
mod error;
mod handle;
mod labels;
mod model;
mod store;
mod table;

pub use artifact_ref::ArtifactRef;
pub use error::RegistryError;
pub use handle::{ModelHandle, Presence};
pub use labels::{encode_label, encode_label_str, encode_labels, Label};
pub use model::{
    decode_model, encode_model, ConstantModel, LogisticModel, Model, ModelDocument, StumpModel,
};
pub use store::{ArtifactStore, TABLE_SCHEMA_SUFFIX};
pub use table::{Cell, CellValue, Column, ColumnType, TableSchema, TabularBatch, NULL_TOKEN};
