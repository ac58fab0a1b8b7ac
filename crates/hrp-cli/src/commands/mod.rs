//! Command handler modules for the `hrp` CLI.
//!
//! Shared wiring (config -> settings -> secrets -> connection) lives here.
//! Command-specific logic lives in the submodules.

pub mod evaluate;
pub mod registry;
pub mod table;

use std::path::Path;

use anyhow::{Context, Result};
use hrp_config::{ConfigMode, LoadedConfig, RegistrySettings, UnusedKeyPolicy};
use hrp_registry::{ArtifactRef, ArtifactStore, TabularBatch};
use hrp_store::ConnectionSlot;
use tracing::warn;

/// The one object-store connection this process uses.
static CONNECTION: ConnectionSlot = ConnectionSlot::new();

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Everything a command needs to talk to the registry.
pub struct RegistryContext {
    pub loaded: LoadedConfig,
    pub settings: RegistrySettings,
    pub store: ArtifactStore,
    pub production: ArtifactRef,
}

/// Load layered config, warn on unused keys, resolve secrets once and
/// connect.
pub fn open_registry(config_paths: &[String], mode: ConfigMode) -> Result<RegistryContext> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = hrp_config::load_layered_yaml(&path_refs)?;

    let report = hrp_config::report_unused_keys(mode, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(
            mode = %report.mode,
            unused = ?report.unused_leaf_pointers,
            "config contains keys this command does not read"
        );
    }

    let settings = loaded.settings()?;
    let secrets = hrp_config::resolve_store_secrets(&loaded.config_json);
    let conn = CONNECTION.connect(&secrets, &settings.store)?;

    Ok(RegistryContext {
        production: ArtifactRef::production_model(&settings),
        store: ArtifactStore::new(conn),
        settings,
        loaded,
    })
}

/// Read a local CSV file into a typed table.
pub fn read_local_table(path: &Path) -> Result<TabularBatch> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read csv failed: {}", path.display()))?;
    TabularBatch::from_csv_bytes(&bytes)
        .with_context(|| format!("parse csv failed: {}", path.display()))
}
