use std::path::Path;

use anyhow::{Context, Result};
use hrp_registry::{ModelHandle, Presence};

use super::{read_local_table, RegistryContext};

/// Print backend, production location and whether a model is stored there.
pub async fn status(ctx: &RegistryContext) -> Result<()> {
    println!("config_hash={}", ctx.loaded.config_hash);
    println!("backend={}", ctx.store.connection().backend_name());
    println!("model={}", ctx.production);

    let handle = ModelHandle::new(ctx.store.clone(), ctx.production.clone());
    match handle.presence().await {
        Presence::Present => {
            println!("present=true");
            let digest = ctx.store.model_digest(&ctx.production).await?;
            println!("model_sha256={digest}");
        }
        Presence::Absent => println!("present=false"),
        Presence::CheckFailed(reason) => {
            println!("present=false");
            println!("check_failed={reason}");
        }
    }
    Ok(())
}

pub async fn ensure_folder(ctx: &RegistryContext, folder: &str) -> Result<()> {
    let status = ctx
        .store
        .connection()
        .ensure_folder(&ctx.settings.bucket, folder)
        .await?;
    println!("bucket={}", ctx.settings.bucket);
    println!("folder={}/", folder.trim_end_matches('/'));
    println!("status={}", status.as_str());
    Ok(())
}

/// Unconditional promotion of a model file.
pub async fn promote(ctx: &RegistryContext, model_file: &Path, delete_local: bool) -> Result<()> {
    let receipt = hrp_promotion::promote(&ctx.store, model_file, &ctx.production, delete_local)
        .await
        .with_context(|| format!("promote failed: {}", model_file.display()))?;
    println!("promoted=true");
    println!("model={}", receipt.model);
    println!("model_sha256={}", receipt.model_digest);
    println!("bytes={}", receipt.bytes);
    println!("folder_created={}", receipt.folder_created);
    Ok(())
}

/// Score a local CSV with the production model, one line per row.
pub async fn predict(ctx: &RegistryContext, csv: &Path) -> Result<()> {
    let table = read_local_table(csv)?;
    let rows = match table.column_index(&ctx.settings.target_column) {
        Some(_) => table.split_target(&ctx.settings.target_column)?.0,
        None => table,
    };

    let handle = ModelHandle::new(ctx.store.clone(), ctx.production.clone());
    let labels = handle
        .predict(&rows)
        .await
        .with_context(|| format!("predict failed using {}", ctx.production))?;

    for (i, label) in labels.iter().enumerate() {
        println!("row={i} prediction={}", label.response_str());
    }
    println!("rows={}", labels.len());
    Ok(())
}
