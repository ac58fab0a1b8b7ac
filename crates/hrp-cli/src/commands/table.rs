use std::path::Path;

use anyhow::{Context, Result};

use super::{read_local_table, RegistryContext};

/// Upload a local CSV as a table at `key` in the registry bucket.
pub async fn push(ctx: &RegistryContext, key: &str, file: &Path) -> Result<()> {
    let table = read_local_table(file)?;
    let artifact = ctx.production.sibling(key);
    ctx.store.save_table(&table, &artifact).await?;
    println!("artifact={artifact}");
    println!("rows={}", table.n_rows());
    println!("cols={}", table.n_cols());
    Ok(())
}

/// Download the table at `key` into a local CSV file.
pub async fn pull(ctx: &RegistryContext, key: &str, file: &Path) -> Result<()> {
    let artifact = ctx.production.sibling(key);
    let table = ctx.store.load_table(&artifact).await?;
    let bytes = table.to_csv_bytes()?;
    std::fs::write(file, bytes)
        .with_context(|| format!("write csv failed: {}", file.display()))?;
    println!("artifact={artifact}");
    println!("file={}", file.display());
    println!("rows={}", table.n_rows());
    Ok(())
}
