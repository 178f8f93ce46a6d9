//! Push and pull the store file through the bucket.

use anyhow::{bail, Context, Result};
use std::fs;

use crate::blockfile;
use crate::bucket::create_bucket;
use crate::config::Config;

pub async fn run_push(config: &Config) -> Result<()> {
    let content = fs::read_to_string(&config.paths.store)
        .with_context(|| format!("Failed to read store file: {}", config.paths.store.display()))?;

    let bucket = create_bucket(&config.bucket)?;
    bucket.put(&config.bucket.store_object, &content).await?;

    println!("push");
    println!("  object: {}", config.bucket.store_object);
    println!("  bytes: {}", content.len());
    println!("ok");
    Ok(())
}

pub async fn run_pull(config: &Config, force: bool) -> Result<()> {
    let store_path = &config.paths.store;

    // Never clobber local records by accident.
    if !force && store_path.exists() {
        let existing = fs::read_to_string(store_path)
            .with_context(|| format!("Failed to read store file: {}", store_path.display()))?;
        if !existing.trim().is_empty() {
            bail!(
                "Store file {} is not empty. Pass --force to overwrite it with the bucket copy.",
                store_path.display()
            );
        }
    }

    let bucket = create_bucket(&config.bucket)?;
    let content = match bucket.get(&config.bucket.store_object).await? {
        Some(content) => content,
        None => bail!(
            "Bucket object '{}' does not exist",
            config.bucket.store_object
        ),
    };

    // A download that does not parse would poison every later run. Check
    // before writing anything.
    let records = blockfile::parse_records(&content).with_context(|| {
        format!(
            "Bucket object '{}' does not parse as a store",
            config.bucket.store_object
        )
    })?;

    if let Some(parent) = store_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    fs::write(store_path, &content)
        .with_context(|| format!("Failed to write store file: {}", store_path.display()))?;

    println!("pull");
    println!("  object: {}", config.bucket.store_object);
    println!("  records: {}", records.len());
    println!("  store: {}", store_path.display());
    println!("ok");
    Ok(())
}
