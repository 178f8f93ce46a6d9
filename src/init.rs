use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config;

/// Create the starter config and the data files it names. Idempotent.
pub fn run_init(config_path: &Path) -> Result<()> {
    let wrote_config = if config_path.exists() {
        false
    } else {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        fs::write(config_path, config::example_config())
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        true
    };

    let cfg = config::load_config(config_path)?;
    let raw_created = ensure_file(&cfg.paths.raw_log)?;
    let store_created = ensure_file(&cfg.paths.store)?;

    println!("init");
    println!(
        "  config: {} ({})",
        config_path.display(),
        status(wrote_config)
    );
    println!(
        "  raw log: {} ({})",
        cfg.paths.raw_log.display(),
        status(raw_created)
    );
    println!(
        "  store: {} ({})",
        cfg.paths.store.display(),
        status(store_created)
    );
    println!("ok");
    Ok(())
}

fn status(created: bool) -> &'static str {
    if created {
        "created"
    } else {
        "exists"
    }
}

/// Create an empty file (and its parent directory) when absent.
fn ensure_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    fs::write(path, "").with_context(|| format!("Failed to create file: {}", path.display()))?;
    Ok(true)
}
