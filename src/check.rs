use anyhow::{bail, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::store;

/// Compare the capture directory against the store: which photos have no
/// record yet.
pub fn run_check(config: &Config) -> Result<()> {
    let photos_dir = config.paths.photos_dir.as_ref().ok_or_else(|| {
        anyhow::anyhow!("Photos directory not configured. Set paths.photos_dir in the config file.")
    })?;
    if !photos_dir.exists() {
        bail!("Photos directory does not exist: {}", photos_dir.display());
    }

    let available = scan_photos(photos_dir, &config.photos.include_globs)?;

    let records = store::load(&config.paths.store)?;
    let processed: BTreeSet<String> = records
        .iter()
        .filter_map(|record| record.item_id().map(str::to_string))
        .collect();

    let missing: Vec<&String> = available.difference(&processed).collect();

    println!("check");
    println!("  photos dir: {}", photos_dir.display());
    println!("  photos found: {}", available.len());
    println!("  processed item ids: {}", processed.len());
    println!("  missing from store: {}", missing.len());
    for name in &missing {
        println!("    {}", name);
    }
    println!("ok");
    Ok(())
}

/// File names under `dir` matching the include globs.
fn scan_photos(dir: &Path, include_globs: &[String]) -> Result<BTreeSet<String>> {
    let include_set = build_globset(include_globs)?;

    let mut names = BTreeSet::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();
        if !include_set.is_match(&rel_str) {
            continue;
        }
        names.insert(entry.file_name().to_string_lossy().to_string());
    }
    Ok(names)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // Camera files are routinely uppercase (IMG_0012.HEIC).
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}
