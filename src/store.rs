//! Flat-file persistence for the structured record store.
//!
//! The store is the durable source of truth: read fully at the start of a
//! run, appended to for new records, rewritten in full only when the
//! duplicate pass changed slot assignments. There is no multi-writer
//! safety — concurrent runs against the same store file can interleave and
//! corrupt it. Callers that ever need concurrency must serialize runs
//! externally (a lock file or a single-writer process).

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;

use crate::blockfile;
use crate::models::ItemRecord;

/// Load all records from the store file.
///
/// An absent file is an empty store (first run), not an error. A file that
/// exists but cannot be read or parsed aborts the run — never silently lose
/// persisted data.
pub fn load(path: &Path) -> Result<Vec<ItemRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store file: {}", path.display()))?;
    blockfile::parse_records(&content)
        .with_context(|| format!("Failed to parse store file: {}", path.display()))
}

/// Append new records to the store file, creating it (and its parent
/// directory) if needed. Existing bytes are never modified; a separator is
/// written first when the file does not already end on a blank line.
pub fn append(path: &Path, records: &[ItemRecord]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let mut separator = String::new();
    if path.exists() {
        let existing = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store file: {}", path.display()))?;
        if !existing.is_empty() {
            if !existing.ends_with('\n') {
                separator.push_str("\n\n");
            } else if !existing.ends_with("\n\n") {
                separator.push('\n');
            }
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open store file for append: {}", path.display()))?;
    file.write_all(separator.as_bytes())
        .and_then(|_| file.write_all(blockfile::format_records(records).as_bytes()))
        .with_context(|| format!("Failed to append to store file: {}", path.display()))?;
    Ok(())
}

/// Rewrite the store in full. Writes to a temp file in the same directory
/// and renames it over the original, so an interrupted run never leaves a
/// half-written store behind.
pub fn rewrite(path: &Path, records: &[ItemRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, blockfile::format_records(records))
        .with_context(|| format!("Failed to write store file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| {
        format!(
            "Failed to replace store file {} with {}",
            path.display(),
            tmp.display()
        )
    })?;
    Ok(())
}

/// Content fingerprint of a record set: SHA-256 of the canonical rendering.
/// Used to tell whether a pass actually changed the store.
pub fn fingerprint(records: &[ItemRecord]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(blockfile::format_records(records).as_bytes());
    format!("{:x}", hasher.finalize())
}
