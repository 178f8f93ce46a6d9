//! Reconciliation pipeline: raw capture log in, slotted store out.
//!
//! One run scans the raw log and diffs it against the store by item id.
//! New blocks are chunked, handed to the extraction provider, admitted
//! into the slot namespace, and appended. The duplicate pass then runs
//! over the full store and rewrites it only when slots actually moved.

use std::fs;

use anyhow::{Context, Result};

use crate::blockfile::parse_raw_blocks;
use crate::bucket::create_bucket;
use crate::chunk::chunk_blocks;
use crate::config::Config;
use crate::dedup::reconcile_duplicates;
use crate::extract::create_extractor;
use crate::models::{ItemRecord, RawBlock};
use crate::progress::{ReconcileProgressEvent, ReconcileProgressReporter};
use crate::slots::{prefix_for, SeenIdentifiers, SlotNamespace};
use crate::store;

// ============================================================
// Admission
// ============================================================

/// What became of one run's extraction candidates.
struct Admitted {
    records: Vec<ItemRecord>,
    skipped_existing: usize,
    /// Display names of records stored without a location.
    unassigned: Vec<String>,
}

fn admit_candidates(
    candidates: Vec<ItemRecord>,
    seen: &mut SeenIdentifiers,
    namespace: &mut SlotNamespace,
    capacity: u32,
) -> Admitted {
    let mut admitted = Admitted {
        records: Vec::new(),
        skipped_existing: 0,
        unassigned: Vec::new(),
    };
    for mut record in candidates {
        // The extractor can resurface an item another chunk or an earlier
        // run already produced. Keep the stored record and drop this one
        // before it burns a slot.
        if let Some(id) = record.item_id() {
            if !seen.insert(id) {
                admitted.skipped_existing += 1;
                continue;
            }
        }
        // The namespace owns locations. Whatever the provider put in
        // `Location` is discarded.
        let prefix = prefix_for(&record.component_type);
        match namespace.assign(prefix, capacity) {
            Some(slot) => record.location = slot.to_string(),
            None => {
                let name = record
                    .item_id()
                    .unwrap_or(record.part_number.as_str())
                    .to_string();
                admitted.unassigned.push(name);
                record.location = String::new();
            }
        }
        admitted.records.push(record);
    }
    admitted
}

// ============================================================
// Pipeline
// ============================================================

pub async fn run_reconcile(
    config: &Config,
    dry_run: bool,
    limit: Option<usize>,
    push: bool,
    reporter: &dyn ReconcileProgressReporter,
) -> Result<()> {
    reporter.report(ReconcileProgressEvent::Scanning);

    let stored = store::load(&config.paths.store)?;
    let mut namespace = SlotNamespace::from_records(&stored);
    let mut seen = SeenIdentifiers::from_records(&stored);

    let raw = fs::read_to_string(&config.paths.raw_log)
        .with_context(|| format!("Failed to read raw log: {}", config.paths.raw_log.display()))?;
    let blocks = parse_raw_blocks(&raw);
    let total_blocks = blocks.len();

    let mut new_blocks: Vec<RawBlock> = blocks
        .into_iter()
        .filter(|block| match &block.item_id {
            Some(id) => !seen.contains(id),
            None => true,
        })
        .collect();
    if let Some(limit) = limit {
        new_blocks.truncate(limit);
    }
    // Blocks without an item id can never be matched against the store, so
    // they are re-extracted on every run. Counted separately to keep the
    // repetition visible.
    let anonymous_blocks = new_blocks
        .iter()
        .filter(|block| block.item_id.is_none())
        .count();

    let chunks = chunk_blocks(&new_blocks, config.chunking.max_chars);

    if dry_run {
        println!("reconcile (dry-run)");
        println!("  raw blocks: {}", total_blocks);
        println!("  new blocks: {}", new_blocks.len());
        if anonymous_blocks > 0 {
            println!("  blocks without item id: {}", anonymous_blocks);
        }
        println!("  chunks to extract: {}", chunks.len());
        return Ok(());
    }

    let total_chunks = chunks.len();
    let mut candidates: Vec<ItemRecord> = Vec::new();
    let mut failed_chunks = 0usize;
    if !chunks.is_empty() {
        let extractor = create_extractor(&config.extraction)?;
        for (idx, chunk) in chunks.iter().enumerate() {
            reporter.report(ReconcileProgressEvent::Extracting {
                provider: extractor.name().to_string(),
                n: (idx + 1) as u64,
                total: total_chunks as u64,
            });
            match extractor.extract(chunk).await {
                Ok(records) => candidates.extend(records),
                // One bad chunk must not lose the rest of the run.
                Err(err) if config.extraction.is_enabled() => {
                    eprintln!(
                        "Warning: extraction failed for chunk {}/{}: {}",
                        idx + 1,
                        total_chunks,
                        err
                    );
                    failed_chunks += 1;
                }
                // A disabled provider fails every chunk the same way.
                // Surface it once as a run error.
                Err(err) => return Err(err),
            }
        }
    }

    let admitted = admit_candidates(candidates, &mut seen, &mut namespace, config.slots.capacity);
    for name in &admitted.unassigned {
        eprintln!(
            "Warning: no free slot for '{}': record stored without a location",
            name
        );
    }

    if !admitted.records.is_empty() {
        store::append(&config.paths.store, &admitted.records)?;
    }

    // The duplicate pass always runs against the full store, even when
    // nothing new came in, so a store edited by hand still converges.
    let mut records = store::load(&config.paths.store)?;
    let outcome = reconcile_duplicates(&mut records);
    if outcome.needs_rewrite() {
        store::rewrite(&config.paths.store, &records)?;
    }
    for part in &outcome.empty_groups {
        eprintln!(
            "Warning: duplicate records for '{}' have no parseable slot to share",
            part
        );
    }

    if push {
        let bucket = create_bucket(&config.bucket)?;
        let content = fs::read_to_string(&config.paths.store).with_context(|| {
            format!("Failed to read store file: {}", config.paths.store.display())
        })?;
        bucket.put(&config.bucket.store_object, &content).await?;
    }

    let fingerprint = store::fingerprint(&records);

    println!("reconcile");
    println!("  raw blocks: {}", total_blocks);
    println!("  new blocks: {}", new_blocks.len());
    if anonymous_blocks > 0 {
        println!("  blocks without item id: {}", anonymous_blocks);
    }
    println!("  chunks extracted: {}", total_chunks - failed_chunks);
    if failed_chunks > 0 {
        println!("  chunks failed: {}", failed_chunks);
    }
    println!("  records added: {}", admitted.records.len());
    if admitted.skipped_existing > 0 {
        println!("  skipped (already stored): {}", admitted.skipped_existing);
    }
    if !admitted.unassigned.is_empty() {
        println!("  records without slots: {}", admitted.unassigned.len());
    }
    println!("  duplicate groups: {}", outcome.groups);
    if outcome.changed > 0 {
        println!("  slots merged: {}", outcome.changed);
    }
    println!(
        "  store rewritten: {}",
        if outcome.needs_rewrite() { "yes" } else { "no" }
    );
    println!("  store fingerprint: {}", &fingerprint[..12]);
    if push {
        println!("  pushed: {}", config.bucket.store_object);
    }
    println!("ok");

    Ok(())
}
