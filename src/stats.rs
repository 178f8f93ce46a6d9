//! Store statistics and slot-usage overview.
//!
//! A quick summary of what the store holds: record counts, identity
//! coverage, and how full each slot prefix is. Used by `stock stats` to
//! spot a prefix running out of room before assignment starts failing.

use anyhow::Result;
use std::collections::BTreeSet;

use crate::config::Config;
use crate::slots::SlotNamespace;
use crate::store;

/// Run the stats command: load the store and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let records = store::load(&config.paths.store)?;

    let store_size = std::fs::metadata(&config.paths.store)
        .map(|m| m.len())
        .unwrap_or(0);

    let distinct_ids: BTreeSet<&str> = records.iter().filter_map(|r| r.item_id()).collect();
    let without_slot = records
        .iter()
        .filter(|r| r.location.trim().is_empty())
        .count();
    let namespace = SlotNamespace::from_records(&records);

    println!("Stockroom - Store Stats");
    println!("=======================");
    println!();
    println!("  Store:        {}", config.paths.store.display());
    println!("  Size:         {}", format_bytes(store_size));
    println!();
    println!("  Records:      {}", records.len());
    println!("  Distinct ids: {}", distinct_ids.len());
    println!("  Without slot: {}", without_slot);

    let prefixes: Vec<_> = namespace.iter().collect();
    if !prefixes.is_empty() {
        println!();
        println!("  By prefix:");
        println!(
            "  {:<8} {:>6} {:>10} {:>9}",
            "PREFIX", "USED", "CAPACITY", "HIGHEST"
        );
        println!("  {}", "-".repeat(38));

        for (prefix, used) in prefixes {
            let highest = used.iter().next_back().copied().unwrap_or(0);
            println!(
                "  {:<8} {:>6} {:>10} {:>9}",
                prefix,
                used.len(),
                config.slots.capacity,
                highest
            );
        }
    }

    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
