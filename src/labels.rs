//! Label manifest for the printable-label step.
//!
//! Emits one entry per slotted record: the slot id, an `MFG/PN:` line, and
//! the description. Laying the entries out on a label sheet is a downstream
//! concern; this command only produces the manifest, as text or JSON.

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::models::{ItemRecord, SlotId};
use crate::store;

#[derive(Serialize)]
struct LabelEntry {
    location: String,
    mfg_part_number: String,
    description: String,
}

pub fn run_labels(config: &Config, output: Option<&Path>, format: &str) -> Result<()> {
    let records = store::load(&config.paths.store)?;
    let entries = build_entries(&records);

    let rendered = match format {
        "text" => render_text(&entries),
        "json" => {
            let mut json = serde_json::to_string_pretty(&entries)?;
            json.push('\n');
            json
        }
        other => bail!("Unknown label format: {}. Use text or json.", other),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &rendered)?;
            eprintln!(
                "Wrote {} label entries to {}",
                entries.len(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Records without a location have nothing to print a label for and are
/// skipped.
fn build_entries(records: &[ItemRecord]) -> Vec<LabelEntry> {
    let mut entries: Vec<LabelEntry> = records
        .iter()
        .filter(|record| !record.location.trim().is_empty())
        .map(|record| LabelEntry {
            location: record.location.clone(),
            mfg_part_number: record.manufacturer_part_number.clone(),
            description: record.description.clone(),
        })
        .collect();

    // Parsed slots sort by (prefix, number); unparseable labels go last,
    // alphabetically. Ties keep store order.
    entries.sort_by(
        |a, b| match (SlotId::parse(&a.location), SlotId::parse(&b.location)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.location.cmp(&b.location),
        },
    );
    entries
}

fn render_text(entries: &[LabelEntry]) -> String {
    let mut out = format!("Total locations assigned: {}\n", entries.len());
    for entry in entries {
        out.push('\n');
        out.push_str(&entry.location);
        out.push('\n');
        out.push_str("MFG/PN: ");
        out.push_str(&entry.mfg_part_number);
        out.push('\n');
        out.push_str(&entry.description);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(location: &str, mpn: &str, description: &str) -> ItemRecord {
        let mut record = ItemRecord::unknown();
        record.location = location.to_string();
        record.manufacturer_part_number = mpn.to_string();
        record.description = description.to_string();
        record
    }

    #[test]
    fn test_entries_sorted_numerically_with_raw_labels_last() {
        let records = vec![
            record("C10", "A", ""),
            record("SHELF-3", "B", ""),
            record("C2", "C", ""),
            record("", "dropped", ""),
            record("R1", "D", ""),
        ];
        let entries = build_entries(&records);
        let order: Vec<&str> = entries.iter().map(|e| e.location.as_str()).collect();
        assert_eq!(order, vec!["C2", "C10", "R1", "SHELF-3"]);
    }

    #[test]
    fn test_render_text_entry_layout() {
        let entries = build_entries(&[record(
            "C1",
            "GRM188R71H104KA93D",
            "0.1UF ceramic capacitor",
        )]);
        assert_eq!(
            render_text(&entries),
            "Total locations assigned: 1\n\nC1\nMFG/PN: GRM188R71H104KA93D\n0.1UF ceramic capacitor\n"
        );
    }

    #[test]
    fn test_json_field_names() {
        let entries = build_entries(&[record("C1", "GRM188R71H104KA93D", "cap")]);
        let value = serde_json::to_value(&entries).unwrap();
        assert_eq!(value[0]["location"], "C1");
        assert_eq!(value[0]["mfg_part_number"], "GRM188R71H104KA93D");
        assert_eq!(value[0]["description"], "cap");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.paths.store = dir.path().join("store.txt");

        let err = run_labels(&config, None, "pdf").unwrap_err();
        assert!(err.to_string().contains("Unknown label format"));
    }
}
