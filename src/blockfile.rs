//! Tolerant line-oriented parsing and writing of blank-line-separated
//! `Key: Value` blocks — the on-disk format shared by the raw OCR log, the
//! structured store, and extractor responses.
//!
//! The format carries no escaping: a value containing newlines or lines
//! shaped like `Key: Value` is ambiguous when reparsed. The parser is
//! deliberately forgiving rather than strict: the first `:` on a line splits
//! key from value, a line with no `:` continues the previous value, and the
//! first occurrence of a schema key wins (later occurrences and unrecognized
//! keys are preserved as extras so a rewrite never drops them).

use anyhow::{bail, Result};

use crate::models::{
    ItemRecord, RawBlock, KEY_COMPONENT_TYPE, KEY_DESCRIPTION, KEY_FABRICATOR, KEY_FOOTPRINT,
    KEY_IMAGE, KEY_LOCATION, KEY_MANUFACTURER_PART_NUMBER, KEY_PART_NUMBER, UNKNOWN,
};

/// Split text into blocks: maximal runs of lines that are non-empty after
/// trimming. Block text is the lines rejoined with `\n`, verbatim.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Parse one block into ordered `(key, value)` pairs.
///
/// Keys and values are trimmed. Lines with no `:` are appended to the
/// previous pair's value; a block-leading line with no `:` is dropped, the
/// way the original line-anchored scraping ignored it.
pub fn block_pairs(block: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for line in block.lines() {
        match line.split_once(':') {
            Some((key, value)) => {
                pairs.push((key.trim().to_string(), value.trim().to_string()));
            }
            None => {
                if let Some(last) = pairs.last_mut() {
                    if !last.1.is_empty() {
                        last.1.push('\n');
                    }
                    last.1.push_str(line.trim());
                }
            }
        }
    }
    pairs
}

/// Build a record from a block's pairs. Absent schema fields become
/// [`UNKNOWN`]; an absent `Location` stays empty (locations are assigned,
/// never extracted). Returns `None` when the block carries no schema key at
/// all — the caller decides whether that is corruption or noise.
pub fn record_from_block(block: &str) -> Option<ItemRecord> {
    let mut image = None;
    let mut part_number = None;
    let mut manufacturer_part_number = None;
    let mut fabricator = None;
    let mut description = None;
    let mut footprint = None;
    let mut component_type = None;
    let mut location = None;
    let mut extra = Vec::new();

    for (key, value) in block_pairs(block) {
        let target = match key.as_str() {
            KEY_IMAGE => &mut image,
            KEY_PART_NUMBER => &mut part_number,
            KEY_MANUFACTURER_PART_NUMBER => &mut manufacturer_part_number,
            KEY_FABRICATOR => &mut fabricator,
            KEY_DESCRIPTION => &mut description,
            KEY_FOOTPRINT => &mut footprint,
            KEY_COMPONENT_TYPE => &mut component_type,
            KEY_LOCATION => &mut location,
            _ => {
                extra.push((key, value));
                continue;
            }
        };
        if target.is_some() {
            // First occurrence of a schema key wins; repeats are kept verbatim.
            extra.push((key, value));
        } else {
            *target = Some(value);
        }
    }

    if image.is_none()
        && part_number.is_none()
        && manufacturer_part_number.is_none()
        && fabricator.is_none()
        && description.is_none()
        && footprint.is_none()
        && component_type.is_none()
        && location.is_none()
    {
        return None;
    }

    // Empty extracted values fall back to the sentinel. Location is the
    // exception: it is legitimately empty until assignment.
    let field = |v: Option<String>| match v {
        Some(s) if !s.is_empty() => s,
        _ => UNKNOWN.to_string(),
    };

    Some(ItemRecord {
        image: field(image),
        part_number: field(part_number),
        manufacturer_part_number: field(manufacturer_part_number),
        fabricator: field(fabricator),
        description: field(description),
        footprint: field(footprint),
        component_type: field(component_type),
        location: location.unwrap_or_default(),
        extra,
    })
}

/// Parse the persisted store. A non-empty block with no recognizable schema
/// key is treated as corruption and aborts, rather than silently turning
/// data into an all-unknown record.
pub fn parse_records(text: &str) -> Result<Vec<ItemRecord>> {
    let mut records = Vec::new();
    for block in split_blocks(text) {
        match record_from_block(&block) {
            Some(record) => records.push(record),
            None => bail!(
                "Store block has no recognizable fields (corrupt store?): {:?}",
                first_line(&block)
            ),
        }
    }
    Ok(records)
}

/// Parse extractor output. Blocks without any schema key (prose, apologies,
/// stray formatting) are skipped — the contract is to tolerate bad
/// responses, never to fabricate records from them.
pub fn parse_candidates(text: &str) -> Vec<ItemRecord> {
    split_blocks(text)
        .iter()
        .filter_map(|block| record_from_block(block))
        .collect()
}

/// Parse the raw OCR log into blocks with their identity tokens.
pub fn parse_raw_blocks(text: &str) -> Vec<RawBlock> {
    split_blocks(text)
        .into_iter()
        .map(|block| {
            let item_id = block_pairs(&block)
                .into_iter()
                .find(|(k, _)| k == KEY_IMAGE)
                .and_then(|(_, v)| v.split_whitespace().next().map(str::to_string));
            RawBlock {
                item_id,
                text: block,
            }
        })
        .collect()
}

/// Render one record as a block: schema fields in canonical order, then
/// extras. Empty values render as a bare `Key:` line.
pub fn format_record(record: &ItemRecord) -> String {
    let mut lines = Vec::new();
    for (key, value) in record.fields() {
        lines.push(format_line(key, value));
    }
    for (key, value) in &record.extra {
        lines.push(format_line(key, value));
    }
    lines.join("\n")
}

fn format_line(key: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{}:", key)
    } else {
        format!("{}: {}", key, value)
    }
}

/// Render a full store: blocks separated and terminated by a blank line,
/// matching how the original tooling accumulated entries.
pub fn format_records(records: &[ItemRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let blocks: Vec<String> = records.iter().map(format_record).collect();
    format!("{}\n\n", blocks.join("\n\n"))
}

fn first_line(block: &str) -> &str {
    block.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE_BLOCK: &str = "Image: IMG_4213.heic\n\
        Part number: 399-1096-1-ND\n\
        Manufacturer Part number: C0805C104K5RACTU\n\
        Fabricated Company: KEMET\n\
        Description: CAP CER 0.1UF 50V X7R 0805\n\
        Footprint: 0805\n\
        Component Type: Capacitor\n\
        Location: C3";

    #[test]
    fn test_parse_full_record() {
        let records = parse_records(STORE_BLOCK).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.image, "IMG_4213.heic");
        assert_eq!(r.part_number, "399-1096-1-ND");
        assert_eq!(r.manufacturer_part_number, "C0805C104K5RACTU");
        assert_eq!(r.fabricator, "KEMET");
        assert_eq!(r.footprint, "0805");
        assert_eq!(r.component_type, "Capacitor");
        assert_eq!(r.location, "C3");
        assert_eq!(r.slot().unwrap().to_string(), "C3");
        assert!(r.extra.is_empty());
    }

    #[test]
    fn test_missing_fields_become_unknown() {
        let text = "Image: IMG_1.jpg\nComponent Type: Resistor";
        let records = parse_records(text).unwrap();
        let r = &records[0];
        assert_eq!(r.part_number, "unknown");
        assert_eq!(r.description, "unknown");
        assert_eq!(r.location, "");
    }

    #[test]
    fn test_empty_value_becomes_unknown_except_location() {
        let text = "Image: IMG_1.jpg\nPart number:\nLocation:";
        let records = parse_records(text).unwrap();
        let r = &records[0];
        assert_eq!(r.part_number, "unknown");
        assert_eq!(r.location, "");
    }

    #[test]
    fn test_unknown_keys_preserved_as_extra() {
        let text = "Image: IMG_1.jpg\nExtracted Text: CAP 10uF\nQuantity: 40";
        let records = parse_records(text).unwrap();
        let r = &records[0];
        assert_eq!(
            r.extra,
            vec![
                ("Extracted Text".to_string(), "CAP 10uF".to_string()),
                ("Quantity".to_string(), "40".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_key_first_wins_rest_to_extra() {
        let text = "Image: IMG_1.jpg\nLocation: C1\nLocation: C9";
        let records = parse_records(text).unwrap();
        let r = &records[0];
        assert_eq!(r.location, "C1");
        assert_eq!(r.extra, vec![("Location".to_string(), "C9".to_string())]);
    }

    #[test]
    fn test_continuation_line_joins_previous_value() {
        let text = "Image: IMG_1.jpg\nDescription: 10uF ceramic\nhand sorted bin";
        let records = parse_records(text).unwrap();
        assert_eq!(records[0].description, "10uF ceramic\nhand sorted bin");
    }

    #[test]
    fn test_keyless_store_block_is_corrupt() {
        let text = "Image: IMG_1.jpg\nLocation: C1\n\njust some prose\nwith no keys";
        assert!(parse_records(text).is_err());
    }

    #[test]
    fn test_candidates_skip_keyless_blocks() {
        let text = "I could not find any components.\n\nImage: IMG_2.jpg\nComponent Type: Resistor";
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].image, "IMG_2.jpg");
    }

    #[test]
    fn test_raw_blocks_item_id_first_token() {
        let text = "Image: IMG_7.heic\nExtracted Text: RES 10K OHM\n\nno identity here\njust text";
        let blocks = parse_raw_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].item_id.as_deref(), Some("IMG_7.heic"));
        assert_eq!(blocks[1].item_id, None);
    }

    #[test]
    fn test_split_blocks_tolerates_whitespace_separators() {
        let text = "a: 1\n   \nb: 2\n\n\nc: 3\n";
        let blocks = split_blocks(text);
        assert_eq!(blocks, vec!["a: 1", "b: 2", "c: 3"]);
    }

    #[test]
    fn test_round_trip_is_field_identical() {
        let text = "Image: IMG_4213.heic\n\
            Part number: 399-1096-1-ND\n\
            Manufacturer Part number: C0805C104K5RACTU\n\
            Fabricated Company: KEMET\n\
            Description: CAP CER 0.1UF 50V X7R 0805\n\
            Footprint: 0805\n\
            Component Type: Capacitor\n\
            Location: C3\n\
            Quantity: 40\n\
            \n\
            Image: IMG_9.jpg\n\
            Component Type: Resistor\n\
            Location:\n";
        let first = parse_records(text).unwrap();
        let written = format_records(&first);
        let second = parse_records(&written).unwrap();
        assert_eq!(first, second);

        // A second rewrite is byte-stable.
        assert_eq!(written, format_records(&second));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("\n\n\n").unwrap().is_empty());
        assert_eq!(format_records(&[]), "");
    }
}
