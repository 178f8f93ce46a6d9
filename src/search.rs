use anyhow::Result;

use crate::config::Config;
use crate::models::ItemRecord;
use crate::store;

pub fn run_search(
    config: &Config,
    query: &str,
    key: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let records = store::load(&config.paths.store)?;
    let terms = query_terms(query);

    let mut matches: Vec<&ItemRecord> = records
        .iter()
        .filter(|record| record_matches(record, &terms, key))
        .collect();

    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let total = matches.len();
    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    // Store order is stable across runs, so results print deterministically.
    for (i, record) in matches.iter().enumerate() {
        let slot = if record.location.is_empty() {
            "-"
        } else {
            record.location.as_str()
        };
        println!("{}. [{}] {}", i + 1, slot, record.part_number);
        println!("    mpn: {}", record.manufacturer_part_number);
        println!("    description: {}", record.description);
        println!("    type: {}", record.component_type);
        println!("    image: {}", record.image);
        println!();
    }
    if matches.len() < total {
        println!("({} of {} matches shown)", matches.len(), total);
    }

    Ok(())
}

// ============ Matching ============

fn query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Value of the schema or extra field whose key matches, case-insensitive.
fn field_value<'a>(record: &'a ItemRecord, key: &str) -> Option<&'a str> {
    for (name, value) in record.fields() {
        if name.eq_ignore_ascii_case(key) {
            return Some(value);
        }
    }
    record
        .extra
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

/// Every term must occur in some field value (terms pre-lowercased). With a
/// key, every term must occur in that one field.
fn record_matches(record: &ItemRecord, terms: &[String], key: Option<&str>) -> bool {
    match key {
        Some(key) => match field_value(record, key) {
            Some(value) => {
                let haystack = value.to_lowercase();
                terms.iter().all(|term| haystack.contains(term.as_str()))
            }
            None => false,
        },
        None => terms.iter().all(|term| {
            record
                .fields()
                .iter()
                .any(|(_, value)| value.to_lowercase().contains(term.as_str()))
                || record
                    .extra
                    .iter()
                    .any(|(_, value)| value.to_lowercase().contains(term.as_str()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ItemRecord {
        let mut record = ItemRecord::unknown();
        record.image = "IMG_4032.jpg".to_string();
        record.part_number = "399-1096-1-ND".to_string();
        record.manufacturer_part_number = "C0805C104K5RACTU".to_string();
        record.fabricator = "KEMET".to_string();
        record.description = "0.1UF ceramic capacitor".to_string();
        record.footprint = "0805".to_string();
        record.component_type = "Capacitor".to_string();
        record.location = "C3".to_string();
        record
    }

    #[test]
    fn test_all_terms_must_match() {
        let record = sample_record();
        assert!(record_matches(
            &record,
            &query_terms("ceramic capacitor"),
            None
        ));
        assert!(!record_matches(
            &record,
            &query_terms("ceramic tantalum"),
            None
        ));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let record = sample_record();
        assert!(record_matches(&record, &query_terms("kemet"), None));
        assert!(record_matches(&record, &query_terms("0.1uf"), None));
    }

    #[test]
    fn test_terms_can_hit_different_fields() {
        let record = sample_record();
        assert!(record_matches(&record, &query_terms("kemet 0805"), None));
    }

    #[test]
    fn test_key_restricts_match_to_one_field() {
        let record = sample_record();
        assert!(record_matches(
            &record,
            &query_terms("0805"),
            Some("Footprint")
        ));
        assert!(!record_matches(
            &record,
            &query_terms("0805"),
            Some("Description")
        ));
        // Key names match case-insensitively.
        assert!(record_matches(
            &record,
            &query_terms("capacitor"),
            Some("component type")
        ));
    }

    #[test]
    fn test_key_reaches_extra_fields() {
        let mut record = sample_record();
        record.extra.push(("Quantity".to_string(), "25".to_string()));
        assert!(record_matches(&record, &query_terms("25"), Some("Quantity")));
        assert!(record_matches(&record, &query_terms("25"), None));
    }

    #[test]
    fn test_unknown_key_matches_nothing() {
        let record = sample_record();
        assert!(!record_matches(
            &record,
            &query_terms("0805"),
            Some("Supplier")
        ));
    }
}
