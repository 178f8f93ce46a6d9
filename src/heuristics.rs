//! Offline field extraction by keyword heuristics.
//!
//! [`RulesExtractor`] recovers a usable subset of the structured fields from
//! raw OCR text with plain string matching: distributor part numbers end in
//! `-ND`, manufacturer part numbers are long alphanumeric tokens, component
//! types follow unit keywords, manufacturers and footprints come from fixed
//! lists. It makes no network calls, so it also powers the integration tests.
//!
//! The heuristics are deliberately conservative. A field the rules cannot
//! recover is left as `"unknown"` rather than guessed, matching the
//! partial-field contract of the other extraction providers.

use anyhow::Result;
use async_trait::async_trait;

use crate::blockfile::split_blocks;
use crate::extract::FieldExtractor;
use crate::models::ItemRecord;

/// Manufacturer names recognized on distributor labels.
const MANUFACTURERS: &[&str] = &[
    "MURATA",
    "PANASONIC",
    "TAIYO",
    "SAMSUNG",
    "KEMET",
    "NICHICON",
    "TDK",
    "VISHAY",
    "YAGEO",
    "KOA",
    "ON",
    "STMICROELECTRONICS",
    "ROHM",
    "AVX",
    "BOURNS",
    "EPCOS",
    "TE",
    "AMPHENOL",
    "MOLEX",
    "LITTELFUSE",
];

/// Package footprints recognized on labels. Checked in order; the first
/// substring hit wins, so the bare `SOT` entry shadows the dashed variants.
const FOOTPRINTS: &[&str] = &[
    "0201", "0402", "0603", "0805", "1206", "1210", "1812", "2220", "QFN", "DFN", "SOT", "SOT-23",
    "SOT-89", "SOT-223", "SOIC", "TSSOP", "MSOP", "LQFP", "BGA", "CSP", "TQFP", "DIP",
];

/// Extractor that derives fields from raw OCR text without a model.
///
/// Produces one record per raw block. Selected by
/// `extraction.provider = "rules"` in the configuration.
pub struct RulesExtractor;

#[async_trait]
impl FieldExtractor for RulesExtractor {
    fn name(&self) -> &str {
        "rules"
    }

    async fn extract(&self, chunk: &str) -> Result<Vec<ItemRecord>> {
        Ok(split_blocks(chunk)
            .iter()
            .filter_map(|block| record_from_ocr(block))
            .collect())
    }
}

/// Derive one record from a single raw OCR block.
///
/// Returns `None` when the block carries no OCR text to classify.
fn record_from_ocr(block: &str) -> Option<ItemRecord> {
    let mut image = String::new();
    let mut body: Vec<&str> = Vec::new();

    for line in block.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Image:") {
            if image.is_empty() {
                image = rest.trim().to_string();
            }
        } else if line.starts_with("Extracted Text:") || line.starts_with("Location:") {
            // Capture-script label lines, no fields in them
            continue;
        } else {
            body.push(line);
        }
    }

    let combined = body.join(" ");
    if combined.trim().is_empty() {
        return None;
    }

    let mut record = ItemRecord::unknown();
    if !image.is_empty() {
        record.image = image;
    }
    record.component_type = classify(&combined);

    let tokens: Vec<&str> = combined.split_whitespace().map(clean).collect();

    if let Some(pn) = tokens.iter().copied().find(|tok| is_part_number(tok)) {
        record.part_number = pn.to_string();
    }
    if let Some(mpn) = find_mfg_part_number(&tokens, &record.part_number) {
        record.manufacturer_part_number = mpn.to_string();
    }
    if let Some(mfg) = find_manufacturer(&tokens) {
        record.fabricator = mfg.to_string();
    }
    if let Some(fp) = FOOTPRINTS.iter().find(|fp| combined.contains(**fp)) {
        record.footprint = (*fp).to_string();
    }
    if let Some(value) = capacitance_value(&tokens).or_else(|| resistance_value(&tokens)) {
        record.description = value;
    }

    Some(record)
}

/// Classify the component type from the combined OCR text.
///
/// `IC` must appear as a standalone token (case-sensitive, so `ic` in prose
/// does not match); `CONN` matches any casing. `OHM` is a plain substring
/// test, capacitance needs a digits-plus-unit token.
fn classify(combined: &str) -> String {
    if has_token(combined, "IC", true) {
        return "IC".to_string();
    }
    if has_token(combined, "CONN", false) {
        return "Connector".to_string();
    }
    if combined.contains("OHM") {
        return "Resistor".to_string();
    }
    let tokens: Vec<&str> = combined.split_whitespace().map(clean).collect();
    if capacitance_value(&tokens).is_some() {
        return "Capacitor".to_string();
    }
    "Other".to_string()
}

/// True when `word` appears as a standalone token, with token boundaries at
/// every non-alphanumeric character.
fn has_token(text: &str, word: &str, case_sensitive: bool) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric()).any(|tok| {
        if case_sensitive {
            tok == word
        } else {
            tok.eq_ignore_ascii_case(word)
        }
    })
}

/// Strip punctuation from the edges of a whitespace token, keeping interior
/// and edge dashes so part numbers survive intact.
fn clean(tok: &str) -> &str {
    tok.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
}

/// Distributor part numbers: at least six word characters before an `-ND`
/// suffix.
fn is_part_number(tok: &str) -> bool {
    match tok.strip_suffix("-ND") {
        Some(prefix) => {
            prefix.len() >= 6
                && tok
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    }
}

/// Manufacturer part numbers: long alphanumeric-and-dash tokens carrying
/// both letters and digits, excluding distributor part numbers.
fn find_mfg_part_number<'a>(tokens: &[&'a str], part_number: &str) -> Option<&'a str> {
    tokens.iter().copied().find(|tok| {
        tok.len() >= 12
            && tok.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && tok.chars().any(|c| c.is_ascii_alphabetic())
            && tok.chars().any(|c| c.is_ascii_digit())
            && !is_part_number(tok)
            && *tok != part_number
    })
}

/// Match a token against the manufacturer list, case-insensitively. Returns
/// the token as it appears in the text.
fn find_manufacturer<'a>(tokens: &[&'a str]) -> Option<&'a str> {
    tokens
        .iter()
        .copied()
        .find(|tok| MANUFACTURERS.iter().any(|m| tok.eq_ignore_ascii_case(m)))
}

/// Find a capacitance reading: digits (optionally with a decimal point)
/// fused to a uF/nF/pF unit, any casing.
fn capacitance_value(tokens: &[&str]) -> Option<String> {
    for tok in tokens {
        if !tok.is_ascii() || tok.len() < 3 {
            continue;
        }
        let (prefix, unit) = tok.split_at(tok.len() - 2);
        let unit_known = unit.eq_ignore_ascii_case("uF")
            || unit.eq_ignore_ascii_case("nF")
            || unit.eq_ignore_ascii_case("pF");
        if unit_known
            && prefix.chars().all(|c| c.is_ascii_digit() || c == '.')
            && prefix.chars().any(|c| c.is_ascii_digit())
        {
            return Some((*tok).to_string());
        }
    }
    None
}

/// Find a resistance reading: a number followed by OHM, either fused into
/// one token or split across two.
fn resistance_value(tokens: &[&str]) -> Option<String> {
    for (i, tok) in tokens.iter().enumerate() {
        if !tok.is_ascii() {
            continue;
        }
        if tok.eq_ignore_ascii_case("OHM") {
            if i > 0 && tokens[i - 1].starts_with(|c: char| c.is_ascii_digit()) {
                return Some(format!("{} OHM", tokens[i - 1]));
            }
            continue;
        }
        let upper = tok.to_ascii_uppercase();
        if let Some(prefix) = upper.strip_suffix("OHM") {
            if prefix.starts_with(|c: char| c.is_ascii_digit()) {
                return Some((*tok).to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN;

    #[tokio::test]
    async fn test_rules_resistor_block() {
        let chunk = "Image: IMG_4032.jpg\nExtracted Text:\n297-11433-1-ND\nRES 325 OHM 1% 1/4W 0805\nYAGEO";
        let records = RulesExtractor.extract(chunk).await.unwrap();
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.image, "IMG_4032.jpg");
        assert_eq!(r.component_type, "Resistor");
        assert_eq!(r.part_number, "297-11433-1-ND");
        assert_eq!(r.manufacturer_part_number, UNKNOWN);
        assert_eq!(r.fabricator, "YAGEO");
        assert_eq!(r.footprint, "0805");
        assert_eq!(r.description, "325 OHM");
        assert!(r.location.is_empty());
    }

    #[tokio::test]
    async fn test_rules_capacitor_block() {
        let chunk = "Image: IMG_4033.jpg\nExtracted Text:\nCAP CER 0.1UF 50V X7R 0603\nGRM188R71H104KA93D\nMURATA";
        let records = RulesExtractor.extract(chunk).await.unwrap();
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.component_type, "Capacitor");
        assert_eq!(r.manufacturer_part_number, "GRM188R71H104KA93D");
        assert_eq!(r.fabricator, "MURATA");
        assert_eq!(r.footprint, "0603");
        assert_eq!(r.description, "0.1UF");
    }

    #[tokio::test]
    async fn test_rules_ic_and_connector_blocks() {
        let records = RulesExtractor
            .extract("IC REG LINEAR 3.3V SOT-223\n\nCONN HEADER VERT 4POS TIN")
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].component_type, "IC");
        assert_eq!(records[0].footprint, "SOT");
        assert_eq!(records[1].component_type, "Connector");
        assert_eq!(records[1].image, UNKNOWN);
    }

    #[tokio::test]
    async fn test_rules_skips_empty_block() {
        let records = RulesExtractor
            .extract("Image: IMG_9999.jpg\nExtracted Text:")
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_ic_token_is_exact() {
        assert_eq!(classify("MICROCHIP 123"), "Other");
        assert_eq!(classify("LOGIC GATE"), "Other");
        assert_eq!(classify("IC,REG BUCK 3A"), "IC");
        assert_eq!(classify("ic reg"), "Other");
    }

    #[test]
    fn test_bare_f_is_not_a_capacitor() {
        assert_eq!(classify("FUSE 2A FAST"), "Other");
        assert_eq!(classify("CAP 10uF"), "Capacitor");
        assert_eq!(classify("CAP 470pf"), "Capacitor");
    }

    #[test]
    fn test_part_number_shape() {
        assert!(is_part_number("297-11433-1-ND"));
        assert!(is_part_number("P5555CT-ND"));
        assert!(!is_part_number("1-ND"));
        assert!(!is_part_number("297-11433-1"));
    }

    #[test]
    fn test_mfg_part_number_needs_letters_and_digits() {
        let tokens = ["123456789012", "ABCDEFGHIJKL", "GRM188R71H104KA93D"];
        assert_eq!(
            find_mfg_part_number(&tokens, UNKNOWN),
            Some("GRM188R71H104KA93D")
        );
    }

    #[test]
    fn test_mfg_part_number_skips_distributor_number() {
        let tokens = ["297-11433-1-ND"];
        assert_eq!(find_mfg_part_number(&tokens, "297-11433-1-ND"), None);
    }

    #[test]
    fn test_resistance_value_two_token_form() {
        let tokens = ["RES", "4.7K", "OHM", "5%"];
        assert_eq!(resistance_value(&tokens), Some("4.7K OHM".to_string()));
    }
}
