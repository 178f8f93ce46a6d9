//! Core data models for the stockroom pipeline.
//!
//! These types represent the raw OCR blocks, structured inventory records,
//! and storage-slot identifiers that flow through reconciliation.

use std::fmt;

/// Sentinel value stored for fields the extractor could not produce.
pub const UNKNOWN: &str = "unknown";

/// Record keys as they appear in the store file, in canonical write order.
pub const KEY_IMAGE: &str = "Image";
pub const KEY_PART_NUMBER: &str = "Part number";
pub const KEY_MANUFACTURER_PART_NUMBER: &str = "Manufacturer Part number";
pub const KEY_FABRICATOR: &str = "Fabricated Company";
pub const KEY_DESCRIPTION: &str = "Description";
pub const KEY_FOOTPRINT: &str = "Footprint";
pub const KEY_COMPONENT_TYPE: &str = "Component Type";
pub const KEY_LOCATION: &str = "Location";

/// One OCR-extracted text unit tied to a source image, read from the raw log.
///
/// Blocks are immutable once logged; the raw log is append-only and never
/// edited or rewritten by this tool.
#[derive(Debug, Clone)]
pub struct RawBlock {
    /// First whitespace-delimited token of the block's `Image:` value,
    /// if the block has one. Blocks without it are never matched against
    /// the store by identity.
    pub item_id: Option<String>,
    /// The block text, verbatim.
    pub text: String,
}

/// A storage-box location label: a single alphabetic prefix plus a number,
/// rendered as e.g. `C17`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId {
    pub prefix: char,
    pub number: u32,
}

impl SlotId {
    /// Parse a `C17`-style label: one ASCII letter (normalized to uppercase)
    /// followed by digits. Anything else is not a slot id and is left to the
    /// caller as raw text.
    pub fn parse(s: &str) -> Option<SlotId> {
        let s = s.trim();
        let mut chars = s.chars();
        let first = chars.next()?;
        if !first.is_ascii_alphabetic() {
            return None;
        }
        let rest = chars.as_str();
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = rest.parse().ok()?;
        Some(SlotId {
            prefix: first.to_ascii_uppercase(),
            number,
        })
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

/// The parsed, schema-conformant inventory entry.
///
/// Fields other than `location` are set once at extraction time and never
/// mutated; `location` may be rewritten by the duplicate-reconciliation
/// pass. Fields the extractor could not fill hold [`UNKNOWN`]. Keys found in
/// a stored block that are not part of the schema are carried in `extra` so
/// a rewrite never drops data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub image: String,
    pub part_number: String,
    pub manufacturer_part_number: String,
    pub fabricator: String,
    pub description: String,
    pub footprint: String,
    pub component_type: String,
    /// Raw `Location` value. Usually a [`SlotId`] rendering, but empty when
    /// assignment failed and preserved verbatim when unparseable.
    pub location: String,
    /// Unrecognized `Key: Value` pairs, in original order.
    pub extra: Vec<(String, String)>,
}

impl ItemRecord {
    /// A record with every schema field set to [`UNKNOWN`] and no location.
    pub fn unknown() -> Self {
        ItemRecord {
            image: UNKNOWN.to_string(),
            part_number: UNKNOWN.to_string(),
            manufacturer_part_number: UNKNOWN.to_string(),
            fabricator: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
            footprint: UNKNOWN.to_string(),
            component_type: UNKNOWN.to_string(),
            location: String::new(),
            extra: Vec::new(),
        }
    }

    /// Identity token used for the incremental diff: the first
    /// whitespace-delimited token of the `Image` value.
    pub fn item_id(&self) -> Option<&str> {
        let id = self.image.split_whitespace().next()?;
        if id == UNKNOWN {
            return None;
        }
        Some(id)
    }

    /// The record's slot, when `location` parses as one.
    pub fn slot(&self) -> Option<SlotId> {
        SlotId::parse(&self.location)
    }

    /// Schema fields in canonical order, paired with their store keys.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            (KEY_IMAGE, self.image.as_str()),
            (KEY_PART_NUMBER, self.part_number.as_str()),
            (KEY_MANUFACTURER_PART_NUMBER, self.manufacturer_part_number.as_str()),
            (KEY_FABRICATOR, self.fabricator.as_str()),
            (KEY_DESCRIPTION, self.description.as_str()),
            (KEY_FOOTPRINT, self.footprint.as_str()),
            (KEY_COMPONENT_TYPE, self.component_type.as_str()),
            (KEY_LOCATION, self.location.as_str()),
        ]
    }
}
