//! Storage-slot bookkeeping: per-prefix namespaces and the greedy
//! assignment algorithm.
//!
//! Both [`SlotNamespace`] and [`SeenIdentifiers`] are explicit values
//! threaded through reconciliation, never module state. Within a run a
//! namespace only grows; a number is never reissued while the record
//! holding it lives in the store.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ItemRecord, SlotId, UNKNOWN};

/// Integers already allocated under each prefix.
#[derive(Debug, Clone, Default)]
pub struct SlotNamespace {
    used: BTreeMap<char, BTreeSet<u32>>,
}

impl SlotNamespace {
    pub fn new() -> Self {
        SlotNamespace::default()
    }

    /// Seed from the existing store: every `Location` value that parses as a
    /// slot marks its number used. Unparseable locations contribute nothing,
    /// matching how the original seeding scan skipped them.
    pub fn from_records(records: &[ItemRecord]) -> Self {
        let mut namespace = SlotNamespace::new();
        for record in records {
            if let Some(slot) = record.slot() {
                namespace.observe(slot);
            }
        }
        namespace
    }

    /// Mark a slot used, regardless of the configured capacity. Legacy
    /// labels beyond the bound still must never be reissued.
    pub fn observe(&mut self, slot: SlotId) {
        self.used
            .entry(slot.prefix)
            .or_default()
            .insert(slot.number);
    }

    /// Assign the next slot under `prefix` with numbers bounded to
    /// `1..=capacity`:
    ///
    /// 1. nothing used yet → 1
    /// 2. otherwise `max(used) + 1` when it stays within capacity
    /// 3. otherwise the smallest free number in range (hole filling)
    /// 4. otherwise `None` — the prefix is exhausted
    ///
    /// The chosen number is marked used immediately so assignments within
    /// one run never collide.
    pub fn assign(&mut self, prefix: char, capacity: u32) -> Option<SlotId> {
        let used = self.used.entry(prefix).or_default();
        let chosen = match used.iter().next_back() {
            None => Some(1),
            Some(&highest) => {
                let candidate = highest.saturating_add(1);
                if candidate <= capacity {
                    Some(candidate)
                } else {
                    (1..=capacity).find(|n| !used.contains(n))
                }
            }
        };
        let number = chosen?;
        used.insert(number);
        Some(SlotId { prefix, number })
    }

    /// Prefixes and their allocated numbers, in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &BTreeSet<u32>)> {
        self.used.iter().map(|(prefix, numbers)| (*prefix, numbers))
    }
}

/// Item identifiers already represented in the store.
#[derive(Debug, Clone, Default)]
pub struct SeenIdentifiers {
    ids: BTreeSet<String>,
}

impl SeenIdentifiers {
    pub fn from_records(records: &[ItemRecord]) -> Self {
        let mut seen = SeenIdentifiers::default();
        for record in records {
            if let Some(id) = record.item_id() {
                seen.insert(id);
            }
        }
        seen
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true when the id was not present before.
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Derive the slot prefix from a component type: case-insensitive substring
/// "capacitor" → `C`, "resistor" → `R`, otherwise the first character of the
/// trimmed string uppercased; empty (or the unextracted sentinel) → `X`.
pub fn prefix_for(component_type: &str) -> char {
    let trimmed = component_type.trim();
    let lower = trimmed.to_lowercase();
    if lower.contains("capacitor") {
        return 'C';
    }
    if lower.contains("resistor") {
        return 'R';
    }
    if trimmed == UNKNOWN {
        return 'X';
    }
    match trimmed.chars().next() {
        Some(first) => first.to_uppercase().next().unwrap_or(first),
        None => 'X',
    }
}
