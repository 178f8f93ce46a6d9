//! Duplicate reconciliation: records that name the same physical part are
//! forced to share one storage slot.
//!
//! The pass scans the entire store on every run (never incrementally),
//! grouping by exact `part_number` equality and separately by exact
//! `manufacturer_part_number` equality. In any group with more than one
//! member, the first member by store order wins and its location overwrites
//! the others'. "Earliest wins" is asserted policy, not derived — kept as
//! the original behavior pending confirmation.
//!
//! Empty and `"unknown"` values never form groups: exact-equality grouping
//! of the sentinel would merge every record with an unextracted part number
//! into one slot.

use std::collections::BTreeMap;

use crate::models::{ItemRecord, UNKNOWN};

/// What the pass did. The store rewrite is gated on `needs_rewrite`, which
/// per the original contract is "any group of size > 1 was found" — not
/// "something changed".
#[derive(Debug, Default)]
pub struct DedupOutcome {
    /// Groups with more than one member, across both key passes.
    pub groups: usize,
    /// Records whose location was actually overwritten.
    pub changed: usize,
    /// Group keys whose winning member had no slot assigned; the empty
    /// location propagates to the whole group. Reported, not fatal.
    pub empty_groups: Vec<String>,
}

impl DedupOutcome {
    pub fn needs_rewrite(&self) -> bool {
        self.groups > 0
    }
}

/// Run both grouping passes over the full store in place.
pub fn reconcile_duplicates(records: &mut [ItemRecord]) -> DedupOutcome {
    let mut outcome = DedupOutcome::default();
    merge_groups(records, |r| &r.part_number, &mut outcome);
    merge_groups(records, |r| &r.manufacturer_part_number, &mut outcome);
    outcome
}

fn merge_groups<F>(records: &mut [ItemRecord], key: F, outcome: &mut DedupOutcome)
where
    F: Fn(&ItemRecord) -> &String,
{
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        let value = key(record);
        if groupable(value) {
            groups.entry(value.clone()).or_default().push(index);
        }
    }

    for (value, members) in groups {
        if members.len() < 2 {
            continue;
        }
        outcome.groups += 1;

        let winner = records[members[0]].location.clone();
        if winner.trim().is_empty() {
            outcome.empty_groups.push(value);
        }
        for &index in &members[1..] {
            if records[index].location != winner {
                records[index].location = winner.clone();
                outcome.changed += 1;
            }
        }
    }
}

fn groupable(value: &str) -> bool {
    !value.trim().is_empty() && value != UNKNOWN
}
