//! Duplicate resolution over a whole dataset.
//!
//! `resolve` derives keys, partitions the records, applies the tie-break
//! policy to each group, and splits the duplicate population into `kept` and
//! `removed`. Removal is computed as a set difference on [`CompositeKey`]
//! rather than by position, so the caller may reorder or filter either side
//! without invalidating the other.

use std::{collections::HashSet, ptr};

use log::{debug, info, warn};

use crate::{
    group::partition,
    key::{DerivedKey, KeyError},
    policy::TieBreakPolicy,
    well::WellRecord,
};

/// `derived_key + "_" + identifier`, the membership token for set subtraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn new(key: &DerivedKey, record: &WellRecord) -> Self {
        CompositeKey(format!("{key}_{}", record.identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Canonical wells, group by group.
    pub kept: Vec<&'a WellRecord>,
    /// Redundant wells, in group order.
    pub removed: Vec<&'a WellRecord>,
    /// Rows whose `API 14` repeats a kept well in the same group. The set
    /// difference drops them from both sides.
    pub collisions: Vec<&'a WellRecord>,
    pub group_count: usize,
    /// Groups where no criterion could discriminate; all of their members are kept.
    pub undecided_groups: usize,
    pub malformed: Vec<(&'a WellRecord, KeyError)>,
    population: usize,
}

impl Resolution<'_> {
    /// Every record sharing a derived key with another, collisions included.
    pub fn duplicate_population(&self) -> usize {
        self.population
    }
}

/// Resolves duplicates among `records`. Returns `None` when no derived key repeats.
pub fn resolve<'a, I>(records: I, policy: &TieBreakPolicy) -> Option<Resolution<'a>>
where
    I: IntoIterator<Item = &'a WellRecord>,
{
    let partition = partition(records);
    for (record, err) in &partition.malformed {
        warn!("Skipping row {}: {err}", record.row);
    }
    if partition.groups.is_empty() {
        info!("No duplicate API10s found");
        return None;
    }

    let population = partition.duplicate_population();
    info!(
        "Found {population} well(s) with duplicate API10s across {} group(s); {} unique well(s) untouched",
        partition.groups.len(),
        partition.singletons.len()
    );

    let mut kept = Vec::new();
    let mut kept_keys = HashSet::new();
    let mut chosen = Vec::with_capacity(partition.groups.len());
    let mut undecided_groups = 0usize;
    for group in &partition.groups {
        let selection = policy.select(group);
        if selection.is_undecided() && selection.kept.len() == group.len() {
            debug!("API10 {}: insufficient information, keeping all {}", group.key, group.len());
            undecided_groups += 1;
        }
        for &record in &selection.kept {
            kept_keys.insert(CompositeKey::new(&group.key, record));
            kept.push(record);
        }
        chosen.push(selection.kept);
    }

    let mut removed = Vec::with_capacity(population.saturating_sub(kept.len()));
    let mut collisions = Vec::new();
    for (group, selected) in partition.groups.iter().zip(&chosen) {
        for &record in &group.members {
            if selected.iter().any(|k| ptr::eq(*k, record)) {
                continue;
            }
            if kept_keys.contains(&CompositeKey::new(&group.key, record)) {
                warn!(
                    "Row {}: API 14 {} repeats a kept well under API10 {}; it is neither kept nor removed",
                    record.row, record.identifier, group.key
                );
                collisions.push(record);
            } else {
                removed.push(record);
            }
        }
    }

    Some(Resolution {
        kept,
        removed,
        collisions,
        group_count: partition.groups.len(),
        undecided_groups,
        malformed: partition.malformed,
        population,
    })
}
