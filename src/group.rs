//! Partitioning of well records into duplicate groups by derived key.

use std::collections::BTreeMap;

use crate::{
    key::{DerivedKey, KeyError, derive_key},
    well::WellRecord,
};

/// Records sharing one derived key. Always holds at least two members.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: DerivedKey,
    /// Members in input order.
    pub members: Vec<&'a WellRecord>,
}

impl Group<'_> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    /// Duplicate groups ordered by key.
    pub groups: Vec<Group<'a>>,
    /// Records whose key occurs exactly once, ordered by key.
    pub singletons: Vec<&'a WellRecord>,
    /// Records whose identifier cannot produce a key.
    pub malformed: Vec<(&'a WellRecord, KeyError)>,
}

impl<'a> Partition<'a> {
    /// Every record that belongs to some duplicate group, in group order.
    pub fn duplicates(&self) -> impl Iterator<Item = &'a WellRecord> + '_ {
        self.groups.iter().flat_map(|g| g.members.iter().copied())
    }

    pub fn duplicate_population(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }
}

pub fn partition<'a, I>(records: I) -> Partition<'a>
where
    I: IntoIterator<Item = &'a WellRecord>,
{
    let mut by_key: BTreeMap<DerivedKey, Vec<&'a WellRecord>> = BTreeMap::new();
    let mut malformed = Vec::new();
    for record in records {
        match derive_key(&record.identifier) {
            Ok(key) => by_key.entry(key).or_default().push(record),
            Err(err) => malformed.push((record, err)),
        }
    }

    let mut result = Partition {
        malformed,
        ..Partition::default()
    };
    for (key, members) in by_key {
        if members.len() >= 2 {
            result.groups.push(Group { key, members });
        } else {
            result.singletons.extend(members);
        }
    }
    result
}
