mod common;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use proptest::collection::btree_map;
use proptest::option;
use proptest::prelude::*;
use well_dedup::engine::resolve;
use well_dedup::policy::TieBreakPolicy;
use well_dedup::well::WellRecord;

use common::well;

fn rows(records: &[&WellRecord]) -> BTreeSet<usize> {
    records.iter().map(|r| r.row).collect()
}

fn ids(records: &[&WellRecord]) -> Vec<String> {
    records.iter().map(|r| r.identifier.clone()).collect()
}

/// Unique identifiers spread over a handful of keys, with frequent ties and gaps.
fn dataset() -> impl Strategy<Value = Vec<WellRecord>> {
    btree_map(
        (0u32..6, prop_oneof![Just(0u32), 1u32..20]),
        (option::of(0u32..5), option::of(1u32..5)),
        0..40,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(idx, ((key, suffix), (measure, month)))| {
                let mut record =
                    WellRecord::new(format!("42{key:08}{suffix:04}")).with_row(idx + 1);
                if let Some(m) = measure {
                    record = record.with_measure(f64::from(m) * 100.0);
                }
                if let Some(month) = month {
                    record = record
                        .with_production_date(NaiveDate::from_ymd_opt(2023, month, 1).unwrap());
                }
                record
            })
            .collect()
    })
}

fn duplicate_rows(records: &[WellRecord]) -> BTreeSet<usize> {
    let mut by_key: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for record in records {
        by_key.entry(&record.identifier[..10]).or_default().push(record.row);
    }
    by_key
        .into_values()
        .filter(|rows| rows.len() >= 2)
        .flatten()
        .collect()
}

fn policies() -> impl Strategy<Value = TieBreakPolicy> {
    prop_oneof![
        Just(TieBreakPolicy::full()),
        Just(TieBreakPolicy::magnitude()),
        Just(TieBreakPolicy::legacy()),
    ]
}

proptest! {
    #[test]
    fn kept_and_removed_partition_the_duplicates(records in dataset(), policy in policies()) {
        let expected = duplicate_rows(&records);
        match resolve(&records, &policy) {
            None => prop_assert!(expected.is_empty()),
            Some(resolution) => {
                let kept = rows(&resolution.kept);
                let removed = rows(&resolution.removed);
                prop_assert!(kept.is_disjoint(&removed));
                prop_assert_eq!(kept.union(&removed).copied().collect::<BTreeSet<_>>(), expected.clone());
                prop_assert!(resolution.collisions.is_empty());
                prop_assert_eq!(resolution.duplicate_population(), expected.len());
            }
        }
    }

    #[test]
    fn magnitude_keeps_only_the_longest_laterals(records in dataset()) {
        let Some(resolution) = resolve(&records, &TieBreakPolicy::magnitude()) else {
            return Ok(());
        };
        for kept in &resolution.kept {
            let key = &kept.identifier[..10];
            let longest = records
                .iter()
                .filter(|r| &r.identifier[..10] == key)
                .filter_map(|r| r.measure)
                .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));
            if let Some(longest) = longest {
                prop_assert_eq!(kept.measure, Some(longest));
            }
        }
    }

    #[test]
    fn full_policy_keeps_the_longest_lateral_among_the_latest(records in dataset()) {
        let Some(resolution) = resolve(&records, &TieBreakPolicy::full()) else {
            return Ok(());
        };
        for kept in &resolution.kept {
            let key = &kept.identifier[..10];
            let group = records
                .iter()
                .filter(|r| &r.identifier[..10] == key)
                .collect::<Vec<_>>();
            let latest = group.iter().filter_map(|r| r.production_date).max();
            if latest.is_some() {
                prop_assert_eq!(kept.production_date, latest);
            }
            let longest = group
                .iter()
                .filter(|r| latest.is_none() || r.production_date == latest)
                .filter_map(|r| r.measure)
                .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));
            if let Some(longest) = longest {
                prop_assert_eq!(kept.measure, Some(longest));
            }
        }
    }

    #[test]
    fn resolving_twice_gives_the_same_answer(records in dataset(), policy in policies()) {
        let first = resolve(&records, &policy).map(|r| (ids(&r.kept), ids(&r.removed)));
        let second = resolve(&records, &policy).map(|r| (ids(&r.kept), ids(&r.removed)));
        prop_assert_eq!(first, second);
    }
}

#[test]
fn longer_lateral_survives() {
    let records = vec![
        well("01234567890001", Some(500.0)),
        well("01234567890000", Some(800.0)),
    ];
    let resolution = resolve(&records, &TieBreakPolicy::full()).unwrap();
    assert_eq!(ids(&resolution.kept), vec!["01234567890000"]);
    assert_eq!(ids(&resolution.removed), vec!["01234567890001"]);
}

#[test]
fn equal_laterals_drop_the_reserved_suffix() {
    let records = vec![
        well("01234567890000", Some(500.0)),
        well("01234567890001", Some(500.0)),
    ];
    let resolution = resolve(&records, &TieBreakPolicy::full()).unwrap();
    assert_eq!(ids(&resolution.kept), vec!["01234567890001"]);
    assert_eq!(ids(&resolution.removed), vec!["01234567890000"]);
}

#[test]
fn unique_keys_are_never_touched() {
    let records = vec![
        well("01234567890001", Some(500.0)),
        well("01234567890002", Some(700.0)),
        well("98765432100001", Some(100.0)),
    ];
    let resolution = resolve(&records, &TieBreakPolicy::full()).unwrap();
    let all = ids(&resolution.kept)
        .into_iter()
        .chain(ids(&resolution.removed))
        .collect::<Vec<_>>();
    assert!(!all.contains(&"98765432100001".to_string()));
}

#[test]
fn legacy_keeps_one_survivor_when_every_identifier_is_reserved() {
    let records = vec![
        well("012345678900000", None),
        well("012345678910000", None),
    ];
    let resolution = resolve(&records, &TieBreakPolicy::legacy()).unwrap();
    assert_eq!(resolution.kept.len(), 1);
    assert_eq!(resolution.removed.len(), 1);
}

#[test]
fn layered_policy_keeps_all_reserved_ties() {
    let records = vec![
        well("012345678900000", Some(500.0)),
        well("012345678910000", Some(500.0)),
    ];
    let resolution = resolve(&records, &TieBreakPolicy::full()).unwrap();
    assert_eq!(resolution.kept.len(), 2);
    assert!(resolution.removed.is_empty());
    assert_eq!(resolution.undecided_groups, 1);
}

#[test]
fn malformed_identifiers_are_reported_not_grouped() {
    let records = vec![
        well("0123", Some(1.0)),
        well("01234567890001", Some(500.0)),
        well("01234567890002", Some(700.0)),
    ];
    let resolution = resolve(&records, &TieBreakPolicy::magnitude()).unwrap();
    assert_eq!(resolution.malformed.len(), 1);
    assert_eq!(resolution.malformed[0].0.identifier, "0123");
    assert_eq!(resolution.duplicate_population(), 2);
}
