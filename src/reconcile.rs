//! Comparison of two removal decisions over the same dataset.
//!
//! Both sides are reduced to sets of `API 14` identifiers. The agreement rate
//! is directional: it measures how many of side A's removals side B also
//! makes, so A should be the method under review and B the reference.

use std::collections::BTreeSet;

use crate::{
    data,
    well::{Dataset, WellRecord},
};

pub fn identifier_set<'a, I>(records: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a WellRecord>,
{
    records.into_iter().map(|r| r.identifier.clone()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub total_a: usize,
    pub total_b: usize,
    pub only_in_a: BTreeSet<String>,
    pub only_in_b: BTreeSet<String>,
    pub in_both: BTreeSet<String>,
}

impl Reconciliation {
    /// `|in_both| / |A|`, or 0 when A removes nothing.
    pub fn accuracy(&self) -> f64 {
        if self.total_a == 0 {
            0.0
        } else {
            self.in_both.len() as f64 / self.total_a as f64
        }
    }

    pub fn is_identical(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty()
    }
}

pub fn reconcile(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Reconciliation {
    Reconciliation {
        total_a: a.len(),
        total_b: b.len(),
        only_in_a: a.difference(b).cloned().collect(),
        only_in_b: b.difference(a).cloned().collect(),
        in_both: a.intersection(b).cloned().collect(),
    }
}

/// Human-readable attributes of one identifier, looked up in the source dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellSummary {
    pub identifier: String,
    /// `None` when the identifier does not occur in the dataset.
    pub name: Option<String>,
    pub measure: String,
}

impl WellSummary {
    pub fn is_resolved(&self) -> bool {
        self.name.is_some()
    }
}

/// Looks each identifier up by first match; see [`Dataset::find`].
pub fn describe<'i, I>(identifiers: I, dataset: &Dataset) -> Vec<WellSummary>
where
    I: IntoIterator<Item = &'i String>,
{
    identifiers
        .into_iter()
        .map(|identifier| match dataset.find(identifier) {
            Some(record) => WellSummary {
                identifier: identifier.clone(),
                name: Some(record.display_name().to_string()),
                measure: raw_measure(dataset, record),
            },
            None => WellSummary {
                identifier: identifier.clone(),
                name: None,
                measure: String::new(),
            },
        })
        .collect()
}

fn raw_measure(dataset: &Dataset, record: &WellRecord) -> String {
    dataset
        .layout
        .measure
        .and_then(|idx| record.fields.get(idx))
        .map(|s| s.trim().to_string())
        .or_else(|| record.measure.map(data::format_measure))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reconcile_splits_differences_and_overlap() {
        let old = set(&["A", "B", "C", "D"]);
        let new = set(&["C", "D", "E"]);
        let result = reconcile(&old, &new);
        assert_eq!(result.only_in_a, set(&["A", "B"]));
        assert_eq!(result.only_in_b, set(&["E"]));
        assert_eq!(result.in_both, set(&["C", "D"]));
        assert!((result.accuracy() - 0.5).abs() < f64::EPSILON);
        assert!(!result.is_identical());
    }

    #[test]
    fn accuracy_is_zero_for_empty_baseline() {
        let result = reconcile(&BTreeSet::new(), &set(&["A"]));
        assert_eq!(result.accuracy(), 0.0);
    }

    #[test]
    fn describe_uses_raw_measure_and_flags_unknown_ids() {
        let dataset = Dataset::from_rows(
            vec!["API 14".into(), "Well Name".into(), "Perf Lateral Length".into()],
            vec![
                vec!["42123456780001".into(), "SMITH 1H".into(), "7,450".into()],
                vec!["42123456780001".into(), "SMITH 1H RE".into(), "7460".into()],
            ],
        )
        .unwrap();
        let ids = set(&["42123456780001", "42999999990000"]);
        let summaries = describe(&ids, &dataset);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name.as_deref(), Some("SMITH 1H"));
        assert_eq!(summaries[0].measure, "7,450");
        assert!(!summaries[1].is_resolved());
    }
}
