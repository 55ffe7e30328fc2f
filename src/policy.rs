//! Tie-break policies that pick the canonical well(s) of a duplicate group.
//!
//! A layered policy evaluates its criteria in order. Each criterion either
//! narrows the candidate set to a strict, non-empty subset or is skipped,
//! in which case the candidates pass through untouched. When every criterion
//! is skipped the whole group is kept: the data cannot say which well is the
//! duplicate, so nothing is deleted for that key.
//!
//! The legacy policy reproduces the historical "drop anything ending in 0000"
//! rule. It exists so its decisions can be compared against the layered
//! policies, not as a recommended way to resolve duplicates.

use std::fmt;

use log::{debug, warn};

use crate::{group::Group, well::WellRecord};

/// Identifier suffix that marks a placeholder completion code.
pub const RESERVED_SUFFIX: &str = "0000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    /// Keep the most recent `Last Prod Date Monthly`.
    Recency,
    /// Keep the longest `Perf Lateral Length`.
    Magnitude,
    /// Prefer identifiers that do not end in [`RESERVED_SUFFIX`].
    SuffixExclusion,
}

impl Criterion {
    /// Narrows `candidates`, or returns `None` when this criterion cannot discriminate.
    pub fn narrow<'a>(self, candidates: &[&'a WellRecord]) -> Option<Vec<&'a WellRecord>> {
        let narrowed: Vec<&'a WellRecord> = match self {
            Criterion::Recency => {
                let latest = candidates.iter().filter_map(|r| r.production_date).max()?;
                candidates
                    .iter()
                    .copied()
                    .filter(|r| r.production_date == Some(latest))
                    .collect()
            }
            Criterion::Magnitude => {
                let longest = candidates
                    .iter()
                    .filter_map(|r| r.measure)
                    .max_by(f64::total_cmp)?;
                candidates
                    .iter()
                    .copied()
                    .filter(|r| r.measure == Some(longest))
                    .collect()
            }
            Criterion::SuffixExclusion => candidates
                .iter()
                .copied()
                .filter(|r| !has_reserved_suffix(r))
                .collect(),
        };
        (!narrowed.is_empty() && narrowed.len() < candidates.len()).then_some(narrowed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Criterion::Recency => "most recent Last Prod Date Monthly",
            Criterion::Magnitude => "highest Perf Lateral Length",
            Criterion::SuffixExclusion => "API 14 not ending in '0000'",
        }
    }
}

pub fn has_reserved_suffix(record: &WellRecord) -> bool {
    record.identifier.ends_with(RESERVED_SUFFIX)
}

/// Canonical subset chosen for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub kept: Vec<&'a WellRecord>,
    /// Criteria that actually narrowed the candidates, in evaluation order.
    pub deciding: Vec<Criterion>,
}

impl Selection<'_> {
    /// True when no criterion could discriminate and the whole group was kept.
    pub fn is_undecided(&self) -> bool {
        self.deciding.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TieBreakPolicy {
    Layered(Vec<Criterion>),
    /// Discard `...0000` identifiers; keep the first member when all of them match.
    LegacySuffix,
}

impl TieBreakPolicy {
    /// Recency, then magnitude, then suffix exclusion.
    pub fn full() -> Self {
        TieBreakPolicy::Layered(vec![
            Criterion::Recency,
            Criterion::Magnitude,
            Criterion::SuffixExclusion,
        ])
    }

    pub fn magnitude() -> Self {
        TieBreakPolicy::Layered(vec![Criterion::Magnitude])
    }

    pub fn legacy() -> Self {
        TieBreakPolicy::LegacySuffix
    }

    pub fn select<'a>(&self, group: &Group<'a>) -> Selection<'a> {
        match self {
            TieBreakPolicy::Layered(criteria) => {
                let mut candidates = group.members.clone();
                let mut deciding = Vec::new();
                for criterion in criteria {
                    if let Some(narrowed) = criterion.narrow(&candidates) {
                        debug!(
                            "API10 {}: {} narrowed {} -> {}",
                            group.key,
                            criterion.label(),
                            candidates.len(),
                            narrowed.len()
                        );
                        candidates = narrowed;
                        deciding.push(*criterion);
                    }
                }
                Selection {
                    kept: candidates,
                    deciding,
                }
            }
            TieBreakPolicy::LegacySuffix => {
                let kept: Vec<&'a WellRecord> = group
                    .members
                    .iter()
                    .copied()
                    .filter(|r| !has_reserved_suffix(r))
                    .collect();
                if kept.is_empty() {
                    warn!(
                        "All wells for API10 {} end in {RESERVED_SUFFIX}, keeping first one",
                        group.key
                    );
                    Selection {
                        kept: group.members.iter().take(1).copied().collect(),
                        deciding: vec![Criterion::SuffixExclusion],
                    }
                } else {
                    let deciding = if kept.len() < group.len() {
                        vec![Criterion::SuffixExclusion]
                    } else {
                        Vec::new()
                    };
                    Selection { kept, deciding }
                }
            }
        }
    }
}

impl fmt::Display for TieBreakPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreakPolicy::Layered(criteria) => {
                for (idx, criterion) in criteria.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" > ")?;
                    }
                    f.write_str(criterion.label())?;
                }
                Ok(())
            }
            TieBreakPolicy::LegacySuffix => f.write_str("discard API 14 ending in '0000'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_key;
    use chrono::NaiveDate;

    fn group<'a>(members: &'a [WellRecord]) -> Group<'a> {
        Group {
            key: derive_key(&members[0].identifier).unwrap(),
            members: members.iter().collect(),
        }
    }

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn kept_ids(selection: &Selection<'_>) -> Vec<String> {
        selection.kept.iter().map(|r| r.identifier.clone()).collect()
    }

    #[test]
    fn magnitude_keeps_longest_lateral() {
        let wells = vec![
            WellRecord::new("01234567890001").with_measure(500.0),
            WellRecord::new("01234567890000").with_measure(800.0),
        ];
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890000"]);
        assert_eq!(selection.deciding, vec![Criterion::Magnitude]);
    }

    #[test]
    fn suffix_breaks_equal_measures() {
        let wells = vec![
            WellRecord::new("01234567890000").with_measure(500.0),
            WellRecord::new("01234567890001").with_measure(500.0),
        ];
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890001"]);
        assert_eq!(selection.deciding, vec![Criterion::SuffixExclusion]);
    }

    #[test]
    fn recency_outranks_magnitude() {
        let wells = vec![
            WellRecord::new("01234567890001")
                .with_measure(9000.0)
                .with_production_date(date(2021, 3)),
            WellRecord::new("01234567890002")
                .with_measure(4000.0)
                .with_production_date(date(2024, 6)),
        ];
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890002"]);
        assert_eq!(selection.deciding, vec![Criterion::Recency]);
    }

    #[test]
    fn undated_wells_lose_to_dated_ones() {
        let wells = vec![
            WellRecord::new("01234567890001").with_measure(9000.0),
            WellRecord::new("01234567890002")
                .with_measure(4000.0)
                .with_production_date(date(2019, 1)),
        ];
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890002"]);
    }

    #[test]
    fn signed_zero_laterals_tie() {
        let wells = vec![
            WellRecord::new("01234567890000").with_measure(-0.0),
            WellRecord::new("01234567890001").with_measure(0.0),
        ];
        assert!(Criterion::Magnitude.narrow(&group(&wells).members).is_none());
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890001"]);
        assert_eq!(selection.deciding, vec![Criterion::SuffixExclusion]);
    }

    #[test]
    fn magnitude_runs_only_on_recency_survivors() {
        let wells = vec![
            WellRecord::new("01234567890001")
                .with_measure(300.0)
                .with_production_date(date(2024, 6)),
            WellRecord::new("01234567890002")
                .with_measure(700.0)
                .with_production_date(date(2024, 6)),
            WellRecord::new("01234567890003")
                .with_measure(9000.0)
                .with_production_date(date(2020, 1)),
        ];
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890002"]);
        assert_eq!(
            selection.deciding,
            vec![Criterion::Recency, Criterion::Magnitude]
        );
    }

    #[test]
    fn all_reserved_suffix_keeps_every_tied_candidate() {
        // 15-character codes so two distinct identifiers can share a key and the suffix.
        let wells = vec![
            WellRecord::new("012345678900000").with_measure(500.0),
            WellRecord::new("012345678910000").with_measure(500.0),
        ];
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(selection.kept.len(), 2);
        assert!(selection.is_undecided());
    }

    #[test]
    fn no_information_keeps_whole_group() {
        let wells = vec![
            WellRecord::new("01234567890001"),
            WellRecord::new("01234567890002"),
        ];
        let selection = TieBreakPolicy::full().select(&group(&wells));
        assert_eq!(selection.kept.len(), 2);
        assert!(selection.is_undecided());
    }

    #[test]
    fn absent_measures_do_not_count_as_zero() {
        let wells = vec![
            WellRecord::new("01234567890001"),
            WellRecord::new("01234567890002").with_measure(0.0),
        ];
        let selection = TieBreakPolicy::magnitude().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890002"]);
    }

    #[test]
    fn magnitude_only_policy_ignores_suffix() {
        let wells = vec![
            WellRecord::new("01234567890000").with_measure(500.0),
            WellRecord::new("01234567890001").with_measure(500.0),
        ];
        let selection = TieBreakPolicy::magnitude().select(&group(&wells));
        assert_eq!(selection.kept.len(), 2);
    }

    #[test]
    fn legacy_discards_reserved_suffix() {
        let wells = vec![
            WellRecord::new("01234567890000").with_measure(800.0),
            WellRecord::new("01234567890001").with_measure(500.0),
        ];
        let selection = TieBreakPolicy::legacy().select(&group(&wells));
        assert_eq!(kept_ids(&selection), vec!["01234567890001"]);
    }

    #[test]
    fn legacy_keeps_exactly_one_when_all_reserved() {
        let wells = vec![
            WellRecord::new("012345678900000"),
            WellRecord::new("012345678910000"),
            WellRecord::new("012345678920000"),
        ];
        let selection = TieBreakPolicy::legacy().select(&group(&wells));
        assert_eq!(selection.kept.len(), 1);
    }

    #[test]
    fn display_lists_criteria_in_order() {
        assert_eq!(
            TieBreakPolicy::full().to_string(),
            "most recent Last Prod Date Monthly > highest Perf Lateral Length > API 14 not ending in '0000'"
        );
    }
}
