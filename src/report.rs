//! Plain-text reports printed at the end of each command.
//!
//! Everything renders to a `String` first so the output can be asserted on in
//! tests; the `print_*` wrappers only write it to stdout.

use std::{borrow::Cow, fmt::Write as _, path::Path};

use crate::{
    engine::Resolution,
    executor::{ExecutionReport, RecordStatus},
    policy::TieBreakPolicy,
    reconcile::{Reconciliation, WellSummary, describe},
    well::Dataset,
};

const RULE_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders rows under a header with a dashed separator, two spaces between columns.
pub fn render_table(headers: &[&str], aligns: &[Align], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths, aligns));
    let separator = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &separator_widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, aligns));
    }
    output
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let cell = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&cell)));
            match aligns.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => format!("{cell}{padding}"),
                Align::Right => format!("{padding}{cell}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{title}\n{rule}\n")
}

/// Table of identifier, name and raw measure, with unresolved identifiers flagged.
pub fn well_table(summaries: &[WellSummary]) -> String {
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.identifier.clone(),
                s.name.clone().unwrap_or_else(|| "(not in dataset)".to_string()),
                s.measure.clone(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(
        &["API 14", "Well Name", "Perf Lateral Length"],
        &[Align::Left, Align::Left, Align::Right],
        &rows,
    )
}

pub fn resolution_summary(
    title: &str,
    dataset: &Dataset,
    resolution: Option<&Resolution<'_>>,
    policy: &TieBreakPolicy,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{title}");
    let _ = writeln!(out, "  Policy: {policy}");
    let _ = writeln!(out, "  Original dataset: {} wells", dataset.len());
    match resolution {
        Some(resolution) => {
            let _ = writeln!(
                out,
                "  Wells with duplicate API10s: {}",
                resolution.duplicate_population()
            );
            let _ = writeln!(out, "  Duplicate groups: {}", resolution.group_count);
            let _ = writeln!(out, "  Wells to keep: {}", resolution.kept.len());
            let _ = writeln!(out, "  Wells to remove: {}", resolution.removed.len());
            if resolution.undecided_groups > 0 {
                let _ = writeln!(
                    out,
                    "  Groups kept whole (no deciding data): {}",
                    resolution.undecided_groups
                );
            }
            if !resolution.collisions.is_empty() {
                let _ = writeln!(
                    out,
                    "  Repeated API 14 rows left out: {}",
                    resolution.collisions.len()
                );
            }
            if !resolution.malformed.is_empty() {
                let _ = writeln!(
                    out,
                    "  Malformed API 14 values skipped: {}",
                    resolution.malformed.len()
                );
            }
        }
        None => {
            let _ = writeln!(out, "  No duplicate API10s found; nothing to remove");
        }
    }
    out
}

/// Labels for the two sides of a comparison.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonLabels<'a> {
    pub a: &'a str,
    pub b: &'a str,
}

pub fn reconciliation_report(
    rec: &Reconciliation,
    dataset: &Dataset,
    labels: ComparisonLabels<'_>,
) -> String {
    let mut out = String::new();
    let _ = write!(out, "\n{}", banner(&format!("COMPARISON: {} vs {}", labels.a, labels.b)));
    let _ = writeln!(out, "\n{} removes {} wells", labels.a, rec.total_a);
    let _ = writeln!(out, "{} removes {} wells", labels.b, rec.total_b);

    let _ = writeln!(out, "\nRemoved by {} but NOT by {}:", labels.a, labels.b);
    let _ = writeln!(out, "Count: {}", rec.only_in_a.len());
    if !rec.only_in_a.is_empty() {
        out.push_str(&well_table(&describe(&rec.only_in_a, dataset)));
    }

    let _ = writeln!(out, "\nNOT removed by {} but removed by {}:", labels.a, labels.b);
    let _ = writeln!(out, "Count: {}", rec.only_in_b.len());
    if !rec.only_in_b.is_empty() {
        out.push_str(&well_table(&describe(&rec.only_in_b, dataset)));
    }

    let _ = writeln!(out, "\nRemoved by BOTH:");
    let _ = writeln!(out, "Count: {}", rec.in_both.len());

    let _ = writeln!(out, "\nAccuracy of {}: {:.1}%", labels.a, rec.accuracy() * 100.0);
    let _ = writeln!(out, "  Correctly removed: {}", rec.in_both.len());
    let _ = writeln!(out, "  Incorrectly removed: {}", rec.only_in_a.len());
    let _ = writeln!(out, "  Missed removals: {}", rec.only_in_b.len());
    out
}

pub fn execution_summary(report: &ExecutionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nProcessed {} well(s)", report.attempted);
    let _ = writeln!(out, "  Removed: {}", report.removed());
    let _ = writeln!(out, "  Removed, not verified: {}", report.unverified());
    let _ = writeln!(out, "  Skipped: {}", report.skipped());
    let problems = report
        .outcomes
        .iter()
        .filter_map(|outcome| match &outcome.status {
            RecordStatus::Removed => None,
            RecordStatus::Unverified { reason } => Some(vec![
                outcome.identifier.clone(),
                "unverified".to_string(),
                reason.clone(),
            ]),
            RecordStatus::Skipped { step, reason } => Some(vec![
                outcome.identifier.clone(),
                format!("skipped at {step}"),
                reason.clone(),
            ]),
        })
        .collect::<Vec<_>>();
    if !problems.is_empty() {
        out.push('\n');
        out.push_str(&render_table(
            &["API 14", "Outcome", "Reason"],
            &[Align::Left, Align::Left, Align::Left],
            &problems,
        ));
    }
    out
}

pub fn files_created(files: &[(&Path, &str)]) -> String {
    let mut out = String::from("\nFiles created:\n");
    for (idx, (path, description)) in files.iter().enumerate() {
        let _ = writeln!(out, "{}. {} - {description}", idx + 1, path.display());
    }
    out
}

pub fn print_report(text: &str) {
    print!("{text}");
}
