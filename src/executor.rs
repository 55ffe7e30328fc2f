//! Sequential removal of wells through the remote well table.
//!
//! Each identifier walks `Search → Locate → Select → RequestRemoval →
//! Confirm → VerifyGone`. Every step that waits on the UI has its own bound.
//! A step that misses its bound skips that well only; the loop always moves on
//! to the next identifier. The single exception is `Search`: without the
//! filter input nothing else can work, so that failure ends the run.
//!
//! A verification timeout is reported as [`RecordStatus::Unverified`] and not
//! retried. The removal was confirmed, and the row may simply be slow to
//! leave the grid.

use std::{fmt, time::Duration};

use log::{info, warn};
use thiserror::Error;

use crate::webdriver::WebDriverError;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("{what} not ready within {timeout:?}")]
    Timeout { what: String, timeout: Duration },
    #[error(transparent)]
    Driver(#[from] WebDriverError),
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(
        "filter input unavailable while searching for API 14 {identifier} \
         ({removed} well(s) removed before the abort)",
        removed = .partial.removed()
    )]
    FilterUnavailable {
        identifier: String,
        /// Outcomes of the wells handled before the abort.
        partial: ExecutionReport,
        #[source]
        source: UiError,
    },
}

impl ExecutorError {
    pub fn partial(&self) -> &ExecutionReport {
        match self {
            ExecutorError::FilterUnavailable { partial, .. } => partial,
        }
    }
}

/// The four affordances the executor needs from the remote application.
pub trait WellTable {
    /// Handle to a located row, passed back to [`WellTable::select_row`].
    type Row;

    /// Types `identifier` into the filter input and submits it.
    fn submit_filter(&mut self, identifier: &str, timeout: Duration) -> Result<(), UiError>;
    /// Waits for a clickable element showing `identifier`.
    fn locate_row(&mut self, identifier: &str, timeout: Duration) -> Result<Self::Row, UiError>;
    /// Clicks the row enclosing a located element.
    fn select_row(&mut self, row: &Self::Row) -> Result<(), UiError>;
    /// Waits for and clicks the "Remove Wells" action.
    fn request_removal(&mut self, timeout: Duration) -> Result<(), UiError>;
    /// Waits for and clicks the confirmation dialog's "Remove" action.
    fn confirm_removal(&mut self, timeout: Duration) -> Result<(), UiError>;
    /// Waits for the element showing `identifier` to disappear.
    fn wait_until_gone(&mut self, identifier: &str, timeout: Duration) -> Result<(), UiError>;
}

impl<T: WellTable + ?Sized> WellTable for &mut T {
    type Row = T::Row;

    fn submit_filter(&mut self, identifier: &str, timeout: Duration) -> Result<(), UiError> {
        (**self).submit_filter(identifier, timeout)
    }

    fn locate_row(&mut self, identifier: &str, timeout: Duration) -> Result<Self::Row, UiError> {
        (**self).locate_row(identifier, timeout)
    }

    fn select_row(&mut self, row: &Self::Row) -> Result<(), UiError> {
        (**self).select_row(row)
    }

    fn request_removal(&mut self, timeout: Duration) -> Result<(), UiError> {
        (**self).request_removal(timeout)
    }

    fn confirm_removal(&mut self, timeout: Duration) -> Result<(), UiError> {
        (**self).confirm_removal(timeout)
    }

    fn wait_until_gone(&mut self, identifier: &str, timeout: Duration) -> Result<(), UiError> {
        (**self).wait_until_gone(identifier, timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Search,
    Locate,
    Select,
    RequestRemoval,
    Confirm,
    VerifyGone,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::Search => "search",
            Step::Locate => "locate row",
            Step::Select => "select row",
            Step::RequestRemoval => "click Remove Wells",
            Step::Confirm => "confirm removal",
            Step::VerifyGone => "verify removal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    pub filter: Duration,
    pub locate: Duration,
    pub remove_action: Duration,
    pub confirm: Duration,
    pub verify: Duration,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        let ten = Duration::from_secs(10);
        Self {
            filter: ten,
            locate: ten,
            remove_action: ten,
            confirm: ten,
            verify: ten,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Removed,
    /// Removal was confirmed but the row did not disappear in time.
    Unverified { reason: String },
    Skipped { step: Step, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub identifier: String,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Identifiers the executor started on, whatever their outcome.
    pub attempted: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl ExecutionReport {
    pub fn removed(&self) -> usize {
        self.count(|s| matches!(s, RecordStatus::Removed))
    }

    pub fn unverified(&self) -> usize {
        self.count(|s| matches!(s, RecordStatus::Unverified { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, RecordStatus::Skipped { .. }))
    }

    fn count(&self, predicate: impl Fn(&RecordStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

pub struct DeletionExecutor<T: WellTable> {
    table: T,
    timeouts: StepTimeouts,
}

impl<T: WellTable> DeletionExecutor<T> {
    pub fn new(table: T, timeouts: StepTimeouts) -> Self {
        Self { table, timeouts }
    }

    pub fn into_inner(self) -> T {
        self.table
    }

    /// Removes each identifier in order and reports what happened to every one of them.
    pub fn run(&mut self, identifiers: &[String]) -> Result<ExecutionReport, ExecutorError> {
        let total = identifiers.len();
        info!("Starting removal of {total} duplicate well(s)");
        let mut report = ExecutionReport::default();

        for (idx, identifier) in identifiers.iter().enumerate() {
            let position = idx + 1;
            info!("Processing well {position}/{total}: API 14 {identifier}");
            let status = match self.remove_one(identifier) {
                Ok(status) => status,
                Err(source) => {
                    warn!(
                        "Aborting after {} of {total} well(s): {} removed, {} unverified, {} skipped",
                        report.attempted,
                        report.removed(),
                        report.unverified(),
                        report.skipped()
                    );
                    return Err(ExecutorError::FilterUnavailable {
                        identifier: identifier.clone(),
                        partial: report,
                        source,
                    });
                }
            };
            report.attempted += 1;
            match &status {
                RecordStatus::Removed => {
                    info!("  ✓ Removed API 14: {identifier} ({position}/{total})")
                }
                RecordStatus::Unverified { reason } => {
                    info!("  ✓ Removed API 14: {identifier} ({position}/{total})");
                    warn!("  Row for API 14 {identifier} did not disappear as expected: {reason}");
                }
                RecordStatus::Skipped { step, reason } => {
                    warn!("  Could not {step} for API 14 {identifier}: {reason}");
                }
            }
            report.outcomes.push(RecordOutcome {
                identifier: identifier.clone(),
                status,
            });
        }

        info!(
            "✓ Completed! Processed {} duplicate well(s): {} removed, {} unverified, {} skipped",
            report.attempted,
            report.removed(),
            report.unverified(),
            report.skipped()
        );
        Ok(report)
    }

    /// Outcome for one well. `Err` only when the search filter itself fails.
    fn remove_one(&mut self, identifier: &str) -> Result<RecordStatus, UiError> {
        let timeouts = self.timeouts;
        self.table.submit_filter(identifier, timeouts.filter)?;

        let skipped = |step: Step, err: UiError| RecordStatus::Skipped {
            step,
            reason: err.to_string(),
        };

        let row = match self.table.locate_row(identifier, timeouts.locate) {
            Ok(row) => row,
            Err(err) => return Ok(skipped(Step::Locate, err)),
        };
        if let Err(err) = self.table.select_row(&row) {
            return Ok(skipped(Step::Select, err));
        }
        if let Err(err) = self.table.request_removal(timeouts.remove_action) {
            return Ok(skipped(Step::RequestRemoval, err));
        }
        if let Err(err) = self.table.confirm_removal(timeouts.confirm) {
            return Ok(skipped(Step::Confirm, err));
        }
        match self.table.wait_until_gone(identifier, timeouts.verify) {
            Ok(()) => Ok(RecordStatus::Removed),
            Err(err) => Ok(RecordStatus::Unverified {
                reason: err.to_string(),
            }),
        }
    }
}
