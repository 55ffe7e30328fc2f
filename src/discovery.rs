//! Locating candidate input files in a directory.
//!
//! Classification works on file names only, so it can be tested without
//! touching the file system. [`discover_candidates`] is the thin wrapper that
//! lists a directory.

use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant, SystemTime},
};

use anyhow::{Context, Result, bail};
use log::{debug, info};

use crate::{io_utils, well};

/// Names containing any of these are removal artifacts, not datasets.
pub const DELETION_KEYWORDS: &[&str] = &["deleted", "removed", "duplicate"];
/// A dataset name must contain one of these.
pub const DATASET_KEYWORDS: &[&str] = &["well", "delaware", "eagleford", "midland"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub datasets: Vec<PathBuf>,
    pub deletion_files: Vec<PathBuf>,
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn lowered_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn is_deletion_file(path: &Path) -> bool {
    let name = lowered_name(path);
    DELETION_KEYWORDS.iter().any(|k| name.contains(k))
}

pub fn is_dataset_file(path: &Path) -> bool {
    let name = lowered_name(path);
    !is_deletion_file(path) && DATASET_KEYWORDS.iter().any(|k| name.contains(k))
}

/// Splits `paths` into dataset and deletion candidates, each sorted and deduplicated.
pub fn classify<I>(paths: I) -> Candidates
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut candidates = Candidates::default();
    for path in paths.into_iter().filter(|p| is_csv(p)) {
        if is_deletion_file(&path) {
            candidates.deletion_files.push(path);
        } else if is_dataset_file(&path) {
            candidates.datasets.push(path);
        }
    }
    for list in [&mut candidates.datasets, &mut candidates.deletion_files] {
        list.sort();
        list.dedup();
    }
    candidates
}

pub fn discover_candidates(dir: &Path) -> Result<Candidates> {
    let entries = fs::read_dir(dir).with_context(|| format!("Listing directory {dir:?}"))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Reading entry in {dir:?}"))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            paths.push(entry.path());
        }
    }
    let candidates = classify(paths);
    debug!(
        "Discovered {} dataset(s) and {} deletion file(s) in {dir:?}",
        candidates.datasets.len(),
        candidates.deletion_files.len()
    );
    Ok(candidates)
}

/// Most recently modified `.csv` in `dir` whose name starts with `prefix`.
pub fn newest_export(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir).with_context(|| format!("Listing directory {dir:?}"))? {
        let entry = entry?;
        let path = entry.path();
        let matches = is_csv(&path)
            && path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with(prefix))
                .unwrap_or(false);
        if !matches {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Waits up to `max_wait` for an export matching `prefix` whose header row can be read.
pub fn wait_for_export(
    dir: &Path,
    prefix: &str,
    max_wait: Duration,
    poll: Duration,
) -> Result<PathBuf> {
    let deadline = Instant::now() + max_wait;
    let mut last_seen: Option<PathBuf> = None;
    loop {
        match newest_export(dir, prefix)? {
            Some(path) => {
                if last_seen.as_ref() != Some(&path) {
                    info!("Found export {path:?}");
                    last_seen = Some(path.clone());
                }
                match header_readable(&path) {
                    Ok(()) => return Ok(path),
                    Err(err) => debug!("Export {path:?} not ready yet: {err:#}"),
                }
            }
            None => debug!("No export matching '{prefix}*.csv' in {dir:?} yet"),
        }
        if Instant::now() >= deadline {
            bail!(
                "No readable export matching '{prefix}*.csv' appeared in {dir:?} within {max_wait:?}"
            );
        }
        thread::sleep(poll);
    }
}

fn header_readable(path: &Path) -> Result<()> {
    let mut reader = io_utils::open_csv_reader_from_path(path, io_utils::DEFAULT_CSV_DELIMITER)?;
    let headers = io_utils::reader_headers(&mut reader, encoding_rs::UTF_8)?;
    if !headers.iter().any(|h| h.trim() == well::API_14) {
        bail!("header row has no '{}' column", well::API_14);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn classify_separates_datasets_from_deletion_files() {
        let candidates = classify(paths(&[
            "Midland_wells.csv",
            "duplicate wells deleted perf length.csv",
            "notes.txt",
            "budget.csv",
            "Eagleford_export.CSV",
            "Midland_wells.csv",
            "wells_removed_by_old_method_PDP.csv",
        ]));
        assert_eq!(
            candidates.datasets,
            paths(&["Eagleford_export.CSV", "Midland_wells.csv"])
        );
        assert_eq!(
            candidates.deletion_files,
            paths(&[
                "duplicate wells deleted perf length.csv",
                "wells_removed_by_old_method_PDP.csv"
            ])
        );
    }

    #[test]
    fn deletion_keyword_beats_dataset_keyword() {
        assert!(!is_dataset_file(Path::new("wells_deleted.csv")));
        assert!(is_deletion_file(Path::new("wells_deleted.csv")));
    }
}
