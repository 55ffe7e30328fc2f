//! Project labels for output file names.

use std::path::Path;

/// Tokens recognised in export file names, in the order they are joined.
pub const PROJECT_TOKENS: &[&str] = &[
    "Delaware", "Eagleford", "Midland", "PDP", "Legacy", "Recent", "Spraberry", "WC", "West", "East",
    "North", "South",
];

/// Derives a short project label from a dataset file name.
///
/// Known tokens found anywhere in the stem (case-insensitively) are joined with
/// `_` in [`PROJECT_TOKENS`] order. Without a match, the stem up to its first
/// `_` is used.
pub fn extract_project_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lowered = stem.to_lowercase();
    let found: Vec<&str> = PROJECT_TOKENS
        .iter()
        .copied()
        .filter(|token| lowered.contains(&token.to_lowercase()))
        .collect();
    if !found.is_empty() {
        return found.join("_");
    }
    match stem.split_once('_') {
        Some((head, _)) => head.to_string(),
        None => stem,
    }
}

/// `<base>[_<tag>]_<project>.csv`
pub fn artifact_name(base: &str, tag: Option<&str>, project: &str) -> String {
    match tag {
        Some(tag) => format!("{base}_{tag}_{project}.csv"),
        None => format!("{base}_{project}.csv"),
    }
}
