#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use well_dedup::well::WellRecord;

pub const HEADER: &str =
    "Well Name,API 14,Production Method,Perf Lateral Length,Last Prod Date Monthly";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Copies a fixture from `tests/data` into the workspace.
    pub fn copy_fixture(&self, name: &str) -> PathBuf {
        let target = self.temp_dir.path().join(name);
        fs::copy(fixture_path(name), &target).expect("copy fixture");
        target
    }

    /// Writes a well export with the standard header and the given data lines.
    pub fn write_export(&self, name: &str, lines: &[&str]) -> PathBuf {
        let mut contents = String::from(HEADER);
        for line in lines {
            contents.push('\n');
            contents.push_str(line);
        }
        contents.push('\n');
        self.write(name, &contents)
    }
}

/// `API 14` column of a written artifact, in file order.
pub fn identifiers_in(path: &Path) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).expect("open artifact");
    let headers = reader.headers().expect("headers").clone();
    let column = headers
        .iter()
        .position(|h| h == "API 14")
        .expect("API 14 column");
    reader
        .records()
        .map(|r| r.expect("row")[column].to_string())
        .collect()
}

pub fn well(identifier: &str, measure: Option<f64>) -> WellRecord {
    let record = WellRecord::new(identifier);
    match measure {
        Some(value) => record.with_measure(value),
        None => record,
    }
}
