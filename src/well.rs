//! Fixed-schema well records and the dataset they are loaded into.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use encoding_rs::Encoding;
use itertools::Itertools;
use log::{info, warn};
use similar::TextDiff;

use crate::{data, io_utils};

pub const WELL_NAME: &str = "Well Name";
pub const API_14: &str = "API 14";
pub const PRODUCTION_METHOD: &str = "Production Method";
pub const PERF_LATERAL_LENGTH: &str = "Perf Lateral Length";
pub const LAST_PROD_DATE: &str = "Last Prod Date Monthly";

/// Columns every export is expected to carry. `Last Prod Date Monthly` is optional.
pub const EXPECTED_COLUMNS: &[&str] = &[WELL_NAME, API_14, PRODUCTION_METHOD, PERF_LATERAL_LENGTH];

const SIMILARITY_THRESHOLD: f32 = 0.8;

/// One row of a well export.
#[derive(Debug, Clone, PartialEq)]
pub struct WellRecord {
    /// 1-based data row (header excluded).
    pub row: usize,
    /// Canonical `API 14` string.
    pub identifier: String,
    pub name: Option<String>,
    pub production_method: Option<String>,
    /// `Perf Lateral Length`, absent when blank or non-numeric.
    pub measure: Option<f64>,
    /// `Last Prod Date Monthly`, absent when blank or unparseable.
    pub production_date: Option<NaiveDate>,
    /// Raw cells in source column order, written back verbatim in artifacts.
    pub fields: Vec<String>,
}

impl WellRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            row: 0,
            identifier: identifier.into(),
            name: None,
            production_method: None,
            measure: None,
            production_date: None,
            fields: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_measure(mut self, measure: f64) -> Self {
        self.measure = Some(measure);
        self
    }

    pub fn with_production_date(mut self, date: NaiveDate) -> Self {
        self.production_date = Some(date);
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Positions of the known columns within a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub identifier: usize,
    pub name: Option<usize>,
    pub production_method: Option<usize>,
    pub measure: Option<usize>,
    pub production_date: Option<usize>,
}

impl ColumnLayout {
    pub fn resolve(headers: &[String]) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let identifier = position(API_14).ok_or_else(|| {
            anyhow!("Column '{API_14}' is required to derive duplicate keys")
        })?;
        Ok(Self {
            identifier,
            name: position(WELL_NAME),
            production_method: position(PRODUCTION_METHOD),
            measure: position(PERF_LATERAL_LENGTH),
            production_date: position(LAST_PROD_DATE),
        })
    }

    pub fn build_record(&self, row: usize, fields: Vec<String>) -> WellRecord {
        let cell = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).map(|s| s.as_str());
        let text = |idx: Option<usize>| {
            cell(idx)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        WellRecord {
            row,
            identifier: data::canonical_identifier(cell(Some(self.identifier)).unwrap_or("")),
            name: text(self.name),
            production_method: text(self.production_method),
            measure: cell(self.measure).and_then(data::parse_measure),
            production_date: cell(self.production_date).and_then(data::parse_production_date),
            fields,
        }
    }
}

/// An expected column that the header row does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumn {
    pub expected: &'static str,
    pub similar: Vec<String>,
}

pub fn missing_columns(headers: &[String]) -> Vec<MissingColumn> {
    EXPECTED_COLUMNS
        .iter()
        .copied()
        .filter(|expected| !headers.iter().any(|h| h.trim() == *expected))
        .map(|expected| MissingColumn {
            expected,
            similar: similar_headers(expected, headers),
        })
        .collect()
}

fn similar_headers(expected: &str, headers: &[String]) -> Vec<String> {
    let wanted = data::normalize_column_name(expected);
    headers
        .iter()
        .filter(|header| {
            let candidate = data::normalize_column_name(header);
            candidate.contains(&wanted)
                || TextDiff::from_chars(wanted.as_str(), candidate.as_str()).ratio()
                    >= SIMILARITY_THRESHOLD
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub layout: ColumnLayout,
    pub records: Vec<WellRecord>,
}

impl Dataset {
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let layout = ColumnLayout::resolve(&headers)?;
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(idx, fields)| layout.build_record(idx + 1, fields))
            .collect();
        Ok(Self {
            headers,
            layout,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record carrying `identifier`. Identifiers are assumed attribute-stable
    /// within one snapshot; later rows with the same identifier are never consulted.
    pub fn find(&self, identifier: &str) -> Option<&WellRecord> {
        self.records.iter().find(|r| r.identifier == identifier)
    }
}

pub fn load_dataset(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Dataset> {
    info!("Loading well data from {path:?}");
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;

    let missing = missing_columns(&headers);
    if !missing.is_empty() {
        warn!(
            "Missing expected column(s): {}",
            missing.iter().map(|m| format!("'{}'", m.expected)).join(", ")
        );
        warn!("Available columns: {}", headers.iter().join(", "));
        for gap in missing.iter().filter(|m| !m.similar.is_empty()) {
            warn!("  Similar to '{}': {}", gap.expected, gap.similar.iter().join(", "));
        }
    }
    if !headers.iter().any(|h| h.trim() == LAST_PROD_DATE) {
        info!("No '{LAST_PROD_DATE}' column; recency tie-breaks will be skipped");
    }

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} in {path:?}", row_idx + 2))?;
        rows.push(io_utils::decode_record(&record, encoding)?);
    }
    let dataset = Dataset::from_rows(headers, rows)
        .with_context(|| format!("Building well records from {path:?}"))?;
    info!("Loaded {} well(s)", dataset.len());
    Ok(dataset)
}

/// Writes `records` under `headers` and returns the number of rows written.
pub fn write_records<'a, I>(
    path: &Path,
    headers: &[String],
    records: I,
    delimiter: u8,
) -> Result<usize>
where
    I: IntoIterator<Item = &'a WellRecord>,
{
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(headers.iter())
        .with_context(|| format!("Writing headers to {path:?}"))?;
    let mut written = 0usize;
    for record in records {
        writer
            .write_record(record.fields.iter())
            .with_context(|| format!("Writing row {} to {path:?}", record.row))?;
        written += 1;
    }
    writer.flush().with_context(|| format!("Flushing {path:?}"))?;
    Ok(written)
}
