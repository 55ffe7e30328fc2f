//! Coercion of raw CSV cells into the typed fields a well record carries.
//!
//! Every conversion here is total: a cell that cannot be interpreted becomes
//! `None` rather than an error, so a single bad value never aborts a run. The
//! tie-break policy treats `None` as "no information" and falls through to the
//! next criterion.

use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    // Exports come from US-hosted tooling, so month-first wins over day-first.
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Parses a `Last Prod Date Monthly` cell. Datetimes keep only their date part.
pub fn parse_production_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_naive_date(trimmed)
        .or_else(|_| parse_naive_datetime(trimmed).map(|dt| dt.date()))
        .ok()
}

/// Parses a `Perf Lateral Length` cell. Non-numeric and non-finite values are absent, never zero.
pub fn parse_measure(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn scientific_notation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d+(\.\d+)?[eE]\+?\d+$").expect("scientific notation pattern is valid")
    })
}

/// Returns the canonical string form of an `API 14` cell.
///
/// Spreadsheet round-trips tend to turn long codes into `4.2123456780001e13`
/// or `42123456780001.0`. Both are expanded back to the plain digit string.
/// Anything already made of digits is returned untouched so leading zeros
/// survive.
pub fn canonical_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.to_string();
    }
    if let Some((whole, fraction)) = trimmed.split_once('.')
        && !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && !fraction.is_empty()
        && fraction.chars().all(|c| c == '0')
    {
        return whole.to_string();
    }
    if scientific_notation().is_match(trimmed)
        && let Ok(parsed) = trimmed.parse::<f64>()
        && parsed.is_finite()
        && parsed.fract() == 0.0
    {
        return format!("{parsed:.0}");
    }
    trimmed.to_string()
}

pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => c,
            _ => '_',
        })
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn format_measure(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_identifier_expands_scientific_notation() {
        assert_eq!(canonical_identifier("4.2123456780001e13"), "42123456780001");
        assert_eq!(canonical_identifier("42123456780001.0"), "42123456780001");
        assert_eq!(canonical_identifier("01234567890001.00"), "01234567890001");
    }

    #[test]
    fn canonical_identifier_preserves_leading_zeros() {
        assert_eq!(canonical_identifier(" 01234567890001 "), "01234567890001");
        assert_eq!(canonical_identifier("ABC-123"), "ABC-123");
    }

    #[test]
    fn parse_measure_coerces_garbage_to_absent() {
        assert_eq!(parse_measure("8123.5"), Some(8123.5));
        assert_eq!(parse_measure(" 500 "), Some(500.0));
        assert_eq!(parse_measure(""), None);
        assert_eq!(parse_measure("n/a"), None);
        assert_eq!(parse_measure("NaN"), None);
        assert_eq!(parse_measure("inf"), None);
    }

    #[test]
    fn parse_measure_rejects_thousands_separators() {
        assert_eq!(parse_measure("7,450"), None);
        assert_eq!(parse_measure("7450"), Some(7450.0));
    }

    #[test]
    fn parse_production_date_supports_dates_and_datetimes() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_production_date("2024-05-01"), Some(expected));
        assert_eq!(parse_production_date("05/01/2024"), Some(expected));
        assert_eq!(parse_production_date("2024-05-01 00:00:00"), Some(expected));
        assert_eq!(parse_production_date("2024-05-01T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_production_date("sometime"), None);
        assert_eq!(parse_production_date("  "), None);
    }

    #[test]
    fn normalize_column_name_replaces_non_alphanumeric() {
        assert_eq!(normalize_column_name("API 14"), "api_14");
        assert_eq!(normalize_column_name("Perf Lateral Length"), "perf_lateral_length");
    }

    #[test]
    fn format_measure_drops_integral_fraction() {
        assert_eq!(format_measure(800.0), "800");
        assert_eq!(format_measure(812.256), "812.26");
    }
}
