//! CSV weather loader.
//!
//! Weather exports are messier than the usage JSON:
//! - headers vary in case and may carry a UTF-8 BOM
//! - the `date` column sometimes embeds a time-of-day suffix
//!   (`2024-01-05T00:00` or `2024-01-05 00:00:00`)
//! - individual lines can be malformed
//!
//! So the reader is flexible: bad records are collected as row errors instead
//! of aborting the file, and the date field is truncated to its first 10
//! characters before parsing. Files whose header lacks `date` or
//! `temperature_2m` are skipped entirely (recorded as file errors).

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{FileError, RowError, WeatherRow};
use crate::error::AppError;
use crate::ingest::{Loaded, list_files};

const DATE_COLUMN: &str = "date";
const TEMPERATURE_COLUMN: &str = "temperature_2m";

/// ISO date prefix length used when truncating embedded time suffixes.
const DATE_PREFIX_LEN: usize = 10;

/// Load and concatenate every weather CSV file under `dir`.
pub fn load_weather_dir(dir: &Path) -> Result<Loaded<WeatherRow>, AppError> {
    let _span = tracing::info_span!("weather_loader", dir = %dir.display()).entered();

    let files = list_files(dir, "csv")?;
    let mut out = Loaded {
        rows: Vec::new(),
        report: Default::default(),
    };
    out.report.files_seen = files.len();

    for path in &files {
        match load_weather_file(path, &mut out) {
            Ok(()) => out.report.files_loaded += 1,
            Err(cause) => {
                warn!(file = %path.display(), %cause, "skipping weather file");
                out.report.file_errors.push(FileError {
                    path: path.clone(),
                    cause,
                });
            }
        }
    }

    out.report.rows_used = out.rows.len();
    debug!(
        files = out.report.files_loaded,
        rows = out.report.rows_used,
        "weather load complete"
    );
    Ok(out)
}

fn load_weather_file(path: &Path, out: &mut Loaded<WeatherRow>) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("unreadable file: {e}"))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| format!("failed to read CSV headers: {e}"))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = *header_map
        .get(DATE_COLUMN)
        .ok_or_else(|| format!("missing required column `{DATE_COLUMN}`"))?;
    let temp_idx = *header_map
        .get(TEMPERATURE_COLUMN)
        .ok_or_else(|| format!("missing required column `{TEMPERATURE_COLUMN}`"))?;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        out.report.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.report.row_errors.push(RowError {
                    file: path.to_path_buf(),
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let raw_date = record.get(date_idx).map(str::trim).unwrap_or("");
        let Some(date) = parse_truncated_date(raw_date) else {
            out.report.row_errors.push(RowError {
                file: path.to_path_buf(),
                line,
                message: format!("invalid date '{raw_date}'"),
            });
            continue;
        };

        let temperature = record
            .get(temp_idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        out.rows.push(WeatherRow { date, temperature });
    }

    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿date"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Truncate to the first 10 characters and parse as an ISO date.
///
/// Handles `2024-01-05`, `2024-01-05T13:00`, and `2024-01-05 13:00:00` alike.
fn parse_truncated_date(s: &str) -> Option<NaiveDate> {
    if s.len() < DATE_PREFIX_LEN {
        return None;
    }
    let (prefix, _) = s.split_at_checked(DATE_PREFIX_LEN)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn truncates_time_suffixes_before_parsing() {
        assert_eq!(
            parse_truncated_date("2024-01-05T13:00").unwrap().to_string(),
            "2024-01-05"
        );
        assert_eq!(
            parse_truncated_date("2024-01-05 00:00:00").unwrap().to_string(),
            "2024-01-05"
        );
        assert!(parse_truncated_date("05/01/2024").is_none());
        assert!(parse_truncated_date("").is_none());
    }

    #[test]
    fn file_without_required_columns_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "wrong.csv", "day,humidity\n2024-01-05,80\n");
        write(
            dir.path(),
            "right.csv",
            "date,temperature_2m\n2024-01-05,3.2\n2024-01-06,4.1\n",
        );

        let loaded = load_weather_dir(dir.path()).unwrap();
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.report.file_errors.len(), 1);
        assert!(loaded.report.file_errors[0].cause.contains("date"));
    }

    #[test]
    fn header_case_and_bom_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "bom.csv",
            "\u{feff}Date,Temperature_2m\n2024-02-01T00:00,1.5\n",
        );

        let loaded = load_weather_dir(dir.path()).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.rows[0].temperature, Some(1.5));
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "messy.csv",
            "date,temperature_2m\nnot-a-date,3.0\n2024-03-01,abc\n2024-03-02,7.25\n",
        );

        let loaded = load_weather_dir(dir.path()).unwrap();
        // Bad date row dropped; bad temperature becomes a missing reading.
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.rows[0].temperature, None);
        assert_eq!(loaded.rows[1].temperature, Some(7.25));
        assert_eq!(loaded.report.row_errors.len(), 1);
    }

    #[test]
    fn empty_directory_returns_empty_rows() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_weather_dir(dir.path()).unwrap();
        assert!(loaded.rows.is_empty());
    }
}
