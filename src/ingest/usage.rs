//! JSON usage loader.
//!
//! Expected file shape (one file per export chunk):
//!
//! ```json
//! {"response": {"data": [{"period": "2024-01-05T03", "value": 1234.5}, ...]}}
//! ```
//!
//! Files without the `response.data` array are skipped with a recorded file
//! error; the remaining files still aggregate. Per-entry problems downgrade
//! to missing values (bad `value`) or dropped rows (bad `period`), both
//! visible in the load report.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{FileError, RowError, UsageRow};
use crate::error::AppError;
use crate::ingest::{Loaded, list_files};

/// Fixed timestamp format of the usage export: `YYYY-MM-DDTHH`.
const PERIOD_DATE_LEN: usize = 10;

/// Load and flatten every usage JSON file under `dir`.
///
/// An empty directory (or one where every file fails) returns an empty row
/// set with the errors in the report, never an `Err`.
pub fn load_usage_dir(dir: &Path) -> Result<Loaded<UsageRow>, AppError> {
    let _span = tracing::info_span!("usage_loader", dir = %dir.display()).entered();

    let files = list_files(dir, "json")?;
    let mut out = Loaded {
        rows: Vec::new(),
        report: Default::default(),
    };
    out.report.files_seen = files.len();

    for path in &files {
        match load_usage_file(path, &mut out) {
            Ok(()) => out.report.files_loaded += 1,
            Err(cause) => {
                warn!(file = %path.display(), %cause, "skipping usage file");
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
        dropped = out.report.rows_read - out.report.rows_used,
        "usage load complete"
    );
    Ok(out)
}

fn load_usage_file(path: &Path, out: &mut Loaded<UsageRow>) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("unreadable file: {e}"))?;
    let value: Value = serde_json::from_str(&text).map_err(|e| format!("invalid JSON: {e}"))?;

    let entries = value
        .get("response")
        .and_then(|r| r.get("data"))
        .and_then(|d| d.as_array())
        .ok_or_else(|| "missing `response.data` array".to_string())?;

    for (idx, entry) in entries.iter().enumerate() {
        out.report.rows_read += 1;

        let period = entry.get("period").and_then(|p| p.as_str());
        let Some(ts) = period.and_then(parse_hourly_timestamp) else {
            out.report.row_errors.push(RowError {
                file: path.to_path_buf(),
                line: idx,
                message: format!("invalid `period`: {:?}", period.unwrap_or("<absent>")),
            });
            continue;
        };

        // Unparsable values become missing readings, not dropped rows; the
        // preprocessor decides what to do with them.
        let usage = entry.get("value").and_then(coerce_numeric);

        out.rows.push(UsageRow { ts, usage });
    }

    Ok(())
}

/// Parse the export's `YYYY-MM-DDTHH` period into an hourly timestamp.
///
/// Minutes/seconds are always zero: usage data is hourly by construction.
fn parse_hourly_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    let (date_part, hour_part) = s.split_at_checked(PERIOD_DATE_LEN)?;
    let hour_part = hour_part.strip_prefix('T')?;

    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let hour: u32 = hour_part.parse().ok()?;
    date.and_hms_opt(hour, 0, 0)
}

/// Coerce a JSON value to f64: numbers pass through, numeric strings parse,
/// everything else is missing.
fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn parses_hourly_periods() {
        let ts = parse_hourly_timestamp("2024-01-05T03").unwrap();
        assert_eq!(ts.to_string(), "2024-01-05 03:00:00");
        assert!(parse_hourly_timestamp("2024-01-05").is_none());
        assert!(parse_hourly_timestamp("2024-13-05T03").is_none());
        assert!(parse_hourly_timestamp("2024-01-05T25").is_none());
        assert!(parse_hourly_timestamp("garbage").is_none());
    }

    #[test]
    fn empty_directory_returns_empty_rows_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_usage_dir(dir.path()).unwrap();
        assert!(loaded.rows.is_empty());
        assert_eq!(loaded.report.files_seen, 0);
    }

    #[test]
    fn wrong_shape_is_skipped_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.json", r#"{"data": []}"#);
        write(
            dir.path(),
            "good.json",
            r#"{"response": {"data": [{"period": "2024-01-05T03", "value": 10.5}]}}"#,
        );

        let loaded = load_usage_dir(dir.path()).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.report.files_loaded, 1);
        assert_eq!(loaded.report.file_errors.len(), 1);
        assert!(loaded.report.file_errors[0].cause.contains("response.data"));
    }

    #[test]
    fn string_values_coerce_and_garbage_becomes_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "mix.json",
            r#"{"response": {"data": [
                {"period": "2024-01-05T03", "value": "12.25"},
                {"period": "2024-01-05T04", "value": "n/a"},
                {"period": "not-a-period", "value": 5.0}
            ]}}"#,
        );

        let loaded = load_usage_dir(dir.path()).unwrap();
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.rows[0].usage, Some(12.25));
        assert_eq!(loaded.rows[1].usage, None);
        assert_eq!(loaded.report.row_errors.len(), 1);
    }

    #[test]
    fn invalid_json_file_is_reported_but_loading_continues() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.json", "{not json");
        write(
            dir.path(),
            "ok.json",
            r#"{"response": {"data": [{"period": "2024-02-01T00", "value": 1.0}]}}"#,
        );

        let loaded = load_usage_dir(dir.path()).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.report.file_errors.len(), 1);
    }
}
