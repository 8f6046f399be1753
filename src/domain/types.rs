//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during cleaning and modeling
//! - exported to CSV
//! - handed to the presentation layer (TUI or batch report) as-is

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Tagged result threaded through every pipeline stage.
///
/// The pipeline distinguishes three non-panicking outcomes:
/// - `Ready(data)`: the stage produced a usable result
/// - `Empty`: there was nothing to work on (empty directory, empty upstream)
/// - `Failed(cause)`: the stage hit an unrecoverable error; the cause is
///   logged and carried so the presentation layer can show it
///
/// Failures never propagate as panics or `Err` across the presentation
/// boundary; callers degrade to placeholders instead.
#[derive(Debug, Clone)]
pub enum Stage<T> {
    Ready(T),
    Empty,
    Failed(String),
}

impl<T> Stage<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Stage::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Stage::Ready(_))
    }

    /// Map the ready value, preserving `Empty`/`Failed`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Stage<U> {
        match self {
            Stage::Ready(v) => Stage::Ready(f(v)),
            Stage::Empty => Stage::Empty,
            Stage::Failed(cause) => Stage::Failed(cause),
        }
    }

    /// Human-readable label for status lines and error tables.
    pub fn status_label(&self) -> &str {
        match self {
            Stage::Ready(_) => "ok",
            Stage::Empty => "no data",
            Stage::Failed(_) => "failed",
        }
    }
}

/// One hourly electricity-usage observation from the JSON loader.
///
/// `usage` stays optional until the preprocessor drops missing values:
/// unparsable readings are missing, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRow {
    pub ts: NaiveDateTime,
    pub usage: Option<f64>,
}

/// One daily weather observation from the CSV loader.
///
/// Weather exports carry day resolution only; any embedded time-of-day suffix
/// is truncated during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRow {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
}

/// An hourly usage row joined with that day's temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub ts: NaiveDateTime,
    pub usage: Option<f64>,
    pub temperature: Option<f64>,
}

/// A fully cleaned observation: no missing values, calendar features derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRow {
    pub ts: NaiveDateTime,
    pub usage: f64,
    pub temperature: f64,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of week, 0 = Monday .. 6 = Sunday.
    pub day_of_week: u32,
    pub is_weekend: bool,
}

impl CleanRow {
    /// Derive calendar features from a timestamp and the two numeric readings.
    pub fn from_merged(ts: NaiveDateTime, usage: f64, temperature: f64) -> Self {
        let day_of_week = ts.weekday().num_days_from_monday();
        Self {
            ts,
            usage,
            temperature,
            hour: ts.hour(),
            month: ts.month(),
            day_of_week,
            is_weekend: day_of_week >= 5,
        }
    }
}

/// The cleaned, feature-augmented dataset in chronological order.
#[derive(Debug, Clone, Default)]
pub struct CleanDataset {
    pub rows: Vec<CleanRow>,
}

impl CleanDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn usage(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.usage).collect()
    }

    pub fn temperature(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.temperature).collect()
    }
}

/// A per-file load error (unreadable file, wrong shape, missing columns).
///
/// These are returned alongside the aggregated rows so callers can surface a
/// load report instead of silently continuing.
#[derive(Debug, Clone)]
pub struct FileError {
    pub path: PathBuf,
    pub cause: String,
}

/// A row-level error encountered during ingest (kept for the load report).
#[derive(Debug, Clone)]
pub struct RowError {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

/// Summary of one loader invocation.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub files_seen: usize,
    pub files_loaded: usize,
    pub rows_read: usize,
    pub rows_used: usize,
    pub file_errors: Vec<FileError>,
    pub row_errors: Vec<RowError>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults); the TUI edits the
/// directory fields in place.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub usage_dir: PathBuf,
    pub weather_dir: PathBuf,
    /// Where to write the cleaned dataset (`None` disables the export).
    pub export_path: Option<PathBuf>,

    /// IQR multiplier for the robust outlier bounds.
    pub iqr_k: f64,
    /// |z| threshold for the standard-score detector.
    pub z_threshold: f64,

    /// Off-diagonal |r| above which a feature pair is flagged as collinear.
    pub corr_warn: f64,
    /// Number of top usage peaks annotated on the time-series figure.
    pub top_peaks: usize,
    /// Seasonal period in rows (24 for hourly data with a daily cycle).
    pub seasonal_period: usize,
    /// Minimum rows before decomposition/ADF are attempted (one week hourly).
    pub min_seasonal_rows: usize,

    /// Fraction of rows held out as the chronological test set.
    pub test_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            usage_dir: PathBuf::from("data/usage"),
            weather_dir: PathBuf::from("data/weather"),
            export_path: Some(PathBuf::from("cleaned_combined_data.csv")),
            iqr_k: 1.5,
            z_threshold: 3.0,
            corr_warn: 0.75,
            top_peaks: 3,
            seasonal_period: 24,
            min_seasonal_rows: 168,
            test_fraction: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn calendar_features_from_timestamp() {
        // 2024-01-06 is a Saturday.
        let ts = NaiveDate::from_ymd_opt(2024, 1, 6)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        let row = CleanRow::from_merged(ts, 120.0, 4.5);
        assert_eq!(row.hour, 13);
        assert_eq!(row.month, 1);
        assert_eq!(row.day_of_week, 5);
        assert!(row.is_weekend);
    }

    #[test]
    fn weekday_is_not_weekend() {
        // 2024-01-03 is a Wednesday.
        let ts = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let row = CleanRow::from_merged(ts, 100.0, 2.0);
        assert_eq!(row.day_of_week, 2);
        assert!(!row.is_weekend);
    }

    #[test]
    fn stage_map_preserves_failure() {
        let s: Stage<i32> = Stage::Failed("boom".to_string());
        match s.map(|v| v + 1) {
            Stage::Failed(cause) => assert_eq!(cause, "boom"),
            _ => panic!("expected Failed"),
        }
    }
}
