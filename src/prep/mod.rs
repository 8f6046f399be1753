//! Merge, feature engineering, outlier removal, and missing-data cleanup.
//!
//! The contract mirrors the rest of the pipeline: an absent/empty input
//! degrades to `Stage::Empty`, an unrecoverable problem becomes
//! `Stage::Failed(cause)` with a log entry, and nothing in here panics on the
//! data path.
//!
//! Cleaning order matters and is fixed:
//! 1. inner join of hourly usage with daily weather on calendar date
//! 2. chronological sort
//! 3. outlier scan: union of IQR- and z-score-flagged row indices across the
//!    distributional columns (usage, temperature)
//! 4. removal of flagged rows
//! 5. drop of any row still missing a reading
//! 6. calendar feature derivation on the survivors

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{
    CleanDataset, CleanRow, MergedRow, PipelineConfig, Stage, UsageRow, WeatherRow,
};

pub mod outliers;

/// Cleaned dataset plus the counters the report/dashboard surface.
#[derive(Debug, Clone)]
pub struct PrepOutput {
    pub dataset: CleanDataset,
    pub merged_rows: usize,
    pub outlier_rows_removed: usize,
    pub missing_rows_dropped: usize,
}

/// Run the full preprocessing contract.
pub fn preprocess(
    usage: &[UsageRow],
    weather: &[WeatherRow],
    config: &PipelineConfig,
) -> Stage<PrepOutput> {
    let _span = tracing::info_span!("preprocess").entered();

    if usage.is_empty() || weather.is_empty() {
        info!(
            usage_rows = usage.len(),
            weather_rows = weather.len(),
            "nothing to preprocess"
        );
        return Stage::Empty;
    }

    let mut merged = merge_on_date(usage, weather);
    if merged.is_empty() {
        warn!("no overlapping dates between usage and weather inputs");
        return Stage::Empty;
    }
    merged.sort_by_key(|r| r.ts);
    let merged_rows = merged.len();

    // Union of outlier flags across both detectors and both numeric columns.
    let flagged = outlier_union(&merged, config);
    let outlier_rows_removed = flagged.len();

    let mut missing_rows_dropped = 0usize;
    let mut rows = Vec::with_capacity(merged.len() - flagged.len());
    for (idx, row) in merged.into_iter().enumerate() {
        if flagged.contains(&idx) {
            continue;
        }
        match (row.usage, row.temperature) {
            (Some(usage), Some(temperature)) => {
                rows.push(CleanRow::from_merged(row.ts, usage, temperature));
            }
            _ => missing_rows_dropped += 1,
        }
    }

    if rows.is_empty() {
        warn!(
            merged_rows,
            outlier_rows_removed, missing_rows_dropped, "cleaning removed every row"
        );
        return Stage::Empty;
    }

    info!(
        merged_rows,
        outlier_rows_removed,
        missing_rows_dropped,
        clean_rows = rows.len(),
        "preprocessing complete"
    );

    Stage::Ready(PrepOutput {
        dataset: CleanDataset { rows },
        merged_rows,
        outlier_rows_removed,
        missing_rows_dropped,
    })
}

/// Inner join: each hourly usage row picks up its calendar day's temperature.
/// Usage rows on days absent from the weather data (and vice versa) drop out.
fn merge_on_date(usage: &[UsageRow], weather: &[WeatherRow]) -> Vec<MergedRow> {
    // Last write wins when a weather file repeats a date; files are read in
    // deterministic name order, so this is reproducible.
    let by_date: HashMap<NaiveDate, Option<f64>> = weather
        .iter()
        .map(|w| (w.date, w.temperature))
        .collect();

    usage
        .iter()
        .filter_map(|u| {
            by_date.get(&u.ts.date()).map(|&temperature| MergedRow {
                ts: u.ts,
                usage: u.usage,
                temperature,
            })
        })
        .collect()
}

fn outlier_union(merged: &[MergedRow], config: &PipelineConfig) -> BTreeSet<usize> {
    let usage_col: Vec<Option<f64>> = merged.iter().map(|r| r.usage).collect();
    let temp_col: Vec<Option<f64>> = merged.iter().map(|r| r.temperature).collect();

    let mut flagged = BTreeSet::new();
    for column in [&usage_col, &temp_col] {
        flagged.extend(outliers::iqr_outliers(column, config.iqr_k));
        flagged.extend(outliers::zscore_outliers(column, config.z_threshold));
    }
    flagged
}
