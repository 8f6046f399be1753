//! Synthetic usage/weather input generation.
//!
//! Produces files in exactly the shapes the loaders expect: weekly usage JSON
//! files (`{"response": {"data": [{"period", "value"}]}}`) and one weather CSV
//! per run (`date,temperature_2m`). The generator injects a few spikes and
//! missing readings so a sample run exercises the cleaning path, not just the
//! happy path.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde_json::json;
use tracing::info;

use crate::error::AppError;

/// Baseline hourly load the cycles and noise modulate.
const BASE_LOAD: f64 = 120.0;
/// Amplitude of the daily usage cycle.
const DAILY_AMPLITUDE: f64 = 25.0;
/// Weekend demand reduction.
const WEEKEND_DIP: f64 = 12.0;
/// Usage response per degree below the comfort temperature (heating-driven).
const DEGREE_RESPONSE: f64 = 1.8;
const COMFORT_TEMP: f64 = 18.0;
/// One reading in ~200 is a spike, one in ~150 is missing.
const SPIKE_PROB: f64 = 0.005;
const MISSING_PROB: f64 = 0.0066;

/// What a generation run produced.
#[derive(Debug, Clone)]
pub struct SampleSummary {
    pub usage_files: usize,
    pub usage_rows: usize,
    pub weather_rows: usize,
}

/// Generate `days` of hourly usage JSON and daily weather CSV.
///
/// Deterministic for a given seed. Both directories are created if missing.
pub fn generate_sample_inputs(
    usage_dir: &Path,
    weather_dir: &Path,
    start: NaiveDate,
    days: usize,
    seed: u64,
) -> Result<SampleSummary, AppError> {
    if days == 0 {
        return Err(AppError::config("Sample length must be at least one day."));
    }

    fs::create_dir_all(usage_dir).map_err(|e| {
        AppError::config(format!(
            "Failed to create usage directory '{}': {e}",
            usage_dir.display()
        ))
    })?;
    fs::create_dir_all(weather_dir).map_err(|e| {
        AppError::config(format!(
            "Failed to create weather directory '{}': {e}",
            weather_dir.display()
        ))
    })?;

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 4.0)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;
    let temp_noise = Normal::new(0.0, 1.5)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    // Daily temperatures first; usage depends on them.
    let temperatures: Vec<f64> = (0..days)
        .map(|d| {
            let seasonal = 10.0 + 8.0 * (2.0 * std::f64::consts::PI * d as f64 / 365.0).sin();
            seasonal + temp_noise.sample(&mut rng)
        })
        .collect();

    let weather_path = weather_dir.join("weather.csv");
    write_weather_csv(&weather_path, start, &temperatures)?;

    // Weekly usage files.
    let mut usage_files = 0usize;
    let mut usage_rows = 0usize;
    for (chunk_idx, chunk_start) in (0..days).step_by(7).enumerate() {
        let chunk_days = 7.min(days - chunk_start);
        let mut records = Vec::with_capacity(chunk_days * 24);

        for d in chunk_start..chunk_start + chunk_days {
            let date = start + Duration::days(d as i64);
            let weekend = date.weekday().num_days_from_monday() >= 5;
            for hour in 0..24u32 {
                let value = hourly_usage(
                    hour,
                    weekend,
                    temperatures[d],
                    noise.sample(&mut rng),
                    &mut rng,
                );
                records.push(json!({
                    "period": format!("{date}T{hour:02}"),
                    "value": value,
                }));
                usage_rows += 1;
            }
        }

        let path = usage_dir.join(format!("usage_{:03}.json", chunk_idx + 1));
        let body = json!({ "response": { "data": records } });
        let mut file = File::create(&path).map_err(|e| {
            AppError::config(format!(
                "Failed to create sample file '{}': {e}",
                path.display()
            ))
        })?;
        serde_json::to_writer_pretty(&mut file, &body)
            .map_err(|e| AppError::runtime(format!("Failed to write sample JSON: {e}")))?;
        usage_files += 1;
    }

    info!(
        usage_files,
        usage_rows,
        weather_rows = days,
        "sample inputs generated"
    );

    Ok(SampleSummary {
        usage_files,
        usage_rows,
        weather_rows: days,
    })
}

/// One hourly reading: cycles, temperature response, noise, rare spike or gap.
fn hourly_usage(
    hour: u32,
    weekend: bool,
    temperature: f64,
    noise: f64,
    rng: &mut StdRng,
) -> serde_json::Value {
    if rng.r#gen::<f64>() < MISSING_PROB {
        return serde_json::Value::Null;
    }

    let daily =
        DAILY_AMPLITUDE * (2.0 * std::f64::consts::PI * (hour as f64 - 6.0) / 24.0).sin();
    let weekend_dip = if weekend { WEEKEND_DIP } else { 0.0 };
    let heating = DEGREE_RESPONSE * (COMFORT_TEMP - temperature).max(0.0);

    let mut value = BASE_LOAD + daily - weekend_dip + heating + noise;
    if rng.r#gen::<f64>() < SPIKE_PROB {
        value *= 8.0;
    }
    json!((value.max(0.0) * 100.0).round() / 100.0)
}

fn write_weather_csv(
    path: &Path,
    start: NaiveDate,
    temperatures: &[f64],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!(
            "Failed to create weather CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "date,temperature_2m")
        .map_err(|e| AppError::runtime(format!("Failed to write weather CSV: {e}")))?;
    for (d, temp) in temperatures.iter().enumerate() {
        let date = start + Duration::days(d as i64);
        writeln!(file, "{date},{temp:.2}")
            .map_err(|e| AppError::runtime(format!("Failed to write weather CSV: {e}")))?;
    }
    Ok(())
}
