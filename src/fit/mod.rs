//! Demand regression: encoding, chronological split, OLS fit, evaluation.
//!
//! The model is ordinary least squares on
//! `{hour, month, temperature, one-hot day_of_week}` with Monday as the
//! dropped reference category (keeping all seven dummies would be collinear
//! with the intercept).
//!
//! The split is chronological: the trailing 20% of rows in original order is
//! the test set. Shuffling would leak future observations into training,
//! which is exactly what a time-series evaluation must not do.
//!
//! All failure modes (missing features, degenerate split, singular fit)
//! return `Stage::Failed(cause)`, logged, never panicking.

use nalgebra::{DMatrix, DVector};
use tracing::{info, warn};

use crate::domain::{CleanDataset, PipelineConfig, Stage};
use crate::math::ols::solve_least_squares;
use crate::stats;

/// Reference day-of-week dropped from the one-hot encoding (Monday).
const REFERENCE_DAY: u32 = 0;

const DAY_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Fitted coefficients keyed to feature names.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    pub intercept: f64,
    /// `(feature name, coefficient)` sorted descending by signed value.
    pub coefficients: Vec<(String, f64)>,
}

/// Held-out evaluation metrics.
#[derive(Debug, Clone, Copy)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Descriptive residual flags, advisory only, never errors.
#[derive(Debug, Clone, Copy)]
pub struct ResidualDiagnostics {
    pub skewness: f64,
    pub mean_abs_residual: f64,
    pub residual_std: f64,
    /// |skewness| > 1.
    pub skewed: bool,
    /// Mean |residual| exceeds 10% of the mean target.
    pub large_errors: bool,
    /// Residual std exceeds 50% of the target std.
    pub heteroscedastic_risk: bool,
}

/// Everything the modeling stage produces.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub model: RegressionModel,
    pub metrics: RegressionMetrics,
    pub diagnostics: ResidualDiagnostics,
    pub train_rows: usize,
    pub test_rows: usize,
    /// `(actual, predicted)` over the test slice, chronological order.
    pub predictions: Vec<(f64, f64)>,
    /// `actual - predicted` over the test slice.
    pub residuals: Vec<f64>,
}

/// Fit and evaluate the demand regression.
pub fn train_model(dataset: &CleanDataset, config: &PipelineConfig) -> Stage<ModelOutput> {
    let _span = tracing::info_span!("train_model", rows = dataset.len()).entered();

    if dataset.is_empty() {
        info!("no cleaned data to model");
        return Stage::Empty;
    }

    let n = dataset.len();
    let (train_rows, test_rows) = chronological_split(n, config.test_fraction);
    let names = feature_names();
    // Intercept + named features.
    let k = 1 + names.len();

    if test_rows == 0 || train_rows < k {
        let cause = format!(
            "dataset too small to split and fit: n={n}, train={train_rows}, test={test_rows}, parameters={k}"
        );
        warn!(%cause, "modeling skipped");
        return Stage::Failed(cause);
    }

    let x = design_matrix(dataset);
    let y = DVector::from_iterator(n, dataset.rows.iter().map(|r| r.usage));

    let x_train = x.rows(0, train_rows).into_owned();
    let y_train = y.rows(0, train_rows).into_owned();
    let x_test = x.rows(train_rows, test_rows).into_owned();
    let y_test = y.rows(train_rows, test_rows).into_owned();

    let Some(beta) = solve_least_squares(&x_train, &y_train) else {
        let cause = "least-squares fit failed (ill-conditioned design matrix)".to_string();
        warn!(%cause, "modeling failed");
        return Stage::Failed(cause);
    };

    let predicted = &x_test * &beta;
    let actual: Vec<f64> = y_test.iter().copied().collect();
    let fitted: Vec<f64> = predicted.iter().copied().collect();

    let Some(metrics) = evaluate(&actual, &fitted) else {
        let cause = "evaluation failed on the held-out slice".to_string();
        warn!(%cause, "modeling failed");
        return Stage::Failed(cause);
    };

    let residuals: Vec<f64> = actual
        .iter()
        .zip(fitted.iter())
        .map(|(a, p)| a - p)
        .collect();
    let diagnostics = diagnose(&actual, &residuals);

    let mut coefficients: Vec<(String, f64)> = names
        .iter()
        .zip(beta.iter().skip(1))
        .map(|(name, &coef)| (name.clone(), coef))
        .collect();
    coefficients.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    info!(
        train = train_rows,
        test = test_rows,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "model fitted"
    );

    Stage::Ready(ModelOutput {
        model: RegressionModel {
            intercept: beta[0],
            coefficients,
        },
        metrics,
        diagnostics,
        train_rows,
        test_rows,
        predictions: actual.iter().copied().zip(fitted).collect(),
        residuals,
    })
}

/// Chronological 80/20 split: test set is the trailing `ceil(fraction * n)`
/// rows in original order.
pub fn chronological_split(n: usize, test_fraction: f64) -> (usize, usize) {
    let test = ((n as f64) * test_fraction).ceil() as usize;
    let test = test.min(n);
    (n - test, test)
}

fn feature_names() -> Vec<String> {
    let mut names = vec![
        "hour".to_string(),
        "month".to_string(),
        "temperature".to_string(),
    ];
    for day in 0..7u32 {
        if day != REFERENCE_DAY {
            names.push(format!("day_of_week_{}", DAY_NAMES[day as usize]));
        }
    }
    names
}

/// Design matrix: intercept, hour, month, temperature, one-hot day_of_week
/// (reference category dropped).
fn design_matrix(dataset: &CleanDataset) -> DMatrix<f64> {
    let n = dataset.len();
    let k = 1 + feature_names().len();
    let mut x = DMatrix::zeros(n, k);

    for (i, row) in dataset.rows.iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = row.hour as f64;
        x[(i, 2)] = row.month as f64;
        x[(i, 3)] = row.temperature;
        if row.day_of_week != REFERENCE_DAY {
            // Dummies for days 1..6 occupy columns 4..9 in day order.
            let col = 3 + row.day_of_week as usize;
            x[(i, col)] = 1.0;
        }
    }
    x
}

fn evaluate(actual: &[f64], predicted: &[f64]) -> Option<RegressionMetrics> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let n = actual.len() as f64;

    let mae = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum::<f64>()
        / n;

    let mean_actual = stats::mean(actual)?;
    let ss_tot = actual
        .iter()
        .map(|a| (a - mean_actual) * (a - mean_actual))
        .sum::<f64>();
    let ss_res = mse * n;
    // A constant test target makes R² undefined; report 0 rather than NaN.
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Some(RegressionMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        r2,
    })
}

fn diagnose(actual: &[f64], residuals: &[f64]) -> ResidualDiagnostics {
    let skewness = stats::skewness(residuals).unwrap_or(0.0);
    let mean_abs_residual =
        residuals.iter().map(|r| r.abs()).sum::<f64>() / residuals.len().max(1) as f64;
    let residual_std = stats::sample_std(residuals).unwrap_or(0.0);

    let mean_actual = stats::mean(actual).unwrap_or(0.0);
    let std_actual = stats::sample_std(actual).unwrap_or(0.0);

    ResidualDiagnostics {
        skewness,
        mean_abs_residual,
        residual_std,
        skewed: skewness.abs() > 1.0,
        large_errors: mean_actual.abs() > 0.0 && mean_abs_residual > 0.10 * mean_actual.abs(),
        heteroscedastic_risk: std_actual > 0.0 && residual_std > 0.50 * std_actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CleanRow;
    use chrono::NaiveDate;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    fn hourly_dataset(hours: usize, mut usage: impl FnMut(&CleanRow) -> f64) -> CleanDataset {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let rows = (0..hours)
            .map(|i| {
                let ts = start
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .checked_add_signed(chrono::Duration::hours(i as i64))
                    .unwrap();
                let temperature = 5.0 + ((i * 13) % 17) as f64;
                let mut row = CleanRow::from_merged(ts, 0.0, temperature);
                row.usage = usage(&row);
                row
            })
            .collect();
        CleanDataset { rows }
    }

    #[test]
    fn split_is_exactly_the_trailing_fifth() {
        assert_eq!(chronological_split(100, 0.2), (80, 20));
        assert_eq!(chronological_split(101, 0.2), (80, 21));
        assert_eq!(chronological_split(5, 0.2), (4, 1));
        assert_eq!(chronological_split(1, 0.2), (0, 1));
        assert_eq!(chronological_split(0, 0.2), (0, 0));
    }

    #[test]
    fn noiseless_linear_target_is_fit_exactly() {
        let config = PipelineConfig::default();
        let ds = hourly_dataset(240, |r| 2.0 * r.hour as f64 + 0.5 * r.temperature + 7.0);

        let out = match train_model(&ds, &config) {
            Stage::Ready(out) => out,
            other => panic!("expected Ready, got {}", other.status_label()),
        };

        assert!((out.metrics.r2 - 1.0).abs() < 1e-9, "r2 = {}", out.metrics.r2);
        assert!(out.metrics.rmse < 1e-8);

        let coef = |name: &str| {
            out.model
                .coefficients
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, c)| *c)
                .unwrap()
        };
        assert!((coef("hour") - 2.0).abs() < 1e-8);
        assert!((coef("temperature") - 0.5).abs() < 1e-8);
    }

    #[test]
    fn noisy_generator_signs_are_recovered() {
        let config = PipelineConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let ds = hourly_dataset(500, |r| {
            2.0 * r.hour as f64 + 0.5 * r.temperature + noise.sample(&mut rng)
        });

        let out = match train_model(&ds, &config) {
            Stage::Ready(out) => out,
            other => panic!("expected Ready, got {}", other.status_label()),
        };

        let coef = |name: &str| {
            out.model
                .coefficients
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, c)| *c)
                .unwrap()
        };
        assert!(coef("hour") > 0.0);
        assert!(coef("temperature") > 0.0);
        assert!(out.metrics.r2 > 0.9);
    }

    #[test]
    fn coefficients_are_sorted_descending() {
        let config = PipelineConfig::default();
        let ds = hourly_dataset(240, |r| 3.0 * r.hour as f64 - 2.0 * r.temperature);
        let out = train_model(&ds, &config);
        let out = out.ready().expect("ready");

        let values: Vec<f64> = out.model.coefficients.iter().map(|(_, c)| *c).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(values, sorted);
    }

    #[test]
    fn tiny_dataset_fails_without_panicking() {
        let config = PipelineConfig::default();
        let ds = hourly_dataset(6, |r| r.hour as f64);
        assert!(matches!(train_model(&ds, &config), Stage::Failed(_)));
    }

    #[test]
    fn empty_dataset_is_empty_stage() {
        let config = PipelineConfig::default();
        assert!(matches!(
            train_model(&CleanDataset::default(), &config),
            Stage::Empty
        ));
    }

    #[test]
    fn predictions_cover_the_test_slice_in_order() {
        let config = PipelineConfig::default();
        let ds = hourly_dataset(100, |r| r.hour as f64 + r.temperature);
        let out = train_model(&ds, &config);
        let out = out.ready().expect("ready");

        assert_eq!(out.train_rows, 80);
        assert_eq!(out.test_rows, 20);
        assert_eq!(out.predictions.len(), 20);
        // The first test actual must equal row 80's usage.
        assert_eq!(out.predictions[0].0, ds.rows[80].usage);
    }
}
