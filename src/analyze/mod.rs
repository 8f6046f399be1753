//! Exploratory analysis of the cleaned dataset.
//!
//! Everything here is descriptive: summaries, a degree-1 trend for the
//! time-series figure, peak annotations, a correlation matrix with
//! multicollinearity warnings, and (when at least a week of hourly data is
//! available) seasonal decomposition plus an ADF stationarity verdict.
//!
//! An empty dataset is a visible no-op (`Stage::Empty`), not an error.

use tracing::{info, warn};

use crate::domain::{CleanDataset, PipelineConfig, Stage};
use crate::stats::adf::{AdfResult, adf_test};
use crate::stats::decompose::{Decomposition, seasonal_decompose};
use crate::stats::{self, CorrelationMatrix, Summary};

/// Significance level for the stationarity verdict.
const ADF_ALPHA: f64 = 0.05;

/// Fitted degree-1 trend of usage against row index.
#[derive(Debug, Clone, Copy)]
pub struct TrendLine {
    pub intercept: f64,
    pub slope: f64,
}

impl TrendLine {
    pub fn value_at(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }
}

/// Seasonal/stationarity section of the analysis.
#[derive(Debug, Clone)]
pub enum SeasonalReport {
    /// Fewer rows than one week of hourly observations; decomposition and the
    /// ADF test are skipped rather than failing on a short series.
    Insufficient { rows: usize, required: usize },
    Ready {
        decomposition: Decomposition,
        /// `None` when the regression itself was degenerate.
        adf: Option<AdfResult>,
    },
}

/// Everything the EDA stage computes.
#[derive(Debug, Clone)]
pub struct EdaOutput {
    pub summaries: Vec<Summary>,
    pub trend: Option<TrendLine>,
    /// `(row index, usage)` of the top usage values, highest first.
    pub peaks: Vec<(usize, f64)>,
    pub correlation: CorrelationMatrix,
    /// `(column a, column b, r)` for off-diagonal |r| above the warn level.
    pub collinearity_warnings: Vec<(String, String, f64)>,
    pub seasonal: SeasonalReport,
}

/// Run the EDA stage over a cleaned dataset.
pub fn analyze(dataset: &CleanDataset, config: &PipelineConfig) -> Stage<EdaOutput> {
    let _span = tracing::info_span!("analyze", rows = dataset.len()).entered();

    if dataset.is_empty() {
        info!("no cleaned data to analyze");
        return Stage::Empty;
    }

    let usage = dataset.usage();
    let temperature = dataset.temperature();

    let mut summaries = Vec::new();
    for (name, column) in [
        ("electricity_usage", &usage),
        ("temperature", &temperature),
    ] {
        match stats::summarize(name, column) {
            Some(summary) => summaries.push(summary),
            None => warn!(column = name, "column too short to summarize"),
        }
    }

    let xs: Vec<f64> = (0..usage.len()).map(|i| i as f64).collect();
    let trend = crate::math::ols::fit_line(&xs, &usage)
        .map(|(intercept, slope)| TrendLine { intercept, slope });

    let peaks = top_peaks(&usage, config.top_peaks);

    let correlation = feature_correlations(dataset);
    let collinearity_warnings = collinearity(&correlation, config.corr_warn);
    for (a, b, r) in &collinearity_warnings {
        warn!(a, b, r, "highly correlated feature pair");
    }

    let seasonal = if dataset.len() >= config.min_seasonal_rows {
        match seasonal_decompose(&usage, config.seasonal_period) {
            Some(decomposition) => {
                let adf = adf_test(&usage, ADF_ALPHA);
                if adf.is_none() {
                    warn!("ADF regression degenerate; reporting decomposition only");
                }
                SeasonalReport::Ready { decomposition, adf }
            }
            None => SeasonalReport::Insufficient {
                rows: dataset.len(),
                required: 2 * config.seasonal_period,
            },
        }
    } else {
        SeasonalReport::Insufficient {
            rows: dataset.len(),
            required: config.min_seasonal_rows,
        }
    };

    Stage::Ready(EdaOutput {
        summaries,
        trend,
        peaks,
        correlation,
        collinearity_warnings,
        seasonal,
    })
}

/// Indices and values of the `n` largest usage observations, highest first.
fn top_peaks(usage: &[f64], n: usize) -> Vec<(usize, f64)> {
    let mut indexed: Vec<(usize, f64)> = usage.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed.truncate(n);
    indexed
}

/// Correlations across the usage target and every model feature.
///
/// Calendar features enter as numeric codes here (that is what the model
/// sees); `is_weekend` as 0/1.
fn feature_correlations(dataset: &CleanDataset) -> CorrelationMatrix {
    let columns: Vec<(String, Vec<f64>)> = vec![
        ("electricity_usage".to_string(), dataset.usage()),
        ("temperature".to_string(), dataset.temperature()),
        (
            "hour".to_string(),
            dataset.rows.iter().map(|r| r.hour as f64).collect(),
        ),
        (
            "month".to_string(),
            dataset.rows.iter().map(|r| r.month as f64).collect(),
        ),
        (
            "day_of_week".to_string(),
            dataset.rows.iter().map(|r| r.day_of_week as f64).collect(),
        ),
        (
            "is_weekend".to_string(),
            dataset
                .rows
                .iter()
                .map(|r| if r.is_weekend { 1.0 } else { 0.0 })
                .collect(),
        ),
    ];
    stats::correlation_matrix(&columns)
}

fn collinearity(matrix: &CorrelationMatrix, warn_at: f64) -> Vec<(String, String, f64)> {
    let mut out = Vec::new();
    let k = matrix.labels.len();
    for i in 0..k {
        for j in (i + 1)..k {
            let r = matrix.values[i][j];
            if r.abs() > warn_at {
                out.push((matrix.labels[i].clone(), matrix.labels[j].clone(), r));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CleanRow;
    use chrono::NaiveDate;

    fn dataset(hours: usize, usage: impl Fn(usize) -> f64) -> CleanDataset {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = (0..hours)
            .map(|i| {
                let ts = start
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .checked_add_signed(chrono::Duration::hours(i as i64))
                    .unwrap();
                CleanRow::from_merged(ts, usage(i), 5.0 + (i % 24) as f64 * 0.1)
            })
            .collect();
        CleanDataset { rows }
    }

    #[test]
    fn empty_dataset_is_a_visible_noop() {
        let config = PipelineConfig::default();
        assert!(matches!(
            analyze(&CleanDataset::default(), &config),
            Stage::Empty
        ));
    }

    #[test]
    fn short_series_reports_insufficient_seasonal_data() {
        let config = PipelineConfig::default();
        let ds = dataset(48, |i| 100.0 + i as f64);
        let out = analyze(&ds, &config);
        let eda = out.ready().expect("ready");
        assert!(matches!(
            eda.seasonal,
            SeasonalReport::Insufficient { rows: 48, required: 168 }
        ));
    }

    #[test]
    fn week_of_data_gets_decomposition_and_adf() {
        let config = PipelineConfig::default();
        let ds = dataset(200, |i| {
            100.0 + 10.0 * (2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0).sin()
        });
        let out = analyze(&ds, &config);
        let eda = out.ready().expect("ready");
        match &eda.seasonal {
            SeasonalReport::Ready { decomposition, adf } => {
                assert_eq!(decomposition.period, 24);
                assert!(adf.is_some());
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn peaks_are_the_largest_values_in_order() {
        let config = PipelineConfig::default();
        let ds = dataset(50, |i| if i == 7 { 500.0 } else { 100.0 + i as f64 });
        let eda = analyze(&ds, &config);
        let eda = eda.ready().expect("ready");
        assert_eq!(eda.peaks.len(), 3);
        assert_eq!(eda.peaks[0], (7, 500.0));
        assert_eq!(eda.peaks[1].0, 49);
    }

    #[test]
    fn trend_slope_matches_a_linear_series() {
        let config = PipelineConfig::default();
        let ds = dataset(100, |i| 10.0 + 2.0 * i as f64);
        let eda = analyze(&ds, &config);
        let trend = eda.ready().unwrap().trend.unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!((trend.intercept - 10.0).abs() < 1e-9);
    }

    #[test]
    fn duplicated_column_triggers_collinearity_warning() {
        let config = PipelineConfig::default();
        // Usage proportional to hour-of-day makes usage↔hour nearly collinear.
        let ds = dataset(96, |i| (i % 24) as f64 * 3.0);
        let eda = analyze(&ds, &config);
        let eda = eda.ready().unwrap();
        assert!(
            eda.collinearity_warnings
                .iter()
                .any(|(a, b, _)| (a == "electricity_usage" && b == "hour"))
        );
    }
}
