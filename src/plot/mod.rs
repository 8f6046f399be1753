//! In-memory figure descriptions handed to the presentation layer.
//!
//! Figures are data-only: series, bins, and bounds are computed here, while
//! rendering happens in the TUI (Plotters into the terminal buffer) or in
//! `plot::ascii` for batch output. This keeps the drawing code trivial and
//! the figure builders testable without a terminal.
//!
//! Every builder has a placeholder counterpart so the presentation boundary
//! can always hand back a figure of the right shape; a failed stage shows a
//! placeholder instead of aborting the run.

use crate::analyze::EdaOutput;
use crate::domain::CleanDataset;
use crate::fit::ModelOutput;
use crate::stats;
use crate::stats::decompose::Decomposition;

pub mod ascii;

/// Number of histogram bins for the univariate/residual views.
const HISTOGRAM_BINS: usize = 20;
/// Grid resolution of the KDE density curve.
const DENSITY_POINTS: usize = 120;

/// A figure or its placeholder when the stage behind it failed.
#[derive(Debug, Clone)]
pub enum Figure {
    TimeSeries(TimeSeriesFigure),
    Univariate(UnivariateFigure),
    Correlation(CorrelationFigure),
    Residual(ResidualFigure),
    Decomposition(DecompositionFigure),
    Placeholder { title: String, message: String },
}

impl Figure {
    pub fn placeholder(title: &str, message: impl Into<String>) -> Self {
        Figure::Placeholder {
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Figure::TimeSeries(f) => &f.title,
            Figure::Univariate(f) => &f.title,
            Figure::Correlation(f) => &f.title,
            Figure::Residual(f) => &f.title,
            Figure::Decomposition(f) => &f.title,
            Figure::Placeholder { title, .. } => title,
        }
    }
}

/// Usage over time with the fitted trend line and annotated peaks.
#[derive(Debug, Clone)]
pub struct TimeSeriesFigure {
    pub title: String,
    /// `(row index, usage)` in chronological order.
    pub points: Vec<(f64, f64)>,
    /// Two endpoints of the degree-1 trend (empty when no trend fit).
    pub trend: Vec<(f64, f64)>,
    /// Annotated top peaks.
    pub peaks: Vec<(f64, f64)>,
}

/// Histogram with uniform bins.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// `(bin center, count)` per bin.
    pub bins: Vec<(f64, usize)>,
    pub bin_width: f64,
}

/// Five-number summary plus fence outliers for a box plot.
#[derive(Debug, Clone)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Whiskers clamped to the most extreme values inside the 1.5·IQR fences.
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Distribution views of the usage column.
#[derive(Debug, Clone)]
pub struct UnivariateFigure {
    pub title: String,
    pub histogram: Histogram,
    /// Gaussian-KDE density curve.
    pub density: Vec<(f64, f64)>,
    pub box_stats: BoxStats,
    /// `(hour, mean usage)` for hours 0-23 present in the data.
    pub hourly_mean: Vec<(f64, f64)>,
}

/// Correlation heatmap data.
#[derive(Debug, Clone)]
pub struct CorrelationFigure {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Model diagnostics: fit quality and residual structure.
#[derive(Debug, Clone)]
pub struct ResidualFigure {
    pub title: String,
    pub actual_vs_predicted: Vec<(f64, f64)>,
    pub residual_vs_predicted: Vec<(f64, f64)>,
    pub residual_histogram: Histogram,
}

/// Observed/trend/seasonal/residual panels of the decomposition.
#[derive(Debug, Clone)]
pub struct DecompositionFigure {
    pub title: String,
    pub observed: Vec<(f64, f64)>,
    pub trend: Vec<(f64, f64)>,
    pub seasonal: Vec<(f64, f64)>,
    pub residual: Vec<(f64, f64)>,
}

/// Build the time-series figure from the cleaned data and EDA output.
pub fn time_series_figure(dataset: &CleanDataset, eda: &EdaOutput) -> Figure {
    let points: Vec<(f64, f64)> = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.usage))
        .collect();

    let trend = eda
        .trend
        .map(|t| {
            let last = dataset.len().saturating_sub(1);
            vec![(0.0, t.value_at(0)), (last as f64, t.value_at(last))]
        })
        .unwrap_or_default();

    let peaks = eda
        .peaks
        .iter()
        .map(|&(idx, v)| (idx as f64, v))
        .collect();

    Figure::TimeSeries(TimeSeriesFigure {
        title: "Electricity usage over time".to_string(),
        points,
        trend,
        peaks,
    })
}

/// Build the univariate figure (histogram, density, box, hourly profile).
pub fn univariate_figure(dataset: &CleanDataset) -> Figure {
    let usage = dataset.usage();
    let (Some(histogram), Some(box_stats)) = (histogram(&usage, HISTOGRAM_BINS), box_stats(&usage))
    else {
        return Figure::placeholder("Usage distribution", "not enough data for a distribution view");
    };

    Figure::Univariate(UnivariateFigure {
        title: "Usage distribution".to_string(),
        density: kde(&usage, DENSITY_POINTS),
        histogram,
        box_stats,
        hourly_mean: hourly_mean(dataset),
    })
}

/// Build the correlation heatmap figure.
pub fn correlation_figure(eda: &EdaOutput) -> Figure {
    Figure::Correlation(CorrelationFigure {
        title: "Feature correlations".to_string(),
        labels: eda.correlation.labels.clone(),
        values: eda.correlation.values.clone(),
    })
}

/// Build the residual diagnostics figure.
pub fn residual_figure(model: &ModelOutput) -> Figure {
    let residual_vs_predicted: Vec<(f64, f64)> = model
        .predictions
        .iter()
        .zip(model.residuals.iter())
        .map(|(&(_, predicted), &resid)| (predicted, resid))
        .collect();

    let Some(residual_histogram) = histogram(&model.residuals, HISTOGRAM_BINS) else {
        return Figure::placeholder("Model diagnostics", "no residuals to plot");
    };

    Figure::Residual(ResidualFigure {
        title: "Model diagnostics".to_string(),
        actual_vs_predicted: model.predictions.clone(),
        residual_vs_predicted,
        residual_histogram,
    })
}

/// Build the decomposition panels figure.
pub fn decomposition_figure(decomposition: &Decomposition, observed: &[f64]) -> Figure {
    let series = |values: &[Option<f64>]| -> Vec<(f64, f64)> {
        values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect()
    };

    Figure::Decomposition(DecompositionFigure {
        title: "Seasonal decomposition (period 24)".to_string(),
        observed: observed
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect(),
        trend: series(&decomposition.trend),
        seasonal: decomposition
            .seasonal
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect(),
        residual: series(&decomposition.residual),
    })
}

/// Uniform-bin histogram. `None` on empty input.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }

    // Degenerate (constant) columns still get one bin.
    let span = (max - min).max(f64::EPSILON);
    let bin_width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / span) * bins as f64) as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    Some(Histogram {
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(i, c)| (min + (i as f64 + 0.5) * bin_width, c))
            .collect(),
        bin_width,
    })
}

/// Box-plot statistics with 1.5·IQR whisker fences.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let q1 = stats::quantile(values, 0.25)?;
    let median = stats::quantile(values, 0.50)?;
    let q3 = stats::quantile(values, 0.75)?;
    let iqr = q3 - q1;
    let fence_low = q1 - 1.5 * iqr;
    let fence_high = q3 + 1.5 * iqr;

    let mut whisker_low = f64::INFINITY;
    let mut whisker_high = f64::NEG_INFINITY;
    let mut outliers = Vec::new();
    for &v in values {
        if v < fence_low || v > fence_high {
            outliers.push(v);
        } else {
            whisker_low = whisker_low.min(v);
            whisker_high = whisker_high.max(v);
        }
    }

    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

/// Gaussian kernel density estimate over an evenly spaced grid.
///
/// Bandwidth follows Silverman's rule of thumb; a constant column (zero
/// bandwidth) yields an empty curve rather than a spike of NaNs.
pub fn kde(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    let n = values.len();
    if n < 2 || points < 2 {
        return Vec::new();
    }
    let Some(std) = stats::sample_std(values) else {
        return Vec::new();
    };
    if std == 0.0 {
        return Vec::new();
    }

    let bandwidth = 1.06 * std * (n as f64).powf(-0.2);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min) - 3.0 * bandwidth;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 3.0 * bandwidth;

    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    (0..points)
        .map(|i| {
            let x = min + (max - min) * i as f64 / (points as f64 - 1.0);
            let density: f64 = values
                .iter()
                .map(|&v| {
                    let u = (x - v) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect()
}

/// Mean usage per hour of day, for hours present in the data.
fn hourly_mean(dataset: &CleanDataset) -> Vec<(f64, f64)> {
    let mut sums = [0.0f64; 24];
    let mut counts = [0usize; 24];
    for row in &dataset.rows {
        sums[row.hour as usize] += row.usage;
        counts[row.hour as usize] += 1;
    }

    (0..24)
        .filter(|&h| counts[h] > 0)
        .map(|h| (h as f64, sums[h] / counts[h] as f64))
        .collect()
}
