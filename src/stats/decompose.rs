//! Additive seasonal decomposition: `y_t = trend_t + seasonal_t + residual_t`.
//!
//! - Trend: centered moving average. With an even period `p` (24 for hourly
//!   data) the window is `p + 1` wide with half weights at the ends, which is
//!   the standard "2×p MA" construction.
//! - Seasonal: per-phase means of the detrended series, re-centered so the
//!   seasonal component sums to zero over one period.
//! - Residual: whatever is left where the trend is defined.
//!
//! The trend (and therefore the residual) is undefined for the first and last
//! `p/2` observations; those entries are `None` rather than an extrapolation.

/// One additive decomposition of a series.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub period: usize,
    /// Centered-MA trend; `None` at the edges.
    pub trend: Vec<Option<f64>>,
    /// Zero-centered seasonal component, repeating with `period`.
    pub seasonal: Vec<f64>,
    /// `y - trend - seasonal` where the trend is defined.
    pub residual: Vec<Option<f64>>,
}

/// Decompose `series` additively with the given period.
///
/// Returns `None` when the series is shorter than two full periods; with
/// less than that the per-phase means are meaningless.
pub fn seasonal_decompose(series: &[f64], period: usize) -> Option<Decomposition> {
    let n = series.len();
    if period < 2 || n < 2 * period {
        return None;
    }

    let trend = centered_moving_average(series, period);

    // Per-phase means of the detrended series.
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (&y, t)) in series.iter().zip(trend.iter()).enumerate() {
        if let Some(t) = t {
            sums[i % period] += y - t;
            counts[i % period] += 1;
        }
    }

    let mut phase_means: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();

    // Re-center so the seasonal component has zero mean over one period.
    let offset = phase_means.iter().sum::<f64>() / period as f64;
    for m in &mut phase_means {
        *m -= offset;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();

    let residual: Vec<Option<f64>> = series
        .iter()
        .zip(trend.iter())
        .zip(seasonal.iter())
        .map(|((&y, t), &s)| t.map(|t| y - t - s))
        .collect();

    Some(Decomposition {
        period,
        trend,
        seasonal,
        residual,
    })
}

/// Centered moving average with proper even/odd handling.
fn centered_moving_average(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = series.len();
    let half = period / 2;
    let mut out = vec![None; n];

    if period % 2 == 1 {
        for i in half..n.saturating_sub(half) {
            let window = &series[i - half..=i + half];
            out[i] = Some(window.iter().sum::<f64>() / period as f64);
        }
        return out;
    }

    // Even period: window of period+1 values with half weights at both ends.
    for i in half..n.saturating_sub(half) {
        let window = &series[i - half..=i + half];
        let mut sum = 0.5 * window[0] + 0.5 * window[period];
        sum += window[1..period].iter().sum::<f64>();
        out[i] = Some(sum / period as f64);
    }
    out
}
