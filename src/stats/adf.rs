//! Augmented Dickey-Fuller stationarity test.
//!
//! We regress the first difference on the lagged level, a constant, and lagged
//! differences:
//!
//! ```text
//! Δy_t = α + ρ·y_{t-1} + Σ φ_i·Δy_{t-i} + ε_t
//! ```
//!
//! and report the t-statistic of ρ. Under the unit-root null the statistic
//! follows the Dickey-Fuller distribution, so critical values and p-values
//! come from MacKinnon's response-surface approximations (constant-only
//! regression), not the normal distribution.
//!
//! Lag order is chosen by AIC over `0..=maxlag` with the Schwert rule bound
//! `maxlag = floor(12 * (n/100)^0.25)`, the same selection shape as the
//! model-selection step in the fitter (information criterion over a small
//! candidate grid).

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::math::ols::solve_least_squares;

/// MacKinnon (2010) finite-sample critical value surfaces for the
/// constant-only ADF regression: `cv = b0 + b1/n + b2/n^2 + b3/n^3`.
const CV_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CV_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CV_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// MacKinnon (1994) approximate p-value polynomials for the constant-only
/// case: `p = Φ(poly(τ))`, with a small-τ and large-τ branch.
const TAU_STAR: f64 = -1.61;
const TAU_MIN: f64 = -18.83;
const TAU_MAX: f64 = 2.74;
const P_SMALL: [f64; 3] = [2.1659, 1.4412, 0.038269];
const P_LARGE: [f64; 4] = [1.7339, 0.93202, 0.05650, 0.00774];

/// Outcome of one ADF test run.
#[derive(Debug, Clone)]
pub struct AdfResult {
    /// Dickey-Fuller t-statistic of the lagged-level coefficient.
    pub statistic: f64,
    /// MacKinnon approximate p-value.
    pub p_value: f64,
    /// Number of lagged differences included (AIC-selected).
    pub lags: usize,
    /// Observations used in the regression after lagging.
    pub nobs: usize,
    /// (label, value) critical values at 1/5/10%.
    pub critical_values: [(&'static str, f64); 3],
    /// Verdict at the caller-supplied significance level.
    pub stationary: bool,
}

/// Run the ADF test with a constant term.
///
/// Returns `None` when the series is too short or too degenerate to regress
/// (the caller reports "insufficient data" instead of failing).
pub fn adf_test(series: &[f64], alpha: f64) -> Option<AdfResult> {
    let n = series.len();
    // Need enough observations for at least the zero-lag regression.
    if n < 12 {
        return None;
    }

    let maxlag = schwert_maxlag(n);

    let mut best: Option<(f64, AdfFit)> = None;
    for lags in 0..=maxlag {
        let Some(fit) = fit_adf_regression(series, lags) else {
            continue;
        };
        // AIC = n * ln(SSE/n) + 2k, over the common estimation sample.
        let aic = fit.nobs as f64 * (fit.sse / fit.nobs as f64).ln() + 2.0 * fit.k as f64;
        match &best {
            Some((best_aic, _)) if aic >= *best_aic => {}
            _ => best = Some((aic, fit)),
        }
    }

    let (_, fit) = best?;
    let statistic = fit.t_stat;
    let nobs = fit.nobs;

    let critical_values = [
        ("1%", mackinnon_cv(&CV_1PCT, nobs)),
        ("5%", mackinnon_cv(&CV_5PCT, nobs)),
        ("10%", mackinnon_cv(&CV_10PCT, nobs)),
    ];
    let p_value = mackinnon_pvalue(statistic);

    Some(AdfResult {
        statistic,
        p_value,
        lags: fit.lags,
        nobs,
        critical_values,
        stationary: p_value < alpha,
    })
}

/// Schwert (1989) rule of thumb for the maximum lag order.
fn schwert_maxlag(n: usize) -> usize {
    let maxlag = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    // Leave room for the regression itself.
    maxlag.min(n / 2 - 2)
}

struct AdfFit {
    t_stat: f64,
    sse: f64,
    nobs: usize,
    k: usize,
    lags: usize,
}

/// Fit the ADF regression for a fixed lag order.
///
/// Column 0 is the constant, column 1 the lagged level; the t-statistic of
/// column 1 is the test statistic.
fn fit_adf_regression(series: &[f64], lags: usize) -> Option<AdfFit> {
    let n = series.len();
    let k = 2 + lags;
    // Rows start after the longest lag; differences start at index 1.
    let start = lags + 1;
    if n <= start {
        return None;
    }
    let rows = n - start;
    if rows <= k + 1 {
        return None;
    }

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    let mut x = DMatrix::zeros(rows, k);
    let mut y = DVector::zeros(rows);
    for r in 0..rows {
        let t = start + r; // index into `series` of the current observation
        y[r] = diff[t - 1]; // Δy_t
        x[(r, 0)] = 1.0;
        x[(r, 1)] = series[t - 1]; // y_{t-1}
        for l in 1..=lags {
            x[(r, 1 + l)] = diff[t - 1 - l]; // Δy_{t-l}
        }
    }

    let beta = solve_least_squares(&x, &y)?;
    let fitted = &x * &beta;
    let resid = &y - fitted;
    let sse = resid.dot(&resid);

    // Standard error of the lagged-level coefficient via (X'X)^-1.
    let xtx = x.transpose() * &x;
    let xtx_inv = xtx.try_inverse()?;
    let sigma2 = sse / (rows as f64 - k as f64);
    let var_rho = sigma2 * xtx_inv[(1, 1)];
    if !(var_rho.is_finite() && var_rho > 0.0) {
        return None;
    }

    Some(AdfFit {
        t_stat: beta[1] / var_rho.sqrt(),
        sse,
        nobs: rows,
        k,
        lags,
    })
}

fn mackinnon_cv(surface: &[f64; 4], n: usize) -> f64 {
    let nf = n as f64;
    surface[0] + surface[1] / nf + surface[2] / (nf * nf) + surface[3] / (nf * nf * nf)
}

fn mackinnon_pvalue(tau: f64) -> f64 {
    if tau <= TAU_MIN {
        return 0.0;
    }
    if tau >= TAU_MAX {
        return 1.0;
    }

    let z = if tau <= TAU_STAR {
        P_SMALL[0] + P_SMALL[1] * tau + P_SMALL[2] * tau * tau
    } else {
        P_LARGE[0] + P_LARGE[1] * tau + P_LARGE[2] * tau * tau + P_LARGE[3] * tau * tau * tau
    };

    Normal::new(0.0, 1.0).map_or(0.5, |normal| normal.cdf(z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal as NormalDist;

    #[test]
    fn pvalue_at_five_pct_critical_value_is_about_five_pct() {
        // Asymptotic 5% critical value for the constant case is ≈ -2.86.
        let p = mackinnon_pvalue(-2.86);
        assert!((p - 0.05).abs() < 0.01, "p = {p}");
    }

    #[test]
    fn white_noise_is_stationary() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = NormalDist::new(0.0, 1.0).unwrap();
        let series: Vec<f64> = (0..400).map(|_| noise.sample(&mut rng)).collect();

        let result = adf_test(&series, 0.05).unwrap();
        assert!(result.stationary, "stat={}", result.statistic);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn random_walk_is_not_stationary() {
        let mut rng = StdRng::seed_from_u64(11);
        let noise = NormalDist::new(0.0, 1.0).unwrap();
        let mut level = 0.0;
        let series: Vec<f64> = (0..400)
            .map(|_| {
                level += noise.sample(&mut rng);
                level
            })
            .collect();

        let result = adf_test(&series, 0.05).unwrap();
        assert!(!result.stationary, "stat={}", result.statistic);
    }

    #[test]
    fn short_series_yields_none() {
        let series: Vec<f64> = (0..8).map(|i| i as f64).collect();
        assert!(adf_test(&series, 0.05).is_none());
    }

    #[test]
    fn critical_values_are_ordered() {
        let series: Vec<f64> = (0..200).map(|i| ((i * 37) % 97) as f64).collect();
        let result = adf_test(&series, 0.05).unwrap();
        let [c1, c5, c10] = result.critical_values;
        assert!(c1.1 < c5.1 && c5.1 < c10.1);
    }
}
