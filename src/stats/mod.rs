//! Descriptive statistics: moments, quantiles, and correlations.
//!
//! All functions take plain `&[f64]` slices and return `Option` for
//! underdetermined inputs (too few samples, zero variance) instead of
//! producing NaNs that would leak into reports.
//!
//! Skewness and kurtosis use the bias-adjusted (sample) estimators so the
//! numbers line up with what analysts expect from spreadsheet/dataframe
//! tooling: kurtosis is *excess* kurtosis (normal ≈ 0).

pub mod adf;
pub mod decompose;

/// Descriptive summary of one numeric column.
#[derive(Debug, Clone)]
pub struct Summary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
    pub skewness: f64,
    /// Excess kurtosis (0 for a normal distribution).
    pub kurtosis: f64,
}

/// Pairwise Pearson correlations over named columns.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major `labels.len() x labels.len()`; diagonal is 1.
    pub values: Vec<Vec<f64>>,
}

/// Arithmetic mean. `None` on an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1 denominator). `None` for fewer than 2 samples.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    Some((ss / (n as f64 - 1.0)).sqrt())
}

/// Linear-interpolation quantile, `q` in [0, 1].
///
/// Matches the "linear" method used by dataframe libraries: for sorted values
/// `v_0..v_{n-1}`, the quantile sits at fractional rank `q * (n - 1)`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = q * (sorted.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Bias-adjusted sample skewness. `None` for fewer than 3 samples; 0 for a
/// constant column.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let m = mean(values)?;
    let s = sample_std(values)?;
    if s == 0.0 {
        return Some(0.0);
    }

    let nf = n as f64;
    let m3 = values.iter().map(|v| ((v - m) / s).powi(3)).sum::<f64>();
    Some(nf / ((nf - 1.0) * (nf - 2.0)) * m3)
}

/// Bias-adjusted excess kurtosis. `None` for fewer than 4 samples; 0 for a
/// constant column.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let m = mean(values)?;
    let s = sample_std(values)?;
    if s == 0.0 {
        return Some(0.0);
    }

    let nf = n as f64;
    let m4 = values.iter().map(|v| ((v - m) / s).powi(4)).sum::<f64>();
    let lead = nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0));
    let correction = 3.0 * (nf - 1.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0));
    Some(lead * m4 - correction)
}

/// Full descriptive summary of one column. `None` when the column is too
/// short to summarize (fewer than 4 samples).
pub fn summarize(name: &str, values: &[f64]) -> Option<Summary> {
    if values.len() < 4 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Summary {
        name: name.to_string(),
        count: values.len(),
        mean: mean(values)?,
        std: sample_std(values)?,
        min,
        q25: quantile(values, 0.25)?,
        q50: quantile(values, 0.50)?,
        q75: quantile(values, 0.75)?,
        max,
        skewness: skewness(values)?,
        kurtosis: kurtosis(values)?,
    })
}

/// Pearson correlation between two equally long columns.
///
/// Returns `None` for mismatched/short inputs or zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let ma = mean(a)?;
    let mb = mean(b)?;

    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        cov += (x - ma) * (y - mb);
        va += (x - ma) * (x - ma);
        vb += (y - mb) * (y - mb);
    }

    if va == 0.0 || vb == 0.0 {
        return None;
    }
    Some(cov / (va.sqrt() * vb.sqrt()))
}

/// Pairwise correlation matrix over named columns.
///
/// Pairs with undefined correlation (constant columns) are reported as 0 so
/// the heatmap stays rectangular.
pub fn correlation_matrix(columns: &[(String, Vec<f64>)]) -> CorrelationMatrix {
    let k = columns.len();
    let mut values = vec![vec![0.0; k]; k];

    for i in 0..k {
        values[i][i] = 1.0;
        for j in (i + 1)..k {
            let r = pearson(&columns[i].1, &columns[j].1).unwrap_or(0.0);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        labels: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0).unwrap(), 1.0);
        assert_eq!(quantile(&values, 1.0).unwrap(), 4.0);
        assert!((quantile(&values, 0.25).unwrap() - 1.75).abs() < 1e-12);
        assert!((quantile(&values, 0.5).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn sample_std_matches_hand_calc() {
        // Values 2,4,4,4,5,5,7,9: mean 5, sample variance 32/7.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = sample_std(&values).unwrap();
        assert!((s - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn skewness_zero_for_symmetric_data() {
        let values = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(skewness(&values).unwrap().abs() < 1e-12);
    }

    #[test]
    fn skewness_positive_for_right_tail() {
        let values = [1.0, 1.0, 1.0, 1.0, 10.0];
        assert!(skewness(&values).unwrap() > 1.0);
    }

    #[test]
    fn pearson_detects_perfect_linear_relation() {
        let a: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let b: Vec<f64> = a.iter().map(|x| 3.0 * x + 1.0).collect();
        let c: Vec<f64> = a.iter().map(|x| -x).collect();
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &c).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let cols = vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
            ("b".to_string(), vec![2.0, 1.0, 4.0, 3.0]),
            ("c".to_string(), vec![5.0, 5.0, 5.0, 5.0]), // constant
        ];
        let m = correlation_matrix(&cols);
        for i in 0..3 {
            assert_eq!(m.values[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
        // Constant column correlates as 0 with everything off-diagonal.
        assert_eq!(m.values[0][2], 0.0);
    }

    #[test]
    fn summarize_requires_enough_samples() {
        assert!(summarize("x", &[1.0, 2.0, 3.0]).is_none());
        assert!(summarize("x", &[1.0, 2.0, 3.0, 4.0]).is_some());
    }
}
