//! Stateless outlier detectors over a single numeric column.
//!
//! Both detectors take the column as `&[Option<f64>]` (missing readings are
//! simply invisible to them) and return the set of flagged *row indices*, so
//! the preprocessor can union flags across detectors and columns before
//! removing rows.
//!
//! Calendar-derived columns (hour, month, day_of_week, is_weekend) must never
//! be scanned: they are categorical, not distributional.

use std::collections::BTreeSet;

use crate::stats;

/// Flag values outside `[Q1 - k·IQR, Q3 + k·IQR]` (k = 1.5 conventionally).
///
/// Quartiles use linear interpolation over the present values. A column with
/// zero IQR flags only values strictly outside the (degenerate) bounds.
pub fn iqr_outliers(column: &[Option<f64>], k: f64) -> BTreeSet<usize> {
    let present: Vec<f64> = column.iter().copied().flatten().collect();
    let mut flagged = BTreeSet::new();

    let (Some(q1), Some(q3)) = (
        stats::quantile(&present, 0.25),
        stats::quantile(&present, 0.75),
    ) else {
        return flagged;
    };

    let iqr = q3 - q1;
    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;

    for (idx, value) in column.iter().enumerate() {
        if let Some(v) = value {
            if *v < lower || *v > upper {
                flagged.insert(idx);
            }
        }
    }
    flagged
}

/// Flag values whose absolute standard score exceeds `threshold` (3.0
/// conventionally). Missing values are dropped before computing the mean and
/// sample standard deviation.
pub fn zscore_outliers(column: &[Option<f64>], threshold: f64) -> BTreeSet<usize> {
    let present: Vec<f64> = column.iter().copied().flatten().collect();
    let mut flagged = BTreeSet::new();

    let (Some(mean), Some(std)) = (stats::mean(&present), stats::sample_std(&present)) else {
        return flagged;
    };
    if std == 0.0 {
        return flagged;
    }

    for (idx, value) in column.iter().enumerate() {
        if let Some(v) = value {
            if ((v - mean) / std).abs() > threshold {
                flagged.insert(idx);
            }
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn iqr_flags_exactly_values_outside_the_fences() {
        // 20 well-behaved values plus one spike on each side.
        let mut values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        values.push(100.0); // index 20
        values.push(-80.0); // index 21

        let flagged = iqr_outliers(&col(&values), 1.5);
        assert_eq!(flagged, BTreeSet::from([20, 21]));
    }

    #[test]
    fn iqr_indices_refer_to_rows_despite_missing_values() {
        let column = vec![Some(1.0), None, Some(2.0), Some(3.0), None, Some(500.0)];
        let flagged = iqr_outliers(&column, 1.5);
        assert_eq!(flagged, BTreeSet::from([5]));
    }

    #[test]
    fn zscore_flags_only_extreme_values() {
        // Tight cluster around 10 with one value far out.
        let mut values = vec![10.0; 30];
        values[0] = 9.5;
        values[1] = 10.5;
        values.push(30.0); // index 30

        let flagged = zscore_outliers(&col(&values), 3.0);
        assert_eq!(flagged, BTreeSet::from([30]));
    }

    #[test]
    fn zscore_drops_missing_before_computing_moments() {
        let column = vec![Some(1.0), Some(1.1), None, Some(0.9), Some(1.0), Some(50.0)];
        let flagged = zscore_outliers(&column, 3.0);
        // Without the None the moments still identify 50.0... but the small
        // sample inflates std; assert the missing entry itself is never flagged.
        assert!(!flagged.contains(&2));
    }

    #[test]
    fn constant_column_flags_nothing() {
        let column = col(&[5.0; 10]);
        assert!(iqr_outliers(&column, 1.5).is_empty());
        assert!(zscore_outliers(&column, 3.0).is_empty());
    }

    #[test]
    fn empty_and_all_missing_columns_flag_nothing() {
        assert!(iqr_outliers(&[], 1.5).is_empty());
        assert!(zscore_outliers(&[None, None], 3.0).is_empty());
    }
}
