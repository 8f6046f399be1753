//! Least squares solver.
//!
//! Both the degree-1 trend line in the analyzer and the demand regression in
//! the modeler reduce to ordinary least squares on a small design matrix:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (many more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - One-hot day-of-week columns can be nearly collinear with the intercept on
//!   short spans, so we try progressively looser singular-value tolerances
//!   before giving up.
//! - The parameter dimension is tiny (≤ 10 columns), so SVD performance is a
//!   non-issue for in-memory datasets.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = intercept + slope * x` over paired samples.
///
/// Returns `(intercept, slope)`, or `None` for fewer than two points or a
/// degenerate system.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len();
    let mut design = DMatrix::zeros(n, 2);
    for (i, &x) in xs.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x;
    }
    let target = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &target)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_slope_and_intercept() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 1.5 - 0.25 * x).collect();

        let (intercept, slope) = fit_line(&xs, &ys).unwrap();
        assert!((intercept - 1.5).abs() < 1e-10);
        assert!((slope + 0.25).abs() < 1e-10);
    }

    #[test]
    fn fit_line_rejects_single_point() {
        assert!(fit_line(&[1.0], &[2.0]).is_none());
    }
}
