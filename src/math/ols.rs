//! Ordinary least squares on a single regressor.
//!
//! The forecaster only ever fits `y ≈ slope * x + intercept`, so we use the
//! closed form directly instead of a general solver:
//!
//! ```text
//! slope     = Σ (x_i - x̄)(y_i - ȳ) / Σ (x_i - x̄)^2
//! intercept = ȳ - slope * x̄
//! ```
//!
//! The `1/n` factors of covariance and variance cancel, so centered dot
//! products are enough.

use nalgebra::DVector;

/// Fitted line coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Fit a least-squares line through `(x_i, y_i)`.
///
/// Returns `None` when the fit is undefined: fewer than two points,
/// mismatched lengths, or zero variance in `x`.
pub fn fit_line(x: &DVector<f64>, y: &DVector<f64>) -> Option<LineFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let x_mean = x.mean();
    let y_mean = y.mean();
    let xc = x.add_scalar(-x_mean);
    let yc = y.add_scalar(-y_mean);

    let var = xc.dot(&xc);
    if !(var.is_finite() && var > 0.0) {
        return None;
    }

    let slope = xc.dot(&yc) / var;
    let intercept = y_mean - slope * x_mean;
    if !(slope.is_finite() && intercept.is_finite()) {
        return None;
    }

    Some(LineFit { slope, intercept })
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant `y` has `SS_tot = 0`; it scores 1 when the predictions are
/// exact and 0 otherwise.
pub fn r_squared(y: &DVector<f64>, y_hat: &DVector<f64>) -> f64 {
    let ss_res = (y - y_hat).norm_squared();
    let ss_tot = y.add_scalar(-y.mean()).norm_squared();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_line_recovers_exact_line() {
        // y = 2 + 3x on x = [0,1,2]
        let x = DVector::from_row_slice(&[0.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-12);
        assert!((fit.intercept - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fit_line_rejects_degenerate_input() {
        let one = DVector::from_row_slice(&[1.0]);
        assert!(fit_line(&one, &one).is_none());

        let flat_x = DVector::from_row_slice(&[3.0, 3.0, 3.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(fit_line(&flat_x, &y).is_none());
    }

    #[test]
    fn r_squared_of_noisy_fit_is_between_zero_and_one() {
        let x = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 2.0, 4.0]);
        let fit = fit_line(&x, &y).unwrap();
        let y_hat = x.map(|v| fit.slope * v + fit.intercept);

        let r2 = r_squared(&y, &y_hat);
        // slope 0.8, SS_res 1.8, SS_tot 5.0
        assert!((r2 - 0.64).abs() < 1e-12);
    }

    #[test]
    fn r_squared_of_constant_series() {
        let y = DVector::from_row_slice(&[5.0, 5.0]);
        assert_eq!(r_squared(&y, &y.clone()), 1.0);
        let off = DVector::from_row_slice(&[4.0, 6.0]);
        assert_eq!(r_squared(&y, &off), 0.0);
    }
}
