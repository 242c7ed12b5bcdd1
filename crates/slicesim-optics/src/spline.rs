//! Natural cubic spline through tabulated component data.
//!
//! Coefficients and pupil diameters are supplied at a handful of design
//! wavelengths; the spline gives a smooth value in between.

use crate::error::OpticsError;

/// A natural cubic spline for real-valued data.
///
/// Given $n$ knots $(x_i, y_i)$, builds piecewise cubics with continuous first
/// and second derivatives and zero curvature at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot.
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Build a spline from strictly increasing `xs` and matching `ys`.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, OpticsError> {
        if xs.len() != ys.len() {
            return Err(OpticsError::InvalidTable(format!(
                "{} abscissae but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(OpticsError::InvalidTable(format!(
                "a spline needs at least 2 knots, got {}",
                xs.len()
            )));
        }
        if let Some(i) = (1..xs.len()).find(|&i| !(xs[i] > xs[i - 1])) {
            return Err(OpticsError::InvalidTable(format!(
                "abscissae must be strictly increasing (index {}: {} after {})",
                i,
                xs[i],
                xs[i - 1]
            )));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(OpticsError::InvalidTable("non-finite table entry".into()));
        }

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // Tridiagonal forward sweep
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            u[i] = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]) - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * u[i] / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        for k in (0..n - 2).rev() {
            y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, y2s })
    }

    /// Knot range `(first, last)`.
    pub fn range(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluate at `x`. Outside the knots the end polynomials are extended.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();

        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.xs[mid] > x {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }
}
