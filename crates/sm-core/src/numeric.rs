//! Float helpers shared by the solvers: comparisons, finiteness checks and
//! sample grids.

use crate::CoreError;

pub type Real = f64;

/// Absolute/relative comparison bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    /// Round-trip conversions (speed, angle, polar form).
    pub const CONVERSION: Self = Self {
        abs: 1e-12,
        rel: 1e-9,
    };

    /// Quantities produced by an iterative solve.
    pub const SOLVER: Self = Self {
        abs: 1e-9,
        rel: 1e-6,
    };
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::CONVERSION
    }
}

/// `|a − b| <= abs`, or within `rel` of the larger magnitude.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Pass `v` through, or name it in a `NonFinite` error.
pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// `num_points` evenly spaced samples over `[start, end]`, endpoints exact.
pub fn linspace(start: Real, end: Real, num_points: usize) -> Vec<Real> {
    match num_points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as Real;
            let mut points: Vec<Real> = (0..n).map(|i| start + i as Real * step).collect();
            points[n - 1] = end;
            points
        }
    }
}

/// Geometrically spaced samples over `[start, end]`, endpoints exact.
/// Both bounds must be positive.
pub fn logspace(start: Real, end: Real, num_points: usize) -> Vec<Real> {
    let mut points: Vec<Real> = linspace(start.ln(), end.ln(), num_points)
        .into_iter()
        .map(Real::exp)
        .collect();
    if let Some(first) = points.first_mut() {
        *first = start;
    }
    if num_points > 1 {
        points[num_points - 1] = end;
    }
    points
}

/// dy/dx of sampled data: centered differences inside, one-sided at the ends.
///
/// Fewer than 2 samples give zeros.
pub fn gradient(x: &[Real], y: &[Real]) -> Vec<Real> {
    let n = x.len().min(y.len());
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|i| {
            let (lo, hi) = (i.saturating_sub(1), (i + 1).min(n - 1));
            (y[hi] - y[lo]) / (x[hi] - x[lo])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances::CONVERSION;
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
        assert!(nearly_equal(1.0, 1.0 + 1e-7, Tolerances::SOLVER));
    }

    #[test]
    fn ensure_finite_names_the_value() {
        let err = ensure_finite(Real::NAN, "phase current").unwrap_err();
        assert!(err.to_string().contains("phase current"));
        assert_eq!(ensure_finite(2.5, "x").unwrap(), 2.5);
    }

    #[test]
    fn linspace_hits_both_ends() {
        let pts = linspace(0.5, 4.0, 20);
        assert_eq!(pts.len(), 20);
        assert_eq!(pts[0], 0.5);
        assert_eq!(pts[19], 4.0);
        let step = pts[1] - pts[0];
        assert!(pts.windows(2).all(|w| (w[1] - w[0] - step).abs() < 1e-12));
    }

    #[test]
    fn linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
    }

    #[test]
    fn logspace_is_geometric() {
        let pts = logspace(10.0, 1000.0, 3);
        assert_eq!(pts[0], 10.0);
        assert!((pts[1] - 100.0).abs() < 1e-9);
        assert_eq!(pts[2], 1000.0);
        assert_eq!(logspace(5.0, 50.0, 1), vec![5.0]);
    }

    #[test]
    fn gradient_of_parabola() {
        let x = linspace(0.0, 1.0, 11);
        let y: Vec<Real> = x.iter().map(|v| v * v).collect();
        let dy = gradient(&x, &y);

        // Centered differences are exact for a parabola
        for i in 1..10 {
            assert!((dy[i] - 2.0 * x[i]).abs() < 1e-12);
        }
        // One-sided ends are off by h
        assert!((dy[0] - 0.1).abs() < 1e-12);
        assert!((dy[10] - 1.9).abs() < 1e-12);
    }
}
