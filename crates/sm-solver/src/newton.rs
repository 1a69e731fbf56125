//! Damped Newton iteration for small nonlinear systems.
//!
//! Steps are capped in the max norm and then halved until the residual
//! decreases. Used for the load-angle equilibrium, where the unknown is an
//! angle and an uncapped step off a near-flat torque curve lands on the wrong
//! branch.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

#[derive(Clone, Debug)]
pub struct NewtonConfig {
    pub max_iterations: usize,
    /// Converged when max |r_i| falls below this
    pub residual_tol: f64,
    /// Converged when the accepted step is below `step_tol · (1 + |x|)`
    pub step_tol: f64,
    /// Largest allowed max-norm step
    pub max_step: f64,
    /// Step reduction factor while backtracking
    pub backtrack: f64,
    pub max_backtracks: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            residual_tol: 1e-9,
            step_tol: 1e-14,
            max_step: 0.5,
            backtrack: 0.5,
            max_backtracks: 30,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewtonResult {
    pub x: DVector<f64>,
    /// max |r_i| at `x`
    pub residual_norm: f64,
    pub iterations: usize,
    /// Total step halvings over the run
    pub backtracks: usize,
}

/// Solve `r(x) = 0` from `x0`.
///
/// `system` returns the residual and its Jacobian at a point.
///
/// # Errors
/// `RootFindNonConvergence` for a singular Jacobian, a non-finite residual,
/// a line search that cannot reduce the residual, or an exhausted iteration
/// budget. Errors from `system` are passed through.
pub fn newton_solve<S>(
    x0: DVector<f64>,
    mut system: S,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    S: FnMut(&DVector<f64>) -> SolverResult<(DVector<f64>, DMatrix<f64>)>,
{
    let fail = |iterations, residual, reason| SolverError::RootFindNonConvergence {
        iterations,
        residual,
        reason,
    };

    let mut x = x0;
    let (mut r, mut jac) = system(&x)?;
    let mut r_norm = r.amax();
    let mut backtracks = 0;

    for iter in 0..config.max_iterations {
        if !r_norm.is_finite() {
            return Err(fail(iter, r_norm, "residual became non-finite"));
        }
        if r_norm < config.residual_tol {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                backtracks,
            });
        }

        let mut dx = jac
            .clone()
            .lu()
            .solve(&(-&r))
            .ok_or_else(|| fail(iter, r_norm, "singular Jacobian"))?;
        let step = dx.amax();
        if !step.is_finite() {
            return Err(fail(iter, r_norm, "singular Jacobian"));
        }
        if step > config.max_step {
            dx *= config.max_step / step;
        }

        let mut accepted = None;
        for _ in 0..=config.max_backtracks {
            let x_try = &x + &dx;
            let (r_try, jac_try) = system(&x_try)?;
            let norm_try = r_try.amax();
            if norm_try.is_finite() && norm_try < r_norm {
                accepted = Some((x_try, r_try, jac_try, norm_try));
                break;
            }
            dx *= config.backtrack;
            backtracks += 1;
        }
        let Some((x_new, r_new, jac_new, norm_new)) = accepted else {
            return Err(fail(iter, r_norm, "line search stagnated"));
        };

        let moved = (&x_new - &x).amax();
        let scale = 1.0 + x_new.amax();
        x = x_new;
        r = r_new;
        jac = jac_new;
        r_norm = norm_new;

        if moved < config.step_tol * scale && r_norm < config.residual_tol.sqrt() {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter + 1,
                backtracks,
            });
        }
    }

    if r_norm < config.residual_tol {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
            backtracks,
        });
    }
    Err(fail(
        config.max_iterations,
        r_norm,
        "maximum iterations reached",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(
        f: impl Fn(f64) -> (f64, f64),
    ) -> impl FnMut(&DVector<f64>) -> SolverResult<(DVector<f64>, DMatrix<f64>)> {
        move |x| {
            let (r, dr) = f(x[0]);
            Ok((DVector::from_element(1, r), DMatrix::from_element(1, 1, dr)))
        }
    }

    #[test]
    fn sine_balance_converges() {
        // 200 sin x = 50 from the usual starting angle
        let system = scalar(|x| (200.0 * x.sin() - 50.0, 200.0 * x.cos()));
        let x0 = DVector::from_element(1, 0.1);
        let result = newton_solve(x0, system, &NewtonConfig::default()).unwrap();

        assert!((result.x[0] - 0.25_f64.asin()).abs() < 1e-10);
        assert!(result.residual_norm < 1e-9);
        assert!(result.iterations < 10);
    }

    #[test]
    fn step_cap_keeps_flat_start_on_branch() {
        // Started near the peak the raw step would jump far past π
        let system = scalar(|x| (x.sin() - 0.5, x.cos()));
        let x0 = DVector::from_element(1, 1.55);
        let result = newton_solve(x0, system, &NewtonConfig::default()).unwrap();
        assert!((result.x[0] - std::f64::consts::FRAC_PI_6).abs() < 1e-9);
    }

    #[test]
    fn two_unknowns() {
        // x + y = 3, x y = 2 from (0.5, 2.8): root (1, 2)
        let system = |v: &DVector<f64>| -> SolverResult<(DVector<f64>, DMatrix<f64>)> {
            let (x, y) = (v[0], v[1]);
            let r = DVector::from_vec(vec![x + y - 3.0, x * y - 2.0]);
            let j = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, y, x]);
            Ok((r, j))
        };
        let x0 = DVector::from_vec(vec![0.5, 2.8]);
        let result = newton_solve(x0, system, &NewtonConfig::default()).unwrap();
        assert!((result.x[0] - 1.0).abs() < 1e-9);
        assert!((result.x[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn unreachable_target_is_reported() {
        // sin x = 2 has no real root
        let system = scalar(|x| (x.sin() - 2.0, x.cos()));
        let x0 = DVector::from_element(1, 0.3);
        let err = newton_solve(x0, system, &NewtonConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::RootFindNonConvergence { .. }));
    }

    #[test]
    fn singular_jacobian_is_reported() {
        let system = scalar(|x| (x * x + 1.0, 0.0));
        let x0 = DVector::from_element(1, 1.0);
        let err = newton_solve(x0, system, &NewtonConfig::default()).unwrap_err();
        match err {
            SolverError::RootFindNonConvergence { reason, .. } => {
                assert_eq!(reason, "singular Jacobian")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
