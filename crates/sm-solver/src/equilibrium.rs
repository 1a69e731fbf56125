//! Equilibrium load angle by root-finding the torque balance.
//!
//! ```text
//! T_max · sin δ − T_load = 0
//! ```
//!
//! The phasor quantities are then recomputed with E lagging V by the solved
//! angle, so `torque` matches the load and, for a lossless stator, agrees with
//! the phasor torque.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use sm_core::MotorParameters;
use tracing::{debug, warn};

use crate::error::{SolverError, SolverResult};
use crate::newton::{NewtonConfig, newton_solve};
use crate::steady::{self, SolveMethod, SteadyStateResult};
use crate::torque::TorqueAngle;

#[derive(Clone, Debug)]
pub struct EquilibriumConfig {
    /// Starting load angle (rad)
    pub initial_guess: f64,
    pub newton: NewtonConfig,
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.1,
            newton: NewtonConfig {
                max_iterations: 100,
                step_tol: 1e-6,
                ..NewtonConfig::default()
            },
        }
    }
}

/// How a caller wants the steady state computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStrategy {
    /// Direct phasor solve only
    #[default]
    Direct,
    /// Equilibrium root-find; non-convergence is returned as an error
    Equilibrium,
    /// Equilibrium root-find, falling back to the direct path on
    /// non-convergence
    #[serde(alias = "fallback")]
    EquilibriumOrDirect,
}

/// Solve for the load angle balancing the load torque.
///
/// # Errors
/// `RootFindNonConvergence` when the load exceeds the pull-out torque or the
/// iteration budget runs out; `DegenerateImpedance` when Xs is zero.
pub fn solve_equilibrium(
    params: &MotorParameters,
    config: &EquilibriumConfig,
) -> SolverResult<SteadyStateResult> {
    let relation = TorqueAngle::from_params(params)?;
    let load = params.load_torque;

    let balance = |x: &DVector<f64>| -> SolverResult<(DVector<f64>, DMatrix<f64>)> {
        let delta = x[0];
        Ok((
            DVector::from_element(1, relation.torque(delta) - load),
            DMatrix::from_element(1, 1, relation.slope(delta)),
        ))
    };

    let x0 = DVector::from_element(1, config.initial_guess);
    let solution = newton_solve(x0, balance, &config.newton)?;
    let delta = solution.x[0];

    debug!(
        delta,
        iterations = solution.iterations,
        backtracks = solution.backtracks,
        residual = solution.residual_norm,
        "equilibrium load angle"
    );

    steady::solve_at_load_angle(params, delta, SolveMethod::Equilibrium)
}

/// Steady state computed with the given strategy and default root-find
/// settings.
pub fn solve_with(
    params: &MotorParameters,
    strategy: SolveStrategy,
) -> SolverResult<SteadyStateResult> {
    match strategy {
        SolveStrategy::Direct => steady::solve(params),
        SolveStrategy::Equilibrium => solve_equilibrium(params, &EquilibriumConfig::default()),
        SolveStrategy::EquilibriumOrDirect => {
            match solve_equilibrium(params, &EquilibriumConfig::default()) {
                Err(err @ SolverError::RootFindNonConvergence { .. }) => {
                    warn!(%err, "equilibrium solve failed, using direct solve");
                    steady::solve(params)
                }
                other => other,
            }
        }
    }
}
