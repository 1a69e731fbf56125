//! Operating-point search by bisection over one motor parameter.

use serde::{Deserialize, Serialize};
use sm_core::MotorParameters;
use tracing::debug;

use crate::equilibrium::{SolveStrategy, solve_with};
use crate::error::{SolverError, SolverResult};
use crate::steady::SteadyStateResult;
use crate::sweeps::SweepParameter;

/// Steady-state quantity to drive to a target value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetQuantity {
    PowerFactor,
    ActivePower,
    ReactivePower,
    Torque,
    PhaseCurrent,
    LoadAngle,
}

impl TargetQuantity {
    pub fn extract(self, result: &SteadyStateResult) -> f64 {
        match self {
            Self::PowerFactor => result.power_factor,
            Self::ActivePower => result.active_power,
            Self::ReactivePower => result.reactive_power,
            Self::Torque => result.torque,
            Self::PhaseCurrent => result.phase_current,
            Self::LoadAngle => result.load_angle,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BisectionConfig {
    pub max_iterations: usize,
    /// Bracket half-width at which the search stops (parameter units)
    pub tolerance: f64,
    pub strategy: SolveStrategy,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-9,
            strategy: SolveStrategy::Direct,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperatingPoint {
    pub parameter: SweepParameter,
    /// Parameter value at the operating point
    pub value: f64,
    pub result: SteadyStateResult,
    pub iterations: usize,
}

/// Find the value of `vary` in `range` where `target` equals `target_value`,
/// with default bisection settings.
pub fn find_operating_point(
    params: &MotorParameters,
    target: TargetQuantity,
    target_value: f64,
    vary: SweepParameter,
    range: (f64, f64),
) -> SolverResult<OperatingPoint> {
    find_operating_point_with(
        params,
        target,
        target_value,
        vary,
        range,
        &BisectionConfig::default(),
    )
}

/// # Errors
/// `RootFindNonConvergence` when the target is not bracketed by `range` or
/// the iteration budget runs out; solver errors of any sample.
pub fn find_operating_point_with(
    params: &MotorParameters,
    target: TargetQuantity,
    target_value: f64,
    vary: SweepParameter,
    range: (f64, f64),
    config: &BisectionConfig,
) -> SolverResult<OperatingPoint> {
    let (mut lo, mut hi) = range;
    if !lo.is_finite() || !hi.is_finite() || lo == hi {
        return Err(SolverError::InvalidArg {
            what: format!("invalid search range [{lo}, {hi}]"),
        });
    }

    let evaluate = |value: f64| -> SolverResult<(f64, SteadyStateResult)> {
        let result = solve_with(&vary.with_value(params, value), config.strategy)?;
        Ok((target.extract(&result) - target_value, result))
    };

    let (mut f_lo, lo_result) = evaluate(lo)?;
    if f_lo == 0.0 {
        return Ok(OperatingPoint {
            parameter: vary,
            value: lo,
            result: lo_result,
            iterations: 0,
        });
    }
    let (f_hi, hi_result) = evaluate(hi)?;
    if f_hi == 0.0 {
        return Ok(OperatingPoint {
            parameter: vary,
            value: hi,
            result: hi_result,
            iterations: 0,
        });
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(SolverError::RootFindNonConvergence {
            iterations: 0,
            residual: f_lo.abs().min(f_hi.abs()),
            reason: "target not bracketed by search range",
        });
    }

    for iter in 1..=config.max_iterations {
        let mid = 0.5 * (lo + hi);
        let (f_mid, result) = evaluate(mid)?;

        if f_mid == 0.0 || 0.5 * (hi - lo).abs() < config.tolerance {
            debug!(%vary, value = mid, residual = f_mid, iterations = iter, "operating point");
            return Ok(OperatingPoint {
                parameter: vary,
                value: mid,
                result,
                iterations: iter,
            });
        }

        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(SolverError::RootFindNonConvergence {
        iterations: config.max_iterations,
        residual: f_lo.abs(),
        reason: "maximum iterations reached",
    })
}
