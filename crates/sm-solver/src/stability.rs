//! Torque-angle stability analysis.
//!
//! Samples `T_e(δ)` over a load-angle range, differentiates it numerically
//! and classifies each sample by the sign of `dT_e/dδ`.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::Serialize;
use sm_core::{MotorParameters, gradient, linspace};
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::torque::TorqueAngle;

/// Default stability sweep range (rad).
pub const DEFAULT_STABILITY_RANGE: (f64, f64) = (-FRAC_PI_2, FRAC_PI_2);
pub const DEFAULT_STABILITY_POINTS: usize = 100;

/// Default torque-angle curve range (rad).
pub const DEFAULT_CURVE_RANGE: (f64, f64) = (0.0, PI);

/// Sampled torque-angle characteristic.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StabilityCurve {
    /// Load angle samples (rad)
    pub delta: Vec<f64>,
    /// Electromagnetic torque at each sample (N·m)
    pub torque: Vec<f64>,
    /// Finite-difference dT_e/dδ (N·m/rad)
    pub slope: Vec<f64>,
    /// `slope < 0` at each sample
    pub stable: Vec<bool>,
    /// Largest sampled torque (N·m)
    pub max_torque: f64,
    /// Load angle of the first sample reaching `max_torque` (rad)
    pub delta_at_max: f64,
}

impl StabilityCurve {
    pub fn len(&self) -> usize {
        self.delta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }

    /// Number of samples flagged stable.
    pub fn stable_count(&self) -> usize {
        self.stable.iter().filter(|s| **s).count()
    }
}

fn check_range(range: (f64, f64), num_points: usize) -> SolverResult<()> {
    if num_points < 2 {
        return Err(SolverError::InvalidArg {
            what: format!("stability sweep needs at least 2 points, got {num_points}"),
        });
    }
    let (start, end) = range;
    if !start.is_finite() || !end.is_finite() || end <= start {
        return Err(SolverError::InvalidArg {
            what: format!("empty load angle range [{start}, {end}]"),
        });
    }
    Ok(())
}

/// Sweep the torque-angle relation over `delta_range` (rad).
///
/// # Errors
/// `InvalidArg` for fewer than 2 points or an empty range;
/// `DegenerateImpedance` when Xs is zero.
pub fn sweep(
    params: &MotorParameters,
    delta_range: (f64, f64),
    num_points: usize,
) -> SolverResult<StabilityCurve> {
    check_range(delta_range, num_points)?;
    let relation = TorqueAngle::from_params(params)?;

    let delta = linspace(delta_range.0, delta_range.1, num_points);
    let torque: Vec<f64> = delta.iter().map(|&d| relation.torque(d)).collect();
    let slope = gradient(&delta, &torque);
    let stable = slope.iter().map(|&s| s < 0.0).collect();

    // First maximum wins on ties
    let mut i_max = 0;
    for (i, &t) in torque.iter().enumerate() {
        if t > torque[i_max] {
            i_max = i;
        }
    }

    debug!(
        num_points,
        max_torque = torque[i_max],
        delta_at_max = delta[i_max],
        "stability sweep"
    );

    Ok(StabilityCurve {
        max_torque: torque[i_max],
        delta_at_max: delta[i_max],
        delta,
        torque,
        slope,
        stable,
    })
}

/// Stability sweep over the default range and sample count.
pub fn sweep_default(params: &MotorParameters) -> SolverResult<StabilityCurve> {
    sweep(params, DEFAULT_STABILITY_RANGE, DEFAULT_STABILITY_POINTS)
}

/// `(δ, T_e)` samples of the torque-angle characteristic.
pub fn torque_angle_curve(
    params: &MotorParameters,
    delta_range: (f64, f64),
    num_points: usize,
) -> SolverResult<(Vec<f64>, Vec<f64>)> {
    check_range(delta_range, num_points)?;
    let relation = TorqueAngle::from_params(params)?;
    let delta = linspace(delta_range.0, delta_range.1, num_points);
    let torque = delta.iter().map(|&d| relation.torque(d)).collect();
    Ok((delta, torque))
}

/// Analytic pull-out torque T_max (N·m).
pub fn maximum_torque(params: &MotorParameters) -> SolverResult<f64> {
    Ok(TorqueAngle::from_params(params)?.max_torque)
}
