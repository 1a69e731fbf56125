//! Steady-state phasor solution.
//!
//! Per-phase model with the terminal voltage as the reference phasor:
//!
//! ```text
//! V = E + (Rs + jXs) · I      =>      I = (V − E) / (Rs + jXs)
//! ```
//!
//! The load angle is the angle by which E lags V (motor convention), so a
//! positive angle produces positive torque in `T_max · sin δ`. On the direct
//! path E sits at 0° and the load angle is zero; the equilibrium path in
//! [`crate::equilibrium`] places E at the solved angle.

use serde::Serialize;
use sm_core::conversions::{
    deg_to_rad, line_current, normalize_angle_deg, polar_to_rectangular, power_factor,
    rad_to_deg, rectangular_to_polar,
};
use sm_core::{Complex, MotorParameters, PowerFactorKind, ensure_finite};
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::torque::TorqueAngle;

/// Which solve path produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveMethod {
    /// Linear phasor solve with E at 0°
    Direct,
    /// Root-find of the torque balance, E placed at the solved load angle
    Equilibrium,
}

/// Immutable steady-state snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SteadyStateResult {
    pub method: SolveMethod,

    // Input echo
    pub line_voltage: f64,
    pub phase_voltage: f64,
    pub frequency: f64,
    pub field_current: f64,
    pub load_torque: f64,

    /// Synchronous speed (rad/s)
    pub synchronous_speed: f64,
    /// Synchronous speed (RPM)
    pub synchronous_speed_rpm: f64,

    /// Load angle δ (rad), positive when E lags V
    pub load_angle: f64,
    pub load_angle_deg: f64,

    pub emf_magnitude: f64,
    pub emf_angle_deg: f64,

    /// Phase current magnitude (A)
    pub phase_current: f64,
    /// Line current magnitude (A)
    pub line_current: f64,
    /// Current phasor angle relative to V (deg)
    pub current_angle_deg: f64,

    /// Electromagnetic torque from `T_max · sin δ` (N·m). Falls back to the
    /// phasor torque when Xs is zero and the closed form is undefined.
    pub torque: f64,
    /// Electromagnetic torque from `3 · Re(V · conj(I)) / ω_s` (N·m)
    pub torque_phasor: f64,
    /// Pull-out torque, `None` when Xs is zero
    pub max_torque: Option<f64>,

    /// Three-phase apparent power S (VA)
    pub apparent_power: f64,
    /// Three-phase active power P (W)
    pub active_power: f64,
    /// Three-phase reactive power Q = 3·|V|·|I|·sin(∠I − ∠V) (var). Negative
    /// for lagging current (under-excited), positive for leading current.
    pub reactive_power: f64,
    pub power_factor: f64,
    pub power_factor_kind: PowerFactorKind,
}

impl SteadyStateResult {
    pub fn voltage_phasor(&self) -> Complex<f64> {
        polar_to_rectangular(self.phase_voltage, 0.0)
    }

    pub fn emf_phasor(&self) -> Complex<f64> {
        polar_to_rectangular(self.emf_magnitude, self.emf_angle_deg)
    }

    pub fn current_phasor(&self) -> Complex<f64> {
        polar_to_rectangular(self.phase_current, self.current_angle_deg)
    }

    /// Difference between the closed-form and phasor torque (N·m).
    ///
    /// Zero only when both formulas describe the same operating point
    /// (equilibrium path with Rs = 0). The direct path reports δ = 0 and
    /// therefore no closed-form torque while the phasor current still
    /// carries active power.
    pub fn torque_discrepancy(&self) -> f64 {
        self.torque - self.torque_phasor
    }
}

/// Direct phasor solve with E at 0°.
///
/// # Errors
/// `DegenerateImpedance` when Rs and Xs are both zero; `Core(NonFinite)` when
/// an output is not finite.
pub fn solve(params: &MotorParameters) -> SolverResult<SteadyStateResult> {
    solve_at_load_angle(params, 0.0, SolveMethod::Direct)
}

/// Phasor solve with E lagging V by `load_angle` (rad).
pub(crate) fn solve_at_load_angle(
    params: &MotorParameters,
    load_angle: f64,
    method: SolveMethod,
) -> SolverResult<SteadyStateResult> {
    let rs = params.stator_resistance;
    let xs = params.synchronous_reactance();
    if rs == 0.0 && xs == 0.0 {
        return Err(SolverError::DegenerateImpedance { rs, xs });
    }

    let v = params.phase_voltage();
    let e = params.internal_emf();
    let omega_s = ensure_finite(params.synchronous_speed(), "synchronous speed")?;

    let emf_angle_deg = normalize_angle_deg(-rad_to_deg(load_angle));
    let v_phasor = polar_to_rectangular(v, 0.0);
    let e_phasor = polar_to_rectangular(e, emf_angle_deg);
    let impedance = Complex::new(rs, xs);
    let i_phasor = (v_phasor - e_phasor) / impedance;

    let (_, v_angle_deg) = rectangular_to_polar(v_phasor);
    let (i_mag, i_angle_deg) = rectangular_to_polar(i_phasor);
    let load_angle_deg = normalize_angle_deg(v_angle_deg - emf_angle_deg);
    let load_angle = deg_to_rad(load_angle_deg);

    // Power angle φ = ∠I − ∠V; Q follows the sign of φ
    let phi = deg_to_rad(i_angle_deg - v_angle_deg);
    let apparent_power = ensure_finite(3.0 * v * i_mag, "apparent power")?;
    let active_power = ensure_finite(apparent_power * phi.cos(), "active power")?;
    let reactive_power = ensure_finite(apparent_power * phi.sin(), "reactive power")?;
    let (pf, pf_kind) = power_factor(active_power, apparent_power);

    let torque_phasor = ensure_finite(active_power / omega_s, "phasor torque")?;
    let closed_form = if xs != 0.0 {
        Some(TorqueAngle::from_params(params)?)
    } else {
        None
    };
    let torque = closed_form.map_or(torque_phasor, |t| t.torque(load_angle));

    debug!(
        ?method,
        load_angle_deg,
        current = i_mag,
        torque,
        torque_phasor,
        "steady-state solve"
    );

    Ok(SteadyStateResult {
        method,
        line_voltage: params.line_voltage,
        phase_voltage: v,
        frequency: params.frequency,
        field_current: params.field_current,
        load_torque: params.load_torque,
        synchronous_speed: omega_s,
        synchronous_speed_rpm: params.synchronous_speed_rpm(),
        load_angle,
        load_angle_deg,
        emf_magnitude: e,
        emf_angle_deg,
        phase_current: ensure_finite(i_mag, "phase current")?,
        line_current: line_current(i_mag, params.connection),
        current_angle_deg: i_angle_deg,
        torque,
        torque_phasor,
        max_torque: closed_form.map(|t| t.max_torque),
        apparent_power,
        active_power,
        reactive_power,
        power_factor: pf,
        power_factor_kind: pf_kind,
    })
}
