//! Closed-form torque/load-angle relation.
//!
//! ```text
//! T_e(δ) = T_max · sin δ,    T_max = 3 · V_phase · E / (ω_s · Xs)
//! ```
//!
//! This is the authoritative torque formula: the transient model, the
//! stability sweep and the equilibrium root-find all evaluate it. The
//! phasor-derived torque in [`crate::steady`] is kept as a cross-check.

use sm_core::{MotorParameters, ensure_finite};

use crate::error::{SolverError, SolverResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorqueAngle {
    /// Pull-out torque T_max (N·m)
    pub max_torque: f64,
}

impl TorqueAngle {
    /// # Errors
    /// `DegenerateImpedance` when Xs is zero, `Core(NonFinite)` when the
    /// result is not finite (e.g. zero frequency).
    pub fn from_params(params: &MotorParameters) -> SolverResult<Self> {
        let xs = params.synchronous_reactance();
        if xs == 0.0 {
            return Err(SolverError::DegenerateImpedance {
                rs: params.stator_resistance,
                xs,
            });
        }

        let t_max =
            3.0 * params.phase_voltage() * params.internal_emf() / (params.synchronous_speed() * xs);

        Ok(Self {
            max_torque: ensure_finite(t_max, "maximum torque")?,
        })
    }

    /// Electromagnetic torque at load angle `delta` (rad).
    #[inline]
    pub fn torque(&self, delta: f64) -> f64 {
        self.max_torque * delta.sin()
    }

    /// dT_e/dδ at `delta` (rad).
    #[inline]
    pub fn slope(&self, delta: f64) -> f64 {
        self.max_torque * delta.cos()
    }
}
