//! Synchronous machine rotor model.
//!
//! State x = [ω_m, δ]:
//!
//! ```text
//! dω_m/dt = (T_e(δ) − T_load − B·ω_m) / J
//! dδ/dt   = ω_s − ω_m
//! ```
//!
//! with `T_e(δ) = T_max · sin δ` from [`sm_solver::TorqueAngle`]. Load torque
//! and excitation are constant for the lifetime of a model value.

use serde::{Deserialize, Serialize};
use sm_core::MotorParameters;
use sm_solver::TorqueAngle;

use crate::error::SimResult;
use crate::model::TransientModel;
use crate::shaft::Shaft;

/// Rotor state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineState {
    /// Mechanical speed ω_m (rad/s)
    pub omega_m: f64,
    /// Load angle δ (rad)
    pub delta: f64,
}

impl MachineState {
    pub fn new(omega_m: f64, delta: f64) -> Self {
        Self { omega_m, delta }
    }
}

#[derive(Clone, Debug)]
pub struct SynchronousMachine {
    pub shaft: Shaft,
    pub torque: TorqueAngle,
    /// Load torque (N·m)
    pub load_torque: f64,
    /// Synchronous speed ω_s (rad/s)
    pub synchronous_speed: f64,
    initial: MachineState,
}

impl SynchronousMachine {
    /// Build the rotor model from a parameter snapshot.
    ///
    /// # Errors
    /// Negative inertia or damping, zero synchronous reactance or a
    /// non-finite pull-out torque.
    pub fn new(params: &MotorParameters, initial: MachineState) -> SimResult<Self> {
        Ok(Self {
            shaft: Shaft::new(params.inertia, params.damping)?,
            torque: TorqueAngle::from_params(params)?,
            load_torque: params.load_torque,
            synchronous_speed: params.synchronous_speed(),
            initial,
        })
    }

    /// Electromagnetic torque T_e at load angle `delta` (N·m).
    pub fn electromagnetic_torque(&self, delta: f64) -> f64 {
        self.torque.torque(delta)
    }
}

impl TransientModel for SynchronousMachine {
    type State = MachineState;

    fn initial_state(&self) -> MachineState {
        self.initial
    }

    fn rhs(&mut self, _t: f64, x: &MachineState) -> SimResult<MachineState> {
        let t_e = self.electromagnetic_torque(x.delta);
        Ok(MachineState {
            omega_m: self
                .shaft
                .angular_acceleration(&[t_e, -self.load_torque], x.omega_m),
            delta: self.synchronous_speed - x.omega_m,
        })
    }

    fn add(&self, a: &MachineState, b: &MachineState) -> MachineState {
        MachineState {
            omega_m: a.omega_m + b.omega_m,
            delta: a.delta + b.delta,
        }
    }

    fn scale(&self, a: &MachineState, scale: f64) -> MachineState {
        MachineState {
            omega_m: a.omega_m * scale,
            delta: a.delta * scale,
        }
    }

    fn components(&self, x: &MachineState) -> Vec<f64> {
        vec![x.omega_m, x.delta]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_load_synchronous_point_is_equilibrium() {
        let params = MotorParameters {
            load_torque: 0.0,
            damping: 0.0,
            ..MotorParameters::default()
        };
        let omega_s = params.synchronous_speed();
        let mut machine = SynchronousMachine::new(&params, MachineState::new(omega_s, 0.0)).unwrap();

        let x0 = machine.initial_state();
        let dx = machine.rhs(0.0, &x0).unwrap();
        assert_eq!(dx.omega_m, 0.0);
        assert_eq!(dx.delta, 0.0);
    }

    #[test]
    fn positive_angle_accelerates_rotor() {
        let params = MotorParameters {
            load_torque: 0.0,
            damping: 0.0,
            ..MotorParameters::default()
        };
        let omega_s = params.synchronous_speed();
        let mut machine = SynchronousMachine::new(&params, MachineState::default()).unwrap();
        let dx = machine.rhs(0.0, &MachineState::new(omega_s, 0.3)).unwrap();
        assert!(dx.omega_m > 0.0);
        assert_eq!(dx.delta, 0.0);
    }

    #[test]
    fn degenerate_reactance_is_rejected() {
        let params = MotorParameters {
            reactance_d: 0.0,
            reactance_q: 0.0,
            ..MotorParameters::default()
        };
        assert!(SynchronousMachine::new(&params, MachineState::default()).is_err());
    }
}
