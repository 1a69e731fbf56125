//! Rotor mechanics.

use crate::error::{SimError, SimResult};

/// Rotor with inertia and viscous damping.
///
/// ```text
/// J · dω/dt = T_e − T_load − B · ω
/// ```
///
/// where:
/// - J is the moment of inertia (kg·m²)
/// - T_e is the electromagnetic torque, T_load the mechanical load (N·m)
/// - B · ω is the viscous damping torque
///
/// A zero inertia is accepted here and surfaces as a non-finite
/// acceleration, which the integrator reports as divergence.
#[derive(Clone, Debug)]
pub struct Shaft {
    /// Moment of inertia (kg·m²)
    pub inertia: f64,
    /// Viscous damping coefficient (N·m·s/rad)
    pub damping: f64,
}

impl Shaft {
    /// Create a new shaft.
    ///
    /// # Errors
    /// Returns error for negative or non-finite inertia or damping.
    pub fn new(inertia: f64, damping: f64) -> SimResult<Self> {
        if !inertia.is_finite() || inertia < 0.0 {
            return Err(SimError::InvalidArg {
                what: "shaft inertia must be finite and non-negative",
            });
        }
        if !damping.is_finite() || damping < 0.0 {
            return Err(SimError::InvalidArg {
                what: "damping coefficient must be finite and non-negative",
            });
        }

        Ok(Self { inertia, damping })
    }

    /// Damping torque (N·m), sign opposite to omega.
    pub fn damping_torque(&self, omega: f64) -> f64 {
        -self.damping * omega
    }

    /// Angular acceleration dω/dt (rad/s²) for the given applied torques.
    pub fn angular_acceleration(&self, torques: &[f64], omega: f64) -> f64 {
        let net_torque: f64 = torques.iter().sum();
        (net_torque + self.damping_torque(omega)) / self.inertia
    }

    /// Rotational kinetic energy ½ J ω² (J).
    pub fn kinetic_energy(&self, omega: f64) -> f64 {
        0.5 * self.inertia * omega * omega
    }
}
