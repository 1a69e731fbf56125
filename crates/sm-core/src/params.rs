//! Motor parameter record.

use crate::conversions::{self, Connection};
use crate::error::{CoreError, CoreResult};
use crate::numeric::ensure_finite;

/// EMF proportionality constant of the simplified excitation model (V/A).
///
/// E = Ke · If. Fixed by the model; not a user parameter.
pub const EMF_CONSTANT_V_PER_A: f64 = 100.0;

/// Electrical, mechanical and operating parameters of a three-phase
/// synchronous motor.
///
/// This is a plain value: solvers borrow it read-only and sweeps clone it per
/// sample, so a caller never has to restore a field after a computation.
/// Synchronous speed is derived from `(frequency, poles)` on every call and is
/// never stored.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MotorParameters {
    /// Stator resistance Rs (Ω)
    pub stator_resistance: f64,
    /// Direct-axis reactance Xd (Ω)
    pub reactance_d: f64,
    /// Quadrature-axis reactance Xq (Ω)
    pub reactance_q: f64,
    /// Field winding resistance Rf (Ω), informational only
    pub field_resistance: f64,
    /// Rotor inertia J (kg·m²)
    pub inertia: f64,
    /// Viscous damping coefficient B (N·m·s/rad)
    pub damping: f64,
    /// Pole count p (even, >= 2)
    pub poles: u32,
    /// Line voltage (V)
    pub line_voltage: f64,
    /// Electrical frequency (Hz)
    pub frequency: f64,
    /// Field current If (A)
    pub field_current: f64,
    /// Load torque (N·m)
    pub load_torque: f64,
    /// Stator winding connection
    pub connection: Connection,
}

impl Default for MotorParameters {
    fn default() -> Self {
        // Typical 5 kVA machine
        Self {
            stator_resistance: 0.5,
            reactance_d: 5.0,
            reactance_q: 3.5,
            field_resistance: 0.1,
            inertia: 0.1,
            damping: 0.01,
            poles: 4,
            line_voltage: 400.0,
            frequency: 50.0,
            field_current: 2.0,
            load_torque: 10.0,
            connection: Connection::Star,
        }
    }
}

impl MotorParameters {
    /// Synchronous angular speed ω_s (rad/s).
    pub fn synchronous_speed(&self) -> f64 {
        conversions::synchronous_speed_rad_per_s(self.frequency, self.poles)
    }

    /// Synchronous speed (RPM).
    pub fn synchronous_speed_rpm(&self) -> f64 {
        conversions::synchronous_speed_rpm(self.frequency, self.poles)
    }

    /// Phase voltage magnitude (V).
    pub fn phase_voltage(&self) -> f64 {
        conversions::phase_voltage(self.line_voltage, self.connection)
    }

    /// Average synchronous reactance Xs = (Xd + Xq) / 2 (Ω).
    ///
    /// Saliency is ignored by the phasor model.
    pub fn synchronous_reactance(&self) -> f64 {
        (self.reactance_d + self.reactance_q) / 2.0
    }

    /// Internal EMF magnitude E = Ke · If (V).
    pub fn internal_emf(&self) -> f64 {
        EMF_CONSTANT_V_PER_A * self.field_current
    }

    /// Check parameter ranges.
    ///
    /// Solvers do not call this; it is for inputs arriving from files or
    /// user interfaces.
    pub fn validate(&self) -> CoreResult<()> {
        let fields = [
            (self.stator_resistance, "stator_resistance"),
            (self.reactance_d, "reactance_d"),
            (self.reactance_q, "reactance_q"),
            (self.field_resistance, "field_resistance"),
            (self.inertia, "inertia"),
            (self.damping, "damping"),
            (self.line_voltage, "line_voltage"),
            (self.frequency, "frequency"),
            (self.field_current, "field_current"),
            (self.load_torque, "load_torque"),
        ];
        for (value, what) in fields {
            ensure_finite(value, what)?;
        }

        if self.stator_resistance <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "stator resistance must be positive",
            });
        }
        if self.reactance_d <= 0.0 || self.reactance_q <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "axis reactances must be positive",
            });
        }
        if self.inertia <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "inertia must be positive",
            });
        }
        if self.damping < 0.0 {
            return Err(CoreError::InvalidArg {
                what: "damping cannot be negative",
            });
        }
        if self.poles < 2 || self.poles % 2 != 0 {
            return Err(CoreError::InvalidArg {
                what: "pole count must be an even integer >= 2",
            });
        }
        if self.line_voltage <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "line voltage must be positive",
            });
        }
        if self.frequency <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "frequency must be positive",
            });
        }
        if self.field_current < 0.0 {
            return Err(CoreError::InvalidArg {
                what: "field current cannot be negative",
            });
        }
        if self.load_torque < 0.0 {
            return Err(CoreError::InvalidArg {
                what: "load torque cannot be negative",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = MotorParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.connection, Connection::Star);
    }

    #[test]
    fn derived_getters() {
        let params = MotorParameters::default();
        assert!((params.synchronous_speed() - 157.079_632_679_489_66).abs() < 1e-9);
        assert!((params.synchronous_speed_rpm() - 1500.0).abs() < 1e-12);
        assert!((params.phase_voltage() - 230.940_107_675_850_3).abs() < 1e-9);
        assert!((params.synchronous_reactance() - 4.25).abs() < 1e-12);
        assert!((params.internal_emf() - 200.0).abs() < 1e-12);
    }

    #[test]
    fn synchronous_speed_tracks_frequency() {
        let mut params = MotorParameters::default();
        let w50 = params.synchronous_speed();
        params.frequency = 60.0;
        assert!((params.synchronous_speed() / w50 - 1.2).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let cases: [fn(&mut MotorParameters); 6] = [
            |p| p.poles = 3,
            |p| p.poles = 0,
            |p| p.inertia = 0.0,
            |p| p.damping = -1.0,
            |p| p.frequency = 0.0,
            |p| p.line_voltage = f64::NAN,
        ];
        for mutate in cases {
            let mut params = MotorParameters::default();
            mutate(&mut params);
            assert!(params.validate().is_err(), "{params:?} should be rejected");
        }
    }
}
