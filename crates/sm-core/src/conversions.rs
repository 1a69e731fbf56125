//! Phasor, angle, speed and power-factor conversions.
//!
//! Angles are in degrees at the public boundary of the polar helpers and in
//! radians for every trigonometric call.

use std::f64::consts::{PI, SQRT_2};
use std::fmt;
use std::str::FromStr;

use nalgebra::Complex;
use uom::si::angle::{degree, radian};
use uom::si::angular_velocity::{radian_per_second, revolution_per_minute};

use crate::error::CoreError;
use crate::units;

/// Stator winding connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Connection {
    #[default]
    Star,
    Delta,
}

impl FromStr for Connection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "star" => Ok(Self::Star),
            "delta" => Ok(Self::Delta),
            _ => Err(CoreError::InvalidConnectionKind { kind: s.to_string() }),
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Star => write!(f, "star"),
            Self::Delta => write!(f, "delta"),
        }
    }
}

/// Power-factor class derived from the sign of P/S.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PowerFactorKind {
    Unity,
    Inductive,
    Capacitive,
}

impl fmt::Display for PowerFactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unity => write!(f, "unity"),
            Self::Inductive => write!(f, "inductive"),
            Self::Capacitive => write!(f, "capacitive"),
        }
    }
}

/// Ratios within this distance of 1 are reported as unity.
pub const UNITY_PF_TOLERANCE: f64 = 1e-9;

/// Phase voltage from line voltage.
pub fn phase_voltage(line_voltage: f64, connection: Connection) -> f64 {
    match connection {
        Connection::Star => line_voltage / 3.0_f64.sqrt(),
        Connection::Delta => line_voltage,
    }
}

/// Line current from phase current.
pub fn line_current(phase_current: f64, connection: Connection) -> f64 {
    match connection {
        Connection::Star => phase_current,
        Connection::Delta => phase_current * 3.0_f64.sqrt(),
    }
}

pub fn deg_to_rad(angle_deg: f64) -> f64 {
    units::deg(angle_deg).get::<radian>()
}

pub fn rad_to_deg(angle_rad: f64) -> f64 {
    units::rad(angle_rad).get::<degree>()
}

pub fn rpm_to_rad_per_s(speed_rpm: f64) -> f64 {
    units::rpm(speed_rpm).get::<radian_per_second>()
}

pub fn rad_per_s_to_rpm(speed_rad_s: f64) -> f64 {
    units::rad_per_s(speed_rad_s).get::<revolution_per_minute>()
}

/// Synchronous speed ω_s = 2πf / (p/2) in rad/s.
pub fn synchronous_speed_rad_per_s(frequency_hz: f64, poles: u32) -> f64 {
    2.0 * PI * frequency_hz / (f64::from(poles) / 2.0)
}

/// Synchronous speed n_s = 120 f / p in RPM.
pub fn synchronous_speed_rpm(frequency_hz: f64, poles: u32) -> f64 {
    120.0 * frequency_hz / f64::from(poles)
}

/// Reduce an angle to (-180, 180] degrees.
///
/// Non-finite input is returned unchanged.
pub fn normalize_angle_deg(angle_deg: f64) -> f64 {
    if !angle_deg.is_finite() {
        return angle_deg;
    }
    let mut wrapped = angle_deg.rem_euclid(360.0);
    // rem_euclid may round up to the modulus for tiny negative inputs
    if wrapped >= 360.0 {
        wrapped -= 360.0;
    }
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn polar_to_rectangular(magnitude: f64, angle_deg: f64) -> Complex<f64> {
    Complex::from_polar(magnitude, deg_to_rad(angle_deg))
}

/// Returns `(magnitude, angle_deg)` with the angle in (-180, 180].
pub fn rectangular_to_polar(z: Complex<f64>) -> (f64, f64) {
    (z.norm(), normalize_angle_deg(rad_to_deg(z.arg())))
}

/// Power factor magnitude and class from active and apparent power.
///
/// Zero apparent power is reported as `(1.0, Unity)`; this is a policy for
/// the degenerate case, not a physical result.
pub fn power_factor(active: f64, apparent: f64) -> (f64, PowerFactorKind) {
    if apparent == 0.0 {
        return (1.0, PowerFactorKind::Unity);
    }

    let ratio = (active / apparent).clamp(-1.0, 1.0);
    if ratio < 0.0 {
        (-ratio, PowerFactorKind::Capacitive)
    } else if ratio >= 1.0 - UNITY_PF_TOLERANCE {
        (ratio, PowerFactorKind::Unity)
    } else {
        (ratio, PowerFactorKind::Inductive)
    }
}

pub fn rms_from_peak(peak: f64) -> f64 {
    peak / SQRT_2
}

pub fn peak_from_rms(rms: f64) -> f64 {
    rms * SQRT_2
}
