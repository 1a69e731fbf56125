//! Motor parameter sweep definitions.
//!
//! A sweep names one numeric field of [`MotorParameters`] and a range; the
//! executor in [`crate::sweep_executor`] writes each generated value into an
//! independent clone of the base parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sm_core::MotorParameters;

use crate::error::{SolverError, SolverResult};

/// Type of sweep progression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepType {
    /// Uniformly spaced points
    #[default]
    Linear,
    /// Logarithmically spaced points
    Logarithmic,
}

/// Numeric motor parameter that can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    StatorResistance,
    ReactanceD,
    ReactanceQ,
    FieldResistance,
    Inertia,
    Damping,
    LineVoltage,
    Frequency,
    FieldCurrent,
    LoadTorque,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 10] = [
        Self::StatorResistance,
        Self::ReactanceD,
        Self::ReactanceQ,
        Self::FieldResistance,
        Self::Inertia,
        Self::Damping,
        Self::LineVoltage,
        Self::Frequency,
        Self::FieldCurrent,
        Self::LoadTorque,
    ];

    /// Field name in [`MotorParameters`].
    pub fn name(self) -> &'static str {
        match self {
            Self::StatorResistance => "stator_resistance",
            Self::ReactanceD => "reactance_d",
            Self::ReactanceQ => "reactance_q",
            Self::FieldResistance => "field_resistance",
            Self::Inertia => "inertia",
            Self::Damping => "damping",
            Self::LineVoltage => "line_voltage",
            Self::Frequency => "frequency",
            Self::FieldCurrent => "field_current",
            Self::LoadTorque => "load_torque",
        }
    }

    pub fn get(self, params: &MotorParameters) -> f64 {
        match self {
            Self::StatorResistance => params.stator_resistance,
            Self::ReactanceD => params.reactance_d,
            Self::ReactanceQ => params.reactance_q,
            Self::FieldResistance => params.field_resistance,
            Self::Inertia => params.inertia,
            Self::Damping => params.damping,
            Self::LineVoltage => params.line_voltage,
            Self::Frequency => params.frequency,
            Self::FieldCurrent => params.field_current,
            Self::LoadTorque => params.load_torque,
        }
    }

    pub fn apply(self, params: &mut MotorParameters, value: f64) {
        let field = match self {
            Self::StatorResistance => &mut params.stator_resistance,
            Self::ReactanceD => &mut params.reactance_d,
            Self::ReactanceQ => &mut params.reactance_q,
            Self::FieldResistance => &mut params.field_resistance,
            Self::Inertia => &mut params.inertia,
            Self::Damping => &mut params.damping,
            Self::LineVoltage => &mut params.line_voltage,
            Self::Frequency => &mut params.frequency,
            Self::FieldCurrent => &mut params.field_current,
            Self::LoadTorque => &mut params.load_torque,
        };
        *field = value;
    }

    /// Copy of `params` with this field set to `value`.
    pub fn with_value(self, params: &MotorParameters, value: f64) -> MotorParameters {
        let mut snapshot = params.clone();
        self.apply(&mut snapshot, value);
        snapshot
    }
}

impl FromStr for SweepParameter {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| SolverError::InvalidArg {
                what: format!("unknown sweep parameter '{s}'"),
            })
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Definition of a single parameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepDefinition {
    pub parameter: SweepParameter,
    pub start: f64,
    pub end: f64,
    /// Number of points to generate
    pub num_points: usize,
    #[serde(default)]
    pub sweep_type: SweepType,
}

impl SweepDefinition {
    /// Create a validated sweep.
    pub fn new(
        parameter: SweepParameter,
        start: f64,
        end: f64,
        num_points: usize,
        sweep_type: SweepType,
    ) -> SolverResult<Self> {
        let def = Self {
            parameter,
            start,
            end,
            num_points,
            sweep_type,
        };
        def.validate()?;
        Ok(def)
    }

    pub fn validate(&self) -> SolverResult<()> {
        if self.num_points < 2 {
            return Err(SolverError::InvalidArg {
                what: "sweep must have at least 2 points".to_string(),
            });
        }
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SolverError::InvalidArg {
                what: "sweep bounds must be finite".to_string(),
            });
        }
        if (self.start - self.end).abs() < 1e-12 {
            return Err(SolverError::InvalidArg {
                what: "start and end values must be different".to_string(),
            });
        }
        if self.sweep_type == SweepType::Logarithmic && (self.start <= 0.0 || self.end <= 0.0) {
            return Err(SolverError::InvalidArg {
                what: "logarithmic sweep bounds must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Generate all points in the sweep.
    pub fn generate_points(&self) -> Vec<f64> {
        match self.sweep_type {
            SweepType::Linear => self.generate_linear(),
            SweepType::Logarithmic => self.generate_logarithmic(),
        }
    }

    fn generate_linear(&self) -> Vec<f64> {
        sm_core::linspace(self.start, self.end, self.num_points)
    }

    fn generate_logarithmic(&self) -> Vec<f64> {
        sm_core::logspace(self.start, self.end, self.num_points)
    }
}

impl fmt::Display for SweepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
            Self::Logarithmic => write!(f, "Logarithmic"),
        }
    }
}

impl fmt::Display for SweepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sweep {} from {} to {} ({} points, {})",
            self.parameter, self.start, self.end, self.num_points, self.sweep_type
        )
    }
}
