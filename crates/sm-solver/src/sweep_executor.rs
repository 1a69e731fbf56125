//! Sweep execution over independent parameter snapshots.
//!
//! Each sample clones the base parameters, writes the swept value into the
//! clone and solves it. Samples run on the rayon pool; output order matches
//! the generated points.

use rayon::prelude::*;
use serde::Serialize;
use sm_core::MotorParameters;
use tracing::debug;

use crate::equilibrium::{SolveStrategy, solve_with};
use crate::error::SolverResult;
use crate::steady::SteadyStateResult;
use crate::sweeps::{SweepDefinition, SweepParameter, SweepType};

/// One solved sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Value written into the swept parameter
    pub value: f64,
    pub result: SteadyStateResult,
}

/// Result of a parameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub parameter: SweepParameter,
    pub strategy: SolveStrategy,
    pub points: Vec<SweepPoint>,
}

impl SweepResult {
    fn column(&self, f: impl Fn(&SteadyStateResult) -> f64) -> Vec<f64> {
        self.points.iter().map(|p| f(&p.result)).collect()
    }

    /// Independent values (the sweep parameter)
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn power_factor(&self) -> Vec<f64> {
        self.column(|r| r.power_factor)
    }

    pub fn active_power(&self) -> Vec<f64> {
        self.column(|r| r.active_power)
    }

    pub fn reactive_power(&self) -> Vec<f64> {
        self.column(|r| r.reactive_power)
    }

    pub fn phase_current(&self) -> Vec<f64> {
        self.column(|r| r.phase_current)
    }

    pub fn torque(&self) -> Vec<f64> {
        self.column(|r| r.torque)
    }

    pub fn load_angle(&self) -> Vec<f64> {
        self.column(|r| r.load_angle)
    }
}

/// Execute a validated sweep.
///
/// The first failing sample aborts the sweep with its error. `params` is only
/// read.
pub fn execute_sweep(
    params: &MotorParameters,
    def: &SweepDefinition,
    strategy: SolveStrategy,
) -> SolverResult<SweepResult> {
    def.validate()?;
    let values = def.generate_points();

    let points = values
        .par_iter()
        .map(|&value| {
            let snapshot = def.parameter.with_value(params, value);
            solve_with(&snapshot, strategy).map(|result| SweepPoint { value, result })
        })
        .collect::<SolverResult<Vec<_>>>()?;

    debug!(%def, ?strategy, "sweep complete");

    Ok(SweepResult {
        parameter: def.parameter,
        strategy,
        points,
    })
}

/// Power factor, P and Q across a linear field-current range (direct path).
pub fn power_factor_vs_excitation(
    params: &MotorParameters,
    field_current_range: (f64, f64),
    num_points: usize,
) -> SolverResult<SweepResult> {
    let def = SweepDefinition::new(
        SweepParameter::FieldCurrent,
        field_current_range.0,
        field_current_range.1,
        num_points,
        SweepType::Linear,
    )?;
    execute_sweep(params, &def, SolveStrategy::Direct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SolverError;

    #[test]
    fn field_current_sweep_echoes_values() {
        let params = MotorParameters::default();
        let result = power_factor_vs_excitation(&params, (0.5, 4.0), 20).unwrap();

        assert_eq!(result.points.len(), 20);
        assert_eq!(result.parameter, SweepParameter::FieldCurrent);
        for p in &result.points {
            assert_eq!(p.value, p.result.field_current);
        }
        assert_eq!(result.values()[0], 0.5);
        assert_eq!(result.values()[19], 4.0);
        assert_eq!(params, MotorParameters::default());
    }

    #[test]
    fn reactive_power_changes_sign_with_excitation() {
        let result =
            power_factor_vs_excitation(&MotorParameters::default(), (0.5, 4.0), 20).unwrap();
        let q = result.reactive_power();
        assert!(q[0] < 0.0);
        assert!(q[19] > 0.0);
        assert!(result.power_factor().iter().all(|pf| (0.0..=1.0).contains(pf)));
    }

    #[test]
    fn equilibrium_sweep_over_load() {
        let def = SweepDefinition::new(
            SweepParameter::LoadTorque,
            0.0,
            100.0,
            5,
            SweepType::Linear,
        )
        .unwrap();
        let result =
            execute_sweep(&MotorParameters::default(), &def, SolveStrategy::Equilibrium).unwrap();

        let angles = result.load_angle();
        assert!(angles.windows(2).all(|w| w[1] > w[0]));
        for (value, torque) in result.values().iter().zip(result.torque()) {
            assert!((torque - value).abs() < 1e-6);
        }
    }

    #[test]
    fn failing_sample_aborts_sweep() {
        let def = SweepDefinition::new(
            SweepParameter::LoadTorque,
            10.0,
            1000.0,
            4,
            SweepType::Linear,
        )
        .unwrap();
        let err = execute_sweep(&MotorParameters::default(), &def, SolveStrategy::Equilibrium)
            .unwrap_err();
        assert!(matches!(err, SolverError::RootFindNonConvergence { .. }));
    }
}
