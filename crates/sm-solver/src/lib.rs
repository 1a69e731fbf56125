//! Steady-state and stability analysis for the synchronous motor model.
//!
//! This crate provides the phasor equilibrium solver (direct and Newton
//! root-find paths), the closed-form torque/load-angle relation shared with the
//! transient model, torque-angle stability sweeps, and parallel parameter
//! sweeps over independent parameter snapshots.

pub mod equilibrium;
pub mod error;
pub mod newton;
pub mod operating_point;
pub mod stability;
pub mod steady;
pub mod sweep_executor;
pub mod sweeps;
pub mod torque;

pub use equilibrium::{EquilibriumConfig, SolveStrategy, solve_equilibrium, solve_with};
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult};
pub use operating_point::{
    BisectionConfig, OperatingPoint, TargetQuantity, find_operating_point,
};
pub use stability::{StabilityCurve, maximum_torque, torque_angle_curve};
pub use steady::{SolveMethod, SteadyStateResult, solve};
pub use sweep_executor::{SweepPoint, SweepResult, execute_sweep, power_factor_vs_excitation};
pub use sweeps::{SweepDefinition, SweepParameter, SweepType};
pub use torque::TorqueAngle;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
