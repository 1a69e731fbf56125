//! Transient simulation of the synchronous motor rotor.
//!
//! Provides:
//! - `TransientModel` trait and the rotor model built on it
//! - Fixed-step RK4 / forward Euler and adaptive Dormand–Prince 5(4)
//!   integrators with dense output
//! - Cooperative cancellation and wall-clock limits
//! - `integrate`: resampled ω_m(t), δ(t) and the derived torque series

pub mod cancel;
pub mod error;
pub mod integrator;
pub mod machine;
pub mod model;
pub mod shaft;
pub mod sim;
pub mod transient;

// Re-exports for public API
pub use cancel::CancelToken;
pub use error::{SimError, SimResult};
pub use integrator::{DenseStep, DormandPrince, ForwardEuler, Integrator, RK4};
pub use machine::{MachineState, SynchronousMachine};
pub use model::TransientModel;
pub use shaft::Shaft;
pub use sim::{IntegratorType, SimOptions, SimRecord, StepStats, run_sim};
pub use transient::{InitialConditions, TransientOptions, TransientState, integrate};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
