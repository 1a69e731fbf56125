//! Application service layer for the synchronous motor simulator.
//!
//! Sits between the numerical crates and the CLI: parameter file loading,
//! piecewise transient runs, named scenarios and a session that caches the
//! steady-state result of its parameter record.

pub mod config;
pub mod error;
pub mod scenarios;
pub mod segments;
pub mod session;

// Re-export key types for convenience
pub use config::{load_params, parse_params, save_params};
pub use error::{AppError, AppResult};
pub use scenarios::{ExcitationProfile, OverloadCase, Scenario, ScenarioOutcome};
pub use segments::{Segment, run_segments};
pub use session::MotorSession;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
