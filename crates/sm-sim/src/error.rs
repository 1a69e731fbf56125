//! Error types for simulation operations.

use sm_core::CoreError;
use sm_solver::SolverError;
use thiserror::Error;

/// Errors encountered during transient simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Non-finite state or derivative, step-size underflow or an exhausted
    /// step budget. No partial series is returned.
    #[error("Integration diverged at t = {t} s: {reason}")]
    IntegrationDivergence { t: f64, reason: String },

    #[error("Simulation cancelled at t = {t} s")]
    Cancelled { t: f64 },

    #[error("Simulation exceeded wall-clock limit of {limit_s} s at t = {t} s")]
    TimedOut { t: f64, limit_s: f64 },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn diverged(t: f64, reason: impl Into<String>) -> Self {
        SimError::IntegrationDivergence {
            t,
            reason: reason.into(),
        }
    }
}
