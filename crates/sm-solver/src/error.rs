//! Error types for solver operations.

use sm_core::CoreError;
use thiserror::Error;

/// Errors that can occur during steady-state and stability analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Zero stator impedance; the phasor solve would divide by zero.
    #[error("Degenerate stator impedance (Rs = {rs} Ω, Xs = {xs} Ω)")]
    DegenerateImpedance { rs: f64, xs: f64 },

    /// Bounded root-find gave up. Recoverable: retry with another initial
    /// guess or fall back to the direct path.
    #[error(
        "Root find did not converge after {iterations} iterations (residual = {residual:.3e}): {reason}"
    )]
    RootFindNonConvergence {
        iterations: usize,
        residual: f64,
        reason: &'static str,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SolverError::DegenerateImpedance { rs: 0.0, xs: 0.0 };
        assert!(err.to_string().contains("Degenerate"));

        let err = SolverError::RootFindNonConvergence {
            iterations: 12,
            residual: 3.5,
            reason: "line search stagnated",
        };
        let msg = err.to_string();
        assert!(msg.contains("12 iterations"));
        assert!(msg.contains("stagnated"));
    }

    #[test]
    fn core_error_converts() {
        let err: SolverError = CoreError::InvalidArg { what: "x" }.into();
        assert!(matches!(err, SolverError::Core(_)));
    }
}
