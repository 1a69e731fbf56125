//! Error types for the sm-app service layer.

use std::path::PathBuf;

use sm_core::CoreError;
use sm_sim::SimError;
use sm_solver::SolverError;

/// Application error type wrapping the backend crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid motor parameters: {0}")]
    Config(String),

    #[error("Failed to read parameter file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sm-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Core errors only reach this layer through parameter validation
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
