//! Motor parameter files.
//!
//! YAML is the default format; a `.json` extension selects JSON. Keys that
//! are missing take the default motor's values, and every loaded record is
//! validated before it is returned.

use std::path::Path;

use sm_core::MotorParameters;
use tracing::debug;

use crate::error::{AppError, AppResult};

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parse and validate a YAML parameter document.
pub fn parse_params(yaml: &str) -> AppResult<MotorParameters> {
    let params: MotorParameters = serde_yaml::from_str(yaml)?;
    params.validate()?;
    Ok(params)
}

/// Load and validate a parameter file.
pub fn load_params(path: &Path) -> AppResult<MotorParameters> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let params = if is_json(path) {
        let params: MotorParameters = serde_json::from_str(&content)?;
        params.validate()?;
        params
    } else {
        parse_params(&content)?
    };

    debug!(path = %path.display(), "loaded motor parameters");
    Ok(params)
}

/// Validate and write a parameter file.
pub fn save_params(path: &Path, params: &MotorParameters) -> AppResult<()> {
    params.validate()?;
    let content = if is_json(path) {
        serde_json::to_string_pretty(params)?
    } else {
        serde_yaml::to_string(params)?
    };
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_core::Connection;

    #[test]
    fn missing_keys_use_defaults() {
        let params = parse_params("line_voltage: 230.0\nconnection: delta\n").unwrap();
        assert_eq!(params.line_voltage, 230.0);
        assert_eq!(params.connection, Connection::Delta);
        assert_eq!(params.poles, MotorParameters::default().poles);
        assert_eq!(params.inertia, MotorParameters::default().inertia);
    }

    #[test]
    fn empty_document_is_the_default_motor() {
        assert_eq!(parse_params("{}").unwrap(), MotorParameters::default());
    }

    #[test]
    fn unknown_connection_is_rejected() {
        let err = parse_params("connection: wye\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = parse_params("inertia: -1.0\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let path = Path::new("/nonexistent/motor.yaml");
        let err = load_params(path).unwrap_err();
        match err {
            AppError::ConfigRead { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
