//! Smoke test: the bundled parameter files load and solve.

use std::path::PathBuf;

use sm_app::MotorSession;
use sm_core::{Connection, MotorParameters};

fn demo(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // crates
    path.pop(); // repo root
    path.push("demos");
    path.push(name);
    path
}

#[test]
fn reference_motor_file_matches_defaults() {
    let session = MotorSession::from_file(&demo("motor_5kva.yaml")).unwrap();
    assert_eq!(session.params(), &MotorParameters::default());
}

#[test]
fn partial_file_solves() {
    let mut session = MotorSession::from_file(&demo("motor_delta_overexcited.yaml")).unwrap();
    assert_eq!(session.params().connection, Connection::Delta);
    assert_eq!(session.params().poles, 4);

    let result = session.current_result().unwrap();
    assert_eq!(result.phase_voltage, 230.0);
    assert!(result.phase_current.is_finite());
}
