//! Integration tests: scenarios, sessions and parameter files end to end.

use sm_app::{MotorSession, Scenario, ScenarioOutcome, load_params, save_params};
use sm_core::{Connection, MotorParameters};
use sm_sim::TransientOptions;
use sm_solver::SolveStrategy;

fn opts(num_samples: usize) -> TransientOptions {
    TransientOptions {
        num_samples,
        ..TransientOptions::default()
    }
}

#[test]
fn overload_verdict_separates_pull_out() {
    let params = MotorParameters {
        inertia: 10.0,
        load_torque: 100.0,
        ..MotorParameters::default()
    };
    let t_max = sm_solver::maximum_torque(&params).unwrap();
    let scenario = Scenario::OverloadTest {
        ratios: vec![1.1, 2.5],
        t_final: 2.0,
    };

    let ScenarioOutcome::Overload { cases } = scenario.run(&params, &opts(400)).unwrap() else {
        panic!("expected overload cases");
    };

    assert_eq!(cases.len(), 2);
    assert!(cases[0].load_torque < t_max);
    assert!(cases[0].stable, "{:?}", (cases[0].max_delta, cases[0].max_speed_deviation));
    assert!(cases[1].load_torque > t_max);
    assert!(!cases[1].stable);
    assert!(cases[1].max_speed_deviation > 5.0);
}

#[test]
fn frequency_steps_change_synchronous_speed() {
    let params = MotorParameters::default();
    let scenario = Scenario::frequency_variation().with_t_final(1.0);
    let outcome = scenario.run(&params, &opts(51)).unwrap();
    let run = outcome.transient().unwrap();

    assert_eq!(run.len(), 4 * 51 - 3);
    assert!(run.omega_m.iter().all(|w| w.is_finite()));
    // The last segment returns to nominal frequency
    assert!((run.synchronous_speed - params.synchronous_speed()).abs() < 1e-12);
    assert_eq!(run.omega_m[0], params.synchronous_speed());
}

#[test]
fn voltage_sag_scales_the_torque_relation() {
    let params = MotorParameters::default();
    let t_max = sm_solver::maximum_torque(&params).unwrap();
    let scenario = Scenario::VoltageSag {
        t_final: 1.0,
        sag_magnitude: 0.8,
        sag_duration: 0.2,
        sag_start: 0.3,
    };
    let outcome = scenario.run(&params, &opts(41)).unwrap();
    let run = outcome.transient().unwrap();

    assert_eq!(run.len(), 3 * 41 - 2);
    for i in 0..run.len() {
        let t = run.time[i];
        // The sample at the end of the sag belongs to the sagged segment
        let scale = if t > 0.3 + 1e-9 && t < 0.5 + 1e-9 { 0.8 } else { 1.0 };
        let expected = scale * t_max * run.delta[i].sin();
        assert!((run.torque[i] - expected).abs() < 1e-9 * t_max, "t = {t}");
    }
}

#[test]
fn session_seeds_transient_from_equilibrium() {
    let mut session = MotorSession::new(MotorParameters {
        damping: 0.0,
        ..MotorParameters::default()
    });
    session.set_strategy(SolveStrategy::Equilibrium);

    let run = session.transient_from_steady((0.0, 0.5), &opts(100)).unwrap();
    assert!(session.is_cached());
    assert!(run.max_speed_deviation() < 1e-3);
    assert!((run.delta[0] - session.current_result().unwrap().load_angle).abs() < 1e-15);
}

#[test]
fn parameter_files_round_trip() {
    let params = MotorParameters {
        connection: Connection::Delta,
        line_voltage: 230.0,
        field_current: 1.25,
        ..MotorParameters::default()
    };
    let dir = std::env::temp_dir();
    for ext in ["yaml", "json"] {
        let path = dir.join(format!("sm-app-params-{}.{ext}", std::process::id()));
        save_params(&path, &params).unwrap();
        let loaded = load_params(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, params, "{ext}");
    }
}

#[test]
fn session_sweep_uses_its_strategy() {
    let mut session = MotorSession::default();
    session.set_strategy(SolveStrategy::Equilibrium);
    let def = sm_solver::SweepDefinition::new(
        sm_solver::SweepParameter::LoadTorque,
        5.0,
        50.0,
        4,
        sm_solver::SweepType::Linear,
    )
    .unwrap();

    let result = session.sweep(&def).unwrap();
    assert_eq!(result.strategy, SolveStrategy::Equilibrium);
    let angles = result.load_angle();
    assert!(angles.windows(2).all(|w| w[1] > w[0]));
}
