//! Integration tests for the steady-state and stability solvers.

use sm_core::{Connection, MotorParameters, PowerFactorKind};
use sm_solver::stability::sweep_default;
use sm_solver::{
    EquilibriumConfig, SolveMethod, SolveStrategy, SweepDefinition, SweepParameter, SweepType,
    execute_sweep, maximum_torque, power_factor_vs_excitation, solve, solve_equilibrium,
    solve_with,
};

#[test]
fn excitation_sweep_leaves_parameters_untouched() {
    let params = MotorParameters {
        connection: Connection::Delta,
        load_torque: 25.0,
        ..MotorParameters::default()
    };
    let before = params.clone();

    let result = power_factor_vs_excitation(&params, (0.5, 4.0), 20).unwrap();

    assert_eq!(params, before);
    assert_eq!(result.points.len(), 20);
    let values = result.values();
    let expected = sm_core::linspace(0.5, 4.0, 20);
    assert_eq!(values, expected);
    for p in &result.points {
        assert_eq!(p.result.field_current, p.value);
        assert_eq!(p.result.load_torque, 25.0);
    }
}

#[test]
fn direct_and_equilibrium_paths_share_inputs() {
    let params = MotorParameters::default();
    let direct = solve(&params).unwrap();
    let equilibrium = solve_with(&params, SolveStrategy::Equilibrium).unwrap();

    assert_eq!(direct.method, SolveMethod::Direct);
    assert_eq!(equilibrium.method, SolveMethod::Equilibrium);
    assert_eq!(direct.phase_voltage, equilibrium.phase_voltage);
    assert_eq!(direct.emf_magnitude, equilibrium.emf_magnitude);
    assert_eq!(direct.max_torque, equilibrium.max_torque);
    assert!(equilibrium.load_angle > direct.load_angle);
}

#[test]
fn lossless_equilibrium_matches_load_across_excitation() {
    for field_current in [1.0, 2.0, 3.0] {
        let params = MotorParameters {
            stator_resistance: 0.0,
            field_current,
            load_torque: 40.0,
            ..MotorParameters::default()
        };
        let r = solve_equilibrium(&params, &EquilibriumConfig::default()).unwrap();
        assert!((r.torque - 40.0).abs() < 1e-6, "If = {field_current}");
        assert!((r.torque_phasor - 40.0).abs() < 1e-6, "If = {field_current}");
        assert!(r.load_angle > 0.0 && r.load_angle < std::f64::consts::FRAC_PI_2);
    }
}

#[test]
fn stability_curve_peak_matches_analytic_maximum() {
    let params = MotorParameters::default();
    let curve = sweep_default(&params).unwrap();
    let t_max = maximum_torque(&params).unwrap();

    assert!((curve.max_torque - t_max).abs() < 1e-9);
    assert!(curve.slope[curve.len() - 1] < curve.slope[curve.len() / 2]);
}

#[test]
fn logarithmic_voltage_sweep() {
    let def = SweepDefinition::new(
        SweepParameter::LineVoltage,
        100.0,
        1000.0,
        4,
        SweepType::Logarithmic,
    )
    .unwrap();
    let result = execute_sweep(&MotorParameters::default(), &def, SolveStrategy::Direct).unwrap();

    let v = result.values();
    assert_eq!(v[0], 100.0);
    assert_eq!(v[3], 1000.0);
    assert!((v[1] / v[0] - v[2] / v[1]).abs() < 1e-9);

    // Low voltage: E dominates and the motor runs leading
    assert_eq!(
        result.points[0].result.power_factor_kind,
        PowerFactorKind::Capacitive
    );
    assert_eq!(
        result.points[3].result.power_factor_kind,
        PowerFactorKind::Inductive
    );
}
