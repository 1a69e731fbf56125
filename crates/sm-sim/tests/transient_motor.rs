//! Integration tests: rotor transients of the synchronous motor.

use sm_core::MotorParameters;
use sm_sim::{
    CancelToken, InitialConditions, IntegratorType, SimError, SimOptions, TransientOptions,
    integrate,
};
use sm_solver::{EquilibriumConfig, solve_equilibrium};

fn opts_with(integrator: IntegratorType) -> TransientOptions {
    TransientOptions {
        sim: SimOptions {
            integrator,
            ..SimOptions::default()
        },
        ..TransientOptions::default()
    }
}

/// Adaptive options tight enough for reference comparisons.
fn tight() -> TransientOptions {
    TransientOptions {
        sim: SimOptions {
            rtol: 1e-10,
            atol: 1e-12,
            ..SimOptions::default()
        },
        ..TransientOptions::default()
    }
}

#[test]
fn synchronous_no_load_point_is_held() {
    let params = MotorParameters {
        load_torque: 0.0,
        damping: 0.0,
        ..MotorParameters::default()
    };
    let omega_s = params.synchronous_speed();
    let state = integrate(
        &params,
        (0.0, 1.0),
        InitialConditions::synchronous(&params, 0.0),
        &TransientOptions::default(),
    )
    .unwrap();

    assert!(state.omega_m.iter().all(|w| (w - omega_s).abs() < 1e-12));
    assert!(state.delta.iter().all(|d| d.abs() < 1e-12));
    assert!(state.torque.iter().all(|t| t.abs() < 1e-9));
}

#[test]
fn steady_equilibrium_seeds_a_quiet_start() {
    let params = MotorParameters {
        damping: 0.0,
        ..MotorParameters::default()
    };
    let steady = solve_equilibrium(&params, &EquilibriumConfig::default()).unwrap();
    let state = integrate(
        &params,
        (0.0, 1.0),
        InitialConditions::from_steady_state(&steady),
        &TransientOptions::default(),
    )
    .unwrap();

    assert!(state.max_speed_deviation() < 1e-3);
    for t in &state.torque {
        assert!((t - params.load_torque).abs() < 1e-2);
    }
}

#[test]
fn vanishing_inertia_diverges() {
    for inertia in [0.0, 1e-12] {
        let params = MotorParameters {
            inertia,
            ..MotorParameters::default()
        };
        let err = integrate(
            &params,
            (0.0, 1.0),
            InitialConditions::synchronous(&params, 0.0),
            &TransientOptions::default(),
        )
        .unwrap_err();
        assert!(
            matches!(err, SimError::IntegrationDivergence { .. }),
            "J = {inertia}: {err}"
        );
    }
}

#[test]
fn fixed_step_rk4_agrees_with_adaptive() {
    let params = MotorParameters::default();
    let x0 = InitialConditions::synchronous(&params, 0.3);

    let adaptive = integrate(&params, (0.0, 1.0), x0, &tight()).unwrap();
    let fixed = integrate(&params, (0.0, 1.0), x0, &opts_with(IntegratorType::RK4)).unwrap();

    assert_eq!(adaptive.time, fixed.time);
    for (a, b) in adaptive.delta.iter().zip(&fixed.delta) {
        assert!((a - b).abs() < 1e-4);
    }
    for (a, b) in adaptive.omega_m.iter().zip(&fixed.omega_m) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn lossless_swing_conserves_energy() {
    let params = MotorParameters {
        damping: 0.0,
        load_torque: 0.0,
        ..MotorParameters::default()
    };
    let t_max = sm_solver::maximum_torque(&params).unwrap();
    let omega_s = params.synchronous_speed();
    let energy = |omega: f64, delta: f64| {
        let u = omega - omega_s;
        0.5 * params.inertia * u * u + t_max * (1.0 - delta.cos())
    };

    let state = integrate(
        &params,
        (0.0, 2.0),
        InitialConditions::synchronous(&params, 0.3),
        &tight(),
    )
    .unwrap();

    let e0 = energy(state.omega_m[0], state.delta[0]);
    for (w, d) in state.omega_m.iter().zip(&state.delta) {
        assert!((energy(*w, *d) - e0).abs() < 1e-4 * e0);
    }

    // The angle swings symmetrically about zero
    let d_min = state.delta.iter().copied().fold(f64::INFINITY, f64::min);
    assert!((d_min + 0.3).abs() < 1e-3);
}

#[test]
fn startup_from_rest_slips_poles_without_diverging() {
    let params = MotorParameters {
        load_torque: 0.0,
        ..MotorParameters::default()
    };
    let state = integrate(
        &params,
        (0.0, 0.5),
        InitialConditions::rest(),
        &TransientOptions::default(),
    )
    .unwrap();

    assert!(state.omega_m.iter().all(|w| w.is_finite()));
    assert!(state.max_abs_delta() > std::f64::consts::PI);
}

#[test]
fn pre_cancelled_token_stops_integration() {
    let params = MotorParameters::default();
    let token = CancelToken::new();
    token.cancel();
    let opts = TransientOptions {
        sim: SimOptions {
            cancel: Some(token),
            ..SimOptions::default()
        },
        ..TransientOptions::default()
    };
    let err = integrate(&params, (0.0, 1.0), InitialConditions::rest(), &opts).unwrap_err();
    assert!(matches!(err, SimError::Cancelled { .. }));
}
