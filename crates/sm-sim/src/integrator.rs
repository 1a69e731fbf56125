//! Time integrators.
//!
//! Fixed-step RK4 and forward Euler implement [`Integrator`]. The adaptive
//! Dormand–Prince 5(4) pair exposes a single step attempt with an error
//! estimate and a quartic dense-output interpolant; the step-size control
//! loop lives in [`crate::sim`].

use crate::error::SimResult;
use crate::model::TransientModel;

/// Trait for fixed-step time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Forward Euler (explicit, 1st order, fast for testing).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

const N_STAGES: usize = 6;

const C: [f64; N_STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

const A: [&[f64]; N_STAGES] = [
    &[],
    &[1.0 / 5.0],
    &[3.0 / 40.0, 9.0 / 40.0],
    &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
    &[
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
    ],
    &[
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];

const B: [f64; N_STAGES] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

/// Difference between the 5th and embedded 4th order weights, including the
/// FSAL stage.
const E: [f64; N_STAGES + 1] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Dense-output coefficients: stage i contributes `P[i] · [θ, θ², θ³, θ⁴]`.
const P: [[f64; 4]; N_STAGES + 1] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

/// Order of the embedded error estimator.
pub const ERROR_ESTIMATOR_ORDER: i32 = 4;

/// `x + h · Σ coeffs[j] · ks[j]`, skipping zero weights.
fn combine<M: TransientModel>(
    model: &M,
    x: &M::State,
    h: f64,
    coeffs: &[f64],
    ks: &[M::State],
) -> M::State {
    coeffs
        .iter()
        .zip(ks)
        .filter(|(c, _)| **c != 0.0)
        .fold(x.clone(), |acc, (c, k)| model.add(&acc, &model.scale(k, h * c)))
}

/// Root-mean-square of `v[i] / scale[i]`.
fn rms_norm(v: &[f64], scale: &[f64]) -> f64 {
    let sum: f64 = v.iter().zip(scale).map(|(a, s)| (a / s).powi(2)).sum();
    (sum / v.len().max(1) as f64).sqrt()
}

/// Continuous extension of one accepted Dormand–Prince step.
#[derive(Clone, Debug)]
pub struct DenseStep<S> {
    pub t_old: f64,
    pub h: f64,
    x_old: S,
    k: Vec<S>,
}

impl<S: Clone> DenseStep<S> {
    /// State at time `t` within `[t_old, t_old + h]`.
    pub fn eval<M: TransientModel<State = S>>(&self, model: &M, t: f64) -> S {
        let theta = (t - self.t_old) / self.h;
        let powers = [theta, theta * theta, theta.powi(3), theta.powi(4)];
        let weights: Vec<f64> = P
            .iter()
            .map(|row| row.iter().zip(&powers).map(|(p, q)| p * q).sum())
            .collect();
        combine(model, &self.x_old, self.h, &weights, &self.k)
    }
}

/// Outcome of one Dormand–Prince step attempt.
#[derive(Clone, Debug)]
pub struct StepAttempt<S> {
    pub x_new: S,
    /// Scaled RMS error; the step is acceptable when below 1
    pub error_norm: f64,
    pub dense: DenseStep<S>,
}

impl<S: Clone> StepAttempt<S> {
    /// Derivative at the end of the step, reused as the first stage of the
    /// next one.
    pub fn last_derivative(&self) -> &S {
        &self.dense.k[N_STAGES]
    }
}

/// Dormand–Prince 5(4) embedded Runge–Kutta pair.
#[derive(Clone, Debug)]
pub struct DormandPrince {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for DormandPrince {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
        }
    }
}

impl DormandPrince {
    fn scale(&self, a: &[f64], b: &[f64]) -> Vec<f64> {
        a.iter()
            .zip(b)
            .map(|(x, y)| self.atol + x.abs().max(y.abs()) * self.rtol)
            .collect()
    }

    /// Attempt a step of size `h` from `(t, x)` with `f0 = f(t, x)`.
    ///
    /// Non-finite stages yield a non-finite `error_norm`; the caller treats
    /// that as a rejected step.
    pub fn attempt<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        f0: &M::State,
        h: f64,
    ) -> SimResult<StepAttempt<M::State>> {
        let mut k: Vec<M::State> = Vec::with_capacity(N_STAGES + 1);
        k.push(f0.clone());
        for s in 1..N_STAGES {
            let xs = combine(model, x, h, A[s], &k);
            let ks = model.rhs(t + C[s] * h, &xs)?;
            k.push(ks);
        }

        let x_new = combine(model, x, h, &B, &k);
        let f_new = model.rhs(t + h, &x_new)?;
        k.push(f_new);

        let zero = model.scale(x, 0.0);
        let err = combine(model, &zero, h, &E, &k);

        let x_comp = model.components(x);
        let x_new_comp = model.components(&x_new);
        let scale = self.scale(&x_comp, &x_new_comp);
        let error_norm = rms_norm(&model.components(&err), &scale);

        Ok(StepAttempt {
            x_new,
            error_norm,
            dense: DenseStep {
                t_old: t,
                h,
                x_old: x.clone(),
                k,
            },
        })
    }

    /// Starting step size from the local derivative scale (Hairer, Nørsett
    /// and Wanner, algorithm of section II.4).
    pub fn initial_step<M: TransientModel>(
        &self,
        model: &mut M,
        t0: f64,
        x0: &M::State,
        f0: &M::State,
        interval: f64,
    ) -> SimResult<f64> {
        let y0 = model.components(x0);
        let scale = self.scale(&y0, &y0);
        let d0 = rms_norm(&y0, &scale);
        let d1 = rms_norm(&model.components(f0), &scale);

        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        }
        .min(interval);

        let x1 = model.add(x0, &model.scale(f0, h0));
        let f1 = model.rhs(t0 + h0, &x1)?;
        let df = model.add(&f1, &model.scale(f0, -1.0));
        let d2 = rms_norm(&model.components(&df), &scale) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / f64::from(ERROR_ESTIMATOR_ORDER + 1))
        };

        Ok((100.0 * h0).min(h1).min(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dt = λx
    struct Decay {
        lambda: f64,
    }

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&mut self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(self.lambda * x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, s: f64) -> f64 {
            a * s
        }

        fn components(&self, x: &f64) -> Vec<f64> {
            vec![*x]
        }
    }

    #[test]
    fn rk4_matches_exponential() {
        let mut model = Decay { lambda: -2.0 };
        let mut x = model.initial_state();
        let dt = 0.01;
        for i in 0..100 {
            x = RK4.step(&mut model, i as f64 * dt, &x, dt).unwrap();
        }
        assert!((x - (-2.0_f64).exp()).abs() < 1e-8);
    }

    #[test]
    fn euler_is_first_order() {
        let mut model = Decay { lambda: -1.0 };
        let x = ForwardEuler.step(&mut model, 0.0, &1.0, 0.1).unwrap();
        assert!((x - 0.9).abs() < 1e-15);
    }

    #[test]
    fn butcher_rows_are_consistent() {
        for (s, row) in A.iter().enumerate() {
            let sum: f64 = row.iter().sum();
            assert!((sum - C[s]).abs() < 1e-14, "row {s}");
        }
        assert!((B.iter().sum::<f64>() - 1.0).abs() < 1e-14);
        assert!(E.iter().sum::<f64>().abs() < 1e-14);
    }

    #[test]
    fn dormand_prince_step_accuracy() {
        let mut model = Decay { lambda: -1.0 };
        let dp = DormandPrince::default();
        let f0 = model.rhs(0.0, &1.0).unwrap();
        let attempt = dp.attempt(&mut model, 0.0, &1.0, &f0, 0.1).unwrap();

        assert!((attempt.x_new - (-0.1_f64).exp()).abs() < 1e-8);
        assert!(attempt.error_norm.is_finite());
        assert!((attempt.last_derivative() + attempt.x_new).abs() < 1e-15);
    }

    #[test]
    fn dense_output_hits_both_ends() {
        let mut model = Decay { lambda: -1.0 };
        let dp = DormandPrince::default();
        let f0 = model.rhs(0.0, &1.0).unwrap();
        let attempt = dp.attempt(&mut model, 0.0, &1.0, &f0, 0.2).unwrap();

        assert!((attempt.dense.eval(&model, 0.0) - 1.0).abs() < 1e-15);
        assert!((attempt.dense.eval(&model, 0.2) - attempt.x_new).abs() < 1e-12);
        assert!((attempt.dense.eval(&model, 0.1) - (-0.1_f64).exp()).abs() < 1e-5);
    }

    #[test]
    fn initial_step_is_bounded_by_interval() {
        let mut model = Decay { lambda: -1.0 };
        let dp = DormandPrince::default();
        let f0 = model.rhs(0.0, &1.0).unwrap();
        let h = dp.initial_step(&mut model, 0.0, &1.0, &f0, 1e-3).unwrap();
        assert!(h > 0.0 && h <= 1e-3);
    }
}
