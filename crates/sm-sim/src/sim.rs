//! Simulation runner and result recording.
//!
//! `run_sim` integrates a [`TransientModel`] over a time span and records the
//! state at caller-supplied output times. The adaptive path samples the
//! Dormand–Prince dense output; the fixed-step paths step exactly onto each
//! output time with a fixed number of substeps.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{SimError, SimResult};
use crate::integrator::{DormandPrince, ForwardEuler, Integrator, RK4};
use crate::model::TransientModel;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorType {
    /// Adaptive Dormand–Prince 5(4) with dense output (default).
    #[default]
    DormandPrince,
    /// 4th-order Runge-Kutta, fixed step (4 rhs calls per step).
    RK4,
    /// Forward Euler, fixed step (1 rhs call per step).
    ForwardEuler,
}

impl FromStr for IntegratorType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dp" | "dopri" | "rk45" | "dormandprince" | "dormand-prince" => Ok(Self::DormandPrince),
            "rk4" => Ok(Self::RK4),
            "euler" | "forwardeuler" | "forward-euler" => Ok(Self::ForwardEuler),
            _ => Err(SimError::InvalidArg {
                what: "unknown integrator (expected rk45, rk4 or euler)",
            }),
        }
    }
}

impl fmt::Display for IntegratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DormandPrince => write!(f, "rk45"),
            Self::RK4 => write!(f, "rk4"),
            Self::ForwardEuler => write!(f, "euler"),
        }
    }
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Integrator type (default: Dormand–Prince)
    pub integrator: IntegratorType,
    /// Relative tolerance (adaptive only)
    pub rtol: f64,
    /// Absolute tolerance (adaptive only)
    pub atol: f64,
    /// Initial step; estimated from the derivatives when `None` (adaptive only)
    pub first_step: Option<f64>,
    /// Maximum number of step attempts (safety limit)
    pub max_steps: usize,
    /// Steps per output interval (fixed-step only)
    pub substeps: usize,
    pub cancel: Option<CancelToken>,
    pub max_wall_time: Option<Duration>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            integrator: IntegratorType::default(),
            rtol: 1e-6,
            atol: 1e-8,
            first_step: None,
            max_steps: 100_000,
            substeps: 10,
            cancel: None,
            max_wall_time: None,
        }
    }
}

/// Step counters of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    /// Output times (seconds)
    pub t: Vec<f64>,
    /// State at each output time
    pub x: Vec<S>,
    pub stats: StepStats,
}

/// Per-step cancellation and wall-clock check.
struct StepGuard<'a> {
    cancel: Option<&'a CancelToken>,
    deadline: Option<(Instant, Duration)>,
}

impl<'a> StepGuard<'a> {
    fn new(opts: &'a SimOptions) -> Self {
        Self {
            cancel: opts.cancel.as_ref(),
            deadline: opts.max_wall_time.map(|limit| (Instant::now(), limit)),
        }
    }

    fn check(&self, t: f64) -> SimResult<()> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(SimError::Cancelled { t });
        }
        if let Some((start, limit)) = self.deadline {
            if start.elapsed() >= limit {
                return Err(SimError::TimedOut {
                    t,
                    limit_s: limit.as_secs_f64(),
                });
            }
        }
        Ok(())
    }
}

fn validate(t_span: (f64, f64), t_eval: &[f64], opts: &SimOptions) -> SimResult<()> {
    let (t0, t1) = t_span;
    if !t0.is_finite() || !t1.is_finite() || t1 <= t0 {
        return Err(SimError::InvalidArg {
            what: "time span must be finite and increasing",
        });
    }
    if t_eval.is_empty() {
        return Err(SimError::InvalidArg {
            what: "at least one output time is required",
        });
    }
    if t_eval.windows(2).any(|w| w[1] < w[0]) || t_eval[0] < t0 || t_eval[t_eval.len() - 1] > t1
    {
        return Err(SimError::InvalidArg {
            what: "output times must be sorted and within the time span",
        });
    }
    if opts.max_steps == 0 {
        return Err(SimError::InvalidArg {
            what: "max_steps must be positive",
        });
    }
    if opts.integrator == IntegratorType::DormandPrince && !(opts.rtol > 0.0 && opts.atol > 0.0) {
        return Err(SimError::InvalidArg {
            what: "tolerances must be positive",
        });
    }
    if opts.integrator != IntegratorType::DormandPrince && opts.substeps == 0 {
        return Err(SimError::InvalidArg {
            what: "substeps must be positive",
        });
    }
    Ok(())
}

/// Integrate `model` from its initial state over `t_span`, recording the
/// state at each time in `t_eval`.
///
/// # Errors
/// `IntegrationDivergence` on a non-finite state or derivative, step-size
/// underflow or an exhausted step budget; `Cancelled` / `TimedOut` from the
/// options' guards. No partial record is returned.
pub fn run_sim<M: TransientModel>(
    model: &mut M,
    t_span: (f64, f64),
    t_eval: &[f64],
    opts: &SimOptions,
) -> SimResult<SimRecord<M::State>> {
    validate(t_span, t_eval, opts)?;
    let guard = StepGuard::new(opts);

    let record = match opts.integrator {
        IntegratorType::DormandPrince => run_adaptive(model, t_span, t_eval, opts, &guard)?,
        IntegratorType::RK4 => run_fixed(&RK4, model, t_span.0, t_eval, opts, &guard)?,
        IntegratorType::ForwardEuler => {
            run_fixed(&ForwardEuler, model, t_span.0, t_eval, opts, &guard)?
        }
    };

    debug!(
        integrator = %opts.integrator,
        accepted = record.stats.accepted,
        rejected = record.stats.rejected,
        samples = record.t.len(),
        "simulation complete"
    );
    Ok(record)
}

fn run_fixed<I: Integrator, M: TransientModel>(
    integrator: &I,
    model: &mut M,
    t0: f64,
    t_eval: &[f64],
    opts: &SimOptions,
    guard: &StepGuard<'_>,
) -> SimResult<SimRecord<M::State>> {
    let mut x = model.initial_state();
    if !model.is_finite(&x) {
        return Err(SimError::diverged(t0, "non-finite initial state"));
    }

    let mut xs = Vec::with_capacity(t_eval.len());
    let mut stats = StepStats::default();
    let mut t = t0;

    for &t_out in t_eval {
        if t_out > t {
            let dt = (t_out - t) / opts.substeps as f64;
            for i in 0..opts.substeps {
                guard.check(t)?;
                if stats.accepted >= opts.max_steps {
                    return Err(SimError::diverged(
                        t,
                        format!("step budget of {} exhausted", opts.max_steps),
                    ));
                }
                let t_step = t + i as f64 * dt;
                x = integrator.step(model, t_step, &x, dt)?;
                stats.accepted += 1;
                if !model.is_finite(&x) {
                    return Err(SimError::diverged(t_step + dt, "non-finite state"));
                }
            }
            t = t_out;
        }
        xs.push(x.clone());
    }

    Ok(SimRecord {
        t: t_eval.to_vec(),
        x: xs,
        stats,
    })
}

fn run_adaptive<M: TransientModel>(
    model: &mut M,
    t_span: (f64, f64),
    t_eval: &[f64],
    opts: &SimOptions,
    guard: &StepGuard<'_>,
) -> SimResult<SimRecord<M::State>> {
    let (t0, t1) = t_span;
    let dp = DormandPrince {
        rtol: opts.rtol,
        atol: opts.atol,
    };
    let exponent = -1.0 / f64::from(crate::integrator::ERROR_ESTIMATOR_ORDER + 1);

    let mut t = t0;
    let mut x = model.initial_state();
    if !model.is_finite(&x) {
        return Err(SimError::diverged(t0, "non-finite initial state"));
    }
    let mut f = model.rhs(t, &x)?;
    if !model.is_finite(&f) {
        return Err(SimError::diverged(t0, "non-finite derivative"));
    }

    let mut h_abs = match opts.first_step {
        Some(h) if h > 0.0 => h.min(t1 - t0),
        _ => dp.initial_step(model, t0, &x, &f, t1 - t0)?,
    };
    if !h_abs.is_finite() || h_abs <= 0.0 {
        return Err(SimError::diverged(t0, "no admissible initial step"));
    }

    let mut xs = Vec::with_capacity(t_eval.len());
    let mut next = 0;
    while next < t_eval.len() && t_eval[next] <= t0 {
        xs.push(x.clone());
        next += 1;
    }

    let mut stats = StepStats::default();
    let mut attempts = 0;
    let mut rejected_last = false;

    while t < t1 {
        guard.check(t)?;
        if attempts >= opts.max_steps {
            return Err(SimError::diverged(
                t,
                format!("step budget of {} exhausted", opts.max_steps),
            ));
        }
        let min_step = 10.0 * f64::EPSILON * t.abs().max(1.0);
        if h_abs < min_step {
            return Err(SimError::diverged(t, "step size underflow"));
        }

        let remaining = t1 - t;
        let (h, t_new) = if h_abs >= remaining {
            (remaining, t1)
        } else {
            (h_abs, t + h_abs)
        };
        attempts += 1;

        let step = dp.attempt(model, t, &x, &f, h)?;
        let accept = step.error_norm < 1.0 && model.is_finite(&step.x_new);

        if !accept {
            let factor = if step.error_norm.is_finite() {
                (SAFETY * step.error_norm.powf(exponent)).max(MIN_FACTOR)
            } else {
                MIN_FACTOR
            };
            h_abs = h * factor;
            stats.rejected += 1;
            rejected_last = true;
            continue;
        }

        while next < t_eval.len() && t_eval[next] <= t_new {
            xs.push(step.dense.eval(model, t_eval[next]));
            next += 1;
        }

        let mut factor = if step.error_norm == 0.0 {
            MAX_FACTOR
        } else {
            (SAFETY * step.error_norm.powf(exponent)).min(MAX_FACTOR)
        };
        if rejected_last {
            factor = factor.min(1.0);
        }

        f = step.last_derivative().clone();
        if !model.is_finite(&f) {
            return Err(SimError::diverged(t_new, "non-finite derivative"));
        }
        x = step.x_new;
        t = t_new;
        h_abs = h * factor;
        stats.accepted += 1;
        rejected_last = false;
    }

    Ok(SimRecord {
        t: t_eval.to_vec(),
        x: xs,
        stats,
    })
}
