//! Transient response of the motor over a time span.
//!
//! The rotor equations are integrated with the selected
//! [`IntegratorType`](crate::sim::IntegratorType)
//! and resampled onto a uniform grid. The torque series is recomputed
//! pointwise from δ(t) with the closed-form relation, not taken from the
//! integrator state.

use serde::Serialize;
use sm_core::{MotorParameters, linspace};
use sm_solver::SteadyStateResult;
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::machine::{MachineState, SynchronousMachine};
use crate::sim::{SimOptions, StepStats, run_sim};

/// Initial rotor state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InitialConditions {
    /// Mechanical speed (rad/s)
    pub omega_m: f64,
    /// Load angle (rad)
    pub delta: f64,
}

impl InitialConditions {
    /// Rotor at rest with zero load angle.
    pub fn rest() -> Self {
        Self::default()
    }

    /// Rotor at synchronous speed with the given load angle (rad).
    pub fn synchronous(params: &MotorParameters, delta: f64) -> Self {
        Self {
            omega_m: params.synchronous_speed(),
            delta,
        }
    }

    /// Start from a steady-state operating point.
    pub fn from_steady_state(result: &SteadyStateResult) -> Self {
        Self {
            omega_m: result.synchronous_speed,
            delta: result.load_angle,
        }
    }
}

impl From<InitialConditions> for MachineState {
    fn from(ic: InitialConditions) -> Self {
        MachineState::new(ic.omega_m, ic.delta)
    }
}

impl From<MachineState> for InitialConditions {
    fn from(x: MachineState) -> Self {
        Self {
            omega_m: x.omega_m,
            delta: x.delta,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransientOptions {
    /// Uniform output samples across the span, endpoints included
    pub num_samples: usize,
    pub sim: SimOptions,
}

impl Default for TransientOptions {
    fn default() -> Self {
        Self {
            num_samples: 1000,
            sim: SimOptions::default(),
        }
    }
}

/// Uniformly sampled transient response.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TransientState {
    /// Sample times (s)
    pub time: Vec<f64>,
    /// Mechanical speed ω_m (rad/s)
    pub omega_m: Vec<f64>,
    /// Load angle δ (rad)
    pub delta: Vec<f64>,
    /// Electromagnetic torque T_max · sin δ (N·m)
    pub torque: Vec<f64>,
    /// Load torque (N·m)
    pub load_torque: Vec<f64>,
    /// Air-gap power approximated as T_e · ω_s (W)
    pub active_power: Vec<f64>,
    /// Not computed by the rotor model; always zero
    pub reactive_power: Vec<f64>,
    /// Not computed by the rotor model; always one
    pub power_factor: Vec<f64>,
    /// Synchronous speed ω_s of the parameters the run used (rad/s)
    pub synchronous_speed: f64,
    pub stats: StepStats,
}

impl TransientState {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn delta_deg(&self) -> Vec<f64> {
        self.delta.iter().map(|d| d.to_degrees()).collect()
    }

    pub fn speed_rpm(&self) -> Vec<f64> {
        self.omega_m
            .iter()
            .map(|w| sm_core::conversions::rad_per_s_to_rpm(*w))
            .collect()
    }

    /// State at the last sample, used to continue a run.
    pub fn final_state(&self) -> Option<MachineState> {
        Some(MachineState::new(
            *self.omega_m.last()?,
            *self.delta.last()?,
        ))
    }

    /// max |ω_m − ω_s| over the run (rad/s).
    pub fn max_speed_deviation(&self) -> f64 {
        self.omega_m
            .iter()
            .map(|w| (w - self.synchronous_speed).abs())
            .fold(0.0, f64::max)
    }

    /// max |δ| over the run (rad).
    pub fn max_abs_delta(&self) -> f64 {
        self.delta.iter().map(|d| d.abs()).fold(0.0, f64::max)
    }

    /// Concatenate a following segment. A leading sample that repeats this
    /// run's final time is dropped.
    pub fn append(&mut self, mut next: TransientState) {
        let skip = match (self.time.last(), next.time.first()) {
            (Some(a), Some(b)) if a == b => 1,
            _ => 0,
        };
        let columns: [(&mut Vec<f64>, &mut Vec<f64>); 8] = [
            (&mut self.time, &mut next.time),
            (&mut self.omega_m, &mut next.omega_m),
            (&mut self.delta, &mut next.delta),
            (&mut self.torque, &mut next.torque),
            (&mut self.load_torque, &mut next.load_torque),
            (&mut self.active_power, &mut next.active_power),
            (&mut self.reactive_power, &mut next.reactive_power),
            (&mut self.power_factor, &mut next.power_factor),
        ];
        for (dst, src) in columns {
            dst.extend(src.drain(skip.min(src.len())..));
        }
        self.synchronous_speed = next.synchronous_speed;
        self.stats.accepted += next.stats.accepted;
        self.stats.rejected += next.stats.rejected;
    }
}

/// Integrate the rotor equations over `t_span` from `x0`.
///
/// # Errors
/// `InvalidArg` for fewer than 2 samples or an invalid span,
/// `IntegrationDivergence` when the integration blows up (including J = 0),
/// `Cancelled` / `TimedOut` from the options' guards, and solver errors for a
/// degenerate torque relation.
pub fn integrate(
    params: &MotorParameters,
    t_span: (f64, f64),
    x0: InitialConditions,
    opts: &TransientOptions,
) -> SimResult<TransientState> {
    if opts.num_samples < 2 {
        return Err(SimError::InvalidArg {
            what: "at least 2 output samples are required",
        });
    }

    let mut machine = SynchronousMachine::new(params, x0.into())?;
    let t_eval = linspace(t_span.0, t_span.1, opts.num_samples);

    info!(
        t_start = t_span.0,
        t_end = t_span.1,
        omega0 = x0.omega_m,
        delta0 = x0.delta,
        integrator = %opts.sim.integrator,
        "transient integration"
    );
    let record = run_sim(&mut machine, t_span, &t_eval, &opts.sim)?;

    let omega_s = machine.synchronous_speed;
    let omega_m: Vec<f64> = record.x.iter().map(|x| x.omega_m).collect();
    let delta: Vec<f64> = record.x.iter().map(|x| x.delta).collect();
    let torque: Vec<f64> = delta
        .iter()
        .map(|d| machine.electromagnetic_torque(*d))
        .collect();
    let active_power = torque.iter().map(|t| t * omega_s).collect();
    let n = record.t.len();

    let state = TransientState {
        load_torque: vec![machine.load_torque; n],
        reactive_power: vec![0.0; n],
        power_factor: vec![1.0; n],
        time: record.t,
        omega_m,
        delta,
        torque,
        active_power,
        synchronous_speed: omega_s,
        stats: record.stats,
    };

    debug!(
        max_speed_deviation = state.max_speed_deviation(),
        max_abs_delta = state.max_abs_delta(),
        "transient summary"
    );
    Ok(state)
}
