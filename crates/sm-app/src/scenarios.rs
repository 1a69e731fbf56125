//! Named operating scenarios.
//!
//! A scenario is a parameter schedule over the core solvers. Every segment
//! integrates a cloned parameter snapshot; the caller's record is only read.
//! Load ratios are relative to the record's `load_torque`.

use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sm_core::{MotorParameters, linspace};
use sm_sim::{InitialConditions, TransientOptions, TransientState, integrate};
use sm_solver::{
    SolveStrategy, SweepDefinition, SweepParameter, SweepType, execute_sweep, solve_with,
};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::segments::{Segment, run_segments};

/// Speed deviation bound of the overload stability verdict (rad/s).
pub const OVERLOAD_MAX_SPEED_DEVIATION: f64 = 5.0;

/// Load-angle bound of the overload stability verdict (rad).
pub const OVERLOAD_MAX_LOAD_ANGLE: f64 = FRAC_PI_2;

/// Samples of the steady-state profile along an excitation ramp.
pub const EXCITATION_PROFILE_POINTS: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scenario {
    /// Unloaded run-up from `initial_speed_ratio · ω_s` with δ = 0.
    StartupIdeal {
        t_final: f64,
        initial_speed_ratio: f64,
    },
    /// Load stepped through `k · max_load_ratio / load_steps` for
    /// k = 0..=load_steps, equal time per step.
    LoadIncrease {
        t_final: f64,
        load_steps: usize,
        max_load_ratio: f64,
    },
    /// Transient at the initial excitation plus the steady pf/P/Q profile
    /// along a linear field-current ramp.
    ExcitationChange {
        t_final: f64,
        if_initial: f64,
        if_final: f64,
    },
    /// Independent runs at each overloaded torque, each with a stability
    /// verdict.
    OverloadTest { ratios: Vec<f64>, t_final: f64 },
    /// Supply frequency stepped nominal, min, max, nominal in equal
    /// intervals.
    FrequencyVariation {
        t_final: f64,
        f_nominal: f64,
        f_min: f64,
        f_max: f64,
    },
    /// Line voltage scaled by `sag_magnitude` on
    /// `[sag_start, sag_start + sag_duration]`.
    VoltageSag {
        t_final: f64,
        sag_magnitude: f64,
        sag_duration: f64,
        sag_start: f64,
    },
}

impl Scenario {
    /// Preset names accepted by [`FromStr`].
    pub const NAMES: [&'static str; 7] = [
        "startup",
        "load_increase",
        "excitation_sub_to_over",
        "excitation_over_to_sub",
        "overload",
        "frequency_variation",
        "voltage_sag",
    ];

    pub fn startup() -> Self {
        Self::StartupIdeal {
            t_final: 3.0,
            initial_speed_ratio: 0.0,
        }
    }

    pub fn load_increase() -> Self {
        Self::LoadIncrease {
            t_final: 8.0,
            load_steps: 4,
            max_load_ratio: 1.2,
        }
    }

    pub fn excitation_sub_to_over() -> Self {
        Self::ExcitationChange {
            t_final: 4.0,
            if_initial: 0.5,
            if_final: 4.0,
        }
    }

    pub fn excitation_over_to_sub() -> Self {
        Self::ExcitationChange {
            t_final: 4.0,
            if_initial: 4.0,
            if_final: 0.5,
        }
    }

    pub fn overload() -> Self {
        Self::OverloadTest {
            ratios: vec![1.1, 1.3, 1.5],
            t_final: 2.0,
        }
    }

    pub fn frequency_variation() -> Self {
        Self::FrequencyVariation {
            t_final: 6.0,
            f_nominal: 50.0,
            f_min: 48.0,
            f_max: 52.0,
        }
    }

    pub fn voltage_sag() -> Self {
        Self::VoltageSag {
            t_final: 3.0,
            sag_magnitude: 0.8,
            sag_duration: 0.5,
            sag_start: 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StartupIdeal { .. } => "startup",
            Self::LoadIncrease { .. } => "load_increase",
            Self::ExcitationChange {
                if_initial,
                if_final,
                ..
            } => {
                if if_final >= if_initial {
                    "excitation_sub_to_over"
                } else {
                    "excitation_over_to_sub"
                }
            }
            Self::OverloadTest { .. } => "overload",
            Self::FrequencyVariation { .. } => "frequency_variation",
            Self::VoltageSag { .. } => "voltage_sag",
        }
    }

    pub fn t_final(&self) -> f64 {
        match self {
            Self::StartupIdeal { t_final, .. }
            | Self::LoadIncrease { t_final, .. }
            | Self::ExcitationChange { t_final, .. }
            | Self::OverloadTest { t_final, .. }
            | Self::FrequencyVariation { t_final, .. }
            | Self::VoltageSag { t_final, .. } => *t_final,
        }
    }

    /// Same scenario over a different duration.
    pub fn with_t_final(mut self, t: f64) -> Self {
        match &mut self {
            Self::StartupIdeal { t_final, .. }
            | Self::LoadIncrease { t_final, .. }
            | Self::ExcitationChange { t_final, .. }
            | Self::OverloadTest { t_final, .. }
            | Self::FrequencyVariation { t_final, .. }
            | Self::VoltageSag { t_final, .. } => *t_final = t,
        }
        self
    }

    /// Run the scenario on a snapshot of `params`.
    pub fn run(
        &self,
        params: &MotorParameters,
        opts: &TransientOptions,
    ) -> AppResult<ScenarioOutcome> {
        let t_final = self.t_final();
        if !(t_final.is_finite() && t_final > 0.0) {
            return Err(AppError::InvalidInput(format!(
                "scenario duration must be positive, got {t_final}"
            )));
        }
        info!(scenario = self.name(), t_final, "running scenario");

        match self {
            Self::StartupIdeal {
                t_final,
                initial_speed_ratio,
            } => {
                let unloaded = MotorParameters {
                    load_torque: 0.0,
                    ..params.clone()
                };
                let x0 = InitialConditions {
                    omega_m: initial_speed_ratio * unloaded.synchronous_speed(),
                    delta: 0.0,
                };
                let run = integrate(&unloaded, (0.0, *t_final), x0, opts)?;
                Ok(ScenarioOutcome::Transient(run))
            }
            Self::LoadIncrease {
                t_final,
                load_steps,
                max_load_ratio,
            } => {
                if *load_steps == 0 {
                    return Err(AppError::InvalidInput(
                        "load increase needs at least one step".to_string(),
                    ));
                }
                let duration = t_final / (*load_steps + 1) as f64;
                let segments: Vec<Segment> = (0..=*load_steps)
                    .map(|k| {
                        let ratio = k as f64 * max_load_ratio / *load_steps as f64;
                        let step = MotorParameters {
                            load_torque: params.load_torque * ratio,
                            ..params.clone()
                        };
                        Segment::new(duration, step)
                    })
                    .collect();
                let x0 = InitialConditions::synchronous(params, 0.1);
                let run = run_segments(&segments, 0.0, x0, opts)?;
                Ok(ScenarioOutcome::Transient(run))
            }
            Self::ExcitationChange {
                t_final,
                if_initial,
                if_final,
            } => {
                let start = MotorParameters {
                    field_current: *if_initial,
                    ..params.clone()
                };
                let x0 = InitialConditions::synchronous(&start, 0.2);
                let transient = integrate(&start, (0.0, *t_final), x0, opts)?;
                let profile =
                    ExcitationProfile::along_ramp(params, *t_final, *if_initial, *if_final)?;
                Ok(ScenarioOutcome::Excitation { transient, profile })
            }
            Self::OverloadTest { ratios, t_final } => {
                if ratios.is_empty() {
                    return Err(AppError::InvalidInput(
                        "overload test needs at least one ratio".to_string(),
                    ));
                }
                let cases = ratios
                    .iter()
                    .map(|ratio| OverloadCase::run(params, *ratio, *t_final, opts))
                    .collect::<AppResult<Vec<_>>>()?;
                Ok(ScenarioOutcome::Overload { cases })
            }
            Self::FrequencyVariation {
                t_final,
                f_nominal,
                f_min,
                f_max,
            } => {
                let duration = t_final / 4.0;
                let segments: Vec<Segment> = [*f_nominal, *f_min, *f_max, *f_nominal]
                    .into_iter()
                    .map(|frequency| {
                        let step = MotorParameters {
                            frequency,
                            ..params.clone()
                        };
                        Segment::new(duration, step)
                    })
                    .collect();
                let x0 = quiet_start(&segments[0].params)?;
                let run = run_segments(&segments, 0.0, x0, opts)?;
                Ok(ScenarioOutcome::Transient(run))
            }
            Self::VoltageSag {
                t_final,
                sag_magnitude,
                sag_duration,
                sag_start,
            } => {
                let sag_end = sag_start + sag_duration;
                if *sag_start < 0.0 || *sag_duration <= 0.0 || sag_end > *t_final {
                    return Err(AppError::InvalidInput(format!(
                        "sag window [{sag_start}, {sag_end}] must lie inside [0, {t_final}]"
                    )));
                }
                let sagged = MotorParameters {
                    line_voltage: params.line_voltage * sag_magnitude,
                    ..params.clone()
                };
                let segments: Vec<Segment> = [
                    Segment::new(*sag_start, params.clone()),
                    Segment::new(*sag_duration, sagged),
                    Segment::new(t_final - sag_end, params.clone()),
                ]
                .into_iter()
                .filter(|s| s.duration > 0.0)
                .collect();
                let x0 = quiet_start(params)?;
                let run = run_segments(&segments, 0.0, x0, opts)?;
                Ok(ScenarioOutcome::Transient(run))
            }
        }
    }
}

/// Synchronous speed at the equilibrium angle, or δ = 0 when the
/// equilibrium search fails.
fn quiet_start(params: &MotorParameters) -> AppResult<InitialConditions> {
    let steady = solve_with(params, SolveStrategy::EquilibriumOrDirect)?;
    Ok(InitialConditions::from_steady_state(&steady))
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "startup" | "startup_ideal" => Ok(Self::startup()),
            "load_increase" => Ok(Self::load_increase()),
            "excitation_sub_to_over" | "sub_to_over" => Ok(Self::excitation_sub_to_over()),
            "excitation_over_to_sub" | "over_to_sub" => Ok(Self::excitation_over_to_sub()),
            "overload" | "overload_test" => Ok(Self::overload()),
            "frequency_variation" => Ok(Self::frequency_variation()),
            "voltage_sag" => Ok(Self::voltage_sag()),
            _ => Err(AppError::InvalidInput(format!(
                "unknown scenario '{s}' (expected one of: {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Steady-state quantities along a linear field-current ramp.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExcitationProfile {
    pub time: Vec<f64>,
    pub field_current: Vec<f64>,
    pub power_factor: Vec<f64>,
    pub active_power: Vec<f64>,
    pub reactive_power: Vec<f64>,
}

impl ExcitationProfile {
    fn along_ramp(
        params: &MotorParameters,
        t_final: f64,
        if_initial: f64,
        if_final: f64,
    ) -> AppResult<Self> {
        let def = SweepDefinition::new(
            SweepParameter::FieldCurrent,
            if_initial,
            if_final,
            EXCITATION_PROFILE_POINTS,
            SweepType::Linear,
        )?;
        let sweep = execute_sweep(params, &def, SolveStrategy::Direct)?;
        Ok(Self {
            time: linspace(0.0, t_final, EXCITATION_PROFILE_POINTS),
            field_current: sweep.values(),
            power_factor: sweep.power_factor(),
            active_power: sweep.active_power(),
            reactive_power: sweep.reactive_power(),
        })
    }
}

/// One overload run and its verdict.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverloadCase {
    pub ratio: f64,
    /// Applied load torque (N·m)
    pub load_torque: f64,
    pub stable: bool,
    /// max |δ| (rad)
    pub max_delta: f64,
    /// max |ω_m − ω_s| (rad/s)
    pub max_speed_deviation: f64,
    pub transient: TransientState,
}

impl OverloadCase {
    fn run(
        params: &MotorParameters,
        ratio: f64,
        t_final: f64,
        opts: &TransientOptions,
    ) -> AppResult<Self> {
        let loaded = MotorParameters {
            load_torque: params.load_torque * ratio,
            ..params.clone()
        };
        let x0 = InitialConditions::synchronous(&loaded, 0.3);
        let transient = integrate(&loaded, (0.0, t_final), x0, opts)?;

        let max_delta = transient.max_abs_delta();
        let max_speed_deviation = transient.max_speed_deviation();
        Ok(Self {
            ratio,
            load_torque: loaded.load_torque,
            stable: is_stable(max_speed_deviation, max_delta),
            max_delta,
            max_speed_deviation,
            transient,
        })
    }
}

/// Stability verdict of a transient run.
pub fn is_stable(max_speed_deviation: f64, max_delta: f64) -> bool {
    max_speed_deviation < OVERLOAD_MAX_SPEED_DEVIATION && max_delta < OVERLOAD_MAX_LOAD_ANGLE
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Transient(TransientState),
    Excitation {
        transient: TransientState,
        profile: ExcitationProfile,
    },
    Overload { cases: Vec<OverloadCase> },
}

impl ScenarioOutcome {
    /// The main time series, if the scenario has a single one.
    pub fn transient(&self) -> Option<&TransientState> {
        match self {
            Self::Transient(run) => Some(run),
            Self::Excitation { transient, .. } => Some(transient),
            Self::Overload { .. } => None,
        }
    }
}
