use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sm_app::{AppError, AppResult, MotorSession, Scenario, ScenarioOutcome};
use sm_core::MotorParameters;
use sm_sim::{InitialConditions, IntegratorType, SimOptions, TransientOptions, TransientState};
use sm_solver::stability::{DEFAULT_STABILITY_POINTS, DEFAULT_STABILITY_RANGE};
use sm_solver::{SolveStrategy, SteadyStateResult, SweepDefinition, SweepParameter, SweepType};
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "sm-cli")]
#[command(about = "Three-phase synchronous motor simulator", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Print version and available components, then exit
    #[arg(long)]
    info: bool,
    /// Motor parameter file (YAML, or JSON by extension)
    #[arg(long, global = true)]
    params: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the steady-state operating point
    Steady {
        #[arg(long, value_enum, default_value_t = StrategyArg::Direct)]
        strategy: StrategyArg,
    },
    /// Integrate the rotor transient
    Transient {
        /// End time (s)
        #[arg(long)]
        t_end: f64,
        /// Start time (s)
        #[arg(long, default_value_t = 0.0)]
        t_start: f64,
        /// Initial speed (rad/s), synchronous speed if omitted
        #[arg(long, conflicts_with = "from_steady")]
        omega0: Option<f64>,
        /// Initial load angle (rad)
        #[arg(long, conflicts_with = "from_steady")]
        delta0: Option<f64>,
        /// Start from the steady-state equilibrium angle
        #[arg(long)]
        from_steady: bool,
        /// Integration method: rk45, rk4 or euler
        #[arg(long, default_value = "rk45")]
        method: IntegratorType,
        /// Output samples
        #[arg(long, default_value_t = 1000)]
        samples: usize,
    },
    /// Torque-angle stability curve
    Stability {
        /// Start angle (rad)
        #[arg(long, default_value_t = DEFAULT_STABILITY_RANGE.0)]
        start: f64,
        /// End angle (rad)
        #[arg(long, default_value_t = DEFAULT_STABILITY_RANGE.1)]
        end: f64,
        #[arg(long, default_value_t = DEFAULT_STABILITY_POINTS)]
        points: usize,
    },
    /// Steady-state parameter sweep
    Sweep {
        /// Parameter name, e.g. field_current or line-voltage
        #[arg(long)]
        parameter: SweepParameter,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        #[arg(long, default_value_t = 20)]
        points: usize,
        /// Logarithmic spacing
        #[arg(long)]
        log: bool,
        #[arg(long, value_enum, default_value_t = StrategyArg::Direct)]
        strategy: StrategyArg,
    },
    /// Run a named scenario
    Scenario {
        /// startup, load_increase, excitation_sub_to_over, excitation_over_to_sub,
        /// overload, frequency_variation or voltage_sag
        name: Scenario,
        /// Override the scenario duration (s)
        #[arg(long)]
        t_final: Option<f64>,
        /// Output samples per segment
        #[arg(long, default_value_t = 1000)]
        samples: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Direct,
    Equilibrium,
    /// Equilibrium, falling back to direct when the root find fails
    Fallback,
}

impl From<StrategyArg> for SolveStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Direct => SolveStrategy::Direct,
            StrategyArg::Equilibrium => SolveStrategy::Equilibrium,
            StrategyArg::Fallback => SolveStrategy::EquilibriumOrDirect,
        }
    }
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if cli.info {
        print_info();
        return Ok(());
    }
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut session = MotorSession::new(load_params(cli.params.as_deref())?);
    let json = cli.json;

    match command {
        Commands::Steady { strategy } => cmd_steady(&mut session, strategy.into(), json),
        Commands::Transient {
            t_end,
            t_start,
            omega0,
            delta0,
            from_steady,
            method,
            samples,
        } => {
            let opts = transient_options(method, samples);
            let run = if from_steady {
                session.set_strategy(SolveStrategy::EquilibriumOrDirect);
                session.transient_from_steady((t_start, t_end), &opts)?
            } else {
                let params = session.params();
                let x0 = InitialConditions {
                    omega_m: omega0.unwrap_or_else(|| params.synchronous_speed()),
                    delta: delta0.unwrap_or(0.0),
                };
                session.transient((t_start, t_end), x0, &opts)?
            };
            emit(&run, json, print_transient)
        }
        Commands::Stability { start, end, points } => {
            let curve = session.stability((start, end), points)?;
            emit(&curve, json, |c| {
                println!("Torque-angle curve ({} points)", c.len());
                println!(
                    "  Max torque: {:.3} N·m at δ = {:.2}°",
                    c.max_torque,
                    c.delta_at_max.to_degrees()
                );
                println!("  Points with negative slope: {}", c.stable_count());
            })
        }
        Commands::Sweep {
            parameter,
            start,
            end,
            points,
            log,
            strategy,
        } => {
            let sweep_type = if log {
                SweepType::Logarithmic
            } else {
                SweepType::Linear
            };
            let def = SweepDefinition::new(parameter, start, end, points, sweep_type)?;
            session.set_strategy(strategy.into());
            let result = session.sweep(&def)?;
            emit(&result, json, |r| {
                println!("{def}");
                println!(
                    "  {:>12} {:>8} {:>11} {:>12} {:>12} {:>10}",
                    parameter.name(),
                    "pf",
                    "kind",
                    "P (W)",
                    "Q (var)",
                    "I (A)"
                );
                for p in &r.points {
                    let s = &p.result;
                    println!(
                        "  {:>12.4} {:>8.4} {:>11} {:>12.2} {:>12.2} {:>10.3}",
                        p.value,
                        s.power_factor,
                        s.power_factor_kind.to_string(),
                        s.active_power,
                        s.reactive_power,
                        s.phase_current
                    );
                }
            })
        }
        Commands::Scenario {
            name,
            t_final,
            samples,
        } => {
            let scenario = match t_final {
                Some(t) => name.with_t_final(t),
                None => name,
            };
            let opts = TransientOptions {
                num_samples: samples,
                ..TransientOptions::default()
            };
            let outcome = session.run_scenario(&scenario, &opts)?;
            emit(&outcome, json, |o| print_scenario(&scenario, o))
        }
    }
}

fn load_params(path: Option<&Path>) -> AppResult<MotorParameters> {
    match path {
        Some(path) => {
            info!("Loading parameters: {}", path.display());
            sm_app::load_params(path)
        }
        None => Ok(MotorParameters::default()),
    }
}

fn transient_options(method: IntegratorType, samples: usize) -> TransientOptions {
    TransientOptions {
        num_samples: samples,
        sim: SimOptions {
            integrator: method,
            ..SimOptions::default()
        },
    }
}

/// Print `value` as JSON, or through the text renderer.
fn emit<T: Serialize>(value: &T, json: bool, text: impl FnOnce(&T)) -> AppResult<()> {
    if json {
        let out = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::InvalidInput(format!("cannot encode output: {e}")))?;
        println!("{out}");
    } else {
        text(value);
    }
    Ok(())
}

fn print_info() {
    println!("sm-cli {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  sm-core {}, sm-solver {}, sm-sim {}, sm-app {}",
        sm_core::VERSION,
        sm_solver::VERSION,
        sm_sim::VERSION,
        sm_app::VERSION
    );
    println!("  Steady state: direct, equilibrium, fallback");
    println!(
        "  Integrators:  {}, {}, {}",
        IntegratorType::DormandPrince,
        IntegratorType::RK4,
        IntegratorType::ForwardEuler
    );
    println!(
        "  Sweeps:       {}",
        SweepParameter::ALL
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Scenarios:    {}", Scenario::NAMES.join(", "));
}

fn cmd_steady(session: &mut MotorSession, strategy: SolveStrategy, json: bool) -> AppResult<()> {
    session.set_strategy(strategy);
    let result = session.current_result()?;
    emit(result, json, print_steady)
}

fn print_steady(r: &SteadyStateResult) {
    println!("Steady state ({:?})", r.method);
    println!(
        "  Supply:       {:.1} V line, {:.2} V phase, {:.1} Hz",
        r.line_voltage, r.phase_voltage, r.frequency
    );
    println!(
        "  Speed:        {:.3} rad/s ({:.1} rpm)",
        r.synchronous_speed, r.synchronous_speed_rpm
    );
    println!(
        "  Excitation:   If = {:.3} A, E = {:.2} V ∠ {:.2}°",
        r.field_current, r.emf_magnitude, r.emf_angle_deg
    );
    println!("  Load angle:   {:.3}°", r.load_angle_deg);
    println!(
        "  Current:      {:.4} A ∠ {:.2}° (line {:.4} A)",
        r.phase_current, r.current_angle_deg, r.line_current
    );
    println!(
        "  Power:        P = {:.2} W, Q = {:.2} var, S = {:.2} VA",
        r.active_power, r.reactive_power, r.apparent_power
    );
    println!(
        "  Power factor: {:.4} ({})",
        r.power_factor, r.power_factor_kind
    );
    println!(
        "  Torque:       {:.4} N·m (phasor {:.4} N·m, load {:.2} N·m)",
        r.torque, r.torque_phasor, r.load_torque
    );
    if let Some(t_max) = r.max_torque {
        println!("  Max torque:   {:.3} N·m", t_max);
    }
}

fn print_transient(run: &TransientState) {
    let (Some(t0), Some(t1)) = (run.time.first(), run.time.last()) else {
        println!("Empty transient");
        return;
    };
    println!("Transient: {} samples over {:.3} - {:.3} s", run.len(), t0, t1);
    if let Some(x) = run.final_state() {
        println!(
            "  Final:          ω = {:.4} rad/s, δ = {:.3}°",
            x.omega_m,
            x.delta.to_degrees()
        );
    }
    println!(
        "  Max |ω - ω_s|:  {:.4} rad/s",
        run.max_speed_deviation()
    );
    println!(
        "  Max |δ|:        {:.3}°",
        run.max_abs_delta().to_degrees()
    );
    println!(
        "  Steps:          {} accepted, {} rejected",
        run.stats.accepted, run.stats.rejected
    );
}

fn print_scenario(scenario: &Scenario, outcome: &ScenarioOutcome) {
    println!("Scenario: {} ({:.2} s)", scenario, scenario.t_final());
    match outcome {
        ScenarioOutcome::Transient(run) => print_transient(run),
        ScenarioOutcome::Excitation { transient, profile } => {
            print_transient(transient);
            println!("  Excitation profile:");
            let step = (profile.time.len() / 10).max(1);
            for i in (0..profile.time.len()).step_by(step) {
                println!(
                    "    t = {:>6.3} s  If = {:>6.3} A  pf = {:>6.4}  P = {:>10.2} W  Q = {:>10.2} var",
                    profile.time[i],
                    profile.field_current[i],
                    profile.power_factor[i],
                    profile.active_power[i],
                    profile.reactive_power[i]
                );
            }
        }
        ScenarioOutcome::Overload { cases } => {
            for case in cases {
                println!(
                    "  {:>4.2}x ({:>8.2} N·m): {:<8} max |δ| = {:>8.2}°  max |ω - ω_s| = {:>8.3} rad/s",
                    case.ratio,
                    case.load_torque,
                    if case.stable { "stable" } else { "unstable" },
                    case.max_delta.to_degrees(),
                    case.max_speed_deviation
                );
            }
        }
    }
}
