//! Interactive session over one motor parameter record.
//!
//! The steady-state result is pulled, not pushed: it is computed on the first
//! call to [`MotorSession::current_result`] and reused until the parameters or
//! the strategy change.

use std::path::Path;

use sm_core::MotorParameters;
use sm_sim::{InitialConditions, TransientOptions, TransientState, integrate};
use sm_solver::stability::{self, StabilityCurve};
use sm_solver::{
    SolveStrategy, SteadyStateResult, SweepDefinition, SweepResult, execute_sweep, solve_with,
};
use tracing::debug;

use crate::config;
use crate::error::AppResult;
use crate::scenarios::{Scenario, ScenarioOutcome};

#[derive(Clone, Debug, Default)]
pub struct MotorSession {
    params: MotorParameters,
    strategy: SolveStrategy,
    cached: Option<SteadyStateResult>,
}

impl MotorSession {
    pub fn new(params: MotorParameters) -> Self {
        Self {
            params,
            strategy: SolveStrategy::default(),
            cached: None,
        }
    }

    /// Session over a validated parameter file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        Ok(Self::new(config::load_params(path)?))
    }

    pub fn params(&self) -> &MotorParameters {
        &self.params
    }

    /// Mutable access to the parameters. Drops the cached result.
    pub fn params_mut(&mut self) -> &mut MotorParameters {
        self.cached = None;
        &mut self.params
    }

    pub fn set_params(&mut self, params: MotorParameters) {
        self.cached = None;
        self.params = params;
    }

    pub fn strategy(&self) -> SolveStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: SolveStrategy) {
        if strategy != self.strategy {
            self.cached = None;
            self.strategy = strategy;
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Steady-state result for the current parameters and strategy.
    pub fn current_result(&mut self) -> AppResult<&SteadyStateResult> {
        let result = match self.cached.take() {
            Some(result) => result,
            None => {
                debug!(strategy = ?self.strategy, "recomputing steady state");
                solve_with(&self.params, self.strategy)?
            }
        };
        Ok(&*self.cached.insert(result))
    }

    pub fn stability(&self, range: (f64, f64), num_points: usize) -> AppResult<StabilityCurve> {
        Ok(stability::sweep(&self.params, range, num_points)?)
    }

    pub fn sweep(&self, def: &SweepDefinition) -> AppResult<SweepResult> {
        Ok(execute_sweep(&self.params, def, self.strategy)?)
    }

    pub fn transient(
        &self,
        t_span: (f64, f64),
        x0: InitialConditions,
        opts: &TransientOptions,
    ) -> AppResult<TransientState> {
        Ok(integrate(&self.params, t_span, x0, opts)?)
    }

    /// Transient seeded from the session's steady-state operating point.
    pub fn transient_from_steady(
        &mut self,
        t_span: (f64, f64),
        opts: &TransientOptions,
    ) -> AppResult<TransientState> {
        let x0 = InitialConditions::from_steady_state(self.current_result()?);
        self.transient(t_span, x0, opts)
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        opts: &TransientOptions,
    ) -> AppResult<ScenarioOutcome> {
        scenario.run(&self.params, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_is_cached_until_parameters_change() {
        let mut session = MotorSession::new(MotorParameters::default());
        assert!(!session.is_cached());

        let first = session.current_result().unwrap().clone();
        assert!(session.is_cached());
        assert_eq!(session.current_result().unwrap(), &first);

        session.params_mut().field_current = 3.0;
        assert!(!session.is_cached());
        let second = session.current_result().unwrap();
        assert_eq!(second.field_current, 3.0);
        assert_ne!(second.emf_magnitude, first.emf_magnitude);
    }

    #[test]
    fn strategy_change_invalidates_only_when_different() {
        let mut session = MotorSession::default();
        session.current_result().unwrap();

        session.set_strategy(SolveStrategy::Direct);
        assert!(session.is_cached());

        session.set_strategy(SolveStrategy::Equilibrium);
        assert!(!session.is_cached());
        let result = session.current_result().unwrap();
        assert_eq!(result.method, sm_solver::SolveMethod::Equilibrium);
    }

    #[test]
    fn failed_solve_leaves_no_cache() {
        let mut session = MotorSession::new(MotorParameters {
            stator_resistance: 0.0,
            reactance_d: 0.0,
            reactance_q: 0.0,
            ..MotorParameters::default()
        });
        assert!(session.current_result().is_err());
        assert!(!session.is_cached());
    }
}
