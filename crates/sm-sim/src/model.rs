//! TransientModel trait for pluggable dynamic systems.

use crate::error::SimResult;

/// Trait for transient (dynamic) system models.
///
/// A TransientModel must implement:
/// - State type (Clone, for snapshots)
/// - Initial state
/// - RHS computation: x_dot = f(t, x)
/// - Vector arithmetic on states for the integrators
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Return the initial state.
    fn initial_state(&self) -> Self::State;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Takes &mut self so models can cache intermediate results.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;

    /// Flat view of the state, used for error norms and finiteness checks.
    fn components(&self, x: &Self::State) -> Vec<f64>;

    /// `true` when every component is finite.
    fn is_finite(&self, x: &Self::State) -> bool {
        self.components(x).iter().all(|v| v.is_finite())
    }
}
