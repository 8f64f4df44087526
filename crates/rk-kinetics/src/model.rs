//! TransientModel trait for the integrated kinetic state.

use crate::error::KineticsResult;

/// A system of ordinary differential equations `dx/dt = f(t, x)`.
///
/// Implementors provide:
/// - State type (Clone, for snapshots and trial steps)
/// - RHS computation
/// - Vector-space arithmetic for the integrators
/// - A scaled error norm used to accept or reject steps
pub trait TransientModel {
    type State: Clone;

    /// Compute the state derivative `dx/dt = f(t, x)`.
    ///
    /// Takes `&mut self` so models can cache the last algebraic solution
    /// (the equilibrium of the fast species) between calls. A
    /// [`Retryable`](crate::KineticsError::Retryable) error asks the stepper
    /// to retry with a smaller step.
    fn rhs(&mut self, t: f64, x: &Self::State) -> KineticsResult<Self::State>;

    /// `a + b`
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// `scale * a`
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;

    /// Difference between a coarse and a fine estimate of the same step,
    /// scaled so that values at or below one are acceptable.
    fn error_norm(&self, coarse: &Self::State, fine: &Self::State) -> f64;
}
