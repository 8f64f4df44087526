//! Outcome of an equilibrium calculation.

use rk_optim::OptimumResult;

/// Diagnostics of an equilibrium solve.
#[derive(Clone, Debug, Default)]
pub struct EquilibriumResult {
    /// Result of the underlying minimization
    pub optimum: OptimumResult,
    /// Whether the solve started from the amounts already in the state
    pub warm_started: bool,
}

impl EquilibriumResult {
    pub fn succeeded(&self) -> bool {
        self.optimum.succeeded
    }

    pub fn iterations(&self) -> usize {
        self.optimum.iterations
    }

    /// Combines the diagnostics of consecutive solves, keeping the last status.
    pub fn merge(&mut self, other: &EquilibriumResult) {
        self.optimum.merge(&other.optimum);
        self.warm_started = other.warm_started;
    }
}
