//! Outcome of an optimization.

use std::time::Duration;

/// Diagnostics of a finished optimization.
#[derive(Clone, Debug, Default)]
pub struct OptimumResult {
    /// Converged flag
    pub succeeded: bool,
    /// Number of iterations
    pub iterations: usize,
    /// Final KKT residual (or method-specific error measure)
    pub error: f64,
    /// Wall-clock time of the solve
    pub time: Duration,
}

impl OptimumResult {
    /// Combines the diagnostics of two consecutive solves.
    pub fn merge(&mut self, other: &OptimumResult) {
        self.succeeded = other.succeeded;
        self.iterations += other.iterations;
        self.error = other.error;
        self.time += other.time;
    }
}
