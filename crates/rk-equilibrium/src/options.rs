//! Configuration of equilibrium solves and equilibrium paths.

use rk_optim::{OptimumMethod, OptimumOptions};

/// How the Hessian of the Gibbs energy is passed to the optimizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquilibriumHessian {
    /// Full ∂ln a/∂n, including activity-coefficient coupling.
    #[default]
    Exact,
    /// Only the diagonal of ∂ln a/∂n.
    Diagonal,
}

/// Equilibrium solver configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquilibriumOptions {
    /// Optimizer settings
    pub optimum: OptimumOptions,
    /// Optimization algorithm
    pub method: OptimumMethod,
    pub hessian: EquilibriumHessian,
    /// Cold-start amounts are floored at `epsilon·max(|b|∞, 1)`
    pub epsilon: f64,
    /// Start from the amounts already in the state when they are usable
    pub warm_start: bool,
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self {
            optimum: OptimumOptions::default(),
            method: OptimumMethod::default(),
            hessian: EquilibriumHessian::default(),
            epsilon: 1.0e-6,
            warm_start: true,
        }
    }
}

/// Continuation settings for [`EquilibriumPath`](crate::EquilibriumPath).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquilibriumPathOptions {
    pub equilibrium: EquilibriumOptions,
    /// Initial step in the path parameter t ∈ [0, 1]
    pub initial_step: f64,
    /// Smallest step before giving up
    pub min_step: f64,
    /// Largest step
    pub max_step: f64,
    /// Step growth after an accepted step
    pub grow_factor: f64,
    /// Step reduction after a failed corrector
    pub cutback_factor: f64,
    /// Use the sensitivities to predict the next point
    pub predictor: bool,
}

impl Default for EquilibriumPathOptions {
    fn default() -> Self {
        Self {
            equilibrium: EquilibriumOptions::default(),
            initial_step: 0.01,
            min_step: 1.0e-6,
            max_step: 0.1,
            grow_factor: 2.0,
            cutback_factor: 0.5,
            predictor: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = EquilibriumOptions::default();
        assert_eq!(o.hessian, EquilibriumHessian::Exact);
        assert_eq!(o.method, OptimumMethod::IpNewton);
        assert!(o.warm_start);

        let p = EquilibriumPathOptions::default();
        assert!(p.min_step < p.initial_step && p.initial_step <= p.max_step);
        assert!(p.cutback_factor < 1.0 && p.grow_factor > 1.0);
    }
}
