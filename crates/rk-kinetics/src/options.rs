//! Configuration of kinetic integration.

use crate::stepper::StepOptions;
use rk_equilibrium::EquilibriumOptions;

/// Kinetic solver configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KineticOptions {
    /// Time stepping and cutback
    pub step: StepOptions,
    /// Re-equilibration of the equilibrium species
    pub equilibrium: EquilibriumOptions,
    /// Absolute tolerance on integrated amounts (mol)
    pub abs_tol: f64,
    /// Relative tolerance on integrated amounts
    pub rel_tol: f64,
}

impl Default for KineticOptions {
    fn default() -> Self {
        Self {
            step: StepOptions {
                dt: 1e-2,
                ..Default::default()
            },
            equilibrium: EquilibriumOptions::default(),
            abs_tol: 1e-10,
            rel_tol: 1e-6,
        }
    }
}
