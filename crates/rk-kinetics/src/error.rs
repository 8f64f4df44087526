//! Error types for kinetic calculations.

use rk_core::CoreError;
use rk_equilibrium::EquilibriumError;
use rk_system::SystemError;
use rk_thermo::ThermoError;
use thiserror::Error;

/// Errors encountered while defining or integrating kinetic reactions.
#[derive(Error, Debug)]
pub enum KineticsError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Parse error: {what}")]
    Parse { what: String },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    /// The step should be retried with a smaller time step.
    #[error("Retryable failure: {message}")]
    Retryable { message: String },

    #[error("Time step failed at t = {t} s with dt = {dt} s")]
    StepFailed { t: f64, dt: f64 },

    #[error("Re-equilibration failed at t = {t} s: {what}")]
    EquilibriumFailed { t: f64, what: String },

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Equilibrium(#[from] EquilibriumError),

    #[error(transparent)]
    Thermo(#[from] ThermoError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl KineticsError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, KineticsError::Retryable { .. })
    }
}

pub type KineticsResult<T> = Result<T, KineticsError>;
