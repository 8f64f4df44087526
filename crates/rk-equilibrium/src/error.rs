//! Error types for equilibrium calculations.

use rk_core::CoreError;
use rk_optim::OptimError;
use rk_system::SystemError;
use rk_thermo::ThermoError;
use thiserror::Error;

/// Errors raised while defining or solving an equilibrium problem.
///
/// A solver that runs out of iterations reports it through
/// [`EquilibriumResult`](crate::EquilibriumResult); only the helpers that
/// must hand back a finished state turn it into [`EquilibriumError::NotConverged`].
#[derive(Error, Debug)]
pub enum EquilibriumError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Equilibrium calculation did not converge after {iterations} iterations (error {error:e})")]
    NotConverged { iterations: usize, error: f64 },

    #[error("Sensitivities are unavailable: {what}")]
    Sensitivity { what: String },

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Optim(#[from] OptimError),

    #[error(transparent)]
    Thermo(#[from] ThermoError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type EqResult<T> = Result<T, EquilibriumError>;

impl From<EquilibriumError> for SystemError {
    fn from(e: EquilibriumError) -> Self {
        match e {
            EquilibriumError::System(inner) => inner,
            EquilibriumError::Thermo(inner) => SystemError::Thermo(inner),
            EquilibriumError::Core(inner) => SystemError::Core(inner),
            other => SystemError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_converged_message() {
        let e = EquilibriumError::NotConverged {
            iterations: 12,
            error: 1.5e-3,
        };
        assert_eq!(
            e.to_string(),
            "Equilibrium calculation did not converge after 12 iterations (error 1.5e-3)"
        );
    }

    #[test]
    fn system_errors_round_trip() {
        let e: EquilibriumError = SystemError::InvalidSystem { what: "empty".into() }.into();
        let back: SystemError = e.into();
        assert_eq!(back, SystemError::InvalidSystem { what: "empty".into() });

        let e = EquilibriumError::InvalidArg { what: "b".into() };
        assert!(matches!(SystemError::from(e), SystemError::InvalidArg { .. }));
    }
}
