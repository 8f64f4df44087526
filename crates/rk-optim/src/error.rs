//! Error types for optimization.

use rk_core::CoreError;
use thiserror::Error;

/// Errors that can occur while setting up or stepping an optimization problem.
///
/// Running out of iterations is not an error: it is reported through
/// [`OptimumResult::succeeded`](crate::OptimumResult).
#[derive(Error, Debug)]
pub enum OptimError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Objective evaluation failed: {what}")]
    Objective { what: String },

    #[error("Singular KKT matrix: {what}")]
    SingularKkt { what: String },

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type OptimResult<T> = Result<T, OptimError>;

impl From<OptimError> for CoreError {
    fn from(e: OptimError) -> Self {
        match e {
            OptimError::Core(inner) => inner,
            other => CoreError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_core_error() {
        let e = OptimError::SingularKkt {
            what: "zero pivot".to_string(),
        };
        let core: CoreError = e.into();
        assert!(matches!(core, CoreError::InvalidArg { .. }));

        let inner = OptimError::Core(CoreError::NonFinite {
            what: "x",
            value: f64::NAN,
        });
        let core: CoreError = inner.into();
        assert!(matches!(core, CoreError::NonFinite { what: "x", .. }));
    }
}
