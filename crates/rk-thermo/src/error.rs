//! Property model errors.

use rk_core::CoreError;
use thiserror::Error;

/// Result type for property model operations.
pub type ThermoResult<T> = Result<T, ThermoError>;

/// Errors that can occur while evaluating standard or mixing properties.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThermoError {
    /// Temperature outside the range a species' parameters were fitted for.
    #[error("Temperature {t} K is outside the valid range of species {species} (max {tmax} K)")]
    InvalidTemperatureRange { species: String, t: f64, tmax: f64 },

    /// A model produced or received a NaN/inf.
    #[error("Non-finite value for {what}")]
    NonFinite { what: String },

    /// Input outside the domain of an equation of state.
    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    /// Invalid argument (bad formula, missing parameters, ...).
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// Operation not supported by the selected model.
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// Convergence failure of an internal root finder.
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ThermoError::InvalidTemperatureRange {
            species: "Calcite".into(),
            t: 1500.0,
            tmax: 1200.0,
        };
        assert!(err.to_string().contains("Calcite"));

        let err = ThermoError::OutOfRange {
            what: "pressure",
            value: -1.0,
        };
        assert!(err.to_string().contains("pressure"));
    }

    #[test]
    fn core_error_converts() {
        let core = CoreError::Parse { what: "x".into() };
        let err: ThermoError = core.into();
        assert!(matches!(err, ThermoError::Core(_)));
    }
}
