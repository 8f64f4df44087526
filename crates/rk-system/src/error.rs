//! Chemical-system error types.

use rk_core::CoreError;
use rk_thermo::ThermoError;
use thiserror::Error;

pub type SystemResult<T> = Result<T, SystemError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    #[error("{kind} '{name}' not found in the chemical system")]
    NotFound { kind: &'static str, name: String },

    #[error("Invalid chemical system: {what}")]
    InvalidSystem { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Parse error: {what}")]
    Parse { what: String },

    #[error("Property backend '{name}' is not available in this build")]
    BackendUnavailable { name: String },

    #[error(transparent)]
    Thermo(#[from] ThermoError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SystemError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_missing_entity() {
        let e = SystemError::not_found("species", "Unobtainium");
        assert_eq!(e.to_string(), "species 'Unobtainium' not found in the chemical system");
    }

    #[test]
    fn thermo_errors_convert() {
        let e: SystemError = ThermoError::NotSupported { what: "x" }.into();
        assert!(matches!(e, SystemError::Thermo(_)));
    }
}
