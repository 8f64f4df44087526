//! Interface to alternative thermodynamic property backends.

use crate::error::{SystemError, SystemResult};
use crate::properties::ChemicalProperties;
use nalgebra::DVector;
use rk_thermo::PhaseThermoModelResult;

/// A source of species properties and equilibrium calculations.
///
/// All inputs are SI: temperature in K, pressure in Pa, amounts in mol.
pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    fn num_species(&self) -> usize;

    fn species_names(&self) -> Vec<String>;

    /// Standard partial molar properties at (T, P).
    fn standard_properties(&self, t: f64, p: f64) -> SystemResult<PhaseThermoModelResult>;

    /// Full properties at (T, P, n).
    fn properties(&self, t: f64, p: f64, n: &DVector<f64>) -> SystemResult<ChemicalProperties>;

    /// Equilibrium species amounts for element amounts `b`.
    fn equilibrate(&self, t: f64, p: f64, b: &DVector<f64>) -> SystemResult<DVector<f64>>;
}

/// Placeholder for an external backend that is not compiled in.
///
/// Every query fails with [`SystemError::BackendUnavailable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableBackend {
    name: String,
}

impl UnavailableBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn gems() -> Self {
        Self::new("GEMS")
    }

    pub fn phreeqc() -> Self {
        Self::new("PHREEQC")
    }

    fn unavailable<T>(&self) -> SystemResult<T> {
        Err(SystemError::BackendUnavailable {
            name: self.name.clone(),
        })
    }
}

impl PropertySource for UnavailableBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_species(&self) -> usize {
        0
    }

    fn species_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn standard_properties(&self, _t: f64, _p: f64) -> SystemResult<PhaseThermoModelResult> {
        self.unavailable()
    }

    fn properties(&self, _t: f64, _p: f64, _n: &DVector<f64>) -> SystemResult<ChemicalProperties> {
        self.unavailable()
    }

    fn equilibrate(&self, _t: f64, _p: f64, _b: &DVector<f64>) -> SystemResult<DVector<f64>> {
        self.unavailable()
    }
}
