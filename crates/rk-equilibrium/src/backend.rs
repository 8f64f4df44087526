//! The built-in property backend: native models plus this crate's solver.

use crate::options::EquilibriumOptions;
use crate::solver::EquilibriumSolver;
use nalgebra::DVector;
use rk_system::{ChemicalProperties, ChemicalState, ChemicalSystem, PropertySource, SystemError, SystemResult};
use rk_thermo::PhaseThermoModelResult;
use std::sync::Arc;

/// [`PropertySource`] backed by the system's own models and Gibbs energy
/// minimization.
#[derive(Debug, Clone)]
pub struct NativeBackend {
    system: Arc<ChemicalSystem>,
    options: EquilibriumOptions,
}

impl NativeBackend {
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        Self {
            system,
            options: EquilibriumOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EquilibriumOptions) -> Self {
        self.options = options;
        self
    }
}

impl PropertySource for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn num_species(&self) -> usize {
        self.system.num_species()
    }

    fn species_names(&self) -> Vec<String> {
        self.system.species().iter().map(|s| s.name().to_string()).collect()
    }

    fn standard_properties(&self, t: f64, p: f64) -> SystemResult<PhaseThermoModelResult> {
        self.system.standard_properties(t, p)
    }

    fn properties(&self, t: f64, p: f64, n: &DVector<f64>) -> SystemResult<ChemicalProperties> {
        ChemicalProperties::compute(Arc::clone(&self.system), t, p, n)
    }

    fn equilibrate(&self, t: f64, p: f64, b: &DVector<f64>) -> SystemResult<DVector<f64>> {
        if b.len() != self.system.num_elements() {
            return Err(SystemError::InvalidArg {
                what: format!("expected {} element amounts, got {}", self.system.num_elements(), b.len()),
            });
        }
        let mut state = ChemicalState::new(Arc::clone(&self.system));
        state.set_temperature(t)?;
        state.set_pressure(p)?;
        let mut solver = EquilibriumSolver::new(Arc::clone(&self.system));
        solver.set_options(self.options.clone());
        let iee = solver.partition().indices_equilibrium_elements();
        let be = DVector::from_iterator(iee.len(), iee.iter().map(|&j| b[j]));
        let result = solver.solve_with_elements(&mut state, &be)?;
        if !result.succeeded() {
            return Err(SystemError::InvalidArg {
                what: format!("equilibrium did not converge after {} iterations", result.iterations()),
            });
        }
        Ok(state.species_amounts().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_system::SystemBuilder;
    use rk_thermo::AqueousActivityModel;

    #[test]
    fn native_backend_balances_elements() {
        let system = Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(&["H2O(l)", "H+", "OH-"], AqueousActivityModel::Ideal)
                .unwrap()
                .build()
                .unwrap(),
        );
        let backend: Box<dyn PropertySource> = Box::new(NativeBackend::new(Arc::clone(&system)));
        assert_eq!(backend.name(), "native");
        assert_eq!(backend.species_names(), vec!["H2O(l)", "H+", "OH-"]);

        let mut b = DVector::zeros(system.num_elements());
        b[system.index_element("H")] = 2.0;
        b[system.index_element("O")] = 1.0;
        let n = backend.equilibrate(298.15, 1e5, &b).unwrap();
        assert!((system.element_amounts(&n) - &b).amax() < 1e-8);

        let props = backend.properties(298.15, 1e5, &n).unwrap();
        assert_eq!(props.composition(), &n);
        assert!(backend.equilibrate(298.15, 1e5, &DVector::zeros(1)).is_err());
    }
}
