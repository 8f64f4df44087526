//! Definition of an equilibrium calculation: T, P and element amounts.

use crate::error::{EqResult, EquilibriumError};
use nalgebra::DVector;
use rk_core::ensure_finite;
use rk_core::units::{AmountOrMass, Quantity, convert};
use rk_system::{CHARGE_ELEMENT, ChemicalState, ChemicalSystem, Partition, SystemError};
use rk_thermo::formula::{parse_charge, parse_formula};
use std::sync::Arc;

/// Temperature, pressure and element amounts for an equilibrium calculation.
///
/// Element amounts are accumulated from species, compounds or whole states;
/// every quantity given with units is converted to SI on entry.
#[derive(Debug, Clone)]
pub struct EquilibriumProblem {
    system: Arc<ChemicalSystem>,
    partition: Partition,
    temperature: f64,
    pressure: f64,
    b: DVector<f64>,
}

impl EquilibriumProblem {
    /// Problem at 298.15 K and 1 bar with no elements, all species in equilibrium.
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        let ne = system.num_elements();
        Self {
            partition: Partition::new(Arc::clone(&system)),
            system,
            temperature: 298.15,
            pressure: 1.0e5,
            b: DVector::zeros(ne),
        }
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// K
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Pa
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Amounts (mol) of every element of the system, charge included.
    pub fn element_amounts(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn set_partition(&mut self, partition: Partition) -> EqResult<&mut Self> {
        if partition.system().num_species() != self.system.num_species() {
            return Err(EquilibriumError::InvalidArg {
                what: "partition belongs to a different chemical system".to_string(),
            });
        }
        self.partition = partition;
        Ok(self)
    }

    /// Partition from text such as `"kinetic = Calcite; inert = Quartz"`.
    pub fn set_partition_str(&mut self, text: &str) -> EqResult<&mut Self> {
        self.partition = Partition::parse(Arc::clone(&self.system), text)?;
        Ok(self)
    }

    pub fn set_temperature(&mut self, t: f64) -> EqResult<&mut Self> {
        self.temperature = positive(t, "temperature")?;
        Ok(self)
    }

    pub fn set_temperature_with_units(&mut self, value: f64, units: &str) -> EqResult<&mut Self> {
        self.set_temperature(convert(value, units, Quantity::Temperature)?)
    }

    pub fn set_pressure(&mut self, p: f64) -> EqResult<&mut Self> {
        self.pressure = positive(p, "pressure")?;
        Ok(self)
    }

    pub fn set_pressure_with_units(&mut self, value: f64, units: &str) -> EqResult<&mut Self> {
        self.set_pressure(convert(value, units, Quantity::Pressure)?)
    }

    pub fn set_element_amounts(&mut self, b: DVector<f64>) -> EqResult<&mut Self> {
        if b.len() != self.system.num_elements() {
            return Err(EquilibriumError::InvalidArg {
                what: format!(
                    "expected {} element amounts, got {}",
                    self.system.num_elements(),
                    b.len()
                ),
            });
        }
        for v in b.iter() {
            ensure_finite(*v, "element amount")?;
        }
        self.b = b;
        Ok(self)
    }

    /// Set every element amount to the same value (mol).
    pub fn fill_element_amounts(&mut self, value: f64) -> EqResult<&mut Self> {
        self.b.fill(ensure_finite(value, "element amount")?);
        Ok(self)
    }

    pub fn set_element_amount(&mut self, element: &str, value: f64, units: &str) -> EqResult<&mut Self> {
        let i = self.system.index_element_with_error(element)?;
        self.b[i] = ensure_finite(convert(value, units, Quantity::Amount)?, "element amount")?;
        Ok(self)
    }

    /// Add a species of the system or, failing that, a compound given by its
    /// formula (`"CaCO3"`, `"HCl"`). Amount or mass units are accepted.
    pub fn add(&mut self, name: &str, amount: f64, units: &str) -> EqResult<&mut Self> {
        if self.system.index_species(name) < self.system.num_species() {
            self.add_species(name, amount, units)
        } else {
            self.add_compound(name, amount, units)
        }
    }

    pub fn add_species(&mut self, name: &str, amount: f64, units: &str) -> EqResult<&mut Self> {
        let i = self.system.index_species_with_error(name)?;
        let moles = AmountOrMass::parse(amount, units)?.moles(self.system.species_at(i).molar_mass());
        let column = self.system.formula_matrix().column(i).into_owned();
        self.b += column * ensure_finite(moles, "species amount")?;
        Ok(self)
    }

    /// Add a compound whose elements must all exist in the system.
    pub fn add_compound(&mut self, formula: &str, amount: f64, units: &str) -> EqResult<&mut Self> {
        let elements = parse_formula(formula)?;
        let charge = parse_charge(formula)?;
        let mut coefficients = DVector::zeros(self.system.num_elements());
        let mut molar_mass = 0.0;
        for (symbol, coefficient) in &elements {
            let i = self.system.index_element(symbol);
            if i == self.system.num_elements() {
                return Err(SystemError::NotFound {
                    kind: "element",
                    name: format!("{symbol} (in compound {formula})"),
                }
                .into());
            }
            coefficients[i] += coefficient;
            molar_mass += coefficient * self.system.element(i).molar_mass();
        }
        if charge != 0.0 {
            let iz = self.system.index_element_with_error(CHARGE_ELEMENT)?;
            coefficients[iz] += charge;
        }
        let moles = AmountOrMass::parse(amount, units)?.moles(molar_mass);
        self.b += coefficients * ensure_finite(moles, "compound amount")?;
        Ok(self)
    }

    /// Add `factor` times the element amounts of a state of the same system.
    pub fn add_state(&mut self, state: &ChemicalState, factor: f64) -> EqResult<&mut Self> {
        if state.system().num_elements() != self.system.num_elements() {
            return Err(EquilibriumError::InvalidArg {
                what: "state belongs to a different chemical system".to_string(),
            });
        }
        self.b += state.element_amounts() * ensure_finite(factor, "scaling factor")?;
        Ok(self)
    }

    /// Amounts of the elements present in equilibrium species.
    pub fn equilibrium_element_amounts(&self) -> DVector<f64> {
        let iee = self.partition.indices_equilibrium_elements();
        DVector::from_iterator(iee.len(), iee.iter().map(|&i| self.b[i]))
    }
}

fn positive(v: f64, what: &'static str) -> EqResult<f64> {
    if ensure_finite(v, what)? > 0.0 {
        Ok(v)
    } else {
        Err(EquilibriumError::InvalidArg {
            what: format!("{what} must be positive, got {v}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rk_system::SystemBuilder;
    use rk_thermo::AqueousActivityModel;

    fn system() -> Arc<ChemicalSystem> {
        Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(
                    &["H2O(l)", "H+", "OH-", "Ca++", "HCO3-", "CO3--", "CO2(aq)", "Cl-"],
                    AqueousActivityModel::Ideal,
                )
                .unwrap()
                .add_mineral_phases_named(&["Calcite"])
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    fn amount(problem: &EquilibriumProblem, element: &str) -> f64 {
        problem.element_amounts()[problem.system().index_element(element)]
    }

    #[test]
    fn compounds_and_species_accumulate() {
        let mut problem = EquilibriumProblem::new(system());
        problem.add("H2O", 1.0, "kg").unwrap();
        problem.add("CaCO3", 100.0, "g").unwrap();
        problem.add("HCl", 1.0, "mmol").unwrap();
        let nw = 1.0 / problem.system().species_at(0).molar_mass();
        assert_relative_eq!(amount(&problem, "O"), nw + 3.0 * 0.999, max_relative = 1e-3);
        assert_relative_eq!(amount(&problem, "Cl"), 1e-3, max_relative = 1e-12);
        assert_relative_eq!(amount(&problem, "Ca"), 0.999, max_relative = 1e-3);
        assert_relative_eq!(amount(&problem, "H"), 2.0 * nw + 1e-3, max_relative = 1e-5);
        assert_eq!(amount(&problem, CHARGE_ELEMENT), 0.0);

        let mut again = EquilibriumProblem::new(problem.system().clone());
        again.add("Calcite", 1.0, "mol").unwrap();
        assert_eq!(amount(&again, "Ca"), 1.0);
        assert_eq!(amount(&again, "C"), 1.0);
    }

    #[test]
    fn charged_species_contribute_charge() {
        let mut problem = EquilibriumProblem::new(system());
        problem.add_species("Ca++", 2.0, "mol").unwrap();
        assert_eq!(amount(&problem, CHARGE_ELEMENT), 4.0);
    }

    #[test]
    fn unknown_elements_are_reported() {
        let mut problem = EquilibriumProblem::new(system());
        let err = problem.add("NaCl", 1.0, "mol").unwrap_err();
        assert!(matches!(err, EquilibriumError::System(SystemError::NotFound { kind: "element", .. })));
        assert!(problem.add_species("Halite", 1.0, "mol").is_err());
    }

    #[test]
    fn conditions_convert_units() {
        let mut problem = EquilibriumProblem::new(system());
        problem.set_temperature_with_units(30.0, "celsius").unwrap();
        problem.set_pressure_with_units(2.0, "bar").unwrap();
        assert_relative_eq!(problem.temperature(), 303.15, max_relative = 1e-12);
        assert_relative_eq!(problem.pressure(), 2.0e5, max_relative = 1e-12);
        assert!(problem.set_temperature(-1.0).is_err());
        assert!(problem.set_pressure(f64::NAN).is_err());
    }

    #[test]
    fn states_scale_into_the_problem() {
        let system = system();
        let mut state = ChemicalState::new(Arc::clone(&system));
        state.set_species_amount_by_name("Calcite", 2.0, "mol").unwrap();
        let mut problem = EquilibriumProblem::new(system);
        problem.add_state(&state, 0.5).unwrap();
        assert_eq!(amount(&problem, "Ca"), 1.0);
        assert_eq!(amount(&problem, "O"), 3.0);
    }

    #[test]
    fn partition_restricts_elements() {
        let mut problem = EquilibriumProblem::new(system());
        problem.set_element_amount("Cl", 2.0, "mmol").unwrap();
        problem.set_partition_str("inert = Calcite").unwrap();
        assert_eq!(problem.partition().num_inert_species(), 1);
        assert_eq!(
            problem.equilibrium_element_amounts().len(),
            problem.partition().indices_equilibrium_elements().len()
        );
        assert!(problem.set_element_amounts(DVector::zeros(2)).is_err());
    }
}
