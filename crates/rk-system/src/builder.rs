//! Incremental chemical system builder.

use crate::error::{SystemError, SystemResult};
use crate::phase::Phase;
use crate::system::{CHARGE_ELEMENT, ChemicalSystem};
use crate::validate;
use rk_thermo::{
    AggregateState, AqueousActivityModel, Element, GaseousActivityModel, MineralActivityModel,
    Species, catalog,
};
use std::collections::BTreeSet;

/// Builder for a [`ChemicalSystem`].
///
/// Elements are collected from the species unless given explicitly with
/// [`SystemBuilder::with_elements`]; `build()` validates and freezes the
/// system.
#[derive(Debug, Default)]
pub struct SystemBuilder {
    elements: Option<Vec<Element>>,
    phases: Vec<Phase>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the element list instead of deriving it from the species.
    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn add_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn add_aqueous_phase(self, species: Vec<Species>, model: AqueousActivityModel) -> SystemResult<Self> {
        Ok(self.add_phase(Phase::aqueous(species, model)?))
    }

    /// Aqueous phase from catalog species names.
    pub fn add_aqueous_phase_named(self, names: &[&str], model: AqueousActivityModel) -> SystemResult<Self> {
        self.add_aqueous_phase(lookup(names)?, model)
    }

    /// Aqueous phase with every catalog species made of `elements`.
    pub fn add_aqueous_phase_with_elements(
        self,
        elements: &[&str],
        model: AqueousActivityModel,
    ) -> SystemResult<Self> {
        let species = catalog::species_with_elements(elements, AggregateState::Aqueous)?;
        self.add_aqueous_phase(species, model)
    }

    pub fn add_gaseous_phase(self, species: Vec<Species>, model: GaseousActivityModel) -> SystemResult<Self> {
        Ok(self.add_phase(Phase::gaseous(species, model)?))
    }

    pub fn add_gaseous_phase_named(self, names: &[&str], model: GaseousActivityModel) -> SystemResult<Self> {
        self.add_gaseous_phase(lookup(names)?, model)
    }

    /// One pure mineral phase per species.
    pub fn add_mineral_phases(mut self, species: Vec<Species>) -> Self {
        for s in species {
            self.phases.push(Phase::mineral(vec![s], MineralActivityModel::Pure));
        }
        self
    }

    pub fn add_mineral_phases_named(self, names: &[&str]) -> SystemResult<Self> {
        Ok(self.add_mineral_phases(lookup(names)?))
    }

    /// A single solid solution of `species`.
    pub fn add_solid_solution(self, species: Vec<Species>) -> Self {
        self.add_phase(Phase::mineral(species, MineralActivityModel::IdealSolidSolution))
    }

    pub fn build(self) -> SystemResult<ChemicalSystem> {
        validate::validate_phases(&self.phases)?;
        let elements = match self.elements {
            Some(elements) => {
                validate::validate_elements(&elements, &self.phases)?;
                elements
            }
            None => collect_elements(&self.phases)?,
        };
        let system = ChemicalSystem::from_parts(elements, self.phases);
        tracing::debug!(
            elements = system.num_elements(),
            species = system.num_species(),
            phases = system.num_phases(),
            "chemical system built"
        );
        Ok(system)
    }
}

fn lookup(names: &[&str]) -> SystemResult<Vec<Species>> {
    names
        .iter()
        .map(|n| catalog::species(n).map_err(SystemError::from))
        .collect()
}

/// Sorted element symbols of all species, with the charge element last
/// when any species is charged.
fn collect_elements(phases: &[Phase]) -> SystemResult<Vec<Element>> {
    let species = || phases.iter().flat_map(|p| p.species());
    let symbols: BTreeSet<&str> = species()
        .flat_map(|s| s.elements().keys().map(String::as_str))
        .collect();
    let mut elements = symbols
        .into_iter()
        .map(|s| Element::from_symbol(s).map_err(SystemError::from))
        .collect::<SystemResult<Vec<_>>>()?;
    if species().any(|s| s.charge() != 0.0) {
        elements.push(Element::new(CHARGE_ELEMENT, 0.0)?);
    }
    Ok(elements)
}
