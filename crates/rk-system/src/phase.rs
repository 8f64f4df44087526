//! Phases: a set of species sharing thermodynamic and activity models.

use rk_thermo::{
    AggregateState, AqueousActivityModel, AqueousChemicalModel, GaseousActivityModel,
    GaseousChemicalModel, MineralActivityModel, MineralChemicalModel, PhaseChemicalModel,
    PhaseThermoModel, Species, StandardThermoModel, ThermoResult,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Phase {
    name: String,
    aggregate_state: AggregateState,
    species: Vec<Species>,
    thermo_model: Arc<dyn PhaseThermoModel>,
    chemical_model: Arc<dyn PhaseChemicalModel>,
}

impl Phase {
    pub fn new(
        name: impl Into<String>,
        aggregate_state: AggregateState,
        species: Vec<Species>,
        thermo_model: Arc<dyn PhaseThermoModel>,
        chemical_model: Arc<dyn PhaseChemicalModel>,
    ) -> Self {
        Self {
            name: name.into(),
            aggregate_state,
            species,
            thermo_model,
            chemical_model,
        }
    }

    /// Aqueous phase with HKF standard properties.
    pub fn aqueous(species: Vec<Species>, model: AqueousActivityModel) -> ThermoResult<Self> {
        let chemical = AqueousChemicalModel::new(&species, model)?;
        Ok(Self::new(
            "Aqueous",
            AggregateState::Aqueous,
            species.clone(),
            Arc::new(StandardThermoModel::new(species)),
            Arc::new(chemical),
        ))
    }

    pub fn gaseous(species: Vec<Species>, model: GaseousActivityModel) -> ThermoResult<Self> {
        let chemical = GaseousChemicalModel::new(&species, model)?;
        Ok(Self::new(
            "Gaseous",
            AggregateState::Gaseous,
            species.clone(),
            Arc::new(StandardThermoModel::new(species)),
            Arc::new(chemical),
        ))
    }

    /// Solid phase named after its first species when it is pure.
    pub fn mineral(species: Vec<Species>, model: MineralActivityModel) -> Self {
        let name = match (&model, species.as_slice()) {
            (MineralActivityModel::Pure, [s]) => s.name().to_string(),
            _ => species
                .iter()
                .map(Species::name)
                .collect::<Vec<_>>()
                .join("-"),
        };
        Self::new(
            name,
            AggregateState::Solid,
            species.clone(),
            Arc::new(StandardThermoModel::new(species)),
            Arc::new(MineralChemicalModel::new(model)),
        )
    }

    /// Rename the phase.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aggregate_state(&self) -> AggregateState {
        self.aggregate_state
    }

    /// Aqueous, gaseous and liquid phases.
    pub fn is_fluid(&self) -> bool {
        matches!(
            self.aggregate_state,
            AggregateState::Aqueous | AggregateState::Gaseous | AggregateState::Liquid
        )
    }

    pub fn is_solid(&self) -> bool {
        self.aggregate_state == AggregateState::Solid
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    pub fn index_species(&self, name: &str) -> usize {
        self.species
            .iter()
            .position(|s| s.name() == name)
            .unwrap_or(self.species.len())
    }

    pub fn thermo_model(&self) -> &dyn PhaseThermoModel {
        self.thermo_model.as_ref()
    }

    pub fn chemical_model(&self) -> &dyn PhaseChemicalModel {
        self.chemical_model.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_thermo::catalog;

    #[test]
    fn pure_mineral_takes_species_name() {
        let phase = Phase::mineral(vec![catalog::species("Calcite").unwrap()], MineralActivityModel::Pure);
        assert_eq!(phase.name(), "Calcite");
        assert!(phase.is_solid());
        assert!(!phase.is_fluid());
        assert_eq!(phase.index_species("Calcite"), 0);
        assert_eq!(phase.index_species("Quartz"), 1);
    }

    #[test]
    fn aqueous_phase_requires_water() {
        let s = vec![catalog::species("Na+").unwrap()];
        assert!(Phase::aqueous(s, AqueousActivityModel::Ideal).is_err());
    }
}
