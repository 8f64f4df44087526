//! The set of kinetically controlled reactions of a chemical system.

use crate::error::{KineticsError, KineticsResult};
use crate::mineral::MineralReaction;
use nalgebra::{DMatrix, DVector};
use rk_core::{ChemicalVector, ThermoVector};
use rk_system::{ChemicalProperties, ChemicalSystem, Reaction};
use std::sync::Arc;

/// Reactions bound to one chemical system, with their stoichiometric
/// matrix `S` (reactions × species).
#[derive(Clone, Debug)]
pub struct ReactionSystem {
    system: Arc<ChemicalSystem>,
    reactions: Vec<Reaction>,
    stoichiometric_matrix: DMatrix<f64>,
}

impl ReactionSystem {
    pub fn new(system: Arc<ChemicalSystem>, reactions: Vec<Reaction>) -> KineticsResult<Self> {
        let ns = system.num_species();
        let mut stoichiometric_matrix = DMatrix::zeros(reactions.len(), ns);
        for (k, reaction) in reactions.iter().enumerate() {
            let nu = reaction.stoichiometry();
            if nu.len() != ns {
                return Err(KineticsError::InvalidArg {
                    what: format!("reaction '{}' belongs to a different chemical system", reaction.name()),
                });
            }
            stoichiometric_matrix.row_mut(k).copy_from(&nu.transpose());
        }
        Ok(Self {
            system,
            reactions,
            stoichiometric_matrix,
        })
    }

    /// Bind every mineral reaction to `system`.
    pub fn from_minerals(system: Arc<ChemicalSystem>, minerals: &[MineralReaction]) -> KineticsResult<Self> {
        let reactions = minerals
            .iter()
            .map(|m| m.create_reaction(&system))
            .collect::<KineticsResult<Vec<_>>>()?;
        Self::new(system, reactions)
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn num_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn reaction(&self, index: usize) -> &Reaction {
        &self.reactions[index]
    }

    /// Index of the named reaction, or `num_reactions()` when absent.
    pub fn index_reaction(&self, name: &str) -> usize {
        self.reactions
            .iter()
            .position(|r| r.name() == name)
            .unwrap_or(self.reactions.len())
    }

    pub fn stoichiometric_matrix(&self) -> &DMatrix<f64> {
        &self.stoichiometric_matrix
    }

    pub fn ln_equilibrium_constants(&self, props: &ChemicalProperties) -> ThermoVector {
        let mut v = ThermoVector::zeros(self.reactions.len());
        for (k, r) in self.reactions.iter().enumerate() {
            v.set_row(k, r.ln_equilibrium_constant(props));
        }
        v
    }

    pub fn ln_reaction_quotients(&self, props: &ChemicalProperties) -> ChemicalVector {
        let mut v = ChemicalVector::zeros(self.reactions.len(), self.system.num_species());
        for (k, r) in self.reactions.iter().enumerate() {
            v.set_row(k, &r.ln_reaction_quotient(props));
        }
        v
    }

    /// Reaction rates (mol/s) with their T, P and amount derivatives.
    pub fn rates(&self, props: &ChemicalProperties) -> KineticsResult<ChemicalVector> {
        let mut v = ChemicalVector::zeros(self.reactions.len(), self.system.num_species());
        for (k, r) in self.reactions.iter().enumerate() {
            v.set_row(k, &r.rate(props)?);
        }
        Ok(v)
    }

    /// Species production rates `Sᵀr` (mol/s).
    pub fn species_rates(&self, rates: &DVector<f64>) -> DVector<f64> {
        self.stoichiometric_matrix.tr_mul(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_system::SystemBuilder;
    use rk_thermo::AqueousActivityModel;

    fn system() -> Arc<ChemicalSystem> {
        Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(&["H2O(l)", "H+", "OH-", "Ca++", "CO3--"], AqueousActivityModel::Ideal)
                .unwrap()
                .add_mineral_phases_named(&["Calcite"])
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn stoichiometric_matrix_rows_follow_equations() {
        let system = system();
        let water = Reaction::parse(&system, "H2O(l) = H+ + OH-").unwrap();
        let calcite = Reaction::parse(&system, "Calcite = Ca++ + CO3--")
            .unwrap()
            .with_name("Calcite");
        let reactions = ReactionSystem::new(Arc::clone(&system), vec![water, calcite]).unwrap();
        let s = reactions.stoichiometric_matrix();
        assert_eq!(s.shape(), (2, system.num_species()));
        assert_eq!(s[(0, system.index_species("H2O(l)"))], -1.0);
        assert_eq!(s[(1, system.index_species("CO3--"))], 1.0);
        assert_eq!(reactions.index_reaction("Calcite"), 1);
        assert_eq!(reactions.index_reaction("Quartz"), 2);

        // every reaction conserves elements
        let conserved = system.formula_matrix() * s.transpose();
        assert!(conserved.amax() < 1e-12);

        let dndt = reactions.species_rates(&DVector::from_vec(vec![0.0, 2.0]));
        assert_eq!(dndt[system.index_species("Calcite")], -2.0);
        assert_eq!(dndt[system.index_species("Ca++")], 2.0);
    }

    #[test]
    fn reactions_without_rates_are_idle() {
        let system = system();
        let calcite = Reaction::parse(&system, "Calcite = Ca++ + CO3--").unwrap();
        let reactions = ReactionSystem::new(Arc::clone(&system), vec![calcite]).unwrap();
        let n = DVector::from_element(system.num_species(), 0.1);
        let props = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &n).unwrap();
        let rates = reactions.rates(&props).unwrap();
        assert_eq!(rates.val[0], 0.0);
        let ln_q = reactions.ln_reaction_quotients(&props);
        let ln_k = reactions.ln_equilibrium_constants(&props);
        assert!((ln_q.val[0] - ln_k.val[0]).is_finite());
    }
}
