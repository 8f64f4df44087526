//! Chemical (composition-dependent) models of a phase.

use crate::error::ThermoResult;
use nalgebra::DVector;
use rk_core::{ChemicalScalar, ChemicalVector};
use std::fmt;

/// Activities and non-ideal contributions of one phase.
///
/// All entries are indexed and differentiated with respect to the species
/// of the phase only; the system embeds them into its global vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseChemicalModelResult {
    pub ln_activity_coefficients: ChemicalVector,
    pub ln_activities: ChemicalVector,
    /// Molar volume of the phase (m³/mol); zero means "use the standard
    /// partial molar volumes".
    pub molar_volume: ChemicalScalar,
    pub residual_molar_gibbs_energy: ChemicalScalar,
    pub residual_molar_enthalpy: ChemicalScalar,
    pub residual_molar_heat_capacity_cp: ChemicalScalar,
    pub residual_molar_heat_capacity_cv: ChemicalScalar,
}

impl PhaseChemicalModelResult {
    /// Ideal-mixing result with the given `ln_activities`.
    pub fn ideal(ln_activities: ChemicalVector) -> Self {
        let n = ln_activities.num_species();
        Self {
            ln_activity_coefficients: ChemicalVector::zeros(ln_activities.len(), n),
            ln_activities,
            molar_volume: ChemicalScalar::zero(n),
            residual_molar_gibbs_energy: ChemicalScalar::zero(n),
            residual_molar_enthalpy: ChemicalScalar::zero(n),
            residual_molar_heat_capacity_cp: ChemicalScalar::zero(n),
            residual_molar_heat_capacity_cv: ChemicalScalar::zero(n),
        }
    }

    pub fn num_species(&self) -> usize {
        self.ln_activities.len()
    }
}

/// Composition-dependent model of a phase.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait PhaseChemicalModel: Send + Sync + fmt::Debug {
    /// Evaluate at temperature `t` (K), pressure `p` (Pa) and phase species
    /// amounts `n` (mol).
    fn evaluate(&self, t: f64, p: f64, n: &DVector<f64>) -> ThermoResult<PhaseChemicalModelResult>;
}

/// Mole fractions `x = n/Σn` with their amount derivatives.
///
/// An empty phase reports the uniform composition.
pub fn mole_fractions(n: &DVector<f64>) -> ChemicalVector {
    let len = n.len();
    let total = n.sum();
    if total <= 0.0 {
        let uniform = DVector::from_element(len, 1.0 / len.max(1) as f64);
        return ChemicalVector::new(
            uniform,
            DVector::zeros(len),
            DVector::zeros(len),
            nalgebra::DMatrix::zeros(len, len),
        );
    }
    let amounts = ChemicalVector::composition(n);
    let nt = amounts.sum();
    amounts.scale(&(1.0 / &nt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_phase_is_uniform() {
        let x = mole_fractions(&DVector::zeros(4));
        assert_relative_eq!(x.val.sum(), 1.0);
        assert_eq!(x.ddn.norm(), 0.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mole_fractions_sum_to_one(n in prop::collection::vec(1e-6_f64..10.0, 1..6)) {
            let x = mole_fractions(&DVector::from_vec(n));
            prop_assert!((x.val.sum() - 1.0).abs() < 1e-12);
            for j in 0..x.num_species() {
                prop_assert!(x.ddn.column(j).sum().abs() < 1e-10);
            }
        }
    }
}
