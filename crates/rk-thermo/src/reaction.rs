//! Standard thermodynamics of reactions.

use crate::standard::PhaseThermoModelResult;
use nalgebra::DVector;
use rk_core::ThermoScalar;
use rk_core::constants::GAS_CONSTANT;
use std::f64::consts::LN_10;

/// Standard reaction properties, each with T and P derivatives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionThermoState {
    pub ln_equilibrium_constant: ThermoScalar,
    pub log_equilibrium_constant: ThermoScalar,
    pub gibbs_energy: ThermoScalar,
    pub enthalpy: ThermoScalar,
    pub entropy: ThermoScalar,
    pub volume: ThermoScalar,
}

/// Combine standard species properties with stoichiometric coefficients
/// `nu` (products positive, reactants negative).
pub fn reaction_thermo_state(
    nu: &DVector<f64>,
    standard: &PhaseThermoModelResult,
    t: f64,
) -> ReactionThermoState {
    let gibbs_energy = standard.gibbs_energies.dot(nu);
    let rt = ThermoScalar::temperature(t) * GAS_CONSTANT;
    let ln_k = -gibbs_energy / rt;
    ReactionThermoState {
        ln_equilibrium_constant: ln_k,
        log_equilibrium_constant: ln_k / LN_10,
        gibbs_energy,
        enthalpy: standard.enthalpies.dot(nu),
        entropy: standard.entropies.dot(nu),
        volume: standard.volumes.dot(nu),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::standard::{PhaseThermoModel, StandardThermoModel};
    use approx::assert_relative_eq;

    fn log_k(names: &[&str], nu: &[f64], t: f64) -> ReactionThermoState {
        let species = names.iter().map(|n| catalog::species(n).unwrap()).collect();
        let res = StandardThermoModel::new(species).evaluate(t, 1e5).unwrap();
        reaction_thermo_state(&DVector::from_row_slice(nu), &res, t)
    }

    #[test]
    fn calcite_dissolution_constant() {
        // Calcite = Ca++ + CO3--
        let r = log_k(&["Calcite", "Ca++", "CO3--"], &[-1.0, 1.0, 1.0], 298.15);
        assert_relative_eq!(r.log_equilibrium_constant.val, -8.48, epsilon = 0.05);
    }

    #[test]
    fn carbonic_acid_constant() {
        // CO2(aq) + H2O = HCO3- + H+
        let r = log_k(&["CO2(aq)", "H2O(l)", "HCO3-", "H+"], &[-1.0, -1.0, 1.0, 1.0], 298.15);
        assert_relative_eq!(r.log_equilibrium_constant.val, -6.345, epsilon = 0.05);
    }

    #[test]
    fn van_t_hoff_relation() {
        // d lnK / dT = ΔH° / (R T²), up to the rounding of the tabulated data
        let t = 320.0;
        let r = log_k(&["HCO3-", "CO3--", "H+"], &[-1.0, 1.0, 1.0], t);
        assert_relative_eq!(
            r.ln_equilibrium_constant.ddt,
            r.enthalpy.val / (GAS_CONSTANT * t * t),
            max_relative = 1e-3
        );
    }
}
