//! Standard properties of liquid water as the aqueous solvent.
//!
//! The water equation of state is shifted onto the apparent-energy scale
//! of the solutes with the triple-point constants of Helgeson and Kirkham
//! (1974).

use crate::dual::{SpeciesThermoState, seed};
use crate::water::WaterState;
use num_dual::DualNum;
use rk_core::constants::{CALORIE, WATER_MOLAR_MASS};

/// Triple point temperature, K.
pub const TRIPLE_POINT_TEMPERATURE: f64 = 273.16;
/// Entropy at the triple point, cal/(mol·K).
pub const TRIPLE_POINT_ENTROPY: f64 = 15.1320;
/// Apparent Gibbs energy at the triple point, cal/mol.
pub const TRIPLE_POINT_GIBBS_ENERGY: f64 = -56290.0;
/// Apparent enthalpy at the triple point, cal/mol.
pub const TRIPLE_POINT_ENTHALPY: f64 = -68767.0;
/// Apparent internal energy at the triple point, cal/mol.
pub const TRIPLE_POINT_INTERNAL_ENERGY: f64 = -67887.0;
/// Apparent Helmholtz energy at the triple point, cal/mol.
pub const TRIPLE_POINT_HELMHOLTZ_ENERGY: f64 = -55415.0;

/// Apparent molar Gibbs energy of water, J/mol, from its specific Gibbs
/// energy (J/kg) on the equation-of-state scale.
pub fn gibbs_energy<D: DualNum<f64> + Copy>(t: D, specific_gibbs_energy: D) -> D {
    let str_ = TRIPLE_POINT_ENTROPY * CALORIE;
    specific_gibbs_energy * WATER_MOLAR_MASS - (t - TRIPLE_POINT_TEMPERATURE) * str_
        + TRIPLE_POINT_GIBBS_ENERGY * CALORIE
}

/// Standard properties of water at the state of `water`.
///
/// Internal and Helmholtz energies are reported on their own tabulated
/// scales, which differ from `H − PV` and `U − TS` by constants.
pub fn state(water: &WaterState) -> SpeciesThermoState {
    let (t, p) = (water.temperature, water.pressure);
    let (td, _) = seed(t, p);
    let g = gibbs_energy(td, water.specific_gibbs_energy);
    let ts_tr = TRIPLE_POINT_TEMPERATURE * TRIPLE_POINT_ENTROPY;
    let offset = (TRIPLE_POINT_ENTHALPY - TRIPLE_POINT_GIBBS_ENERGY - ts_tr) * CALORIE;
    let mut s = SpeciesThermoState::from_gibbs(&g, t, p, offset);
    s.internal_energy.val += (TRIPLE_POINT_INTERNAL_ENERGY - TRIPLE_POINT_ENTHALPY) * CALORIE;
    s.helmholtz_energy.val +=
        (TRIPLE_POINT_HELMHOLTZ_ENERGY + ts_tr - TRIPLE_POINT_ENTHALPY) * CALORIE;
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pure_water_reference_values() {
        let s = state(&WaterState::compute(298.15, 1e5).unwrap());
        assert_relative_eq!(s.gibbs_energy.val, -237181.0, max_relative = 2e-4);
        assert_relative_eq!(s.enthalpy.val, -285830.0, max_relative = 2e-4);
        assert_relative_eq!(s.entropy.val, 69.92, max_relative = 2e-3);
        assert_relative_eq!(s.volume.val, 1.8068e-5, max_relative = 1e-3);
        assert_relative_eq!(s.heat_capacity_cp.val, 75.33, max_relative = 5e-3);
    }

    #[test]
    fn apparent_scale_at_triple_point() {
        let s = state(&WaterState::compute(TRIPLE_POINT_TEMPERATURE, 611.657).unwrap());
        assert_relative_eq!(
            s.gibbs_energy.val,
            TRIPLE_POINT_GIBBS_ENERGY * CALORIE,
            max_relative = 1e-5
        );
        assert_relative_eq!(
            s.internal_energy.val,
            TRIPLE_POINT_INTERNAL_ENERGY * CALORIE,
            max_relative = 1e-3
        );
        assert_relative_eq!(
            s.helmholtz_energy.val,
            TRIPLE_POINT_HELMHOLTZ_ENERGY * CALORIE,
            max_relative = 1e-3
        );
    }
}
