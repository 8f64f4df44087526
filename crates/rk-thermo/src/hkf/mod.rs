//! Helgeson–Kirkham–Flowers equations of state.
//!
//! All Gibbs functions here work in calories and bar internally (the units
//! of the tabulated parameters) and return J/mol.

pub mod gas;
pub mod mineral;
pub mod solute;
pub mod solvent;

use crate::dual::c;
use num_dual::DualNum;
use rk_core::constants::CALORIE;

/// Reference temperature of the tabulated data, K.
pub const REFERENCE_TEMPERATURE: f64 = 298.15;
/// Reference pressure of the tabulated data, bar.
pub const REFERENCE_PRESSURE: f64 = 1.0;
/// Born coefficient constant η, Å·cal/mol.
pub const ETA: f64 = 1.66027e5;
/// Solvent constant Θ, K.
pub const THETA: f64 = 228.0;
/// Solvent constant Ψ, bar.
pub const PSI: f64 = 2600.0;
/// Born function Z at the reference state.
pub const REFERENCE_BORN_Z: f64 = -1.278055636e-2;
/// Born function Y at the reference state, 1/K.
pub const REFERENCE_BORN_Y: f64 = -5.795424563e-5;

/// Solvent g-function of Shock et al. (1992), Å.
///
/// `rho` in kg/m³, `pbar` in bar. Zero for densities at or above 1 g/cm³.
pub fn g_function<D: DualNum<f64> + Copy>(t: D, pbar: D, rho: D) -> D {
    let rh = rho * 1e-3;
    if rh.re() >= 1.0 {
        return c(0.0);
    }
    let tc = t - 273.15;
    let ag = c::<D>(-2.037662) + tc * 5.747000e-3 - tc * tc * 6.557892e-6;
    let bg = c::<D>(6.107361) - tc * 1.074377e-2 + tc * tc * 1.268348e-5;
    let base = ag * (bg * (c::<D>(1.0) - rh).ln()).exp();

    let in_region = (155.0..=355.0).contains(&tc.re()) && pbar.re() < 1000.0;
    if !in_region {
        return base;
    }
    let x = (tc - 155.0) * (1.0 / 300.0);
    let dp = c::<D>(1000.0) - pbar;
    let f = (x.powf(4.8) + x.powi(16) * 36.66666)
        * (dp.powi(3) * -1.504956e-10 + dp.powi(4) * 5.01799e-14);
    base - f
}

/// Effective Born coefficient ω(T, P) of an aqueous species, cal/mol.
///
/// Neutral species keep their reference value.
pub fn omega<D: DualNum<f64> + Copy>(g: D, wref: f64, charge: f64) -> D {
    if charge == 0.0 {
        return c(wref);
    }
    let z = charge;
    let reref = z * z / (wref / ETA + z / 3.082);
    let re = g * z.abs() + reref;
    (re.recip() * (z * z) - (g + 3.082).recip() * z) * ETA
}

pub(crate) fn to_joule<D: DualNum<f64> + Copy>(cal: D) -> D {
    cal * CALORIE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::eos::density;
    use approx::assert_relative_eq;

    #[test]
    fn g_vanishes_at_ambient() {
        let rho: f64 = density(298.15, 1e5);
        let g = g_function(298.15, 1.0, rho);
        assert!(g.abs() < 1e-10);
    }

    #[test]
    fn omega_recovers_reference_value() {
        let w: f64 = omega(0.0, 1.7246e5, -1.0);
        assert_relative_eq!(w, 1.7246e5, max_relative = 1e-12);
        let w_h: f64 = omega(0.3, 0.0, 1.0);
        assert!(w_h.abs() < 1e-9);
    }

    #[test]
    fn g_is_negative_when_hot() {
        let rho: f64 = density(573.15, 10e6);
        let g = g_function(573.15, 100.0, rho);
        assert!(g < 0.0);
    }
}
