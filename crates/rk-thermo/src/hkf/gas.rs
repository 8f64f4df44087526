//! Standard properties of gases with Maier–Kelley heat capacities.

use super::{REFERENCE_TEMPERATURE, to_joule};
use crate::dual::{SpeciesThermoState, c, seed};
use crate::error::{ThermoError, ThermoResult};
use crate::species::{GasHkfParams, MaierKelley};
use num_dual::DualNum;
use rk_core::constants::CALORIE;

/// ∫Cp dT and ∫Cp/T dT from `t0` to `t1` (cal units).
pub(crate) fn heat_capacity_integrals<D: DualNum<f64> + Copy>(cp: &MaierKelley, t0: D, t1: D) -> (D, D) {
    let MaierKelley { a, b, c } = *cp;
    let cpdt = (t1 - t0) * a + (t1 * t1 - t0 * t0) * (0.5 * b) - (t1.recip() - t0.recip()) * c;
    let cpdlnt = (t1 / t0).ln() * a + (t1 - t0) * b - (t1.powi(-2) - t0.powi(-2)) * (0.5 * c);
    (cpdt, cpdlnt)
}

/// Standard Gibbs energy of a gas at the reference pressure, J/mol.
///
/// Pressure enters through the activity, so the standard volume is zero.
pub fn gibbs_energy<D: DualNum<f64> + Copy>(params: &GasHkfParams, t: D) -> D {
    let tr = REFERENCE_TEMPERATURE;
    let (cpdt, cpdlnt) = heat_capacity_integrals(&params.cp, c::<D>(tr), t);
    to_joule(c::<D>(params.gf) - (t - tr) * params.sr + cpdt - t * cpdlnt)
}

pub fn state(name: &str, params: &GasHkfParams, t: f64, p: f64) -> ThermoResult<SpeciesThermoState> {
    if t > params.tmax {
        return Err(ThermoError::InvalidTemperatureRange {
            species: name.to_string(),
            t,
            tmax: params.tmax,
        });
    }
    let (td, _) = seed(t, p);
    let g = gibbs_energy(params, td);
    let offset = (params.hf - params.gf - REFERENCE_TEMPERATURE * params.sr) * CALORIE;
    Ok(SpeciesThermoState::from_gibbs(&g, t, p, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn co2() -> GasHkfParams {
        GasHkfParams {
            gf: -94254.0,
            hf: -94051.0,
            sr: 51.08,
            cp: MaierKelley {
                a: 10.57,
                b: 2.10e-3,
                c: -2.06e5,
            },
            tmax: 2500.0,
        }
    }

    #[test]
    fn reference_and_heat_capacity() {
        let s = state("CO2(g)", &co2(), 298.15, 1e5).unwrap();
        assert_relative_eq!(s.gibbs_energy.val, -94254.0 * CALORIE, max_relative = 1e-12);
        assert_relative_eq!(s.enthalpy.val, -94051.0 * CALORIE, max_relative = 1e-12);
        assert_relative_eq!(s.entropy.val, 51.08 * CALORIE, max_relative = 1e-12);
        let cp = 10.57 + 2.10e-3 * 298.15 - 2.06e5 / (298.15 * 298.15);
        assert_relative_eq!(s.heat_capacity_cp.val, cp * CALORIE, max_relative = 1e-10);
        assert_eq!(s.volume.val, 0.0);
    }

    #[test]
    fn enthalpy_integrates_heat_capacity() {
        let params = co2();
        let s = state("CO2(g)", &params, 500.0, 1e5).unwrap();
        let (cpdt, _) = heat_capacity_integrals(&params.cp, 298.15, 500.0);
        assert_relative_eq!(s.enthalpy.val, (params.hf + cpdt) * CALORIE, max_relative = 1e-10);
        assert!(state("CO2(g)", &params, 3000.0, 1e5).is_err());
    }
}
