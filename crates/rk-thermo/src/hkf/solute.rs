//! Standard partial molal properties of aqueous solutes.

use super::{
    PSI, REFERENCE_BORN_Y, REFERENCE_BORN_Z, REFERENCE_PRESSURE, REFERENCE_TEMPERATURE, THETA,
    g_function, omega, to_joule,
};
use crate::dual::{SpeciesThermoState, c, seed};
use crate::error::{ThermoError, ThermoResult};
use crate::species::AqueousHkfParams;
use crate::water::WaterState;
use num_dual::DualNum;
use rk_core::constants::CALORIE;

/// Apparent standard Gibbs energy of a solute, J/mol.
///
/// `p` in Pa, `rho` in kg/m³, `z` the Born function of the solvent.
pub fn gibbs_energy<D: DualNum<f64> + Copy>(
    params: &AqueousHkfParams,
    charge: f64,
    t: D,
    p: D,
    rho: D,
    z: D,
) -> D {
    let AqueousHkfParams {
        gf,
        sr,
        a1,
        a2,
        a3,
        a4,
        c1,
        c2,
        wref,
        ..
    } = *params;
    let (tr, pr) = (REFERENCE_TEMPERATURE, REFERENCE_PRESSURE);
    let pb = p * 1e-5;
    let w = omega(g_function(t, pb, rho), wref, charge);

    let lnp = ((pb + PSI) * (1.0 / (PSI + pr))).ln();
    let tth = t - THETA;
    let c2_term = (tth.recip() - 1.0 / (tr - THETA)) * ((c::<D>(THETA) - t) * (1.0 / THETA))
        - t * (1.0 / (THETA * THETA)) * (tth * (tr / (tr - THETA)) / t).ln();

    let g = c::<D>(gf) - (t - tr) * sr - (t * (t * (1.0 / tr)).ln() - t + tr) * c1
        + (pb - pr) * a1
        + lnp * a2
        - c2_term * c2
        + tth.recip() * ((pb - pr) * a3 + lnp * a4)
        - w * (z + 1.0)
        + wref * (REFERENCE_BORN_Z + 1.0)
        + (t - tr) * (wref * REFERENCE_BORN_Y);
    to_joule(g)
}

/// Standard properties of a solute at (t, p) given the solvent state.
pub fn state(
    name: &str,
    params: &AqueousHkfParams,
    charge: f64,
    water: &WaterState,
) -> ThermoResult<SpeciesThermoState> {
    let (t, p) = (water.temperature, water.pressure);
    if t > params.tmax {
        return Err(ThermoError::InvalidTemperatureRange {
            species: name.to_string(),
            t,
            tmax: params.tmax,
        });
    }
    let (td, pd) = seed(t, p);
    let g = gibbs_energy(params, charge, td, pd, water.density, water.born_z);
    let offset = (params.hf - params.gf - REFERENCE_TEMPERATURE * params.sr) * CALORIE;
    Ok(SpeciesThermoState::from_gibbs(&g, t, p, offset))
}
