//! Standard properties of minerals with polymorphic transitions.

use super::gas::heat_capacity_integrals;
use super::{REFERENCE_PRESSURE, REFERENCE_TEMPERATURE, to_joule};
use crate::dual::{SpeciesThermoState, c, seed};
use crate::error::{ThermoError, ThermoResult};
use crate::species::MineralHkfParams;
use num_dual::DualNum;
use rk_core::constants::CALORIE;

/// cm³·bar expressed in calories.
const CM3_BAR_TO_CAL: f64 = 0.023901488;

/// Reject incomplete or inconsistent parameter sets.
pub fn validate(name: &str, params: &MineralHkfParams) -> ThermoResult<()> {
    let core = [params.gf, params.hf, params.sr, params.vr];
    if core.iter().any(|v| !v.is_finite()) {
        return Err(ThermoError::NonFinite {
            what: format!("standard reference data of mineral {name}"),
        });
    }
    if params.cp.len() != params.transitions.len() + 1 {
        return Err(ThermoError::InvalidArg {
            what: format!(
                "mineral {name} needs one heat capacity set per temperature interval ({} for {} transitions)",
                params.transitions.len() + 1,
                params.transitions.len()
            ),
        });
    }
    if params
        .transitions
        .windows(2)
        .any(|w| w[0].temperature >= w[1].temperature)
    {
        return Err(ThermoError::InvalidArg {
            what: format!("transitions of mineral {name} must be sorted by temperature"),
        });
    }
    Ok(())
}

/// Standard Gibbs energy of a mineral, J/mol.
pub fn gibbs_energy<D: DualNum<f64> + Copy>(params: &MineralHkfParams, t: D, p: D) -> D {
    let (tr, pr) = (REFERENCE_TEMPERATURE, REFERENCE_PRESSURE);
    let pb = p * 1e-5;
    let crossed: Vec<_> = params
        .transitions
        .iter()
        .filter(|x| t.re() > x.temperature)
        .collect();

    // Heat capacity integrals along P = Pr, one interval per crossed transition.
    let mut bounds = vec![c::<D>(tr)];
    bounds.extend(crossed.iter().map(|x| c::<D>(x.temperature)));
    bounds.push(t);
    let mut cpdt = c::<D>(0.0);
    let mut cpdlnt = c::<D>(0.0);
    for (i, w) in bounds.windows(2).enumerate() {
        let (a, b) = heat_capacity_integrals(&params.cp[i], w[0], w[1]);
        cpdt += a;
        cpdlnt += b;
    }

    // Latent heat of the crossed transitions.
    let mut gdh = c::<D>(0.0);
    let mut volume = params.vr;
    for x in &crossed {
        gdh += (t - x.temperature) * (x.enthalpy / x.temperature);
        volume += x.volume;
    }

    // Volume integral along T, undoing transitions whose boundary lies below P.
    let mut vdp = (pb - pr) * (CM3_BAR_TO_CAL * volume);
    for x in params.transitions.iter().filter(|x| x.dpdt != 0.0) {
        let pt = (t - x.temperature) * x.dpdt + pr;
        if 0.0 < pt.re() && pt.re() < pb.re() {
            vdp -= (pb - pt) * (CM3_BAR_TO_CAL * x.volume);
        }
    }

    to_joule(c::<D>(params.gf) - (t - tr) * params.sr + cpdt - t * cpdlnt + vdp - gdh)
}

pub fn state(
    name: &str,
    params: &MineralHkfParams,
    t: f64,
    p: f64,
) -> ThermoResult<SpeciesThermoState> {
    validate(name, params)?;
    if t < 0.0 || t > params.tmax {
        return Err(ThermoError::InvalidTemperatureRange {
            species: name.to_string(),
            t,
            tmax: params.tmax,
        });
    }
    let (td, pd) = seed(t, p);
    let g = gibbs_energy(params, td, pd);
    let offset = (params.hf - params.gf - REFERENCE_TEMPERATURE * params.sr) * CALORIE;
    Ok(SpeciesThermoState::from_gibbs(&g, t, p, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{MaierKelley, PhaseTransition};
    use approx::assert_relative_eq;

    fn calcite() -> MineralHkfParams {
        MineralHkfParams {
            gf: -269880.0,
            hf: -288552.0,
            sr: 22.15,
            vr: 36.934,
            cp: vec![MaierKelley {
                a: 24.98,
                b: 5.24e-3,
                c: -6.20e5,
            }],
            transitions: vec![],
            tmax: 1200.0,
        }
    }

    fn quartz() -> MineralHkfParams {
        MineralHkfParams {
            gf: -204646.0,
            hf: -217650.0,
            sr: 9.88,
            vr: 22.688,
            cp: vec![
                MaierKelley {
                    a: 11.22,
                    b: 8.20e-3,
                    c: -2.70e5,
                },
                MaierKelley {
                    a: 14.41,
                    b: 1.94e-3,
                    c: 0.0,
                },
            ],
            transitions: vec![PhaseTransition {
                temperature: 848.0,
                enthalpy: 290.0,
                volume: 0.372,
                dpdt: 38.5,
            }],
            tmax: 2000.0,
        }
    }

    #[test]
    fn volume_from_pressure_derivative() {
        let s = state("Calcite", &calcite(), 298.15, 1e5).unwrap();
        assert_relative_eq!(s.volume.val, 36.934e-6, max_relative = 1e-4);
        assert_relative_eq!(s.gibbs_energy.val, -269880.0 * CALORIE, max_relative = 1e-12);
        assert_relative_eq!(s.heat_capacity_cv.val, s.heat_capacity_cp.val);
    }

    #[test]
    fn transition_adds_latent_heat() {
        let params = quartz();
        let below = state("Quartz", &params, 847.0, 1e5).unwrap();
        let above = state("Quartz", &params, 849.0, 1e5).unwrap();
        let jump = (above.enthalpy.val - below.enthalpy.val) / CALORIE;
        // latent heat plus ~2 K of sensible heat
        assert!(jump > 290.0 && jump < 290.0 + 2.0 * 30.0);
        // Gibbs energy stays continuous across the transition.
        assert!(((above.gibbs_energy.val - below.gibbs_energy.val) / CALORIE).abs() < 100.0);
    }

    #[test]
    fn invalid_data_rejected() {
        let mut params = calcite();
        params.gf = f64::NAN;
        assert!(matches!(
            state("Calcite", &params, 298.15, 1e5),
            Err(ThermoError::NonFinite { .. })
        ));
        let mut params = quartz();
        params.cp.pop();
        assert!(state("Quartz", &params, 298.15, 1e5).is_err());
        assert!(state("Calcite", &calcite(), 1300.0, 1e5).is_err());
    }
}
