//! Gaseous phase activity models.

use crate::cubic::{CubicEos, CubicEosKind};
use crate::error::{ThermoError, ThermoResult};
use crate::mixture::{PhaseChemicalModel, PhaseChemicalModelResult, mole_fractions};
use crate::species::Species;
use nalgebra::DVector;
use rk_core::constants::{GAS_CONSTANT, REFERENCE_PRESSURE};
use rk_core::{ChemicalScalar, ChemicalVector, ThermoScalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaseousActivityModel {
    Ideal,
    Cubic(CubicEosKind),
}

#[derive(Debug, Clone)]
enum Inner {
    Ideal,
    Cubic(CubicEos),
}

/// Chemical model of a gaseous phase.
#[derive(Debug, Clone)]
pub struct GaseousChemicalModel {
    inner: Inner,
}

impl GaseousChemicalModel {
    pub fn new(species: &[Species], model: GaseousActivityModel) -> ThermoResult<Self> {
        let inner = match model {
            GaseousActivityModel::Ideal => Inner::Ideal,
            GaseousActivityModel::Cubic(kind) => Inner::Cubic(CubicEos::new(species, kind)?),
        };
        Ok(Self { inner })
    }

    /// Shorthand for a Peng–Robinson phase.
    pub fn peng_robinson(species: &[Species]) -> ThermoResult<Self> {
        Self::new(species, GaseousActivityModel::Cubic(CubicEosKind::PengRobinson))
    }
}

/// `ln(P/P°)` with P° = 1 bar.
fn ln_pressure_bar(p: f64, nspecies: usize) -> ChemicalScalar {
    ChemicalScalar::from_thermo(nspecies, (ThermoScalar::pressure(p) / REFERENCE_PRESSURE).ln())
}

impl PhaseChemicalModel for GaseousChemicalModel {
    fn evaluate(&self, t: f64, p: f64, n: &DVector<f64>) -> ThermoResult<PhaseChemicalModelResult> {
        if !(p > 0.0) {
            return Err(ThermoError::OutOfRange {
                what: "gas pressure (Pa)",
                value: p,
            });
        }
        let ns = n.len();
        let x = mole_fractions(n);
        let ln_p = ln_pressure_bar(p, ns);
        let ln_x = x.ln();
        match &self.inner {
            Inner::Ideal => {
                let ln_a = &ln_x + &ln_p;
                let v = ThermoScalar::temperature(t) * GAS_CONSTANT / ThermoScalar::pressure(p);
                Ok(PhaseChemicalModelResult {
                    molar_volume: ChemicalScalar::from_thermo(ns, v),
                    ..PhaseChemicalModelResult::ideal(ln_a)
                })
            }
            Inner::Cubic(eos) => {
                let res = eos.evaluate(t, p, n)?;
                let ln_a = &(&res.ln_fugacity_coefficients + &ln_x) + &ln_p;
                Ok(PhaseChemicalModelResult {
                    ln_activity_coefficients: res.ln_fugacity_coefficients,
                    ln_activities: ln_a,
                    molar_volume: res.molar_volume,
                    residual_molar_gibbs_energy: res.residual_molar_gibbs_energy,
                    residual_molar_enthalpy: res.residual_molar_enthalpy,
                    residual_molar_heat_capacity_cp: res.residual_molar_heat_capacity_cp,
                    residual_molar_heat_capacity_cv: res.residual_molar_heat_capacity_cv,
                })
            }
        }
    }
}

/// Ideal-gas activities `ln x + ln(P/P°)` used where no model is attached.
pub fn ideal_gas_ln_activities(p: f64, n: &DVector<f64>) -> ChemicalVector {
    &mole_fractions(n).ln() + &ln_pressure_bar(p, n.len())
}
