//! Standard-state property models of a phase.

use crate::dual::{SpeciesThermoState, seed};
use crate::error::{ThermoError, ThermoResult};
use crate::hkf::{gas, mineral, solute, solvent};
use crate::species::{ConstantThermoParams, Species, SpeciesThermoParams};
use crate::water::{WaterEvaluator, WaterState};
use rk_core::constants::REFERENCE_PRESSURE;
use rk_core::{MemoizationCache, ThermoVector, TpKey};
use std::fmt;

/// Standard partial molar properties of every species of a phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseThermoModelResult {
    pub gibbs_energies: ThermoVector,
    pub enthalpies: ThermoVector,
    pub entropies: ThermoVector,
    pub volumes: ThermoVector,
    pub heat_capacities_cp: ThermoVector,
    pub heat_capacities_cv: ThermoVector,
    pub internal_energies: ThermoVector,
    pub helmholtz_energies: ThermoVector,
}

impl PhaseThermoModelResult {
    pub fn zeros(nspecies: usize) -> Self {
        let z = ThermoVector::zeros(nspecies);
        Self {
            gibbs_energies: z.clone(),
            enthalpies: z.clone(),
            entropies: z.clone(),
            volumes: z.clone(),
            heat_capacities_cp: z.clone(),
            heat_capacities_cv: z.clone(),
            internal_energies: z.clone(),
            helmholtz_energies: z,
        }
    }

    pub fn num_species(&self) -> usize {
        self.gibbs_energies.len()
    }

    pub fn set_species(&mut self, i: usize, s: &SpeciesThermoState) {
        self.gibbs_energies.set_row(i, s.gibbs_energy);
        self.enthalpies.set_row(i, s.enthalpy);
        self.entropies.set_row(i, s.entropy);
        self.volumes.set_row(i, s.volume);
        self.heat_capacities_cp.set_row(i, s.heat_capacity_cp);
        self.heat_capacities_cv.set_row(i, s.heat_capacity_cv);
        self.internal_energies.set_row(i, s.internal_energy);
        self.helmholtz_energies.set_row(i, s.helmholtz_energy);
    }

    /// Copy `other` into rows `start..`.
    pub fn set_block(&mut self, start: usize, other: &PhaseThermoModelResult) {
        self.gibbs_energies.set_rows(start, &other.gibbs_energies);
        self.enthalpies.set_rows(start, &other.enthalpies);
        self.entropies.set_rows(start, &other.entropies);
        self.volumes.set_rows(start, &other.volumes);
        self.heat_capacities_cp.set_rows(start, &other.heat_capacities_cp);
        self.heat_capacities_cv.set_rows(start, &other.heat_capacities_cv);
        self.internal_energies.set_rows(start, &other.internal_energies);
        self.helmholtz_energies.set_rows(start, &other.helmholtz_energies);
    }
}

/// Standard-state model of a phase: a function of (T, P) only.
///
/// Implementations must be thread-safe (Send + Sync) so that a chemical
/// system can be shared across threads.
pub trait PhaseThermoModel: Send + Sync + fmt::Debug {
    fn evaluate(&self, t: f64, p: f64) -> ThermoResult<PhaseThermoModelResult>;
}

/// Standard properties of one species.
///
/// `water` is consulted only by aqueous species.
pub fn species_thermo_state(
    species: &Species,
    t: f64,
    p: f64,
    water: &WaterEvaluator,
) -> ThermoResult<SpeciesThermoState> {
    let state = match species.thermo() {
        SpeciesThermoParams::Water => solvent::state(&water.state(t, p)?),
        SpeciesThermoParams::AqueousSoluteHkf(params) => {
            let ws: WaterState = water.state(t, p)?;
            solute::state(species.name(), params, species.charge(), &ws)?
        }
        SpeciesThermoParams::GasHkf(params) => gas::state(species.name(), params, t, p)?,
        SpeciesThermoParams::MineralHkf(params) => mineral::state(species.name(), params, t, p)?,
        SpeciesThermoParams::Constant(params) => constant_state(params, t, p),
    };
    check_finite(species.name(), &state)?;
    Ok(state)
}

fn constant_state(params: &ConstantThermoParams, t: f64, p: f64) -> SpeciesThermoState {
    let (_, pd) = seed(t, p);
    let g = (pd - REFERENCE_PRESSURE) * params.volume + params.gibbs_energy;
    SpeciesThermoState::from_gibbs(&g, t, p, params.enthalpy - params.gibbs_energy)
}

fn check_finite(name: &str, s: &SpeciesThermoState) -> ThermoResult<()> {
    let values = [
        s.gibbs_energy,
        s.enthalpy,
        s.entropy,
        s.volume,
        s.heat_capacity_cp,
    ];
    if values
        .iter()
        .any(|v| !(v.val.is_finite() && v.ddt.is_finite() && v.ddp.is_finite()))
    {
        return Err(ThermoError::NonFinite {
            what: format!("standard properties of species {name}"),
        });
    }
    Ok(())
}

/// Standard-state model backed by the per-species parameters, with a
/// (T, P) memoization cache.
#[derive(Debug, Clone)]
pub struct StandardThermoModel {
    species: Vec<Species>,
    water: WaterEvaluator,
    cache: MemoizationCache<TpKey, PhaseThermoModelResult>,
}

impl StandardThermoModel {
    pub fn new(species: Vec<Species>) -> Self {
        Self {
            species,
            water: WaterEvaluator::new(),
            cache: MemoizationCache::default(),
        }
    }

    fn compute(&self, t: f64, p: f64) -> ThermoResult<PhaseThermoModelResult> {
        let mut res = PhaseThermoModelResult::zeros(self.species.len());
        for (i, s) in self.species.iter().enumerate() {
            res.set_species(i, &species_thermo_state(s, t, p, &self.water)?);
        }
        Ok(res)
    }
}

impl PhaseThermoModel for StandardThermoModel {
    fn evaluate(&self, t: f64, p: f64) -> ThermoResult<PhaseThermoModelResult> {
        self.cache
            .get_or_try_insert_with(TpKey::new(t, p), || self.compute(t, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use approx::assert_relative_eq;

    #[test]
    fn aqueous_phase_standard_properties() {
        let species: Vec<_> = ["H2O(l)", "H+", "OH-"]
            .iter()
            .map(|n| catalog::species(n).unwrap())
            .collect();
        let model = StandardThermoModel::new(species);
        let res = model.evaluate(298.15, 1e5).unwrap();
        assert_eq!(res.num_species(), 3);
        // H+ is zero by convention
        assert_eq!(res.gibbs_energies.val[1], 0.0);
        // Kw at 25 °C: log K ≈ -14
        let dg = res.gibbs_energies.val[1] + res.gibbs_energies.val[2] - res.gibbs_energies.val[0];
        let log_k = -dg / (rk_core::constants::GAS_CONSTANT * 298.15 * std::f64::consts::LN_10);
        assert_relative_eq!(log_k, -14.0, epsilon = 0.05);
    }

    #[test]
    fn memoized_results_are_identical() {
        let model = StandardThermoModel::new(vec![catalog::species("Calcite").unwrap()]);
        let a = model.evaluate(310.0, 2e5).unwrap();
        let b = model.evaluate(310.0, 2e5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constant_species_volume() {
        let params = ConstantThermoParams {
            gibbs_energy: -1000.0,
            enthalpy: -500.0,
            volume: 2e-5,
        };
        let s = constant_state(&params, 300.0, 3e5);
        assert_relative_eq!(s.gibbs_energy.val, -1000.0 + 2e-5 * 2e5);
        assert_relative_eq!(s.volume.val, 2e-5);
        assert_relative_eq!(s.enthalpy.val, -500.0 + 2e-5 * 2e5);
    }
}
