//! Chemical state: temperature, pressure, amounts and dual potentials.

use crate::error::{SystemError, SystemResult};
use crate::properties::ChemicalProperties;
use crate::system::{CHARGE_ELEMENT, ChemicalSystem};
use nalgebra::DVector;
use rk_core::units::{AmountOrMass, Quantity, convert};
use rk_core::{ensure_finite, numeric::Real};
use std::f64::consts::LN_10;
use std::sync::Arc;

/// State of a chemical system.
///
/// Dual potentials are stored divided by RT: `y` per element (including the
/// charge element) and `z` per species, so that at equilibrium
/// `μ/RT = Aᵀy + z` with `z ≥ 0` and `z·n = 0`.
#[derive(Debug, Clone)]
pub struct ChemicalState {
    system: Arc<ChemicalSystem>,
    temperature: f64,
    pressure: f64,
    n: DVector<f64>,
    y: DVector<f64>,
    z: DVector<f64>,
}

impl ChemicalState {
    /// State at 298.15 K and 1 bar with zero amounts.
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        let (ne, ns) = (system.num_elements(), system.num_species());
        Self {
            system,
            temperature: 298.15,
            pressure: 1e5,
            n: DVector::zeros(ns),
            y: DVector::zeros(ne),
            z: DVector::zeros(ns),
        }
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn set_temperature(&mut self, t: f64) -> SystemResult<()> {
        if !(ensure_finite(t, "temperature")? > 0.0) {
            return Err(SystemError::InvalidArg {
                what: format!("temperature must be positive, got {t} K"),
            });
        }
        self.temperature = t;
        Ok(())
    }

    pub fn set_temperature_with_units(&mut self, value: f64, units: &str) -> SystemResult<()> {
        self.set_temperature(convert(value, units, Quantity::Temperature)?)
    }

    pub fn set_pressure(&mut self, p: f64) -> SystemResult<()> {
        if !(ensure_finite(p, "pressure")? > 0.0) {
            return Err(SystemError::InvalidArg {
                what: format!("pressure must be positive, got {p} Pa"),
            });
        }
        self.pressure = p;
        Ok(())
    }

    pub fn set_pressure_with_units(&mut self, value: f64, units: &str) -> SystemResult<()> {
        self.set_pressure(convert(value, units, Quantity::Pressure)?)
    }

    pub fn set_species_amounts(&mut self, n: DVector<f64>) -> SystemResult<()> {
        self.check_len(n.len(), self.system.num_species(), "species amounts")?;
        self.n = n;
        Ok(())
    }

    /// Set all species amounts to `value` (mol).
    pub fn fill_species_amounts(&mut self, value: f64) {
        self.n.fill(value);
    }

    pub fn set_species_amount(&mut self, ispecies: usize, value: f64) -> SystemResult<()> {
        self.check_index(ispecies, self.system.num_species(), "species")?;
        self.n[ispecies] = ensure_finite(value, "species amount")?;
        Ok(())
    }

    /// Set a species amount from an amount or mass with units (`"mol"`, `"g"`, ...).
    pub fn set_species_amount_by_name(&mut self, name: &str, value: f64, units: &str) -> SystemResult<()> {
        let i = self.system.index_species_with_error(name)?;
        let molar_mass = self.system.species_at(i).molar_mass();
        self.set_species_amount(i, AmountOrMass::parse(value, units)?.moles(molar_mass))
    }

    pub fn set_species_amounts_in_phase(&mut self, iphase: usize, values: &DVector<f64>) -> SystemResult<()> {
        self.check_index(iphase, self.system.num_phases(), "phase")?;
        let offset = self.system.index_first_species_in_phase(iphase);
        let len = self.system.num_species_in_phase(iphase);
        self.check_len(values.len(), len, "phase species amounts")?;
        self.n.rows_mut(offset, len).copy_from(values);
        Ok(())
    }

    pub fn set_element_duals(&mut self, y: DVector<f64>) -> SystemResult<()> {
        self.check_len(y.len(), self.system.num_elements(), "element duals")?;
        self.y = y;
        Ok(())
    }

    pub fn set_species_duals(&mut self, z: DVector<f64>) -> SystemResult<()> {
        self.check_len(z.len(), self.system.num_species(), "species duals")?;
        self.z = z;
        Ok(())
    }

    fn check_len(&self, got: usize, expected: usize, what: &'static str) -> SystemResult<()> {
        if got == expected {
            Ok(())
        } else {
            Err(SystemError::InvalidArg {
                what: format!("{what}: expected {expected} entries, got {got}"),
            })
        }
    }

    fn check_index(&self, index: usize, len: usize, what: &'static str) -> SystemResult<()> {
        if index < len {
            Ok(())
        } else {
            Err(rk_core::CoreError::IndexOob { what, index, len }.into())
        }
    }

    /// K
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Pa
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn species_amounts(&self) -> &DVector<f64> {
        &self.n
    }

    pub fn species_amount(&self, ispecies: usize) -> f64 {
        self.n[ispecies]
    }

    /// Amount of a species in `units` (an amount or mass unit).
    pub fn species_amount_by_name(&self, name: &str, units: &str) -> SystemResult<f64> {
        let i = self.system.index_species_with_error(name)?;
        let mol = self.n[i];
        Ok(match AmountOrMass::parse(1.0, units)? {
            AmountOrMass::Moles(per_unit) => mol / per_unit,
            AmountOrMass::Mass(per_unit) => mol * self.system.species_at(i).molar_mass() / per_unit,
        })
    }

    pub fn element_duals(&self) -> &DVector<f64> {
        &self.y
    }

    pub fn species_duals(&self) -> &DVector<f64> {
        &self.z
    }

    pub fn element_amounts(&self) -> DVector<f64> {
        self.system.element_amounts(&self.n)
    }

    pub fn element_amount(&self, name: &str) -> SystemResult<f64> {
        let e = self.system.index_element_with_error(name)?;
        Ok(self.system.element_amount(e, &self.n))
    }

    pub fn element_amount_in_phase(&self, element: &str, phase: &str) -> SystemResult<f64> {
        let e = self.system.index_element_with_error(element)?;
        let p = self.system.index_phase_with_error(phase)?;
        Ok(self.system.element_amount_in_phase(e, p, &self.n))
    }

    pub fn phase_amount(&self, iphase: usize) -> f64 {
        let offset = self.system.index_first_species_in_phase(iphase);
        self.n.rows(offset, self.system.num_species_in_phase(iphase)).sum()
    }

    pub fn phase_amounts(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.system.num_phases(),
            (0..self.system.num_phases()).map(|i| self.phase_amount(i)),
        )
    }

    pub fn properties(&self) -> SystemResult<ChemicalProperties> {
        ChemicalProperties::compute(Arc::clone(&self.system), self.temperature, self.pressure, &self.n)
    }

    pub fn scale_species_amounts(&mut self, factor: Real) -> SystemResult<()> {
        if !(ensure_finite(factor, "scaling factor")? >= 0.0) {
            return Err(SystemError::InvalidArg {
                what: format!("scaling factor must be non-negative, got {factor}"),
            });
        }
        self.n *= factor;
        Ok(())
    }

    pub fn scale_species_amounts_in_phase(&mut self, iphase: usize, factor: Real) -> SystemResult<()> {
        self.check_index(iphase, self.system.num_phases(), "phase")?;
        ensure_finite(factor, "scaling factor")?;
        let offset = self.system.index_first_species_in_phase(iphase);
        let len = self.system.num_species_in_phase(iphase);
        self.n.rows_mut(offset, len).scale_mut(factor);
        Ok(())
    }

    /// Scale the amounts of one phase so that its volume becomes `volume`.
    pub fn scale_phase_volume(&mut self, iphase: usize, volume: f64, units: &str) -> SystemResult<()> {
        self.check_index(iphase, self.system.num_phases(), "phase")?;
        let target = convert(volume, units, Quantity::Volume)?;
        let current = self.properties()?.phase_volumes().val[iphase];
        if !(current > 0.0) {
            return Err(SystemError::InvalidArg {
                what: format!("phase {} has no volume to scale", self.system.phase(iphase).name()),
            });
        }
        self.scale_species_amounts_in_phase(iphase, target / current)
    }

    /// Scale all amounts so that the total volume becomes `volume`.
    pub fn scale_volume(&mut self, volume: f64, units: &str) -> SystemResult<()> {
        let target = convert(volume, units, Quantity::Volume)?;
        let current = self.properties()?.volume().val;
        if !(current > 0.0) {
            return Err(SystemError::InvalidArg {
                what: "the system has no volume to scale".into(),
            });
        }
        self.scale_species_amounts(target / current)
    }

    /// `log₁₀ Σᵢ xᵢ·exp(−zᵢ)` per phase: zero for stable phases, negative
    /// for phases that would dissolve away.
    pub fn phase_stability_indices(&self) -> DVector<f64> {
        let np = self.system.num_phases();
        let mut out = DVector::zeros(np);
        for ip in 0..np {
            let offset = self.system.index_first_species_in_phase(ip);
            let len = self.system.num_species_in_phase(ip);
            let n = self.n.rows(offset, len);
            let z = self.z.rows(offset, len);
            let total = n.sum();
            let omega: f64 = if total > 0.0 {
                n.iter().zip(z.iter()).map(|(ni, zi)| ni / total * (-zi).exp()).sum()
            } else {
                z.iter().map(|zi| (-zi).exp()).sum::<f64>() / len as f64
            };
            out[ip] = omega.log10();
        }
        out
    }

    /// pe from the dual potential of the charge element.
    pub fn pe_from_charge_dual(&self) -> SystemResult<f64> {
        let iz = self.system.index_element_with_error(CHARGE_ELEMENT)?;
        Ok(self.y[iz] / LN_10)
    }
}
