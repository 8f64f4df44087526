//! Thermodynamic and chemical properties of a system at (T, P, n).

use crate::aqueous::AqueousProperties;
use crate::error::SystemResult;
use crate::system::ChemicalSystem;
use nalgebra::{DMatrix, DVector};
use rk_core::constants::GAS_CONSTANT;
use rk_core::{ChemicalScalar, ChemicalVector, ThermoScalar, ThermoVector};
use rk_thermo::{PhaseChemicalModelResult, PhaseThermoModelResult, mole_fractions};
use std::sync::Arc;

/// Snapshot of all properties at one (T, P, n).
///
/// `update` recomputes everything; identical inputs give bit-identical
/// snapshots because every model memoizes its (T, P) work.
#[derive(Debug, Clone)]
pub struct ChemicalProperties {
    system: Arc<ChemicalSystem>,
    temperature: f64,
    pressure: f64,
    n: DVector<f64>,
    standard: PhaseThermoModelResult,
    phases: Vec<PhaseChemicalModelResult>,
    molar_fractions: ChemicalVector,
    ln_activity_coefficients: ChemicalVector,
    ln_activities: ChemicalVector,
}

/// Place a phase-local scalar into system-wide amount derivatives.
fn embed(nspecies: usize, offset: usize, s: &ChemicalScalar) -> ChemicalScalar {
    let mut ddn = DVector::zeros(nspecies);
    ddn.rows_mut(offset, s.ddn.len()).copy_from(&s.ddn);
    ChemicalScalar::new(s.val, s.ddt, s.ddp, ddn)
}

/// `Σ xᵢ·vᵢ` over a phase.
fn weighted(x: &ChemicalVector, v: &ThermoVector) -> ChemicalScalar {
    let mut sum = ChemicalScalar::zero(x.num_species());
    for i in 0..x.len() {
        sum += &(&x.row(i) * v.row(i));
    }
    sum
}

impl ChemicalProperties {
    pub fn compute(system: Arc<ChemicalSystem>, t: f64, p: f64, n: &DVector<f64>) -> SystemResult<Self> {
        let ns = system.num_species();
        let mut props = Self {
            standard: PhaseThermoModelResult::zeros(ns),
            phases: Vec::with_capacity(system.num_phases()),
            molar_fractions: ChemicalVector::zeros(ns, ns),
            ln_activity_coefficients: ChemicalVector::zeros(ns, ns),
            ln_activities: ChemicalVector::zeros(ns, ns),
            system,
            temperature: t,
            pressure: p,
            n: DVector::zeros(ns),
        };
        props.update(t, p, n)?;
        Ok(props)
    }

    pub fn update(&mut self, t: f64, p: f64, n: &DVector<f64>) -> SystemResult<()> {
        let system = Arc::clone(&self.system);
        let ns = system.num_species();
        if n.len() != ns {
            return Err(rk_core::CoreError::IndexOob {
                what: "species amounts",
                index: n.len(),
                len: ns,
            }
            .into());
        }
        self.temperature = t;
        self.pressure = p;
        self.n.copy_from(n);
        self.standard = system.standard_properties(t, p)?;
        self.phases.clear();
        for (ip, phase) in system.phases().iter().enumerate() {
            let offset = system.index_first_species_in_phase(ip);
            let np = n.rows(offset, phase.num_species()).into_owned();
            let res = phase.chemical_model().evaluate(t, p, &np)?;
            self.molar_fractions.set_block(offset, offset, &mole_fractions(&np));
            self.ln_activity_coefficients
                .set_block(offset, offset, &res.ln_activity_coefficients);
            self.ln_activities.set_block(offset, offset, &res.ln_activities);
            self.phases.push(res);
        }
        Ok(())
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Species amounts (mol).
    pub fn composition(&self) -> &DVector<f64> {
        &self.n
    }

    /// Mole fractions of each species within its phase.
    pub fn molar_fractions(&self) -> &ChemicalVector {
        &self.molar_fractions
    }

    pub fn ln_activity_coefficients(&self) -> &ChemicalVector {
        &self.ln_activity_coefficients
    }

    pub fn ln_activities(&self) -> &ChemicalVector {
        &self.ln_activities
    }

    pub fn activities(&self) -> ChemicalVector {
        self.ln_activities.exp()
    }

    fn rt(&self) -> ThermoScalar {
        ThermoScalar::temperature(self.temperature) * GAS_CONSTANT
    }

    /// `μ = G° + RT·ln a` (J/mol).
    pub fn chemical_potentials(&self) -> ChemicalVector {
        &self.ln_activities.scale_thermo(self.rt()) + &self.standard.gibbs_energies
    }

    pub fn standard_partial_molar_gibbs_energies(&self) -> &ThermoVector {
        &self.standard.gibbs_energies
    }

    pub fn standard_partial_molar_enthalpies(&self) -> &ThermoVector {
        &self.standard.enthalpies
    }

    pub fn standard_partial_molar_entropies(&self) -> &ThermoVector {
        &self.standard.entropies
    }

    pub fn standard_partial_molar_volumes(&self) -> &ThermoVector {
        &self.standard.volumes
    }

    pub fn standard_partial_molar_heat_capacities_cp(&self) -> &ThermoVector {
        &self.standard.heat_capacities_cp
    }

    pub fn standard_partial_molar_heat_capacities_cv(&self) -> &ThermoVector {
        &self.standard.heat_capacities_cv
    }

    pub fn standard_partial_molar_internal_energies(&self) -> &ThermoVector {
        &self.standard.internal_energies
    }

    pub fn standard_partial_molar_helmholtz_energies(&self) -> &ThermoVector {
        &self.standard.helmholtz_energies
    }

    /// Per-phase results of the activity models, phase-local derivatives.
    pub fn phase_chemical_results(&self) -> &[PhaseChemicalModelResult] {
        &self.phases
    }

    /// Build a per-phase vector from a phase-local scalar function.
    fn per_phase(&self, f: impl Fn(usize, &ChemicalVector, &ThermoVectors) -> ChemicalScalar) -> ChemicalVector {
        let ns = self.system.num_species();
        let np = self.system.num_phases();
        let mut out = ChemicalVector::new(
            DVector::zeros(np),
            DVector::zeros(np),
            DVector::zeros(np),
            DMatrix::zeros(np, ns),
        );
        for ip in 0..np {
            let offset = self.system.index_first_species_in_phase(ip);
            let len = self.system.num_species_in_phase(ip);
            let x = mole_fractions(&self.n.rows(offset, len).into_owned());
            let standard = ThermoVectors::slice(&self.standard, offset, len);
            let local = f(ip, &x, &standard);
            out.set_row(ip, &embed(ns, offset, &local));
        }
        out
    }

    /// `Σ xᵢG°ᵢ + Gᴿ` per phase (J/mol).
    pub fn phase_molar_gibbs_energies(&self) -> ChemicalVector {
        self.per_phase(|ip, x, s| &weighted(x, &s.gibbs) + &self.phases[ip].residual_molar_gibbs_energy)
    }

    pub fn phase_molar_enthalpies(&self) -> ChemicalVector {
        self.per_phase(|ip, x, s| &weighted(x, &s.enthalpy) + &self.phases[ip].residual_molar_enthalpy)
    }

    /// Model molar volume when it provides one, else `Σ xᵢV°ᵢ` (m³/mol).
    pub fn phase_molar_volumes(&self) -> ChemicalVector {
        self.per_phase(|ip, x, s| self.phase_molar_volume(ip, x, s))
    }

    fn phase_molar_volume(&self, ip: usize, x: &ChemicalVector, s: &ThermoVectors) -> ChemicalScalar {
        let v = &self.phases[ip].molar_volume;
        if v.val > 0.0 { v.clone() } else { weighted(x, &s.volume) }
    }

    /// `Σ xᵢS°ᵢ + Sᴿ` per phase with `Sᴿ = (Hᴿ − Gᴿ)/T` (J/(mol·K)).
    pub fn phase_molar_entropies(&self) -> ChemicalVector {
        let t = ThermoScalar::temperature(self.temperature);
        self.per_phase(|ip, x, s| {
            let phase = &self.phases[ip];
            let sres = &(&phase.residual_molar_enthalpy - &phase.residual_molar_gibbs_energy) / t;
            &weighted(x, &s.entropy) + &sres
        })
    }

    /// `H − PV` per phase.
    pub fn phase_molar_internal_energies(&self) -> ChemicalVector {
        let p = ThermoScalar::pressure(self.pressure);
        self.per_phase(|ip, x, s| {
            let h = &weighted(x, &s.enthalpy) + &self.phases[ip].residual_molar_enthalpy;
            &h - &(&self.phase_molar_volume(ip, x, s) * p)
        })
    }

    /// `G − PV` per phase.
    pub fn phase_molar_helmholtz_energies(&self) -> ChemicalVector {
        let p = ThermoScalar::pressure(self.pressure);
        self.per_phase(|ip, x, s| {
            let g = &weighted(x, &s.gibbs) + &self.phases[ip].residual_molar_gibbs_energy;
            &g - &(&self.phase_molar_volume(ip, x, s) * p)
        })
    }

    pub fn phase_molar_heat_capacities_cp(&self) -> ChemicalVector {
        self.per_phase(|ip, x, s| &weighted(x, &s.cp) + &self.phases[ip].residual_molar_heat_capacity_cp)
    }

    pub fn phase_molar_heat_capacities_cv(&self) -> ChemicalVector {
        self.per_phase(|ip, x, s| &weighted(x, &s.cv) + &self.phases[ip].residual_molar_heat_capacity_cv)
    }

    /// Total amount of each phase (mol).
    pub fn phase_amounts(&self) -> ChemicalVector {
        let ns = self.system.num_species();
        let mut out = ChemicalVector::zeros(self.system.num_phases(), ns);
        for ip in 0..self.system.num_phases() {
            let offset = self.system.index_first_species_in_phase(ip);
            let mut sum = ChemicalScalar::zero(ns);
            for j in offset..offset + self.system.num_species_in_phase(ip) {
                sum += &ChemicalScalar::amount(ns, j, self.n[j]);
            }
            out.set_row(ip, &sum);
        }
        out
    }

    /// Mass of each phase (kg).
    pub fn phase_masses(&self) -> ChemicalVector {
        let ns = self.system.num_species();
        let masses = self.system.molar_masses();
        let mut out = ChemicalVector::zeros(self.system.num_phases(), ns);
        for ip in 0..self.system.num_phases() {
            let offset = self.system.index_first_species_in_phase(ip);
            let mut sum = ChemicalScalar::zero(ns);
            for j in offset..offset + self.system.num_species_in_phase(ip) {
                sum += &(&ChemicalScalar::amount(ns, j, self.n[j]) * masses[j]);
            }
            out.set_row(ip, &sum);
        }
        out
    }

    /// Volume of each phase (m³).
    pub fn phase_volumes(&self) -> ChemicalVector {
        self.phase_molar_volumes().component_mul(&self.phase_amounts())
    }

    /// kg/m³
    pub fn phase_densities(&self) -> ChemicalVector {
        self.phase_masses().component_div(&self.phase_volumes())
    }

    fn specific(&self, molar: ChemicalVector) -> ChemicalVector {
        molar
            .component_mul(&self.phase_amounts())
            .component_div(&self.phase_masses())
    }

    /// J/kg
    pub fn phase_specific_gibbs_energies(&self) -> ChemicalVector {
        self.specific(self.phase_molar_gibbs_energies())
    }

    pub fn phase_specific_enthalpies(&self) -> ChemicalVector {
        self.specific(self.phase_molar_enthalpies())
    }

    /// m³/kg
    pub fn phase_specific_volumes(&self) -> ChemicalVector {
        self.specific(self.phase_molar_volumes())
    }

    pub fn phase_specific_entropies(&self) -> ChemicalVector {
        self.specific(self.phase_molar_entropies())
    }

    pub fn phase_specific_internal_energies(&self) -> ChemicalVector {
        self.specific(self.phase_molar_internal_energies())
    }

    pub fn phase_specific_helmholtz_energies(&self) -> ChemicalVector {
        self.specific(self.phase_molar_helmholtz_energies())
    }

    pub fn phase_specific_heat_capacities_cp(&self) -> ChemicalVector {
        self.specific(self.phase_molar_heat_capacities_cp())
    }

    pub fn phase_specific_heat_capacities_cv(&self) -> ChemicalVector {
        self.specific(self.phase_molar_heat_capacities_cv())
    }

    fn volume_of(&self, iphases: &[usize]) -> ChemicalScalar {
        let volumes = self.phase_volumes();
        let mut sum = ChemicalScalar::zero(self.system.num_species());
        for &ip in iphases {
            sum += &volumes.row(ip);
        }
        sum
    }

    /// Total volume (m³).
    pub fn volume(&self) -> ChemicalScalar {
        self.phase_volumes().sum()
    }

    pub fn fluid_volume(&self) -> ChemicalScalar {
        self.volume_of(&self.system.indices_fluid_phases())
    }

    pub fn solid_volume(&self) -> ChemicalScalar {
        self.volume_of(&self.system.indices_solid_phases())
    }

    /// Fluid volume over total volume.
    pub fn porosity(&self) -> ChemicalScalar {
        &self.fluid_volume() / &self.volume()
    }

    /// Aqueous properties; fails when the system has no aqueous phase.
    pub fn aqueous(&self) -> SystemResult<AqueousProperties<'_>> {
        AqueousProperties::new(self)
    }
}

/// Standard properties of one phase's species.
struct ThermoVectors {
    gibbs: ThermoVector,
    enthalpy: ThermoVector,
    entropy: ThermoVector,
    volume: ThermoVector,
    cp: ThermoVector,
    cv: ThermoVector,
}

impl ThermoVectors {
    fn slice(r: &PhaseThermoModelResult, offset: usize, len: usize) -> Self {
        Self {
            gibbs: r.gibbs_energies.rows(offset, len),
            enthalpy: r.enthalpies.rows(offset, len),
            entropy: r.entropies.rows(offset, len),
            volume: r.volumes.rows(offset, len),
            cp: r.heat_capacities_cp.rows(offset, len),
            cv: r.heat_capacities_cv.rows(offset, len),
        }
    }
}
