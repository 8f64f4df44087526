//! The chemical system: elements, species and phases with a formula matrix.

use crate::error::{SystemError, SystemResult};
use crate::phase::Phase;
use nalgebra::{DMatrix, DVector};
use rk_thermo::{Element, PhaseThermoModelResult, Species};

/// Name of the charge pseudo-element.
pub const CHARGE_ELEMENT: &str = "Z";

/// Immutable description of a multiphase chemical system.
///
/// Species are numbered phase by phase. Lookups by name return the size of
/// the searched container when nothing matches; the `*_with_error` variants
/// return [`SystemError::NotFound`] instead.
#[derive(Debug, Clone)]
pub struct ChemicalSystem {
    elements: Vec<Element>,
    species: Vec<Species>,
    phases: Vec<Phase>,
    /// First species index of each phase, plus the total at the end.
    offsets: Vec<usize>,
    formula_matrix: DMatrix<f64>,
}

impl ChemicalSystem {
    pub(crate) fn from_parts(elements: Vec<Element>, phases: Vec<Phase>) -> Self {
        let species: Vec<Species> = phases.iter().flat_map(|p| p.species().iter().cloned()).collect();
        let mut offsets = Vec::with_capacity(phases.len() + 1);
        offsets.push(0);
        for p in &phases {
            offsets.push(offsets[offsets.len() - 1] + p.num_species());
        }
        let mut formula_matrix = DMatrix::zeros(elements.len(), species.len());
        for (i, e) in elements.iter().enumerate() {
            for (j, s) in species.iter().enumerate() {
                formula_matrix[(i, j)] = if e.name() == CHARGE_ELEMENT {
                    s.charge()
                } else {
                    s.element_coefficient(e.name())
                };
            }
        }
        Self {
            elements,
            species,
            phases,
            offsets,
            formula_matrix,
        }
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn num_species_in_phase(&self, iphase: usize) -> usize {
        self.offsets[iphase + 1] - self.offsets[iphase]
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn element(&self, i: usize) -> &Element {
        &self.elements[i]
    }

    pub fn species_at(&self, i: usize) -> &Species {
        &self.species[i]
    }

    pub fn phase(&self, i: usize) -> &Phase {
        &self.phases[i]
    }

    /// Elements × species coefficients; the charge row is last when present.
    pub fn formula_matrix(&self) -> &DMatrix<f64> {
        &self.formula_matrix
    }

    pub fn has_charge_element(&self) -> bool {
        self.elements.iter().any(|e| e.name() == CHARGE_ELEMENT)
    }

    /// Molar masses of all species (kg/mol).
    pub fn molar_masses(&self) -> DVector<f64> {
        DVector::from_iterator(self.species.len(), self.species.iter().map(Species::molar_mass))
    }

    pub fn index_first_species_in_phase(&self, iphase: usize) -> usize {
        self.offsets[iphase]
    }

    pub fn index_element(&self, name: &str) -> usize {
        self.elements
            .iter()
            .position(|e| e.name() == name)
            .unwrap_or(self.elements.len())
    }

    pub fn index_element_with_error(&self, name: &str) -> SystemResult<usize> {
        let i = self.index_element(name);
        if i < self.num_elements() {
            Ok(i)
        } else {
            Err(SystemError::not_found("element", name))
        }
    }

    pub fn index_species(&self, name: &str) -> usize {
        self.species
            .iter()
            .position(|s| s.name() == name)
            .unwrap_or(self.species.len())
    }

    pub fn index_species_with_error(&self, name: &str) -> SystemResult<usize> {
        let i = self.index_species(name);
        if i < self.num_species() {
            Ok(i)
        } else {
            Err(SystemError::not_found("species", name))
        }
    }

    /// Index of the first of `names` that exists.
    pub fn index_species_any(&self, names: &[&str]) -> usize {
        names
            .iter()
            .map(|n| self.index_species(n))
            .find(|&i| i < self.num_species())
            .unwrap_or(self.num_species())
    }

    pub fn index_species_any_with_error(&self, names: &[&str]) -> SystemResult<usize> {
        let i = self.index_species_any(names);
        if i < self.num_species() {
            Ok(i)
        } else {
            Err(SystemError::not_found("species", names.join(" | ")))
        }
    }

    pub fn index_phase(&self, name: &str) -> usize {
        self.phases
            .iter()
            .position(|p| p.name() == name)
            .unwrap_or(self.phases.len())
    }

    pub fn index_phase_with_error(&self, name: &str) -> SystemResult<usize> {
        let i = self.index_phase(name);
        if i < self.num_phases() {
            Ok(i)
        } else {
            Err(SystemError::not_found("phase", name))
        }
    }

    /// Phase containing species `ispecies`.
    pub fn index_phase_with_species(&self, ispecies: usize) -> usize {
        if ispecies >= self.num_species() {
            return self.num_phases();
        }
        self.offsets.partition_point(|&o| o <= ispecies) - 1
    }

    /// Index of the first phase with the given aggregate state.
    pub fn index_phase_with_state(&self, state: rk_thermo::AggregateState) -> usize {
        self.phases
            .iter()
            .position(|p| p.aggregate_state() == state)
            .unwrap_or(self.phases.len())
    }

    pub fn indices_elements(&self, names: &[&str]) -> SystemResult<Vec<usize>> {
        names.iter().map(|n| self.index_element_with_error(n)).collect()
    }

    pub fn indices_species(&self, names: &[&str]) -> SystemResult<Vec<usize>> {
        names.iter().map(|n| self.index_species_with_error(n)).collect()
    }

    pub fn indices_phases(&self, names: &[&str]) -> SystemResult<Vec<usize>> {
        names.iter().map(|n| self.index_phase_with_error(n)).collect()
    }

    pub fn indices_species_in_phases(&self, iphases: &[usize]) -> Vec<usize> {
        iphases
            .iter()
            .flat_map(|&ip| self.offsets[ip]..self.offsets[ip + 1])
            .collect()
    }

    /// Sorted phases containing any of `ispecies`.
    pub fn indices_phases_with_species(&self, ispecies: &[usize]) -> Vec<usize> {
        let mut out: Vec<usize> = ispecies.iter().map(|&i| self.index_phase_with_species(i)).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Elements with a nonzero coefficient in any of `ispecies`.
    pub fn indices_elements_in_species(&self, ispecies: &[usize]) -> Vec<usize> {
        (0..self.num_elements())
            .filter(|&e| ispecies.iter().any(|&j| self.formula_matrix[(e, j)] != 0.0))
            .collect()
    }

    pub fn indices_fluid_phases(&self) -> Vec<usize> {
        (0..self.num_phases()).filter(|&i| self.phases[i].is_fluid()).collect()
    }

    pub fn indices_solid_phases(&self) -> Vec<usize> {
        (0..self.num_phases()).filter(|&i| self.phases[i].is_solid()).collect()
    }

    /// `b = A·n`
    pub fn element_amounts(&self, n: &DVector<f64>) -> DVector<f64> {
        &self.formula_matrix * n
    }

    pub fn element_amounts_in_phase(&self, iphase: usize, n: &DVector<f64>) -> DVector<f64> {
        self.element_amounts_in_species(&self.indices_species_in_phases(&[iphase]), n)
    }

    pub fn element_amounts_in_species(&self, ispecies: &[usize], n: &DVector<f64>) -> DVector<f64> {
        let mut b = DVector::zeros(self.num_elements());
        for &j in ispecies {
            b += self.formula_matrix.column(j) * n[j];
        }
        b
    }

    pub fn element_amount(&self, ielement: usize, n: &DVector<f64>) -> f64 {
        self.formula_matrix.row(ielement).transpose().dot(n)
    }

    pub fn element_amount_in_phase(&self, ielement: usize, iphase: usize, n: &DVector<f64>) -> f64 {
        (self.offsets[iphase]..self.offsets[iphase + 1])
            .map(|j| self.formula_matrix[(ielement, j)] * n[j])
            .sum()
    }

    pub fn element_amount_in_species(&self, ielement: usize, ispecies: &[usize], n: &DVector<f64>) -> f64 {
        ispecies.iter().map(|&j| self.formula_matrix[(ielement, j)] * n[j]).sum()
    }

    /// Standard partial molar properties of all species.
    pub fn standard_properties(&self, t: f64, p: f64) -> SystemResult<PhaseThermoModelResult> {
        let mut res = PhaseThermoModelResult::zeros(self.num_species());
        for (i, phase) in self.phases.iter().enumerate() {
            let local = phase.thermo_model().evaluate(t, p)?;
            res.set_block(self.offsets[i], &local);
        }
        Ok(res)
    }
}
