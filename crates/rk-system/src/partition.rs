//! Partition of species into equilibrium, kinetic and inert groups.

use crate::error::{SystemError, SystemResult};
use crate::system::ChemicalSystem;
use nalgebra::DMatrix;
use std::str::FromStr;
use std::sync::Arc;

/// Which species are controlled by equilibrium, by kinetics, or held fixed.
///
/// Every species belongs to exactly one group; by default all are
/// equilibrium species.
#[derive(Debug, Clone)]
pub struct Partition {
    system: Arc<ChemicalSystem>,
    equilibrium: Vec<usize>,
    kinetic: Vec<usize>,
    inert: Vec<usize>,
}

/// Parsed `"kinetic = Calcite; inert = Quartz"` groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionGroups {
    pub kinetic: Vec<String>,
    pub inert: Vec<String>,
    pub equilibrium: Vec<String>,
}

impl FromStr for PartitionGroups {
    type Err = SystemError;

    fn from_str(s: &str) -> SystemResult<Self> {
        let mut groups = Self::default();
        for clause in s.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let (key, names) = clause.split_once('=').ok_or_else(|| SystemError::Parse {
                what: format!("partition clause '{clause}' has no '='"),
            })?;
            let names = names.split_whitespace().map(str::to_string);
            match key.trim().to_lowercase().as_str() {
                "kinetic" => groups.kinetic.extend(names),
                "inert" => groups.inert.extend(names),
                "equilibrium" => groups.equilibrium.extend(names),
                other => {
                    return Err(SystemError::Parse {
                        what: format!("unknown partition group '{other}'"),
                    });
                }
            }
        }
        Ok(groups)
    }
}

impl Partition {
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        let equilibrium = (0..system.num_species()).collect();
        Self {
            system,
            equilibrium,
            kinetic: Vec::new(),
            inert: Vec::new(),
        }
    }

    /// Partition from text; names may be species or phases.
    pub fn parse(system: Arc<ChemicalSystem>, text: &str) -> SystemResult<Self> {
        let groups: PartitionGroups = text.parse()?;
        let mut partition = Self::new(system);
        let kinetic = partition.resolve(&groups.kinetic)?;
        let inert = partition.resolve(&groups.inert)?;
        partition.set_kinetic_species(&kinetic)?;
        partition.set_inert_species(&inert)?;
        if !groups.equilibrium.is_empty() {
            let equilibrium = partition.resolve(&groups.equilibrium)?;
            let rest: Vec<usize> = (0..partition.system.num_species())
                .filter(|i| !equilibrium.contains(i) && !kinetic.contains(i))
                .collect();
            partition.set_inert_species(&rest)?;
        }
        Ok(partition)
    }

    /// Species indices for names of species, or of phases (all their species).
    fn resolve(&self, names: &[String]) -> SystemResult<Vec<usize>> {
        let mut out = Vec::new();
        for name in names {
            let i = self.system.index_species(name);
            if i < self.system.num_species() {
                out.push(i);
                continue;
            }
            let ip = self.system.index_phase_with_error(name).map_err(|_| {
                SystemError::not_found("species or phase", name.as_str())
            })?;
            out.extend(self.system.indices_species_in_phases(&[ip]));
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    fn regroup(&mut self, kinetic: Vec<usize>, inert: Vec<usize>) -> SystemResult<()> {
        let ns = self.system.num_species();
        if let Some(&bad) = kinetic.iter().chain(&inert).find(|&&i| i >= ns) {
            return Err(rk_core::CoreError::IndexOob {
                what: "partition species",
                index: bad,
                len: ns,
            }
            .into());
        }
        if let Some(&both) = kinetic.iter().find(|i| inert.contains(i)) {
            return Err(SystemError::InvalidArg {
                what: format!(
                    "species {} cannot be both kinetic and inert",
                    self.system.species_at(both).name()
                ),
            });
        }
        self.equilibrium = (0..ns)
            .filter(|i| !kinetic.contains(i) && !inert.contains(i))
            .collect();
        self.kinetic = kinetic;
        self.inert = inert;
        Ok(())
    }

    pub fn set_kinetic_species(&mut self, indices: &[usize]) -> SystemResult<()> {
        let mut kinetic = indices.to_vec();
        kinetic.sort_unstable();
        kinetic.dedup();
        let inert = self.inert.iter().copied().filter(|i| !kinetic.contains(i)).collect();
        self.regroup(kinetic, inert)
    }

    pub fn set_kinetic_phases(&mut self, iphases: &[usize]) -> SystemResult<()> {
        let species = self.system.indices_species_in_phases(iphases);
        self.set_kinetic_species(&species)
    }

    pub fn set_inert_species(&mut self, indices: &[usize]) -> SystemResult<()> {
        let mut inert = indices.to_vec();
        inert.sort_unstable();
        inert.dedup();
        let kinetic = self.kinetic.iter().copied().filter(|i| !inert.contains(i)).collect();
        self.regroup(kinetic, inert)
    }

    pub fn set_inert_phases(&mut self, iphases: &[usize]) -> SystemResult<()> {
        let species = self.system.indices_species_in_phases(iphases);
        self.set_inert_species(&species)
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn num_equilibrium_species(&self) -> usize {
        self.equilibrium.len()
    }

    pub fn num_kinetic_species(&self) -> usize {
        self.kinetic.len()
    }

    pub fn num_inert_species(&self) -> usize {
        self.inert.len()
    }

    pub fn indices_equilibrium_species(&self) -> &[usize] {
        &self.equilibrium
    }

    pub fn indices_kinetic_species(&self) -> &[usize] {
        &self.kinetic
    }

    pub fn indices_inert_species(&self) -> &[usize] {
        &self.inert
    }

    /// Equilibrium species in fluid phases.
    pub fn indices_equilibrium_fluid_species(&self) -> Vec<usize> {
        self.filter_by_phase(&self.equilibrium, true)
    }

    /// Equilibrium species in solid phases.
    pub fn indices_equilibrium_solid_species(&self) -> Vec<usize> {
        self.filter_by_phase(&self.equilibrium, false)
    }

    fn filter_by_phase(&self, indices: &[usize], fluid: bool) -> Vec<usize> {
        indices
            .iter()
            .copied()
            .filter(|&i| self.system.phase(self.system.index_phase_with_species(i)).is_fluid() == fluid)
            .collect()
    }

    /// Elements present in the equilibrium species.
    pub fn indices_equilibrium_elements(&self) -> Vec<usize> {
        self.system.indices_elements_in_species(&self.equilibrium)
    }

    pub fn indices_kinetic_elements(&self) -> Vec<usize> {
        self.system.indices_elements_in_species(&self.kinetic)
    }

    /// Phases that contain at least one equilibrium species.
    pub fn indices_equilibrium_phases(&self) -> Vec<usize> {
        self.system.indices_phases_with_species(&self.equilibrium)
    }

    fn submatrix(&self, rows: &[usize], cols: &[usize]) -> DMatrix<f64> {
        let a = self.system.formula_matrix();
        DMatrix::from_fn(rows.len(), cols.len(), |i, j| a[(rows[i], cols[j])])
    }

    /// Formula matrix restricted to equilibrium elements and species.
    pub fn formula_matrix_equilibrium_species(&self) -> DMatrix<f64> {
        self.submatrix(&self.indices_equilibrium_elements(), &self.equilibrium)
    }

    pub fn formula_matrix_kinetic_species(&self) -> DMatrix<f64> {
        self.submatrix(&self.indices_kinetic_elements(), &self.kinetic)
    }

    pub fn formula_matrix_inert_species(&self) -> DMatrix<f64> {
        let elements = self.system.indices_elements_in_species(&self.inert);
        self.submatrix(&elements, &self.inert)
    }
}
