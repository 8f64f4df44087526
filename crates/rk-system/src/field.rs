//! A scalar property sampled over many independent chemical states.

use crate::error::SystemResult;
use crate::properties::ChemicalProperties;
use crate::state::ChemicalState;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use rk_core::ChemicalScalar;

/// Values of one property at many points, with derivatives with respect to
/// temperature, pressure and the element amounts of each point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalField {
    val: DVector<f64>,
    ddt: DVector<f64>,
    ddp: DVector<f64>,
    /// One vector over points per element.
    ddb: Vec<DVector<f64>>,
}

impl ChemicalField {
    pub fn new(npoints: usize, nelements: usize) -> Self {
        Self {
            val: DVector::zeros(npoints),
            ddt: DVector::zeros(npoints),
            ddp: DVector::zeros(npoints),
            ddb: vec![DVector::zeros(npoints); nelements],
        }
    }

    pub fn len(&self) -> usize {
        self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.val.is_empty()
    }

    pub fn val(&self) -> &DVector<f64> {
        &self.val
    }

    pub fn ddt(&self) -> &DVector<f64> {
        &self.ddt
    }

    pub fn ddp(&self) -> &DVector<f64> {
        &self.ddp
    }

    pub fn ddb(&self, ielement: usize) -> &DVector<f64> {
        &self.ddb[ielement]
    }

    /// Store point `i`, chaining the property's amount derivatives through
    /// the equilibrium sensitivities `∂n/∂T`, `∂n/∂P` and `∂n/∂b`.
    pub fn set(
        &mut self,
        i: usize,
        scalar: &ChemicalScalar,
        dndt: &DVector<f64>,
        dndp: &DVector<f64>,
        dndb: &DMatrix<f64>,
    ) {
        self.val[i] = scalar.val;
        self.ddt[i] = scalar.ddt + scalar.ddn.dot(dndt);
        self.ddp[i] = scalar.ddp + scalar.ddn.dot(dndp);
        for (j, col) in self.ddb.iter_mut().enumerate() {
            col[i] = scalar.ddn.dot(&dndb.column(j));
        }
    }

    /// Evaluate `f` at every state in parallel. Amount derivatives are not
    /// chained (no sensitivities), so only T and P derivatives are kept.
    pub fn evaluate<F>(states: &[ChemicalState], f: F) -> SystemResult<Self>
    where
        F: Fn(&ChemicalProperties) -> SystemResult<ChemicalScalar> + Sync,
    {
        let values = states
            .par_iter()
            .map(|s| s.properties().and_then(|props| f(&props)))
            .collect::<SystemResult<Vec<_>>>()?;
        let nelements = states.first().map_or(0, |s| s.system().num_elements());
        let mut field = Self::new(values.len(), nelements);
        for (i, v) in values.iter().enumerate() {
            field.val[i] = v.val;
            field.ddt[i] = v.ddt;
            field.ddp[i] = v.ddp;
        }
        tracing::debug!(points = field.len(), "chemical field evaluated");
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SystemBuilder;
    use rk_thermo::AqueousActivityModel;
    use std::sync::Arc;

    #[test]
    fn set_chains_sensitivities() {
        let mut field = ChemicalField::new(2, 2);
        let s = ChemicalScalar::new(1.0, 0.5, 0.25, DVector::from_vec(vec![1.0, 2.0]));
        let dndt = DVector::from_vec(vec![1.0, 1.0]);
        let dndp = DVector::zeros(2);
        let dndb = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 3.0]);
        field.set(1, &s, &dndt, &dndp, &dndb);
        assert_eq!(field.val()[1], 1.0);
        assert_eq!(field.ddt()[1], 3.5);
        assert_eq!(field.ddp()[1], 0.25);
        assert_eq!(field.ddb(0)[1], 1.0);
        assert_eq!(field.ddb(1)[1], 6.0);
    }

    #[test]
    fn parallel_evaluation_matches_serial() {
        let system = Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(&["H2O(l)", "H+", "OH-"], AqueousActivityModel::Ideal)
                .unwrap()
                .build()
                .unwrap(),
        );
        let states: Vec<ChemicalState> = (0..8)
            .map(|k| {
                let mut s = ChemicalState::new(Arc::clone(&system));
                s.set_species_amounts(DVector::from_vec(vec![55.5, 1e-7 * (k + 1) as f64, 1e-7]))
                    .unwrap();
                s
            })
            .collect();
        let field = ChemicalField::evaluate(&states, |p| Ok(p.aqueous()?.ph()?)).unwrap();
        assert_eq!(field.len(), 8);
        for (i, s) in states.iter().enumerate() {
            let ph = s.properties().unwrap().aqueous().unwrap().ph().unwrap().val;
            assert_eq!(field.val()[i], ph);
        }
        assert!(field.val()[0] > field.val()[7]);
    }
}
