//! Solid phase activity models.

use crate::error::ThermoResult;
use crate::mixture::{PhaseChemicalModel, PhaseChemicalModelResult, mole_fractions};
use nalgebra::DVector;
use rk_core::ChemicalVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MineralActivityModel {
    /// Unit activity: each species forms its own pure phase.
    #[default]
    Pure,
    /// `ln a = ln x`
    IdealSolidSolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MineralChemicalModel {
    model: MineralActivityModel,
}

impl MineralChemicalModel {
    pub fn new(model: MineralActivityModel) -> Self {
        Self { model }
    }
}

impl PhaseChemicalModel for MineralChemicalModel {
    fn evaluate(&self, _t: f64, _p: f64, n: &DVector<f64>) -> ThermoResult<PhaseChemicalModelResult> {
        let ln_a = match self.model {
            MineralActivityModel::Pure => ChemicalVector::zeros(n.len(), n.len()),
            MineralActivityModel::IdealSolidSolution => mole_fractions(n).ln(),
        };
        Ok(PhaseChemicalModelResult::ideal(ln_a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_mineral_has_unit_activity() {
        let res = MineralChemicalModel::default()
            .evaluate(298.15, 1e5, &DVector::from_vec(vec![3.0]))
            .unwrap();
        assert_eq!(res.ln_activities.val[0], 0.0);
        assert!(res.ln_activities.ddn.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn solid_solution_activity_is_mole_fraction() {
        let res = MineralChemicalModel::new(MineralActivityModel::IdealSolidSolution)
            .evaluate(298.15, 1e5, &DVector::from_vec(vec![1.0, 3.0]))
            .unwrap();
        assert!((res.ln_activities.val[1] - 0.75f64.ln()).abs() < 1e-14);
    }
}
