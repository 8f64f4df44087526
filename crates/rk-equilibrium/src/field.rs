//! Batch equilibrium over many independent states.

use crate::error::EqResult;
use crate::options::EquilibriumOptions;
use crate::result::EquilibriumResult;
use crate::sensitivity::EquilibriumSensitivity;
use crate::solver::EquilibriumSolver;
use rayon::prelude::*;
use rk_core::ChemicalScalar;
use rk_system::{ChemicalField, ChemicalProperties, ChemicalState, Partition, SystemResult};

/// Equilibrate every state in parallel, one solver per worker.
pub fn equilibrate_all(
    states: &mut [ChemicalState],
    partition: &Partition,
    options: &EquilibriumOptions,
) -> EqResult<Vec<EquilibriumResult>> {
    let results = states
        .par_iter_mut()
        .map_init(
            || {
                let mut solver = EquilibriumSolver::with_partition(partition.clone());
                solver.set_options(options.clone());
                solver
            },
            |solver, state| solver.solve(state),
        )
        .collect::<EqResult<Vec<_>>>()?;
    tracing::debug!(points = results.len(), "batch equilibrium finished");
    Ok(results)
}

/// Equilibrate every state and sample `f` at the results, chaining the
/// property's amount derivatives through the equilibrium sensitivities so
/// the field carries total derivatives with respect to T, P and b.
pub fn equilibrium_field<F>(
    states: &mut [ChemicalState],
    partition: &Partition,
    options: &EquilibriumOptions,
    f: F,
) -> EqResult<ChemicalField>
where
    F: Fn(&ChemicalProperties) -> SystemResult<ChemicalScalar> + Sync,
{
    let samples = states
        .par_iter_mut()
        .map(|state| -> EqResult<(ChemicalScalar, EquilibriumSensitivity)> {
            let mut solver = EquilibriumSolver::with_partition(partition.clone());
            solver.set_options(options.clone());
            solver.solve(state)?;
            let sens = solver.sensitivity()?;
            let scalar = f(&state.properties()?)?;
            Ok((scalar, sens))
        })
        .collect::<EqResult<Vec<_>>>()?;
    let nelements = partition.system().num_elements();
    let mut field = ChemicalField::new(samples.len(), nelements);
    for (i, (scalar, sens)) in samples.iter().enumerate() {
        field.set(i, scalar, &sens.dndt, &sens.dndp, &sens.dndb);
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_system::{ChemicalSystem, SystemBuilder};
    use rk_thermo::AqueousActivityModel;
    use std::sync::Arc;

    fn states(system: &Arc<ChemicalSystem>, count: usize) -> Vec<ChemicalState> {
        (0..count)
            .map(|k| {
                let mut s = ChemicalState::new(Arc::clone(system));
                s.set_temperature(298.15 + 10.0 * k as f64).unwrap();
                s.set_species_amount_by_name("H2O(l)", 1.0, "kg").unwrap();
                s
            })
            .collect()
    }

    #[test]
    fn parallel_batch_matches_serial() {
        let system = Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(&["H2O(l)", "H+", "OH-"], AqueousActivityModel::Ideal)
                .unwrap()
                .build()
                .unwrap(),
        );
        let partition = Partition::new(Arc::clone(&system));
        let options = EquilibriumOptions::default();
        let mut batch = states(&system, 6);
        let results = equilibrate_all(&mut batch, &partition, &options).unwrap();
        assert!(results.iter().all(|r| r.succeeded()));

        let mut serial = states(&system, 6);
        let mut solver = EquilibriumSolver::with_partition(partition.clone());
        for (a, b) in serial.iter_mut().zip(batch.iter()) {
            solver.solve(a).unwrap();
            assert!((a.species_amounts() - b.species_amounts()).amax() < 1e-12);
        }
    }

    #[test]
    fn field_carries_total_temperature_derivative() {
        let system = Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(&["H2O(l)", "H+", "OH-"], AqueousActivityModel::Ideal)
                .unwrap()
                .build()
                .unwrap(),
        );
        let partition = Partition::new(Arc::clone(&system));
        let options = EquilibriumOptions::default();
        let ph = |p: &ChemicalProperties| p.aqueous()?.ph();

        let mut batch = states(&system, 3);
        let field = equilibrium_field(&mut batch, &partition, &options, ph).unwrap();
        assert_eq!(field.len(), 3);

        let h = 0.05;
        let mut shifted = states(&system, 3);
        for s in shifted.iter_mut() {
            let t = s.temperature();
            s.set_temperature(t + h).unwrap();
        }
        let plus = equilibrium_field(&mut shifted, &partition, &options, ph).unwrap();
        for i in 0..3 {
            let fd = (plus.val()[i] - field.val()[i]) / h;
            let analytic = field.ddt()[i];
            assert!((analytic - fd).abs() < 0.02 * fd.abs().max(1e-3), "point {i}: {analytic} vs {fd}");
        }
    }
}
