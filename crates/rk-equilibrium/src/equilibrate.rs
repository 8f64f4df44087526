//! One-call equilibrium helpers.
//!
//! Unlike [`EquilibriumSolver::solve`], these fail with
//! [`EquilibriumError::NotConverged`] when the minimization does not converge,
//! so a returned state is always an equilibrium state.

use crate::error::{EqResult, EquilibriumError};
use crate::options::EquilibriumOptions;
use crate::problem::EquilibriumProblem;
use crate::result::EquilibriumResult;
use crate::solver::EquilibriumSolver;
use rk_system::{ChemicalState, Partition};
use std::sync::Arc;

/// Equilibrate all species of `state` at its own T, P and element amounts.
pub fn equilibrate(state: &mut ChemicalState) -> EqResult<EquilibriumResult> {
    equilibrate_with_options(state, &EquilibriumOptions::default())
}

pub fn equilibrate_with_options(state: &mut ChemicalState, options: &EquilibriumOptions) -> EqResult<EquilibriumResult> {
    let partition = Partition::new(Arc::clone(state.system()));
    equilibrate_with_partition(state, &partition, options)
}

/// Equilibrate only the equilibrium species of `partition`; kinetic and inert
/// species keep their amounts.
pub fn equilibrate_with_partition(
    state: &mut ChemicalState,
    partition: &Partition,
    options: &EquilibriumOptions,
) -> EqResult<EquilibriumResult> {
    let mut solver = EquilibriumSolver::with_partition(partition.clone());
    solver.set_options(options.clone());
    let result = solver.solve(state)?;
    converged(result)
}

/// Equilibrate `state` at the conditions and element amounts of `problem`.
pub fn equilibrate_state_with_problem(
    state: &mut ChemicalState,
    problem: &EquilibriumProblem,
    options: &EquilibriumOptions,
) -> EqResult<EquilibriumResult> {
    state.set_temperature(problem.temperature())?;
    state.set_pressure(problem.pressure())?;
    let mut solver = EquilibriumSolver::with_partition(problem.partition().clone());
    solver.set_options(options.clone());
    let result = solver.solve_with_elements(state, &problem.equilibrium_element_amounts())?;
    converged(result)
}

/// A new equilibrium state for `problem`.
pub fn equilibrate_problem(problem: &EquilibriumProblem) -> EqResult<ChemicalState> {
    equilibrate_problem_with_options(problem, &EquilibriumOptions::default())
}

pub fn equilibrate_problem_with_options(
    problem: &EquilibriumProblem,
    options: &EquilibriumOptions,
) -> EqResult<ChemicalState> {
    let mut state = ChemicalState::new(Arc::clone(problem.system()));
    equilibrate_state_with_problem(&mut state, problem, options)?;
    Ok(state)
}

fn converged(result: EquilibriumResult) -> EqResult<EquilibriumResult> {
    if result.succeeded() {
        Ok(result)
    } else {
        Err(EquilibriumError::NotConverged {
            iterations: result.iterations(),
            error: result.optimum.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_optim::OptimumOptions;
    use rk_system::{ChemicalSystem, SystemBuilder};
    use rk_thermo::AqueousActivityModel;

    fn system() -> Arc<ChemicalSystem> {
        Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(&["H2O(l)", "H+", "OH-"], AqueousActivityModel::Ideal)
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn problem_gives_an_equilibrium_state() {
        let mut problem = EquilibriumProblem::new(system());
        problem.add("H2O", 1.0, "kg").unwrap();
        problem.set_temperature_with_units(60.0, "celsius").unwrap();
        let state = equilibrate_problem(&problem).unwrap();
        assert!((state.temperature() - 333.15).abs() < 1e-9);
        let residual = (state.element_amounts() - problem.element_amounts()).amax();
        assert!(residual < 1e-8, "residual {residual}");
    }

    #[test]
    fn iteration_cap_is_an_error() {
        let mut state = ChemicalState::new(system());
        state.set_species_amount_by_name("H2O(l)", 1.0, "kg").unwrap();
        let options = EquilibriumOptions {
            optimum: OptimumOptions {
                max_iterations: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = equilibrate_with_options(&mut state, &options).unwrap_err();
        assert!(matches!(err, EquilibriumError::NotConverged { .. }));
    }
}
