//! Sequential kinetic-equilibrium time stepping.
//!
//! The integrated state is `u = [bₑ; nₖ]`: the element amounts of the
//! equilibrium partition followed by the amounts of the kinetic species.
//! Every rhs evaluation re-equilibrates the equilibrium species for `bₑ`,
//! evaluates the reaction rates `r` and returns
//! `du/dt = [Aₑ(Sᵀr)ₑ; (Sᵀr)ₖ]`. Inert species keep their amounts.

use crate::error::{KineticsError, KineticsResult};
use crate::model::TransientModel;
use crate::options::KineticOptions;
use crate::problem::KineticProblem;
use crate::reactions::ReactionSystem;
use crate::stepper::advance;
use nalgebra::{DMatrix, DVector};
use rk_equilibrium::{EquilibriumOptions, EquilibriumSolver};
use rk_system::ChemicalState;
use tracing::{debug, warn};

/// Integrates the kinetic reactions of a [`KineticProblem`].
#[derive(Debug)]
pub struct KineticSolver {
    problem: KineticProblem,
    options: KineticOptions,
    model: Option<KineticModel>,
    dt: f64,
    steps: usize,
}

impl KineticSolver {
    pub fn new(problem: KineticProblem) -> Self {
        let options = KineticOptions::default();
        Self {
            problem,
            dt: options.step.dt,
            options,
            model: None,
            steps: 0,
        }
    }

    pub fn set_options(&mut self, options: KineticOptions) {
        self.dt = options.step.dt;
        self.options = options;
        self.model = None;
    }

    pub fn options(&self) -> &KineticOptions {
        &self.options
    }

    pub fn problem(&self) -> &KineticProblem {
        &self.problem
    }

    /// Accepted steps since the last [`initialize`](Self::initialize).
    pub fn num_steps(&self) -> usize {
        self.steps
    }

    /// Prepare to integrate from `state` at time `t0` (s).
    ///
    /// Applies the problem's temperature and pressure, when set, and brings
    /// the equilibrium species into equilibrium with the current amounts.
    pub fn initialize(&mut self, state: &mut ChemicalState, t0: f64) -> KineticsResult<()> {
        let system = self.problem.system();
        if state.system().num_species() != system.num_species() {
            return Err(KineticsError::InvalidArg {
                what: "state belongs to a different chemical system".to_string(),
            });
        }
        if let Some(t) = self.problem.temperature() {
            state.set_temperature(t)?;
        }
        if let Some(p) = self.problem.pressure() {
            state.set_pressure(p)?;
        }
        let mut model = KineticModel::new(
            self.problem.reactions().clone(),
            &self.problem,
            &self.options,
            state.clone(),
        );
        let u = model.pack(state)?;
        model.store(state, &u, t0)?;
        debug!(
            t0,
            kinetic = model.iks.len(),
            reactions = model.reactions.num_reactions(),
            "kinetic solver initialized"
        );
        self.model = Some(model);
        self.dt = self.options.step.dt;
        self.steps = 0;
        Ok(())
    }

    /// Take one accepted step from `t` towards `t_end`, updating `state`.
    /// Returns the time reached.
    ///
    /// The integrated amounts are read back from `state`, so it may be
    /// modified between steps.
    pub fn step(&mut self, state: &mut ChemicalState, t: f64, t_end: f64) -> KineticsResult<f64> {
        let model = self.model.as_mut().ok_or_else(|| KineticsError::InvalidArg {
            what: "kinetic solver used before initialize".to_string(),
        })?;
        model.scratch.set_temperature(state.temperature())?;
        model.scratch.set_pressure(state.pressure())?;
        let u = model.pack(state)?;
        let outcome = advance(model, t, &u, t_end, self.dt, &self.options.step)?;
        model.store(state, &outcome.x, outcome.t)?;
        self.dt = outcome.dt_next;
        self.steps += 1;
        debug!(
            t = outcome.t,
            dt = outcome.t - t,
            retries = outcome.retries,
            "kinetic step accepted"
        );
        Ok(outcome.t)
    }

    /// Integrate from `t` over `dt` seconds. Returns `t + dt`.
    pub fn solve(&mut self, state: &mut ChemicalState, t: f64, dt: f64) -> KineticsResult<f64> {
        let t_end = t + dt;
        let mut t = t;
        while t < t_end {
            t = self.step(state, t, t_end)?;
        }
        Ok(t)
    }
}

/// `du/dt` of the integrated amounts.
#[derive(Debug)]
struct KineticModel {
    reactions: ReactionSystem,
    equilibrium: EquilibriumSolver,
    /// Working copy re-equilibrated at every rhs evaluation
    scratch: ChemicalState,
    ies: Vec<usize>,
    iks: Vec<usize>,
    /// Formula matrix of the equilibrium partition (elements × species)
    ae: DMatrix<f64>,
    abs_tol: f64,
    rel_tol: f64,
}

impl KineticModel {
    fn new(
        reactions: ReactionSystem,
        problem: &KineticProblem,
        options: &KineticOptions,
        scratch: ChemicalState,
    ) -> Self {
        let partition = problem.partition();
        let mut equilibrium = EquilibriumSolver::with_partition(partition.clone());
        equilibrium.set_options(options.equilibrium.clone());
        Self {
            reactions,
            equilibrium,
            scratch,
            ies: partition.indices_equilibrium_species().to_vec(),
            iks: partition.indices_kinetic_species().to_vec(),
            ae: partition.formula_matrix_equilibrium_species(),
            abs_tol: options.abs_tol,
            rel_tol: options.rel_tol,
        }
    }

    fn num_equilibrium_elements(&self) -> usize {
        self.ae.nrows()
    }

    /// `[bₑ; nₖ]` of a state.
    fn pack(&self, state: &ChemicalState) -> KineticsResult<DVector<f64>> {
        let be = self.equilibrium.equilibrium_element_amounts(state)?;
        let n = state.species_amounts();
        let nee = be.len();
        let mut u = DVector::zeros(nee + self.iks.len());
        u.rows_mut(0, nee).copy_from(&be);
        for (k, &i) in self.iks.iter().enumerate() {
            u[nee + k] = n[i];
        }
        Ok(u)
    }

    /// Load the kinetic amounts of `u` into `state` and re-equilibrate it.
    fn load(
        equilibrium: &mut EquilibriumSolver,
        iks: &[usize],
        state: &mut ChemicalState,
        u: &DVector<f64>,
        nee: usize,
    ) -> Result<(), String> {
        for (k, &i) in iks.iter().enumerate() {
            let v = u[nee + k];
            if !(v >= 0.0) {
                return Err(format!("negative kinetic amount {v:e}"));
            }
            state.set_species_amount(i, v).map_err(|e| e.to_string())?;
        }
        let be = u.rows(0, nee).into_owned();
        if be.iter().any(|v| !v.is_finite()) {
            return Err("element amounts are not finite".to_string());
        }
        match equilibrium.solve_with_elements(state, &be) {
            Ok(res) if res.succeeded() => Ok(()),
            Ok(res) => Err(format!(
                "equilibrium did not converge after {} iterations",
                res.iterations()
            )),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Write an accepted `u` into `state`, retrying once from a cold start.
    fn store(&mut self, state: &mut ChemicalState, u: &DVector<f64>, t: f64) -> KineticsResult<()> {
        let nee = self.num_equilibrium_elements();
        let Err(first) = Self::load(&mut self.equilibrium, &self.iks, state, u, nee) else {
            return Ok(());
        };
        debug!(t, error = %first, "re-equilibration failed, retrying from a cold start");
        let warm = self.equilibrium.options().clone();
        self.equilibrium.set_options(EquilibriumOptions {
            warm_start: false,
            ..warm.clone()
        });
        let retry = Self::load(&mut self.equilibrium, &self.iks, state, u, nee);
        self.equilibrium.set_options(warm);
        retry.map_err(|what| {
            warn!(t, %what, "re-equilibration failed");
            KineticsError::EquilibriumFailed { t, what }
        })
    }
}

impl TransientModel for KineticModel {
    type State = DVector<f64>;

    fn rhs(&mut self, _t: f64, u: &DVector<f64>) -> KineticsResult<DVector<f64>> {
        let nee = self.num_equilibrium_elements();
        Self::load(&mut self.equilibrium, &self.iks, &mut self.scratch, u, nee)
            .map_err(|message| KineticsError::Retryable { message })?;
        let props = self.scratch.properties()?;
        let rates = self.reactions.rates(&props)?;
        let dndt = self.reactions.species_rates(&rates.val);

        let dne = DVector::from_iterator(self.ies.len(), self.ies.iter().map(|&i| dndt[i]));
        let dbe = &self.ae * dne;
        let mut dudt = DVector::zeros(u.len());
        dudt.rows_mut(0, nee).copy_from(&dbe);
        for (k, &i) in self.iks.iter().enumerate() {
            dudt[nee + k] = dndt[i];
        }
        if dudt.iter().any(|v| !v.is_finite()) {
            return Err(KineticsError::Retryable {
                message: "reaction rates are not finite".to_string(),
            });
        }
        Ok(dudt)
    }

    fn add(&self, a: &DVector<f64>, b: &DVector<f64>) -> DVector<f64> {
        a + b
    }

    fn scale(&self, a: &DVector<f64>, scale: f64) -> DVector<f64> {
        a * scale
    }

    fn error_norm(&self, coarse: &DVector<f64>, fine: &DVector<f64>) -> f64 {
        coarse
            .iter()
            .zip(fine.iter())
            .map(|(c, f)| (c - f).abs() / (self.abs_tol + self.rel_tol * f.abs()))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mineral::MineralReaction;
    use rk_system::{ChemicalSystem, SystemBuilder};
    use rk_thermo::AqueousActivityModel;
    use std::sync::Arc;

    fn system() -> Arc<ChemicalSystem> {
        Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_with_elements(
                    &["H", "O", "C", "Ca"],
                    AqueousActivityModel::DebyeHuckel(Default::default()),
                )
                .unwrap()
                .add_mineral_phases_named(&["Calcite"])
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    fn problem(system: &Arc<ChemicalSystem>, ssa: f64) -> KineticProblem {
        let mut calcite = MineralReaction::new("Calcite");
        calcite
            .set_equation("Calcite = Ca++ + CO3--")
            .unwrap()
            .add_mechanism("logk = -5.81 mol/(m2*s); Ea = 23.5 kJ/mol")
            .unwrap()
            .set_specific_surface_area(ssa, "cm2/g")
            .unwrap();
        let reactions = ReactionSystem::from_minerals(Arc::clone(system), &[calcite]).unwrap();
        let mut problem = KineticProblem::new(reactions);
        problem.set_partition_str("kinetic = Calcite").unwrap();
        problem
    }

    fn state(system: &Arc<ChemicalSystem>) -> ChemicalState {
        let mut state = ChemicalState::new(Arc::clone(system));
        state.set_species_amount_by_name("H2O(l)", 1.0, "kg").unwrap();
        state.set_species_amount_by_name("Calcite", 10.0, "g").unwrap();
        state
    }

    #[test]
    fn step_requires_initialize() {
        let system = system();
        let mut solver = KineticSolver::new(problem(&system, 10.0));
        let mut state = state(&system);
        assert!(matches!(
            solver.step(&mut state, 0.0, 1.0),
            Err(KineticsError::InvalidArg { .. })
        ));
    }

    #[test]
    fn dissolution_conserves_elements() {
        let system = system();
        let mut solver = KineticSolver::new(problem(&system, 10.0));
        let mut state = state(&system);
        let b0 = state.element_amounts();
        let calcite0 = state.species_amount_by_name("Calcite", "mol").unwrap();

        solver.initialize(&mut state, 0.0).unwrap();
        let t = solver.solve(&mut state, 0.0, 60.0).unwrap();
        assert_eq!(t, 60.0);
        assert!(solver.num_steps() >= 1);

        let calcite = state.species_amount_by_name("Calcite", "mol").unwrap();
        assert!(calcite < calcite0, "calcite {calcite} vs {calcite0}");
        let residual = (state.element_amounts() - &b0).amax();
        assert!(residual <= 1e-6 * b0.amax(), "element drift {residual}");
    }
}
