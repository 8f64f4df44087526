//! Gibbs energy minimization for the equilibrium species of a system.

use crate::error::{EqResult, EquilibriumError};
use crate::options::{EquilibriumHessian, EquilibriumOptions};
use crate::result::EquilibriumResult;
use crate::sensitivity::EquilibriumSensitivity;
use nalgebra::{DMatrix, DVector};
use rk_core::constants::{GAS_CONSTANT, REFERENCE_PRESSURE, WATER_MOLAR_MASS};
use rk_optim::{
    Hessian, ObjectiveResult, OptimError, OptimResult, OptimumMethod, OptimumOptions, OptimumProblem, OptimumSolver,
    OptimumState,
};
use rk_system::{ChemicalProperties, ChemicalState, ChemicalSystem, Partition};
use rk_thermo::AggregateState;
use std::sync::Arc;
use tracing::{debug, warn};

/// Iteration cap of the ideal cold-start solve.
const APPROXIMATE_MAX_ITERATIONS: usize = 200;

/// Where the last solve left off, for sensitivity queries.
#[derive(Debug, Clone)]
struct SolveContext {
    temperature: f64,
    pressure: f64,
    n: DVector<f64>,
    ies: Vec<usize>,
    iee: Vec<usize>,
}

/// How a species enters the ideal cold-start model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdealKind {
    Solvent,
    Solute,
    Gas,
    Pure,
    Mixture,
}

/// Finds the amounts of the equilibrium species that minimize the Gibbs
/// energy of the system subject to mass and charge balance.
#[derive(Debug)]
pub struct EquilibriumSolver {
    system: Arc<ChemicalSystem>,
    partition: Partition,
    options: EquilibriumOptions,
    optimum: OptimumSolver,
    last: Option<SolveContext>,
}

impl EquilibriumSolver {
    /// Solver treating every species as an equilibrium species.
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        Self::with_partition(Partition::new(system))
    }

    pub fn with_partition(partition: Partition) -> Self {
        let options = EquilibriumOptions::default();
        Self {
            system: Arc::clone(partition.system()),
            partition,
            optimum: OptimumSolver::new(options.method),
            options,
            last: None,
        }
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn options(&self) -> &EquilibriumOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: EquilibriumOptions) {
        self.optimum.set_method(options.method);
        self.options = options;
    }

    pub fn set_partition(&mut self, partition: Partition) -> EqResult<()> {
        if partition.system().num_species() != self.system.num_species() {
            return Err(EquilibriumError::InvalidArg {
                what: "partition belongs to a different chemical system".to_string(),
            });
        }
        self.partition = partition;
        self.last = None;
        Ok(())
    }

    /// Equilibrate `state` keeping the element amounts of its equilibrium species.
    pub fn solve(&mut self, state: &mut ChemicalState) -> EqResult<EquilibriumResult> {
        let be = self.equilibrium_element_amounts(state)?;
        self.solve_with_elements(state, &be)
    }

    /// Equilibrate `state` for the given amounts of the equilibrium elements,
    /// ordered as [`Partition::indices_equilibrium_elements`].
    pub fn solve_with_elements(&mut self, state: &mut ChemicalState, be: &DVector<f64>) -> EqResult<EquilibriumResult> {
        self.check_state(state)?;
        let ies = self.partition.indices_equilibrium_species().to_vec();
        let iee = self.partition.indices_equilibrium_elements();
        check_elements(be, iee.len())?;
        let (t, p) = (state.temperature(), state.pressure());
        let a = self.equilibrium_formula_matrix(&ies, &iee);

        let n = state.species_amounts();
        let x0 = DVector::from_iterator(ies.len(), ies.iter().map(|&i| n[i]));
        let warm = self.options.warm_start && x0.sum() > 0.0 && x0.iter().all(|v| v.is_finite() && *v >= 0.0);

        let mut result = EquilibriumResult {
            warm_started: warm,
            ..Default::default()
        };
        let mut ostate = if warm {
            let (y, z) = (state.element_duals(), state.species_duals());
            OptimumState {
                x: x0,
                y: DVector::from_iterator(iee.len(), iee.iter().map(|&i| y[i])),
                z: DVector::from_iterator(ies.len(), ies.iter().map(|&i| z[i])),
                f: ObjectiveResult::default(),
            }
        } else {
            let (guess, approx) = self.ideal_guess(t, p, &ies, &a, be)?;
            result.optimum.merge(&approx);
            guess
        };

        let objective = gibbs_objective(&self.system, t, p, n, &ies, self.options.hessian);
        let problem = OptimumProblem::new(objective, a, be.clone())?;
        self.optimum.set_method(self.options.method);
        let optimum = self.optimum.solve(&problem, &mut ostate, &self.options.optimum)?;
        result.optimum.merge(&optimum);
        drop(problem);

        if !result.succeeded() {
            warn!(
                iterations = result.iterations(),
                error = result.optimum.error,
                "equilibrium calculation did not converge"
            );
        } else {
            debug!(
                iterations = result.iterations(),
                warm_started = warm,
                "equilibrium converged"
            );
        }

        self.write_back(state, &ies, &iee, &ostate)?;
        self.last = Some(SolveContext {
            temperature: t,
            pressure: p,
            n: state.species_amounts().clone(),
            ies,
            iee,
        });
        Ok(result)
    }

    /// Replace the equilibrium amounts of `state` by the solution of an
    /// ideal-activity problem with the same element amounts.
    pub fn approximate(&mut self, state: &mut ChemicalState) -> EqResult<EquilibriumResult> {
        let be = self.equilibrium_element_amounts(state)?;
        self.approximate_with_elements(state, &be)
    }

    pub fn approximate_with_elements(
        &mut self,
        state: &mut ChemicalState,
        be: &DVector<f64>,
    ) -> EqResult<EquilibriumResult> {
        self.check_state(state)?;
        let ies = self.partition.indices_equilibrium_species().to_vec();
        let iee = self.partition.indices_equilibrium_elements();
        check_elements(be, iee.len())?;
        let a = self.equilibrium_formula_matrix(&ies, &iee);
        let (guess, optimum) = self.ideal_guess(state.temperature(), state.pressure(), &ies, &a, be)?;
        self.write_back(state, &ies, &iee, &guess)?;
        self.last = None;
        Ok(EquilibriumResult {
            optimum,
            warm_started: false,
        })
    }

    /// Sensitivities of the last equilibrium solution.
    pub fn sensitivity(&self) -> EqResult<EquilibriumSensitivity> {
        let ctx = self.last.as_ref().ok_or_else(|| EquilibriumError::Sensitivity {
            what: "no equilibrium has been computed".to_string(),
        })?;
        let (ns, ne) = (self.system.num_species(), self.system.num_elements());
        let props = ChemicalProperties::compute(Arc::clone(&self.system), ctx.temperature, ctx.pressure, &ctx.n)?;
        let mu = props.chemical_potentials();
        let t = ctx.temperature;
        let rt = GAS_CONSTANT * t;
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };

        // g = μ/RT, so ∂g/∂T = (∂μ/∂T)/RT − μ/(RT²)
        let dgdt = DVector::from_iterator(
            ctx.ies.len(),
            ctx.ies.iter().map(|&i| finite(mu.ddt[i] / rt - mu.val[i] / (rt * t))),
        );
        let dgdp = DVector::from_iterator(ctx.ies.len(), ctx.ies.iter().map(|&i| finite(mu.ddp[i] / rt)));
        let zero_g = DVector::zeros(ctx.ies.len());
        let zero_b = DVector::zeros(ctx.iee.len());

        let mut sens = EquilibriumSensitivity::zeros(ns, ne);
        let dndt = self.optimum.dxdp(&dgdt, &zero_b).map_err(sensitivity_error)?;
        let dndp = self.optimum.dxdp(&dgdp, &zero_b).map_err(sensitivity_error)?;
        for (k, &i) in ctx.ies.iter().enumerate() {
            sens.dndt[i] = dndt[k];
            sens.dndp[i] = dndp[k];
        }
        for (col, &j) in ctx.iee.iter().enumerate() {
            let mut dbdp = zero_b.clone();
            dbdp[col] = 1.0;
            let dndb = self.optimum.dxdp(&zero_g, &dbdp).map_err(sensitivity_error)?;
            for (k, &i) in ctx.ies.iter().enumerate() {
                sens.dndb[(i, j)] = dndb[k];
            }
        }
        Ok(sens)
    }

    /// `A_e·n_e`: amounts of the equilibrium elements held by equilibrium species.
    pub fn equilibrium_element_amounts(&self, state: &ChemicalState) -> EqResult<DVector<f64>> {
        self.check_state(state)?;
        let ies = self.partition.indices_equilibrium_species();
        let iee = self.partition.indices_equilibrium_elements();
        let n = state.species_amounts();
        let ne = DVector::from_iterator(ies.len(), ies.iter().map(|&i| n[i]));
        Ok(self.equilibrium_formula_matrix(ies, &iee) * ne)
    }

    fn equilibrium_formula_matrix(&self, ies: &[usize], iee: &[usize]) -> DMatrix<f64> {
        self.system.formula_matrix().select_rows(iee).select_columns(ies)
    }

    fn check_state(&self, state: &ChemicalState) -> EqResult<()> {
        let sys = state.system();
        if Arc::ptr_eq(sys, &self.system)
            || (sys.num_species() == self.system.num_species() && sys.num_elements() == self.system.num_elements())
        {
            Ok(())
        } else {
            Err(EquilibriumError::InvalidArg {
                what: "state belongs to a different chemical system".to_string(),
            })
        }
    }

    fn write_back(&self, state: &mut ChemicalState, ies: &[usize], iee: &[usize], ostate: &OptimumState) -> EqResult<()> {
        let mut n = state.species_amounts().clone();
        let mut y = state.element_duals().clone();
        let mut z = state.species_duals().clone();
        for (k, &i) in ies.iter().enumerate() {
            n[i] = ostate.x[k];
            z[i] = ostate.z.get(k).copied().unwrap_or(0.0);
        }
        for (k, &j) in iee.iter().enumerate() {
            y[j] = ostate.y.get(k).copied().unwrap_or(0.0);
        }
        state.set_species_amounts(n)?;
        state.set_element_duals(y)?;
        state.set_species_duals(z)?;
        Ok(())
    }

    /// Starting point from an ideal model with a diagonal Hessian. Falls back
    /// to a floored least-norm solution of `A·x = b` when that solve fails.
    fn ideal_guess(
        &self,
        t: f64,
        p: f64,
        ies: &[usize],
        a: &DMatrix<f64>,
        be: &DVector<f64>,
    ) -> EqResult<(OptimumState, rk_optim::OptimumResult)> {
        let floor = self.options.epsilon * be.amax().max(1.0);
        let x0 = match a.clone().svd(true, true).solve(be, 1.0e-12) {
            Ok(x) => x.map(|v| v.max(floor)),
            Err(e) => {
                debug!(error = e, "least-norm guess unavailable");
                DVector::from_element(ies.len(), floor)
            }
        };

        let standard = self.system.standard_properties(t, p)?;
        let rt = GAS_CONSTANT * t;
        let g0 = DVector::from_iterator(ies.len(), ies.iter().map(|&i| standard.gibbs_energies.val[i] / rt));
        let model = IdealModel::new(&self.system, ies, p);

        let problem = OptimumProblem::new(|x: &DVector<f64>| Ok(model.evaluate(&g0, x)), a.clone(), be.clone())?;
        let options = OptimumOptions {
            max_iterations: APPROXIMATE_MAX_ITERATIONS,
            ..self.options.optimum.clone()
        };
        let mut state = OptimumState::new(x0.clone());
        let mut solver = OptimumSolver::new(OptimumMethod::IpNewton);
        match solver.solve(&problem, &mut state, &options) {
            Ok(result) if result.succeeded => Ok((state, result)),
            Ok(result) => {
                debug!(iterations = result.iterations, "ideal approximation did not converge");
                Ok((OptimumState::new(x0), result))
            }
            Err(e) => {
                debug!(error = %e, "ideal approximation failed");
                Ok((OptimumState::new(x0), rk_optim::OptimumResult::default()))
            }
        }
    }
}

fn check_elements(be: &DVector<f64>, expected: usize) -> EqResult<()> {
    if be.len() != expected {
        return Err(EquilibriumError::InvalidArg {
            what: format!("expected {expected} equilibrium element amounts, got {}", be.len()),
        });
    }
    if be.iter().any(|v| !v.is_finite()) {
        return Err(EquilibriumError::InvalidArg {
            what: "element amounts must be finite".to_string(),
        });
    }
    Ok(())
}

fn sensitivity_error(e: OptimError) -> EquilibriumError {
    EquilibriumError::Sensitivity { what: e.to_string() }
}

/// Objective `Σ nᵢ·μᵢ/RT` over the equilibrium species, with the other
/// species held at their amounts in `n`.
fn gibbs_objective<'a>(
    system: &'a Arc<ChemicalSystem>,
    t: f64,
    p: f64,
    n: &DVector<f64>,
    ies: &'a [usize],
    mode: EquilibriumHessian,
) -> impl Fn(&DVector<f64>) -> OptimResult<ObjectiveResult> + 'a {
    let base = n.clone();
    let rt = GAS_CONSTANT * t;
    move |x: &DVector<f64>| {
        let mut n = base.clone();
        for (k, &i) in ies.iter().enumerate() {
            n[i] = x[k];
        }
        let props = ChemicalProperties::compute(Arc::clone(system), t, p, &n)
            .map_err(|e| OptimError::Objective { what: e.to_string() })?;
        let mu = props.chemical_potentials();
        let grad = DVector::from_iterator(ies.len(), ies.iter().map(|&i| mu.val[i] / rt));
        let val = x
            .iter()
            .zip(grad.iter())
            .filter(|(xi, _)| **xi > 0.0)
            .map(|(xi, gi)| xi * gi)
            .sum();
        let ddn = &props.ln_activities().ddn;
        let hessian = match mode {
            EquilibriumHessian::Exact => Hessian::Dense(ddn.select_rows(ies).select_columns(ies)),
            EquilibriumHessian::Diagonal => {
                Hessian::Diagonal(DVector::from_iterator(ies.len(), ies.iter().map(|&i| ddn[(i, i)])))
            }
        };
        Ok(ObjectiveResult { val, grad, hessian })
    }
}

/// Ideal activities: mole fractions in mixtures, molalities for solutes,
/// partial pressures for gases, unity for pure phases.
struct IdealModel {
    kinds: Vec<IdealKind>,
    /// Phase of each variable, renumbered densely.
    groups: Vec<usize>,
    ngroups: usize,
    /// Variable holding the solvent of each group, if any.
    solvent: Vec<Option<usize>>,
    ln_p: f64,
}

impl IdealModel {
    fn new(system: &ChemicalSystem, ies: &[usize], p: f64) -> Self {
        let mut phase_ids: Vec<usize> = Vec::new();
        let mut kinds = Vec::with_capacity(ies.len());
        let mut groups = Vec::with_capacity(ies.len());
        for &i in ies {
            let ip = system.index_phase_with_species(i);
            let group = match phase_ids.iter().position(|&q| q == ip) {
                Some(g) => g,
                None => {
                    phase_ids.push(ip);
                    phase_ids.len() - 1
                }
            };
            let phase = system.phase(ip);
            let kind = match phase.aggregate_state() {
                AggregateState::Aqueous if system.species_at(i).is_water() => IdealKind::Solvent,
                AggregateState::Aqueous => IdealKind::Solute,
                AggregateState::Gaseous => IdealKind::Gas,
                _ if phase.num_species() == 1 => IdealKind::Pure,
                _ => IdealKind::Mixture,
            };
            kinds.push(kind);
            groups.push(group);
        }
        let mut solvent = vec![None; phase_ids.len()];
        for (k, kind) in kinds.iter().enumerate() {
            if *kind == IdealKind::Solvent {
                solvent[groups[k]] = Some(k);
            }
        }
        Self {
            kinds,
            groups,
            ngroups: phase_ids.len(),
            solvent,
            ln_p: (p / REFERENCE_PRESSURE).ln(),
        }
    }

    fn evaluate(&self, g0: &DVector<f64>, x: &DVector<f64>) -> ObjectiveResult {
        let mut totals = vec![0.0; self.ngroups];
        for (k, &g) in self.groups.iter().enumerate() {
            totals[g] += x[k];
        }
        let mut grad = g0.clone();
        let mut diag = DVector::zeros(x.len());
        for k in 0..x.len() {
            let g = self.groups[k];
            let ln_a = match self.kinds[k] {
                IdealKind::Pure => 0.0,
                IdealKind::Solvent | IdealKind::Mixture => (x[k] / totals[g]).ln(),
                IdealKind::Gas => (x[k] / totals[g]).ln() + self.ln_p,
                IdealKind::Solute => {
                    let nw = self.solvent[g].map_or(totals[g], |w| x[w]);
                    (x[k] / (nw * WATER_MOLAR_MASS)).ln()
                }
            };
            grad[k] += ln_a;
            if self.kinds[k] != IdealKind::Pure {
                diag[k] = 1.0 / x[k];
            }
        }
        let val = x
            .iter()
            .zip(grad.iter())
            .filter(|(xi, _)| **xi > 0.0)
            .map(|(xi, gi)| xi * gi)
            .sum();
        ObjectiveResult {
            val,
            grad,
            hessian: Hessian::Diagonal(diag),
        }
    }
}
