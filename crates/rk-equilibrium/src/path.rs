//! Continuation of equilibrium states between two end states.

use crate::error::{EqResult, EquilibriumError};
use crate::options::EquilibriumPathOptions;
use crate::result::EquilibriumResult;
use crate::solver::EquilibriumSolver;
use nalgebra::DVector;
use rk_system::{ChemicalState, Partition};
use std::sync::Arc;
use tracing::{debug, warn};

/// One equilibrium state on a path.
#[derive(Debug, Clone)]
pub struct EquilibriumPathPoint {
    /// Path parameter in [0, 1]
    pub t: f64,
    pub state: ChemicalState,
}

/// Accepted points of a path, in order of increasing `t`.
#[derive(Debug, Clone, Default)]
pub struct EquilibriumPathResult {
    pub points: Vec<EquilibriumPathPoint>,
    /// Accumulated diagnostics of every accepted corrector solve
    pub equilibrium: EquilibriumResult,
    /// Number of rejected steps
    pub cutbacks: usize,
    /// Whether the path reached t = 1
    pub succeeded: bool,
}

/// Traces equilibrium while temperature, pressure and element amounts vary
/// linearly from an initial to a final state.
#[derive(Debug)]
pub struct EquilibriumPath {
    partition: Partition,
    options: EquilibriumPathOptions,
}

impl EquilibriumPath {
    pub fn new(partition: Partition) -> Self {
        Self {
            partition,
            options: EquilibriumPathOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EquilibriumPathOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EquilibriumPathOptions {
        &self.options
    }

    pub fn solve(&self, initial: &ChemicalState, last: &ChemicalState) -> EqResult<EquilibriumPathResult> {
        self.solve_with_output(initial, last, |_| {})
    }

    /// Like [`solve`](Self::solve), calling `output` on every accepted point.
    pub fn solve_with_output<F>(
        &self,
        initial: &ChemicalState,
        last: &ChemicalState,
        mut output: F,
    ) -> EqResult<EquilibriumPathResult>
    where
        F: FnMut(&EquilibriumPathPoint),
    {
        let system = Arc::clone(self.partition.system());
        for s in [initial, last] {
            if s.system().num_species() != system.num_species() {
                return Err(EquilibriumError::InvalidArg {
                    what: "path end state belongs to a different chemical system".to_string(),
                });
            }
        }
        let opts = &self.options;
        let mut solver = EquilibriumSolver::with_partition(self.partition.clone());
        solver.set_options(opts.equilibrium.clone());

        let (t0, t1) = (initial.temperature(), last.temperature());
        let (p0, p1) = (initial.pressure(), last.pressure());
        let b0 = solver.equilibrium_element_amounts(initial)?;
        let b1 = solver.equilibrium_element_amounts(last)?;
        let iee = self.partition.indices_equilibrium_elements();
        let ies = self.partition.indices_equilibrium_species().to_vec();

        let mut result = EquilibriumPathResult::default();
        let mut state = initial.clone();
        let first = solver.solve_with_elements(&mut state, &b0)?;
        if !first.succeeded() {
            warn!("equilibrium path could not equilibrate its initial state");
            result.equilibrium = first;
            return Ok(result);
        }
        result.equilibrium = first;
        let point = EquilibriumPathPoint {
            t: 0.0,
            state: state.clone(),
        };
        output(&point);
        result.points.push(point);

        let mut s = 0.0;
        let mut ds = opts.initial_step.min(opts.max_step);
        while s < 1.0 {
            let snew = (s + ds).min(1.0);
            let (tn, pn) = (lerp(t0, t1, snew), lerp(p0, p1, snew));
            let bn = &b0 + (&b1 - &b0) * snew;

            let mut trial = state.clone();
            trial.set_temperature(tn)?;
            trial.set_pressure(pn)?;
            if opts.predictor {
                self.predict(&solver, &mut trial, &state, &iee, &ies, &(&bn - (&b0 + (&b1 - &b0) * s)));
            }

            let accepted = match solver.solve_with_elements(&mut trial, &bn) {
                Ok(res) if res.succeeded() => {
                    result.equilibrium.merge(&res);
                    true
                }
                Ok(_) => false,
                Err(e) => {
                    debug!(error = %e, t = snew, "corrector failed");
                    false
                }
            };

            if accepted {
                state = trial;
                s = snew;
                let point = EquilibriumPathPoint {
                    t: s,
                    state: state.clone(),
                };
                output(&point);
                result.points.push(point);
                ds = (ds * opts.grow_factor).min(opts.max_step);
            } else {
                result.cutbacks += 1;
                ds *= opts.cutback_factor;
                debug!(t = s, step = ds, "equilibrium path step cut back");
                if ds < opts.min_step {
                    warn!(t = s, "equilibrium path stalled below the minimum step");
                    return Ok(result);
                }
                // the failed corrector replaced the solver's factorization
                let mut restart = state.clone();
                let b = solver.equilibrium_element_amounts(&restart)?;
                solver.solve_with_elements(&mut restart, &b)?;
            }
        }
        result.succeeded = true;
        Ok(result)
    }

    /// First-order update of the trial amounts from the sensitivities at the
    /// current point. Skipped when they are unavailable.
    fn predict(
        &self,
        solver: &EquilibriumSolver,
        trial: &mut ChemicalState,
        current: &ChemicalState,
        iee: &[usize],
        ies: &[usize],
        dbe: &DVector<f64>,
    ) {
        let Ok(sens) = solver.sensitivity() else {
            return;
        };
        let mut db = DVector::zeros(current.system().num_elements());
        for (k, &j) in iee.iter().enumerate() {
            db[j] = dbe[k];
        }
        let dn = sens.predict(
            trial.temperature() - current.temperature(),
            trial.pressure() - current.pressure(),
            &db,
        );
        let mut n = current.species_amounts().clone();
        for &i in ies {
            let predicted = n[i] + dn[i];
            // keep the prediction inside the positive orthant
            n[i] = if predicted.is_finite() && predicted > 0.0 {
                predicted
            } else {
                0.5 * n[i]
            };
        }
        if trial.set_species_amounts(n).is_err() {
            debug!("prediction discarded");
        }
    }
}

fn lerp(a: f64, b: f64, s: f64) -> f64 {
    a + (b - a) * s
}
