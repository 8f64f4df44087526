//! Time evolution of a chemical state under kinetic reactions.

use crate::error::{KineticsError, KineticsResult};
use crate::options::KineticOptions;
use crate::problem::KineticProblem;
use crate::reactions::ReactionSystem;
use crate::solver::KineticSolver;
use rk_core::Quantity;
use rk_core::units::convert;
use rk_system::{ChemicalState, Partition};
use tracing::info;

/// A state on a kinetic path.
#[derive(Debug, Clone)]
pub struct KineticPathRecord {
    /// Time (s)
    pub t: f64,
    pub state: ChemicalState,
}

/// Recorded states of a kinetic path, in time order.
#[derive(Debug, Clone, Default)]
pub struct KineticPathResult {
    pub records: Vec<KineticPathRecord>,
    /// Accepted time steps
    pub steps: usize,
}

/// Integrates a state from `t0` to `t1`, recording it after every step.
#[derive(Debug, Clone)]
pub struct KineticPath {
    problem: KineticProblem,
    options: KineticOptions,
}

impl KineticPath {
    pub fn new(reactions: ReactionSystem) -> Self {
        Self::from_problem(KineticProblem::new(reactions))
    }

    pub fn from_problem(problem: KineticProblem) -> Self {
        Self {
            problem,
            options: KineticOptions::default(),
        }
    }

    pub fn set_options(&mut self, options: KineticOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn set_partition(&mut self, partition: Partition) -> &mut Self {
        self.problem.set_partition(partition);
        self
    }

    /// Set the partition from text such as `"kinetic = Calcite"`.
    pub fn set_partition_str(&mut self, text: &str) -> KineticsResult<&mut Self> {
        self.problem.set_partition_str(text)?;
        Ok(self)
    }

    pub fn problem(&self) -> &KineticProblem {
        &self.problem
    }

    pub fn options(&self) -> &KineticOptions {
        &self.options
    }

    /// Evolve `state` from `t0` to `t1`, both given in `units`
    /// (`"s"`, `"minute"`, `"hour"`, ...).
    pub fn solve(&self, state: &mut ChemicalState, t0: f64, t1: f64, units: &str) -> KineticsResult<KineticPathResult> {
        self.solve_with_output(state, t0, t1, units, |_| {})
    }

    /// Like [`solve`](Self::solve), calling `output` on every recorded state.
    pub fn solve_with_output<F>(
        &self,
        state: &mut ChemicalState,
        t0: f64,
        t1: f64,
        units: &str,
        mut output: F,
    ) -> KineticsResult<KineticPathResult>
    where
        F: FnMut(&KineticPathRecord),
    {
        let t0 = convert(t0, units, Quantity::Time)?;
        let t1 = convert(t1, units, Quantity::Time)?;
        if !(t1 >= t0) {
            return Err(KineticsError::InvalidArg {
                what: format!("kinetic path ends at {t1} s before it starts at {t0} s"),
            });
        }

        let mut solver = KineticSolver::new(self.problem.clone());
        solver.set_options(self.options.clone());
        solver.initialize(state, t0)?;

        let mut result = KineticPathResult::default();
        let mut record = |t: f64, state: &ChemicalState, result: &mut KineticPathResult| {
            let r = KineticPathRecord {
                t,
                state: state.clone(),
            };
            output(&r);
            result.records.push(r);
        };

        let mut t = t0;
        while t < t1 {
            record(t, &*state, &mut result);
            t = solver.step(state, t, t1)?;
        }
        record(t1, &*state, &mut result);
        result.steps = solver.num_steps();
        info!(t0, t1, steps = result.steps, "kinetic path finished");
        Ok(result)
    }
}
