//! Method dispatch, constraint regularization and sensitivities.

use crate::actnewton::ActNewtonSolver;
use crate::error::{OptimError, OptimResult};
use crate::ipactive::IpActiveSolver;
use crate::ipnewton::IpNewtonSolver;
use crate::ipopt::IpOptSolver;
use crate::karpov::KarpovSolver;
use crate::kkt::{KktMatrix, KktSolver};
use crate::options::{OptimumMethod, OptimumOptions};
use crate::problem::{ObjectiveResult, OptimumProblem};
use crate::regularizer::{Regularized, Regularizer};
use crate::result::OptimumResult;
use crate::state::OptimumState;
use nalgebra::DVector;
use std::time::Instant;
use tracing::debug;

/// Largest diagonal barrier term x⁻¹z used when a variable sits on its bound.
const MAX_BOUND_CURVATURE: f64 = 1.0e100;

/// One optimization algorithm.
pub trait OptimumStrategy: Send {
    fn solve(
        &mut self,
        problem: &OptimumProblem<'_>,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> OptimResult<OptimumResult>;
}

fn strategy(method: OptimumMethod) -> Box<dyn OptimumStrategy> {
    match method {
        OptimumMethod::IpNewton => Box::new(IpNewtonSolver),
        OptimumMethod::IpOpt => Box::new(IpOptSolver),
        OptimumMethod::IpActive => Box::new(IpActiveSolver),
        OptimumMethod::ActNewton => Box::new(ActNewtonSolver),
        OptimumMethod::Karpov => Box::new(KarpovSolver),
    }
}

/// Runs a chosen method on a regularized copy of the problem and keeps the
/// KKT factorization at the optimum for sensitivity queries.
pub struct OptimumSolver {
    method: OptimumMethod,
    strategy: Box<dyn OptimumStrategy>,
    regularized: Option<Regularized>,
    sensitivity: Option<KktSolver>,
}

impl Default for OptimumSolver {
    fn default() -> Self {
        Self::new(OptimumMethod::default())
    }
}

impl std::fmt::Debug for OptimumSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimumSolver")
            .field("method", &self.method)
            .field("has_sensitivity", &self.sensitivity.is_some())
            .finish()
    }
}

impl OptimumSolver {
    pub fn new(method: OptimumMethod) -> Self {
        Self {
            method,
            strategy: strategy(method),
            regularized: None,
            sensitivity: None,
        }
    }

    pub fn method(&self) -> OptimumMethod {
        self.method
    }

    pub fn set_method(&mut self, method: OptimumMethod) {
        if method != self.method {
            self.method = method;
            self.strategy = strategy(method);
        }
    }

    /// Minimizes the problem starting from `state`, which receives the
    /// solution. Non-convergence is reported through the result, not as an error.
    pub fn solve(
        &mut self,
        problem: &OptimumProblem<'_>,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> OptimResult<OptimumResult> {
        let start = Instant::now();
        let n = problem.num_variables();
        let m = problem.num_constraints();
        state.resize(n, m);
        self.sensitivity = None;

        let l = problem.lower_bounds();
        let reg = Regularizer::new(options.regularization.clone()).regularize(problem.a(), problem.b(), l)?;

        let l_reg = reg.select(l);
        let reduced = OptimumProblem::new(
            |x: &DVector<f64>| {
                let full = reg.expand(x, l);
                problem.objective(&full).map(|f| reg.restrict_objective(f))
            },
            reg.a.clone(),
            reg.b.clone(),
        )?
        .with_lower_bounds(l_reg.clone())?;

        let mut reduced_state = OptimumState {
            x: reg.select(&state.x),
            y: reg.restrict_y(&state.y),
            z: reg.select(&state.z),
            f: ObjectiveResult::default(),
        };

        let mut result = self.strategy.solve(&reduced, &mut reduced_state, options)?;

        state.x = reg.expand(&reduced_state.x, l);
        state.y = reg.recover_y(&reduced_state.y);
        state.z = reg.expand(&reduced_state.z, &DVector::zeros(n));
        let evaluated = reduced_state.f.grad.len() == reduced_state.x.len();
        state.f = if evaluated {
            reg.expand_objective(&reduced_state.f)
        } else {
            ObjectiveResult::default()
        };

        if evaluated {
            let xl = &reduced_state.x - &l_reg;
            let (xs, zs) = bounded_barrier(&xl, &reduced_state.z);
            let mut kkt = KktSolver::new(options.kkt.clone());
            let lhs = KktMatrix {
                hessian: &reduced_state.f.hessian,
                a: &reg.a,
                x: &xs,
                z: &zs,
                gamma: options.regularization.gamma,
                delta: options.regularization.delta,
            };
            match kkt.decompose(&lhs) {
                Ok(()) => self.sensitivity = Some(kkt),
                Err(e) => debug!(error = %e, "sensitivity factorization unavailable"),
            }
        }
        drop(reduced);
        self.regularized = Some(reg);

        result.time = start.elapsed();
        Ok(result)
    }

    /// Derivative of the optimal x with respect to a parameter p, given
    /// ∂g/∂p and ∂b/∂p at the last solution.
    pub fn dxdp(&self, dgdp: &DVector<f64>, dbdp: &DVector<f64>) -> OptimResult<DVector<f64>> {
        let (Some(reg), Some(kkt)) = (&self.regularized, &self.sensitivity) else {
            return Err(OptimError::InvalidState {
                what: "sensitivities requested before a successful solve".to_string(),
            });
        };
        if dgdp.len() != reg.num_variables() || dbdp.len() != reg.num_constraints() {
            return Err(OptimError::InvalidState {
                what: format!(
                    "sensitivity right-hand side sized ({}, {}), expected ({}, {})",
                    dgdp.len(),
                    dbdp.len(),
                    reg.num_variables(),
                    reg.num_constraints()
                ),
            });
        }
        let (dx, _) = kkt.solve(&-reg.select(dgdp), &reg.restrict_b(dbdp))?;
        Ok(reg.expand(&dx, &DVector::zeros(reg.num_variables())))
    }
}

/// Distances and duals whose ratio z/x stays finite for variables on their bounds.
fn bounded_barrier(xl: &DVector<f64>, z: &DVector<f64>) -> (DVector<f64>, DVector<f64>) {
    let mut xs = xl.clone();
    let mut zs = z.map(|v| v.max(0.0));
    for i in 0..xs.len() {
        if xs[i] <= 0.0 {
            xs[i] = 1.0;
            zs[i] = if zs[i] > 0.0 { MAX_BOUND_CURVATURE } else { 0.0 };
        } else if zs[i] / xs[i] > MAX_BOUND_CURVATURE {
            zs[i] = MAX_BOUND_CURVATURE * xs[i];
        }
    }
    (xs, zs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Hessian;
    use nalgebra::DMatrix;

    fn ideal_objective(c: DVector<f64>) -> impl Fn(&DVector<f64>) -> OptimResult<ObjectiveResult> {
        move |x: &DVector<f64>| {
            Ok(ObjectiveResult {
                val: x
                    .iter()
                    .zip(c.iter())
                    .filter(|(xi, _)| **xi > 0.0)
                    .map(|(xi, ci)| xi * (ci + xi.ln() - 1.0))
                    .sum(),
                grad: DVector::from_iterator(x.len(), x.iter().zip(c.iter()).map(|(xi, ci)| ci + xi.ln())),
                hessian: Hessian::Diagonal(x.map(|v| 1.0 / v)),
            })
        }
    }

    #[test]
    fn all_methods_agree_on_ideal_mixing() {
        let c = DVector::from_vec(vec![0.0f64, 1.0, 2.0]);
        let w = c.map(|ci| (-ci).exp());
        let expected = &w / w.sum();
        for method in [
            OptimumMethod::IpNewton,
            OptimumMethod::IpOpt,
            OptimumMethod::IpActive,
            OptimumMethod::Karpov,
        ] {
            let a = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]);
            let b = DVector::from_vec(vec![1.0]);
            let problem = OptimumProblem::new(ideal_objective(c.clone()), a, b).unwrap();
            let mut state = OptimumState::default();
            let mut solver = OptimumSolver::new(method);
            let res = solver.solve(&problem, &mut state, &OptimumOptions::default()).unwrap();
            assert!(res.succeeded, "{method:?}: {res:?}");
            assert!((&state.x - &expected).amax() < 1e-6, "{method:?}: {}", state.x);
            assert!((state.y[0] - (-w.sum().ln())).abs() < 1e-5, "{method:?}: {}", state.y);
        }
    }

    #[test]
    fn trivial_and_dependent_constraints_are_handled() {
        // Row 2 repeats row 1; row 3 forces x3 = 0.
        let c = DVector::from_vec(vec![0.0, 1.0, 2.0]);
        let a = DMatrix::from_row_slice(3, 3, &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 0.0, 0.0, 1.0]);
        let b = DVector::from_vec(vec![1.0, 2.0, 0.0]);
        let problem = OptimumProblem::new(ideal_objective(c), a, b).unwrap();
        let mut state = OptimumState::default();
        let mut solver = OptimumSolver::default();
        let res = solver.solve(&problem, &mut state, &OptimumOptions::default()).unwrap();
        assert!(res.succeeded, "{res:?}");
        assert_eq!(state.x[2], 0.0);
        let e = (-1.0_f64).exp();
        assert!((state.x[0] - 1.0 / (1.0 + e)).abs() < 1e-6);
        assert!((state.x[1] - e / (1.0 + e)).abs() < 1e-6);
        assert_eq!(state.y.len(), 3);
        assert_eq!(state.f.grad.len(), 3);
    }

    #[test]
    fn sensitivity_matches_finite_difference() {
        let c = DVector::from_vec(vec![0.0, 1.0, 2.0]);
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 1.0, 1.0, 0.0, -1.0]);
        let solve = |b: DVector<f64>| {
            let problem = OptimumProblem::new(ideal_objective(c.clone()), a.clone(), b).unwrap();
            let mut state = OptimumState::default();
            let mut solver = OptimumSolver::default();
            let options = OptimumOptions {
                tolerance: 1e-12,
                ..Default::default()
            };
            let res = solver.solve(&problem, &mut state, &options).unwrap();
            assert!(res.succeeded);
            (solver, state.x)
        };
        let b = DVector::from_vec(vec![1.0, 0.2]);
        let (solver, x) = solve(b.clone());

        let h = 1e-6;
        let mut bp = b.clone();
        bp[1] += h;
        let (_, xp) = solve(bp);
        let fd = (xp - &x) / h;

        let dbdp = DVector::from_vec(vec![0.0, 1.0]);
        let dxdp = solver.dxdp(&DVector::zeros(3), &dbdp).unwrap();
        assert!((dxdp - fd).amax() < 1e-4);
    }

    #[test]
    fn dxdp_requires_solve() {
        let solver = OptimumSolver::new(OptimumMethod::Karpov);
        assert_eq!(solver.method(), OptimumMethod::Karpov);
        assert!(solver.dxdp(&DVector::zeros(1), &DVector::zeros(1)).is_err());
    }
}
