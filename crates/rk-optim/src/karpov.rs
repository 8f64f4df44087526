//! Karpov's feasible-path method for convex minimization.
//!
//! Each iteration first restores feasibility (A·x = b) with a
//! minimum-norm correction in the metric diag(x − l), then descends along
//! dx = −diag(x − l)·(g − Aᵀy), with y the weighted least-squares duals, or
//! along the Newton direction of the full KKT system. The step length comes
//! from an Armijo test with a Brent minimization fallback.

use crate::error::OptimResult;
use crate::kkt::{KktMatrix, KktSolver};
use crate::options::OptimumOptions;
use crate::problem::OptimumProblem;
use crate::result::OptimumResult;
use crate::solver::OptimumStrategy;
use crate::state::OptimumState;
use crate::utils::{fraction_to_the_boundary, largest_step, minimize_brent, norm_inf};
use nalgebra::{DMatrix, DVector};
use std::time::Instant;
use tracing::{debug, warn};

const BRENT_TOLERANCE: f64 = 1.0e-8;
const BRENT_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Default)]
pub struct KarpovSolver;

/// Solves (A·W·Aᵀ)·t = r with W = diag(w).
fn weighted_normal_solve(a: &DMatrix<f64>, w: &DVector<f64>, r: &DVector<f64>) -> Option<DVector<f64>> {
    let aw = a * DMatrix::from_diagonal(w);
    let gram = &aw * a.transpose();
    gram.lu().solve(r)
}

impl OptimumStrategy for KarpovSolver {
    fn solve(
        &mut self,
        problem: &OptimumProblem<'_>,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> OptimResult<OptimumResult> {
        let start = Instant::now();
        let params = &options.karpov;
        let n = problem.num_variables();
        let m = problem.num_constraints();
        let a = problem.a();
        let b = problem.b();
        let l = problem.lower_bounds();
        state.resize(n, m);
        for i in 0..n {
            if !(state.x[i] - l[i] > 0.0) {
                state.x[i] = l[i] + params.active_to_inactive;
            }
        }

        let mut kkt = KktSolver::new(options.kkt.clone());
        let mut result = OptimumResult::default();
        let feasibility_tol = params.feasibility_tolerance * norm_inf(b).max(1.0);

        for iter in 0..=options.max_iterations {
            result.iterations = iter;
            let xl = &state.x - l;

            let rb = a * &state.x - b;
            if norm_inf(&rb) > feasibility_tol {
                let Some(t) = weighted_normal_solve(a, &xl, &(-&rb)) else {
                    warn!(iteration = iter, "karpov: singular feasibility system");
                    break;
                };
                let dx = xl.component_mul(&a.tr_mul(&t));
                let alpha = fraction_to_the_boundary(&xl, &dx, params.tau_feasible);
                state.x += alpha * dx;
                debug!(iteration = iter, infeasibility = norm_inf(&rb), alpha, "karpov: feasible step");
                if iter == options.max_iterations {
                    break;
                }
                continue;
            }

            let f = problem.objective(&state.x)?;
            if !f.is_finite() {
                warn!(iteration = iter, "karpov: non-finite objective");
                result.error = f64::INFINITY;
                break;
            }

            let (dx, y) = if params.use_kkt_solver {
                let z = state.z.map(|v| v.max(0.0));
                let lhs = KktMatrix {
                    hessian: &f.hessian,
                    a,
                    x: &xl,
                    z: &z,
                    gamma: options.regularization.gamma,
                    delta: options.regularization.delta,
                };
                let step = kkt.decompose(&lhs).and_then(|_| kkt.solve(&-&f.grad, &DVector::zeros(m)));
                match step {
                    Ok(step) => step,
                    Err(e) => {
                        warn!(iteration = iter, error = %e, "karpov: KKT solve failed");
                        break;
                    }
                }
            } else {
                let Some(y) = weighted_normal_solve(a, &xl, &(a * xl.component_mul(&f.grad))) else {
                    warn!(iteration = iter, "karpov: singular dual system");
                    break;
                };
                let dx = -xl.component_mul(&(&f.grad - a.tr_mul(&y)));
                (dx, y)
            };

            let z = &f.grad - a.tr_mul(&y);
            let error = norm_inf(&xl.component_mul(&z));
            let negative_dual = (0..n).any(|i| {
                xl[i] <= params.active_to_inactive && z[i] < params.negative_dual_tolerance
            });
            state.y = y;
            state.z = z;
            let fval = f.val;
            state.f = f;
            result.error = error;
            debug!(iteration = iter, error, f = fval, "karpov");

            if error < options.tolerance && !negative_dual {
                result.succeeded = true;
                break;
            }
            if iter == options.max_iterations {
                break;
            }

            let gdx = state.f.grad.dot(&dx);
            if gdx >= 0.0 {
                warn!(iteration = iter, gdx, "karpov: not a descent direction");
                break;
            }
            let t_max = (params.tau_descent * largest_step(&xl, &dx)).min(1.0);

            let trial = |t: f64| -> f64 {
                match problem.objective(&(&state.x + t * &dx)) {
                    Ok(ft) if ft.val.is_finite() => ft.val,
                    _ => f64::INFINITY,
                }
            };
            let mut t = t_max;
            let mut accepted = false;
            for _ in 0..params.line_search_max_iterations {
                if trial(t) <= fval + params.line_search_wolfe * t * gdx {
                    accepted = true;
                    break;
                }
                t *= 0.5;
            }
            if !accepted {
                t = minimize_brent(trial, 0.0, t_max, BRENT_TOLERANCE, BRENT_MAX_ITERATIONS);
            }
            if !(t > 0.0) {
                warn!(iteration = iter, "karpov: line search stalled");
                break;
            }
            state.x += t * dx;
        }

        if !result.succeeded {
            warn!(
                iterations = result.iterations,
                error = result.error,
                "karpov did not converge"
            );
        }
        result.time = start.elapsed();
        Ok(result)
    }
}
