//! Active-set Newton method.
//!
//! Variables within `threshold` of their lower bound are active: they are
//! held fixed and their bound duals follow from z = g − Aᵀy. Newton steps
//! are taken on the remaining variables, stopping at the first bound hit.
//! Converged points with a negative active dual release that variable.

use crate::error::OptimResult;
use crate::kkt::{KktMatrix, KktSolver};
use crate::options::OptimumOptions;
use crate::problem::OptimumProblem;
use crate::result::OptimumResult;
use crate::solver::OptimumStrategy;
use crate::state::OptimumState;
use crate::utils::{largest_step, norm_inf};
use nalgebra::{DMatrix, DVector};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ActNewtonSolver;

impl OptimumStrategy for ActNewtonSolver {
    fn solve(
        &mut self,
        problem: &OptimumProblem<'_>,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> OptimResult<OptimumResult> {
        state.resize(problem.num_variables(), problem.num_constraints());
        let l = problem.lower_bounds();
        let threshold = options.actnewton.threshold;
        let active: Vec<bool> = (0..problem.num_variables())
            .map(|i| state.x[i] - l[i] < threshold)
            .collect();
        active_set_newton(problem, state, options, active)
    }
}

/// Newton iterations on the free variables starting from an initial active set.
pub(crate) fn active_set_newton(
    problem: &OptimumProblem<'_>,
    state: &mut OptimumState,
    options: &OptimumOptions,
    mut active: Vec<bool>,
) -> OptimResult<OptimumResult> {
    let start = Instant::now();
    let n = problem.num_variables();
    let m = problem.num_constraints();
    let a = problem.a();
    let b = problem.b();
    let l = problem.lower_bounds();
    let threshold = options.actnewton.threshold;
    state.resize(n, m);
    for i in 0..n {
        state.x[i] = state.x[i].max(l[i]);
    }

    let mut kkt = KktSolver::new(options.kkt.clone());
    let mut result = OptimumResult::default();

    for iter in 0..=options.max_iterations {
        let f = problem.objective(&state.x)?;
        if !f.is_finite() {
            warn!(iteration = iter, "actnewton: non-finite objective");
            result.iterations = iter;
            result.error = f64::INFINITY;
            break;
        }

        let free: Vec<usize> = (0..n).filter(|&i| !active[i]).collect();
        let rx_full = &f.grad - a.tr_mul(&state.y);
        let rx = DVector::from_iterator(free.len(), free.iter().map(|&i| rx_full[i]));
        let rb = a * &state.x - b;
        let error = norm_inf(&rx).max(norm_inf(&rb));

        for i in 0..n {
            state.z[i] = if active[i] { rx_full[i] } else { 0.0 };
        }
        let fval = f.val;
        state.f = f;
        result.iterations = iter;
        result.error = error;
        debug!(iteration = iter, error, f = fval, active = n - free.len(), "actnewton");

        if error < options.tolerance {
            let release = (0..n)
                .filter(|&i| active[i] && state.z[i] < -options.tolerance)
                .min_by(|&i, &j| state.z[i].total_cmp(&state.z[j]));
            match release {
                Some(i) => {
                    debug!(variable = i, dual = state.z[i], "actnewton: releasing variable");
                    active[i] = false;
                    continue;
                }
                None => {
                    result.succeeded = true;
                    break;
                }
            }
        }
        if iter == options.max_iterations {
            break;
        }

        let hf = state.f.hessian.select(&free);
        let af = DMatrix::from_fn(m, free.len(), |i, j| a[(i, free[j])]);
        let ones = DVector::from_element(free.len(), 1.0);
        let zeros = DVector::zeros(free.len());
        let lhs = KktMatrix {
            hessian: &hf,
            a: &af,
            x: &ones,
            z: &zeros,
            gamma: options.regularization.gamma,
            delta: options.regularization.delta,
        };
        let step = kkt.decompose(&lhs).and_then(|_| kkt.solve(&-&rx, &-&rb));
        let (dx, dy) = match step {
            Ok(step) => step,
            Err(e) => {
                warn!(iteration = iter, error = %e, "actnewton: Newton step failed");
                break;
            }
        };

        // Free variables sitting on their bound and moving outwards become active.
        let blocked: Vec<usize> = free
            .iter()
            .enumerate()
            .filter(|&(k, &i)| state.x[i] - l[i] < threshold && dx[k] < 0.0)
            .map(|(_, &i)| i)
            .collect();
        if !blocked.is_empty() {
            for i in blocked {
                active[i] = true;
            }
            continue;
        }

        let xl = DVector::from_iterator(free.len(), free.iter().map(|&i| state.x[i] - l[i]));
        let alpha = largest_step(&xl, &dx).min(1.0);
        for (k, &i) in free.iter().enumerate() {
            state.x[i] = (state.x[i] + alpha * dx[k]).max(l[i]);
        }
        state.y += alpha * &dy;

        if alpha < 1.0 {
            for (k, &i) in free.iter().enumerate() {
                if dx[k] < 0.0 && state.x[i] - l[i] < threshold.max(f64::EPSILON * xl[k]) {
                    state.x[i] = l[i];
                    active[i] = true;
                }
            }
        }
    }

    if !result.succeeded {
        warn!(
            iterations = result.iterations,
            error = result.error,
            "actnewton did not converge"
        );
    }
    result.time = start.elapsed();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Hessian, ObjectiveResult};

    fn projection_problem() -> OptimumProblem<'static> {
        let p = DVector::from_vec(vec![1.0, 0.5, -1.0]);
        let objective = move |x: &DVector<f64>| -> OptimResult<ObjectiveResult> {
            let d = x - &p;
            Ok(ObjectiveResult {
                val: 0.5 * d.norm_squared(),
                grad: d,
                hessian: Hessian::Diagonal(DVector::from_element(3, 1.0)),
            })
        };
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        OptimumProblem::new(objective, a, b).unwrap()
    }

    #[test]
    fn hits_bound_and_converges() {
        let problem = projection_problem();
        let mut state = OptimumState::new(DVector::from_element(3, 1.0 / 3.0));
        let res = ActNewtonSolver.solve(&problem, &mut state, &OptimumOptions::default()).unwrap();
        assert!(res.succeeded, "{res:?}");
        assert!((state.x[0] - 0.75).abs() < 1e-12);
        assert!((state.x[1] - 0.25).abs() < 1e-12);
        assert_eq!(state.x[2], 0.0);
        assert!((state.z[2] - 1.25).abs() < 1e-12);
        assert!(state.z[0] == 0.0 && state.z[1] == 0.0);
    }

    #[test]
    fn releases_variable_with_negative_dual() {
        let problem = projection_problem();
        // Starting with x2 at its bound: its dual is negative, so it must be
        // released before the optimum is reached.
        let mut state = OptimumState::new(DVector::from_vec(vec![0.5, 0.0, 0.5]));
        let res = ActNewtonSolver.solve(&problem, &mut state, &OptimumOptions::default()).unwrap();
        assert!(res.succeeded, "{res:?}");
        assert!((state.x[1] - 0.25).abs() < 1e-12);
        assert_eq!(state.x[2], 0.0);
    }
}
