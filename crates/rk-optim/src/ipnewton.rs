//! Primal-dual interior-point Newton method.
//!
//! Newton steps on the perturbed KKT conditions
//!
//! ```text
//! g − Aᵀy − z = 0,   A·x = b,   (x − l)∘z = μ
//! ```
//!
//! with a fraction-to-the-boundary rule keeping x − l and z positive.

use crate::error::OptimResult;
use crate::kkt::{KktMatrix, KktSolver};
use crate::options::OptimumOptions;
use crate::problem::OptimumProblem;
use crate::result::OptimumResult;
use crate::solver::OptimumStrategy;
use crate::state::OptimumState;
use crate::utils::{fraction_to_the_boundary, norm_inf};
use nalgebra::DVector;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct IpNewtonSolver;

impl OptimumStrategy for IpNewtonSolver {
    fn solve(
        &mut self,
        problem: &OptimumProblem<'_>,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> OptimResult<OptimumResult> {
        interior_point(problem, state, options, options.ipnewton.mu, options.ipnewton.tau)
    }
}

/// Interior-point Newton iterations with fixed perturbation `mu`.
pub(crate) fn interior_point(
    problem: &OptimumProblem<'_>,
    state: &mut OptimumState,
    options: &OptimumOptions,
    mu: f64,
    tau: f64,
) -> OptimResult<OptimumResult> {
    let start = Instant::now();
    let n = problem.num_variables();
    let m = problem.num_constraints();
    let a = problem.a();
    let b = problem.b();
    let l = problem.lower_bounds();
    state.resize(n, m);

    let floor = mu.sqrt().max(f64::MIN_POSITIVE);
    for i in 0..n {
        if !(state.x[i] - l[i] > 0.0) {
            state.x[i] = l[i] + floor;
        }
        if !(state.z[i] > 0.0) {
            state.z[i] = mu / (state.x[i] - l[i]);
        }
    }

    let mut kkt = KktSolver::new(options.kkt.clone());
    let mut result = OptimumResult::default();
    let mut f_prev: Option<f64> = None;
    let mut last_step = f64::INFINITY;

    for iter in 0..=options.max_iterations {
        let f = problem.objective(&state.x)?;
        if !f.is_finite() {
            warn!(iteration = iter, "ipnewton: non-finite objective");
            result.iterations = iter;
            result.error = f64::INFINITY;
            break;
        }

        let xl = &state.x - l;
        let rx = &f.grad - a.tr_mul(&state.y) - &state.z;
        let rb = a * &state.x - b;
        let rz = xl.component_mul(&state.z).add_scalar(-mu);
        let error = norm_inf(&rx).max(norm_inf(&rb)).max(norm_inf(&rz));

        let fval = f.val;
        state.f = f;
        result.iterations = iter;
        result.error = error;
        debug!(iteration = iter, error, f = fval, step = last_step, "ipnewton");

        if error < options.tolerance {
            result.succeeded = true;
            break;
        }
        if options.tolerancex > 0.0 && last_step < options.tolerancex {
            result.succeeded = true;
            break;
        }
        if let Some(fp) = f_prev
            && options.tolerancef > 0.0
            && (fval - fp).abs() <= options.tolerancef * fp.abs().max(1.0)
        {
            result.succeeded = true;
            break;
        }
        if iter == options.max_iterations {
            break;
        }
        f_prev = Some(fval);

        let lhs = KktMatrix {
            hessian: &state.f.hessian,
            a,
            x: &xl,
            z: &state.z,
            gamma: options.regularization.gamma,
            delta: options.regularization.delta,
        };
        let step = kkt
            .decompose(&lhs)
            .and_then(|_| kkt.solve(&(-&rx - rz.component_div(&xl)), &(-&rb)));
        let (dx, dy) = match step {
            Ok(step) => step,
            Err(e) => {
                warn!(iteration = iter, error = %e, "ipnewton: Newton step failed");
                break;
            }
        };
        let dz: DVector<f64> = -(rz + state.z.component_mul(&dx)).component_div(&xl);

        let alphax = fraction_to_the_boundary(&xl, &dx, tau);
        let alphaz = fraction_to_the_boundary(&state.z, &dz, tau);

        state.x += alphax * &dx;
        state.y += alphax * &dy;
        state.z += alphaz * &dz;
        last_step = alphax * norm_inf(&dx);
    }

    if !result.succeeded {
        warn!(
            iterations = result.iterations,
            error = result.error,
            "ipnewton did not converge"
        );
    }
    result.time = start.elapsed();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Hessian, ObjectiveResult};
    use nalgebra::DMatrix;

    #[test]
    fn solves_projection_onto_simplex() {
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
        let problem = OptimumProblem::new(objective, a, b).unwrap();

        let mut state = OptimumState::default();
        let res = IpNewtonSolver.solve(&problem, &mut state, &OptimumOptions::default()).unwrap();
        assert!(res.succeeded, "{res:?}");
        assert!((state.x[0] - 0.75).abs() < 1e-5);
        assert!((state.x[1] - 0.25).abs() < 1e-5);
        assert!(state.x[2].abs() < 1e-5);
        assert!((state.z[2] - 1.25).abs() < 1e-4);
        assert!((state.y[0] + 0.25).abs() < 1e-4);
    }

    #[test]
    fn iteration_cap_reports_failure() {
        let objective = |x: &DVector<f64>| -> OptimResult<ObjectiveResult> {
            Ok(ObjectiveResult {
                val: x.iter().map(|v| v * v.ln()).sum(),
                grad: x.map(|v| v.ln() + 1.0),
                hessian: Hessian::Diagonal(x.map(|v| 1.0 / v)),
            })
        };
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        let problem = OptimumProblem::new(objective, a, b).unwrap();
        let options = OptimumOptions {
            max_iterations: 1,
            ..Default::default()
        };
        let mut state = OptimumState::new(DVector::from_vec(vec![0.9, 0.01]));
        let res = IpNewtonSolver.solve(&problem, &mut state, &options).unwrap();
        assert!(!res.succeeded);
        assert_eq!(res.iterations, 1);
    }
}
