//! Ideal-gas Gibbs energy minimization over a small H–O system, solved by
//! every method through the public API.

use nalgebra::{DMatrix, DVector};
use rk_optim::{Hessian, ObjectiveResult, OptimResult, OptimumMethod, OptimumOptions, OptimumProblem, OptimumSolver, OptimumState};

/// Species H2, O2, H2O, OH with dimensionless standard potentials.
fn problem() -> OptimumProblem<'static> {
    let mu0 = DVector::from_vec(vec![0.0, 0.0, -90.0, -10.0]);
    let objective = move |n: &DVector<f64>| -> OptimResult<ObjectiveResult> {
        let total: f64 = n.sum();
        let grad = DVector::from_iterator(4, (0..4).map(|i| mu0[i] + (n[i] / total).ln()));
        let val = (0..4).filter(|&i| n[i] > 0.0).map(|i| n[i] * grad[i]).sum();
        let mut hess = DMatrix::from_element(4, 4, -1.0 / total);
        for i in 0..4 {
            hess[(i, i)] += 1.0 / n[i];
        }
        Ok(ObjectiveResult {
            val,
            grad,
            hessian: Hessian::Dense(hess),
        })
    };
    // Rows: H, O.
    let a = DMatrix::from_row_slice(2, 4, &[2.0, 0.0, 2.0, 1.0, 0.0, 2.0, 1.0, 1.0]);
    let b = DVector::from_vec(vec![2.0, 1.0]);
    OptimumProblem::new(objective, a, b).unwrap()
}

#[test]
fn every_method_finds_the_same_equilibrium() {
    let mut reference: Option<DVector<f64>> = None;
    for method in [OptimumMethod::IpNewton, OptimumMethod::IpOpt, OptimumMethod::IpActive, OptimumMethod::Karpov] {
        let problem = problem();
        let mut state = OptimumState::default();
        let mut solver = OptimumSolver::new(method);
        let mut options = OptimumOptions::default();
        options.karpov.use_kkt_solver = true;
        let res = solver.solve(&problem, &mut state, &options).unwrap();
        assert!(res.succeeded, "{method:?}: {res:?}");

        let balance = problem.a() * &state.x - problem.b();
        assert!(balance.amax() < 1e-8, "{method:?}: {balance}");
        assert!(state.x.iter().all(|&v| v >= 0.0));
        // Water dominates with these potentials.
        assert!(state.x[2] > 0.99, "{method:?}: {}", state.x);

        match &reference {
            None => reference = Some(state.x.clone()),
            Some(r) => {
                // Trace species sit at the level set by each method's barrier,
                // so only absolute agreement is meaningful.
                let diff = (&state.x - r).amax();
                assert!(diff < 1e-6, "{method:?}: {} vs {}", state.x, r);
            }
        }
    }
}

#[test]
fn warm_start_converges_immediately() {
    let problem = problem();
    let mut state = OptimumState::default();
    let mut solver = OptimumSolver::default();
    let options = OptimumOptions::default();
    let first = solver.solve(&problem, &mut state, &options).unwrap();
    assert!(first.succeeded);

    let second = solver.solve(&problem, &mut state, &options).unwrap();
    assert!(second.succeeded);
    assert!(second.iterations <= 1, "{second:?}");
}
