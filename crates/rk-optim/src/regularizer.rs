//! Preprocessing of the linear constraints A·x = b, x ≥ l.
//!
//! Two reductions are applied before a method runs:
//! - trivial constraints: a row whose right-hand side equals A_i·l while all
//!   its coefficients share one sign can only be met with every variable in
//!   it at its lower bound, so those variables are fixed and the row dropped;
//! - linearly dependent rows are removed, optionally replacing the remaining
//!   rows by the reduced row echelon form of A.

use crate::error::{OptimError, OptimResult};
use crate::options::RegularizerOptions;
use crate::problem::{Hessian, ObjectiveResult};
use nalgebra::{DMatrix, DVector};

/// Constraints after regularization, together with the maps back to the
/// original problem.
#[derive(Clone, Debug)]
pub struct Regularized {
    /// Variables left free, in original order
    pub ivariables: Vec<usize>,
    /// Variables fixed at their lower bounds by trivial constraints
    pub itrivial_variables: Vec<usize>,
    /// Rows removed as trivial
    pub itrivial_constraints: Vec<usize>,
    /// Rows entering the row transformation, in original order
    pub iconstraints: Vec<usize>,
    /// Regularized constraint matrix (rank × free variables)
    pub a: DMatrix<f64>,
    /// Regularized right-hand side
    pub b: DVector<f64>,
    /// Row transformation with `a = r · A[iconstraints, ivariables]`
    pub r: DMatrix<f64>,
    num_variables: usize,
    num_constraints: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Regularizer {
    options: RegularizerOptions,
}

impl Regularizer {
    pub fn new(options: RegularizerOptions) -> Self {
        Self { options }
    }

    pub fn regularize(&self, a: &DMatrix<f64>, b: &DVector<f64>, l: &DVector<f64>) -> OptimResult<Regularized> {
        let (m, n) = a.shape();
        let scale = b.amax().max(1.0);
        let zero_tol = 10.0 * f64::EPSILON * scale;

        let mut fixed = vec![false; n];
        let mut trivial_row = vec![false; m];
        loop {
            let mut changed = false;
            let pending: Vec<usize> = (0..m).filter(|&i| !trivial_row[i]).collect();
            for i in pending {
                let row = a.row(i);
                let rhs = b[i] - row.dot(&l.transpose());
                let free: Vec<usize> = (0..n).filter(|&j| !fixed[j] && row[j] != 0.0).collect();
                let same_sign = free.iter().all(|&j| row[j] > 0.0) || free.iter().all(|&j| row[j] < 0.0);
                if rhs.abs() <= zero_tol && same_sign {
                    trivial_row[i] = true;
                    for j in free {
                        fixed[j] = true;
                    }
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let ivariables: Vec<usize> = (0..n).filter(|&j| !fixed[j]).collect();
        let itrivial_variables: Vec<usize> = (0..n).filter(|&j| fixed[j]).collect();
        let itrivial_constraints: Vec<usize> = (0..m).filter(|&i| trivial_row[i]).collect();
        let iconstraints: Vec<usize> = (0..m).filter(|&i| !trivial_row[i]).collect();

        let a1 = DMatrix::from_fn(iconstraints.len(), ivariables.len(), |i, j| a[(iconstraints[i], ivariables[j])]);
        let b1 = DVector::from_fn(iconstraints.len(), |i, _| {
            let row = iconstraints[i];
            b[row] - itrivial_variables.iter().map(|&j| a[(row, j)] * l[j]).sum::<f64>()
        });

        let (mut r, rank) = self.row_transformation(&a1);
        if self.options.echelonize && self.options.max_denominator > 0 {
            let maxden = self.options.max_denominator;
            r.iter_mut().for_each(|v| *v = rationalize(*v, maxden));
        }

        let mut a_reg = &r * &a1;
        if self.options.echelonize && self.options.max_denominator > 0 {
            let maxden = self.options.max_denominator;
            a_reg.iter_mut().for_each(|v| *v = rationalize(*v, maxden));
        }
        let b_reg = &r * &b1;

        self.check_consistency(&a1, &b1, &a_reg, &b_reg, rank, scale)?;

        tracing::trace!(
            removed_rows = iconstraints.len() - rank,
            trivial_rows = itrivial_constraints.len(),
            fixed_variables = itrivial_variables.len(),
            "regularized constraints"
        );

        Ok(Regularized {
            ivariables,
            itrivial_variables,
            itrivial_constraints,
            iconstraints,
            a: a_reg,
            b: b_reg,
            r,
            num_variables: n,
            num_constraints: m,
        })
    }

    /// Row transformation removing dependent rows of `a1`.
    ///
    /// Gauss-Jordan elimination with partial pivoting; in echelon mode the
    /// transformation yields the reduced row echelon form, otherwise it
    /// selects the independent original rows.
    fn row_transformation(&self, a1: &DMatrix<f64>) -> (DMatrix<f64>, usize) {
        let (m, n) = a1.shape();
        let tol = f64::EPSILON * a1.amax().max(1.0) * (m.max(n).max(1) as f64) * 10.0;

        let mut work = DMatrix::zeros(m, n + m);
        work.view_mut((0, 0), (m, n)).copy_from(a1);
        work.view_mut((0, n), (m, m)).fill_with_identity();
        let mut order: Vec<usize> = (0..m).collect();

        let mut rank = 0;
        for col in 0..n {
            if rank == m {
                break;
            }
            let (offset, pivot) = work
                .view((rank, col), (m - rank, 1))
                .iter()
                .enumerate()
                .fold((0, 0.0_f64), |best, (i, v)| if v.abs() > best.1.abs() { (i, *v) } else { best });
            if pivot.abs() <= tol {
                continue;
            }
            let p = rank + offset;
            work.swap_rows(p, rank);
            order.swap(p, rank);
            let pivot_row = work.row(rank) / pivot;
            work.set_row(rank, &pivot_row);
            for i in (0..m).filter(|&i| i != rank) {
                let factor = work[(i, col)];
                if factor != 0.0 {
                    let updated = work.row(i) - factor * &pivot_row;
                    work.set_row(i, &updated);
                }
            }
            rank += 1;
        }

        if self.options.echelonize {
            (work.view((0, n), (rank, m)).into_owned(), rank)
        } else {
            let mut selected: Vec<usize> = order[..rank].to_vec();
            selected.sort_unstable();
            let mut r = DMatrix::zeros(rank, m);
            for (k, &i) in selected.iter().enumerate() {
                r[(k, i)] = 1.0;
            }
            (r, rank)
        }
    }

    fn check_consistency(
        &self,
        a1: &DMatrix<f64>,
        b1: &DVector<f64>,
        a_reg: &DMatrix<f64>,
        b_reg: &DVector<f64>,
        rank: usize,
        scale: f64,
    ) -> OptimResult<()> {
        if rank == a1.nrows() {
            return Ok(());
        }
        // Dependent rows must be reproduced by the kept ones: b1 ∈ range(A1)
        // is equivalent to b1 = A1·x for the least-norm x of the kept rows.
        let gram = a_reg * a_reg.transpose();
        let Some(t) = gram.lu().solve(b_reg) else {
            return Err(OptimError::ProblemSetup {
                what: "rank-deficient constraints after regularization".to_string(),
            });
        };
        let x = a_reg.transpose() * t;
        let residual = (a1 * x - b1).amax();
        if residual > 1e-10 * scale {
            return Err(OptimError::ProblemSetup {
                what: format!("inconsistent linear constraints (residual {residual:.3e})"),
            });
        }
        Ok(())
    }
}

impl Regularized {
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Restricts a full-length vector to the free variables.
    pub fn select(&self, v: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.ivariables.len(), self.ivariables.iter().map(|&j| v[j]))
    }

    /// Full-length vector from free-variable values, `fill` elsewhere.
    pub fn expand(&self, v: &DVector<f64>, fill: &DVector<f64>) -> DVector<f64> {
        let mut full = fill.clone();
        for (k, &j) in self.ivariables.iter().enumerate() {
            full[j] = v[k];
        }
        full
    }

    /// Original-space equality duals from regularized ones.
    pub fn recover_y(&self, y: &DVector<f64>) -> DVector<f64> {
        let mut full = DVector::zeros(self.num_constraints);
        let mapped = self.r.transpose() * y;
        for (k, &i) in self.iconstraints.iter().enumerate() {
            full[i] = mapped[k];
        }
        full
    }

    /// Regularized-space equality duals best reproducing original ones.
    pub fn restrict_y(&self, y: &DVector<f64>) -> DVector<f64> {
        let sub = DVector::from_iterator(self.iconstraints.len(), self.iconstraints.iter().map(|&i| y[i]));
        let gram = &self.r * self.r.transpose();
        gram.lu()
            .solve(&(&self.r * sub))
            .unwrap_or_else(|| DVector::zeros(self.r.nrows()))
    }

    /// Regularized-space right-hand side derivative.
    pub fn restrict_b(&self, db: &DVector<f64>) -> DVector<f64> {
        let sub = DVector::from_iterator(self.iconstraints.len(), self.iconstraints.iter().map(|&i| db[i]));
        &self.r * sub
    }

    /// Objective restricted to the free variables.
    pub fn restrict_objective(&self, f: ObjectiveResult) -> ObjectiveResult {
        ObjectiveResult {
            val: f.val,
            grad: self.select(&f.grad),
            hessian: f.hessian.select(&self.ivariables),
        }
    }

    /// Objective expanded to all variables; fixed variables get zero entries.
    pub fn expand_objective(&self, f: &ObjectiveResult) -> ObjectiveResult {
        let n = self.num_variables;
        let grad = self.expand(&f.grad, &DVector::zeros(n));
        let hessian = match &f.hessian {
            Hessian::Dense(h) => {
                let mut full = DMatrix::zeros(n, n);
                for (p, &i) in self.ivariables.iter().enumerate() {
                    for (q, &j) in self.ivariables.iter().enumerate() {
                        full[(i, j)] = h[(p, q)];
                    }
                }
                Hessian::Dense(full)
            }
            Hessian::Diagonal(d) => Hessian::Diagonal(self.expand(d, &DVector::zeros(n))),
            Hessian::Zero => Hessian::Zero,
        };
        ObjectiveResult {
            val: f.val,
            grad,
            hessian,
        }
    }
}

/// Closest fraction p/q with q ≤ `maxden`, via continued fractions.
pub fn rationalize(x: f64, maxden: u32) -> f64 {
    if !x.is_finite() || maxden == 0 {
        return x;
    }
    let (mut h0, mut h1) = (0.0_f64, 1.0_f64);
    let (mut k0, mut k1) = (1.0_f64, 0.0_f64);
    let mut rest = x;
    for _ in 0..64 {
        let a = rest.floor();
        let h2 = a * h1 + h0;
        let k2 = a * k1 + k0;
        if k2 > f64::from(maxden) {
            break;
        }
        (h0, h1, k0, k1) = (h1, h2, k1, k2);
        let frac = rest - a;
        if frac.abs() < 1e-12 {
            break;
        }
        rest = 1.0 / frac;
    }
    if k1 == 0.0 { x } else { h1 / k1 }
}
