//! Saddle-point (KKT) linear systems of the Newton steps.
//!
//! With the bound duals eliminated the step solves
//!
//! ```text
//! [ H + X⁻¹Z + γ²I   −Aᵀ  ] [dx]   [rx]
//! [       A          δ²I  ] [dy] = [rb]
//! ```
//!
//! where X = diag(x − l). The factorization is kept so the same matrix can
//! be reused for sensitivity right-hand sides.

use crate::error::{OptimError, OptimResult};
use crate::options::{KktMethod, KktOptions};
use crate::problem::Hessian;
use nalgebra::linalg::{FullPivLU, LU};
use nalgebra::{DMatrix, DVector, Dyn};

/// Left-hand side blocks of a KKT system.
#[derive(Clone, Copy, Debug)]
pub struct KktMatrix<'a> {
    pub hessian: &'a Hessian,
    pub a: &'a DMatrix<f64>,
    /// Distance to the lower bounds, x − l
    pub x: &'a DVector<f64>,
    pub z: &'a DVector<f64>,
    pub gamma: f64,
    pub delta: f64,
}

#[derive(Debug)]
enum Decomposition {
    Partial(LU<f64, Dyn, Dyn>),
    Full(FullPivLU<f64, Dyn, Dyn>),
}

/// Dense LU solver of KKT systems.
#[derive(Debug)]
pub struct KktSolver {
    options: KktOptions,
    n: usize,
    m: usize,
    decomposition: Option<Decomposition>,
}

impl KktSolver {
    pub fn new(options: KktOptions) -> Self {
        Self {
            options,
            n: 0,
            m: 0,
            decomposition: None,
        }
    }

    /// Assembles and factorizes the KKT matrix.
    pub fn decompose(&mut self, lhs: &KktMatrix<'_>) -> OptimResult<()> {
        let n = lhs.a.ncols();
        let m = lhs.a.nrows();
        if lhs.x.len() != n || lhs.z.len() != n {
            return Err(OptimError::InvalidState {
                what: format!("KKT blocks sized for {n} variables, got x={} z={}", lhs.x.len(), lhs.z.len()),
            });
        }

        let mut kkt = DMatrix::zeros(n + m, n + m);
        kkt.view_mut((0, 0), (n, n)).copy_from(&lhs.hessian.to_dense(n));
        let gamma2 = lhs.gamma * lhs.gamma;
        for i in 0..n {
            kkt[(i, i)] += lhs.z[i] / lhs.x[i] + gamma2;
        }
        kkt.view_mut((0, n), (n, m)).copy_from(&(-lhs.a.transpose()));
        kkt.view_mut((n, 0), (m, n)).copy_from(lhs.a);
        let delta2 = lhs.delta * lhs.delta;
        for i in 0..m {
            kkt[(n + i, n + i)] = delta2;
        }

        if kkt.iter().any(|v| !v.is_finite()) {
            return Err(OptimError::Numeric {
                what: "non-finite entry in KKT matrix".to_string(),
            });
        }

        self.n = n;
        self.m = m;
        self.decomposition = Some(match self.options.method {
            KktMethod::PartialPivLu => Decomposition::Partial(kkt.lu()),
            KktMethod::FullPivLu => Decomposition::Full(kkt.full_piv_lu()),
        });
        Ok(())
    }

    /// Solves for (dx, dy) against the last factorization.
    pub fn solve(&self, rx: &DVector<f64>, rb: &DVector<f64>) -> OptimResult<(DVector<f64>, DVector<f64>)> {
        let decomposition = self.decomposition.as_ref().ok_or_else(|| OptimError::InvalidState {
            what: "KKT solve before decomposition".to_string(),
        })?;
        if rx.len() != self.n || rb.len() != self.m {
            return Err(OptimError::InvalidState {
                what: format!(
                    "KKT right-hand side sized ({}, {}), expected ({}, {})",
                    rx.len(),
                    rb.len(),
                    self.n,
                    self.m
                ),
            });
        }

        let mut rhs = DVector::zeros(self.n + self.m);
        rhs.rows_mut(0, self.n).copy_from(rx);
        rhs.rows_mut(self.n, self.m).copy_from(rb);

        let sol = match decomposition {
            Decomposition::Partial(lu) => lu.solve(&rhs),
            Decomposition::Full(lu) => lu.solve(&rhs),
        }
        .ok_or_else(|| OptimError::SingularKkt {
            what: format!("{} variables, {} constraints", self.n, self.m),
        })?;

        if sol.iter().any(|v| !v.is_finite()) {
            return Err(OptimError::SingularKkt {
                what: "non-finite Newton step".to_string(),
            });
        }
        Ok((sol.rows(0, self.n).into_owned(), sol.rows(self.n, self.m).into_owned()))
    }

    pub fn is_decomposed(&self) -> bool {
        self.decomposition.is_some()
    }
}
