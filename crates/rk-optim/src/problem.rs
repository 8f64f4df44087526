//! Problem definition: minimize f(x) subject to A·x = b and x ≥ l.

use crate::error::{OptimError, OptimResult};
use nalgebra::{DMatrix, DVector};

/// Second-derivative information returned by an objective.
#[derive(Clone, Debug, Default)]
pub enum Hessian {
    Dense(DMatrix<f64>),
    Diagonal(DVector<f64>),
    /// Linear objective, or one whose curvature should be ignored.
    #[default]
    Zero,
}

impl Hessian {
    /// Dense n×n representation.
    pub fn to_dense(&self, n: usize) -> DMatrix<f64> {
        match self {
            Hessian::Dense(h) => h.clone(),
            Hessian::Diagonal(d) => DMatrix::from_diagonal(d),
            Hessian::Zero => DMatrix::zeros(n, n),
        }
    }

    /// Diagonal entries.
    pub fn diagonal(&self, n: usize) -> DVector<f64> {
        match self {
            Hessian::Dense(h) => h.diagonal(),
            Hessian::Diagonal(d) => d.clone(),
            Hessian::Zero => DVector::zeros(n),
        }
    }

    /// Product H·v.
    pub fn mul(&self, v: &DVector<f64>) -> DVector<f64> {
        match self {
            Hessian::Dense(h) => h * v,
            Hessian::Diagonal(d) => d.component_mul(v),
            Hessian::Zero => DVector::zeros(v.len()),
        }
    }

    /// Restriction to the rows and columns in `indices`.
    pub fn select(&self, indices: &[usize]) -> Hessian {
        match self {
            Hessian::Dense(h) => Hessian::Dense(DMatrix::from_fn(
                indices.len(),
                indices.len(),
                |i, j| h[(indices[i], indices[j])],
            )),
            Hessian::Diagonal(d) => {
                Hessian::Diagonal(DVector::from_iterator(indices.len(), indices.iter().map(|&i| d[i])))
            }
            Hessian::Zero => Hessian::Zero,
        }
    }

    pub fn is_diagonal(&self) -> bool {
        !matches!(self, Hessian::Dense(_))
    }
}

/// Objective value, gradient and Hessian at a point.
#[derive(Clone, Debug, Default)]
pub struct ObjectiveResult {
    pub val: f64,
    pub grad: DVector<f64>,
    pub hessian: Hessian,
}

impl ObjectiveResult {
    pub fn is_finite(&self) -> bool {
        self.val.is_finite() && self.grad.iter().all(|g| g.is_finite())
    }
}

/// Objective function signature.
pub type ObjectiveFn<'a> = Box<dyn Fn(&DVector<f64>) -> OptimResult<ObjectiveResult> + 'a>;

/// Minimize f(x) subject to A·x = b, x ≥ l.
pub struct OptimumProblem<'a> {
    objective: ObjectiveFn<'a>,
    a: DMatrix<f64>,
    b: DVector<f64>,
    l: DVector<f64>,
}

impl<'a> OptimumProblem<'a> {
    /// Creates a problem with lower bounds l = 0.
    pub fn new<F>(objective: F, a: DMatrix<f64>, b: DVector<f64>) -> OptimResult<Self>
    where
        F: Fn(&DVector<f64>) -> OptimResult<ObjectiveResult> + 'a,
    {
        if a.nrows() != b.len() {
            return Err(OptimError::ProblemSetup {
                what: format!(
                    "constraint matrix has {} rows but b has {} entries",
                    a.nrows(),
                    b.len()
                ),
            });
        }
        if let Some(v) = b.iter().find(|v| !v.is_finite()) {
            return Err(OptimError::ProblemSetup {
                what: format!("non-finite right-hand side entry {v}"),
            });
        }
        let n = a.ncols();
        Ok(Self {
            objective: Box::new(objective),
            a,
            b,
            l: DVector::zeros(n),
        })
    }

    pub fn with_lower_bounds(mut self, l: DVector<f64>) -> OptimResult<Self> {
        if l.len() != self.num_variables() {
            return Err(OptimError::ProblemSetup {
                what: format!(
                    "expected {} lower bounds, got {}",
                    self.num_variables(),
                    l.len()
                ),
            });
        }
        self.l = l;
        Ok(self)
    }

    pub fn num_variables(&self) -> usize {
        self.a.ncols()
    }

    pub fn num_constraints(&self) -> usize {
        self.a.nrows()
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn lower_bounds(&self) -> &DVector<f64> {
        &self.l
    }

    /// Evaluates the objective at `x`.
    pub fn objective(&self, x: &DVector<f64>) -> OptimResult<ObjectiveResult> {
        let f = (self.objective)(x)?;
        if f.grad.len() != x.len() {
            return Err(OptimError::Objective {
                what: format!(
                    "gradient has {} entries for {} variables",
                    f.grad.len(),
                    x.len()
                ),
            });
        }
        Ok(f)
    }
}

impl std::fmt::Debug for OptimumProblem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimumProblem")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("l", &self.l)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(x: &DVector<f64>) -> OptimResult<ObjectiveResult> {
        Ok(ObjectiveResult {
            val: 0.5 * x.norm_squared(),
            grad: x.clone(),
            hessian: Hessian::Diagonal(DVector::from_element(x.len(), 1.0)),
        })
    }

    #[test]
    fn rejects_mismatched_constraints() {
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        assert!(OptimumProblem::new(quadratic, a, b).is_err());
    }

    #[test]
    fn lower_bounds_default_to_zero() {
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        let problem = OptimumProblem::new(quadratic, a, b).unwrap();
        assert_eq!(problem.lower_bounds().len(), 3);
        assert!(problem.lower_bounds().iter().all(|&l| l == 0.0));
        assert!(problem.with_lower_bounds(DVector::zeros(2)).is_err());
    }

    #[test]
    fn hessian_views_agree() {
        let h = Hessian::Dense(DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]));
        let v = DVector::from_vec(vec![1.0, -1.0]);
        assert_eq!(h.mul(&v), h.to_dense(2) * &v);
        assert_eq!(h.diagonal(2), DVector::from_vec(vec![2.0, 3.0]));

        let d = Hessian::Diagonal(DVector::from_vec(vec![4.0, 5.0, 6.0]));
        match d.select(&[2, 0]) {
            Hessian::Diagonal(s) => assert_eq!(s, DVector::from_vec(vec![6.0, 4.0])),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(Hessian::Zero.mul(&v), DVector::zeros(2));
    }
}
