//! Primal and dual iterate of an optimization.

use crate::problem::ObjectiveResult;
use nalgebra::DVector;

/// Primal variables `x`, equality duals `y`, bound duals `z` and the last
/// objective evaluation `f`.
///
/// Empty vectors mean "no initial guess"; solvers size them on entry.
#[derive(Clone, Debug, Default)]
pub struct OptimumState {
    pub x: DVector<f64>,
    pub y: DVector<f64>,
    pub z: DVector<f64>,
    pub f: ObjectiveResult,
}

impl OptimumState {
    pub fn new(x: DVector<f64>) -> Self {
        Self {
            x,
            ..Self::default()
        }
    }

    /// Sizes `x`, `y` and `z` for a problem, keeping entries that already fit.
    pub(crate) fn resize(&mut self, n: usize, m: usize) {
        if self.x.len() != n {
            self.x = DVector::from_element(n, 1.0);
        }
        if self.y.len() != m {
            self.y = DVector::zeros(m);
        }
        if self.z.len() != n {
            self.z = DVector::zeros(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_matching_vectors() {
        let mut state = OptimumState::new(DVector::from_vec(vec![0.5, 0.25]));
        state.resize(2, 1);
        assert_eq!(state.x, DVector::from_vec(vec![0.5, 0.25]));
        assert_eq!(state.y.len(), 1);
        assert_eq!(state.z.len(), 2);

        state.resize(3, 1);
        assert_eq!(state.x, DVector::from_element(3, 1.0));
    }
}
