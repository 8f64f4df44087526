//! Derivatives of equilibrium amounts with respect to T, P and b.

use nalgebra::{DMatrix, DVector};

/// Sensitivity of the equilibrium species amounts.
///
/// Vectors and rows run over all species of the system; species outside the
/// equilibrium partition have zero entries. Columns of `dndb` run over all
/// elements.
#[derive(Clone, Debug, PartialEq)]
pub struct EquilibriumSensitivity {
    /// ∂n/∂T (mol/K)
    pub dndt: DVector<f64>,
    /// ∂n/∂P (mol/Pa)
    pub dndp: DVector<f64>,
    /// ∂n/∂b
    pub dndb: DMatrix<f64>,
}

impl EquilibriumSensitivity {
    pub fn zeros(nspecies: usize, nelements: usize) -> Self {
        Self {
            dndt: DVector::zeros(nspecies),
            dndp: DVector::zeros(nspecies),
            dndb: DMatrix::zeros(nspecies, nelements),
        }
    }

    /// First-order change of n for the given parameter increments.
    pub fn predict(&self, dt: f64, dp: f64, db: &DVector<f64>) -> DVector<f64> {
        &self.dndt * dt + &self.dndp * dp + &self.dndb * db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_is_linear() {
        let mut s = EquilibriumSensitivity::zeros(2, 1);
        s.dndt[0] = 1.0;
        s.dndp[1] = 2.0;
        s.dndb[(0, 0)] = 0.5;
        let dn = s.predict(2.0, 0.5, &DVector::from_vec(vec![4.0]));
        assert_eq!(dn, DVector::from_vec(vec![4.0, 1.0]));
    }
}
