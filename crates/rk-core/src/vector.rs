//! Vector analogues of the derivative-carrying scalars.

use nalgebra::{DMatrix, DVector};
use std::ops::{Add, Mul, Neg, Sub};

use crate::scalar::{ChemicalScalar, ThermoScalar};

/// One `ThermoScalar` per entry, stored column-wise.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermoVector {
    pub val: DVector<f64>,
    pub ddt: DVector<f64>,
    pub ddp: DVector<f64>,
}

impl ThermoVector {
    pub fn new(val: DVector<f64>, ddt: DVector<f64>, ddp: DVector<f64>) -> Self {
        Self { val, ddt, ddp }
    }

    pub fn zeros(len: usize) -> Self {
        Self::new(DVector::zeros(len), DVector::zeros(len), DVector::zeros(len))
    }

    pub fn len(&self) -> usize {
        self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.val.is_empty()
    }

    pub fn row(&self, i: usize) -> ThermoScalar {
        ThermoScalar::new(self.val[i], self.ddt[i], self.ddp[i])
    }

    pub fn set_row(&mut self, i: usize, s: ThermoScalar) {
        self.val[i] = s.val;
        self.ddt[i] = s.ddt;
        self.ddp[i] = s.ddp;
    }

    pub fn rows(&self, start: usize, len: usize) -> ThermoVector {
        ThermoVector::new(
            self.val.rows(start, len).into_owned(),
            self.ddt.rows(start, len).into_owned(),
            self.ddp.rows(start, len).into_owned(),
        )
    }

    pub fn set_rows(&mut self, start: usize, v: &ThermoVector) {
        let len = v.len();
        self.val.rows_mut(start, len).copy_from(&v.val);
        self.ddt.rows_mut(start, len).copy_from(&v.ddt);
        self.ddp.rows_mut(start, len).copy_from(&v.ddp);
    }

    /// Entries selected by index, in the given order.
    pub fn select(&self, indices: &[usize]) -> ThermoVector {
        let pick = |v: &DVector<f64>| DVector::from_iterator(indices.len(), indices.iter().map(|&i| v[i]));
        ThermoVector::new(pick(&self.val), pick(&self.ddt), pick(&self.ddp))
    }

    /// Weighted sum `Σ wᵢ·vᵢ`.
    pub fn dot(&self, w: &DVector<f64>) -> ThermoScalar {
        ThermoScalar::new(self.val.dot(w), self.ddt.dot(w), self.ddp.dot(w))
    }

    /// Multiply every entry by a thermo scalar.
    pub fn scale(&self, s: ThermoScalar) -> ThermoVector {
        ThermoVector::new(
            &self.val * s.val,
            &self.ddt * s.val + &self.val * s.ddt,
            &self.ddp * s.val + &self.val * s.ddp,
        )
    }
}

impl Add<&ThermoVector> for &ThermoVector {
    type Output = ThermoVector;
    fn add(self, r: &ThermoVector) -> ThermoVector {
        ThermoVector::new(&self.val + &r.val, &self.ddt + &r.ddt, &self.ddp + &r.ddp)
    }
}

impl Sub<&ThermoVector> for &ThermoVector {
    type Output = ThermoVector;
    fn sub(self, r: &ThermoVector) -> ThermoVector {
        ThermoVector::new(&self.val - &r.val, &self.ddt - &r.ddt, &self.ddp - &r.ddp)
    }
}

impl Mul<f64> for &ThermoVector {
    type Output = ThermoVector;
    fn mul(self, r: f64) -> ThermoVector {
        ThermoVector::new(&self.val * r, &self.ddt * r, &self.ddp * r)
    }
}

/// One `ChemicalScalar` per row; `ddn` is the dense Jacobian w.r.t. amounts.
#[derive(Clone, Debug, PartialEq)]
pub struct ChemicalVector {
    pub val: DVector<f64>,
    pub ddt: DVector<f64>,
    pub ddp: DVector<f64>,
    pub ddn: DMatrix<f64>,
}

impl ChemicalVector {
    pub fn new(val: DVector<f64>, ddt: DVector<f64>, ddp: DVector<f64>, ddn: DMatrix<f64>) -> Self {
        Self { val, ddt, ddp, ddn }
    }

    /// `nrows` zero entries differentiated against `nspecies` amounts.
    pub fn zeros(nrows: usize, nspecies: usize) -> Self {
        Self::new(
            DVector::zeros(nrows),
            DVector::zeros(nrows),
            DVector::zeros(nrows),
            DMatrix::zeros(nrows, nspecies),
        )
    }

    /// Species amounts as independent variables: `ddn` is the identity.
    pub fn composition(n: &DVector<f64>) -> Self {
        let len = n.len();
        Self::new(
            n.clone(),
            DVector::zeros(len),
            DVector::zeros(len),
            DMatrix::identity(len, len),
        )
    }

    /// Lift a thermo vector with a zero species Jacobian.
    pub fn from_thermo(t: &ThermoVector, nspecies: usize) -> Self {
        Self::new(
            t.val.clone(),
            t.ddt.clone(),
            t.ddp.clone(),
            DMatrix::zeros(t.len(), nspecies),
        )
    }

    pub fn len(&self) -> usize {
        self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.val.is_empty()
    }

    pub fn num_species(&self) -> usize {
        self.ddn.ncols()
    }

    pub fn row(&self, i: usize) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val[i],
            self.ddt[i],
            self.ddp[i],
            self.ddn.row(i).transpose(),
        )
    }

    pub fn set_row(&mut self, i: usize, s: &ChemicalScalar) {
        self.val[i] = s.val;
        self.ddt[i] = s.ddt;
        self.ddp[i] = s.ddp;
        self.ddn.row_mut(i).copy_from(&s.ddn.transpose());
    }

    pub fn rows(&self, start: usize, len: usize) -> ChemicalVector {
        ChemicalVector::new(
            self.val.rows(start, len).into_owned(),
            self.ddt.rows(start, len).into_owned(),
            self.ddp.rows(start, len).into_owned(),
            self.ddn.rows(start, len).into_owned(),
        )
    }

    /// Place `v` at rows `start..` and its Jacobian at columns `col..`.
    ///
    /// Used to embed a phase-local result into the system-wide vector.
    pub fn set_block(&mut self, start: usize, col: usize, v: &ChemicalVector) {
        let len = v.len();
        self.val.rows_mut(start, len).copy_from(&v.val);
        self.ddt.rows_mut(start, len).copy_from(&v.ddt);
        self.ddp.rows_mut(start, len).copy_from(&v.ddp);
        self.ddn
            .view_mut((start, col), (len, v.num_species()))
            .copy_from(&v.ddn);
    }

    pub fn thermo(&self) -> ThermoVector {
        ThermoVector::new(self.val.clone(), self.ddt.clone(), self.ddp.clone())
    }

    pub fn sum(&self) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val.sum(),
            self.ddt.sum(),
            self.ddp.sum(),
            self.ddn.row_sum().transpose(),
        )
    }

    /// Weighted sum `Σ wᵢ·vᵢ`.
    pub fn dot(&self, w: &DVector<f64>) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val.dot(w),
            self.ddt.dot(w),
            self.ddp.dot(w),
            self.ddn.tr_mul(w),
        )
    }

    fn map_chain(&self, f: impl Fn(f64) -> (f64, f64)) -> ChemicalVector {
        let mut out = self.clone();
        for i in 0..self.len() {
            let (v, slope) = f(self.val[i]);
            out.val[i] = v;
            out.ddt[i] *= slope;
            out.ddp[i] *= slope;
            let mut row = out.ddn.row_mut(i);
            row *= slope;
        }
        out
    }

    pub fn ln(&self) -> ChemicalVector {
        self.map_chain(|x| (x.ln(), 1.0 / x))
    }

    pub fn exp(&self) -> ChemicalVector {
        self.map_chain(|x| {
            let e = x.exp();
            (e, e)
        })
    }

    /// Multiply every row by a chemical scalar.
    pub fn scale(&self, s: &ChemicalScalar) -> ChemicalVector {
        let mut ddn = &self.ddn * s.val;
        ddn += &self.val * s.ddn.transpose();
        ChemicalVector::new(
            &self.val * s.val,
            &self.ddt * s.val + &self.val * s.ddt,
            &self.ddp * s.val + &self.val * s.ddp,
            ddn,
        )
    }

    /// Multiply every row by a thermo scalar.
    pub fn scale_thermo(&self, s: ThermoScalar) -> ChemicalVector {
        ChemicalVector::new(
            &self.val * s.val,
            &self.ddt * s.val + &self.val * s.ddt,
            &self.ddp * s.val + &self.val * s.ddp,
            &self.ddn * s.val,
        )
    }

    /// Element-wise product.
    pub fn component_mul(&self, r: &ChemicalVector) -> ChemicalVector {
        let mut ddn = self.ddn.clone();
        for i in 0..self.len() {
            let row = self.ddn.row(i) * r.val[i] + r.ddn.row(i) * self.val[i];
            ddn.row_mut(i).copy_from(&row);
        }
        ChemicalVector::new(
            self.val.component_mul(&r.val),
            self.ddt.component_mul(&r.val) + self.val.component_mul(&r.ddt),
            self.ddp.component_mul(&r.val) + self.val.component_mul(&r.ddp),
            ddn,
        )
    }

    /// Element-wise quotient.
    pub fn component_div(&self, r: &ChemicalVector) -> ChemicalVector {
        let mut out = ChemicalVector::zeros(self.len(), self.num_species());
        for i in 0..self.len() {
            out.set_row(i, &(&self.row(i) / &r.row(i)));
        }
        out
    }
}

impl Neg for &ChemicalVector {
    type Output = ChemicalVector;
    fn neg(self) -> ChemicalVector {
        ChemicalVector::new(-&self.val, -&self.ddt, -&self.ddp, -&self.ddn)
    }
}

impl Add<&ChemicalVector> for &ChemicalVector {
    type Output = ChemicalVector;
    fn add(self, r: &ChemicalVector) -> ChemicalVector {
        ChemicalVector::new(
            &self.val + &r.val,
            &self.ddt + &r.ddt,
            &self.ddp + &r.ddp,
            &self.ddn + &r.ddn,
        )
    }
}

impl Sub<&ChemicalVector> for &ChemicalVector {
    type Output = ChemicalVector;
    fn sub(self, r: &ChemicalVector) -> ChemicalVector {
        ChemicalVector::new(
            &self.val - &r.val,
            &self.ddt - &r.ddt,
            &self.ddp - &r.ddp,
            &self.ddn - &r.ddn,
        )
    }
}

impl Add<&ThermoVector> for &ChemicalVector {
    type Output = ChemicalVector;
    fn add(self, r: &ThermoVector) -> ChemicalVector {
        ChemicalVector::new(
            &self.val + &r.val,
            &self.ddt + &r.ddt,
            &self.ddp + &r.ddp,
            self.ddn.clone(),
        )
    }
}

impl Add<&ChemicalVector> for &ThermoVector {
    type Output = ChemicalVector;
    fn add(self, r: &ChemicalVector) -> ChemicalVector {
        r + self
    }
}

impl Add<&ChemicalScalar> for &ChemicalVector {
    type Output = ChemicalVector;
    fn add(self, r: &ChemicalScalar) -> ChemicalVector {
        let mut ddn = self.ddn.clone();
        for mut row in ddn.row_iter_mut() {
            row += r.ddn.transpose();
        }
        ChemicalVector::new(
            self.val.add_scalar(r.val),
            self.ddt.add_scalar(r.ddt),
            self.ddp.add_scalar(r.ddp),
            ddn,
        )
    }
}

impl Add<f64> for &ChemicalVector {
    type Output = ChemicalVector;
    fn add(self, r: f64) -> ChemicalVector {
        let mut out = self.clone();
        out.val.add_scalar_mut(r);
        out
    }
}

impl Mul<f64> for &ChemicalVector {
    type Output = ChemicalVector;
    fn mul(self, r: f64) -> ChemicalVector {
        ChemicalVector::new(&self.val * r, &self.ddt * r, &self.ddp * r, &self.ddn * r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mole_fractions_from_composition() {
        let n = DVector::from_vec(vec![1.0, 3.0]);
        let amounts = ChemicalVector::composition(&n);
        let total = amounts.sum();
        let x = amounts.scale(&(1.0 / &total));
        assert_relative_eq!(x.val.sum(), 1.0);
        // intensive: each row of dx/dn is orthogonal to n
        for i in 0..2 {
            assert_relative_eq!(x.ddn.row(i).dot(&n.transpose()), 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn block_embedding() {
        let mut sys = ChemicalVector::zeros(3, 3);
        let local = ChemicalVector::composition(&DVector::from_vec(vec![2.0, 5.0]));
        sys.set_block(1, 1, &local);
        assert_eq!(sys.val[2], 5.0);
        assert_eq!(sys.ddn[(1, 1)], 1.0);
        assert_eq!(sys.ddn[(2, 2)], 1.0);
        assert_eq!(sys.ddn[(1, 2)], 0.0);
    }

    #[test]
    fn dot_and_row_agree() {
        let n = DVector::from_vec(vec![1.0, 2.0, 4.0]);
        let v = ChemicalVector::composition(&n).ln();
        let w = DVector::from_vec(vec![1.0, -1.0, 0.5]);
        let s = v.dot(&w);
        let manual = &(&v.row(0) - &v.row(1)) + &(&v.row(2) * 0.5);
        assert_relative_eq!(s.val, manual.val);
        assert_relative_eq!(s.ddn[2], manual.ddn[2]);
    }
}
