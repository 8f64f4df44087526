//! Scalars that carry their partial derivatives.
//!
//! `ThermoScalar` tracks derivatives with respect to temperature and pressure.
//! `ChemicalScalar` additionally tracks the gradient with respect to the
//! species amounts of the owning system. Arithmetic applies the product,
//! quotient and chain rules, so any expression built from these types yields
//! consistent first derivatives.

use nalgebra::DVector;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Value with derivatives w.r.t. temperature (`ddt`) and pressure (`ddp`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermoScalar {
    pub val: f64,
    pub ddt: f64,
    pub ddp: f64,
}

impl ThermoScalar {
    pub const fn new(val: f64, ddt: f64, ddp: f64) -> Self {
        Self { val, ddt, ddp }
    }

    /// A constant: both derivatives zero.
    pub const fn constant(val: f64) -> Self {
        Self::new(val, 0.0, 0.0)
    }

    /// Temperature as an independent variable (∂T/∂T = 1).
    pub const fn temperature(val: f64) -> Self {
        Self::new(val, 1.0, 0.0)
    }

    /// Pressure as an independent variable (∂P/∂P = 1).
    pub const fn pressure(val: f64) -> Self {
        Self::new(val, 0.0, 1.0)
    }

    /// Apply the chain rule for a function with value `val` and slope `slope`.
    #[inline]
    fn chain(self, val: f64, slope: f64) -> Self {
        Self::new(val, slope * self.ddt, slope * self.ddp)
    }

    pub fn ln(self) -> Self {
        self.chain(self.val.ln(), 1.0 / self.val)
    }

    pub fn exp(self) -> Self {
        let e = self.val.exp();
        self.chain(e, e)
    }

    pub fn sqrt(self) -> Self {
        let s = self.val.sqrt();
        self.chain(s, 0.5 / s)
    }

    pub fn powf(self, p: f64) -> Self {
        self.chain(self.val.powf(p), p * self.val.powf(p - 1.0))
    }

    pub fn powi(self, p: i32) -> Self {
        self.chain(self.val.powi(p), p as f64 * self.val.powi(p - 1))
    }

    /// General power `self^exponent` where both operands carry derivatives.
    pub fn pow(self, exponent: ThermoScalar) -> Self {
        (exponent * self.ln()).exp()
    }

    pub fn abs(self) -> Self {
        if self.val < 0.0 { -self } else { self }
    }
}

impl From<f64> for ThermoScalar {
    fn from(val: f64) -> Self {
        Self::constant(val)
    }
}

impl Neg for ThermoScalar {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.ddt, -self.ddp)
    }
}

impl Add for ThermoScalar {
    type Output = Self;
    fn add(self, r: Self) -> Self {
        Self::new(self.val + r.val, self.ddt + r.ddt, self.ddp + r.ddp)
    }
}

impl Sub for ThermoScalar {
    type Output = Self;
    fn sub(self, r: Self) -> Self {
        Self::new(self.val - r.val, self.ddt - r.ddt, self.ddp - r.ddp)
    }
}

impl Mul for ThermoScalar {
    type Output = Self;
    fn mul(self, r: Self) -> Self {
        Self::new(
            self.val * r.val,
            self.ddt * r.val + self.val * r.ddt,
            self.ddp * r.val + self.val * r.ddp,
        )
    }
}

impl Div for ThermoScalar {
    type Output = Self;
    fn div(self, r: Self) -> Self {
        let q = self.val / r.val;
        Self::new(q, (self.ddt - q * r.ddt) / r.val, (self.ddp - q * r.ddp) / r.val)
    }
}

impl Add<f64> for ThermoScalar {
    type Output = Self;
    fn add(self, r: f64) -> Self {
        Self::new(self.val + r, self.ddt, self.ddp)
    }
}

impl Sub<f64> for ThermoScalar {
    type Output = Self;
    fn sub(self, r: f64) -> Self {
        Self::new(self.val - r, self.ddt, self.ddp)
    }
}

impl Mul<f64> for ThermoScalar {
    type Output = Self;
    fn mul(self, r: f64) -> Self {
        Self::new(self.val * r, self.ddt * r, self.ddp * r)
    }
}

impl Div<f64> for ThermoScalar {
    type Output = Self;
    fn div(self, r: f64) -> Self {
        Self::new(self.val / r, self.ddt / r, self.ddp / r)
    }
}

impl Add<ThermoScalar> for f64 {
    type Output = ThermoScalar;
    fn add(self, r: ThermoScalar) -> ThermoScalar {
        r + self
    }
}

impl Sub<ThermoScalar> for f64 {
    type Output = ThermoScalar;
    fn sub(self, r: ThermoScalar) -> ThermoScalar {
        -r + self
    }
}

impl Mul<ThermoScalar> for f64 {
    type Output = ThermoScalar;
    fn mul(self, r: ThermoScalar) -> ThermoScalar {
        r * self
    }
}

impl Div<ThermoScalar> for f64 {
    type Output = ThermoScalar;
    fn div(self, r: ThermoScalar) -> ThermoScalar {
        ThermoScalar::constant(self) / r
    }
}

impl AddAssign for ThermoScalar {
    fn add_assign(&mut self, r: Self) {
        *self = *self + r;
    }
}

impl SubAssign for ThermoScalar {
    fn sub_assign(&mut self, r: Self) {
        *self = *self - r;
    }
}

impl MulAssign<f64> for ThermoScalar {
    fn mul_assign(&mut self, r: f64) {
        *self = *self * r;
    }
}

/// Value with derivatives w.r.t. temperature, pressure and species amounts.
#[derive(Clone, Debug, PartialEq)]
pub struct ChemicalScalar {
    pub val: f64,
    pub ddt: f64,
    pub ddp: f64,
    pub ddn: DVector<f64>,
}

impl ChemicalScalar {
    pub fn new(val: f64, ddt: f64, ddp: f64, ddn: DVector<f64>) -> Self {
        Self { val, ddt, ddp, ddn }
    }

    /// Zero value and zero derivatives for a system with `nspecies` species.
    pub fn zero(nspecies: usize) -> Self {
        Self::constant(nspecies, 0.0)
    }

    pub fn constant(nspecies: usize, val: f64) -> Self {
        Self::new(val, 0.0, 0.0, DVector::zeros(nspecies))
    }

    /// Lift a thermo scalar; the species gradient is zero.
    pub fn from_thermo(nspecies: usize, t: ThermoScalar) -> Self {
        Self::new(t.val, t.ddt, t.ddp, DVector::zeros(nspecies))
    }

    /// The amount of species `i` as an independent variable.
    pub fn amount(nspecies: usize, i: usize, val: f64) -> Self {
        let mut ddn = DVector::zeros(nspecies);
        ddn[i] = 1.0;
        Self::new(val, 0.0, 0.0, ddn)
    }

    pub fn num_species(&self) -> usize {
        self.ddn.len()
    }

    /// Drop the species gradient.
    pub fn thermo(&self) -> ThermoScalar {
        ThermoScalar::new(self.val, self.ddt, self.ddp)
    }

    #[inline]
    fn chain(&self, val: f64, slope: f64) -> Self {
        Self::new(val, slope * self.ddt, slope * self.ddp, &self.ddn * slope)
    }

    pub fn ln(&self) -> Self {
        self.chain(self.val.ln(), 1.0 / self.val)
    }

    pub fn exp(&self) -> Self {
        let e = self.val.exp();
        self.chain(e, e)
    }

    pub fn sqrt(&self) -> Self {
        let s = self.val.sqrt();
        self.chain(s, 0.5 / s)
    }

    pub fn powf(&self, p: f64) -> Self {
        self.chain(self.val.powf(p), p * self.val.powf(p - 1.0))
    }

    pub fn powi(&self, p: i32) -> Self {
        self.chain(self.val.powi(p), p as f64 * self.val.powi(p - 1))
    }

    pub fn pow(&self, exponent: &ChemicalScalar) -> Self {
        (exponent * &self.ln()).exp()
    }

    pub fn abs(&self) -> Self {
        if self.val < 0.0 { -self } else { self.clone() }
    }
}

impl Neg for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn neg(self) -> ChemicalScalar {
        ChemicalScalar::new(-self.val, -self.ddt, -self.ddp, -&self.ddn)
    }
}

impl Neg for ChemicalScalar {
    type Output = ChemicalScalar;
    fn neg(mut self) -> ChemicalScalar {
        self.val = -self.val;
        self.ddt = -self.ddt;
        self.ddp = -self.ddp;
        self.ddn.neg_mut();
        self
    }
}

impl Add<&ChemicalScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn add(self, r: &ChemicalScalar) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val + r.val,
            self.ddt + r.ddt,
            self.ddp + r.ddp,
            &self.ddn + &r.ddn,
        )
    }
}

impl Sub<&ChemicalScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn sub(self, r: &ChemicalScalar) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val - r.val,
            self.ddt - r.ddt,
            self.ddp - r.ddp,
            &self.ddn - &r.ddn,
        )
    }
}

impl Mul<&ChemicalScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn mul(self, r: &ChemicalScalar) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val * r.val,
            self.ddt * r.val + self.val * r.ddt,
            self.ddp * r.val + self.val * r.ddp,
            &self.ddn * r.val + &r.ddn * self.val,
        )
    }
}

impl Div<&ChemicalScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn div(self, r: &ChemicalScalar) -> ChemicalScalar {
        let q = self.val / r.val;
        ChemicalScalar::new(
            q,
            (self.ddt - q * r.ddt) / r.val,
            (self.ddp - q * r.ddp) / r.val,
            (&self.ddn - &r.ddn * q) / r.val,
        )
    }
}

impl Add<ThermoScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn add(self, r: ThermoScalar) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val + r.val,
            self.ddt + r.ddt,
            self.ddp + r.ddp,
            self.ddn.clone(),
        )
    }
}

impl Sub<ThermoScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn sub(self, r: ThermoScalar) -> ChemicalScalar {
        self + (-r)
    }
}

impl Mul<ThermoScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn mul(self, r: ThermoScalar) -> ChemicalScalar {
        ChemicalScalar::new(
            self.val * r.val,
            self.ddt * r.val + self.val * r.ddt,
            self.ddp * r.val + self.val * r.ddp,
            &self.ddn * r.val,
        )
    }
}

impl Div<ThermoScalar> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn div(self, r: ThermoScalar) -> ChemicalScalar {
        let q = self.val / r.val;
        ChemicalScalar::new(
            q,
            (self.ddt - q * r.ddt) / r.val,
            (self.ddp - q * r.ddp) / r.val,
            &self.ddn / r.val,
        )
    }
}

impl Add<f64> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn add(self, r: f64) -> ChemicalScalar {
        ChemicalScalar::new(self.val + r, self.ddt, self.ddp, self.ddn.clone())
    }
}

impl Sub<f64> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn sub(self, r: f64) -> ChemicalScalar {
        self + (-r)
    }
}

impl Mul<f64> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn mul(self, r: f64) -> ChemicalScalar {
        ChemicalScalar::new(self.val * r, self.ddt * r, self.ddp * r, &self.ddn * r)
    }
}

impl Div<f64> for &ChemicalScalar {
    type Output = ChemicalScalar;
    fn div(self, r: f64) -> ChemicalScalar {
        self * (1.0 / r)
    }
}

impl Add<&ChemicalScalar> for ThermoScalar {
    type Output = ChemicalScalar;
    fn add(self, r: &ChemicalScalar) -> ChemicalScalar {
        r + self
    }
}

impl Sub<&ChemicalScalar> for ThermoScalar {
    type Output = ChemicalScalar;
    fn sub(self, r: &ChemicalScalar) -> ChemicalScalar {
        &(-r) + self
    }
}

impl Mul<&ChemicalScalar> for ThermoScalar {
    type Output = ChemicalScalar;
    fn mul(self, r: &ChemicalScalar) -> ChemicalScalar {
        r * self
    }
}

impl Div<&ChemicalScalar> for ThermoScalar {
    type Output = ChemicalScalar;
    fn div(self, r: &ChemicalScalar) -> ChemicalScalar {
        &ChemicalScalar::from_thermo(r.num_species(), self) / r
    }
}

impl Add<&ChemicalScalar> for f64 {
    type Output = ChemicalScalar;
    fn add(self, r: &ChemicalScalar) -> ChemicalScalar {
        r + self
    }
}

impl Sub<&ChemicalScalar> for f64 {
    type Output = ChemicalScalar;
    fn sub(self, r: &ChemicalScalar) -> ChemicalScalar {
        &(-r) + self
    }
}

impl Mul<&ChemicalScalar> for f64 {
    type Output = ChemicalScalar;
    fn mul(self, r: &ChemicalScalar) -> ChemicalScalar {
        r * self
    }
}

impl Div<&ChemicalScalar> for f64 {
    type Output = ChemicalScalar;
    fn div(self, r: &ChemicalScalar) -> ChemicalScalar {
        let q = self / r.val;
        let slope = -q / r.val;
        ChemicalScalar::new(q, slope * r.ddt, slope * r.ddp, &r.ddn * slope)
    }
}

/// Owned-operand forms delegate to the borrowed implementations.
macro_rules! forward_owned {
    ($($tr:ident $m:ident),*) => {$(
        impl $tr<ChemicalScalar> for ChemicalScalar {
            type Output = ChemicalScalar;
            fn $m(self, r: ChemicalScalar) -> ChemicalScalar {
                (&self).$m(&r)
            }
        }
        impl $tr<&ChemicalScalar> for ChemicalScalar {
            type Output = ChemicalScalar;
            fn $m(self, r: &ChemicalScalar) -> ChemicalScalar {
                (&self).$m(r)
            }
        }
        impl $tr<ChemicalScalar> for &ChemicalScalar {
            type Output = ChemicalScalar;
            fn $m(self, r: ChemicalScalar) -> ChemicalScalar {
                self.$m(&r)
            }
        }
        impl $tr<ThermoScalar> for ChemicalScalar {
            type Output = ChemicalScalar;
            fn $m(self, r: ThermoScalar) -> ChemicalScalar {
                (&self).$m(r)
            }
        }
        impl $tr<f64> for ChemicalScalar {
            type Output = ChemicalScalar;
            fn $m(self, r: f64) -> ChemicalScalar {
                (&self).$m(r)
            }
        }
        impl $tr<ChemicalScalar> for ThermoScalar {
            type Output = ChemicalScalar;
            fn $m(self, r: ChemicalScalar) -> ChemicalScalar {
                self.$m(&r)
            }
        }
        impl $tr<ChemicalScalar> for f64 {
            type Output = ChemicalScalar;
            fn $m(self, r: ChemicalScalar) -> ChemicalScalar {
                self.$m(&r)
            }
        }
    )*};
}

forward_owned!(Add add, Sub sub, Mul mul, Div div);

impl AddAssign<&ChemicalScalar> for ChemicalScalar {
    fn add_assign(&mut self, r: &ChemicalScalar) {
        self.val += r.val;
        self.ddt += r.ddt;
        self.ddp += r.ddp;
        self.ddn += &r.ddn;
    }
}

impl SubAssign<&ChemicalScalar> for ChemicalScalar {
    fn sub_assign(&mut self, r: &ChemicalScalar) {
        self.val -= r.val;
        self.ddt -= r.ddt;
        self.ddp -= r.ddp;
        self.ddn -= &r.ddn;
    }
}

impl MulAssign<f64> for ChemicalScalar {
    fn mul_assign(&mut self, r: f64) {
        self.val *= r;
        self.ddt *= r;
        self.ddp *= r;
        self.ddn *= r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn thermo_product_rule() {
        let t = ThermoScalar::temperature(300.0);
        let p = ThermoScalar::pressure(1e5);
        let f = t * p;
        assert_eq!(f.val, 3e7);
        assert_eq!(f.ddt, 1e5);
        assert_eq!(f.ddp, 300.0);
    }

    #[test]
    fn thermo_quotient_and_log() {
        let t = ThermoScalar::temperature(2.0);
        let f = (1.0 / t).ln();
        assert_relative_eq!(f.val, -(2.0_f64.ln()));
        assert_relative_eq!(f.ddt, -0.5);
    }

    #[test]
    fn chemical_amount_gradient() {
        let n0 = ChemicalScalar::amount(2, 0, 3.0);
        let n1 = ChemicalScalar::amount(2, 1, 1.0);
        let total = &n0 + &n1;
        let x0 = &n0 / &total;
        assert_relative_eq!(x0.val, 0.75);
        // dx0/dn0 = n1/N^2, dx0/dn1 = -n0/N^2
        assert_relative_eq!(x0.ddn[0], 1.0 / 16.0);
        assert_relative_eq!(x0.ddn[1], -3.0 / 16.0);
    }

    #[test]
    fn chemical_times_thermo() {
        let n = ChemicalScalar::amount(1, 0, 2.0);
        let t = ThermoScalar::temperature(10.0);
        let f = &n * t;
        assert_eq!(f.val, 20.0);
        assert_eq!(f.ddt, 2.0);
        assert_eq!(f.ddn[0], 10.0);
    }
}
