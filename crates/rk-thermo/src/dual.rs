//! Standard-state properties from a Gibbs energy function of (T, P).
//!
//! Every standard-state model in this crate is written once as a Gibbs
//! energy function generic over [`DualNum`]. Evaluating it with the nested
//! hyper-dual type [`TpDual`] yields all partial derivatives up to third
//! order in T and P, from which the remaining properties and their first
//! T/P derivatives follow through exact thermodynamic identities.

use num_dual::{Dual3, Dual3_64, DualNum};
use rk_core::ThermoScalar;

/// Outer dual carries the temperature direction, inner dual the pressure.
pub type TpDual = Dual3<Dual3_64, f64>;

/// Seed temperature (K) and pressure (Pa) as independent dual variables.
pub fn seed(t: f64, p: f64) -> (TpDual, TpDual) {
    let one = Dual3_64::from(1.0);
    let zero = Dual3_64::from(0.0);
    let t = TpDual::new(Dual3_64::from(t), one, zero, zero);
    let p = TpDual::new(Dual3_64::new(p, 1.0, 0.0, 0.0), zero, zero, zero);
    (t, p)
}

/// Value and first T/P derivatives of a dual result.
pub fn thermo_scalar(d: &TpDual) -> ThermoScalar {
    ThermoScalar::new(d.re.re, d.v1.re, d.re.v1)
}

/// Mixed partial derivatives of a function up to third order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GibbsDerivatives {
    pub g: f64,
    pub gt: f64,
    pub gp: f64,
    pub gtt: f64,
    pub gtp: f64,
    pub gpp: f64,
    pub gttt: f64,
    pub gttp: f64,
    pub gtpp: f64,
    pub gppp: f64,
}

impl From<&TpDual> for GibbsDerivatives {
    fn from(d: &TpDual) -> Self {
        Self {
            g: d.re.re,
            gp: d.re.v1,
            gpp: d.re.v2,
            gppp: d.re.v3,
            gt: d.v1.re,
            gtp: d.v1.v1,
            gtpp: d.v1.v2,
            gtt: d.v2.re,
            gttp: d.v2.v1,
            gttt: d.v3.re,
        }
    }
}

/// Standard molar properties of a species, each with T and P derivatives.
///
/// Units: J/mol, J/(mol·K) and m³/mol.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeciesThermoState {
    pub gibbs_energy: ThermoScalar,
    pub enthalpy: ThermoScalar,
    pub entropy: ThermoScalar,
    pub volume: ThermoScalar,
    pub heat_capacity_cp: ThermoScalar,
    pub heat_capacity_cv: ThermoScalar,
    pub internal_energy: ThermoScalar,
    pub helmholtz_energy: ThermoScalar,
}

impl SpeciesThermoState {
    /// Derive every property from the Gibbs energy `g` evaluated at (t, p).
    ///
    /// `enthalpy_offset` is the constant `H − (G + T·S)` of the tabulation
    /// convention (apparent energies of formation differ from H − TS by the
    /// entropy of the elements).
    pub fn from_gibbs(g: &TpDual, t: f64, p: f64, enthalpy_offset: f64) -> Self {
        let d = GibbsDerivatives::from(g);
        let tk = ThermoScalar::temperature(t);
        let pa = ThermoScalar::pressure(p);

        let gibbs_energy = ThermoScalar::new(d.g, d.gt, d.gp);
        let entropy = ThermoScalar::new(-d.gt, -d.gtt, -d.gtp);
        let volume = ThermoScalar::new(d.gp, d.gtp, d.gpp);
        let enthalpy = ThermoScalar::new(
            d.g - t * d.gt + enthalpy_offset,
            -t * d.gtt,
            d.gp - t * d.gtp,
        );
        let heat_capacity_cp = ThermoScalar::new(-t * d.gtt, -d.gtt - t * d.gttt, -t * d.gttp);

        // Cv = Cp + T·(∂V/∂T)²/(∂V/∂P); incompressible species have Cv = Cp.
        let vt = ThermoScalar::new(d.gtp, d.gttp, d.gtpp);
        let vp = ThermoScalar::new(d.gpp, d.gtpp, d.gppp);
        let heat_capacity_cv = if vp.val != 0.0 {
            heat_capacity_cp + tk * vt * vt / vp
        } else {
            heat_capacity_cp
        };

        let internal_energy = enthalpy - pa * volume;
        let helmholtz_energy = internal_energy - tk * entropy;

        Self {
            gibbs_energy,
            enthalpy,
            entropy,
            volume,
            heat_capacity_cp,
            heat_capacity_cv,
            internal_energy,
            helmholtz_energy,
        }
    }
}

/// Evaluate a generic Gibbs function at (t, p).
pub fn evaluate<F>(t: f64, p: f64, f: F) -> TpDual
where
    F: FnOnce(TpDual, TpDual) -> TpDual,
{
    let (td, pd) = seed(t, p);
    f(td, pd)
}

/// Generic `D` from a plain number.
#[inline]
pub(crate) fn c<D: DualNum<f64>>(x: f64) -> D {
    D::from(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample<D: DualNum<f64> + Copy>(t: D, p: D) -> D {
        // G = 3 + 2T + 0.5T² + 1e-5 P + 1e-8 P T - 1e-14 P²
        t * 2.0 + t * t * 0.5 + p * 1e-5 + p * t * 1e-8 - p * p * 1e-14 + 3.0
    }

    #[test]
    fn derivatives_extracted() {
        let (t, p) = (300.0, 2e5);
        let g = evaluate(t, p, sample);
        let d = GibbsDerivatives::from(&g);
        assert_relative_eq!(d.gt, 2.0 + t + 1e-8 * p, max_relative = 1e-12);
        assert_relative_eq!(d.gp, 1e-5 + 1e-8 * t - 2e-14 * p, max_relative = 1e-12);
        assert_relative_eq!(d.gtt, 1.0, max_relative = 1e-12);
        assert_relative_eq!(d.gtp, 1e-8, max_relative = 1e-12);
        assert_relative_eq!(d.gpp, -2e-14, max_relative = 1e-12);
        assert_eq!(d.gttt, 0.0);
    }

    #[test]
    fn identities_hold() {
        let (t, p) = (350.0, 5e5);
        let g = evaluate(t, p, sample);
        let s = SpeciesThermoState::from_gibbs(&g, t, p, 0.0);
        // G = H − TS
        assert_relative_eq!(
            s.gibbs_energy.val,
            s.enthalpy.val - t * s.entropy.val,
            max_relative = 1e-12
        );
        // Cp = T ∂S/∂T
        assert_relative_eq!(s.heat_capacity_cp.val, t * s.entropy.ddt, max_relative = 1e-12);
        // ∂H/∂T = Cp
        assert_relative_eq!(s.enthalpy.ddt, s.heat_capacity_cp.val, max_relative = 1e-12);
        assert!(s.heat_capacity_cv.val <= s.heat_capacity_cp.val);
        // A = G − PV
        assert_relative_eq!(
            s.helmholtz_energy.val,
            s.gibbs_energy.val - p * s.volume.val,
            max_relative = 1e-10
        );
    }
}
