//! Cubic equations of state for gaseous mixtures.
//!
//! All four models share the generic form
//!
//! ```text
//! P = RT/(V − b) − a(T)/((V + εb)(V + σb))
//! ```
//!
//! and differ only in (σ, ε, Ω, Ψ) and the α(T) function.

use crate::error::{ThermoError, ThermoResult};
use crate::mixture::mole_fractions;
use crate::species::{CriticalProperties, Species};
use nalgebra::{DMatrix, DVector};
use rk_core::constants::GAS_CONSTANT;
use rk_core::{ChemicalScalar, ChemicalVector, ThermoScalar};

const MAX_ITERATIONS: usize = 100;
const Z_TOLERANCE: f64 = 1e-14;
/// Relative temperature step of the residual heat capacity difference.
const CP_STEP: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubicEosKind {
    VanDerWaals,
    RedlichKwong,
    SoaveRedlichKwong,
    PengRobinson,
}

impl CubicEosKind {
    fn sigma(self) -> f64 {
        match self {
            Self::VanDerWaals => 0.0,
            Self::RedlichKwong | Self::SoaveRedlichKwong => 1.0,
            Self::PengRobinson => 1.0 + std::f64::consts::SQRT_2,
        }
    }

    fn epsilon(self) -> f64 {
        match self {
            Self::PengRobinson => 1.0 - std::f64::consts::SQRT_2,
            _ => 0.0,
        }
    }

    fn omega(self) -> f64 {
        match self {
            Self::VanDerWaals => 1.0 / 8.0,
            Self::RedlichKwong | Self::SoaveRedlichKwong => 0.08664,
            Self::PengRobinson => 0.07780,
        }
    }

    fn psi(self) -> f64 {
        match self {
            Self::VanDerWaals => 27.0 / 64.0,
            Self::RedlichKwong | Self::SoaveRedlichKwong => 0.42748,
            Self::PengRobinson => 0.45724,
        }
    }

    /// α(Tr, ω) carrying its temperature derivative.
    fn alpha(self, tr: ThermoScalar, omega: f64) -> ThermoScalar {
        match self {
            Self::VanDerWaals => ThermoScalar::constant(1.0),
            Self::RedlichKwong => tr.powf(-0.5),
            Self::SoaveRedlichKwong | Self::PengRobinson => {
                let m = if self == Self::SoaveRedlichKwong {
                    0.480 + 1.574 * omega - 0.176 * omega * omega
                } else {
                    0.37464 + 1.54226 * omega - 0.26992 * omega * omega
                };
                let s = 1.0 + m * (1.0 - tr.sqrt());
                s * s
            }
        }
    }
}

/// Output of a cubic EOS evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicEosResult {
    pub compressibility_factor: ChemicalScalar,
    pub ln_fugacity_coefficients: ChemicalVector,
    /// m³/mol
    pub molar_volume: ChemicalScalar,
    /// J/mol
    pub residual_molar_gibbs_energy: ChemicalScalar,
    /// J/mol
    pub residual_molar_enthalpy: ChemicalScalar,
    /// J/(mol·K)
    pub residual_molar_heat_capacity_cp: ChemicalScalar,
    /// J/(mol·K)
    pub residual_molar_heat_capacity_cv: ChemicalScalar,
}

/// Mixture of species described by one cubic EOS.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicEos {
    kind: CubicEosKind,
    critical: Vec<CriticalProperties>,
    interaction: DMatrix<f64>,
}

/// Solved mixture state at one (T, P, x).
struct Solved {
    z: ChemicalScalar,
    beta: ChemicalScalar,
    q: ChemicalScalar,
    integral: ChemicalScalar,
    amix: ChemicalScalar,
    bmix: ChemicalScalar,
    abar: ChemicalVector,
    b: DVector<f64>,
}

impl CubicEos {
    pub fn new(species: &[Species], kind: CubicEosKind) -> ThermoResult<Self> {
        let critical = species
            .iter()
            .map(|s| {
                s.critical_properties().ok_or_else(|| ThermoError::InvalidArg {
                    what: format!("species {} has no critical properties", s.name()),
                })
            })
            .collect::<ThermoResult<Vec<_>>>()?;
        for (s, c) in species.iter().zip(&critical) {
            if !(c.temperature > 0.0 && c.pressure > 0.0 && c.acentric_factor.is_finite()) {
                return Err(ThermoError::InvalidArg {
                    what: format!("invalid critical properties of {}", s.name()),
                });
            }
        }
        let n = critical.len();
        Ok(Self {
            kind,
            critical,
            interaction: DMatrix::zeros(n, n),
        })
    }

    /// Set the symmetric binary interaction parameter kᵢⱼ.
    pub fn with_interaction(mut self, i: usize, j: usize, k: f64) -> Self {
        self.interaction[(i, j)] = k;
        self.interaction[(j, i)] = k;
        self
    }

    pub fn kind(&self) -> CubicEosKind {
        self.kind
    }

    pub fn num_species(&self) -> usize {
        self.critical.len()
    }

    pub fn evaluate(&self, t: f64, p: f64, n: &DVector<f64>) -> ThermoResult<CubicEosResult> {
        if !(t > 0.0 && p > 0.0) {
            return Err(ThermoError::OutOfRange {
                what: "cubic EOS temperature/pressure",
                value: if t > 0.0 { p } else { t },
            });
        }
        let x = mole_fractions(n);
        let s = self.solve(t, p, &x)?;
        let ns = x.num_species();
        let rt = ThermoScalar::temperature(t) * GAS_CONSTANT;
        let pressure = ThermoScalar::pressure(p);
        let (sigma, eps) = (self.kind.sigma(), self.kind.epsilon());

        let zm1 = &s.z - 1.0;
        let ln_z_beta = (&s.z - &s.beta).ln();
        let mut ln_phi = ChemicalVector::zeros(x.len(), ns);
        for i in 0..x.len() {
            let bi_b = s.b[i] / &s.bmix;
            let qi = &s.q * &(&(&(&s.abar.row(i) * 2.0) / &s.amix) - &bi_b);
            let v = &(&(&bi_b * &zm1) - &ln_z_beta) - &(&qi * &s.integral);
            ln_phi.set_row(i, &v);
        }

        let molar_volume = &s.z * (rt / pressure);
        let gres = &(&(&zm1 - &ln_z_beta) - &(&s.q * &s.integral)) * rt;
        let hres = ChemicalScalar::constant(ns, self.residual_enthalpy(t, &s));

        let h = CP_STEP * t;
        let hp = self.residual_enthalpy(t + h, &self.solve(t + h, p, &x)?);
        let hm = self.residual_enthalpy(t - h, &self.solve(t - h, p, &x)?);
        let cpres = ChemicalScalar::constant(ns, (hp - hm) / (2.0 * h));
        let cvres = ChemicalScalar::constant(ns, cpres.val + self.heat_capacity_gap_departure(t, p, &s));
        tracing::trace!(z = s.z.val, sigma, eps, "cubic EOS evaluated");

        Ok(CubicEosResult {
            compressibility_factor: s.z,
            ln_fugacity_coefficients: ln_phi,
            molar_volume,
            residual_molar_gibbs_energy: gres,
            residual_molar_enthalpy: hres,
            residual_molar_heat_capacity_cp: cpres,
            residual_molar_heat_capacity_cv: cvres,
        })
    }

    /// `R + T(∂P/∂T)²/(∂P/∂V)`, the amount by which Cp − Cv falls short of
    /// its ideal-gas value R, value only.
    fn heat_capacity_gap_departure(&self, t: f64, p: f64, s: &Solved) -> f64 {
        let (sigma, eps) = (self.kind.sigma(), self.kind.epsilon());
        let r = GAS_CONSTANT;
        let v = s.z.val * r * t / p;
        let (a, dadt, b) = (s.amix.val, s.amix.ddt, s.bmix.val);
        let d = (v + eps * b) * (v + sigma * b);
        let dpdt = r / (v - b) - dadt / d;
        let dpdv = -r * t / ((v - b) * (v - b)) + a * (2.0 * v + (eps + sigma) * b) / (d * d);
        r + t * dpdt * dpdt / dpdv
    }

    /// `Hᴿ = RT(Z − 1) + (T·a' − a)/b · I`, value only.
    fn residual_enthalpy(&self, t: f64, s: &Solved) -> f64 {
        GAS_CONSTANT * t * (s.z.val - 1.0)
            + (t * s.amix.ddt - s.amix.val) / s.bmix.val * s.integral.val
    }

    fn solve(&self, t: f64, p: f64, x: &ChemicalVector) -> ThermoResult<Solved> {
        let kind = self.kind;
        let (sigma, eps) = (kind.sigma(), kind.epsilon());
        let nsp = self.critical.len();
        let ns = x.num_species();
        let r = GAS_CONSTANT;
        let temperature = ThermoScalar::temperature(t);

        let mut a = Vec::with_capacity(nsp);
        let mut b = DVector::zeros(nsp);
        for (i, c) in self.critical.iter().enumerate() {
            let tr = temperature / c.temperature;
            let alpha = kind.alpha(tr, c.acentric_factor);
            a.push(alpha * (kind.psi() * r * r * c.temperature * c.temperature / c.pressure));
            b[i] = kind.omega() * r * c.temperature / c.pressure;
        }

        let mut abar = ChemicalVector::zeros(nsp, ns);
        for i in 0..nsp {
            let mut sum = ChemicalScalar::zero(ns);
            for j in 0..nsp {
                let aij = (a[i] * a[j]).sqrt() * (1.0 - self.interaction[(i, j)]);
                sum += &(&x.row(j) * aij);
            }
            abar.set_row(i, &sum);
        }
        let amix = abar.component_mul(x).sum();
        let bmix = x.dot(&b);

        let rt = temperature * r;
        let beta = &bmix * (ThermoScalar::pressure(p) / rt);
        let q = &amix / &(&bmix * rt);
        let (bv, qv) = (beta.val, q.val);

        let f = |z: f64| (z + eps * bv) * (z + sigma * bv) * (z - 1.0 - bv) + qv * bv * (z - bv);
        let fz = |z: f64| {
            (z + sigma * bv) * (z - 1.0 - bv)
                + (z + eps * bv) * (z - 1.0 - bv)
                + (z + eps * bv) * (z + sigma * bv)
                + qv * bv
        };

        // Newton from the right of all roots descends monotonically onto the
        // largest (vapour-like) root.
        let c2 = (eps + sigma) * bv - 1.0 - bv;
        let c1 = eps * sigma * bv * bv - (1.0 + bv) * (eps + sigma) * bv + qv * bv;
        let c0 = -(1.0 + bv) * eps * sigma * bv * bv - qv * bv * bv;
        let mut zv = 1.0 + c2.abs().max(c1.abs()).max(c0.abs());
        let mut converged = false;
        for _ in 0..MAX_ITERATIONS {
            let dz = f(zv) / fz(zv);
            zv -= dz;
            if dz.abs() <= Z_TOLERANCE * zv.abs().max(1.0) {
                converged = true;
                break;
            }
        }
        if !converged || !zv.is_finite() || zv <= bv {
            return Err(ThermoError::ConvergenceFailed {
                what: "cubic EOS compressibility factor",
            });
        }

        // Implicit derivatives of Z(β, q).
        let fzv = fz(zv);
        let fb = eps * (zv + sigma * bv) * (zv - 1.0 - bv)
            + sigma * (zv + eps * bv) * (zv - 1.0 - bv)
            - (zv + eps * bv) * (zv + sigma * bv)
            + qv * (zv - 2.0 * bv);
        let fq = bv * (zv - bv);
        let mut z = &(&beta * (-fb / fzv)) + &(&q * (-fq / fzv));
        z.val = zv;

        let integral = if sigma == eps {
            &beta / &(&z + &(&beta * eps))
        } else {
            (&(&z + &(&beta * sigma)) / &(&z + &(&beta * eps))).ln() * (1.0 / (sigma - eps))
        };

        Ok(Solved {
            z,
            beta,
            q,
            integral,
            amix,
            bmix,
            abar,
            b,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use approx::assert_relative_eq;

    const KINDS: [CubicEosKind; 4] = [
        CubicEosKind::VanDerWaals,
        CubicEosKind::RedlichKwong,
        CubicEosKind::SoaveRedlichKwong,
        CubicEosKind::PengRobinson,
    ];

    fn gases(names: &[&str]) -> Vec<Species> {
        names.iter().map(|n| catalog::species(n).unwrap()).collect()
    }

    #[test]
    fn low_pressure_is_nearly_ideal() {
        let eos = CubicEos::new(&gases(&["CO2(g)", "CH4(g)"]), CubicEosKind::PengRobinson).unwrap();
        let res = eos.evaluate(298.15, 10.0, &DVector::from_vec(vec![0.5, 0.5])).unwrap();
        assert_relative_eq!(res.compressibility_factor.val, 1.0, epsilon = 1e-5);
        assert!(res.ln_fugacity_coefficients.val.amax() < 1e-5);
    }

    #[test]
    fn compressed_co2_is_non_ideal() {
        let n = DVector::from_vec(vec![1.0]);
        for kind in KINDS {
            let eos = CubicEos::new(&gases(&["CO2(g)"]), kind).unwrap();
            let res = eos.evaluate(350.0, 50e5, &n).unwrap();
            let z = res.compressibility_factor.val;
            assert!(z > 0.4 && z < 1.0, "{kind:?}: Z = {z}");
            assert!(res.ln_fugacity_coefficients.val[0] < 0.0);
            // pure-species fugacity coefficient agrees with the residual Gibbs energy
            assert_relative_eq!(
                res.ln_fugacity_coefficients.val[0],
                res.residual_molar_gibbs_energy.val / (GAS_CONSTANT * 350.0),
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn z_derivatives_match_finite_differences() {
        let eos = CubicEos::new(&gases(&["CO2(g)", "CH4(g)", "N2(g)"]), CubicEosKind::PengRobinson).unwrap();
        let n = DVector::from_vec(vec![0.6, 0.3, 0.1]);
        let (t, p) = (320.0, 80e5);
        let res = eos.evaluate(t, p, &n).unwrap();

        let zt = rk_core::fd::central(|x| eos.evaluate(x, p, &n).unwrap().compressibility_factor.val, t);
        assert_relative_eq!(res.compressibility_factor.ddt, zt, max_relative = 1e-5);
        let zp = rk_core::fd::central(|x| eos.evaluate(t, x, &n).unwrap().compressibility_factor.val, p);
        assert_relative_eq!(res.compressibility_factor.ddp, zp, max_relative = 1e-5);

        let grad = rk_core::fd::central_gradient(
            |x| eos.evaluate(t, p, x).unwrap().ln_fugacity_coefficients.val[0],
            &n,
        );
        for j in 0..3 {
            assert_relative_eq!(res.ln_fugacity_coefficients.ddn[(0, j)], grad[j], epsilon = 1e-6);
        }
    }

    #[test]
    fn fugacity_coefficients_satisfy_gibbs_duhem() {
        let eos = CubicEos::new(&gases(&["CO2(g)", "CH4(g)"]), CubicEosKind::SoaveRedlichKwong).unwrap();
        let n = DVector::from_vec(vec![0.7, 0.3]);
        let res = eos.evaluate(300.0, 40e5, &n).unwrap();
        for j in 0..2 {
            let s: f64 = (0..2).map(|i| n[i] * res.ln_fugacity_coefficients.ddn[(i, j)]).sum();
            assert!(s.abs() < 1e-10, "Σ nᵢ ∂lnφᵢ/∂nⱼ = {s}");
        }
    }

    #[test]
    fn species_without_critical_data_is_rejected() {
        let s = vec![catalog::species("Calcite").unwrap()];
        assert!(CubicEos::new(&s, CubicEosKind::PengRobinson).is_err());
    }

    #[test]
    fn residual_heat_capacity_is_positive_near_saturation() {
        let eos = CubicEos::new(&gases(&["CO2(g)"]), CubicEosKind::PengRobinson).unwrap();
        let res = eos.evaluate(310.0, 60e5, &DVector::from_vec(vec![1.0])).unwrap();
        assert!(res.residual_molar_heat_capacity_cp.val > 0.0);
        assert!(res.residual_molar_enthalpy.val < 0.0);
        // dense fluid: Cp − Cv well above R, so Cvᴿ sits below Cpᴿ
        let cvres = res.residual_molar_heat_capacity_cv.val;
        assert!(cvres.is_finite() && cvres < res.residual_molar_heat_capacity_cp.val, "Cvᴿ = {cvres}");
    }

    #[test]
    fn residual_heat_capacities_vanish_for_a_dilute_gas() {
        let eos = CubicEos::new(&gases(&["CO2(g)"]), CubicEosKind::PengRobinson).unwrap();
        let res = eos.evaluate(600.0, 1.0, &DVector::from_vec(vec![1.0])).unwrap();
        assert!(res.residual_molar_heat_capacity_cp.val.abs() < 1e-3);
        assert!(res.residual_molar_heat_capacity_cv.val.abs() < 1e-3);
    }
}
