//! Gibbs free energy of liquid water (IAPWS-IF97, region 1).
//!
//! Valid for 273.15 K ≤ T ≤ 623.15 K and pressures from saturation up to
//! 100 MPa. Functions are generic over the dual number type so that the
//! caller chooses how many derivatives to carry.

use crate::dual::c;
use crate::error::{ThermoError, ThermoResult};
use num_dual::DualNum;

/// Specific gas constant of water, J/(kg·K).
pub const SPECIFIC_GAS_CONSTANT: f64 = 461.526;
/// Reducing pressure, Pa.
pub const REDUCING_PRESSURE: f64 = 16.53e6;
/// Reducing temperature, K.
pub const REDUCING_TEMPERATURE: f64 = 1386.0;

pub const MIN_TEMPERATURE: f64 = 273.15;
pub const MAX_TEMPERATURE: f64 = 623.15;
pub const MAX_PRESSURE: f64 = 100e6;

/// (I, J, n) of the dimensionless Gibbs free energy γ(π, τ).
const COEFFICIENTS: [(i32, i32, f64); 34] = [
    (0, -2, 0.14632971213167),
    (0, -1, -0.84548187169114),
    (0, 0, -0.37563603672040e1),
    (0, 1, 0.33855169168385e1),
    (0, 2, -0.95791963387872),
    (0, 3, 0.15772038513228),
    (0, 4, -0.16616417199501e-1),
    (0, 5, 0.81214629983568e-3),
    (1, -9, 0.28319080123804e-3),
    (1, -7, -0.60706301565874e-3),
    (1, -1, -0.18990068218419e-1),
    (1, 0, -0.32529748770505e-1),
    (1, 1, -0.21841717175414e-1),
    (1, 3, -0.52838357969930e-4),
    (2, -3, -0.47184321073267e-3),
    (2, 0, -0.30001780793026e-3),
    (2, 1, 0.47661393906987e-4),
    (2, 3, -0.44141845330846e-5),
    (2, 17, -0.72694996297594e-15),
    (3, -4, -0.31679644845054e-4),
    (3, 0, -0.28270797985312e-5),
    (3, 6, -0.85205128120103e-9),
    (4, -5, -0.22425281908000e-5),
    (4, -2, -0.65171222895601e-6),
    (4, 10, -0.14340729937924e-12),
    (5, -8, -0.40516996860117e-6),
    (8, -11, -0.12734301741641e-8),
    (8, -6, -0.17424871230634e-9),
    (21, -29, -0.68762131295531e-18),
    (23, -31, 0.14478307828521e-19),
    (29, -38, 0.26335781662795e-22),
    (30, -39, -0.11947622640071e-22),
    (31, -40, 0.18228094581404e-23),
    (32, -41, -0.93537087292458e-25),
];

/// Reject states outside the region of validity.
pub fn check_domain(t: f64, p: f64) -> ThermoResult<()> {
    if !t.is_finite() || !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&t) {
        return Err(ThermoError::OutOfRange {
            what: "water temperature (K)",
            value: t,
        });
    }
    if !p.is_finite() || p <= 0.0 || p > MAX_PRESSURE {
        return Err(ThermoError::OutOfRange {
            what: "water pressure (Pa)",
            value: p,
        });
    }
    Ok(())
}

fn reduced<D: DualNum<f64> + Copy>(t: D, p: D) -> (D, D) {
    let pi = p * (1.0 / REDUCING_PRESSURE);
    let tau = t.recip() * REDUCING_TEMPERATURE;
    (c::<D>(7.1) - pi, tau - 1.222)
}

/// Specific Gibbs free energy, J/kg.
pub fn specific_gibbs_energy<D: DualNum<f64> + Copy>(t: D, p: D) -> D {
    let (a, b) = reduced(t, p);
    let mut gamma = c::<D>(0.0);
    for &(i, j, n) in COEFFICIENTS.iter() {
        gamma += a.powi(i) * b.powi(j) * n;
    }
    t * gamma * SPECIFIC_GAS_CONSTANT
}

/// Specific volume, m³/kg.
///
/// Written from the analytic pressure derivative of γ so that the result
/// can itself be differentiated to third order.
pub fn specific_volume<D: DualNum<f64> + Copy>(t: D, p: D) -> D {
    let (a, b) = reduced(t, p);
    let mut gamma_pi = c::<D>(0.0);
    for &(i, j, n) in COEFFICIENTS.iter().filter(|(i, _, _)| *i > 0) {
        gamma_pi -= a.powi(i - 1) * b.powi(j) * (n * i as f64);
    }
    t * gamma_pi * (SPECIFIC_GAS_CONSTANT / REDUCING_PRESSURE)
}

/// Density, kg/m³.
pub fn density<D: DualNum<f64> + Copy>(t: D, p: D) -> D {
    specific_volume(t, p).recip()
}
