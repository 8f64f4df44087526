//! Dielectric constant of water and the Born functions.

use crate::dual::c;
use num_dual::DualNum;

/// Johnson and Norton (1991) coefficients a1..a10.
const JOHNSON_NORTON: [f64; 10] = [
    14.70333593,
    212.8462733,
    -115.4445173,
    19.55210915,
    -83.30347980,
    32.13240048,
    -6.694098645,
    -37.86202045,
    68.87359646,
    -27.29401652,
];

/// Relative permittivity ε(T, ρ) with T in K and ρ in kg/m³.
pub fn dielectric_constant<D: DualNum<f64> + Copy>(t: D, rho: D) -> D {
    let a = &JOHNSON_NORTON;
    let th = t * (1.0 / 298.15);
    let rh = rho * 1e-3;
    let inv = th.recip();
    let k1 = inv * a[0];
    let k2 = inv * a[1] + th * a[3] + a[2];
    let k3 = inv * a[4] + th * a[5] + th * th * a[6];
    let k4 = inv * inv * a[7] + inv * a[8] + a[9];
    c::<D>(1.0) + k1 * rh + k2 * rh.powi(2) + k3 * rh.powi(3) + k4 * rh.powi(4)
}

/// Born function Z = −1/ε.
pub fn born_z<D: DualNum<f64> + Copy>(epsilon: D) -> D {
    -epsilon.recip()
}
