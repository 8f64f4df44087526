//! Finite-difference derivative approximations.
//!
//! Used to cross-check analytic derivatives of property models.

use nalgebra::DVector;

/// Relative step used by one-sided differences.
pub const FORWARD_EPS: f64 = 1e-8;
/// Relative step used by central differences.
pub const CENTRAL_EPS: f64 = 1e-6;

fn step(x: f64, eps: f64) -> f64 {
    eps * x.abs().max(1.0)
}

pub fn forward<F: Fn(f64) -> f64>(f: F, x: f64) -> f64 {
    let h = step(x, FORWARD_EPS);
    (f(x + h) - f(x)) / h
}

pub fn backward<F: Fn(f64) -> f64>(f: F, x: f64) -> f64 {
    let h = step(x, FORWARD_EPS);
    (f(x) - f(x - h)) / h
}

pub fn central<F: Fn(f64) -> f64>(f: F, x: f64) -> f64 {
    let h = step(x, CENTRAL_EPS);
    (f(x + h) - f(x - h)) / (2.0 * h)
}

/// Central-difference gradient of a scalar function of a vector.
pub fn central_gradient<F: Fn(&DVector<f64>) -> f64>(f: F, x: &DVector<f64>) -> DVector<f64> {
    let mut grad = DVector::zeros(x.len());
    let mut xp = x.clone();
    for i in 0..x.len() {
        let h = step(x[i], CENTRAL_EPS);
        xp[i] = x[i] + h;
        let fp = f(&xp);
        xp[i] = x[i] - h;
        let fm = f(&xp);
        xp[i] = x[i];
        grad[i] = (fp - fm) / (2.0 * h);
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differences_of_a_cubic() {
        let f = |x: f64| x * x * x;
        assert!((central(f, 2.0) - 12.0).abs() < 1e-6);
        assert!((forward(f, 2.0) - 12.0).abs() < 1e-5);
        assert!((backward(f, 2.0) - 12.0).abs() < 1e-5);
    }

    #[test]
    fn gradient_of_quadratic_form() {
        let x = DVector::from_vec(vec![1.0, -2.0]);
        let g = central_gradient(|v| v[0] * v[0] + 3.0 * v[0] * v[1], &x);
        assert!((g[0] - (2.0 - 6.0)).abs() < 1e-6);
        assert!((g[1] - 3.0).abs() < 1e-6);
    }
}
