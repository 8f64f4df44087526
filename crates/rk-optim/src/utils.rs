//! Step-length helpers, tolerant comparisons and one-dimensional minimizers.

use nalgebra::{DMatrix, DVector};

/// Largest positive α with p + α·dp reaching zero in some component, or
/// infinity if no component decreases to zero.
pub fn largest_step(p: &DVector<f64>, dp: &DVector<f64>) -> f64 {
    p.iter()
        .zip(dp.iter())
        .map(|(&pi, &dpi)| -pi / dpi)
        .filter(|&a| a > 0.0)
        .fold(f64::INFINITY, f64::min)
}

/// Largest α ≤ 1 keeping p + α·dp ≥ (1 − τ)·p.
pub fn fraction_to_the_boundary(p: &DVector<f64>, dp: &DVector<f64>, tau: f64) -> f64 {
    p.iter()
        .zip(dp.iter())
        .filter(|&(_, &dpi)| dpi < 0.0)
        .map(|(&pi, &dpi)| -tau * pi / dpi)
        .fold(1.0, f64::min)
}

/// `lhs < rhs` up to ten ulps of `baseval`.
pub fn less_than(lhs: f64, rhs: f64, baseval: f64) -> bool {
    lhs < rhs + 10.0 * f64::EPSILON * baseval.abs()
}

/// `lhs > rhs` up to ten ulps of `baseval`.
pub fn greater_than(lhs: f64, rhs: f64, baseval: f64) -> bool {
    lhs > rhs - 10.0 * f64::EPSILON * baseval.abs()
}

/// BFGS approximation of the inverse Hessian built from successive
/// (x, g) pairs.
#[derive(Clone, Debug, Default)]
pub struct Bfgs {
    x0: DVector<f64>,
    g0: DVector<f64>,
    h: DMatrix<f64>,
}

impl Bfgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a new point and gradient and returns the updated approximation.
    ///
    /// The first call returns diag(x). Pairs with non-positive curvature
    /// dx·dg leave the approximation unchanged.
    pub fn update(&mut self, x: &DVector<f64>, g: &DVector<f64>) -> &DMatrix<f64> {
        if self.x0.len() != x.len() {
            self.x0 = x.clone();
            self.g0 = g.clone();
            self.h = DMatrix::from_diagonal(x);
            return &self.h;
        }
        let dx = x - &self.x0;
        let dg = g - &self.g0;
        self.x0 = x.clone();
        self.g0 = g.clone();

        let a = dx.dot(&dg);
        if a <= 0.0 {
            return &self.h;
        }
        let n = x.len();
        let identity = DMatrix::<f64>::identity(n, n);
        let left = &identity - &dx * dg.transpose() / a;
        let right = &identity - &dg * dx.transpose() / a;
        self.h = left * &self.h * right + &dx * dx.transpose() / a;
        &self.h
    }
}

const GOLDEN: f64 = 0.618_033_988_75;

/// Minimizes a unimodal `f` on [0, 1] by golden-section search.
pub fn minimize_golden_section<F: Fn(f64) -> f64>(f: F, tol: f64) -> f64 {
    let (mut a, mut b) = (0.0_f64, 1.0_f64);
    let mut c = 1.0 - GOLDEN;
    let mut d = GOLDEN;
    let mut fc = f(c);
    let mut fd = f(d);
    while (c - d).abs() > tol {
        if fc < fd {
            b = d;
            d = c;
            c = b - GOLDEN * (b - a);
            fd = fc;
            fc = f(c);
        } else {
            a = c;
            c = d;
            d = a + GOLDEN * (b - a);
            fc = fd;
            fd = f(d);
        }
    }
    0.5 * (a + b)
}

/// Minimizes a unimodal `f` on [a, b] by golden-section search.
pub fn minimize_golden_section_in<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, tol: f64) -> f64 {
    let t = minimize_golden_section(|t| f(a + t * (b - a)), tol);
    a + t * (b - a)
}

/// Brent's method (parabolic interpolation with golden-section fallback) on
/// [min, max]. Returns the best abscissa found.
pub fn minimize_brent<F: Fn(f64) -> f64>(
    f: F,
    mut min: f64,
    mut max: f64,
    tolerance: f64,
    max_iterations: usize,
) -> f64 {
    const CGOLD: f64 = 0.381_966_0;

    let (mut x, mut w, mut v) = (max, max, max);
    let mut fx = f(x);
    let (mut fw, mut fv) = (fx, fx);
    let (mut delta, mut delta2) = (0.0_f64, 0.0_f64);

    for _ in 0..max_iterations {
        let mid = 0.5 * (min + max);
        let fract1 = tolerance * x.abs() + tolerance / 4.0;
        let fract2 = 2.0 * fract1;
        if (x - mid).abs() <= fract2 - 0.5 * (max - min) {
            break;
        }

        if delta2.abs() > fract1 {
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let td = delta2;
            delta2 = delta;
            if p.abs() >= (0.5 * q * td).abs() || p <= q * (min - x) || p >= q * (max - x) {
                delta2 = if x >= mid { min - x } else { max - x };
                delta = CGOLD * delta2;
            } else {
                delta = p / q;
                let u = x + delta;
                if (u - min) < fract2 || (max - u) < fract2 {
                    delta = if mid - x < 0.0 { -fract1.abs() } else { fract1.abs() };
                }
            }
        } else {
            delta2 = if x >= mid { min - x } else { max - x };
            delta = CGOLD * delta2;
        }

        let u = if delta.abs() >= fract1 {
            x + delta
        } else if delta > 0.0 {
            x + fract1.abs()
        } else {
            x - fract1.abs()
        };
        let fu = f(u);

        if fu <= fx {
            if u >= x {
                min = x;
            } else {
                max = x;
            }
            v = w;
            w = x;
            x = u;
            fv = fw;
            fw = fx;
            fx = fu;
        } else {
            if u < x {
                min = u;
            } else {
                max = u;
            }
            if fu <= fw || w == x {
                v = w;
                w = u;
                fv = fw;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }
    x
}

/// Infinity norm, zero for empty vectors.
pub(crate) fn norm_inf(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn largest_step_hits_first_zero() {
        let p = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let dp = DVector::from_vec(vec![-2.0, -1.0, 1.0]);
        assert_eq!(largest_step(&p, &dp), 0.5);
        let up = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        assert!(largest_step(&p, &up).is_infinite());
    }

    #[test]
    fn fraction_to_boundary_keeps_interior() {
        let p = DVector::from_vec(vec![1.0, 1.0]);
        let dp = DVector::from_vec(vec![-4.0, 1.0]);
        let alpha = fraction_to_the_boundary(&p, &dp, 0.99);
        assert!((alpha - 0.2475).abs() < 1e-15);
        let next = &p + alpha * &dp;
        assert!(next.iter().all(|&v| v > 0.0));
        assert_eq!(fraction_to_the_boundary(&p, &-&dp.abs(), 0.0), 0.0);
        assert_eq!(fraction_to_the_boundary(&p, &dp.abs(), 0.99), 1.0);
    }

    #[test]
    fn tolerant_comparisons() {
        assert!(less_than(1.0 + 1e-16, 1.0, 1.0));
        assert!(!less_than(1.0 + 1e-12, 1.0, 1.0));
        assert!(greater_than(1.0 - 1e-16, 1.0, 1.0));
        assert!(!greater_than(1.0 - 1e-12, 1.0, 1.0));
    }

    #[test]
    fn bfgs_satisfies_secant_condition() {
        let grad = |x: &DVector<f64>| DVector::from_vec(vec![2.0 * x[0] + x[1], x[0] + 4.0 * x[1]]);
        let mut bfgs = Bfgs::new();
        let x0 = DVector::from_vec(vec![1.0, 1.0]);
        let h0 = bfgs.update(&x0, &grad(&x0)).clone();
        assert_eq!(h0, DMatrix::from_diagonal(&x0));

        let x1 = DVector::from_vec(vec![0.5, -0.25]);
        let h1 = bfgs.update(&x1, &grad(&x1)).clone();
        let dx = &x1 - &x0;
        let dg = grad(&x1) - grad(&x0);
        let secant = &h1 * &dg;
        assert!((secant - dx).norm() < 1e-12);
    }

    #[test]
    fn golden_section_finds_minimum() {
        let t = minimize_golden_section(|x| (x - 0.3).powi(2), 1e-8);
        assert!((t - 0.3).abs() < 1e-6);
        let t = minimize_golden_section_in(|x| (x - 2.5).powi(2), 1.0, 4.0, 1e-8);
        assert!((t - 2.5).abs() < 1e-6);
    }

    #[test]
    fn brent_finds_minimum() {
        let t = minimize_brent(|x| (x - 0.3).powi(2) + 1.0, 0.0, 1.0, 1e-10, 100);
        assert!((t - 0.3).abs() < 1e-6);
        let t = minimize_brent(|x| x * x.ln(), 0.01, 2.0, 1e-10, 100);
        assert!((t - (-1.0_f64).exp()).abs() < 1e-6);
    }
}
