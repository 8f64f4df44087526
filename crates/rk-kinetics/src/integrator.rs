//! Explicit one-step time integrators.

use crate::error::KineticsResult;
use crate::model::TransientModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance the state by one time step.
    fn step<M: TransientModel>(&self, model: &mut M, t: f64, x: &M::State, dt: f64) -> KineticsResult<M::State>;

    /// Order of accuracy, used to extrapolate step-doubling estimates.
    fn order(&self) -> i32;
}

/// Classical 4th-order Runge-Kutta.
#[derive(Clone, Copy, Debug)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn step<M: TransientModel>(&self, model: &mut M, t: f64, x: &M::State, dt: f64) -> KineticsResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // x + dt/6 (k1 + 2 k2 + 2 k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }

    fn order(&self) -> i32 {
        4
    }
}

/// Forward Euler: one rhs evaluation per step.
#[derive(Clone, Copy, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(&self, model: &mut M, t: f64, x: &M::State, dt: f64) -> KineticsResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }

    fn order(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dt = -x
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn rhs(&mut self, _t: f64, x: &f64) -> KineticsResult<f64> {
            Ok(-x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, s: f64) -> f64 {
            a * s
        }

        fn error_norm(&self, coarse: &f64, fine: &f64) -> f64 {
            (coarse - fine).abs()
        }
    }

    #[test]
    fn rk4_is_fourth_order_accurate() {
        let x = Rk4.step(&mut Decay, 0.0, &1.0, 0.1).unwrap();
        assert!((x - (-0.1f64).exp()).abs() < 1e-7);
    }

    #[test]
    fn euler_matches_its_formula() {
        let x = ForwardEuler.step(&mut Decay, 0.0, &2.0, 0.25).unwrap();
        assert_eq!(x, 1.5);
    }
}
