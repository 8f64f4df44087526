//! Adaptive time stepping with cutback and retry.

use crate::error::{KineticsError, KineticsResult};
use crate::integrator::{ForwardEuler, Integrator, Rk4};
use crate::model::TransientModel;
use tracing::{debug, warn};

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (4 rhs calls per step).
    #[default]
    Rk4,
    /// Forward Euler (1 rhs call per step).
    ForwardEuler,
}

/// Step size control.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepOptions {
    /// Initial time step (s)
    pub dt: f64,
    /// Smallest step before the integration fails (s)
    pub min_dt: f64,
    /// Largest step (s)
    pub max_dt: f64,
    /// Safety limit on accepted steps
    pub max_steps: usize,
    /// Consecutive rejections allowed within one step
    pub max_retries: usize,
    /// Step reduction after a retryable failure
    pub cutback_factor: f64,
    /// Largest step growth after an accepted step
    pub grow_factor: f64,
    /// Estimate the local error by step doubling and reject steps above one
    pub error_control: bool,
    pub integrator: IntegratorType,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            dt: 1.0,
            min_dt: 1e-8,
            max_dt: f64::INFINITY,
            max_steps: 100_000,
            max_retries: 20,
            cutback_factor: 0.5,
            grow_factor: 2.0,
            error_control: true,
            integrator: IntegratorType::default(),
        }
    }
}

impl StepOptions {
    fn validate(&self) -> KineticsResult<()> {
        let invalid = |what: &str| {
            Err(KineticsError::InvalidArg {
                what: what.to_string(),
            })
        };
        if !(self.dt > 0.0) {
            return invalid("dt must be positive");
        }
        if !(self.min_dt > 0.0) || self.min_dt > self.max_dt {
            return invalid("min_dt must be positive and not above max_dt");
        }
        if !(self.cutback_factor > 0.0 && self.cutback_factor < 1.0) {
            return invalid("cutback_factor must lie in (0, 1)");
        }
        if !(self.grow_factor >= 1.0) {
            return invalid("grow_factor must be at least 1");
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be positive");
        }
        Ok(())
    }
}

/// An accepted step.
#[derive(Clone, Debug)]
pub struct StepOutcome<S> {
    /// Time at the end of the step (s)
    pub t: f64,
    pub x: S,
    /// Suggested size of the next step (s)
    pub dt_next: f64,
    /// Rejections before the step was accepted
    pub retries: usize,
}

/// Advance `x` from `t` by one accepted step of at most `dt`, never past
/// `t_end`. Rejected attempts are retried with a smaller step.
pub fn advance<M: TransientModel>(
    model: &mut M,
    t: f64,
    x: &M::State,
    t_end: f64,
    dt: f64,
    opts: &StepOptions,
) -> KineticsResult<StepOutcome<M::State>> {
    opts.validate()?;
    let remaining = t_end - t;
    if !(remaining > 0.0) {
        return Err(KineticsError::InvalidArg {
            what: format!("cannot step from t = {t} to t_end = {t_end}"),
        });
    }
    let mut dt = dt.min(opts.max_dt);
    let mut retries = 0;
    loop {
        let last = dt >= remaining;
        let h = if last { remaining } else { dt };
        let (order, attempt) = match opts.integrator {
            IntegratorType::Rk4 => (Rk4.order(), attempt(&Rk4, model, t, x, h, opts)),
            IntegratorType::ForwardEuler => (ForwardEuler.order(), attempt(&ForwardEuler, model, t, x, h, opts)),
        };
        match attempt {
            Ok((xnew, err)) if err <= 1.0 => {
                let factor = if err > 0.0 {
                    (0.9 * err.powf(-1.0 / (order + 1) as f64)).clamp(1.0, opts.grow_factor)
                } else {
                    opts.grow_factor
                };
                return Ok(StepOutcome {
                    t: if last { t_end } else { t + h },
                    x: xnew,
                    dt_next: (dt * factor).min(opts.max_dt),
                    retries,
                });
            }
            Ok((_, err)) => {
                let factor = (0.9 * err.powf(-1.0 / (order + 1) as f64)).clamp(0.1, opts.cutback_factor);
                dt = h * factor;
                debug!(t, dt = h, error = err, "step rejected by error control");
            }
            Err(e) if e.is_retryable() => {
                dt = h * opts.cutback_factor;
                debug!(t, dt = h, error = %e, "step cut back");
            }
            Err(e) => return Err(e),
        }
        retries += 1;
        if retries > opts.max_retries || dt < opts.min_dt {
            warn!(t, dt, retries, "time step failed");
            return Err(KineticsError::StepFailed { t, dt });
        }
    }
}

/// One trial step, returning the state to accept and its scaled error.
fn attempt<I: Integrator, M: TransientModel>(
    integrator: &I,
    model: &mut M,
    t: f64,
    x: &M::State,
    dt: f64,
    opts: &StepOptions,
) -> KineticsResult<(M::State, f64)> {
    let coarse = integrator.step(model, t, x, dt)?;
    if !opts.error_control {
        return Ok((coarse, 0.0));
    }
    let half = integrator.step(model, t, x, 0.5 * dt)?;
    let fine = integrator.step(model, t + 0.5 * dt, &half, 0.5 * dt)?;
    let err = model.error_norm(&coarse, &fine) / (2f64.powi(integrator.order()) - 1.0);
    if !err.is_finite() {
        return Err(KineticsError::Retryable {
            message: "local error estimate is not finite".to_string(),
        });
    }
    Ok((fine, err))
}

/// Accepted times and states of an integration.
#[derive(Clone, Debug)]
pub struct TimeRecord<S> {
    /// Time points (s)
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<S>,
}

/// Integrate from `t0` to `t_end`, recording every accepted step.
pub fn integrate<M: TransientModel>(
    model: &mut M,
    x0: M::State,
    t0: f64,
    t_end: f64,
    opts: &StepOptions,
) -> KineticsResult<TimeRecord<M::State>> {
    opts.validate()?;
    if t_end < t0 {
        return Err(KineticsError::InvalidArg {
            what: format!("t_end = {t_end} lies before t0 = {t0}"),
        });
    }

    let mut t = t0;
    let mut x = x0;
    let mut dt = opts.dt;
    let mut record = TimeRecord {
        t: vec![t],
        x: vec![x.clone()],
    };

    let mut steps = 0;
    while t < t_end && steps < opts.max_steps {
        let outcome = advance(model, t, &x, t_end, dt, opts)?;
        t = outcome.t;
        x = outcome.x;
        dt = outcome.dt_next;
        steps += 1;
        record.t.push(t);
        record.x.push(x.clone());
    }
    if t < t_end {
        warn!(t, t_end, steps, "integration stopped at the step limit");
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dt = -k x
    struct Decay {
        k: f64,
        tol: f64,
    }

    impl TransientModel for Decay {
        type State = f64;

        fn rhs(&mut self, _t: f64, x: &f64) -> KineticsResult<f64> {
            Ok(-self.k * x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, s: f64) -> f64 {
            a * s
        }

        fn error_norm(&self, coarse: &f64, fine: &f64) -> f64 {
            (coarse - fine).abs() / self.tol
        }
    }

    #[test]
    fn step_options_defaults() {
        let opts = StepOptions::default();
        assert_eq!(opts.cutback_factor, 0.5);
        assert_eq!(opts.grow_factor, 2.0);
        assert_eq!(opts.integrator, IntegratorType::Rk4);
        assert!(opts.error_control);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let opts = StepOptions {
            dt: 0.0,
            ..Default::default()
        };
        let mut model = Decay { k: 1.0, tol: 1e-6 };
        assert!(matches!(
            integrate(&mut model, 1.0, 0.0, 1.0, &opts),
            Err(KineticsError::InvalidArg { .. })
        ));
    }

    #[test]
    fn error_control_tracks_the_exact_solution() {
        let mut model = Decay { k: 5.0, tol: 1e-8 };
        let record = integrate(&mut model, 1.0, 0.0, 2.0, &StepOptions::default()).unwrap();
        assert_eq!(record.t.last(), Some(&2.0));
        let x = *record.x.last().unwrap();
        assert!((x - (-10.0f64).exp()).abs() < 1e-6);
        // the initial step of 1 s is far too large for k = 5
        assert!(record.t[1] < 1.0);
    }

    #[test]
    fn steps_grow_when_the_error_is_small() {
        let mut model = Decay { k: 1e-3, tol: 1e-6 };
        let opts = StepOptions {
            dt: 0.01,
            ..Default::default()
        };
        let record = integrate(&mut model, 1.0, 0.0, 10.0, &opts).unwrap();
        let first = record.t[1] - record.t[0];
        let later = record.t[record.t.len() - 2] - record.t[record.t.len() - 3];
        assert!(later > first);
    }
}
