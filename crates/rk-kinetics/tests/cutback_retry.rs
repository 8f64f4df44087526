//! Cutback retry of the adaptive stepper.

use rk_kinetics::{IntegratorType, KineticsError, KineticsResult, StepOptions, TransientModel, integrate};

struct FailOnceModel {
    failures_left: usize,
}

impl TransientModel for FailOnceModel {
    type State = f64;

    fn rhs(&mut self, _t: f64, _x: &Self::State) -> KineticsResult<Self::State> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(KineticsError::Retryable {
                message: "intentional retryable failure".to_string(),
            });
        }
        Ok(0.0)
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a + b
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        a * scale
    }

    fn error_norm(&self, coarse: &Self::State, fine: &Self::State) -> f64 {
        (coarse - fine).abs()
    }
}

#[test]
fn cutback_retries_step() {
    let mut model = FailOnceModel { failures_left: 1 };

    let opts = StepOptions {
        dt: 0.1,
        min_dt: 0.01,
        max_steps: 10,
        max_retries: 4,
        cutback_factor: 0.5,
        grow_factor: 2.0,
        integrator: IntegratorType::Rk4,
        ..Default::default()
    };

    let record = integrate(&mut model, 0.0, 0.0, 0.2, &opts).expect("cutback retry should succeed");

    assert!(record.t.len() >= 2, "Expected at least one step recorded");
    assert!(record.t[1] < opts.dt, "First step should be cut back");
    assert_eq!(model.failures_left, 0, "Failure should have been consumed by retry");
    assert_eq!(record.t.last(), Some(&0.2));
}

#[test]
fn persistent_failure_stops_below_min_dt() {
    let mut model = FailOnceModel {
        failures_left: usize::MAX,
    };
    let opts = StepOptions {
        dt: 0.1,
        min_dt: 0.01,
        max_retries: 100,
        integrator: IntegratorType::ForwardEuler,
        ..Default::default()
    };

    let err = integrate(&mut model, 0.0, 0.0, 1.0, &opts).unwrap_err();
    match err {
        KineticsError::StepFailed { t, dt } => {
            assert_eq!(t, 0.0);
            assert!(dt < opts.min_dt);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn non_retryable_errors_propagate() {
    struct Broken;

    impl TransientModel for Broken {
        type State = f64;

        fn rhs(&mut self, _t: f64, _x: &f64) -> KineticsResult<f64> {
            Err(KineticsError::NonPhysical {
                what: "negative volume".to_string(),
            })
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

    let err = integrate(&mut Broken, 1.0, 0.0, 1.0, &StepOptions::default()).unwrap_err();
    assert!(matches!(err, KineticsError::NonPhysical { .. }));
}
