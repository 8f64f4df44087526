//! Interior-point method with active-set refinement.
//!
//! An interior-point stage with perturbation `epsilon` identifies the
//! variables converging to their bounds (dual larger than primal distance).
//! Those are held fixed and an active-set Newton stage refines the rest on
//! the reduced system. An interior stage that fails is retried once with
//! the interior-point Newton parameters.

use crate::actnewton::active_set_newton;
use crate::error::OptimResult;
use crate::ipnewton::interior_point;
use crate::options::OptimumOptions;
use crate::problem::OptimumProblem;
use crate::result::OptimumResult;
use crate::solver::OptimumStrategy;
use crate::state::OptimumState;
use tracing::debug;

#[derive(Debug, Default)]
pub struct IpActiveSolver;

impl OptimumStrategy for IpActiveSolver {
    fn solve(
        &mut self,
        problem: &OptimumProblem<'_>,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> OptimResult<OptimumResult> {
        let params = &options.ipactive;
        let initial = state.clone();
        let mut result = interior_point(problem, state, options, params.epsilon, 1.0 - params.tau)?;
        if !result.succeeded {
            // Steps this close to the bound can underflow the distance of
            // trace variables; retry with the interior-point Newton settings.
            debug!(iterations = result.iterations, "ipactive: interior stage failed, retrying");
            *state = initial;
            let retry = interior_point(problem, state, options, options.ipnewton.mu, options.ipnewton.tau)?;
            result.merge(&retry);
            if !result.succeeded {
                return Ok(result);
            }
        }

        let l = problem.lower_bounds();
        let active: Vec<bool> = (0..problem.num_variables())
            .map(|i| state.z[i] > state.x[i] - l[i])
            .collect();
        debug!(
            active = active.iter().filter(|&&a| a).count(),
            "ipactive: refining on reduced system"
        );

        let interior = state.clone();
        let refined = active_set_newton(problem, state, options, active)?;
        if refined.succeeded {
            result.merge(&refined);
        } else {
            *state = interior;
            result.iterations += refined.iterations;
            result.time += refined.time;
        }
        Ok(result)
    }
}
