//! Interior-point method with filter line search.
//!
//! Solves a sequence of barrier subproblems
//! φ_μ(x) = f(x) − μ Σ ln(xᵢ − lᵢ) subject to A·x = b. Trial points are
//! accepted when the filter of (constraint violation θ, barrier value φ)
//! pairs does not dominate them, with an Armijo condition on φ whenever the
//! switching condition says the step is mainly an objective decrease.
//! When no trial point is acceptable the boundary-limited Newton step is
//! taken instead and the filter restarts from it.
//!
//! Convergence is declared on the unscaled KKT residuals once μ has
//! reached its floor.

use crate::error::OptimResult;
use crate::kkt::{KktMatrix, KktSolver};
use crate::options::{IpOptOptions, OptimumOptions};
use crate::problem::{ObjectiveResult, OptimumProblem};
use crate::result::OptimumResult;
use crate::solver::OptimumStrategy;
use crate::state::OptimumState;
use crate::utils::{fraction_to_the_boundary, norm_inf};
use nalgebra::DVector;
use std::time::Instant;
use tracing::{debug, warn};

/// Largest dual magnitude before the optimality residuals are scaled down.
const S_MAX: f64 = 100.0;

/// Step halvings tried by the line search and the restoration step.
const MAX_BACKTRACKS: usize = 60;

#[derive(Debug, Default)]
pub struct IpOptSolver;

/// Filter of (θ, φ) pairs a trial point must not be dominated by.
#[derive(Debug, Default)]
struct Filter {
    entries: Vec<(f64, f64)>,
}

impl Filter {
    fn acceptable(&self, theta: f64, phi: f64) -> bool {
        self.entries.iter().all(|&(tj, pj)| theta < tj || phi < pj)
    }

    fn add(&mut self, theta: f64, phi: f64) {
        self.entries.retain(|&(tj, pj)| tj < theta || pj < phi);
        self.entries.push((theta, phi));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

struct Trial {
    x: DVector<f64>,
    f: ObjectiveResult,
    theta: f64,
    phi: f64,
}

fn barrier(f: &ObjectiveResult, xl: &DVector<f64>, mu: f64) -> f64 {
    f.val - mu * xl.iter().map(|v| v.ln()).sum::<f64>()
}

fn evaluate(
    problem: &OptimumProblem<'_>,
    x: DVector<f64>,
    mu: f64,
) -> OptimResult<Option<Trial>> {
    let f = problem.objective(&x)?;
    let xl = &x - problem.lower_bounds();
    if !f.is_finite() || xl.iter().any(|&v| v <= 0.0) {
        return Ok(None);
    }
    let theta = (problem.a() * &x - problem.b()).norm();
    let phi = barrier(&f, &xl, mu);
    Ok(Some(Trial { x, f, theta, phi }))
}

/// Outcome of testing a trial point against the filter.
#[derive(Debug, PartialEq, Eq)]
enum Acceptance {
    Rejected,
    /// Sufficient decrease of φ under the switching condition
    Objective,
    /// Sufficient decrease of θ or φ
    Feasibility,
}

#[allow(clippy::too_many_arguments)]
fn accept(
    ip: &IpOptOptions,
    filter: &Filter,
    trial: &Trial,
    theta: f64,
    phi: f64,
    gphi_dx: f64,
    alpha: f64,
    theta_min: f64,
    theta_max: f64,
) -> Acceptance {
    if trial.theta > theta_max || !filter.acceptable(trial.theta, trial.phi) {
        return Acceptance::Rejected;
    }
    let switching = gphi_dx < 0.0
        && alpha * (-gphi_dx).powf(ip.s_phi) > ip.delta * theta.powf(ip.s_theta)
        && theta <= theta_min;
    if switching {
        if trial.phi <= phi + ip.eta_phi * alpha * gphi_dx {
            Acceptance::Objective
        } else {
            Acceptance::Rejected
        }
    } else if trial.theta <= (1.0 - ip.gamma_theta) * theta || trial.phi <= phi - ip.gamma_phi * theta {
        Acceptance::Feasibility
    } else {
        Acceptance::Rejected
    }
}

impl OptimumStrategy for IpOptSolver {
    fn solve(
        &mut self,
        problem: &OptimumProblem<'_>,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> OptimResult<OptimumResult> {
        let start = Instant::now();
        let ip = &options.ipopt;
        let n = problem.num_variables();
        let m = problem.num_constraints();
        let a = problem.a();
        let b = problem.b();
        let l = problem.lower_bounds();
        state.resize(n, m);

        let mu_start = ip.mu.first().copied().unwrap_or(1.0e-2);
        let mu_floor = ip
            .mu
            .last()
            .copied()
            .unwrap_or(mu_start)
            .min(options.tolerance / 10.0)
            .min(mu_start);

        // An interior primal-dual guess restarts from its own complementarity.
        let warm = n > 0 && (0..n).all(|i| state.x[i] - l[i] > 0.0 && state.z[i] > 0.0);
        let mut mu = if warm {
            let gap = (0..n).map(|i| (state.x[i] - l[i]) * state.z[i]).sum::<f64>() / n as f64;
            gap.clamp(mu_floor, mu_start)
        } else {
            mu_start
        };

        let push = if warm { 0.0 } else { ip.mux };
        for i in 0..n {
            if !(state.x[i] - l[i] >= push) {
                state.x[i] = l[i] + push;
            }
            if !(state.z[i] > 0.0) {
                state.z[i] = mu / (state.x[i] - l[i]);
            }
        }

        let mut kkt = KktSolver::new(options.kkt.clone());
        let mut filter = Filter::default();
        let mut result = OptimumResult::default();

        let Some(mut current) = evaluate(problem, state.x.clone(), mu)? else {
            warn!("ipopt: objective not finite at the initial guess");
            result.error = f64::INFINITY;
            result.time = start.elapsed();
            return Ok(result);
        };
        let theta0 = current.theta.max(1.0);
        let theta_min = 1.0e-4 * theta0;
        let theta_max = 1.0e4 * theta0;

        for iter in 0..=options.max_iterations {
            let xl = &current.x - l;
            let rx = &current.f.grad - a.tr_mul(&state.y) - &state.z;
            let rb = a * &current.x - b;
            let xz = xl.component_mul(&state.z);
            let error = norm_inf(&rx).max(norm_inf(&rb)).max(norm_inf(&xz));

            state.x.copy_from(&current.x);
            state.f = current.f.clone();
            result.iterations = iter;
            result.error = error;
            debug!(iteration = iter, error, mu, theta = current.theta, phi = current.phi, "ipopt");

            if error < options.tolerance && mu <= mu_floor {
                result.succeeded = true;
                break;
            }
            if iter == options.max_iterations {
                break;
            }

            // The barrier subproblem test may discount large duals; the
            // convergence test above never does.
            let (sd, sc) = if ip.scaling {
                let sum_z: f64 = state.z.iter().map(|v| v.abs()).sum();
                let sum_y: f64 = state.y.iter().map(|v| v.abs()).sum();
                let sd = S_MAX.max((sum_y + sum_z) / ((n + m).max(1) as f64)) / S_MAX;
                let sc = S_MAX.max(sum_z / (n.max(1) as f64)) / S_MAX;
                (sd, sc)
            } else {
                (1.0, 1.0)
            };
            let error_mu = (norm_inf(&rx) / sd)
                .max(norm_inf(&rb))
                .max(norm_inf(&xz.add_scalar(-mu)) / sc);
            if mu > mu_floor && (error_mu <= ip.kappa_epsilon * mu || error_mu < options.tolerance / 10.0) {
                mu = (ip.kappa_mu * mu).min(mu.powf(ip.theta_mu)).max(mu_floor);
                current.phi = barrier(&current.f, &xl, mu);
                filter.clear();
                continue;
            }

            let rz = xz.add_scalar(-mu);
            let rhs_x = -&rx - rz.component_div(&xl);
            let lhs = KktMatrix {
                hessian: &current.f.hessian,
                a,
                x: &xl,
                z: &state.z,
                gamma: options.regularization.gamma,
                delta: options.regularization.delta,
            };
            let step = kkt.decompose(&lhs).and_then(|_| kkt.solve(&rhs_x, &(-&rb)));
            let (dx, dy) = match step {
                Ok(step) => step,
                Err(e) => {
                    warn!(iteration = iter, error = %e, "ipopt: Newton step failed");
                    break;
                }
            };
            let dz: DVector<f64> = -(&rz + state.z.component_mul(&dx)).component_div(&xl);

            let tau = ip.tau_min.max(1.0 - mu);
            let alpha_max = fraction_to_the_boundary(&xl, &dx, tau);
            let alphaz = fraction_to_the_boundary(&state.z, &dz, tau);

            let gphi = &current.f.grad - xl.map(|v| mu / v);
            let gphi_dx = gphi.dot(&dx);
            let theta = current.theta;
            let phi = current.phi;

            let alpha_min = ip.gamma_alpha
                * if gphi_dx < 0.0 {
                    let mut bound = ip.gamma_theta.min(ip.gamma_phi * theta / -gphi_dx);
                    if theta <= theta_min {
                        bound = bound.min(ip.delta * theta.powf(ip.s_theta) / (-gphi_dx).powf(ip.s_phi));
                    }
                    bound
                } else {
                    ip.gamma_theta
                };

            let mut alpha = alpha_max;
            let mut accepted: Option<(Trial, Acceptance, f64)> = None;
            let mut first_trial = true;
            for _ in 0..MAX_BACKTRACKS {
                if !(alpha >= alpha_min && alpha > 0.0) {
                    break;
                }
                let trial = evaluate(problem, &current.x + alpha * &dx, mu)?;
                if let Some(trial) = trial {
                    let verdict = accept(ip, &filter, &trial, theta, phi, gphi_dx, alpha, theta_min, theta_max);
                    if verdict != Acceptance::Rejected {
                        accepted = Some((trial, verdict, alpha));
                        break;
                    }
                    if first_trial && ip.soc && trial.theta >= theta {
                        if let Some(corrected) = second_order_correction(
                            problem, &mut kkt, ip, &filter, &current, &rhs_x, &rb, &trial, alpha, mu, tau, gphi_dx,
                            theta_min, theta_max,
                        )? {
                            accepted = Some(corrected);
                            break;
                        }
                    }
                }
                first_trial = false;
                alpha *= 0.5;
            }

            let (trial, alpha) = match accepted {
                Some((trial, verdict, alpha)) => {
                    if verdict != Acceptance::Objective {
                        filter.add((1.0 - ip.gamma_theta) * theta, phi - ip.gamma_phi * theta);
                    }
                    (trial, alpha)
                }
                None => {
                    let Some((trial, alpha)) = restoration_step(problem, &current, &dx, alpha_max, mu)? else {
                        warn!(iteration = iter, alpha_min, "ipopt: filter line search failed");
                        break;
                    };
                    debug!(iteration = iter, alpha, "ipopt: restoration step");
                    filter.clear();
                    (trial, alpha)
                }
            };

            state.y += alpha * &dy;
            state.z += alphaz * &dz;
            let xl_new = &trial.x - l;
            for i in 0..n {
                let lo = mu / (ip.kappa_sigma * xl_new[i]);
                let hi = ip.kappa_sigma * mu / xl_new[i];
                state.z[i] = state.z[i].clamp(lo, hi.max(lo));
            }
            current = trial;
        }

        if !result.succeeded {
            warn!(
                iterations = result.iterations,
                error = result.error,
                "ipopt did not converge"
            );
        }
        result.time = start.elapsed();
        Ok(result)
    }
}

/// Step along the Newton direction when the filter rejects every trial.
///
/// With linear constraints any α in (0, 1] reduces θ by the factor 1 − α, so
/// the boundary-limited step is kept unless the objective is not finite there.
fn restoration_step(
    problem: &OptimumProblem<'_>,
    current: &Trial,
    dx: &DVector<f64>,
    alpha_max: f64,
    mu: f64,
) -> OptimResult<Option<(Trial, f64)>> {
    let mut alpha = alpha_max;
    for _ in 0..MAX_BACKTRACKS {
        if !(alpha > 0.0) {
            break;
        }
        if let Some(trial) = evaluate(problem, &current.x + alpha * dx, mu)? {
            return Ok(Some((trial, alpha)));
        }
        alpha *= 0.5;
    }
    Ok(None)
}

/// Second-order corrections of a rejected full trial step.
#[allow(clippy::too_many_arguments)]
fn second_order_correction(
    problem: &OptimumProblem<'_>,
    kkt: &mut KktSolver,
    ip: &IpOptOptions,
    filter: &Filter,
    current: &Trial,
    rhs_x: &DVector<f64>,
    rb: &DVector<f64>,
    rejected: &Trial,
    alpha: f64,
    mu: f64,
    tau: f64,
    gphi_dx: f64,
    theta_min: f64,
    theta_max: f64,
) -> OptimResult<Option<(Trial, Acceptance, f64)>> {
    let a = problem.a();
    let b = problem.b();
    let xl = &current.x - problem.lower_bounds();
    let mut c_soc = alpha * rb + (a * &rejected.x - b);
    let mut theta_old = rejected.theta;

    for _ in 0..ip.max_iters_soc {
        let Ok((dx_soc, _)) = kkt.solve(rhs_x, &(-&c_soc)) else {
            return Ok(None);
        };
        let alpha_soc = fraction_to_the_boundary(&xl, &dx_soc, tau);
        let Some(trial) = evaluate(problem, &current.x + alpha_soc * &dx_soc, mu)? else {
            return Ok(None);
        };
        let verdict = accept(
            ip,
            filter,
            &trial,
            current.theta,
            current.phi,
            gphi_dx,
            alpha,
            theta_min,
            theta_max,
        );
        if verdict != Acceptance::Rejected {
            return Ok(Some((trial, verdict, alpha_soc)));
        }
        if trial.theta > ip.kappa_soc * theta_old {
            break;
        }
        theta_old = trial.theta;
        c_soc = alpha_soc * &c_soc + (a * &trial.x - b);
    }
    Ok(None)
}
