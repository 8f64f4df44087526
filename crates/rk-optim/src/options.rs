//! Optimizer configuration.

/// Parameters of the primal-dual interior-point Newton method.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IpNewtonOptions {
    /// Perturbation of the complementarity condition x∘z = μ
    pub mu: f64,
    /// Fraction-to-the-boundary factor
    pub tau: f64,
}

impl Default for IpNewtonOptions {
    fn default() -> Self {
        Self {
            mu: 1.0e-20,
            tau: 0.9999,
        }
    }
}

/// Parameters of the filter line-search interior-point method.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IpOptOptions {
    /// Barrier parameters: the first starts the sequence, the last is its floor
    pub mu: Vec<f64>,
    pub delta: f64,
    pub eta_phi: f64,
    pub gamma_alpha: f64,
    pub gamma_phi: f64,
    pub gamma_theta: f64,
    pub kappa_epsilon: f64,
    pub kappa_mu: f64,
    pub kappa_sigma: f64,
    pub kappa_soc: f64,
    pub s_phi: f64,
    pub s_theta: f64,
    pub tau_min: f64,
    pub theta_mu: f64,
    /// Maximum number of second-order corrections per iteration
    pub max_iters_soc: usize,
    /// Enables second-order corrections
    pub soc: bool,
    /// Smallest distance to the bounds of the initial guess
    pub mux: f64,
    /// Scales the barrier residuals by the magnitude of the duals
    pub scaling: bool,
}

impl Default for IpOptOptions {
    fn default() -> Self {
        Self {
            mu: vec![1.0e-2, 1.0e-16],
            delta: 1.0,
            eta_phi: 1.0e-4,
            gamma_alpha: 0.05,
            gamma_phi: 1.0e-5,
            gamma_theta: 1.0e-5,
            kappa_epsilon: 10.0,
            kappa_mu: 0.2,
            kappa_sigma: 1.0e10,
            kappa_soc: 0.99,
            s_phi: 2.3,
            s_theta: 1.1,
            tau_min: 0.9999,
            theta_mu: 2.0,
            max_iters_soc: 4,
            soc: true,
            mux: 1.0e-5,
            scaling: true,
        }
    }
}

/// Parameters of the interior-point method with active-set refinement.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IpActiveOptions {
    /// Complementarity perturbation of the interior-point stage
    pub epsilon: f64,
    /// One minus the fraction-to-the-boundary factor
    pub tau: f64,
}

impl Default for IpActiveOptions {
    fn default() -> Self {
        Self {
            epsilon: 1.0e-20,
            tau: 1.0e-5,
        }
    }
}

/// Parameters of the active-set Newton method.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActNewtonOptions {
    /// Distance to the lower bound below which a variable is active
    pub threshold: f64,
}

impl Default for ActNewtonOptions {
    fn default() -> Self {
        Self { threshold: 1.0e-14 }
    }
}

/// Parameters of Karpov's feasible-path method.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KarpovOptions {
    pub line_search_max_iterations: usize,
    pub line_search_wolfe: f64,
    /// Fraction-to-the-boundary factor used in the feasible step
    pub tau_feasible: f64,
    /// Fraction-to-the-boundary factor used in the descent step
    pub tau_descent: f64,
    pub feasibility_tolerance: f64,
    pub negative_dual_tolerance: f64,
    /// Amount below which a variable with a positive dual is considered at its bound
    pub active_to_inactive: f64,
    /// Computes the descent direction from the full KKT system instead of the diagonal scaling
    pub use_kkt_solver: bool,
}

impl Default for KarpovOptions {
    fn default() -> Self {
        Self {
            line_search_max_iterations: 3,
            line_search_wolfe: 1.0e-4,
            tau_feasible: 0.99,
            tau_descent: 0.9999,
            feasibility_tolerance: 1.0e-13,
            negative_dual_tolerance: -1.0e-2,
            active_to_inactive: 1.0e-6,
            use_kkt_solver: false,
        }
    }
}

/// Preprocessing of the linear constraints.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegularizerOptions {
    /// Dual regularization added to the KKT matrix as δ²
    pub delta: f64,
    /// Primal regularization added to the KKT matrix as γ²
    pub gamma: f64,
    /// Replace A by its reduced row echelon form
    pub echelonize: bool,
    /// Round echelon entries to fractions with at most this denominator (0 disables)
    pub max_denominator: u32,
}

impl Default for RegularizerOptions {
    fn default() -> Self {
        Self {
            delta: 0.0,
            gamma: 0.0,
            echelonize: true,
            max_denominator: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KktMethod {
    #[default]
    PartialPivLu,
    FullPivLu,
}

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KktOptions {
    pub method: KktMethod,
}

/// Optimization algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptimumMethod {
    #[default]
    IpNewton,
    IpOpt,
    IpActive,
    ActNewton,
    Karpov,
}

/// Optimizer configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimumOptions {
    /// Tolerance on the KKT residual
    pub tolerance: f64,
    /// Stop when the largest primal step falls below this (0 disables)
    pub tolerancex: f64,
    /// Stop when the relative objective change falls below this (0 disables)
    pub tolerancef: f64,
    /// Maximum iterations
    pub max_iterations: usize,
    pub ipnewton: IpNewtonOptions,
    pub ipopt: IpOptOptions,
    pub ipactive: IpActiveOptions,
    pub actnewton: ActNewtonOptions,
    pub karpov: KarpovOptions,
    pub regularization: RegularizerOptions,
    pub kkt: KktOptions,
}

impl Default for OptimumOptions {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            tolerancex: 0.0,
            tolerancef: 0.0,
            max_iterations: 2000,
            ipnewton: IpNewtonOptions::default(),
            ipopt: IpOptOptions::default(),
            ipactive: IpActiveOptions::default(),
            actnewton: ActNewtonOptions::default(),
            karpov: KarpovOptions::default(),
            regularization: RegularizerOptions::default(),
            kkt: KktOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = OptimumOptions::default();
        assert_eq!(o.tolerance, 1e-6);
        assert_eq!(o.max_iterations, 2000);
        assert_eq!(o.ipnewton.mu, 1e-20);
        assert_eq!(o.ipopt.mu, vec![1e-2, 1e-16]);
        assert_eq!(o.ipopt.max_iters_soc, 4);
        assert_eq!(o.ipactive.tau, 1e-5);
        assert_eq!(o.actnewton.threshold, 1e-14);
        assert_eq!(o.karpov.negative_dual_tolerance, -1e-2);
        assert!(o.regularization.echelonize);
        assert_eq!(o.kkt.method, KktMethod::PartialPivLu);
    }
}
