//! Minimization of f(x) subject to A·x = b and x ≥ l.
//!
//! This crate provides the optimization engine behind chemical equilibrium
//! calculations: several interior-point and active-set methods sharing one
//! problem/state/options model, constraint regularization, a dense KKT
//! solver whose final factorization answers sensitivity queries, and small
//! line-search utilities.

pub mod actnewton;
pub mod error;
pub mod ipactive;
pub mod ipnewton;
pub mod ipopt;
pub mod karpov;
pub mod kkt;
pub mod options;
pub mod problem;
pub mod regularizer;
pub mod result;
pub mod solver;
pub mod state;
pub mod utils;

pub use error::{OptimError, OptimResult};
pub use kkt::{KktMatrix, KktSolver};
pub use options::{
    ActNewtonOptions, IpActiveOptions, IpNewtonOptions, IpOptOptions, KarpovOptions, KktMethod, KktOptions,
    OptimumMethod, OptimumOptions, RegularizerOptions,
};
pub use problem::{Hessian, ObjectiveFn, ObjectiveResult, OptimumProblem};
pub use regularizer::{Regularized, Regularizer};
pub use result::OptimumResult;
pub use solver::{OptimumSolver, OptimumStrategy};
pub use state::OptimumState;
