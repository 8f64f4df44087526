//! rk-equilibrium: chemical equilibrium by Gibbs energy minimization.
//!
//! Provides:
//! - `EquilibriumProblem`: conditions and element amounts built from
//!   species, compounds or other states
//! - `EquilibriumSolver`: minimization over the equilibrium species of a
//!   partition, with warm starts, an ideal cold-start guess and sensitivities
//! - `equilibrate*` helpers that fail unless the calculation converged
//! - `EquilibriumPath`: continuation between two states
//! - `NativeBackend`: the built-in `PropertySource`
//! - Parallel batch equilibrium and equilibrium property fields
//!
//! # Example
//!
//! ```no_run
//! use rk_equilibrium::{EquilibriumProblem, equilibrate_problem};
//! use rk_system::SystemBuilder;
//! use rk_thermo::AqueousActivityModel;
//! use std::sync::Arc;
//!
//! let system = SystemBuilder::new()
//!     .add_aqueous_phase_with_elements(&["H", "O", "C", "Ca"], AqueousActivityModel::DebyeHuckel(Default::default()))
//!     .unwrap()
//!     .add_mineral_phases_named(&["Calcite"])
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let mut problem = EquilibriumProblem::new(Arc::new(system));
//! problem.add("H2O", 1.0, "kg").unwrap();
//! problem.add("CaCO3", 100.0, "g").unwrap();
//! let state = equilibrate_problem(&problem).unwrap();
//! ```

pub mod backend;
pub mod equilibrate;
pub mod error;
pub mod field;
pub mod options;
pub mod path;
pub mod problem;
pub mod result;
pub mod sensitivity;
pub mod solver;

pub use backend::NativeBackend;
pub use equilibrate::{
    equilibrate, equilibrate_problem, equilibrate_problem_with_options, equilibrate_state_with_problem,
    equilibrate_with_options, equilibrate_with_partition,
};
pub use error::{EqResult, EquilibriumError};
pub use field::{equilibrate_all, equilibrium_field};
pub use options::{EquilibriumHessian, EquilibriumOptions, EquilibriumPathOptions};
pub use path::{EquilibriumPath, EquilibriumPathPoint, EquilibriumPathResult};
pub use problem::EquilibriumProblem;
pub use result::EquilibriumResult;
pub use sensitivity::EquilibriumSensitivity;
pub use solver::EquilibriumSolver;
