//! rk-kinetics: kinetically controlled reactions coupled to equilibrium.
//!
//! Provides:
//! - Mineral reactions with rate mechanisms parsed from text
//! - `ReactionSystem`: stoichiometric matrix and rates of a reaction set
//! - `KineticSolver`: explicit integration of kinetic species amounts with
//!   error-controlled step cutback, re-equilibrating the other species
//! - `KineticPath`: a state evolved over a time interval with recording
//!
//! # Example
//!
//! ```no_run
//! use rk_kinetics::{KineticPath, MineralReaction, ReactionSystem};
//! use rk_system::{ChemicalState, SystemBuilder};
//! use rk_thermo::AqueousActivityModel;
//! use std::sync::Arc;
//!
//! let system = Arc::new(
//!     SystemBuilder::new()
//!         .add_aqueous_phase_with_elements(&["H", "O", "C", "Ca", "Cl"], AqueousActivityModel::DebyeHuckel(Default::default()))
//!         .unwrap()
//!         .add_mineral_phases_named(&["Calcite"])
//!         .unwrap()
//!         .build()
//!         .unwrap(),
//! );
//! let mut calcite = MineralReaction::new("Calcite");
//! calcite
//!     .set_equation("Calcite = Ca++ + CO3--")
//!     .unwrap()
//!     .add_mechanism("logk = -5.81 mol/(m2*s); Ea = 23.5 kJ/mol")
//!     .unwrap()
//!     .set_specific_surface_area(10.0, "cm2/g")
//!     .unwrap();
//! let reactions = ReactionSystem::from_minerals(Arc::clone(&system), &[calcite]).unwrap();
//! let mut path = KineticPath::new(reactions);
//! path.set_partition_str("kinetic = Calcite").unwrap();
//!
//! let mut state = ChemicalState::new(system);
//! state.set_species_amount_by_name("H2O(l)", 1.0, "kg").unwrap();
//! state.set_species_amount_by_name("Calcite", 100.0, "g").unwrap();
//! let result = path.solve(&mut state, 0.0, 5.0, "minute").unwrap();
//! ```

pub mod error;
pub mod integrator;
pub mod mechanism;
pub mod mineral;
pub mod model;
pub mod options;
pub mod path;
pub mod problem;
pub mod reactions;
pub mod solver;
pub mod stepper;

pub use error::{KineticsError, KineticsResult};
pub use integrator::{ForwardEuler, Integrator, Rk4};
pub use mechanism::{CatalystProperty, MineralCatalyst, MineralMechanism};
pub use mineral::{MineralReaction, SurfaceArea};
pub use model::TransientModel;
pub use options::KineticOptions;
pub use path::{KineticPath, KineticPathRecord, KineticPathResult};
pub use problem::KineticProblem;
pub use reactions::ReactionSystem;
pub use solver::KineticSolver;
pub use stepper::{IntegratorType, StepOptions, StepOutcome, TimeRecord, advance, integrate};
