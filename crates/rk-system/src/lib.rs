//! rk-system: chemical system layer for reaktoflow.
//!
//! Provides:
//! - Phases and the immutable `ChemicalSystem` (formula matrix, lookups)
//! - Incremental `SystemBuilder` with validation
//! - `ChemicalProperties` snapshots and aqueous properties (pH, pe, Eh)
//! - `ChemicalState` with unit-aware setters
//! - Species partitions (equilibrium / kinetic / inert)
//! - Reaction equations and reactions
//! - The `PropertySource` backend interface
//! - `ChemicalField` batch evaluation
//!
//! # Example
//!
//! ```no_run
//! use rk_system::{ChemicalState, SystemBuilder};
//! use rk_thermo::AqueousActivityModel;
//! use std::sync::Arc;
//!
//! let system = SystemBuilder::new()
//!     .add_aqueous_phase_named(&["H2O(l)", "H+", "OH-"], AqueousActivityModel::Ideal)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let mut state = ChemicalState::new(Arc::new(system));
//! state.set_species_amount_by_name("H2O(l)", 1.0, "kg").unwrap();
//! ```

pub mod aqueous;
pub mod backend;
pub mod builder;
pub mod error;
pub mod field;
pub mod partition;
pub mod phase;
pub mod properties;
pub mod reaction;
pub mod state;
pub mod system;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use aqueous::AqueousProperties;
pub use backend::{PropertySource, UnavailableBackend};
pub use builder::SystemBuilder;
pub use error::{SystemError, SystemResult};
pub use field::ChemicalField;
pub use partition::{Partition, PartitionGroups};
pub use phase::Phase;
pub use properties::ChemicalProperties;
pub use reaction::{EquilibriumConstantFn, Reaction, ReactionEquation, ReactionRateFn};
pub use state::ChemicalState;
pub use system::{CHARGE_ELEMENT, ChemicalSystem};
