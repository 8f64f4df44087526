//! rk-thermo: species thermodynamics for reaktoflow.
//!
//! Provides:
//! - Chemical species and elements (formula parsing, charges, molar masses)
//! - Water properties (IAPWS-IF97 region 1, dielectric constant, Born functions)
//! - HKF standard-state models for aqueous solutes, water, gases and minerals
//! - Standard thermo model of a phase (`PhaseThermoModel`) with memoization
//! - Activity models (`PhaseChemicalModel`): ideal and Debye–Hückel aqueous,
//!   ideal and cubic-EOS gaseous, pure and ideal solid-solution minerals
//! - Reaction thermodynamics (equilibrium constants)
//! - A small built-in species catalog
//!
//! # Architecture
//!
//! Every property is computed together with its temperature and pressure
//! derivatives (`ThermoScalar`, `ThermoVector`); composition-dependent
//! properties additionally carry species-amount derivatives
//! (`ChemicalScalar`, `ChemicalVector`). Standard-state functions are written
//! once over a generic dual number and evaluated with nested third-order
//! duals, so entropy, enthalpy and heat capacities follow from the Gibbs
//! energy without hand-coded derivatives.
//!
//! # Example
//!
//! ```no_run
//! use rk_thermo::{PhaseThermoModel, StandardThermoModel, catalog};
//!
//! let species = vec![
//!     catalog::species("H2O(l)").unwrap(),
//!     catalog::species("H+").unwrap(),
//!     catalog::species("OH-").unwrap(),
//! ];
//! let model = StandardThermoModel::new(species);
//! let res = model.evaluate(298.15, 1e5).unwrap();
//! println!("G°(H2O) = {} J/mol", res.gibbs_energies.val[0]);
//! ```

pub mod aqueous;
pub mod catalog;
pub mod cubic;
pub mod dual;
pub mod element;
pub mod error;
pub mod formula;
pub mod gaseous;
pub mod hkf;
pub mod mineral;
pub mod mixture;
pub mod reaction;
pub mod species;
pub mod standard;
pub mod water;

// Re-exports for ergonomics
pub use aqueous::{AqueousActivityModel, AqueousChemicalModel, AqueousMixture, DebyeHuckelParams};
pub use cubic::{CubicEos, CubicEosKind, CubicEosResult};
pub use dual::SpeciesThermoState;
pub use element::Element;
pub use error::{ThermoError, ThermoResult};
pub use gaseous::{GaseousActivityModel, GaseousChemicalModel};
pub use mineral::{MineralActivityModel, MineralChemicalModel};
pub use mixture::{PhaseChemicalModel, PhaseChemicalModelResult, mole_fractions};
pub use reaction::{ReactionThermoState, reaction_thermo_state};
pub use species::{AggregateState, CriticalProperties, Species, SpeciesThermoParams};
pub use standard::{PhaseThermoModel, PhaseThermoModelResult, StandardThermoModel};
pub use water::{WaterEvaluator, WaterState};
