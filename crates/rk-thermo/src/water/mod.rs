//! Water: equation of state, electrostatics and a memoized evaluator.

pub mod electro;
pub mod eos;
pub mod state;

pub use state::{WaterEvaluator, WaterState};
