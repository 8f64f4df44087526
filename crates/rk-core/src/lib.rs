//! rk-core: stable foundation for reaktoflow.
//!
//! Contains:
//! - scalar/vector (values carrying T, P and species-amount derivatives)
//! - numeric (Real + input checks)
//! - units (uom SI types, constants, unit-string conversion at the boundary)
//! - keyword (tagged value records)
//! - memo (explicit memoization caches)
//! - fd (finite-difference helpers)
//! - error (shared error types)

pub mod error;
pub mod fd;
pub mod keyword;
pub mod memo;
pub mod numeric;
pub mod scalar;
pub mod units;
pub mod vector;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use keyword::{FieldOrder, ValueRecord};
pub use memo::{MemoizationCache, TpKey};
pub use numeric::*;
pub use scalar::{ChemicalScalar, ThermoScalar};
pub use units::{AmountOrMass, Quantity, constants};
pub use vector::{ChemicalVector, ThermoVector};
