//! Definition of a kinetic calculation.

use crate::error::KineticsResult;
use crate::reactions::ReactionSystem;
use rk_core::Quantity;
use rk_core::units::convert;
use rk_system::{ChemicalSystem, Partition};
use std::sync::Arc;

/// Reactions, the partition of species into equilibrium, kinetic and inert
/// groups, and optional conditions that override those of the initial state.
#[derive(Clone, Debug)]
pub struct KineticProblem {
    reactions: ReactionSystem,
    partition: Partition,
    temperature: Option<f64>,
    pressure: Option<f64>,
}

impl KineticProblem {
    /// All species start in equilibrium until a partition is set.
    pub fn new(reactions: ReactionSystem) -> Self {
        let partition = Partition::new(Arc::clone(reactions.system()));
        Self {
            reactions,
            partition,
            temperature: None,
            pressure: None,
        }
    }

    pub fn set_partition(&mut self, partition: Partition) -> &mut Self {
        self.partition = partition;
        self
    }

    /// Set the partition from text such as `"kinetic = Calcite; inert = Quartz"`.
    pub fn set_partition_str(&mut self, text: &str) -> KineticsResult<&mut Self> {
        self.partition = Partition::parse(Arc::clone(self.reactions.system()), text)?;
        Ok(self)
    }

    pub fn set_temperature(&mut self, t: f64) -> KineticsResult<&mut Self> {
        self.temperature = Some(rk_core::ensure_finite(t, "temperature")?);
        Ok(self)
    }

    pub fn set_temperature_with_units(&mut self, value: f64, units: &str) -> KineticsResult<&mut Self> {
        self.set_temperature(convert(value, units, Quantity::Temperature)?)
    }

    pub fn set_pressure(&mut self, p: f64) -> KineticsResult<&mut Self> {
        self.pressure = Some(rk_core::ensure_finite(p, "pressure")?);
        Ok(self)
    }

    pub fn set_pressure_with_units(&mut self, value: f64, units: &str) -> KineticsResult<&mut Self> {
        self.set_pressure(convert(value, units, Quantity::Pressure)?)
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        self.reactions.system()
    }

    pub fn reactions(&self) -> &ReactionSystem {
        &self.reactions
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn pressure(&self) -> Option<f64> {
        self.pressure
    }
}
