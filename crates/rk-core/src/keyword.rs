//! Tagged value records such as `"1 kg H2O"` or `"T 25 celsius"`.
//!
//! One record type covers every combination of optional entity, value and
//! units; the field order expected in the text is given explicitly.

use crate::error::{CoreError, CoreResult};
use crate::units::{Quantity, convert, split_value_and_unit};

/// Order in which the fields appear in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// `"25 celsius"`
    ValueUnits,
    /// `"Calcite 100 g"`
    EntityValueUnits,
    /// `"100 g Calcite"`
    ValueUnitsEntity,
}

/// A value with units, optionally tied to a named entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueRecord {
    pub entity: Option<String>,
    pub value: f64,
    pub units: String,
}

impl ValueRecord {
    pub fn new(entity: Option<String>, value: f64, units: impl Into<String>) -> Self {
        Self {
            entity,
            value,
            units: units.into(),
        }
    }

    /// Parse `text` with fields in the given `order`.
    pub fn parse(text: &str, order: FieldOrder) -> CoreResult<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let malformed = || CoreError::Parse {
            what: format!("malformed value record '{}' (expected {:?})", text, order),
        };
        match order {
            FieldOrder::ValueUnits => {
                let (value, units) = split_value_and_unit(&tokens.join(" "))?;
                Ok(Self::new(None, value, units))
            }
            FieldOrder::EntityValueUnits => {
                let (entity, rest) = tokens.split_first().ok_or_else(malformed)?;
                if rest.is_empty() {
                    return Err(malformed());
                }
                let (value, units) = split_value_and_unit(&rest.join(" "))?;
                Ok(Self::new(Some(entity.to_string()), value, units))
            }
            FieldOrder::ValueUnitsEntity => {
                let (first, rest) = tokens.split_first().ok_or_else(malformed)?;
                let (value, attached) = split_value_and_unit(first)?;
                let (units, entity) = if attached.is_empty() {
                    let (units, entity) = rest.split_first().ok_or_else(malformed)?;
                    (units.to_string(), entity)
                } else {
                    (attached, rest)
                };
                if entity.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::new(Some(entity.join(" ")), value, units))
            }
        }
    }

    /// The value converted to SI for the given quantity.
    pub fn to_si(&self, quantity: Quantity) -> CoreResult<f64> {
        convert(self.value, &self.units, quantity)
    }
}
