//! Mineral dissolution/precipitation mechanisms.
//!
//! A mechanism is written as `;`-separated assignments, for example
//! `"logk = -0.30 mol/(m2*s); Ea = 14.4 kJ/mol; a[H+] = 1.0"`:
//!
//! | key        | meaning                                  | units             |
//! |------------|------------------------------------------|-------------------|
//! | `logk`     | log10 of the rate constant at 25 °C      | surface rate      |
//! | `Ea`       | Arrhenius activation energy              | molar energy      |
//! | `a[name]`  | activity catalyst of species `name`      | power, unitless   |
//! | `P[name]`  | partial pressure catalyst of gas `name`  | power, unitless   |
//! | `p`, `q`   | powers in `|1 − Ω^p|^q`                  | unitless          |

use crate::error::{KineticsError, KineticsResult};
use rk_core::constants::{GAS_CONSTANT, REFERENCE_TEMPERATURE};
use rk_core::{FieldOrder, Quantity, ThermoScalar, ValueRecord};
use std::str::FromStr;

/// How a catalyst enters a mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CatalystProperty {
    /// Activity of a species
    Activity,
    /// Partial pressure (bar) of a gaseous species
    PartialPressure,
}

/// A species whose activity or partial pressure multiplies the rate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MineralCatalyst {
    pub species: String,
    pub property: CatalystProperty,
    pub power: f64,
}

impl MineralCatalyst {
    pub fn activity(species: impl Into<String>, power: f64) -> Self {
        Self {
            species: species.into(),
            property: CatalystProperty::Activity,
            power,
        }
    }

    pub fn partial_pressure(species: impl Into<String>, power: f64) -> Self {
        Self {
            species: species.into(),
            property: CatalystProperty::PartialPressure,
            power,
        }
    }
}

/// One rate law contributing to a mineral reaction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MineralMechanism {
    /// Rate constant at 25 °C (mol/(m²·s))
    pub kappa: f64,
    /// Activation energy (J/mol)
    pub ea: f64,
    pub catalysts: Vec<MineralCatalyst>,
    pub p: f64,
    pub q: f64,
}

impl Default for MineralMechanism {
    fn default() -> Self {
        Self {
            kappa: 0.0,
            ea: 0.0,
            catalysts: Vec::new(),
            p: 1.0,
            q: 1.0,
        }
    }
}

impl MineralMechanism {
    /// Mechanism with rate constant `10^logk` mol/(m²·s) and activation
    /// energy `ea` J/mol.
    pub fn new(logk: f64, ea: f64) -> Self {
        Self {
            kappa: 10f64.powf(logk),
            ea,
            ..Default::default()
        }
    }

    pub fn with_catalyst(mut self, catalyst: MineralCatalyst) -> Self {
        self.catalysts.push(catalyst);
        self
    }

    pub fn with_powers(mut self, p: f64, q: f64) -> Self {
        self.p = p;
        self.q = q;
        self
    }

    /// `k(T) = κ·exp(−Ea/R·(1/T − 1/298.15))` with its T derivative.
    pub fn rate_constant(&self, t: f64) -> ThermoScalar {
        let temperature = ThermoScalar::temperature(t);
        let arg = -self.ea / GAS_CONSTANT * (1.0 / temperature - 1.0 / REFERENCE_TEMPERATURE);
        arg.exp() * self.kappa
    }
}

impl FromStr for MineralMechanism {
    type Err = KineticsError;

    fn from_str(text: &str) -> KineticsResult<Self> {
        let mut mechanism = Self::default();
        let mut has_rate = false;
        for item in text.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = item.split_once('=').ok_or_else(|| KineticsError::Parse {
                what: format!("expected 'key = value' in mechanism term '{item}'"),
            })?;
            let (key, value) = (key.trim(), value.trim());
            let record = ValueRecord::parse(value, FieldOrder::ValueUnits)?;
            match key {
                "logk" => {
                    // the units belong to k, not to its logarithm
                    mechanism.kappa = ValueRecord::new(None, 10f64.powf(record.value), record.units)
                        .to_si(Quantity::SurfaceRate)?;
                    has_rate = true;
                }
                "k" => {
                    mechanism.kappa = record.to_si(Quantity::SurfaceRate)?;
                    has_rate = true;
                }
                "Ea" | "ea" => mechanism.ea = record.to_si(Quantity::MolarEnergy)?,
                "p" => mechanism.p = unitless(key, &record)?,
                "q" => mechanism.q = unitless(key, &record)?,
                _ => {
                    let catalyst = parse_catalyst(key, unitless(key, &record)?)?;
                    mechanism.catalysts.push(catalyst);
                }
            }
        }
        if !has_rate {
            return Err(KineticsError::Parse {
                what: format!("mechanism '{text}' has no rate constant (logk or k)"),
            });
        }
        Ok(mechanism)
    }
}

fn unitless(key: &str, record: &ValueRecord) -> KineticsResult<f64> {
    if record.units.is_empty() {
        Ok(record.value)
    } else {
        Err(KineticsError::Parse {
            what: format!("'{key}' takes no units, got '{}'", record.units),
        })
    }
}

/// `a[H+]` or `P[CO2]`
fn parse_catalyst(key: &str, power: f64) -> KineticsResult<MineralCatalyst> {
    let malformed = || KineticsError::Parse {
        what: format!("unknown mechanism key '{key}'"),
    };
    let (kind, rest) = key.split_once('[').ok_or_else(malformed)?;
    let species = rest.strip_suffix(']').filter(|s| !s.is_empty()).ok_or_else(malformed)?;
    match kind.trim() {
        "a" => Ok(MineralCatalyst::activity(species, power)),
        "P" | "p" => Ok(MineralCatalyst::partial_pressure(species, power)),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn neutral_mechanism() {
        let m: MineralMechanism = "logk = -5.81 mol/(m2*s); Ea = 23.5 kJ/mol".parse().unwrap();
        assert_relative_eq!(m.kappa, 10f64.powf(-5.81), max_relative = 1e-12);
        assert_eq!(m.ea, 23.5e3);
        assert!(m.catalysts.is_empty());
        assert_eq!((m.p, m.q), (1.0, 1.0));
    }

    #[test]
    fn catalysts_and_powers() {
        let m: MineralMechanism = "logk = -0.30 mol/(m2*s); Ea = 14.4 kJ/mol; a[H+] = 1.0; P[CO2] = 0.5; p = 2; q = 0.5"
            .parse()
            .unwrap();
        assert_eq!(
            m.catalysts,
            vec![
                MineralCatalyst::activity("H+", 1.0),
                MineralCatalyst::partial_pressure("CO2", 0.5)
            ]
        );
        assert_eq!((m.p, m.q), (2.0, 0.5));
    }

    #[test]
    fn rate_units_are_converted() {
        let m: MineralMechanism = "logk = -3 mmol/(m2*s)".parse().unwrap();
        assert_relative_eq!(m.kappa, 1e-6, max_relative = 1e-12);
        let m: MineralMechanism = "k = 2e-9; Ea = 10 kcal/mol".parse().unwrap();
        assert_eq!(m.kappa, 2e-9);
        assert_relative_eq!(m.ea, 41840.0, max_relative = 1e-9);
    }

    #[test]
    fn malformed_mechanisms() {
        assert!("Ea = 23.5 kJ/mol".parse::<MineralMechanism>().is_err());
        assert!("logk -5.81".parse::<MineralMechanism>().is_err());
        assert!("logk = -5.81 mol/(m2*s); b[H+] = 1".parse::<MineralMechanism>().is_err());
        assert!("logk = -5.81; a[] = 1".parse::<MineralMechanism>().is_err());
        assert!("logk = -5.81; Ea = 5 furlongs".parse::<MineralMechanism>().is_err());
        assert!("logk = -5.81; p = 2 kg".parse::<MineralMechanism>().is_err());
    }

    #[test]
    fn arrhenius_temperature_dependence() {
        let m = MineralMechanism::new(-5.81, 23.5e3);
        let k25 = m.rate_constant(REFERENCE_TEMPERATURE);
        assert_relative_eq!(k25.val, 10f64.powf(-5.81), max_relative = 1e-12);
        let k50 = m.rate_constant(323.15);
        assert!(k50.val > k25.val);
        // d ln k/dT = Ea/(R T²)
        assert_relative_eq!(k50.ddt / k50.val, 23.5e3 / (GAS_CONSTANT * 323.15 * 323.15), max_relative = 1e-9);
    }
}
